//! Full-pipeline battle scheduling tests for §8 scenarios 3 and 4.

use std::collections::HashMap;
use std::sync::Arc;

use campaign_engine::campaign::Campaign;
use campaign_engine::core::config::Config;
use campaign_engine::core::types::Point;
use campaign_engine::map::PerCoalition;
use campaign_engine::orchestrator;
use campaign_engine::services::notify::NullMessageSink;
use campaign_engine::services::persistence::InMemorySnapshotStore;
use campaign_engine::services::Services;
use campaign_engine::stats::store::InMemoryConflictStore;
use campaign_engine::transport::dto::{CoalitionPair, ProcessJsonRequest, UnitReport};

fn fake_services() -> Services {
    Services::new(
        Config::default(),
        Arc::new(InMemorySnapshotStore::default()),
        Arc::new(NullMessageSink),
        Arc::new(InMemoryConflictStore::default()),
    )
}

fn new_campaign(seed: u64) -> Campaign {
    Campaign::new("1.0.0.0".to_string(), seed, PerCoalition::new(vec!["Igla".to_string()], vec!["Chaparral".to_string()]))
}

fn unit_report(group: &str, pos: &str, coalition: &str) -> UnitReport {
    UnitReport {
        group: group.to_string(),
        pos: pos.to_string(),
        unit_type: "T-80".to_string(),
        category: "vehicle".to_string(),
        coalition: coalition.to_string(),
        skill: None,
    }
}

fn two_node_request() -> ProcessJsonRequest {
    let mut units = HashMap::new();
    units.insert("red-1".to_string(), unit_report("Red Armor 1", "0,0", "red"));
    units.insert("blue-1".to_string(), unit_report("Blue Armor 1", "300,0", "blue"));
    ProcessJsonRequest {
        routes: vec![vec!["0,0".to_string(), "300,0".to_string()]],
        units,
        goals: CoalitionPair { red: "0,0".to_string(), blue: "300,0".to_string() },
        bullseye: CoalitionPair { red: "0,0".to_string(), blue: "300,0".to_string() },
        mapmarkers: None,
        cornermarkers: None,
    }
}

/// §8 scenario 3: red at A, blue at B decide to cross (red->B, blue->A) on
/// turn one; turn two confirms the crossing, teleports both to the segment
/// midpoint, and records a single mid-segment Battle.
#[test]
fn crossing_decisions_resolve_into_a_mid_segment_battle() {
    let mut campaign = new_campaign(11);
    let services = fake_services();
    let req = two_node_request();

    let turn1 = orchestrator::process_turn(&mut campaign, &services, &req).unwrap();
    assert_eq!(turn1.groupsdest.get("Red Armor 1").map(|s| s.as_str()), Some("300.000000,0.000000"));
    assert_eq!(turn1.groupsdest.get("Blue Armor 1").map(|s| s.as_str()), Some("0.000000,0.000000"));

    // A new mission begins; the host still reports both units at their
    // original nodes since neither has physically moved yet.
    campaign.stage = 1;
    orchestrator::process_turn(&mut campaign, &services, &req).unwrap();

    assert_eq!(campaign.early_battles.len(), 1);
    let battle = &campaign.early_battles[0];
    assert_eq!(battle.nodes.len(), 2);
    assert_eq!(battle.groups.len(), 2);

    let red_pos = campaign.unit_by_name("red-1").unwrap().position;
    let blue_pos = campaign.unit_by_name("blue-1").unwrap().position;
    assert_eq!(red_pos, Point::new(150.0, 0.0));
    assert_eq!(blue_pos, Point::new(150.0, 0.0));
}

/// §8 scenario 4: both coalitions start the turn colocated at the same node.
#[test]
fn colocated_vehicles_resolve_into_a_same_node_battle() {
    let mut campaign = new_campaign(5);
    let services = fake_services();

    let mut units = HashMap::new();
    units.insert("red-1".to_string(), unit_report("Red Armor 1", "0,0", "red"));
    units.insert("blue-1".to_string(), unit_report("Blue Armor 1", "0,0", "blue"));
    let req = ProcessJsonRequest {
        routes: vec![vec!["0,0".to_string(), "300,0".to_string()]],
        units,
        goals: CoalitionPair { red: "0,0".to_string(), blue: "300,0".to_string() },
        bullseye: CoalitionPair { red: "0,0".to_string(), blue: "300,0".to_string() },
        mapmarkers: None,
        cornermarkers: None,
    };

    orchestrator::process_turn(&mut campaign, &services, &req).unwrap();

    assert_eq!(campaign.early_battles.len(), 1);
    let battle = &campaign.early_battles[0];
    assert_eq!(battle.nodes.len(), 1);
    assert_eq!(battle.groups.len(), 2);
}
