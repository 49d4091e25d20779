//! Full `process_turn` integration tests for the literal end-to-end scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use campaign_engine::campaign::Campaign;
use campaign_engine::core::config::Config;
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

/// §8 scenario 1: a red vehicle alone on a two-node route advances straight
/// to the blue-goal node.
#[test]
fn two_node_trivial_turn_advances_red_toward_blue_goal() {
    let mut campaign = new_campaign(7);
    let services = fake_services();

    let mut units = HashMap::new();
    units.insert("red-1".to_string(), unit_report("Red Armor 1", "0,0", "red"));
    let req = ProcessJsonRequest {
        routes: vec![vec!["0,0".to_string(), "100,0".to_string()]],
        units,
        goals: CoalitionPair { red: "0,0".to_string(), blue: "100,0".to_string() },
        bullseye: CoalitionPair { red: "0,0".to_string(), blue: "100,0".to_string() },
        mapmarkers: None,
        cornermarkers: None,
    };

    let response = orchestrator::process_turn(&mut campaign, &services, &req).unwrap();
    assert_eq!(response.code, "0");
    assert_eq!(response.groupsdest.get("Red Armor 1").map(|s| s.as_str()), Some("100.000000,0.000000"));
}

/// §8 scenario 2: a diamond where one route to the shared destination is
/// far more than 1.33x longer than the other. `decide_move` must never pick
/// the longer route's first step (the distant relay at (-1000,1000)).
#[test]
fn detour_rejection_never_picks_the_longer_routes_first_step() {
    let mut campaign = new_campaign(3);
    let services = fake_services();

    let mut units = HashMap::new();
    units.insert("red-1".to_string(), unit_report("Red Armor 1", "0,0", "red"));

    let req = ProcessJsonRequest {
        routes: vec![
            vec!["0,0".to_string(), "300,0".to_string(), "300,300".to_string()],
            vec!["0,0".to_string(), "-1000,1000".to_string(), "300,300".to_string()],
        ],
        units,
        goals: CoalitionPair { red: "0,0".to_string(), blue: "300,300".to_string() },
        bullseye: CoalitionPair { red: "0,0".to_string(), blue: "300,300".to_string() },
        mapmarkers: None,
        cornermarkers: None,
    };

    let response = orchestrator::process_turn(&mut campaign, &services, &req).unwrap();
    let dest = response.groupsdest.get("Red Armor 1").cloned();
    assert_ne!(dest.as_deref(), Some("-1000.000000,1000.000000"));
    assert_eq!(dest.as_deref(), Some("300.000000,0.000000"));
}
