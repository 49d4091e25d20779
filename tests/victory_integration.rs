//! §8 scenario 5: `missionend` declares victory and deletes the snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use campaign_engine::campaign::Campaign;
use campaign_engine::core::config::Config;
use campaign_engine::map::PerCoalition;
use campaign_engine::orchestrator;
use campaign_engine::services::notify::NullMessageSink;
use campaign_engine::services::persistence::InMemorySnapshotStore;
use campaign_engine::services::Services;
use campaign_engine::services::persistence::SnapshotStore;
use campaign_engine::stats::store::InMemoryConflictStore;
use campaign_engine::transport::dto::{CoalitionPair, MissionEndRequest, ProcessJsonRequest, UnitReport};

fn services_with(snapshot_store: Arc<InMemorySnapshotStore>) -> Services {
    Services::new(
        Config::default(),
        snapshot_store,
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

/// A red vehicle camped right on the blue-goal node, with no blue infantry
/// there, is within 0 hops (< 2) of its win condition and no blue presence
/// contests it: red wins and the snapshot is cleared.
#[test]
fn red_vehicle_on_the_blue_goal_node_wins_and_clears_the_snapshot() {
    let snapshot_store = Arc::new(InMemorySnapshotStore::default());
    let services = services_with(snapshot_store.clone());
    let mut campaign = new_campaign(1);

    let mut units = HashMap::new();
    units.insert("red-1".to_string(), unit_report("Red Armor 1", "300,0", "red"));
    let req = ProcessJsonRequest {
        routes: vec![vec!["0,0".to_string(), "300,0".to_string()]],
        units,
        goals: CoalitionPair { red: "0,0".to_string(), blue: "300,0".to_string() },
        bullseye: CoalitionPair { red: "0,0".to_string(), blue: "300,0".to_string() },
        mapmarkers: None,
        cornermarkers: None,
    };
    orchestrator::process_turn(&mut campaign, &services, &req).unwrap();
    snapshot_store.save(&campaign).unwrap();

    let end_req = MissionEndRequest { shot: vec![], time: 1000, starttime: 0 };
    let response = orchestrator::handle_mission_end(&mut campaign, &services, &end_req).unwrap();

    assert_eq!(response.code, "0");
    assert_eq!(response.event, "end");
    assert_eq!(response.result, Some("Red coalition won".to_string()));
    assert!(snapshot_store.load().unwrap().is_none());
}

/// Neither side is near the other's goal: the mission simply continues and
/// the stage advances.
#[test]
fn neither_side_near_the_enemy_goal_just_continues() {
    let snapshot_store = Arc::new(InMemorySnapshotStore::default());
    let services = services_with(snapshot_store.clone());
    let mut campaign = new_campaign(1);

    let mut units = HashMap::new();
    units.insert("red-1".to_string(), unit_report("Red Armor 1", "0,0", "red"));
    let req = ProcessJsonRequest {
        routes: vec![vec!["0,0".to_string(), "300,0".to_string(), "600,0".to_string()]],
        units,
        goals: CoalitionPair { red: "0,0".to_string(), blue: "600,0".to_string() },
        bullseye: CoalitionPair { red: "0,0".to_string(), blue: "600,0".to_string() },
        mapmarkers: None,
        cornermarkers: None,
    };
    orchestrator::process_turn(&mut campaign, &services, &req).unwrap();
    snapshot_store.save(&campaign).unwrap();

    let end_req = MissionEndRequest { shot: vec![], time: 1000, starttime: 0 };
    let response = orchestrator::handle_mission_end(&mut campaign, &services, &end_req).unwrap();

    assert_eq!(response.event, "continue");
    assert_eq!(response.result, None);
    assert_eq!(campaign.stage, 1);
    assert!(snapshot_store.load().unwrap().is_some());
}
