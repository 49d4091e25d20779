//! §4.8: `missionend`'s cleanup algorithm, turning noisy battle/death/shot
//! data into clean statistics records, plus the victory-condition check.

pub mod store;

pub use store::{BattleStatistics, ConflictStore, InMemoryConflictStore, SqliteConflictStore};

use std::collections::{HashMap, HashSet};

use crate::battle::Battle;
use crate::core::types::{Coalition, GroupId, NodeId, UnitId};
use crate::entities::Group;
use crate::graph::Graph;

/// A unit's death during the mission (Campaign's ephemeral `deaths` log).
#[derive(Debug, Clone)]
pub struct DeathEvent {
    pub unit: UnitId,
    pub coalition: Coalition,
    pub time: i64,
}

/// A "unit was shot at" record from the host's final mission report.
#[derive(Debug, Clone)]
pub struct ShotRecord {
    pub target: UnitId,
    pub time: i64,
    pub shooter_is_plane: bool,
    /// The ground shooter's node at mission start, when known. `None` if the
    /// host didn't report it (never treated as proof of externality).
    pub shooter_start_node: Option<NodeId>,
}

/// §4.8 step 1: the smallest timestamp among shots against `battle`'s
/// participants where the shooter was either a plane, or a ground unit
/// whose starting node falls outside the battle's node set.
fn earliest_external_engagement(battle: &Battle, participants: &HashSet<UnitId>, shots: &[ShotRecord]) -> Option<i64> {
    shots
        .iter()
        .filter(|s| participants.contains(&s.target))
        .filter(|s| {
            s.shooter_is_plane
                || s.shooter_start_node.map(|n| !battle.nodes.contains(&n)).unwrap_or(false)
        })
        .map(|s| s.time)
        .min()
}

/// §4.8 step 2: whether one coalition was entirely wiped from the battle's
/// participants before `cutoff`, and if so, the effective end time (the
/// latest death of the losing coalition).
fn wiped_before(battle: &Battle, cutoff: i64, deaths: &[DeathEvent]) -> Option<i64> {
    for coalition in [Coalition::Red, Coalition::Blue] {
        let side: Vec<UnitId> = battle
            .initial_roster
            .iter()
            .filter(|r| r.coalition == coalition)
            .map(|r| r.unit)
            .collect();
        if side.is_empty() {
            continue;
        }
        let death_times: HashMap<UnitId, i64> = deaths
            .iter()
            .filter(|d| d.time < cutoff)
            .map(|d| (d.unit, d.time))
            .collect();
        if side.iter().all(|u| death_times.contains_key(u)) {
            let latest = side.iter().filter_map(|u| death_times.get(u)).copied().max();
            if let Some(t) = latest {
                return Some(t);
            }
        }
    }
    None
}

/// Resolves a battle to its effective end time (`None` from step 1 means
/// "clean as-is", represented here as `i64::MAX` — no external cutoff
/// applies), or `None` to discard it entirely.
fn resolve_battle_end(battle: &Battle, deaths: &[DeathEvent], shots: &[ShotRecord]) -> Option<i64> {
    let participants: HashSet<UnitId> = battle.initial_roster.iter().map(|r| r.unit).collect();
    match earliest_external_engagement(battle, &participants, shots) {
        None => Some(i64::MAX),
        Some(cutoff) => wiped_before(battle, cutoff, deaths),
    }
}

/// §4.8 step 3: builds the clean-battle record. A unit counts as surviving
/// if it never died before `end_time`.
fn extract_statistics(battle: &Battle, end_time: i64, deaths: &[DeathEvent]) -> BattleStatistics {
    let died_before: HashSet<UnitId> = deaths.iter().filter(|d| d.time < end_time).map(|d| d.unit).collect();

    let mut stats = BattleStatistics::default();
    for entry in &battle.initial_roster {
        match entry.coalition {
            Coalition::Red => {
                stats.initial_red.push(entry.unit_type.clone());
                if !died_before.contains(&entry.unit) {
                    stats.surviving_red.push(entry.unit_type.clone());
                }
            }
            Coalition::Blue => {
                stats.initial_blue.push(entry.unit_type.clone());
                if !died_before.contains(&entry.unit) {
                    stats.surviving_blue.push(entry.unit_type.clone());
                }
            }
            Coalition::Neutral => {}
        }
    }
    stats
}

/// Runs the full cleanup pass over this mission's battles and writes each
/// clean one to `store`. Returns how many were recorded (for logging).
pub fn extract_and_record(
    battles: &[Battle],
    deaths: &[DeathEvent],
    shots: &[ShotRecord],
    mission_time: i64,
    store: &dyn ConflictStore,
) -> crate::core::error::Result<usize> {
    let mut recorded = 0;
    for battle in battles {
        let Some(end_time) = resolve_battle_end(battle, deaths, shots) else {
            continue;
        };
        let stats = extract_statistics(battle, end_time, deaths);
        store.record_battle(&stats, mission_time)?;
        recorded += 1;
    }
    Ok(recorded)
}

/// §4.8 step 4 victory outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VictoryOutcome {
    Draw,
    Won(Coalition),
    Continue,
}

/// Whether any vehicle group of `c` sits within 2 hops of `c`'s goal node
/// (shortest path length < 3, i.e. at most 2 edges) with no enemy infantry
/// present there.
fn has_winning_presence(
    graph: &Graph,
    goal: NodeId,
    c: Coalition,
    groups: &HashMap<GroupId, Group>,
    infantry_in_nodes: &HashMap<NodeId, crate::map::InfantryRecord>,
) -> bool {
    let enemy = c.enemy();
    groups.values().filter(|g| g.coalition == c && !g.is_empty() && g.category == crate::core::types::Category::Vehicle).any(|g| {
        let Some(node) = g.node else { return false };
        let Some(path) = graph.shortest_path(node, goal, None) else {
            return false;
        };
        if path.len() >= 3 {
            return false;
        }
        let enemy_infantry = enemy
            .and_then(|e| infantry_in_nodes.get(&node).map(|rec| match e {
                Coalition::Red => rec.red,
                Coalition::Blue => rec.blue,
                Coalition::Neutral => 0,
            }))
            .unwrap_or(0);
        enemy_infantry == 0
    })
}

pub fn check_victory(
    graph: &Graph,
    red_goal: NodeId,
    blue_goal: NodeId,
    groups: &HashMap<GroupId, Group>,
    infantry_in_nodes: &HashMap<NodeId, crate::map::InfantryRecord>,
) -> VictoryOutcome {
    let any_vehicles = groups.values().any(|g| g.category == crate::core::types::Category::Vehicle && !g.is_empty());
    if !any_vehicles {
        return VictoryOutcome::Draw;
    }

    let red_wins = has_winning_presence(graph, blue_goal, Coalition::Red, groups, infantry_in_nodes);
    let blue_wins = has_winning_presence(graph, red_goal, Coalition::Blue, groups, infantry_in_nodes);

    match (red_wins, blue_wins) {
        (true, true) => VictoryOutcome::Draw,
        (true, false) => VictoryOutcome::Won(Coalition::Red),
        (false, true) => VictoryOutcome::Won(Coalition::Blue),
        (false, false) => VictoryOutcome::Continue,
    }
}
