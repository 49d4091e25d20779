//! §4.7/§4.8: the turn state machine (`processjson`) and the four
//! mid-mission RPC handlers it sits alongside.

use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::battle;
use crate::campaign::{Campaign, GroupStart};
use crate::core::error::{CoreError, Result};
use crate::core::types::{Category, Coalition, GroupId, NodeId, Point};
use crate::graph::builder::{GraphBuilder, Route, RouteWaypoint};
use crate::movement::{antiaircraft, offensive, support};
use crate::services::Services;
use crate::stats::{self, DeathEvent, ShotRecord, VictoryOutcome};
use crate::transport::dto::{
    ChangeScoreRequest, CoalitionPair, DestroyedEntry, DynGroup, DynUnit, InfantryPosEntry, MissionEndRequest,
    MissionEndResponse, ProcessJsonRequest, ProcessJsonResponse, SupportDestroyedRequest, UnitDestroyedRequest,
};

fn parse_point(s: &str) -> Result<Point> {
    Point::parse_wire(s)
        .map(|(p, _)| p)
        .ok_or_else(|| CoreError::MalformedRequest(format!("bad coordinate {s:?}")))
}

fn parse_routes(raw: &[Vec<String>]) -> Result<Vec<Route>> {
    raw.iter()
        .map(|route| {
            route
                .iter()
                .map(|wp| {
                    Point::parse_wire(wp)
                        .map(|(point, reinforcement)| RouteWaypoint { point, reinforcement })
                        .ok_or_else(|| CoreError::MalformedRequest(format!("bad waypoint {wp:?}")))
                })
                .collect()
        })
        .collect()
}

/// §4.7 step 2. Compares the snapshot's non-dynamic unit census (if any
/// units are already known) against this turn's reported set; any mismatch
/// resets the campaign to a fresh stage 0 rather than erroring the turn.
fn reconcile(campaign: &mut Campaign, req: &ProcessJsonRequest) {
    if campaign.units.is_empty() {
        return;
    }
    let mismatch = {
        let existing: HashSet<&str> = campaign
            .groups
            .values()
            .filter(|g| !g.dynamic)
            .flat_map(|g| g.units.iter())
            .filter_map(|uid| campaign.units.get(uid))
            .map(|u| u.name.as_str())
            .collect();
        let reported: HashSet<&str> = req.units.keys().map(|s| s.as_str()).collect();
        existing != reported
    };
    if mismatch {
        tracing::warn!("unit census mismatch against persisted campaign, resetting");
        *campaign = Campaign::new(campaign.software_version.clone(), campaign.rng_seed, campaign.allowed_aa_units.clone());
    }
}

fn group_centroids(campaign: &Campaign) -> HashMap<GroupId, Point> {
    let mut sums: HashMap<GroupId, (f64, f64, u32)> = HashMap::new();
    for unit in campaign.units.values() {
        let entry = sums.entry(unit.group).or_insert((0.0, 0.0, 0));
        entry.0 += unit.position.x;
        entry.1 += unit.position.y;
        entry.2 += 1;
    }
    sums.into_iter()
        .filter(|(_, (_, _, n))| *n > 0)
        .map(|(gid, (sx, sy, n))| (gid, Point::new(sx / n as f64, sy / n as f64)))
        .collect()
}

fn unit_type_of_group(campaign: &Campaign, gid: GroupId) -> String {
    campaign
        .groups
        .get(&gid)
        .and_then(|g| g.units.first())
        .and_then(|uid| campaign.units.get(uid))
        .map(|u| u.unit_type.clone())
        .unwrap_or_default()
}

/// A coalition's own home base: the node nearest its own declared goal
/// coordinate (glossary: "Goal node"). Reinforcement ring distances and
/// base-infantry seeding are measured from here.
fn own_base(map: &crate::map::Map, c: Coalition) -> Option<NodeId> {
    match c {
        Coalition::Red => map.red_goal_node,
        Coalition::Blue => map.blue_goal_node,
        Coalition::Neutral => None,
    }
}

/// The node a coalition's offensive groups and reinforcements advance
/// toward: the *enemy's* home base — winning requires a vehicle reaching
/// within 2 hops of the other side's goal node.
fn advance_target(map: &crate::map::Map, c: Coalition) -> Option<NodeId> {
    match c {
        Coalition::Red => map.blue_goal_node,
        Coalition::Blue => map.red_goal_node,
        Coalition::Neutral => None,
    }
}

/// §6 "Scoring": `extra_scores[c] + Σ_groups (1 + m·UNIT_DISTANCE_MAX_MULTIPLIER)
/// · num_units · UNIT_BASE_SCORE`, `m` being `get_node_extra_multiplier` at
/// each of `c`'s groups' current node. The GUI/log sinks this feeds are out
/// of scope (§1); the engine only computes the pair and hands it out by
/// value (§5 "computed artifacts (images, score pairs) passed by value").
pub fn compute_score(campaign: &Campaign, c: Coalition, scoring: &crate::core::config::ScoringConfig) -> f64 {
    let mut total = campaign.extra_scores.get(c).to_owned();
    for group in campaign.groups.values() {
        if group.coalition != c || group.is_empty() {
            continue;
        }
        let Some(node) = group.node else { continue };
        let m = campaign.map.get_node_extra_multiplier(node, c);
        total += (1.0 + m * scoring.unit_distance_max_multiplier) * group.units.len() as f64 * scoring.unit_base_score;
    }
    total
}

fn coalition_key(c: Coalition) -> &'static str {
    match c {
        Coalition::Red => "red",
        Coalition::Blue => "blue",
        Coalition::Neutral => "neutral",
    }
}

/// Runs one full `processjson` turn (§4.7 steps 1-20).
pub fn process_turn(campaign: &mut Campaign, services: &Services, req: &ProcessJsonRequest) -> Result<ProcessJsonResponse> {
    // Step 1: parse.
    let routes = parse_routes(&req.routes)?;
    let red_goal = parse_point(&req.goals.red)?;
    let blue_goal = parse_point(&req.goals.blue)?;
    let red_bullseye = parse_point(&req.bullseye.red)?;
    let blue_bullseye = parse_point(&req.bullseye.blue)?;
    for (name, report) in &req.units {
        if Coalition::from_str_loose(&report.coalition).is_none() {
            return Err(CoreError::MalformedRequest(format!("unknown coalition for unit {name}")));
        }
        if Point::parse_wire(&report.pos).is_none() {
            return Err(CoreError::MalformedRequest(format!("bad position for unit {name}")));
        }
    }

    // Step 2: reconciliation.
    reconcile(campaign, req);

    // Step 3: graph construction, once per campaign.
    let building_graph = campaign.map.graph.is_empty();
    if building_graph {
        tracing::debug!(routes = routes.len(), "building campaign graph");
        campaign.map.graph = GraphBuilder::build(&routes);
    }

    // Step 4: upsert units.
    for (name, report) in &req.units {
        let category = Category::from_wire(&report.category);
        let coalition = Coalition::from_str_loose(&report.coalition).expect("validated above");
        let (pos, _) = Point::parse_wire(&report.pos).expect("validated above");
        campaign.upsert_unit(name, &report.group, category, coalition, pos, &report.unit_type, report.skill.as_deref());
    }

    // Step 5: stage-0 seeding.
    if campaign.stage == 0 {
        let positions = group_centroids(campaign);
        campaign.map.update_group_nodes(&mut campaign.groups, &positions);

        campaign.map.red_goal_node = campaign.map.find_node_by_center(red_goal);
        campaign.map.blue_goal_node = campaign.map.find_node_by_center(blue_goal);

        let max_infantry = services.config.campaign.max_infantry;
        if let Some(node) = campaign.map.red_goal_node {
            campaign.map.infantry_in_nodes.entry(node).or_default().blue = max_infantry;
        }
        if let Some(node) = campaign.map.blue_goal_node {
            campaign.map.infantry_in_nodes.entry(node).or_default().red = max_infantry;
        }
    }

    // Step 6: resources.
    campaign.resources_generic.red += 1;
    campaign.resources_generic.blue += 1;

    // Step 7: rebuild distance indices if the graph was just built.
    if building_graph {
        campaign.map.update_nodes_by_distance();
    }

    // Step 8: persist markers/bullseyes on first sighting.
    if campaign.map.red_bullseye.is_none() {
        campaign.map.red_bullseye = Some(red_bullseye);
    }
    if campaign.map.blue_bullseye.is_none() {
        campaign.map.blue_bullseye = Some(blue_bullseye);
    }
    if campaign.map.map_markers.is_empty() {
        if let Some(markers) = &req.mapmarkers {
            for (name, pos) in markers {
                if let Some((p, _)) = Point::parse_wire(pos) {
                    campaign.map.map_markers.push(crate::map::MapMarker { name: name.clone(), position: p });
                }
            }
        }
    }
    if campaign.map.corner_markers.is_empty() {
        if let Some(corners) = &req.cornermarkers {
            for pos in corners {
                if let Some((p, _)) = Point::parse_wire(pos) {
                    campaign.map.corner_markers.push(p);
                }
            }
        }
    }

    // Step 9: per-node multipliers.
    campaign.map.recompute_multipliers_for_red();

    // Step 10: clear per-mission ephemerals.
    campaign.early_battles.clear();
    campaign.deaths.clear();
    campaign.group_nodes_mission_start.clear();

    // Step 11: battle pass 1, mid-segment, against last turn's decisions.
    let potentials = battle::find_potential_battles(&campaign.map, &campaign.groups);
    let mid_battles = battle::resolve_actual_battles(
        &potentials,
        &campaign.unit_movement_decisions,
        &campaign.groups,
        &mut campaign.units,
        &campaign.map.graph,
    );
    let mid_segment_groups: HashSet<GroupId> = mid_battles.iter().flat_map(|b| b.groups.iter().copied()).collect();
    campaign.early_battles.extend(mid_battles);

    // Step 12: update_group_nodes.
    let positions = group_centroids(campaign);
    campaign.map.update_group_nodes(&mut campaign.groups, &positions);

    // Step 13: snapshot group_nodes_mission_start for every live vehicle group.
    let vehicle_group_ids: Vec<GroupId> = campaign
        .groups
        .values()
        .filter(|g| g.category == Category::Vehicle && !g.is_empty())
        .map(|g| g.id)
        .collect();
    for gid in &vehicle_group_ids {
        let (node, coalition) = {
            let g = &campaign.groups[gid];
            (g.node, g.coalition)
        };
        if let Some(node) = node {
            let unit_type = unit_type_of_group(campaign, *gid);
            campaign.group_nodes_mission_start.insert(*gid, GroupStart { node, coalition, unit_type });
        }
    }

    // Step 14: battle pass 2, same-node, excluding mid-segment participants.
    let same_node_battles = battle::get_battles_due_to_same_node(&campaign.map, &campaign.groups, &campaign.units, &mid_segment_groups);
    campaign.early_battles.extend(same_node_battles);

    let mut rng: ChaCha8Rng = campaign.take_rng();
    let mut decisions: HashMap<GroupId, NodeId> = HashMap::new();

    // Step 15: decide moves for non-AA, non-static vehicle groups.
    for gid in &vehicle_group_ids {
        let (node, coalition, is_static, is_spaa) = {
            let g = &campaign.groups[gid];
            (g.node, g.coalition, g.flags.is_static, g.flags.is_spaa)
        };
        if is_static || is_spaa {
            continue;
        }
        let Some(current) = node else { continue };
        if campaign.map.is_enemy_activity_in_node(coalition, current, &campaign.groups) {
            continue;
        }
        let Some(target) = advance_target(&campaign.map, coalition) else { continue };
        match offensive::decide_move(&campaign.map.graph, current, target, &mut rng) {
            Some(next) => {
                decisions.insert(*gid, next);
            }
            None => tracing::warn!(group = gid.0, "no path to advance target, dropping decision"),
        }
    }

    // Step 16: support procurement and movement, randomized coalition order.
    let mut coalitions = [Coalition::Red, Coalition::Blue];
    coalitions.shuffle(&mut rng);
    let max_infantry = services.config.campaign.max_infantry;
    for c in coalitions {
        let num = *campaign.map.num_support_units.get(c);
        if num <= 2 {
            let resources = campaign.resources_generic.get_mut(c);
            if *resources >= 1 {
                *resources -= 1;
                campaign.map.num_support_units.set(c, 7);
                campaign.map.support_unit_nodes.set(c, advance_target(&campaign.map, c));
            } else {
                tracing::warn!(coalition = coalition_key(c), "support restock due but no resources");
            }
            continue;
        }
        let Some(base) = own_base(&campaign.map, c) else { continue };
        let current = (*campaign.map.support_unit_nodes.get(c)).unwrap_or(base);
        if let Some(dest) = support::decide_support_move(&campaign.map.graph, &campaign.map, &campaign.groups, c, base, current, max_infantry, &mut rng) {
            let rec = campaign.map.infantry_in_nodes.entry(dest).or_default();
            match c {
                Coalition::Red => rec.red = max_infantry,
                Coalition::Blue => rec.blue = max_infantry,
                Coalition::Neutral => {}
            }
            campaign.map.support_unit_nodes.set(c, Some(dest));
        }
    }

    // Step 17: AA procurement, same randomized order.
    let mut new_dyn_groups: HashMap<Coalition, Vec<DynGroup>> = HashMap::new();
    for c in coalitions {
        let resources = campaign.resources_generic.get_mut(c);
        if *resources < 2 {
            continue;
        }
        *resources -= 2;
        let allowed = campaign.allowed_aa_units.get(c).clone();
        let Some(unit_type) = allowed.choose(&mut rng).cloned() else {
            tracing::warn!(coalition = coalition_key(c), "no allowed AA unit types configured");
            continue;
        };
        let Some(base) = advance_target(&campaign.map, c) else { continue };
        let n = campaign.mint_aa_unit_id();
        let group_name = format!("Anti-aircraft {} {n} (dyn) __spaa__", coalition_key(c));
        let unit_name = format!("aa-{n}");
        let (Some(coord), _) = (campaign.map.graph.node(base).map(|d| d.coord), ()) else {
            continue;
        };
        let group_id = campaign.ensure_group(&group_name, Category::Vehicle, c, true);
        let unit_id = campaign.upsert_unit(&unit_name, &group_name, Category::Vehicle, c, coord, &unit_type, None);
        campaign.map.groups_in_nodes.entry(base).or_default().insert(group_id);
        if let Some(g) = campaign.groups.get_mut(&group_id) {
            g.node = Some(base);
        }
        new_dyn_groups.entry(c).or_default().push(DynGroup {
            category: "vehicle".to_string(),
            name: group_name,
            units: vec![DynUnit {
                name: unit_name,
                unit_type,
                skill: crate::entities::unit::DEFAULT_SKILL.to_string(),
                pos: coord.to_wire(),
            }],
        });
        let _ = unit_id;
    }

    // Step 18: decide moves for AA groups.
    let spaa_group_ids: Vec<GroupId> = campaign.groups.values().filter(|g| g.flags.is_spaa && !g.is_empty()).map(|g| g.id).collect();
    for gid in spaa_group_ids {
        let (node, coalition) = {
            let g = &campaign.groups[&gid];
            (g.node, g.coalition)
        };
        let Some(current) = node else { continue };
        if let Some(next) = antiaircraft::decide_aa_move(&campaign.map.graph, &campaign.map, &campaign.groups, coalition, current, &mut rng) {
            decisions.insert(gid, next);
        }
    }

    campaign.put_rng(rng);

    // Apply this turn's movement decisions to each group's destination.
    for (&gid, &node) in &decisions {
        if let Some(g) = campaign.groups.get_mut(&gid) {
            g.destination_node = Some(node);
        }
    }
    campaign.unit_movement_decisions = decisions.clone();

    // Step 19: air-target selection.
    let red_threat_objective = own_base(&campaign.map, Coalition::Red);
    let blue_threat_objective = own_base(&campaign.map, Coalition::Blue);
    let red_threat = red_threat_objective.and_then(|n| campaign.map.find_greatest_threat_node(n, Coalition::Blue, &campaign.groups));
    let blue_threat = blue_threat_objective.and_then(|n| campaign.map.find_greatest_threat_node(n, Coalition::Red, &campaign.groups));
    let (Some(red_threat), Some(blue_threat)) = (red_threat, blue_threat) else {
        return Err(CoreError::NoThreatsDefined);
    };
    let airdest = CoalitionPair {
        red: campaign.map.graph.node(red_threat).map(|n| n.coord.to_wire()).unwrap_or_default(),
        blue: campaign.map.graph.node(blue_threat).map(|n| n.coord.to_wire()).unwrap_or_default(),
    };

    // Step 20: build the response and persist.
    let response = build_response(campaign, &decisions, airdest, new_dyn_groups);
    let red_score = compute_score(campaign, Coalition::Red, &services.config.scoring);
    let blue_score = compute_score(campaign, Coalition::Blue, &services.config.scoring);
    tracing::info!(red_score, blue_score, "turn scored");
    services.snapshot_store.save(campaign)?;
    Ok(response)
}

fn build_response(
    campaign: &Campaign,
    decisions: &HashMap<GroupId, NodeId>,
    airdest: CoalitionPair,
    new_dyn_groups: HashMap<Coalition, Vec<DynGroup>>,
) -> ProcessJsonResponse {
    let mut destroyed = HashMap::new();
    for (unit, group) in &campaign.destroyed_unit_names_and_groups {
        destroyed.insert(unit.clone(), DestroyedEntry { group: group.clone() });
    }

    let mut groupspos = HashMap::new();
    let mut groupsdest = HashMap::new();
    for group in campaign.groups.values() {
        if group.flags.is_marker || group.is_empty() {
            continue;
        }
        let Some(node) = group.node else { continue };
        let Some(coord) = campaign.map.graph.node(node).map(|n| n.coord) else { continue };
        groupspos.insert(group.name.clone(), coord.to_wire());

        let dest_coord = decisions
            .get(&group.id)
            .and_then(|n| campaign.map.graph.node(*n))
            .map(|n| n.coord)
            .unwrap_or(coord);
        groupsdest.insert(group.name.clone(), dest_coord.to_wire());
    }

    let mut supportpos = HashMap::new();
    let mut supportnum = HashMap::new();
    for c in [Coalition::Red, Coalition::Blue] {
        if let Some(node) = campaign.map.support_unit_nodes.get(c) {
            if let Some(coord) = campaign.map.graph.node(*node).map(|n| n.coord) {
                supportpos.insert(coalition_key(c).to_string(), coord.to_wire());
            }
        }
        supportnum.insert(coalition_key(c).to_string(), *campaign.map.num_support_units.get(c));
    }

    let mut infantrypos: HashMap<String, Vec<InfantryPosEntry>> = HashMap::new();
    infantrypos.insert("red".to_string(), Vec::new());
    infantrypos.insert("blue".to_string(), Vec::new());
    for (&node, rec) in &campaign.map.infantry_in_nodes {
        let Some(coord) = campaign.map.graph.node(node).map(|n| n.coord) else { continue };
        if rec.red > 0 {
            infantrypos.get_mut("red").unwrap().push(InfantryPosEntry { pos: coord.to_wire(), number: rec.red });
        }
        if rec.blue > 0 {
            infantrypos.get_mut("blue").unwrap().push(InfantryPosEntry { pos: coord.to_wire(), number: rec.blue });
        }
    }

    let mut dyngroups: HashMap<String, Vec<DynGroup>> = HashMap::new();
    dyngroups.insert("red".to_string(), new_dyn_groups.get(&Coalition::Red).cloned().unwrap_or_default());
    dyngroups.insert("blue".to_string(), new_dyn_groups.get(&Coalition::Blue).cloned().unwrap_or_default());

    ProcessJsonResponse {
        code: "0".to_string(),
        stage: campaign.stage,
        destroyed,
        groupspos,
        groupsdest,
        airdest,
        supportpos,
        supportnum,
        infantrypos,
        dyngroups,
    }
}

pub fn handle_unit_destroyed(campaign: &mut Campaign, req: &UnitDestroyedRequest) -> Result<()> {
    campaign.destroy_unit(&req.unitname, &req.groupname, req.time);
    Ok(())
}

pub fn handle_support_destroyed(campaign: &mut Campaign, req: &SupportDestroyedRequest) -> Result<()> {
    let c = Coalition::from_str_loose(&req.coalition)
        .ok_or_else(|| CoreError::MalformedRequest(format!("unknown coalition {:?}", req.coalition)))?;
    campaign.map.num_support_units.set(c, 0);
    campaign.map.support_unit_nodes.set(c, None);
    Ok(())
}

pub fn handle_change_score(campaign: &mut Campaign, services: &Services, req: &ChangeScoreRequest) -> Result<()> {
    let c = Coalition::from_str_loose(&req.coalition)
        .ok_or_else(|| CoreError::MalformedRequest(format!("unknown coalition {:?}", req.coalition)))?;
    let Some(enemy) = c.enemy() else { return Ok(()) };
    let amount = services.config.scoring.per_reason.get(&req.reason).copied().unwrap_or(0.0);
    *campaign.extra_scores.get_mut(enemy) += amount;
    Ok(())
}

/// §4.8: statistics extraction plus the victory check. Deletes the snapshot
/// on a decisive outcome (win or draw) so the next `processjson` starts a
/// fresh campaign; a `Continue` outcome only advances `stage`.
pub fn handle_mission_end(campaign: &mut Campaign, services: &Services, req: &MissionEndRequest) -> Result<MissionEndResponse> {
    let mission_time = req.time - req.starttime;

    let shots: Vec<ShotRecord> = req
        .shot
        .iter()
        .filter_map(|s| {
            let target = *campaign.unit_ids_by_name.get(&s.target)?;
            let shooter_start_node = s
                .shooter
                .as_ref()
                .and_then(|name| campaign.unit_ids_by_name.get(name))
                .and_then(|uid| campaign.units.get(uid))
                .and_then(|u| campaign.group_nodes_mission_start.get(&u.group))
                .map(|start| start.node);
            Some(ShotRecord { target, time: s.time, shooter_is_plane: s.plane, shooter_start_node })
        })
        .collect();

    let deaths: Vec<DeathEvent> = campaign.deaths.clone();
    stats::extract_and_record(&campaign.early_battles, &deaths, &shots, mission_time, services.conflict_store.as_ref())?;

    let (Some(red_goal), Some(blue_goal)) = (campaign.map.red_goal_node, campaign.map.blue_goal_node) else {
        return Err(CoreError::GraphInconsistency("goals not resolved".to_string()));
    };
    let outcome = stats::check_victory(&campaign.map.graph, red_goal, blue_goal, &campaign.groups, &campaign.map.infantry_in_nodes);

    let response = match outcome {
        VictoryOutcome::Continue => {
            campaign.stage += 1;
            MissionEndResponse { code: "0".to_string(), event: "continue".to_string(), result: None }
        }
        VictoryOutcome::Draw => {
            services.snapshot_store.delete()?;
            services.message_sink.notify("Campaign ended in a draw".to_string());
            MissionEndResponse { code: "0".to_string(), event: "end".to_string(), result: Some("Draw".to_string()) }
        }
        VictoryOutcome::Won(c) => {
            services.snapshot_store.delete()?;
            let result = format!("{} coalition won", titlecase(coalition_key(c)));
            services.message_sink.notify(format!("Campaign ended: {result}"));
            MissionEndResponse { code: "0".to_string(), event: "end".to_string(), result: Some(result) }
        }
    };
    if !matches!(outcome, VictoryOutcome::Continue) {
        return Ok(response);
    }
    services.snapshot_store.save(campaign)?;
    Ok(response)
}

fn titlecase(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Category, Point, UnitId};
    use crate::entities::Unit;
    use crate::map::PerCoalition;
    use std::collections::HashMap as Map_;

    fn two_node_request() -> ProcessJsonRequest {
        let mut units = Map_::new();
        units.insert(
            "red-1".to_string(),
            crate::transport::dto::UnitReport {
                group: "Red Armor 1".to_string(),
                pos: "0,0".to_string(),
                unit_type: "T-80".to_string(),
                category: "vehicle".to_string(),
                coalition: "red".to_string(),
                skill: None,
            },
        );
        ProcessJsonRequest {
            routes: vec![vec!["0,0".to_string(), "100,0".to_string()]],
            units,
            goals: CoalitionPair { red: "0,0".to_string(), blue: "100,0".to_string() },
            bullseye: CoalitionPair { red: "0,0".to_string(), blue: "100,0".to_string() },
            mapmarkers: None,
            cornermarkers: None,
        }
    }

    #[test]
    fn two_node_trivial_turn_advances_red_to_blue_goal() {
        let mut campaign = Campaign::new("1.0.0.0".to_string(), 7, PerCoalition::new(vec!["Igla".to_string()], vec!["Chaparral".to_string()]));
        let services = Services::fake();
        let req = two_node_request();

        let response = process_turn(&mut campaign, &services, &req).unwrap();
        assert_eq!(response.code, "0");
        assert_eq!(response.groupsdest.get("Red Armor 1").map(|s| s.as_str()), Some("100.000000,0.000000"));
    }

    #[test]
    fn compute_score_adds_extra_scores_to_per_group_presence() {
        let mut campaign = Campaign::new("1.0.0.0".to_string(), 1, PerCoalition::default());
        let mut g = crate::graph::Graph::new();
        g.add_node(NodeId(0), Point::new(0.0, 0.0), false);
        g.add_node(NodeId(1), Point::new(100.0, 0.0), false);
        g.add_edge(NodeId(0), NodeId(1), 100.0);
        campaign.map.graph = g;
        campaign.map.red_goal_node = Some(NodeId(0));
        campaign.map.blue_goal_node = Some(NodeId(1));
        campaign.map.recompute_multipliers_for_red();
        *campaign.extra_scores.get_mut(Coalition::Red) = 5.0;

        campaign.upsert_unit("red-1", "Red Armor 1", Category::Vehicle, Coalition::Red, Point::new(0.0, 0.0), "tank", None);
        let gid = campaign.group_ids_by_name["Red Armor 1"];
        campaign.groups.get_mut(&gid).unwrap().node = Some(NodeId(0));

        let scoring = crate::core::config::ScoringConfig::default();
        let score = compute_score(&campaign, Coalition::Red, &scoring);
        assert!(score > 5.0, "presence of a live group should add on top of extra_scores");
        assert_eq!(compute_score(&campaign, Coalition::Blue, &scoring), 0.0);
    }

    #[test]
    fn unit_destroyed_is_idempotent_and_recorded() {
        let mut campaign = Campaign::new("1.0.0.0".to_string(), 1, PerCoalition::default());
        campaign.upsert_unit("red-1", "Red Armor 1", Category::Vehicle, Coalition::Red, Point::new(0.0, 0.0), "tank", None);
        let req = UnitDestroyedRequest { unitname: "red-1".to_string(), groupname: "Red Armor 1".to_string(), time: 10 };
        handle_unit_destroyed(&mut campaign, &req).unwrap();
        assert!(campaign.destroyed_unit_names_and_groups.contains_key("red-1"));
        assert_eq!(campaign.deaths.len(), 1);
    }

    #[test]
    fn change_score_credits_the_opposing_coalition() {
        let mut campaign = Campaign::new("1.0.0.0".to_string(), 1, PerCoalition::default());
        let services = Services::fake();
        let req = ChangeScoreRequest { reason: "player_death".to_string(), coalition: "red".to_string(), unitname: "red-1".to_string() };
        handle_change_score(&mut campaign, &services, &req).unwrap();
        assert_eq!(campaign.extra_scores.blue, 10.0);
        assert_eq!(campaign.extra_scores.red, 0.0);
    }

    #[test]
    fn support_destroyed_forces_restock_next_turn() {
        let mut campaign = Campaign::new("1.0.0.0".to_string(), 1, PerCoalition::default());
        campaign.map.num_support_units.blue = 5;
        let req = SupportDestroyedRequest { coalition: "blue".to_string() };
        handle_support_destroyed(&mut campaign, &req).unwrap();
        assert_eq!(campaign.map.num_support_units.blue, 0);
    }

    /// §8 scenario 6: blue's support count starts at (or drops to) `<=2`, so
    /// the very first turn spends 1 resource, resets the count to 7, and
    /// repositions blue's support unit to the *opposing* base — `red_goal_node`.
    #[test]
    fn turn_restocks_support_at_the_opposing_base() {
        let mut campaign = Campaign::new("1.0.0.0".to_string(), 7, PerCoalition::new(vec!["Igla".to_string()], vec!["Chaparral".to_string()]));
        let services = Services::fake();
        let req = two_node_request();

        process_turn(&mut campaign, &services, &req).unwrap();

        assert_eq!(campaign.map.num_support_units.blue, 7);
        assert_eq!(campaign.map.support_unit_nodes.blue, campaign.map.red_goal_node);
        assert_eq!(campaign.resources_generic.blue, 0);
    }

    #[test]
    fn mission_end_victory_deletes_snapshot() {
        let mut campaign = Campaign::new("1.0.0.0".to_string(), 1, PerCoalition::default());
        let services = Services::fake();

        let mut g = crate::graph::Graph::new();
        g.add_node(NodeId(0), Point::new(0.0, 0.0), false);
        g.add_node(NodeId(1), Point::new(100.0, 0.0), false);
        g.add_edge(NodeId(0), NodeId(1), 100.0);
        campaign.map.graph = g;
        campaign.map.red_goal_node = Some(NodeId(0));
        campaign.map.blue_goal_node = Some(NodeId(1));

        let gid = campaign.ensure_group("Red Armor 1", Category::Vehicle, Coalition::Red, false);
        let uid = UnitId(0);
        campaign.units.insert(uid, Unit::new(uid, "red-1".to_string(), gid, Point::new(100.0, 0.0), "T-80".to_string()));
        campaign.unit_ids_by_name.insert("red-1".to_string(), uid);
        if let Some(g) = campaign.groups.get_mut(&gid) {
            g.units.push(uid);
            g.node = Some(NodeId(1));
        }

        let req = MissionEndRequest { shot: vec![], time: 1000, starttime: 0 };
        let response = handle_mission_end(&mut campaign, &services, &req).unwrap();
        assert_eq!(response.event, "end");
        assert_eq!(response.result, Some("Red coalition won".to_string()));
    }
}
