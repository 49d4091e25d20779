//! §3/§9: `Campaign`, the single store every entity and index lives under,
//! keyed by stable integer ids with name-indexed secondary maps (design
//! note 9's re-architecture of the cyclic name-keyed object graph).

use std::collections::HashMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::battle::Battle;
use crate::core::types::{Category, Coalition, GroupId, NodeId, Point, UnitId};
use crate::entities::{Group, Unit};
use crate::map::{Map, PerCoalition};
use crate::stats::DeathEvent;

/// A group's (node, coalition, type) as of the moment this mission's turn
/// began, snapshotted for battle-statistics purposes (§4.7 step 13).
#[derive(Debug, Clone)]
pub struct GroupStart {
    pub node: NodeId,
    pub coalition: Coalition,
    pub unit_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub stage: u32,
    pub map: Map,

    pub resources_generic: PerCoalition<u32>,
    pub extra_scores: PerCoalition<f64>,

    pub units: HashMap<UnitId, Unit>,
    pub groups: HashMap<GroupId, Group>,
    pub unit_ids_by_name: HashMap<String, UnitId>,
    pub group_ids_by_name: HashMap<String, GroupId>,

    pub unit_movement_decisions: HashMap<GroupId, NodeId>,
    /// unit name -> group name, permanent once entered (destroyed
    /// monotonicity, §8).
    pub destroyed_unit_names_and_groups: HashMap<String, String>,

    pub aa_unit_id_counter: u32,
    pub allowed_aa_units: PerCoalition<Vec<String>>,
    pub software_version: String,

    next_unit_id: u32,
    next_group_id: u32,

    /// Seed for the per-campaign RNG (design note: "Random determinism").
    /// Recorded so turns are replayable; the live generator itself is
    /// rebuilt from it lazily and never serialized.
    pub rng_seed: u64,
    #[serde(skip)]
    rng: Option<ChaCha8Rng>,

    // Ephemeral per-mission state (§3) — never persisted.
    #[serde(skip)]
    pub early_battles: Vec<Battle>,
    #[serde(skip)]
    pub deaths: Vec<DeathEvent>,
    #[serde(skip)]
    pub group_nodes_mission_start: HashMap<GroupId, GroupStart>,
}

impl Campaign {
    pub fn new(software_version: String, rng_seed: u64, allowed_aa_units: PerCoalition<Vec<String>>) -> Self {
        Self {
            stage: 0,
            map: Map::new(crate::graph::Graph::new()),
            resources_generic: PerCoalition::default(),
            extra_scores: PerCoalition::default(),
            units: HashMap::new(),
            groups: HashMap::new(),
            unit_ids_by_name: HashMap::new(),
            group_ids_by_name: HashMap::new(),
            unit_movement_decisions: HashMap::new(),
            destroyed_unit_names_and_groups: HashMap::new(),
            aa_unit_id_counter: 0,
            allowed_aa_units,
            software_version,
            next_unit_id: 0,
            next_group_id: 0,
            rng_seed,
            rng: None,
            early_battles: Vec::new(),
            deaths: Vec::new(),
            group_nodes_mission_start: HashMap::new(),
        }
    }

    /// The per-campaign RNG (design note: "Random determinism" — one seeded
    /// stream per campaign). Lazily rebuilt from `rng_seed` after a snapshot
    /// load, since the live generator state itself is never serialized.
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        self.rng.get_or_insert_with(|| ChaCha8Rng::seed_from_u64(self.rng_seed))
    }

    /// Takes the live RNG out for a scope of calls that also need `&self`/
    /// `&mut self` elsewhere (the orchestrator's per-turn decision passes);
    /// pair with [`Campaign::put_rng`].
    pub(crate) fn take_rng(&mut self) -> ChaCha8Rng {
        self.rng.take().unwrap_or_else(|| ChaCha8Rng::seed_from_u64(self.rng_seed))
    }

    pub(crate) fn put_rng(&mut self, rng: ChaCha8Rng) {
        self.rng = Some(rng);
    }

    pub fn group_by_name(&self, name: &str) -> Option<&Group> {
        self.group_ids_by_name.get(name).and_then(|id| self.groups.get(id))
    }

    pub fn unit_by_name(&self, name: &str) -> Option<&Unit> {
        self.unit_ids_by_name.get(name).and_then(|id| self.units.get(id))
    }

    /// Finds or creates the named group, minting a fresh `GroupId` the first
    /// time it's seen.
    pub fn ensure_group(&mut self, name: &str, category: Category, coalition: Coalition, dynamic: bool) -> GroupId {
        if let Some(&id) = self.group_ids_by_name.get(name) {
            return id;
        }
        let id = GroupId(self.next_group_id);
        self.next_group_id += 1;
        let group = Group::new(id, name.to_string(), category, coalition, dynamic);
        self.groups.insert(id, group);
        self.group_ids_by_name.insert(name.to_string(), id);
        id
    }

    /// Upserts a unit, joining/creating its group. At `stage == 0` the
    /// reported position overwrites internal state (host is authoritative
    /// at mission start); thereafter the server keeps its own projection
    /// and only the type/skill are refreshed from the report (§4.7 step 4).
    pub fn upsert_unit(
        &mut self,
        name: &str,
        group_name: &str,
        category: Category,
        coalition: Coalition,
        position: Point,
        unit_type: &str,
        skill: Option<&str>,
    ) -> Option<UnitId> {
        // Destroyed monotonicity (§8): a name that already entered the
        // destroyed ledger is never reintroduced into any Group, even if
        // the host keeps reporting it for a stray turn.
        if self.destroyed_unit_names_and_groups.contains_key(name) {
            return None;
        }
        let group_id = self.ensure_group(group_name, category, coalition, false);

        let unit_id = if let Some(&id) = self.unit_ids_by_name.get(name) {
            id
        } else {
            let id = UnitId(self.next_unit_id);
            self.next_unit_id += 1;
            let unit = Unit::new(id, name.to_string(), group_id, position, unit_type.to_string());
            self.units.insert(id, unit);
            self.unit_ids_by_name.insert(name.to_string(), id);
            if let Some(g) = self.groups.get_mut(&group_id) {
                g.units.push(id);
            }
            id
        };

        if let Some(unit) = self.units.get_mut(&unit_id) {
            unit.unit_type = unit_type.to_string();
            if let Some(skill) = skill {
                unit.skill = skill.to_string();
            }
            if self.stage == 0 {
                unit.position = position;
            }
        }
        Some(unit_id)
    }

    /// Removes a unit permanently: drops it from its group and adds it to
    /// the destroyed ledger (`unitdestroyed` RPC, §6; destroyed monotonicity
    /// invariant, §8).
    pub fn destroy_unit(&mut self, unit_name: &str, group_name: &str, time: i64) {
        if self.destroyed_unit_names_and_groups.contains_key(unit_name) {
            return;
        }
        let coalition = self.group_by_name(group_name).map(|g| g.coalition).unwrap_or(Coalition::Neutral);

        if let Some(&unit_id) = self.unit_ids_by_name.get(unit_name) {
            if let Some(&group_id) = self.group_ids_by_name.get(group_name) {
                if let Some(g) = self.groups.get_mut(&group_id) {
                    g.units.retain(|&u| u != unit_id);
                }
            }
            self.deaths.push(DeathEvent { unit: unit_id, coalition, time });
        }
        self.destroyed_unit_names_and_groups
            .insert(unit_name.to_string(), group_name.to_string());
    }

    pub fn mint_aa_unit_id(&mut self) -> u32 {
        let id = self.aa_unit_id_counter;
        self.aa_unit_id_counter += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_creates_group_and_unit_once() {
        let mut c = Campaign::new("1.0.0.0".into(), 1, PerCoalition::default());
        let id1 = c.upsert_unit("red-1", "Red Armor 1", Category::Vehicle, Coalition::Red, Point::new(0.0, 0.0), "tank", None);
        let id2 = c.upsert_unit("red-1", "Red Armor 1", Category::Vehicle, Coalition::Red, Point::new(1.0, 1.0), "tank", None);
        assert_eq!(id1, id2);
        assert_eq!(c.groups.len(), 1);
        assert_eq!(c.units.len(), 1);
    }

    #[test]
    fn destroyed_units_never_reenter_group() {
        let mut c = Campaign::new("1.0.0.0".into(), 1, PerCoalition::default());
        c.upsert_unit("red-1", "Red Armor 1", Category::Vehicle, Coalition::Red, Point::new(0.0, 0.0), "tank", None);
        c.destroy_unit("red-1", "Red Armor 1", 100);
        assert!(c.destroyed_unit_names_and_groups.contains_key("red-1"));
        let gid = c.group_ids_by_name["Red Armor 1"];
        assert!(c.groups[&gid].units.is_empty());

        // Re-reporting the same name after death must not resurrect it.
        c.destroy_unit("red-1", "Red Armor 1", 200);
        assert_eq!(c.destroyed_unit_names_and_groups.get("red-1"), Some(&"Red Armor 1".to_string()));
    }

    #[test]
    fn rng_is_lazily_rebuilt_from_seed() {
        let mut c = Campaign::new("1.0.0.0".into(), 42, PerCoalition::default());
        use rand::Rng;
        let first: u32 = c.rng().gen();
        let mut c2 = Campaign::new("1.0.0.0".into(), 42, PerCoalition::default());
        let second: u32 = c2.rng().gen();
        assert_eq!(first, second, "same seed must reproduce the same stream");
    }
}
