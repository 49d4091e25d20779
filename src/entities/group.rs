use serde::{Deserialize, Serialize};

use crate::core::types::{Category, Coalition, GroupId, NodeId, UnitId};

/// Flags mirrored from name sentinel tags at ingest time (design note 9).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupFlags {
    /// `__sg__`, or a name starting with `staticgroup`: never moves, never
    /// counted toward victory.
    pub is_static: bool,
    /// `__spaa__`: a dynamic anti-aircraft group the server placed itself.
    pub is_spaa: bool,
    /// `__mm__`: a map-marker label, not a combat group.
    pub is_marker: bool,
    /// `__ig__`: preserve individual unit positions through teleports
    /// (battle midpoint collapse) rather than collapsing them together.
    pub ignore_teleport: bool,
}

impl GroupFlags {
    pub fn from_name(name: &str) -> GroupFlags {
        let lower = name.to_ascii_lowercase();
        GroupFlags {
            is_static: lower.contains("__sg__") || lower.starts_with("staticgroup"),
            is_spaa: lower.contains("__spaa__"),
            is_marker: lower.contains("__mm__"),
            ignore_teleport: lower.contains("__ig__"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub category: Category,
    pub coalition: Coalition,
    pub dynamic: bool,
    pub destination_node: Option<NodeId>,
    pub units: Vec<UnitId>,
    pub flags: GroupFlags,
    pub node: Option<NodeId>,
}

impl Group {
    pub fn new(id: GroupId, name: String, category: Category, coalition: Coalition, dynamic: bool) -> Self {
        let flags = GroupFlags::from_name(&name);
        Self {
            id,
            name,
            category,
            coalition,
            dynamic,
            destination_node: None,
            units: Vec::new(),
            flags,
            node: None,
        }
    }

    /// §4.3's eligibility check for the offensive-move procedure.
    pub fn is_offensive_vehicle(&self) -> bool {
        self.category == Category::Vehicle && !self.flags.is_static && !self.flags.is_spaa
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
