use serde::{Deserialize, Serialize};

use crate::core::types::{GroupId, Point, UnitId};

/// The default skill reported when a host entry omits one.
pub const DEFAULT_SKILL: &str = "Good";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub group: GroupId,
    pub position: Point,
    pub unit_type: String,
    pub skill: String,
}

impl Unit {
    pub fn new(id: UnitId, name: String, group: GroupId, position: Point, unit_type: String) -> Self {
        Self {
            id,
            name,
            group,
            position,
            unit_type,
            skill: DEFAULT_SKILL.to_string(),
        }
    }
}
