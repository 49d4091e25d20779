//! Core identifiers and small value types shared across the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable integer id for a graph node.
///
/// Node ids are assigned monotonically by [`crate::graph::GraphBuilder`] and
/// never reused within a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable integer id for a [`crate::entities::Group`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupId(pub u32);

/// Stable integer id for a [`crate::entities::Unit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u32);

/// One of the two warring sides. Neutral entities exist on the map but
/// never move and never participate in victory checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coalition {
    Red,
    Blue,
    Neutral,
}

impl Coalition {
    /// The coalition on the other side of the front line, if any.
    pub fn enemy(self) -> Option<Coalition> {
        match self {
            Coalition::Red => Some(Coalition::Blue),
            Coalition::Blue => Some(Coalition::Red),
            Coalition::Neutral => None,
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Coalition> {
        match s.to_ascii_lowercase().as_str() {
            "red" => Some(Coalition::Red),
            "blue" => Some(Coalition::Blue),
            "neutral" => Some(Coalition::Neutral),
            _ => None,
        }
    }
}

impl fmt::Display for Coalition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Coalition::Red => "red",
            Coalition::Blue => "blue",
            Coalition::Neutral => "neutral",
        };
        write!(f, "{}", s)
    }
}

/// Category of a [`crate::entities::Group`]. Host scripts may report
/// category strings this engine doesn't recognize; those are preserved
/// verbatim in `Other` so reconciliation never rejects a valid mission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Vehicle,
    Infantry,
    Support,
    Other(String),
}

impl Category {
    pub fn from_wire(s: &str) -> Category {
        match s {
            "vehicle" => Category::Vehicle,
            "infantry" => Category::Infantry,
            "support" => Category::Support,
            other => Category::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Category::Vehicle => "vehicle",
            Category::Infantry => "infantry",
            Category::Support => "support",
            Category::Other(s) => s.as_str(),
        }
    }
}

/// A 2D host-frame coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Parse the wire format `"x,y"` or `"x,y,r"` (the trailing flag, if
    /// present, marks a reinforcement waypoint).
    pub fn parse_wire(s: &str) -> Option<(Point, bool)> {
        let mut parts = s.split(',');
        let x: f64 = parts.next()?.trim().parse().ok()?;
        let y: f64 = parts.next()?.trim().parse().ok()?;
        let is_reinforcement = matches!(parts.next(), Some(flag) if flag.trim() == "r");
        Some((Point::new(x, y), is_reinforcement))
    }

    /// Render in the `"x,y"` wire format used by `groupspos`/`groupsdest`/etc.
    pub fn to_wire(&self) -> String {
        format!("{:.6},{:.6}", self.x, self.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_wire())
    }
}
