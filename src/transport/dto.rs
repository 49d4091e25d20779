//! §6 wire shapes for the five JSON-RPC methods. The transport itself (the
//! HTTP/JSON-RPC listener) is an external collaborator; this module only
//! owns the request/response shapes that cross that boundary.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct UnitReport {
    pub group: String,
    pub pos: String,
    #[serde(rename = "type")]
    pub unit_type: String,
    pub category: String,
    pub coalition: String,
    #[serde(default)]
    pub skill: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CoalitionPair {
    pub red: String,
    pub blue: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessJsonRequest {
    pub routes: Vec<Vec<String>>,
    pub units: HashMap<String, UnitReport>,
    pub goals: CoalitionPair,
    pub bullseye: CoalitionPair,
    #[serde(default)]
    pub mapmarkers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub cornermarkers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DestroyedEntry {
    pub group: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DynUnit {
    pub name: String,
    #[serde(rename = "type")]
    pub unit_type: String,
    pub skill: String,
    pub pos: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DynGroup {
    pub category: String,
    pub name: String,
    pub units: Vec<DynUnit>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InfantryPosEntry {
    pub pos: String,
    pub number: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessJsonResponse {
    pub code: String,
    pub stage: u32,
    pub destroyed: HashMap<String, DestroyedEntry>,
    pub groupspos: HashMap<String, String>,
    pub groupsdest: HashMap<String, String>,
    pub airdest: CoalitionPair,
    pub supportpos: HashMap<String, String>,
    pub supportnum: HashMap<String, u32>,
    pub infantrypos: HashMap<String, Vec<InfantryPosEntry>>,
    pub dyngroups: HashMap<String, Vec<DynGroup>>,
}

/// `{code:"1", error:"..."}`, the shared failure envelope (§7).
#[derive(Debug, Clone, Serialize)]
pub struct RpcErrorResponse {
    pub code: String,
    pub error: String,
}

impl From<crate::core::error::CoreError> for RpcErrorResponse {
    fn from(e: crate::core::error::CoreError) -> Self {
        RpcErrorResponse { code: "1".to_string(), error: e.to_string() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnitDestroyedRequest {
    pub unitname: String,
    pub groupname: String,
    pub time: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupportDestroyedRequest {
    pub coalition: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeScoreRequest {
    pub reason: String,
    pub coalition: String,
    pub unitname: String,
}

/// One "was shot at" sample from the host's final mission report.
#[derive(Debug, Clone, Deserialize)]
pub struct ShotReport {
    pub target: String,
    pub time: i64,
    pub plane: bool,
    /// Name of the ground unit that fired, when `plane` is false. Used to
    /// resolve the shooter's mission-start node.
    #[serde(default)]
    pub shooter: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MissionEndRequest {
    pub shot: Vec<ShotReport>,
    pub time: i64,
    pub starttime: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MissionEndResponse {
    pub code: String,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}
