//! Error taxonomy for the campaign engine (§7 of the design).
//!
//! `CoreError` distinguishes failures that abort a turn with a JSON-RPC
//! error envelope from the ones a handler absorbs and logs so the turn can
//! still complete (`GraphInconsistency`, `UnknownUnitType`).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// A required field was missing or malformed on the host's request.
    #[error("incompatible mission script: {0}")]
    MalformedRequest(String),

    /// A loaded snapshot's `software_version` is older than configured minimum.
    #[error("snapshot version {found} is older than minimum {minimum}")]
    IncompatibleSnapshot { found: String, minimum: String },

    /// The host's reported unit census disagrees with the snapshot's.
    #[error("unit census mismatch against persisted campaign")]
    CensusMismatch,

    /// A group has no containing node, or no path exists to its goal.
    /// Non-fatal: the affected decision is dropped for this turn.
    #[error("graph inconsistency: {0}")]
    GraphInconsistency(String),

    /// Air-target selection found no vehicle groups for one or both sides.
    #[error("mission not playable, no threats")]
    NoThreatsDefined,

    /// Statistics extraction could not resolve a unit type to an id.
    #[error("unknown unit type: {0}")]
    UnknownUnitType(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
