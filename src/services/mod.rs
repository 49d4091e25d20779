//! The `Services` handle: persistence, the outbound message sink, and config,
//! threaded through construction instead of reached for as global state
//! (design note: "Global logger / module-level state").
//!
//! The per-campaign seeded RNG is *not* here — it belongs to [`crate::campaign::Campaign`]
//! itself so it can be persisted and replayed (design note: "Random determinism").

pub mod notify;
pub mod persistence;

use std::sync::Arc;

use crate::core::config::Config;
use crate::stats::store::ConflictStore;
use notify::MessageSink;
use persistence::SnapshotStore;

/// Everything a turn handler needs besides the `Campaign` it's mutating.
#[derive(Clone)]
pub struct Services {
    pub config: Config,
    pub snapshot_store: Arc<dyn SnapshotStore>,
    pub message_sink: Arc<dyn MessageSink>,
    pub conflict_store: Arc<dyn ConflictStore>,
}

impl Services {
    pub fn new(
        config: Config,
        snapshot_store: Arc<dyn SnapshotStore>,
        message_sink: Arc<dyn MessageSink>,
        conflict_store: Arc<dyn ConflictStore>,
    ) -> Self {
        Self {
            config,
            snapshot_store,
            message_sink,
            conflict_store,
        }
    }

    /// Wire up an all-in-memory/no-op instance, for tests.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::stats::store::InMemoryConflictStore;
        Self::new(
            Config::default(),
            Arc::new(persistence::InMemorySnapshotStore::default()),
            Arc::new(notify::NullMessageSink),
            Arc::new(InMemoryConflictStore::default()),
        )
    }
}
