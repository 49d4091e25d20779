//! §6 statistics persistence: `statistics(conflicts TEXT, mission_time INTEGER)`
//! plus a `unit_types(name, id)` lookup table, behind a `ConflictStore` trait
//! so the SQLite-backed implementation (out of scope as a store, §1) can be
//! swapped for an in-memory fake in tests.

use std::collections::HashMap;
use std::sync::Mutex;

use rusqlite::{params, Connection};
use serde::Serialize;

use crate::core::error::{CoreError, Result};

/// One clean battle's unit-type composition at start and end (§4.8 step 3).
#[derive(Debug, Clone, Default)]
pub struct BattleStatistics {
    pub initial_red: Vec<String>,
    pub initial_blue: Vec<String>,
    pub surviving_red: Vec<String>,
    pub surviving_blue: Vec<String>,
}

#[derive(Serialize)]
struct ConflictRecord {
    sr: Vec<i64>,
    sb: Vec<i64>,
    er: Vec<i64>,
    eb: Vec<i64>,
}

pub trait ConflictStore: Send + Sync {
    /// Interns each unit-type name to a stable id and appends one
    /// `statistics` row keyed by `mission_time`.
    fn record_battle(&self, stats: &BattleStatistics, mission_time: i64) -> Result<()>;
}

/// `rusqlite`-backed implementation of the table shape described in §6.
pub struct SqliteConflictStore {
    conn: Mutex<Connection>,
}

impl SqliteConflictStore {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(sqlite_err)?;
        Self::init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(sqlite_err)?;
        Self::init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS unit_types (id INTEGER PRIMARY KEY, name TEXT UNIQUE NOT NULL);
             CREATE TABLE IF NOT EXISTS statistics (conflicts TEXT NOT NULL, mission_time INTEGER NOT NULL);",
        )
        .map_err(sqlite_err)
    }

    fn intern(conn: &Connection, name: &str) -> Result<i64> {
        if let Some(id) = Self::lookup(conn, name)? {
            return Ok(id);
        }
        conn.execute("INSERT INTO unit_types (name) VALUES (?1)", params![name])
            .map_err(sqlite_err)?;
        Ok(conn.last_insert_rowid())
    }

    fn lookup(conn: &Connection, name: &str) -> Result<Option<i64>> {
        conn.query_row("SELECT id FROM unit_types WHERE name = ?1", params![name], |row| row.get(0))
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(sqlite_err(other)),
            })
    }
}

impl ConflictStore for SqliteConflictStore {
    fn record_battle(&self, stats: &BattleStatistics, mission_time: i64) -> Result<()> {
        let conn = self.conn.lock().map_err(|_| CoreError::Persistence("statistics connection poisoned".into()))?;
        let intern_all = |names: &[String]| -> Result<Vec<i64>> {
            names.iter().map(|n| Self::intern(&conn, n)).collect()
        };
        let record = ConflictRecord {
            sr: intern_all(&stats.initial_red)?,
            sb: intern_all(&stats.initial_blue)?,
            er: intern_all(&stats.surviving_red)?,
            eb: intern_all(&stats.surviving_blue)?,
        };
        let json = serde_json::to_string(&record)?;
        conn.execute(
            "INSERT INTO statistics (conflicts, mission_time) VALUES (?1, ?2)",
            params![json, mission_time],
        )
        .map_err(sqlite_err)?;
        Ok(())
    }
}

fn sqlite_err(e: rusqlite::Error) -> CoreError {
    CoreError::Persistence(format!("sqlite: {e}"))
}

/// In-memory fake for tests: keeps interned names and recorded rows visible
/// for assertions instead of round-tripping through a real database file.
#[derive(Default)]
pub struct InMemoryConflictStore {
    state: Mutex<InMemoryState>,
}

#[derive(Default)]
struct InMemoryState {
    type_ids: HashMap<String, i64>,
    next_id: i64,
    rows: Vec<(String, i64)>,
}

impl InMemoryConflictStore {
    pub fn recorded_rows(&self) -> Vec<(String, i64)> {
        self.state.lock().unwrap().rows.clone()
    }
}

impl ConflictStore for InMemoryConflictStore {
    fn record_battle(&self, stats: &BattleStatistics, mission_time: i64) -> Result<()> {
        let mut state = self.state.lock().map_err(|_| CoreError::Persistence("conflict store mutex poisoned".into()))?;
        let mut intern = |name: &str| -> i64 {
            if let Some(&id) = state.type_ids.get(name) {
                return id;
            }
            state.next_id += 1;
            let id = state.next_id;
            state.type_ids.insert(name.to_string(), id);
            id
        };
        let record = ConflictRecord {
            sr: stats.initial_red.iter().map(|n| intern(n)).collect(),
            sb: stats.initial_blue.iter().map(|n| intern(n)).collect(),
            er: stats.surviving_red.iter().map(|n| intern(n)).collect(),
            eb: stats.surviving_blue.iter().map(|n| intern(n)).collect(),
        };
        let json = serde_json::to_string(&record)?;
        state.rows.push((json, mission_time));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_store_interns_and_records() {
        let store = InMemoryConflictStore::default();
        let stats = BattleStatistics {
            initial_red: vec!["T-80".into()],
            initial_blue: vec!["M1A2".into()],
            surviving_red: vec![],
            surviving_blue: vec!["M1A2".into()],
        };
        store.record_battle(&stats, 1200).unwrap();
        let rows = store.recorded_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].1, 1200);
    }

    #[test]
    fn sqlite_store_round_trips() {
        let store = SqliteConflictStore::in_memory().unwrap();
        let stats = BattleStatistics {
            initial_red: vec!["T-80".into()],
            initial_blue: vec!["M1A2".into()],
            surviving_red: vec![],
            surviving_blue: vec!["M1A2".into()],
        };
        store.record_battle(&stats, 900).unwrap();
    }
}
