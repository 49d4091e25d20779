//! Campaign snapshot persistence — out of scope as a *format* (§1), but the
//! write-then-rename crash-safety requirement (§5) and the version-gated
//! load (§7 `IncompatibleSnapshot`) are part of the core's contract with it.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::campaign::Campaign;
use crate::core::error::{CoreError, Result};

pub trait SnapshotStore: Send + Sync {
    fn load(&self) -> Result<Option<Campaign>>;
    fn save(&self, campaign: &Campaign) -> Result<()>;
    fn delete(&self) -> Result<()>;
}

/// JSON file on disk, written via a temp file + rename so a crash mid-write
/// never leaves a partial snapshot behind.
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<Campaign>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)?;
        let campaign: Campaign = serde_json::from_str(&text)?;
        Ok(Some(campaign))
    }

    fn save(&self, campaign: &Campaign) -> Result<()> {
        let text = serde_json::to_string_pretty(campaign)?;
        let tmp_path = tmp_path_for(&self.path);
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(text.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn delete(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// In-memory fake for tests.
#[derive(Default)]
pub struct InMemorySnapshotStore {
    slot: Mutex<Option<Campaign>>,
}

impl SnapshotStore for InMemorySnapshotStore {
    fn load(&self) -> Result<Option<Campaign>> {
        Ok(self.slot.lock().map_err(|_| poison_err())?.clone())
    }

    fn save(&self, campaign: &Campaign) -> Result<()> {
        *self.slot.lock().map_err(|_| poison_err())? = Some(campaign.clone());
        Ok(())
    }

    fn delete(&self) -> Result<()> {
        *self.slot.lock().map_err(|_| poison_err())? = None;
        Ok(())
    }
}

fn poison_err() -> CoreError {
    CoreError::Persistence("snapshot store mutex poisoned".into())
}
