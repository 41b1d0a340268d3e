use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::world::ColonySnapshot;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Writes `<dir>/<colony>/tick_000010.json` every `interval` ticks.
///
/// Export only: snapshots are for inspection and are never read back.
pub struct SnapshotWriter {
    dir: PathBuf,
    interval: u64,
}

impl SnapshotWriter {
    pub fn new(dir: impl AsRef<Path>, interval: u64) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            interval,
        }
    }

    /// Whether a tick that actually advanced the colony should be written.
    pub fn is_due(&self, advanced: bool, tick: u64) -> bool {
        advanced && self.interval > 0 && tick > 0 && tick % self.interval == 0
    }

    pub fn write(&self, snapshot: &ColonySnapshot) -> Result<PathBuf, SnapshotError> {
        let dir = self.dir.join(directory_name(&snapshot.name));
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("tick_{:06}.json", snapshot.tick));
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(&path, json)?;
        Ok(path)
    }
}

fn directory_name(colony: &str) -> String {
    let cleaned: String = colony
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c.to_ascii_lowercase() } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "colony".to_string()
    } else {
        cleaned
    }
}
