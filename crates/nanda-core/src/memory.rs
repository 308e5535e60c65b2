use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs as afs;
use tracing::warn;

pub const DEFAULT_MEMORY_FILE: &str = "memory.json";

#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("serialize memory: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub text: String,
    pub ts: String,
}

impl Note {
    /// Note stamped with the current UTC time.
    pub fn now(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    #[serde(default)]
    pub messages: u64,
    #[serde(default)]
    pub start_ts: f64,
}

/// On-disk shape of `memory.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedMemory {
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub metrics: Metrics,
}

impl PersistedMemory {
    /// Empty memory whose start timestamp is the current time.
    pub fn fresh() -> Self {
        Self {
            notes: Vec::new(),
            metrics: Metrics {
                messages: 0,
                start_ts: crate::epoch_secs_f64(),
            },
        }
    }
}

#[derive(Debug, Default)]
pub struct PersistStats {
    load_failures: AtomicU64,
    save_failures: AtomicU64,
}

impl PersistStats {
    pub fn load_failures(&self) -> u64 {
        self.load_failures.load(Ordering::Relaxed)
    }

    pub fn save_failures(&self) -> u64 {
        self.save_failures.load(Ordering::Relaxed)
    }
}

/// Best-effort JSON file store. Failures are logged and counted but never
/// returned from [`MemoryStore::load`] or [`MemoryStore::save`].
#[derive(Debug)]
pub struct MemoryStore {
    path: PathBuf,
    stats: PersistStats,
}

impl MemoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            stats: PersistStats::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stats(&self) -> &PersistStats {
        &self.stats
    }

    pub async fn load(&self) -> PersistedMemory {
        match self.try_load().await {
            Ok(memory) => memory,
            Err(err) => {
                self.stats.load_failures.fetch_add(1, Ordering::Relaxed);
                warn!(target: "nanda::memory", error = %err, "memory load failed; starting fresh");
                PersistedMemory::fresh()
            }
        }
    }

    pub async fn save(&self, memory: &PersistedMemory) {
        if let Err(err) = self.try_save(memory).await {
            self.stats.save_failures.fetch_add(1, Ordering::Relaxed);
            warn!(target: "nanda::memory", error = %err, "memory save failed");
        }
    }

    pub async fn try_load(&self) -> Result<PersistedMemory, MemoryError> {
        let bytes = afs::read(&self.path).await.map_err(|source| MemoryError::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| MemoryError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    pub async fn try_save(&self, memory: &PersistedMemory) -> Result<(), MemoryError> {
        let bytes = serde_json::to_vec_pretty(memory).map_err(MemoryError::Serialize)?;
        save_bytes_atomic(&self.path, &bytes)
            .await
            .map_err(|source| MemoryError::Write {
                path: self.path.clone(),
                source,
            })
    }
}

/// Sibling `<path>.tmp` used while a save is in flight.
fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

async fn save_bytes_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        afs::create_dir_all(parent).await?;
    }
    let tmp = tmp_path(path);
    afs::write(&tmp, bytes).await?;
    match afs::rename(&tmp, path).await {
        Ok(()) => Ok(()),
        Err(_) => {
            let _ = afs::remove_file(path).await;
            let res = afs::rename(&tmp, path).await;
            if res.is_err() {
                let _ = afs::remove_file(&tmp).await;
            }
            res
        }
    }
}
