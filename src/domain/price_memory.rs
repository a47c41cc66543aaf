//! Price Memory
//!
//! Persistent map of lower-cased token address -> last observed price. The
//! buy pipeline writes every evaluated price here so the next sighting of the
//! same token can be compared against it (momentum).
//!
//! On disk the store is a flat JSON object:
//! `{"0xabc": {"price": 1.0, "ts": 1700000000}, ...}`
//!
//! A missing or unreadable file is an empty store. Every write replaces the
//! whole file via a temp file + rename so a reader never sees a partial write.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default price memory file name
pub const DEFAULT_PRICE_MEMORY_FILE: &str = "price_memory.json";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("Failed to read {path}: {reason}")]
    ReadError { path: String, reason: String },

    #[error("Failed to parse {path}: {reason}")]
    ParseError { path: String, reason: String },

    #[error("Failed to serialize state: {0}")]
    SerializationError(String),

    #[error("Failed to write {path}: {reason}")]
    WriteError { path: String, reason: String },

    #[error("Failed to replace {path}: {reason}")]
    RenameError { path: String, reason: String },
}

/// One cached observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceMemoryEntry {
    pub price: f64,
    /// Observation time (Unix seconds)
    #[serde(rename = "ts")]
    pub observed_at: i64,
}

impl PriceMemoryEntry {
    /// Age of the observation at `now` (never negative)
    pub fn age_seconds(&self, now: i64) -> i64 {
        now.saturating_sub(self.observed_at).max(0)
    }

    /// Whether the observation is still within `ttl_seconds`
    pub fn is_fresh(&self, now: i64, ttl_seconds: i64) -> bool {
        self.age_seconds(now) <= ttl_seconds
    }
}

/// Write `content` next to `path` and atomically swap it into place
pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| StorageError::WriteError {
                path: parent.display().to_string(),
                reason: e.to_string(),
            })?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, content).map_err(|e| StorageError::WriteError {
        path: tmp.display().to_string(),
        reason: e.to_string(),
    })?;

    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        StorageError::RenameError {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
    })
}

/// Read a JSON document, `Ok(None)` when the file is absent or blank
pub(crate) fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>, StorageError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|e| StorageError::ReadError {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    if content.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| StorageError::ParseError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}

/// File-backed price cache
#[derive(Debug)]
pub struct PriceMemoryStore {
    path: PathBuf,
    entries: HashMap<String, PriceMemoryEntry>,
    prune_interval_secs: i64,
}

impl PriceMemoryStore {
    /// Open the store at `path`, treating a missing/corrupt file as empty
    pub fn open(path: impl Into<PathBuf>, prune_interval_secs: i64) -> Self {
        let path = path.into();
        let entries = match read_json::<HashMap<String, PriceMemoryEntry>>(&path) {
            Ok(Some(entries)) => {
                tracing::debug!("Price memory loaded: {} entries from {}", entries.len(), path.display());
                let total = entries.len();
                let valid: HashMap<_, _> = entries
                    .into_iter()
                    .filter(|(_, v)| v.observed_at >= 0 && v.price.is_finite())
                    .map(|(k, v)| (k.to_lowercase(), v))
                    .collect();
                if valid.len() < total {
                    tracing::warn!("Dropped {} malformed price memory entries", total - valid.len());
                }
                valid
            }
            Ok(None) => HashMap::new(),
            Err(e) => {
                tracing::warn!("Price memory unreadable, starting empty: {}", e);
                HashMap::new()
            }
        };

        Self {
            path,
            entries,
            prune_interval_secs,
        }
    }

    /// Open and immediately prune expired entries
    pub fn open_pruned(path: impl Into<PathBuf>, prune_interval_secs: i64, now: i64) -> Self {
        let mut store = Self::open(path, prune_interval_secs);
        let removed = store.prune(now);
        if removed > 0 {
            tracing::info!("Pruned {} stale price memory entries on load", removed);
        }
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Last observation for `address`, if any
    pub fn get(&self, address: &str) -> Option<PriceMemoryEntry> {
        self.entries.get(&address.to_lowercase()).copied()
    }

    /// Record `price` for `address` at `now`, replacing the prior entry, then persist
    pub fn put(&mut self, address: &str, price: f64, now: i64) -> Result<(), StorageError> {
        self.entries.insert(
            address.to_lowercase(),
            PriceMemoryEntry {
                price,
                observed_at: now,
            },
        );
        self.save()
    }

    fn is_expired(&self, entry: &PriceMemoryEntry, now: i64) -> bool {
        now.saturating_sub(entry.observed_at) > self.prune_interval_secs
    }

    /// Entries `prune(now)` would remove
    pub fn expired_count(&self, now: i64) -> usize {
        self.entries.values().filter(|e| self.is_expired(e, now)).count()
    }

    /// Drop entries older than the prune interval, returning how many went
    ///
    /// Persists only when something was removed. A failed write is logged;
    /// the in-memory state is already pruned.
    pub fn prune(&mut self, now: i64) -> usize {
        let before = self.entries.len();
        let interval = self.prune_interval_secs;
        self.entries
            .retain(|_, entry| now.saturating_sub(entry.observed_at) <= interval);
        let removed = before - self.entries.len();

        if removed > 0 {
            if let Err(e) = self.save() {
                tracing::warn!("Failed to persist pruned price memory: {}", e);
            }
        }
        removed
    }

    /// Replace the on-disk file with the current mapping
    pub fn save(&self) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        write_atomic(&self.path, &content)
    }
}
