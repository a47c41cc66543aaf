//! Delisted Token Registry
//!
//! Set of lower-cased addresses believed dead, consulted before any network
//! call. Entries are only ever added here; clearing false positives is the job
//! of external cleanup tooling, which also writes bookkeeping keys into the
//! same file. Those keys are carried through untouched on every rewrite.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use super::price_memory::{read_json, write_atomic, StorageError};

/// Default registry file name
pub const DEFAULT_DELISTED_FILE: &str = "delisted_tokens.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    delisted_tokens: BTreeSet<String>,
    #[serde(default)]
    failure_counts: BTreeMap<String, u32>,
    /// Keys owned by other tools (e.g. cleanup timestamps)
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

/// File-backed delisted registry
#[derive(Debug)]
pub struct DelistedTokenRegistry {
    path: PathBuf,
    state: RegistryFile,
}

impl DelistedTokenRegistry {
    /// Open the registry at `path`; a missing or corrupt file is an empty registry
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut state = match read_json::<RegistryFile>(&path) {
            Ok(Some(state)) => state,
            Ok(None) => RegistryFile::default(),
            Err(e) => {
                tracing::warn!("Delisted registry unreadable, starting empty: {}", e);
                RegistryFile::default()
            }
        };

        state.delisted_tokens = state
            .delisted_tokens
            .into_iter()
            .map(|a| a.to_lowercase())
            .collect();

        Self { path, state }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, address: &str) -> bool {
        self.state.delisted_tokens.contains(&address.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.state.delisted_tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.delisted_tokens.is_empty()
    }

    /// Delisted addresses in sorted order
    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.state.delisted_tokens.iter().map(String::as_str)
    }

    /// Recorded failure count for `address`
    pub fn failure_count(&self, address: &str) -> u32 {
        self.state
            .failure_counts
            .get(&address.to_lowercase())
            .copied()
            .unwrap_or(0)
    }

    /// Add `address`, bump its failure count and persist
    ///
    /// Returns `Ok(false)` when the address was already present (nothing written).
    pub fn insert(&mut self, address: &str) -> Result<bool, StorageError> {
        let key = address.to_lowercase();
        if !self.state.delisted_tokens.insert(key.clone()) {
            return Ok(false);
        }
        *self.state.failure_counts.entry(key).or_insert(0) += 1;
        self.save()?;
        Ok(true)
    }

    /// Re-read the file, picking up changes made by external tooling
    pub fn reload(&mut self) {
        *self = Self::open(self.path.clone());
    }

    fn save(&self) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(&self.state)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        write_atomic(&self.path, &content)
    }
}
