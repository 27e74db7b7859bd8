//! Durable storage of the sandbox graph.
//!
//! The sandbox is saved as one JSON record under a single key:
//! `{ layers, edges, metadata | null, nodePositions, savedAt }` with `savedAt` in unix millis.

use crate::error::{Error, Result};
use crate::model::{Edge, Layer, ModelMetadata, NodePositions};
use crate::store::{SandboxStore, dedupe_layers};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Key-value storage for serialized records.
pub trait StorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(Error::Storage {
                message: format!("invalid storage key `{key}`"),
            });
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl StorageBackend for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSandbox {
    #[serde(default)]
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
    #[serde(default)]
    pub node_positions: NodePositions,
    #[serde(default)]
    pub saved_at: Option<i64>,
}

impl StoredSandbox {
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.saved_at.and_then(DateTime::from_timestamp_millis)
    }
}

/// Reads the stored record, if any.
pub fn read_record<B: StorageBackend + ?Sized>(
    backend: &B,
    key: &str,
) -> Result<Option<StoredSandbox>> {
    let Some(text) = backend.get(key)? else {
        return Ok(None);
    };
    Ok(Some(serde_json::from_str(&text)?))
}

impl SandboxStore {
    /// Writes the current graph and marks the store saved. Failures are logged and leave the
    /// dirty flag set.
    pub fn save_to_storage<B: StorageBackend + ?Sized>(&mut self, backend: &mut B) -> bool {
        self.save_to_storage_at(backend, Utc::now())
    }

    pub fn save_to_storage_at<B: StorageBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        now: DateTime<Utc>,
    ) -> bool {
        match self.try_save(backend, now) {
            Ok(()) => {
                self.mark_saved_at(now);
                tracing::debug!(layers = self.layers.len(), "sandbox saved");
                true
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to save sandbox");
                false
            }
        }
    }

    fn try_save<B: StorageBackend + ?Sized>(&self, backend: &mut B, now: DateTime<Utc>) -> Result<()> {
        let record = StoredSandbox {
            layers: self.layers.clone(),
            edges: self.edges.clone(),
            metadata: self.metadata.clone(),
            node_positions: self.node_positions.clone(),
            saved_at: Some(now.timestamp_millis()),
        };
        let text = serde_json::to_string(&record)?;
        backend.set(&self.config().storage_key, &text)
    }

    /// Replaces the graph with the stored record. History restarts from the loaded state and
    /// the store is clean afterwards. A missing record is a no-op; failures are logged.
    pub fn load_from_storage<B: StorageBackend + ?Sized>(&mut self, backend: &B) -> bool {
        let record = match read_record(backend, &self.config().storage_key) {
            Ok(Some(record)) => record,
            Ok(None) => return false,
            Err(err) => {
                tracing::error!(error = %err, "failed to load sandbox");
                return false;
            }
        };
        self.apply_record(record);
        true
    }

    fn apply_record(&mut self, record: StoredSandbox) {
        let last_saved = record.saved_at();
        self.layers = dedupe_layers(record.layers);
        self.edges = record.edges;
        self.metadata = record.metadata;
        self.node_positions = record.node_positions;
        self.clear_selection();
        self.close_context_menu();
        self.prune_dangling();
        let snapshot = self.snapshot();
        self.history.reset(snapshot);
        self.needs_save = false;
        if last_saved.is_some() {
            self.last_saved = last_saved;
        }
    }
}
