//! Durable key/value memory persisted to a single JSON document.
//!
//! The whole store is rewritten before every mutating call returns. That
//! keeps the file consistent at the granularity of one full write, costs
//! O(store size) per mutation, and is not atomic against a crash in the
//! middle of the write.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Field holding the entries of a list-style record.
pub const LIST_FIELD: &str = "items";

/// Errors that can occur during long-term memory operations.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Failed to read or write the store file.
    #[error("IO error on memory store {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store file does not hold a JSON object.
    #[error("Memory store {path:?} is corrupted: {message}")]
    Corrupted { path: PathBuf, message: String },

    /// Failed to serialize the store.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// `append_to_list` hit a record that is not list-shaped.
    #[error("Record '{0}' is not a list record")]
    NotAList(String),
}

/// Durable cross-run memory.
///
/// One async lock guards both the in-memory records and the file rewrite,
/// so concurrent runs cannot interleave whole-store writes.
#[derive(Debug)]
pub struct LongTermMemory {
    store_path: PathBuf,
    records: Mutex<Map<String, Value>>,
}

impl LongTermMemory {
    /// Opens the store at `store_path`, loading existing records if the
    /// file exists.
    ///
    /// # Errors
    ///
    /// Returns `MemoryError::Corrupted` if the file is not a JSON object.
    pub async fn open(store_path: impl Into<PathBuf>) -> Result<Self, MemoryError> {
        let store_path = store_path.into();
        let records = if fs::try_exists(&store_path).await.map_err(|source| MemoryError::Io {
            path: store_path.clone(),
            source,
        })? {
            Self::load(&store_path).await?
        } else {
            Map::new()
        };

        tracing::debug!(path = ?store_path, records = records.len(), "Loaded long-term memory");

        Ok(Self {
            store_path,
            records: Mutex::new(records),
        })
    }

    async fn load(path: &Path) -> Result<Map<String, Value>, MemoryError> {
        let raw = fs::read_to_string(path)
            .await
            .map_err(|source| MemoryError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        if raw.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(MemoryError::Corrupted {
                path: path.to_path_buf(),
                message: format!("expected a JSON object, found {}", json_kind(&other)),
            }),
            Err(e) => Err(MemoryError::Corrupted {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    /// Returns the stored value for `key`, or `default` when absent.
    pub async fn get(&self, key: &str, default: Value) -> Value {
        self.records
            .lock()
            .await
            .get(key)
            .cloned()
            .unwrap_or(default)
    }

    /// Replaces the value at `key` and rewrites the store.
    pub async fn set(&self, key: impl Into<String>, value: Value) -> Result<(), MemoryError> {
        let mut records = self.records.lock().await;
        records.insert(key.into(), value);
        self.flush(&records).await
    }

    /// Appends `item` to the `items` list of `key`, creating the record on
    /// first use, and rewrites the store.
    ///
    /// # Errors
    ///
    /// Returns `MemoryError::NotAList` if `key` holds a value that is not an
    /// object, or whose `items` field is not an array.
    pub async fn append_to_list(&self, key: &str, item: Value) -> Result<(), MemoryError> {
        let mut records = self.records.lock().await;
        let record = records
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));

        let Value::Object(fields) = record else {
            return Err(MemoryError::NotAList(key.to_string()));
        };
        let items = fields
            .entry(LIST_FIELD)
            .or_insert_with(|| Value::Array(Vec::new()));
        let Value::Array(items) = items else {
            return Err(MemoryError::NotAList(key.to_string()));
        };
        items.push(item);

        self.flush(&records).await
    }

    /// Returns the `items` list of `key`, or an empty list.
    pub async fn list(&self, key: &str) -> Vec<Value> {
        self.records
            .lock()
            .await
            .get(key)
            .and_then(|record| record.get(LIST_FIELD))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn flush(&self, records: &Map<String, Value>) -> Result<(), MemoryError> {
        let io_err = |source| MemoryError::Io {
            path: self.store_path.clone(),
            source,
        };

        if let Some(parent) = self.store_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(io_err)?;
            }
        }

        let json = serde_json::to_string_pretty(records)?;
        let mut file = fs::File::create(&self.store_path).await.map_err(io_err)?;
        file.write_all(json.as_bytes()).await.map_err(io_err)?;
        file.sync_all().await.map_err(io_err)?;
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    async fn open_in(dir: &TempDir) -> LongTermMemory {
        LongTermMemory::open(dir.path().join("memory.json"))
            .await
            .expect("store should open")
    }

    #[tokio::test]
    async fn test_open_missing_file_is_empty() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let memory = open_in(&dir).await;

        assert!(memory.is_empty().await);
        assert_eq!(memory.get("k", json!({})).await, json!({}));
        assert!(memory.list("k").await.is_empty());
    }

    #[tokio::test]
    async fn test_set_persists_and_reloads() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let memory = open_in(&dir).await;
        memory
            .set("profile::oakland::team", json!({"city": "Oakland"}))
            .await
            .expect("set should succeed");

        let reopened = open_in(&dir).await;
        assert_eq!(
            reopened.get("profile::oakland::team", json!(null)).await,
            json!({"city": "Oakland"})
        );
    }

    #[tokio::test]
    async fn test_set_is_idempotent_on_disk() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let memory = open_in(&dir).await;
        let value = json!({"lead": "Ana", "scale": "Pilot"});

        memory.set("k", value.clone()).await.expect("first set");
        let first = std::fs::read_to_string(memory.store_path()).expect("read");
        memory.set("k", value.clone()).await.expect("second set");
        let second = std::fs::read_to_string(memory.store_path()).expect("read");

        assert_eq!(first, second);
        assert_eq!(memory.get("k", json!(null)).await, value);
    }

    #[tokio::test]
    async fn test_append_to_list_is_monotonic_and_ordered() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let memory = open_in(&dir).await;

        for i in 0..4 {
            memory
                .append_to_list("evaluations", json!({"n": i}))
                .await
                .expect("append should succeed");
            assert_eq!(memory.list("evaluations").await.len(), i + 1);
        }

        let items = memory.list("evaluations").await;
        let order: Vec<_> = items.iter().map(|item| item["n"].clone()).collect();
        assert_eq!(order, vec![json!(0), json!(1), json!(2), json!(3)]);

        let reopened = open_in(&dir).await;
        assert_eq!(reopened.list("evaluations").await.len(), 4);
    }

    #[tokio::test]
    async fn test_append_extends_object_without_items() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let memory = open_in(&dir).await;
        memory
            .set("outreach", json!({"owner": "comms"}))
            .await
            .expect("set");

        memory
            .append_to_list("outreach", json!("copy"))
            .await
            .expect("append");

        assert_eq!(
            memory.get("outreach", json!(null)).await,
            json!({"owner": "comms", "items": ["copy"]})
        );
    }

    #[tokio::test]
    async fn test_append_to_scalar_record_fails() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let memory = open_in(&dir).await;
        memory.set("k", json!("plain")).await.expect("set");

        let result = memory.append_to_list("k", json!(1)).await;
        assert!(matches!(result, Err(MemoryError::NotAList(key)) if key == "k"));
    }

    #[tokio::test]
    async fn test_corrupted_store_is_rejected() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let path = dir.path().join("memory.json");
        std::fs::write(&path, "[1, 2, 3]").expect("write");

        let result = LongTermMemory::open(&path).await;
        assert!(matches!(result, Err(MemoryError::Corrupted { .. })));
    }

    #[tokio::test]
    async fn test_creates_parent_directories() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let path = dir.path().join("nested").join("deeper").join("memory.json");
        let memory = LongTermMemory::open(&path).await.expect("open");

        memory.set("k", json!(1)).await.expect("set");
        assert!(path.exists());
    }
}
