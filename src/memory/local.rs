//! In-process memory store persisted to a JSON file.
//!
//! Used when no database URL is configured, and as the test backend. Search
//! is a brute-force cosine scan, which is fine at single-user scale.
//!
//! Several processes may share one file (the MCP server and CLI commands).
//! Every write takes an exclusive lock on a sibling `.lock` file, re-reads
//! the file, applies the change and writes it back atomically. The cached
//! snapshot only changes after the write succeeds. Reads reload the cache
//! when the file on disk changed.

use std::fs::{Metadata, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, RwLockReadGuard};
use uuid::Uuid;

use super::store::{cosine_similarity, MemoryStore, ScoredMemory, SearchFilter};
use super::types::{Memory, NewMemory};
use crate::embedding::EMBEDDING_DIM;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRecord {
    #[serde(flatten)]
    memory: Memory,
    embedding: Vec<f32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LocalFile {
    memories: Vec<StoredRecord>,
}

/// What the cache was loaded from: modification time, length and file id.
type FileStamp = (SystemTime, u64, u64);

fn stamp_of(meta: &Metadata) -> Option<FileStamp> {
    meta.modified().ok().map(|m| (m, meta.len(), file_id(meta)))
}

/// Every write renames a new file into place, so the inode changes even
/// when mtime granularity hides the write.
#[cfg(unix)]
fn file_id(meta: &Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    meta.ino()
}

#[cfg(not(unix))]
fn file_id(_meta: &Metadata) -> u64 {
    0
}

#[derive(Debug, Default)]
struct Snapshot {
    records: Vec<StoredRecord>,
    stamp: Option<FileStamp>,
}

fn parse_records(path: &Path, contents: &str) -> Result<Vec<StoredRecord>> {
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }
    let file: LocalFile = serde_json::from_str(contents)
        .map_err(|e| Error::Storage(format!("failed to parse {}: {e}", path.display())))?;
    Ok(file.memories)
}

/// Read the file as it is on disk now. A missing file is an empty store.
async fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let meta = match tokio::fs::metadata(path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Snapshot::default()),
        Err(e) => return Err(e.into()),
    };
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Snapshot::default()),
        Err(e) => return Err(e.into()),
    };
    Ok(Snapshot {
        records: parse_records(path, &contents)?,
        stamp: stamp_of(&meta),
    })
}

/// Exclusive lock on `<path>.lock`, held until the returned file is dropped.
async fn lock_exclusive(path: &Path) -> Result<std::fs::File> {
    let lock_path = path.with_extension("json.lock");
    tokio::task::spawn_blocking(move || -> std::io::Result<std::fs::File> {
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        file.lock_exclusive()?;
        Ok(file)
    })
    .await
    .map_err(|e| Error::Storage(format!("lock task failed: {e}")))?
    .map_err(|e| Error::Storage(format!("cannot lock {}: {e}", path.display())))
}

/// Memory store held in memory, optionally mirrored to a JSON file.
pub struct LocalStore {
    path: Option<PathBuf>,
    cache: RwLock<Snapshot>,
}

impl LocalStore {
    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            cache: RwLock::new(Snapshot::default()),
        }
    }

    /// Open (or create on first write) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let snapshot = match std::fs::metadata(&path) {
            Ok(meta) => {
                let contents = std::fs::read_to_string(&path)?;
                Snapshot {
                    records: parse_records(&path, &contents)?,
                    stamp: stamp_of(&meta),
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Snapshot::default(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            path = %path.display(),
            memories = snapshot.records.len(),
            "local store opened"
        );

        Ok(Self {
            path: Some(path),
            cache: RwLock::new(snapshot),
        })
    }

    /// The cached records, reloaded first if another handle changed the file.
    async fn records(&self) -> Result<RwLockReadGuard<'_, Snapshot>> {
        let Some(path) = &self.path else {
            return Ok(self.cache.read().await);
        };
        let on_disk = match tokio::fs::metadata(path).await {
            Ok(meta) => stamp_of(&meta),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot stat local store, serving cached records");
                return Ok(self.cache.read().await);
            }
        };
        if self.cache.read().await.stamp != on_disk {
            let mut cache = self.cache.write().await;
            if cache.stamp != on_disk {
                *cache = load_snapshot(path).await?;
                tracing::debug!(memories = cache.records.len(), "local store reloaded");
            }
        }
        Ok(self.cache.read().await)
    }

    /// Run `change` against the current records as one transaction.
    ///
    /// `change` returns its result and whether it modified anything. Nothing
    /// is visible to readers unless the file write succeeded.
    async fn update<T>(
        &self,
        change: impl FnOnce(&mut Vec<StoredRecord>) -> (T, bool),
    ) -> Result<T> {
        let mut cache = self.cache.write().await;
        let Some(path) = &self.path else {
            let mut records = cache.records.clone();
            let (out, changed) = change(&mut records);
            if changed {
                cache.records = records;
            }
            return Ok(out);
        };

        let _lock = lock_exclusive(path).await?;
        let mut snapshot = load_snapshot(path).await?;
        let (out, changed) = change(&mut snapshot.records);
        if changed {
            snapshot.stamp = persist(path, &snapshot.records).await?;
        }
        *cache = snapshot;
        Ok(out)
    }

    /// Move a record's creation time, e.g. when replaying older history.
    /// Returns `false` if the record does not exist.
    pub async fn backdate(&self, id: Uuid, created_at: DateTime<Utc>) -> Result<bool> {
        self.update(|records| {
            match records.iter_mut().find(|r| r.memory.id == id) {
                Some(record) => {
                    record.memory.created_at = created_at;
                    (true, true)
                }
                None => (false, false),
            }
        })
        .await
    }
}

/// Write the records atomically (tmp + rename). Returns the new file stamp.
async fn persist(path: &Path, records: &[StoredRecord]) -> Result<Option<FileStamp>> {
    let file = LocalFile {
        memories: records.to_vec(),
    };
    let json = serde_json::to_string_pretty(&file)?;
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(stamp_of(&tokio::fs::metadata(path).await?))
}

/// Apply `edit` to the record `id`, bumping `updated_at`.
fn edit_record(
    records: &mut [StoredRecord],
    id: Uuid,
    edit: impl FnOnce(&mut Memory),
) -> (Option<Memory>, bool) {
    match records.iter_mut().find(|r| r.memory.id == id) {
        Some(record) => {
            edit(&mut record.memory);
            record.memory.updated_at = Utc::now();
            (Some(record.memory.clone()), true)
        }
        None => (None, false),
    }
}

#[async_trait]
impl MemoryStore for LocalStore {
    fn backend(&self) -> &'static str {
        "local"
    }

    async fn insert(&self, memory: &NewMemory, embedding: &[f32]) -> Result<Memory> {
        if embedding.len() != EMBEDDING_DIM {
            return Err(Error::Embedding(format!(
                "expected {EMBEDDING_DIM} dimensions, got {}",
                embedding.len()
            )));
        }
        let now = Utc::now();
        let stored = Memory {
            id: Uuid::now_v7(),
            content: memory.content.clone(),
            memory_type: memory.memory_type,
            importance: memory.importance,
            tags: memory.tags.clone(),
            source: memory.source.clone(),
            source_type: memory.source_type,
            confidence: memory.confidence,
            related_to: Vec::new(),
            project: memory.project.clone(),
            created_at: now,
            updated_at: now,
        };

        let record = StoredRecord {
            memory: stored.clone(),
            embedding: embedding.to_vec(),
        };
        self.update(move |records| {
            records.push(record);
            ((), true)
        })
        .await?;
        Ok(stored)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Memory>> {
        let snapshot = self.records().await?;
        Ok(snapshot
            .records
            .iter()
            .find(|r| r.memory.id == id)
            .map(|r| r.memory.clone()))
    }

    async fn embedding(&self, id: Uuid) -> Result<Option<Vec<f32>>> {
        let snapshot = self.records().await?;
        Ok(snapshot
            .records
            .iter()
            .find(|r| r.memory.id == id)
            .map(|r| r.embedding.clone()))
    }

    async fn search(
        &self,
        query: &[f32],
        limit: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<ScoredMemory>> {
        let snapshot = self.records().await?;
        let mut scored: Vec<ScoredMemory> = snapshot
            .records
            .iter()
            .filter(|r| filter.matches(&r.memory))
            .map(|r| ScoredMemory {
                memory: r.memory.clone(),
                similarity: cosine_similarity(query, &r.embedding),
            })
            .collect();
        scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        scored.truncate(limit);
        Ok(scored)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        self.update(|records| {
            let before = records.len();
            records.retain(|r| r.memory.id != id);
            let deleted = records.len() != before;
            (deleted, deleted)
        })
        .await
    }

    async fn set_importance(&self, id: Uuid, importance: f64) -> Result<Option<Memory>> {
        self.update(|records| edit_record(records, id, |m| m.importance = importance))
            .await
    }

    async fn set_project(&self, id: Uuid, project: Option<&str>) -> Result<Option<Memory>> {
        let project = project.map(str::to_string);
        self.update(|records| edit_record(records, id, |m| m.project = project))
            .await
    }

    async fn add_link(&self, from: Uuid, to: Uuid) -> Result<bool> {
        self.update(|records| {
            match records.iter_mut().find(|r| r.memory.id == from) {
                Some(record) if !record.memory.related_to.contains(&to) => {
                    record.memory.related_to.push(to);
                    record.memory.updated_at = Utc::now();
                    (true, true)
                }
                _ => (false, false),
            }
        })
        .await
    }

    async fn list(&self, limit: Option<usize>) -> Result<Vec<Memory>> {
        let snapshot = self.records().await?;
        let mut all: Vec<Memory> = snapshot.records.iter().map(|r| r.memory.clone()).collect();
        // UUID v7 breaks created_at ties in insertion order.
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        if let Some(limit) = limit {
            all.truncate(limit);
        }
        Ok(all)
    }

    async fn list_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<Memory>> {
        let snapshot = self.records().await?;
        let mut old: Vec<Memory> = snapshot
            .records
            .iter()
            .filter(|r| r.memory.created_at < cutoff)
            .map(|r| r.memory.clone())
            .collect();
        old.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(old)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.records().await?.records.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::types::MemoryType;

    fn spike(dim: usize) -> Vec<f32> {
        let mut v = vec![0.0f32; EMBEDDING_DIM];
        v[dim % EMBEDDING_DIM] = 1.0;
        v
    }

    fn fact(content: &str) -> NewMemory {
        NewMemory::new(content, MemoryType::Fact).validate().unwrap()
    }

    #[tokio::test]
    async fn insert_and_get() {
        let store = LocalStore::in_memory();
        let stored = store.insert(&fact("Rust is fast"), &spike(0)).await.unwrap();
        let fetched = store.get(stored.id).await.unwrap().unwrap();
        assert_eq!(fetched, stored);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn rejects_wrong_dimension() {
        let store = LocalStore::in_memory();
        let err = store.insert(&fact("short vector"), &[1.0, 0.0]).await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[tokio::test]
    async fn search_orders_by_similarity_and_limits() {
        let store = LocalStore::in_memory();
        let near = store.insert(&fact("near"), &spike(0)).await.unwrap();
        store.insert(&fact("far"), &spike(10)).await.unwrap();
        store.insert(&fact("farther"), &spike(20)).await.unwrap();

        let results = store
            .search(&spike(0), 2, &SearchFilter::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].memory.id, near.id);
        assert!(results[0].similarity >= results[1].similarity);
    }

    #[tokio::test]
    async fn delete_is_reported() {
        let store = LocalStore::in_memory();
        let m = store.insert(&fact("temporary"), &spike(1)).await.unwrap();
        assert!(store.delete(m.id).await.unwrap());
        assert!(!store.delete(m.id).await.unwrap());
        assert!(store.get(m.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn add_link_is_idempotent() {
        let store = LocalStore::in_memory();
        let a = store.insert(&fact("a"), &spike(1)).await.unwrap();
        let b = store.insert(&fact("b"), &spike(2)).await.unwrap();
        assert!(store.add_link(a.id, b.id).await.unwrap());
        assert!(!store.add_link(a.id, b.id).await.unwrap());
        assert!(!store.add_link(Uuid::now_v7(), b.id).await.unwrap());
        let a = store.get(a.id).await.unwrap().unwrap();
        assert_eq!(a.related_to, vec![b.id]);
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("memories.json");

        let id = {
            let store = LocalStore::open(&path).unwrap();
            store.insert(&fact("survives restarts"), &spike(3)).await.unwrap().id
        };
        assert!(path.exists());

        let reopened = LocalStore::open(&path).unwrap();
        let m = reopened.get(id).await.unwrap().unwrap();
        assert_eq!(m.content, "survives restarts");
        assert_eq!(reopened.embedding(id).await.unwrap().unwrap(), spike(3));
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = LocalStore::in_memory();
        let first = store.insert(&fact("first"), &spike(1)).await.unwrap();
        let second = store.insert(&fact("second"), &spike(2)).await.unwrap();
        let all = store.list(None).await.unwrap();
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);
        assert_eq!(store.list(Some(1)).await.unwrap().len(), 1);
    }
}
