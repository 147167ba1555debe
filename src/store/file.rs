//! JSON file record store
//!
//! One file per collection at `<data_dir>/<collection>.json`, holding the rows
//! as a JSON array in insertion order.
//!
//! Every mutation is read-modify-write while holding `<collection>.json.lock`,
//! an exclusive lock file shared by every store instance and process on the
//! same data directory. The new array is written to a uniquely named temp file
//! and persisted over the collection file, so readers see either the old or
//! the new rows and a crash never leaves a partial file.

use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tokio::fs;
use tokio::sync::Mutex;

use super::errors::{StoreError, StoreResult};
use super::{apply_patch, RecordStore};
use crate::entity::{Entity, Record, RecordId};

/// Give up waiting for another writer after this long
const LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Poll interval while another writer holds the lock
const LOCK_RETRY: Duration = Duration::from_millis(5);

/// A lock file older than this was left by a crashed writer
const LOCK_STALE_AFTER: Duration = Duration::from_secs(30);

/// File-backed store for one entity kind
#[derive(Debug)]
pub struct FileRecordStore<E> {
    path: PathBuf,
    lock_path: PathBuf,
    write_lock: Mutex<()>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> FileRecordStore<E> {
    /// Store for `E` inside `data_dir`
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let path = data_dir.as_ref().join(format!("{}.json", E::COLLECTION));
        Self {
            lock_path: path.with_extension("json.lock"),
            path,
            write_lock: Mutex::new(()),
            _entity: PhantomData,
        }
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn data_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    async fn load(&self) -> StoreResult<Vec<Record<E>>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::Persistence(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            StoreError::MalformedDocument(format!("Failed to parse {}: {}", self.path.display(), e))
        })
    }

    /// Runs one read-modify-write cycle under both the in-process and the
    /// on-disk lock.
    async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Vec<Record<E>>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let _local = self.write_lock.lock().await;

        fs::create_dir_all(self.data_dir()).await.map_err(|e| {
            StoreError::Persistence(format!("Failed to create data directory: {}", e))
        })?;
        let _file_lock = LockFile::acquire(&self.lock_path).await?;

        let mut records = self.load().await?;
        let outcome = change(&mut records)?;
        self.save(&records).await?;

        Ok(outcome)
    }

    async fn save(&self, records: &[Record<E>]) -> StoreResult<()> {
        let content = serde_json::to_vec_pretty(records)
            .map_err(|e| StoreError::Persistence(format!("Failed to serialize rows: {}", e)))?;
        let dir = self.data_dir().to_path_buf();
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_replacing(&dir, &path, &content))
            .await
            .map_err(|e| StoreError::Persistence(format!("Write task failed: {}", e)))?
    }
}

/// Writes `content` to a fresh temp file in `dir` and moves it over `path`.
fn write_replacing(dir: &Path, path: &Path, content: &[u8]) -> StoreResult<()> {
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| {
        StoreError::Persistence(format!("Failed to create temp file in {}: {}", dir.display(), e))
    })?;

    tmp.write_all(content)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| {
            StoreError::Persistence(format!("Failed to write {}: {}", tmp.path().display(), e))
        })?;

    tmp.persist(path).map_err(|e| {
        StoreError::Persistence(format!("Failed to replace {}: {}", path.display(), e.error))
    })?;

    Ok(())
}

/// Exclusive on-disk writer lock, released on drop
#[derive(Debug)]
struct LockFile {
    path: PathBuf,
}

impl LockFile {
    async fn acquire(path: &Path) -> StoreResult<Self> {
        let started = Instant::now();

        loop {
            let attempt = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(path)
                .await;

            match attempt {
                Ok(_) => {
                    return Ok(Self {
                        path: path.to_path_buf(),
                    })
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    if is_stale(path).await {
                        let _ = fs::remove_file(path).await;
                        continue;
                    }
                    if started.elapsed() >= LOCK_TIMEOUT {
                        return Err(StoreError::Persistence(format!(
                            "Timed out waiting for writer lock {}",
                            path.display()
                        )));
                    }
                    tokio::time::sleep(LOCK_RETRY).await;
                }
                Err(e) => {
                    return Err(StoreError::Persistence(format!(
                        "Failed to take writer lock {}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

async fn is_stale(path: &Path) -> bool {
    let Ok(metadata) = fs::metadata(path).await else {
        return false;
    };
    metadata
        .modified()
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age > LOCK_STALE_AFTER)
}

impl<E: Entity> RecordStore<E> for FileRecordStore<E> {
    async fn insert(&self, fields: E, owner_id: Option<String>) -> StoreResult<RecordId> {
        self.mutate(|records| {
            let record = Record::new(fields, owner_id);
            let id = record.id;
            records.push(record);
            Ok(id)
        })
        .await
    }

    async fn get(&self, id: RecordId) -> StoreResult<Option<Record<E>>> {
        let records = self.load().await?;
        Ok(records.into_iter().find(|r| r.id == id))
    }

    async fn list(&self) -> StoreResult<Vec<Record<E>>> {
        self.load().await
    }

    async fn patch(&self, id: RecordId, partial: Map<String, Value>) -> StoreResult<Record<E>> {
        self.mutate(|records| {
            let idx = records
                .iter()
                .position(|r| r.id == id)
                .ok_or_else(|| StoreError::not_found(E::COLLECTION, id))?;

            let updated = apply_patch(&records[idx], partial)?;
            records[idx] = updated.clone();
            Ok(updated)
        })
        .await
    }

    async fn delete(&self, id: RecordId) -> StoreResult<()> {
        self.mutate(|records| {
            let idx = records
                .iter()
                .position(|r| r.id == id)
                .ok_or_else(|| StoreError::not_found(E::COLLECTION, id))?;
            records.remove(idx);
            Ok(())
        })
        .await
    }
}
