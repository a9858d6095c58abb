//! On-disk index state: directory, lock marker, durable snapshots
//!
//! Layout inside the index directory:
//! - `write.lock`: the lock marker, present while a writer holds the store.
//!   The marker carries an OS-level exclusive lock (`fs2`), so a stale file
//!   left behind by a crashed process cannot wedge the next writer: waiters
//!   poll for the file, but only the lock itself rejects an open.
//! - `index.snapshot`: the committed document set as 4-byte magic, u32 LE
//!   format version, MessagePack payload. Written atomically
//!   (temp + fsync + rename), so the durable state is always the last
//!   complete commit.

use crate::document::IndexedDocument;
use parking_lot::Mutex;
use refsearch_core::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Lock marker file name.
pub const LOCK_FILE_NAME: &str = "write.lock";
/// Snapshot file name.
pub const SNAPSHOT_FILE_NAME: &str = "index.snapshot";

/// Magic bytes for the snapshot format.
const SNAPSHOT_MAGIC: &[u8; 4] = b"RSIX";
/// Current snapshot format version.
const SNAPSHOT_VERSION: u32 = 1;

/// Exclusive handle on an index directory.
///
/// Opening takes the OS lock; release (explicit or on drop) unlocks it and
/// removes the marker. At most one `IndexStore` exists per directory across
/// processes; a second open fails at the storage layer.
pub struct IndexStore {
    dir: PathBuf,
    lock_file: Mutex<Option<File>>,
}

impl IndexStore {
    /// Open the store, enforcing single-writer at the storage layer.
    ///
    /// Creates the directory if missing. `truncate` discards any existing
    /// snapshot before the first load.
    ///
    /// # Errors
    ///
    /// [`Error::StoreLocked`] when another writer holds the marker's OS
    /// lock; I/O errors propagate.
    pub fn open(dir: &Path, truncate: bool) -> Result<Self> {
        std::fs::create_dir_all(dir)?;

        let lock_path = dir.join(LOCK_FILE_NAME);
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&lock_path)?;
        fs2::FileExt::try_lock_exclusive(&lock_file).map_err(|_| Error::StoreLocked {
            path: dir.to_path_buf(),
        })?;

        if truncate {
            let snapshot = dir.join(SNAPSHOT_FILE_NAME);
            if snapshot.exists() {
                std::fs::remove_file(&snapshot)?;
            }
        }

        tracing::info!(
            target: "refsearch::store",
            dir = %dir.display(),
            truncate,
            "Index store opened"
        );

        Ok(IndexStore {
            dir: dir.to_path_buf(),
            lock_file: Mutex::new(Some(lock_file)),
        })
    }

    /// Whether a writer currently advertises the store via the lock marker.
    pub fn lock_marker_present(dir: &Path) -> bool {
        dir.join(LOCK_FILE_NAME).exists()
    }

    /// Load the committed document set. Empty when no snapshot exists yet.
    ///
    /// # Errors
    ///
    /// [`Error::Corruption`] on bad magic, truncation or an unsupported
    /// format version; [`Error::Serialization`] when the payload does not
    /// decode.
    pub fn load(&self) -> Result<Vec<IndexedDocument>> {
        let path = self.dir.join(SNAPSHOT_FILE_NAME);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let buf = std::fs::read(&path)?;
        if buf.len() < 8 {
            return Err(Error::Corruption("snapshot too small".to_string()));
        }
        if &buf[0..4] != SNAPSHOT_MAGIC {
            return Err(Error::Corruption("bad snapshot magic".to_string()));
        }
        let version = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
        if version != SNAPSHOT_VERSION {
            return Err(Error::Corruption(format!(
                "unsupported snapshot version {}",
                version
            )));
        }

        rmp_serde::from_slice(&buf[8..]).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Durably commit the full document set.
    ///
    /// Atomic write: serialize, write to a temp file, fsync, rename over the
    /// snapshot. Readers of the previous snapshot are unaffected; a crash
    /// mid-commit leaves the previous snapshot in place.
    pub fn commit(&self, docs: &[IndexedDocument]) -> Result<()> {
        let payload = rmp_serde::to_vec(docs).map_err(|e| Error::Serialization(e.to_string()))?;

        let mut buf = Vec::with_capacity(8 + payload.len());
        buf.extend_from_slice(SNAPSHOT_MAGIC);
        buf.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
        buf.extend_from_slice(&payload);

        let path = self.dir.join(SNAPSHOT_FILE_NAME);
        let tmp_path = path.with_extension("snapshot.tmp");
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&buf)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// Directory this store owns.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Release the OS lock and remove the marker. Idempotent.
    pub(crate) fn release(&self) {
        if let Some(lock_file) = self.lock_file.lock().take() {
            let _ = fs2::FileExt::unlock(&lock_file);
            drop(lock_file);
            let _ = std::fs::remove_file(self.dir.join(LOCK_FILE_NAME));
            tracing::debug!(
                target: "refsearch::store",
                dir = %self.dir.display(),
                "Index store released"
            );
        }
    }
}

impl Drop for IndexStore {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample_docs() -> Vec<IndexedDocument> {
        vec![
            IndexedDocument {
                id: Uuid::new_v4(),
                text: "Elven, R. 1980 Association analysis".to_string(),
            },
            IndexedDocument {
                id: Uuid::new_v4(),
                text: "Moraine vegetation at Finse".to_string(),
            },
        ]
    }

    #[test]
    fn test_commit_load_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = IndexStore::open(tmp.path(), false).unwrap();

        let docs = sample_docs();
        store.commit(&docs).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, docs);
    }

    #[test]
    fn test_load_without_snapshot_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = IndexStore::open(tmp.path(), false).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_truncate_discards_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let store = IndexStore::open(tmp.path(), false).unwrap();
            store.commit(&sample_docs()).unwrap();
        }

        let store = IndexStore::open(tmp.path(), true).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_second_open_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let _store = IndexStore::open(tmp.path(), false).unwrap();

        let second = IndexStore::open(tmp.path(), false);
        assert!(matches!(second, Err(Error::StoreLocked { .. })));
    }

    #[test]
    fn test_marker_lifecycle() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(!IndexStore::lock_marker_present(tmp.path()));

        let store = IndexStore::open(tmp.path(), false).unwrap();
        assert!(IndexStore::lock_marker_present(tmp.path()));

        drop(store);
        assert!(!IndexStore::lock_marker_present(tmp.path()));
    }

    #[test]
    fn test_reopen_after_release() {
        let tmp = tempfile::tempdir().unwrap();
        let store = IndexStore::open(tmp.path(), false).unwrap();
        store.commit(&sample_docs()).unwrap();
        drop(store);

        let store = IndexStore::open(tmp.path(), false).unwrap();
        assert_eq!(store.load().unwrap().len(), 2);
    }

    #[test]
    fn test_load_bad_magic() {
        let tmp = tempfile::tempdir().unwrap();
        let store = IndexStore::open(tmp.path(), false).unwrap();

        let mut buf = vec![0u8; 100];
        buf[0..4].copy_from_slice(b"XXXX");
        std::fs::write(tmp.path().join(SNAPSHOT_FILE_NAME), &buf).unwrap();

        assert!(matches!(store.load(), Err(Error::Corruption(_))));
    }

    #[test]
    fn test_load_truncated_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let store = IndexStore::open(tmp.path(), false).unwrap();

        std::fs::write(tmp.path().join(SNAPSHOT_FILE_NAME), [0u8; 4]).unwrap();
        assert!(matches!(store.load(), Err(Error::Corruption(_))));
    }

    #[test]
    fn test_load_unsupported_version() {
        let tmp = tempfile::tempdir().unwrap();
        let store = IndexStore::open(tmp.path(), false).unwrap();

        let mut buf = Vec::new();
        buf.extend_from_slice(SNAPSHOT_MAGIC);
        buf.extend_from_slice(&99u32.to_le_bytes());
        std::fs::write(tmp.path().join(SNAPSHOT_FILE_NAME), &buf).unwrap();

        assert!(matches!(store.load(), Err(Error::Corruption(_))));
    }
}
