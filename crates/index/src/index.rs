//! The index handle: writer lifecycle and document mutations
//!
//! This module provides:
//! - `SearchIndex`: the process-wide handle owning the on-disk store
//! - posting lists and the live document map
//! - upsert / delete / clear with a durable commit per mutation
//! - the open/close lifecycle (lock-wait, process mutex, storage lock)
//!
//! # Lifecycle
//!
//! `Closed → (lock-wait) → Opening → Open → Disposing → Closed`. There is no
//! way back from `Open` except [`SearchIndex::close`]; a closed handle
//! rejects further mutations. No partial-open state is observable:
//! construction either returns a live handle or an error.
//!
//! # Thread Safety
//!
//! The handle is a shared singleton: clone it freely, all clones share one
//! index. Searches run concurrently with each other and with writes (they
//! observe the in-memory state of the most recent commit). Mutations
//! serialize on an internal mutex. The design assumes a single logical
//! writer; the mutex keeps interleaved calls from corrupting the
//! replace-upsert sequence.
//!
//! # Durability
//!
//! Every mutation commits before returning; correctness is favored over
//! write throughput since reference-catalog write volume is low. A failed
//! commit leaves the durable state at the previous commit, but in-memory
//! changes already applied are not rolled back. Callers treat the error as
//! fatal for that operation and may force a rebuild.

use crate::document::IndexedDocument;
use crate::lock::{self, ProcessLockGuard};
use crate::store::IndexStore;
use crate::tokenizer::tokenize;
use dashmap::DashMap;
use parking_lot::Mutex;
use refsearch_core::{Error, Reference, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// Options
// ============================================================================

/// Construction-time configuration, supplied by the caller.
///
/// Both flags default to off; the embedding application decides, this
/// component never reads the environment itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexOptions {
    /// Poll for a previous writer's lock marker before opening (bounded,
    /// roughly five seconds). Meant for rolling deploys sharing a volume.
    pub wait_for_lock: bool,
    /// Discard any existing snapshot and start empty.
    pub truncate: bool,
}

// ============================================================================
// Postings
// ============================================================================

/// Entry in a posting list.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PostingEntry {
    /// Owning document.
    pub id: Uuid,
    /// Term frequency in that document.
    pub tf: u32,
    /// Document length in tokens.
    pub doc_len: u32,
}

/// List of documents containing a term.
#[derive(Debug, Clone, Default)]
pub(crate) struct PostingList {
    /// Document entries.
    pub entries: Vec<PostingEntry>,
}

impl PostingList {
    fn add(&mut self, entry: PostingEntry) {
        self.entries.push(entry);
    }

    fn remove(&mut self, id: Uuid) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        before - self.entries.len()
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// SearchIndex
// ============================================================================

pub(crate) struct IndexInner {
    /// Term -> posting list.
    pub(crate) postings: DashMap<String, PostingList>,
    /// Live documents by id; doubles as the committed stored form.
    pub(crate) docs: DashMap<Uuid, IndexedDocument>,
    /// Total token count across live documents, for length normalization.
    total_doc_len: AtomicUsize,
    store: IndexStore,
    /// Serializes mutations.
    write_lock: Mutex<()>,
    /// Consistency-check gate; consumed by the first reindex() call.
    pub(crate) first_use: AtomicBool,
    /// Held while this handle is open, when lock-waiting was requested.
    process_guard: Mutex<Option<ProcessLockGuard>>,
    closed: AtomicBool,
}

impl IndexInner {
    pub(crate) fn avg_doc_len(&self) -> f32 {
        let total = self.docs.len();
        if total == 0 {
            return 0.0;
        }
        self.total_doc_len.load(Ordering::Acquire) as f32 / total as f32
    }
}

/// Process-wide handle on the search index.
///
/// Cheap to clone; all clones share the same store. See the module docs for
/// the lifecycle and concurrency contract.
#[derive(Clone)]
pub struct SearchIndex {
    pub(crate) inner: Arc<IndexInner>,
}

impl SearchIndex {
    /// Open the index at the default location.
    ///
    /// The location is the application root (falling back to the working
    /// directory) plus `data/index`; see [`default_index_dir`].
    pub fn open(options: IndexOptions) -> Result<Self> {
        Self::open_at(&default_index_dir(), options)
    }

    /// Open the index at an explicit directory.
    ///
    /// Protocol, in order: bounded lock-wait for a foreign marker (when
    /// `wait_for_lock` is set), process-local open mutex, storage-layer
    /// exclusive lock. A handle that fails construction leaves nothing
    /// behind; one that succeeds owns the store until closed or dropped.
    pub fn open_at(dir: &Path, options: IndexOptions) -> Result<Self> {
        let guard = if options.wait_for_lock {
            if !lock::wait_for_marker_release(dir) {
                tracing::warn!(
                    target: "refsearch::index",
                    dir = %dir.display(),
                    "lock marker still present after wait budget; attempting open anyway"
                );
            }
            Some(lock::acquire_process_lock())
        } else {
            None
        };

        let store = IndexStore::open(dir, options.truncate)?;

        let index = SearchIndex {
            inner: Arc::new(IndexInner {
                postings: DashMap::new(),
                docs: DashMap::new(),
                total_doc_len: AtomicUsize::new(0),
                store,
                write_lock: Mutex::new(()),
                first_use: AtomicBool::new(true),
                process_guard: Mutex::new(guard),
                closed: AtomicBool::new(false),
            }),
        };

        // Rebuild postings from the committed stored documents.
        for doc in index.inner.store.load()? {
            index.insert_postings(&doc);
            index.inner.docs.insert(doc.id, doc);
        }

        tracing::info!(
            target: "refsearch::index",
            dir = %dir.display(),
            docs = index.count(),
            "Search index opened"
        );

        Ok(index)
    }

    // ========================================================================
    // Writer operations
    // ========================================================================

    /// Upsert one reference and commit durably.
    ///
    /// A reference with no searchable text is a no-op: any previously
    /// indexed content for that id is left untouched, a latent staleness the
    /// caller tolerates.
    pub fn add_or_update(&self, reference: &Reference) -> Result<()> {
        let Some(doc) = IndexedDocument::from_reference(reference) else {
            tracing::debug!(
                target: "refsearch::index",
                id = %reference.id,
                "reference has no searchable text; not indexed"
            );
            return Ok(());
        };

        let _write = self.inner.write_lock.lock();
        self.ensure_open()?;
        self.upsert(doc);
        self.commit()
    }

    /// Upsert a batch of references with a single commit at the end.
    ///
    /// Per-record semantics match [`SearchIndex::add_or_update`]. If any
    /// step fails the whole batch fails; records already applied in memory
    /// are not rolled back (nothing was committed until the end).
    pub fn add_or_update_batch(&self, references: &[Reference]) -> Result<()> {
        let _write = self.inner.write_lock.lock();
        self.ensure_open()?;
        for reference in references {
            if let Some(doc) = IndexedDocument::from_reference(reference) {
                self.upsert(doc);
            }
        }
        self.commit()
    }

    /// Remove the document for `id` and commit. Unknown ids are a silent
    /// no-op (the commit still runs).
    pub fn delete(&self, id: Uuid) -> Result<()> {
        let _write = self.inner.write_lock.lock();
        self.ensure_open()?;
        if let Some((_, old)) = self.inner.docs.remove(&id) {
            self.remove_postings(&old);
        }
        self.commit()
    }

    /// Remove every document and commit.
    pub fn clear(&self) -> Result<()> {
        let _write = self.inner.write_lock.lock();
        self.ensure_open()?;
        self.inner.postings.clear();
        self.inner.docs.clear();
        self.inner.total_doc_len.store(0, Ordering::Release);
        self.commit()
    }

    /// Number of live documents. Used for the consistency comparison, not
    /// for ranking.
    pub fn count(&self) -> usize {
        self.inner.docs.len()
    }

    /// Directory holding the persisted index state.
    pub fn dir(&self) -> &Path {
        self.inner.store.dir()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Dispose the handle: final commit, then release the storage lock, the
    /// marker and the process-local mutex.
    ///
    /// Idempotent. Mutations on any clone of a closed handle fail with
    /// [`Error::Closed`]; searches keep serving the in-memory state.
    pub fn close(&self) -> Result<()> {
        let _write = self.inner.write_lock.lock();
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let result = self.commit();
        self.inner.store.release();
        *self.inner.process_guard.lock() = None;

        tracing::info!(
            target: "refsearch::index",
            dir = %self.inner.store.dir().display(),
            "Search index closed"
        );
        result
    }

    fn ensure_open(&self) -> Result<()> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(Error::Closed);
        }
        Ok(())
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Replace-upsert: old postings for the id go away, new ones go in.
    fn upsert(&self, doc: IndexedDocument) {
        let old = self.inner.docs.get(&doc.id).map(|d| d.value().clone());
        if let Some(old) = old {
            self.remove_postings(&old);
        }
        self.insert_postings(&doc);
        self.inner.docs.insert(doc.id, doc);
    }

    fn insert_postings(&self, doc: &IndexedDocument) {
        let tokens = tokenize(&doc.text);
        let doc_len = tokens.len() as u32;

        let mut tf_map: HashMap<String, u32> = HashMap::with_capacity(tokens.len());
        for token in tokens {
            *tf_map.entry(token).or_insert(0) += 1;
        }

        for (term, tf) in tf_map {
            self.inner.postings.entry(term).or_default().add(PostingEntry {
                id: doc.id,
                tf,
                doc_len,
            });
        }

        self.inner
            .total_doc_len
            .fetch_add(doc_len as usize, Ordering::Release);
    }

    fn remove_postings(&self, doc: &IndexedDocument) {
        // The old text names exactly the terms holding postings for this id.
        let tokens = tokenize(&doc.text);
        let doc_len = tokens.len();
        let unique: HashSet<String> = tokens.into_iter().collect();

        for term in unique {
            let emptied = match self.inner.postings.get_mut(&term) {
                Some(mut list) => {
                    list.remove(doc.id);
                    list.is_empty()
                }
                None => false,
            };
            if emptied {
                self.inner.postings.remove_if(&term, |_, list| list.is_empty());
            }
        }

        self.inner
            .total_doc_len
            .fetch_sub(doc_len, Ordering::Release);
    }

    fn commit(&self) -> Result<()> {
        let docs: Vec<IndexedDocument> = self
            .inner
            .docs
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        self.inner.store.commit(&docs)
    }
}

// ============================================================================
// Location
// ============================================================================

/// Resolve the default index location: the application root plus
/// `data/index`.
///
/// The application root is the first ancestor of the running executable
/// containing a `Cargo.toml`; when none is found the process working
/// directory serves as the root.
pub fn default_index_dir() -> PathBuf {
    let root = application_root().unwrap_or_else(|| PathBuf::from("."));
    root.join("data").join("index")
}

fn application_root() -> Option<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        let mut dir = exe.parent()?.to_path_buf();
        loop {
            if dir.join("Cargo.toml").exists() {
                return Some(dir);
            }
            if !dir.pop() {
                break;
            }
        }
    }
    std::env::current_dir().ok()
}
