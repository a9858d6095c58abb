//! Full-text search index for bibliographic reference catalogs
//!
//! This crate is the engine behind a reference-management backend's
//! free-text search: a purpose-built inverted index kept beside the
//! relational system-of-record, answering ranked queries and keeping itself
//! consistent with the authoritative store.
//!
//! - [`SearchIndex`]: the process-wide handle with the open/close lifecycle
//!   and upsert/delete/clear, each followed by a durable commit
//! - [`SearchIndex::search`]: two-pass ranked retrieval (exact terms, then
//!   prefix wildcards) with pagination shared across the passes
//! - [`SearchIndex::reindex`]: startup consistency check against the
//!   system-of-record, batched rebuild on count mismatch
//! - [`store`] / [`lock`]: on-disk state, atomic commits, and the
//!   single-writer protocol across threads and processes
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//! use refsearch_core::Reference;
//! use refsearch_index::{IndexOptions, SearchIndex};
//!
//! # fn main() -> refsearch_core::Result<()> {
//! let index = SearchIndex::open_at(Path::new("data/index"), IndexOptions::default())?;
//!
//! let mut reference = Reference::new(uuid::Uuid::new_v4());
//! reference.title = Some("Moraine vegetation at Finse".to_string());
//! index.add_or_update(&reference)?;
//!
//! let hits: Vec<_> = index.search("moraine", 0, 10).collect();
//! assert_eq!(hits, vec![reference.id]);
//! index.close()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod index;
pub mod lock;
pub mod query;
pub mod reindex;
pub mod store;
pub mod tokenizer;

pub use document::IndexedDocument;
pub use index::{default_index_dir, IndexOptions, SearchIndex};
pub use query::SearchHits;
pub use reindex::REINDEX_BATCH_SIZE;
pub use store::IndexStore;
pub use tokenizer::{is_stopword, normalize_query, tokenize, STOPWORDS};
