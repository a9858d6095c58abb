//! Embedded full-text search for bibliographic reference catalogs
//!
//! A purpose-built inverted index kept beside a relational system-of-record:
//! the relational store stays authoritative, the index answers free-text
//! queries and rebuilds itself whenever the two drift apart.
//!
//! # Quick Start
//!
//! ```no_run
//! use refsearch::{IndexOptions, Reference, SearchIndex};
//! use std::path::Path;
//!
//! # fn main() -> refsearch::Result<()> {
//! let index = SearchIndex::open_at(Path::new("data/index"), IndexOptions::default())?;
//!
//! let mut reference = Reference::new(uuid::Uuid::new_v4());
//! reference.author = Some("Elven, R.".to_string());
//! reference.year = Some("1980".to_string());
//! index.add_or_update(&reference)?;
//!
//! for id in index.search("elven 1980", 0, 10) {
//!     println!("hit: {id}");
//! }
//! index.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! The repository layer calls [`SearchIndex::add_or_update`] and
//! [`SearchIndex::delete`] after each successful transactional mutation,
//! re-fetches rows for the ids [`SearchIndex::search`] returns, and runs
//! [`SearchIndex::reindex`] against its [`ReferenceSource`] at startup.
//! Every mutation commits durably before returning; one writer owns the
//! on-disk store at a time, across threads and processes.

pub use refsearch_core::{Error, Reference, ReferenceSource, Result};
pub use refsearch_index::{
    default_index_dir, IndexOptions, IndexedDocument, SearchHits, SearchIndex,
    REINDEX_BATCH_SIZE,
};
