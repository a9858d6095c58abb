//! System-of-record abstraction
//!
//! The index is a derived, rebuildable projection of a relational store this
//! workspace never sees directly. `ReferenceSource` is the narrow seam the
//! consistency coordinator needs: a count to compare against and a stream of
//! rows to rebuild from.

use crate::error::Result;
use crate::reference::Reference;

/// Read access to the authoritative reference catalog.
///
/// Implementations wrap whatever relational repository the embedding
/// application uses. Both methods run synchronously on the caller's thread;
/// no `Send + Sync` bound is required because reindexing is a single-writer
/// operation by contract.
pub trait ReferenceSource {
    /// Number of references in the system-of-record.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be queried.
    fn count(&self) -> Result<usize>;

    /// Stream every reference, in any stable order.
    ///
    /// The coordinator consumes this in bounded batches; implementations
    /// should not materialize the whole catalog up front.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be read. Row-level
    /// failures surface as `Err` items in the stream.
    fn iter(&self) -> Result<Box<dyn Iterator<Item = Result<Reference>> + '_>>;
}
