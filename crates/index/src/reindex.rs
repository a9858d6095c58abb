//! Startup consistency check and full rebuild
//!
//! The index is a derived projection; after an unclean shutdown or an
//! out-of-band catalog import it can drift from the system-of-record. The
//! check is a count-equality heuristic: cheap, run once per process, and
//! deliberately blind to drift that preserves the document count. The
//! writer is also invoked synchronously on every repository mutation, which
//! covers the common path.

use crate::index::SearchIndex;
use refsearch_core::{Reference, ReferenceSource, Result};
use std::sync::atomic::Ordering;

/// Records streamed per batch during a rebuild.
pub const REINDEX_BATCH_SIZE: usize = 20;

impl SearchIndex {
    /// Compare counts against the system-of-record and rebuild on mismatch.
    ///
    /// Gated to run at most once per process: the gate clears on the first
    /// call whether or not the counts matched, so later calls are no-ops
    /// until an administrative caller uses
    /// [`SearchIndex::force_reindex`]. Returns whether a rebuild ran.
    ///
    /// # Errors
    ///
    /// Errors mid-rebuild are fatal to that invocation and may leave the
    /// index cleared but incomplete; retry with `force_reindex`.
    pub fn reindex(&self, source: &dyn ReferenceSource) -> Result<bool> {
        if !self.inner.first_use.swap(false, Ordering::SeqCst) {
            return Ok(false);
        }

        let source_count = source.count()?;
        if self.count() == source_count {
            tracing::debug!(
                target: "refsearch::reindex",
                count = source_count,
                "index count matches system-of-record; skipping rebuild"
            );
            return Ok(false);
        }

        tracing::info!(
            target: "refsearch::reindex",
            index = self.count(),
            source = source_count,
            "count mismatch; rebuilding index"
        );
        self.rebuild(source)?;
        Ok(true)
    }

    /// Unconditionally clear and rebuild: the administrative retry path.
    pub fn force_reindex(&self, source: &dyn ReferenceSource) -> Result<()> {
        self.inner.first_use.store(false, Ordering::SeqCst);
        self.rebuild(source)
    }

    fn rebuild(&self, source: &dyn ReferenceSource) -> Result<()> {
        self.clear()?;

        let mut batch: Vec<Reference> = Vec::with_capacity(REINDEX_BATCH_SIZE);
        for reference in source.iter()? {
            batch.push(reference?);
            if batch.len() == REINDEX_BATCH_SIZE {
                self.add_or_update_batch(&batch)?;
                batch.clear();
            }
        }
        if !batch.is_empty() {
            self.add_or_update_batch(&batch)?;
        }

        tracing::info!(
            target: "refsearch::reindex",
            docs = self.count(),
            "rebuild complete"
        );
        Ok(())
    }
}
