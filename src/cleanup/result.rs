//! Outcome of one maintenance pass.

use super::format_size;
use crate::backup::BackupFile;
use crate::error::Error;
use crate::internal;
use crate::level::Level;
use std::path::PathBuf;

#[derive(Debug, Default)]
pub struct PruneResult {
    /// Files removed for exceeding the count or age limit.
    pub deleted: Vec<PathBuf>,
    /// Bytes reclaimed by deletion.
    pub freed: u64,
    /// Backups that were gzipped during the pass (uncompressed paths).
    pub compressed: Vec<PathBuf>,
    /// Bytes reclaimed by compression.
    pub compressed_saved: u64,
    /// Backups still on disk after pruning, newest first.
    pub retained: Vec<BackupFile>,
    /// Per-file failures; none of them stopped the pass.
    pub failed: Vec<Error>,
}

impl PruneResult {
    /// Files deleted plus files compressed.
    #[must_use]
    pub fn count(&self) -> usize {
        self.deleted.len() + self.compressed.len()
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Debug-level summary on the diagnostic sink.
    pub fn log(&self) {
        if !self.deleted.is_empty() {
            internal::debug(
                "PRUNE",
                &format!(
                    "Deleted {} file(s), freed {}",
                    self.deleted.len(),
                    format_size(self.freed)
                ),
            );
            if internal::enabled(Level::Trace) {
                for path in &self.deleted {
                    internal::trace("PRUNE", &format!("  {}", path.display()));
                }
            }
        }

        if !self.compressed.is_empty() {
            internal::debug(
                "COMPRESS",
                &format!(
                    "Compressed {} file(s), saved {}",
                    self.compressed.len(),
                    format_size(self.compressed_saved)
                ),
            );
        }

        if self.count() == 0 && self.failed.is_empty() {
            internal::trace("PRUNE", "Nothing to do");
        }
    }
}
