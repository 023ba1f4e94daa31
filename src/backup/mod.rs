//! Backup files are never tracked in memory. They are re-derived from the
//! directory listing every time, using the [`Namer`] grammar as the only source
//! of truth for what belongs to a given base path.

mod namer;

pub use namer::{MAX_DISAMBIGUATION, Namer, TIMESTAMP_FORMAT};

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Suffix appended to a backup once it has been gzipped.
pub const COMPRESS_SUFFIX: &str = ".gz";

/// One rotated file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupFile {
    pub path: PathBuf,
    /// Rotation instant embedded in the name.
    pub timestamp: DateTime<Utc>,
    /// Collision disambiguator; 0 when the name carries no suffix.
    pub seq: u32,
    pub compressed: bool,
}

impl BackupFile {
    /// Ordering key shared by `X` and `X.gz`, which are the same logical backup.
    #[must_use]
    pub const fn key(&self) -> (DateTime<Utc>, u32) {
        (self.timestamp, self.seq)
    }

    /// Path of the uncompressed variant (the file itself when not compressed).
    #[must_use]
    pub fn uncompressed_path(&self) -> PathBuf {
        if !self.compressed {
            return self.path.clone();
        }
        let raw = self.path.to_string_lossy();
        PathBuf::from(raw.strip_suffix(COMPRESS_SUFFIX).unwrap_or(&raw))
    }

    /// Path of the gzipped variant.
    #[must_use]
    pub fn compressed_path(&self) -> PathBuf {
        if self.compressed {
            self.path.clone()
        } else {
            compressed_path_for(&self.path)
        }
    }
}

/// `path` with [`COMPRESS_SUFFIX`] appended to the full file name.
#[must_use]
pub fn compressed_path_for(path: &Path) -> PathBuf {
    let mut raw = path.as_os_str().to_owned();
    raw.push(COMPRESS_SUFFIX);
    PathBuf::from(raw)
}
