//! Backup naming: `<stem>-<timestamp>[-<n>]<.ext>[.gz]` next to the active file.

use super::{BackupFile, COMPRESS_SUFFIX, compressed_path_for};
use crate::clock::Zone;
use crate::error::{Error, Op};
use crate::internal;
use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Millisecond resolution; dashes instead of colons keep names portable.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";

/// Highest collision suffix tried before a rotation gives up.
pub const MAX_DISAMBIGUATION: u32 = 999;

/// Derives backup names for one base path and recognizes them in a listing.
#[derive(Debug, Clone)]
pub struct Namer {
    dir: PathBuf,
    stem: String,
    /// Includes the leading dot, or empty for extension-less base names.
    ext: String,
    zone: Zone,
    pattern: Regex,
}

impl Namer {
    /// # Errors
    /// `InvalidPath` when `base` has no file name or the name is not UTF-8.
    pub fn new(base: &Path, zone: Zone) -> Result<Self, Error> {
        let file_name = base
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::InvalidPath(format!("{} has no file name", base.display())))?;
        let dir = base
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        let as_path = Path::new(file_name);
        let stem = as_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name)
            .to_string();
        let ext = as_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();

        let pattern = Regex::new(&format!(
            r"^{}-(\d{{4}}-\d{{2}}-\d{{2}}T\d{{2}}-\d{{2}}-\d{{2}}\.\d{{3}})(?:-(\d+))?{}({})?$",
            regex::escape(&stem),
            regex::escape(&ext),
            regex::escape(COMPRESS_SUFFIX),
        ))
        .map_err(|e| Error::InvalidPath(format!("{}: {e}", base.display())))?;

        Ok(Self {
            dir,
            stem,
            ext,
            zone,
            pattern,
        })
    }

    /// Directory holding the active file and its backups.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub const fn zone(&self) -> Zone {
        self.zone
    }

    /// File name for a rotation at `instant`; `seq` 0 means no disambiguation suffix.
    #[must_use]
    pub fn backup_name(&self, instant: DateTime<Utc>, seq: u32) -> String {
        let timestamp = self.zone.naive(instant).format(TIMESTAMP_FORMAT);
        if seq == 0 {
            format!("{}-{timestamp}{}", self.stem, self.ext)
        } else {
            format!("{}-{timestamp}-{seq}{}", self.stem, self.ext)
        }
    }

    #[must_use]
    pub fn backup_path(&self, instant: DateTime<Utc>, seq: u32) -> PathBuf {
        self.dir.join(self.backup_name(instant, seq))
    }

    /// First backup path for `instant` whose plain and gzipped variants are both unused.
    ///
    /// # Errors
    /// `CollisionExhausted` once every suffix up to [`MAX_DISAMBIGUATION`] is taken.
    pub fn free_backup_path(&self, instant: DateTime<Utc>) -> Result<PathBuf, Error> {
        for seq in 0..=MAX_DISAMBIGUATION {
            let candidate = self.backup_path(instant, seq);
            if !exists(&candidate) && !exists(&compressed_path_for(&candidate)) {
                if seq > 0 {
                    internal::debug(
                        "NAMER",
                        &format!("Name collision, using suffix {seq}: {}", candidate.display()),
                    );
                }
                return Ok(candidate);
            }
        }
        Err(Error::CollisionExhausted {
            path: self.backup_path(instant, 0),
        })
    }

    /// Recognizes a directory entry as one of our backups.
    #[must_use]
    pub fn parse(&self, file_name: &str) -> Option<BackupFile> {
        let caps = self.pattern.captures(file_name)?;
        let naive = NaiveDateTime::parse_from_str(&caps[1], TIMESTAMP_FORMAT).ok()?;
        let timestamp = self.zone.instant(naive)?;
        let seq = match caps.get(2) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        Some(BackupFile {
            path: self.dir.join(file_name),
            timestamp,
            seq,
            compressed: caps.get(3).is_some(),
        })
    }

    /// All backups of this base path, newest first. Directories and unrelated
    /// files are skipped; a missing directory has no backups.
    ///
    /// # Errors
    /// Listing the directory failed for a reason other than it not existing.
    pub fn list(&self) -> Result<Vec<BackupFile>, Error> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(Op::ReadDir, &self.dir, e)),
        };

        let mut backups = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(Op::ReadDir, &self.dir, e))?;
            if entry.file_type().is_ok_and(|t| t.is_dir()) {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(backup) = self.parse(name) {
                internal::trace("NAMER", &format!("Found backup: {name}"));
                backups.push(backup);
            }
        }

        // Newest first; for one logical backup the plain file sorts before its .gz
        backups.sort_by(|a, b| {
            b.key()
                .cmp(&a.key())
                .then_with(|| a.compressed.cmp(&b.compressed))
        });
        Ok(backups)
    }
}

fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
