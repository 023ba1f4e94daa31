//! Stepwise construction of a [`RotatingWriter`].

use super::{ErrorHandler, RotatingWriter};
use crate::Error;
use crate::clock::{Clock, SystemClock};
use crate::config::RotationConfig;
use crate::internal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Defaults: 100 MiB threshold, keep everything forever, UTC names, no compression.
#[derive(Default)]
#[must_use]
pub struct WriterBuilder {
    path: Option<PathBuf>,
    config: RotationConfig,
    max_size_bytes: Option<u64>,
    clock: Option<Arc<dyn Clock>>,
    on_error: Option<ErrorHandler>,
}

impl WriterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base path of the active file. Relative paths resolve against the current
    /// directory at build time; a leading `~` expands to the home directory.
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Replaces every rotation setting at once.
    pub const fn config(mut self, config: RotationConfig) -> Self {
        self.config = config;
        self
    }

    /// Rotation threshold in MiB; 0 restores the default.
    pub const fn max_size_mb(mut self, mb: u64) -> Self {
        self.config.max_size_mb = mb;
        self.max_size_bytes = None;
        self
    }

    /// Exact rotation threshold in bytes; 0 restores the default. Overrides `max_size_mb`.
    pub const fn max_size_bytes(mut self, bytes: u64) -> Self {
        self.max_size_bytes = if bytes == 0 { None } else { Some(bytes) };
        self
    }

    pub const fn max_age_days(mut self, days: u32) -> Self {
        self.config.max_age_days = days;
        self
    }

    pub const fn max_backups(mut self, n: usize) -> Self {
        self.config.max_backups = n;
        self
    }

    pub const fn local_time(mut self, local: bool) -> Self {
        self.config.local_time = local;
        self
    }

    pub const fn compress(mut self, compress: bool) -> Self {
        self.config.compress = compress;
        self
    }

    /// Time source for backup names and age pruning.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Receives compression and pruning failures, which happen off the write path.
    /// Without one they go to the diagnostic log.
    pub fn on_background_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(handler));
        self
    }

    /// # Errors
    /// `InvalidPath` when no usable path was given; `Io` if the maintenance
    /// thread cannot be started. Nothing is created on disk until the first write.
    pub fn build(self) -> Result<RotatingWriter, Error> {
        let raw = self
            .path
            .ok_or_else(|| Error::InvalidPath("no path given".to_string()))?;
        let path = resolve_path(&raw)?;
        let max_size = self
            .max_size_bytes
            .unwrap_or_else(|| self.config.max_size_bytes());

        internal::debug(
            "WRITER",
            &format!(
                "Writer for {} (max_size={max_size}, max_age_days={}, max_backups={}, local_time={}, compress={})",
                path.display(),
                self.config.max_age_days,
                self.config.max_backups,
                self.config.local_time,
                self.config.compress
            ),
        );

        RotatingWriter::from_parts(
            path,
            max_size,
            self.config,
            self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            self.on_error,
        )
    }
}

/// Absolute, tilde-expanded form of `raw`. Touches no files.
///
/// # Errors
/// `InvalidPath` for empty paths, paths ending in `..`, or root.
pub fn resolve_path(raw: &Path) -> Result<PathBuf, Error> {
    if raw.as_os_str().is_empty() {
        return Err(Error::InvalidPath("empty path".to_string()));
    }

    let expanded = match raw.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).as_ref()),
        None => raw.to_path_buf(),
    };

    let absolute = std::path::absolute(&expanded)
        .map_err(|e| Error::InvalidPath(format!("{}: {e}", raw.display())))?;

    if absolute.file_name().is_none() {
        return Err(Error::InvalidPath(format!(
            "{} does not name a file",
            raw.display()
        )));
    }
    Ok(absolute)
}
