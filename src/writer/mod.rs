//! The rotating writer: appends to one active file and, when the next payload
//! would push it past the size limit, retires it under a timestamped backup name
//! and starts a fresh one.
//!
//! Rotation is a state transition `Open -> RotatingOut -> Open(new)` whose only
//! commit point is the rename. Until the rename succeeds the writer keeps
//! appending to the same file, so a failed rotation never drops data.
//! Compression and pruning run afterwards on a background thread that receives
//! owned settings, not the live handle.

mod builder;
mod worker;

pub use builder::{WriterBuilder, resolve_path};

use crate::backup::{BackupFile, Namer};
use crate::cleanup::{RetentionPolicy, format_size};
use crate::clock::{Clock, Zone};
use crate::config::RotationConfig;
use crate::error::{Error, Op};
use crate::internal;
use std::fs::{self, File, OpenOptions, Permissions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use worker::{MaintenanceTask, Worker};

/// Callback for failures that happen off the write path.
pub type ErrorHandler = Arc<dyn Fn(&Error) + Send + Sync>;

#[derive(Default)]
struct WriterState {
    file: Option<File>,
    size: u64,
}

/// Size-rotating, retention-bounded log file. Safe to share between threads;
/// writes are serialized by an internal lock.
pub struct RotatingWriter {
    path: PathBuf,
    max_size: u64,
    config: RotationConfig,
    namer: Namer,
    clock: Arc<dyn Clock>,
    state: Mutex<WriterState>,
    worker: Worker,
}

impl RotatingWriter {
    pub fn builder() -> WriterBuilder {
        WriterBuilder::new()
    }

    /// Shorthand for `builder().path(path).config(config).build()`.
    ///
    /// # Errors
    /// See [`WriterBuilder::build`].
    pub fn new(path: impl Into<PathBuf>, config: RotationConfig) -> Result<Self, Error> {
        Self::builder().path(path).config(config).build()
    }

    fn from_parts(
        path: PathBuf,
        max_size: u64,
        config: RotationConfig,
        clock: Arc<dyn Clock>,
        on_error: Option<ErrorHandler>,
    ) -> Result<Self, Error> {
        let namer = Namer::new(&path, Zone::from_local_flag(config.local_time))?;
        let task = MaintenanceTask {
            namer: namer.clone(),
            policy: RetentionPolicy::new()
                .max_age_days(config.max_age_days)
                .max_backups(config.max_backups),
            compress: config.compress,
            clock: Arc::clone(&clock),
            on_error,
        };
        let worker = Worker::spawn(task, &path)?;

        Ok(Self {
            path,
            max_size,
            config,
            namer,
            clock,
            state: Mutex::new(WriterState::default()),
            worker,
        })
    }

    /// Absolute path of the active file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Effective rotation threshold in bytes.
    #[must_use]
    pub const fn max_size(&self) -> u64 {
        self.max_size
    }

    #[must_use]
    pub const fn config(&self) -> &RotationConfig {
        &self.config
    }

    /// Appends `data` to the active file, rotating first if it would grow past
    /// the threshold. A payload larger than the threshold on its own is written
    /// without rotating.
    ///
    /// # Errors
    /// Directory creation, open and write failures. When only the rotation
    /// failed, the payload is still appended to the old file and the error is
    /// `Error::Rotation` carrying the byte count.
    pub fn write(&self, data: &[u8]) -> Result<usize, Error> {
        let len = u64::try_from(data.len()).unwrap_or(u64::MAX);
        let mut state = self.lock();

        let mut rotation_error = None;
        if state.file.is_none() {
            self.open_existing_or_new(&mut state)?;
            // Backups left by an earlier run may exceed the current limits
            self.worker.request();
            // Leftover from a previous run that already outgrew the limit
            if state.size > self.max_size
                && let Err(e) = self.rotate_locked(&mut state)
            {
                rotation_error = Some(e);
            }
        }

        if rotation_error.is_none()
            && len <= self.max_size
            && state.size > 0
            && state.size.saturating_add(len) > self.max_size
            && let Err(e) = self.rotate_locked(&mut state)
        {
            rotation_error = Some(e);
        }

        let written = self.append(&mut state, data)?;

        match rotation_error {
            Some(e) => {
                internal::error("WRITER", &format!("Rotation failed: {e}"));
                Err(Error::Rotation {
                    written,
                    source: Box::new(e),
                })
            }
            None => Ok(written),
        }
    }

    /// Rotates now regardless of size. With no active file on disk this just
    /// creates an empty one.
    ///
    /// # Errors
    /// Rename or open failures. On a rename failure the old file stays active.
    pub fn rotate(&self) -> Result<(), Error> {
        let mut state = self.lock();
        self.rotate_locked(&mut state)
    }

    /// Flushes and releases the active file. Idempotent; the next write reopens it.
    ///
    /// # Errors
    /// Flushing to storage failed. The handle is released either way.
    pub fn close(&self) -> Result<(), Error> {
        let mut state = self.lock();
        Self::close_locked(&mut state, &self.path)
    }

    /// Syncs the active file to storage without releasing it.
    ///
    /// # Errors
    /// The sync failed.
    pub fn sync(&self) -> Result<(), Error> {
        let state = self.lock();
        match state.file.as_ref() {
            Some(file) => file
                .sync_data()
                .map_err(|e| Error::io(Op::Write, &self.path, e)),
            None => Ok(()),
        }
    }

    /// Current size of the active file as tracked by the writer (0 when closed
    /// and not yet reopened).
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.lock().size
    }

    /// Backups of this path currently on disk, newest first.
    ///
    /// # Errors
    /// The directory could not be listed.
    pub fn backups(&self) -> Result<Vec<BackupFile>, Error> {
        self.namer.list()
    }

    /// Blocks until every compression and prune pass requested so far is done.
    pub fn wait_for_maintenance(&self) {
        self.worker.barrier();
    }

    fn lock(&self) -> MutexGuard<'_, WriterState> {
        // Writer state stays consistent across a panicking caller: every field
        // is updated only after the I/O it describes succeeded
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends to whatever is at the base path. When that entry exists but
    /// cannot be opened (a directory, say) it is moved aside under a backup
    /// name like a full log file and a fresh file takes its place.
    fn open_existing_or_new(&self, state: &mut WriterState) -> Result<(), Error> {
        self.ensure_dir()?;
        let file = match open_options(false).open(&self.path) {
            Ok(file) => file,
            Err(e) if fs::symlink_metadata(&self.path).is_ok() => {
                internal::warn(
                    "WRITER",
                    &format!("Cannot append to {}: {e}; moving it aside", self.path.display()),
                );
                return self.open_new(state);
            }
            Err(e) => return Err(Error::io(Op::Open, &self.path, e)),
        };
        let size = file
            .metadata()
            .map_err(|e| Error::io(Op::Stat, &self.path, e))?
            .len();
        internal::trace(
            "WRITER",
            &format!("Opened {} ({} existing)", self.path.display(), format_size(size)),
        );
        state.file = Some(file);
        state.size = size;
        Ok(())
    }

    fn ensure_dir(&self) -> Result<(), Error> {
        if let Some(parent) = self.path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| Error::io(Op::CreateDir, parent, e))?;
            internal::debug("WRITER", &format!("Created directory: {}", parent.display()));
        }
        Ok(())
    }

    fn rotate_locked(&self, state: &mut WriterState) -> Result<(), Error> {
        // Released without fsync: the rename keeps the inode, so buffered data
        // goes with it
        Self::release_locked(state);

        if let Err(e) = self.open_new(state) {
            // Not committed: keep appending to the file we already had
            if let Err(reopen) = self.open_existing_or_new(state) {
                internal::error("WRITER", &format!("Reopen after failed rotation: {reopen}"));
            }
            return Err(e);
        }
        Ok(())
    }

    /// Moves whatever is at the base path to a backup name and starts an empty
    /// file with the same permissions.
    fn open_new(&self, state: &mut WriterState) -> Result<(), Error> {
        let permissions = fs::metadata(&self.path)
            .ok()
            .filter(fs::Metadata::is_file)
            .map(|m| m.permissions());

        if let Some(backup) = self.rename_to_backup()? {
            internal::debug(
                "WRITER",
                &format!("Rotated {} -> {}", self.path.display(), backup.display()),
            );
            // Committed: the backup gets its pass even if the new file fails to open
            self.worker.request();
        }

        self.ensure_dir()?;
        let file = open_options(true)
            .open(&self.path)
            .map_err(|e| Error::io(Op::Open, &self.path, e))?;
        if let Some(permissions) = permissions {
            carry_permissions(&self.path, permissions);
        }
        state.file = Some(file);
        state.size = 0;
        Ok(())
    }

    /// Moves the active file to a free backup name. `None` when there was no
    /// active file on disk to move.
    ///
    /// The existence check in `free_backup_path` is the only collision guard;
    /// on Unix `rename` silently replaces its target.
    fn rename_to_backup(&self) -> Result<Option<PathBuf>, Error> {
        let backup = self.namer.free_backup_path(self.clock.now())?;
        match fs::rename(&self.path, &backup) {
            Ok(()) => Ok(Some(backup)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(Op::Rename, &self.path, e)),
        }
    }

    fn append(&self, state: &mut WriterState, data: &[u8]) -> Result<usize, Error> {
        if state.file.is_none() {
            self.open_existing_or_new(state)?;
        }
        let Some(file) = state.file.as_mut() else {
            return Err(Error::io(
                Op::Write,
                &self.path,
                io::Error::from(io::ErrorKind::NotConnected),
            ));
        };
        file.write_all(data)
            .map_err(|e| Error::io(Op::Write, &self.path, e))?;
        state.size = state
            .size
            .saturating_add(u64::try_from(data.len()).unwrap_or(u64::MAX));
        Ok(data.len())
    }

    fn release_locked(state: &mut WriterState) {
        state.size = 0;
        state.file = None;
    }

    fn close_locked(state: &mut WriterState, path: &Path) -> Result<(), Error> {
        state.size = 0;
        let Some(mut file) = state.file.take() else {
            return Ok(());
        };
        file.flush().map_err(|e| Error::io(Op::Close, path, e))?;
        file.sync_all().map_err(|e| Error::io(Op::Close, path, e))?;
        internal::trace("WRITER", &format!("Closed {}", path.display()));
        Ok(())
    }
}

impl Drop for RotatingWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            internal::error("WRITER", &format!("Close on drop failed: {e}"));
        }
    }
}

impl Write for RotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Write::write(&mut &*self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(&mut &*self)
    }
}

impl Write for &RotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match RotatingWriter::write(*self, buf) {
            Ok(n) => Ok(n),
            // The bytes landed; the rotation failure was already logged and will
            // be retried on the next write
            Err(Error::Rotation { written, .. }) => Ok(written),
            Err(e) => Err(e.into()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self.lock();
        match state.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// Append for reopening the active file, truncate for the fresh file after a rotation.
fn open_options(truncate: bool) -> OpenOptions {
    let mut options = OpenOptions::new();
    if truncate {
        options.write(true).truncate(true);
    } else {
        options.append(true);
    }
    options.create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options
}

fn carry_permissions(path: &Path, permissions: Permissions) {
    if let Err(e) = fs::set_permissions(path, permissions) {
        internal::warn(
            "WRITER",
            &format!("Could not copy permissions to {}: {e}", path.display()),
        );
    }
}
