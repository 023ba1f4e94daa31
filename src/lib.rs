//! `lumberjack` - rolling log files with size rotation, retention and gzip.
//!
//! A [`RotatingWriter`] owns one base path. Each write is appended to the
//! active file; when the next payload would push it past the size limit the
//! file is renamed to `<stem>-<timestamp><.ext>` and a fresh one is started.
//! Old backups are pruned by count and age, and optionally gzipped, on a
//! background thread so housekeeping never stalls the writer.
//!
//! # Example
//!
//! ```no_run
//! use lumberjack::RotatingWriter;
//!
//! let writer = RotatingWriter::builder()
//!     .path("/var/log/myapp/app.log")
//!     .max_size_mb(10)
//!     .max_backups(5)
//!     .max_age_days(14)
//!     .compress(true)
//!     .build()?;
//!
//! writer.write(b"service started\n")?;
//! writer.close()?;
//! # Ok::<(), lumberjack::Error>(())
//! ```
//!
//! # Features
//!
//! - `cli` (default): the `lumberjack-logger` binary that copies stdin lines into a writer

pub mod backup;
pub mod cleanup;
pub mod clock;
pub mod config;
pub mod error;
pub mod internal;
pub mod level;
pub mod writer;

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;

// Re-exports for convenience
pub use backup::{BackupFile, Namer};
pub use cleanup::{
    PruneResult, RetentionPolicy, compress_file, format_size, maintain, parse_size, prune,
};
pub use clock::{Clock, MockClock, SystemClock, Zone};
pub use config::{Config, RotationConfig};
pub use error::{Error, Op};
pub use level::Level;
pub use writer::{ErrorHandler, RotatingWriter, WriterBuilder};
