//! Unified error type for all lumberjack operations.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Filesystem step that failed, attached to every I/O error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    CreateDir,
    Open,
    Write,
    Rename,
    Remove,
    Compress,
    ReadDir,
    Stat,
    Close,
    Spawn,
}

impl Op {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateDir => "create directory",
            Self::Open => "open",
            Self::Write => "write",
            Self::Rename => "rename",
            Self::Remove => "remove",
            Self::Compress => "compress",
            Self::ReadDir => "read directory",
            Self::Stat => "stat",
            Self::Close => "close",
            Self::Spawn => "spawn worker for",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for lumberjack operations.
#[derive(Debug)]
pub enum Error {
    /// I/O failure tagged with the operation and the path it touched.
    Io {
        op: Op,
        path: PathBuf,
        source: io::Error,
    },
    /// Base path could not be resolved to a usable file path.
    InvalidPath(String),
    /// Config file could not be read.
    ConfigRead { path: PathBuf, source: io::Error },
    /// TOML config parsing error.
    ConfigParse(toml::de::Error),
    /// Every disambiguation suffix for a backup name was already taken.
    CollisionExhausted { path: PathBuf },
    /// The payload was appended to the old file, but rotating it out failed.
    Rotation { written: usize, source: Box<Error> },
}

impl Error {
    pub(crate) fn io(op: Op, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// Bytes that still reached disk despite the error.
    #[must_use]
    pub const fn written(&self) -> usize {
        match self {
            Self::Rotation { written, .. } => *written,
            _ => 0,
        }
    }

    /// Kind of the innermost I/O failure, if any.
    #[must_use]
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::Io { source, .. } | Self::ConfigRead { source, .. } => Some(source.kind()),
            Self::Rotation { source, .. } => source.io_kind(),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { op, path, source } => {
                write!(f, "{op} {}: {source}", path.display())
            }
            Self::InvalidPath(s) => write!(f, "invalid path: {s}"),
            Self::ConfigRead { path, source } => {
                write!(f, "reading config {}: {source}", path.display())
            }
            Self::ConfigParse(e) => write!(f, "parse error: {e}"),
            Self::CollisionExhausted { path } => {
                write!(f, "no free backup name for {}", path.display())
            }
            Self::Rotation { written, source } => {
                write!(f, "rotation failed ({written} bytes kept in active file): {source}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } | Self::ConfigRead { source, .. } => Some(source),
            Self::ConfigParse(e) => Some(e),
            Self::Rotation { source, .. } => Some(source.as_ref()),
            Self::InvalidPath(_) | Self::CollisionExhausted { .. } => None,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::ConfigParse(e)
    }
}

impl From<Error> for io::Error {
    fn from(e: Error) -> Self {
        let kind = e.io_kind().unwrap_or(io::ErrorKind::Other);
        Self::new(kind, e)
    }
}
