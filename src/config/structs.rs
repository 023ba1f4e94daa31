//! Configuration struct definitions.

use serde::Deserialize;

/// Rotation threshold applied when `max_size_mb` is zero.
pub const DEFAULT_MAX_SIZE_MB: u64 = 100;

const MIB: u64 = 1024 * 1024;

/// Diagnostic settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Minimum level printed on stderr.
    pub level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Rotation and retention limits for one rotating writer. Immutable once the
/// writer is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Rotate once the active file would grow past this many MiB (0 = 100).
    pub max_size_mb: u64,
    /// Delete backups older than this many days (0 = keep regardless of age).
    pub max_age_days: u32,
    /// Keep at most this many backups (0 = keep all).
    pub max_backups: usize,
    /// Stamp backup names in local time instead of UTC.
    pub local_time: bool,
    /// Gzip backups after rotation.
    pub compress: bool,
}

impl RotationConfig {
    /// Effective rotation threshold in bytes.
    #[must_use]
    pub const fn max_size_bytes(&self) -> u64 {
        let mb = if self.max_size_mb == 0 {
            DEFAULT_MAX_SIZE_MB
        } else {
            self.max_size_mb
        };
        mb.saturating_mul(MIB)
    }
}
