//! Lumberjack's own diagnostic logger. Rotation, pruning and compression happen
//! off to the side of the data path, so their progress and failures are reported
//! here on stderr instead of into the log file being managed.
//!
//! Uses `OnceLock` so the sink is initialized exactly once, even if the CLI and
//! tests race to call `init`. Any number of rotating writers share it; none of
//! their own state lives here.

use crate::level::Level;
use chrono::Local;
use std::io::Write;
use std::sync::OnceLock;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static INTERNAL_LOGGER: OnceLock<Diagnostics> = OnceLock::new();

#[derive(Debug)]
struct Diagnostics {
    min_level: Level,
}

impl Diagnostics {
    fn log(&self, level: Level, scope: &str, msg: &str) {
        if level < self.min_level {
            return;
        }
        let timestamp = Local::now().format(TIMESTAMP_FORMAT);
        // One locked write per line keeps concurrent threads from interleaving mid-line
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{timestamp} {} {scope:<8} {msg}", level.tag());
    }
}

/// First call wins; later calls are no-ops.
pub fn init(min_level: Level) {
    let was_init = INTERNAL_LOGGER.get().is_some();
    INTERNAL_LOGGER.get_or_init(|| Diagnostics { min_level });
    if !was_init {
        debug("INTERNAL", &format!("Diagnostics ready (level={min_level})"));
    }
}

/// Reports whether a message at `level` would be emitted.
#[must_use]
pub fn enabled(level: Level) -> bool {
    INTERNAL_LOGGER
        .get()
        .is_some_and(|logger| level >= logger.min_level)
}

/// Dropped silently before `init`.
fn log(level: Level, scope: &str, msg: &str) {
    if let Some(logger) = INTERNAL_LOGGER.get() {
        logger.log(level, scope, msg);
    }
}

pub fn trace(scope: &str, msg: &str) {
    log(Level::Trace, scope, msg);
}

pub fn debug(scope: &str, msg: &str) {
    log(Level::Debug, scope, msg);
}

pub fn info(scope: &str, msg: &str) {
    log(Level::Info, scope, msg);
}

pub fn warn(scope: &str, msg: &str) {
    log(Level::Warn, scope, msg);
}

pub fn error(scope: &str, msg: &str) {
    log(Level::Error, scope, msg);
}
