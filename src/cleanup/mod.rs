//! Retention and compression of rotated backups: count and age limits, then
//! gzip for whatever survives. Runs off the write path.

mod compress;
mod options;
mod result;
mod size;

pub use compress::compress_file;
pub use options::RetentionPolicy;
pub use result::PruneResult;
pub use size::{format_size, parse_size};

use crate::backup::{BackupFile, Namer};
use crate::error::{Error, Op};
use crate::internal;
use chrono::{DateTime, Utc};
use std::fs;
use std::io;
use std::path::Path;

/// Deletes backups of `namer`'s base path that exceed `policy`.
///
/// Backups are ranked newest first; `X` and `X.gz` count as one. Everything
/// past the newest `max_backups` and everything older than `max_age_days` is
/// removed. Only names the namer recognizes are ever touched, so the active
/// file and unrelated files survive.
///
/// # Errors
/// Only when the directory cannot be listed. Individual delete failures are
/// collected in [`PruneResult::failed`] and do not stop the pass.
pub fn prune(
    namer: &Namer,
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
) -> Result<PruneResult, Error> {
    prune_with(namer, policy, now, |path| fs::remove_file(path))
}

fn prune_with<F>(
    namer: &Namer,
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
    mut remove: F,
) -> Result<PruneResult, Error>
where
    F: FnMut(&Path) -> io::Result<()>,
{
    let mut result = PruneResult::default();
    let backups = namer.list()?;

    if policy.is_unbounded() {
        result.retained = backups;
        return Ok(result);
    }

    let cutoff = policy.cutoff(now);
    let mut rank = 0usize;
    let mut last_key = None;

    for backup in backups {
        // Plain and gzipped variants share a key and sit next to each other
        if last_key != Some(backup.key()) {
            rank += 1;
            last_key = Some(backup.key());
        }

        let over_count = policy.max_backups > 0 && rank > policy.max_backups;
        let expired = cutoff.is_some_and(|cutoff| backup.timestamp < cutoff);

        if !(over_count || expired) {
            result.retained.push(backup);
            continue;
        }

        if expired {
            internal::trace(
                "PRUNE",
                &format!("{} exceeds age limit", backup.path.display()),
            );
        }
        remove_backup(&backup, &mut remove, &mut result);
    }

    Ok(result)
}

/// One full housekeeping pass: prune, then gzip every surviving backup that is
/// still uncompressed (when `compress` is set).
///
/// # Errors
/// Only when the directory cannot be listed.
pub fn maintain(
    namer: &Namer,
    policy: &RetentionPolicy,
    compress: bool,
    now: DateTime<Utc>,
) -> Result<PruneResult, Error> {
    internal::debug(
        "PRUNE",
        &format!(
            "Maintenance in {} (max_age_days={}, max_backups={}, compress={compress})",
            namer.dir().display(),
            policy.max_age_days,
            policy.max_backups
        ),
    );

    let mut result = prune(namer, policy, now)?;

    if compress {
        let pending: Vec<_> = result
            .retained
            .iter()
            .filter(|b| !b.compressed)
            .map(|b| b.path.clone())
            .collect();

        for path in pending {
            internal::debug("COMPRESS", &format!("Compressing {}", path.display()));
            match compress_file(&path) {
                Ok(saved) => {
                    result.compressed.push(path);
                    result.compressed_saved += saved;
                }
                Err(e) => result.failed.push(e),
            }
        }
    }

    result.log();
    Ok(result)
}

fn remove_backup<F>(backup: &BackupFile, remove: &mut F, result: &mut PruneResult)
where
    F: FnMut(&Path) -> io::Result<()>,
{
    let size = fs::metadata(&backup.path).map_or(0, |m| m.len());
    match remove(&backup.path) {
        Ok(()) => {
            result.deleted.push(backup.path.clone());
            result.freed += size;
        }
        // Already gone (another cleaner, or compression raced us) is the goal state
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            internal::warn(
                "PRUNE",
                &format!("Failed to remove {}: {e}", backup.path.display()),
            );
            result.failed.push(Error::io(Op::Remove, &backup.path, e));
        }
    }
}
