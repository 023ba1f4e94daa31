//! Gzip a retired backup next to itself, then drop the original.
//!
//! Either the original or the finished `.gz` survives a call, never both
//! and never neither. A half-written artifact is removed before the error is returned.

use crate::backup::compressed_path_for;
use crate::error::{Error, Op};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

/// Compresses `path` into `path.gz` and removes `path`. An existing `.gz` is
/// overwritten; the uncompressed original is authoritative.
///
/// Returns bytes saved so callers can report totals.
///
/// # Errors
/// Any read, write, sync or remove failure; the original is left intact.
pub fn compress_file(path: &Path) -> Result<u64, Error> {
    let gz_path = compressed_path_for(path);

    let (original_size, compressed_size) = match write_compressed(path, &gz_path) {
        Ok(sizes) => sizes,
        Err(e) => {
            let _ = fs::remove_file(&gz_path);
            return Err(e);
        }
    };

    // The .gz is durable now, so the original can go
    if let Err(e) = fs::remove_file(path) {
        let _ = fs::remove_file(&gz_path);
        return Err(Error::io(Op::Remove, path, e));
    }

    Ok(original_size.saturating_sub(compressed_size))
}

fn write_compressed(src: &Path, dst: &Path) -> Result<(u64, u64), Error> {
    let input = File::open(src).map_err(|e| Error::io(Op::Open, src, e))?;
    let meta = input.metadata().map_err(|e| Error::io(Op::Stat, src, e))?;

    let output = create_private(dst, &meta)?;
    let mut encoder = GzEncoder::new(BufWriter::new(output), Compression::default());

    io::copy(&mut BufReader::new(input), &mut encoder)
        .map_err(|e| Error::io(Op::Compress, src, e))?;

    let writer = encoder
        .finish()
        .map_err(|e| Error::io(Op::Compress, dst, e))?;
    let output = writer
        .into_inner()
        .map_err(|e| Error::io(Op::Write, dst, e.into_error()))?;
    output.sync_all().map_err(|e| Error::io(Op::Write, dst, e))?;
    let compressed_size = output
        .metadata()
        .map_err(|e| Error::io(Op::Stat, dst, e))?
        .len();
    drop(output);

    Ok((meta.len(), compressed_size))
}

/// Opens `dst` for a fresh artifact. On Unix it is created with the source's
/// mode, so its contents are never more readable than the original.
fn create_private(dst: &Path, src_meta: &fs::Metadata) -> Result<File, Error> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        options.mode(src_meta.permissions().mode() & 0o777);
    }
    let file = options.open(dst).map_err(|e| Error::io(Op::Open, dst, e))?;
    // `mode` only applies on creation; a stale artifact being reused keeps its
    // old mode until this
    file.set_permissions(src_meta.permissions())
        .map_err(|e| Error::io(Op::Write, dst, e))?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn replaces_original_with_gzip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app-2024-03-01T10-00-00.000.log");
        let content = "line\n".repeat(1000);
        fs::write(&path, &content).unwrap();

        let saved = compress_file(&path).unwrap();
        assert!(saved > 0);
        assert!(!path.exists());

        let gz = compressed_path_for(&path);
        let mut decoded = String::new();
        GzDecoder::new(File::open(gz).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, content);
    }

    #[test]
    fn missing_source_leaves_no_artifact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gone.log");

        let err = compress_file(&path).unwrap_err();
        assert_eq!(err.io_kind(), Some(io::ErrorKind::NotFound));
        assert!(!compressed_path_for(&path).exists());
    }

    #[cfg(unix)]
    #[test]
    fn artifact_is_created_with_source_mode() {
        use std::os::unix::fs::{MetadataExt, PermissionsExt};

        let dir = tempdir().unwrap();
        let path = dir.path().join("private.log");
        fs::write(&path, "secret\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();
        let gz = compressed_path_for(&path);

        let meta = fs::metadata(&path).unwrap();
        let file = create_private(&gz, &meta).unwrap();
        // Checked before any contents are written
        assert_eq!(file.metadata().unwrap().mode() & 0o777, 0o600);
        drop(file);
        fs::remove_file(&gz).unwrap();

        compress_file(&path).unwrap();
        assert_eq!(fs::metadata(&gz).unwrap().permissions().mode() & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn reused_artifact_is_narrowed_before_writing() {
        use std::os::unix::fs::{MetadataExt, PermissionsExt};

        let dir = tempdir().unwrap();
        let path = dir.path().join("private.log");
        fs::write(&path, "secret\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();
        let gz = compressed_path_for(&path);
        fs::write(&gz, "stale").unwrap();
        fs::set_permissions(&gz, fs::Permissions::from_mode(0o644)).unwrap();

        let file = create_private(&gz, &fs::metadata(&path).unwrap()).unwrap();
        assert_eq!(file.metadata().unwrap().mode() & 0o777, 0o600);
        assert_eq!(file.metadata().unwrap().len(), 0);
    }

    #[test]
    fn stale_artifact_is_overwritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "fresh").unwrap();
        fs::write(compressed_path_for(&path), "half-written garbage").unwrap();

        compress_file(&path).unwrap();

        let mut decoded = String::new();
        GzDecoder::new(File::open(compressed_path_for(&path)).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "fresh");
    }
}
