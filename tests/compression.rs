//! Tests for gzip of rotated backups.

use chrono::{DateTime, Duration, Utc};
use flate2::read::GzDecoder;
use lumberjack::backup::compressed_path_for;
use lumberjack::{Error, MockClock, Namer, RotatingWriter, Zone};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

fn instant(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn gunzip(path: &Path) -> String {
    let mut out = String::new();
    GzDecoder::new(File::open(path).unwrap())
        .read_to_string(&mut out)
        .unwrap();
    out
}

#[test]
fn rotated_files_end_up_compressed_only() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    let writer = RotatingWriter::builder()
        .path(&path)
        .max_size_bytes(32)
        .compress(true)
        .build()
        .unwrap();

    let lines: Vec<String> = (0..20).map(|i| format!("compressed line {i:02}\n")).collect();
    for line in &lines {
        writer.write(line.as_bytes()).unwrap();
    }
    writer.wait_for_maintenance();

    let backups = writer.backups().unwrap();
    assert!(!backups.is_empty());
    assert!(backups.iter().all(|b| b.compressed));

    // Oldest first, then the active file, reproduces the input
    let mut restored = String::new();
    for backup in backups.iter().rev() {
        assert!(!backup.uncompressed_path().exists());
        restored.push_str(&gunzip(&backup.path));
    }
    restored.push_str(&fs::read_to_string(&path).unwrap());
    assert_eq!(restored, lines.concat());
}

#[test]
fn leftover_uncompressed_backup_is_caught_up() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    let clock = Arc::new(MockClock::new(instant("2024-02-02T02:02:02Z")));
    let namer = Namer::new(&path, Zone::Utc).unwrap();
    let leftover = namer.backup_path(instant("2024-02-01T00:00:00Z"), 0);
    fs::write(&leftover, "from a crashed run\n").unwrap();
    // A half-written artifact from that crash must not win over the original
    fs::write(compressed_path_for(&leftover), b"\x1f\x8b garbage").unwrap();

    let writer = RotatingWriter::builder()
        .path(&path)
        .compress(true)
        .clock(clock)
        .build()
        .unwrap();
    writer.write(b"current\n").unwrap();
    writer.rotate().unwrap();
    writer.wait_for_maintenance();

    let backups = writer.backups().unwrap();
    assert_eq!(backups.len(), 2);
    assert!(backups.iter().all(|b| b.compressed));
    assert!(!leftover.exists());
    assert_eq!(gunzip(&backups[1].path), "from a crashed run\n");
    assert_eq!(gunzip(&backups[0].path), "current\n");
}

#[test]
fn compression_failure_is_reported_and_original_kept() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    let start = instant("2024-02-02T02:02:02Z");
    let clock = Arc::new(MockClock::new(start));
    let namer = Namer::new(&path, Zone::Utc).unwrap();

    // A directory squatting on the .gz name makes the artifact impossible to create
    let blocked = namer.backup_path(start - Duration::hours(1), 0);
    fs::write(&blocked, "keep me\n").unwrap();
    fs::create_dir(compressed_path_for(&blocked)).unwrap();

    let errors: Arc<Mutex<Vec<String>>> = Arc::default();
    let sink = Arc::clone(&errors);
    let writer = RotatingWriter::builder()
        .path(&path)
        .compress(true)
        .clock(clock)
        .on_background_error(move |e: &Error| sink.lock().unwrap().push(e.to_string()))
        .build()
        .unwrap();

    writer.write(b"rotated fine\n").unwrap();
    writer.rotate().unwrap();
    // The write path never sees the background failure
    writer.write(b"still writing\n").unwrap();
    writer.wait_for_maintenance();

    // One report per pass that retried it: the startup pass and the rotation's
    let errors = errors.lock().unwrap();
    assert!(!errors.is_empty() && errors.len() <= 2, "{errors:?}");
    let blocked_name = blocked.file_name().unwrap().to_string_lossy();
    assert!(errors.iter().all(|e| e.contains(&*blocked_name)));
    assert_eq!(fs::read_to_string(&blocked).unwrap(), "keep me\n");

    let newest = &writer.backups().unwrap()[0];
    assert!(newest.compressed);
    assert_eq!(gunzip(&newest.path), "rotated fine\n");
    assert_eq!(fs::read_to_string(&path).unwrap(), "still writing\n");
}

#[test]
fn compression_off_leaves_backups_plain() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    let writer = RotatingWriter::builder()
        .path(&path)
        .max_size_bytes(8)
        .build()
        .unwrap();

    writer.write(b"1234567\n").unwrap();
    writer.write(b"abcdefg\n").unwrap();
    writer.wait_for_maintenance();

    let backups = writer.backups().unwrap();
    assert_eq!(backups.len(), 1);
    assert!(!backups[0].compressed);
    assert_eq!(fs::read_to_string(&backups[0].path).unwrap(), "1234567\n");
}
