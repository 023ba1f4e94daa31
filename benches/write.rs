use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use lumberjack::backup::Namer;
use lumberjack::{RotatingWriter, Zone};
use std::hint::black_box;
use std::path::Path;
use tempfile::TempDir;

const LINE: &[u8] = b"2025-01-15T14:30:00Z INFO request served path=/api/v1/items status=200\n";

fn bench_write_no_rotation(c: &mut Criterion) {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let writer = RotatingWriter::builder()
        .path(tmp.path().join("bench.log"))
        .max_size_mb(1024)
        .build()
        .expect("failed to build writer");

    c.bench_function("RotatingWriter::write", |b| {
        b.iter(|| {
            writer.write(black_box(LINE)).expect("write failed");
        });
    });
}

fn bench_write_with_rotation(c: &mut Criterion) {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let writer = RotatingWriter::builder()
        .path(tmp.path().join("rotating.log"))
        .max_size_bytes(64 * 1024)
        .max_backups(3)
        .build()
        .expect("failed to build writer");

    c.bench_function("RotatingWriter::write (64K rotation)", |b| {
        b.iter(|| {
            writer.write(black_box(LINE)).expect("write failed");
        });
    });
    writer.wait_for_maintenance();
}

fn bench_namer_parse(c: &mut Criterion) {
    let namer = Namer::new(Path::new("/var/log/app.log"), Zone::Utc).expect("namer");

    c.bench_function("Namer::parse", |b| {
        b.iter(|| namer.parse(black_box("app-2025-01-15T14-30-00.123-4.log.gz")));
    });
}

fn bench_rotate(c: &mut Criterion) {
    c.bench_function("RotatingWriter::rotate", |b| {
        b.iter_batched(
            || {
                let tmp = TempDir::new().expect("failed to create temp dir");
                let writer = RotatingWriter::builder()
                    .path(tmp.path().join("r.log"))
                    .build()
                    .expect("failed to build writer");
                writer.write(LINE).expect("write failed");
                (tmp, writer)
            },
            |(_tmp, writer)| writer.rotate().expect("rotate failed"),
            BatchSize::PerIteration,
        );
    });
}

criterion_group!(
    benches,
    bench_write_no_rotation,
    bench_write_with_rotation,
    bench_namer_parse,
    bench_rotate,
);
criterion_main!(benches);
