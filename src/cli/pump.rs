//! Copies lines from a reader into a rotating writer.

use crate::internal;
use crate::writer::RotatingWriter;
use std::io::{self, BufRead};

/// Totals for one pump run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PumpStats {
    pub lines: u64,
    pub bytes: u64,
    /// Lines whose write returned an error (logged, then skipped).
    pub failed: u64,
}

/// Writes every line of `reader` to `writer` with a single trailing `\n`
/// (a `\r\n` ending is normalized). Write failures are logged and counted but
/// never stop the loop; only a read failure ends it early.
///
/// # Errors
/// Reading from `reader` failed.
pub fn pump<R: BufRead>(mut reader: R, writer: &RotatingWriter) -> io::Result<PumpStats> {
    let mut stats = PumpStats::default();
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        if line.last() == Some(&b'\n') {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }
        line.push(b'\n');
        stats.lines += 1;

        match writer.write(&line) {
            Ok(n) => stats.bytes += n as u64,
            Err(e) => {
                stats.bytes += e.written() as u64;
                stats.failed += 1;
                internal::error("CLI", &e.to_string());
            }
        }
    }

    internal::debug(
        "CLI",
        &format!(
            "Input closed after {} line(s), {} failed",
            stats.lines, stats.failed
        ),
    );
    Ok(stats)
}
