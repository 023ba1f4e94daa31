//! `lumberjack-logger [flags] <filename>`: copies stdin into a rotating log file.
//!
//! Meant to sit at the end of a pipe:
//!   some-daemon 2>&1 | lumberjack-logger -s 10 -b 5 -c /var/log/daemon.log

use clap::Parser;
use lumberjack::cli::{Cli, pump};
use lumberjack::config::Config;
use lumberjack::{Level, internal};
use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Config supplies defaults for every flag, so it must load before the writer exists
    let config = match cli.config.as_deref() {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match config {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            return ExitCode::FAILURE;
        }
    };

    internal::init(if cli.verbose {
        Level::Debug
    } else {
        config.parse_level()
    });

    let writer = match cli.builder(&config).build() {
        Ok(w) => w,
        Err(e) => {
            internal::error("CLI", &e.to_string());
            return ExitCode::FAILURE;
        }
    };
    internal::debug("CLI", &format!("Writing to {}", writer.path().display()));

    let outcome = pump(io::stdin().lock(), &writer);

    // Finish the last write's housekeeping before the process goes away
    if let Err(e) = writer.close() {
        internal::error("CLI", &e.to_string());
    }
    writer.wait_for_maintenance();

    match outcome {
        Ok(stats) => {
            if stats.failed > 0 {
                internal::info(
                    "CLI",
                    &format!("{} of {} line(s) could not be written", stats.failed, stats.lines),
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            internal::error("CLI", &format!("Reading stdin: {e}"));
            ExitCode::FAILURE
        }
    }
}
