//! Command-line surface of `lumberjack-logger`: flag parsing and the stdin pump.

mod pump;

pub use pump::{PumpStats, pump};

use crate::cleanup::parse_size;
use crate::config::{Config, RotationConfig};
use crate::writer::WriterBuilder;
use clap::Parser;
use std::path::PathBuf;

const MIB: u64 = 1024 * 1024;

const LONG_ABOUT: &str = "\
Log to rolling files from stdin.

Every line read from stdin is appended to <FILENAME>. When the file would grow
past --maxsize it is renamed to <name>-<timestamp>.<ext> and a new file is
started. Old backups are removed by --maxbackups and --maxage, and gzipped
with --compress.

* Directories in the path given for <FILENAME> are created if necessary.
* Anything in that directory whose name looks like a backup of <FILENAME>
  is treated as one, and may be compressed or deleted.
* Anything already at <FILENAME> that cannot be appended to, such as a
  directory, is moved aside under a backup name like a full log file.
* If a write fails, an error is printed to stderr and reading continues.

Flags override values from the config file (--config, or the platform
config directory's lumberjack/config.toml when present).";

/// lumberjack-logger - log to rolling files from stdin.
#[derive(Debug, Parser)]
#[command(name = "lumberjack-logger", version, about = "Log to rolling files from stdin.", long_about = LONG_ABOUT)]
pub struct Cli {
    /// Active log file; backups are written next to it
    pub filename: PathBuf,

    /// Max size of the log file before it gets rotated, in MB, or with a unit
    /// such as 512K (0 = 100 MB)
    #[arg(short = 's', long = "maxsize", value_name = "MB", value_parser = parse_max_size)]
    pub max_size: Option<u64>,

    /// Max number of days to retain old log files (0 = keep all)
    #[arg(short = 'a', long = "maxage", value_name = "DAYS")]
    pub max_age: Option<u32>,

    /// Max number of old log files to retain (0 = keep all)
    #[arg(short = 'b', long = "maxbackups", value_name = "N")]
    pub max_backups: Option<usize>,

    /// Use local time in backup names instead of UTC
    #[arg(short = 'l', long = "localtime")]
    pub local_time: bool,

    /// Gzip rotated log files
    #[arg(short = 'c', long)]
    pub compress: bool,

    /// Config file to read defaults from
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print debug diagnostics on stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Cli {
    /// Config file values with any flags given on the command line applied on top.
    #[must_use]
    pub fn rotation_config(&self, base: RotationConfig) -> RotationConfig {
        let mut config = base;
        if let Some(days) = self.max_age {
            config.max_age_days = days;
        }
        if let Some(n) = self.max_backups {
            config.max_backups = n;
        }
        config.local_time |= self.local_time;
        config.compress |= self.compress;
        config
    }

    /// Writer builder for the parsed flags on top of `config`.
    pub fn builder(&self, config: &Config) -> WriterBuilder {
        let builder = WriterBuilder::new()
            .path(&self.filename)
            .config(self.rotation_config(config.rotation));
        match self.max_size {
            Some(bytes) => builder.max_size_bytes(bytes),
            None => builder,
        }
    }
}

/// Plain numbers are megabytes; anything with a unit goes through [`parse_size`].
///
/// # Errors
/// The value is neither a number nor a size such as `512K`.
pub fn parse_max_size(s: &str) -> Result<u64, String> {
    if let Ok(mb) = s.trim().parse::<u64>() {
        return mb
            .checked_mul(MIB)
            .ok_or_else(|| format!("{s} MB is too large"));
    }
    parse_size(s).ok_or_else(|| format!("invalid size '{s}' (use MB, or e.g. 512K, 2M, 1G)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maxsize_plain_number_is_megabytes() {
        assert_eq!(parse_max_size("1"), Ok(MIB));
        assert_eq!(parse_max_size("0"), Ok(0));
        assert_eq!(parse_max_size("512K"), Ok(512 * 1024));
        assert!(parse_max_size("lots").is_err());
    }

    #[test]
    fn short_flags_match_long_ones() {
        let cli = Cli::try_parse_from([
            "lumberjack-logger",
            "-s",
            "1",
            "-a",
            "7",
            "-b",
            "3",
            "-l",
            "-c",
            "out.log",
        ])
        .unwrap();
        assert_eq!(cli.max_size, Some(MIB));
        assert_eq!(cli.max_age, Some(7));
        assert_eq!(cli.max_backups, Some(3));
        assert!(cli.local_time);
        assert!(cli.compress);
        assert_eq!(cli.filename, PathBuf::from("out.log"));
    }

    #[test]
    fn flags_override_config_values() {
        let cli = Cli::try_parse_from(["lumberjack-logger", "--maxbackups", "2", "x.log"]).unwrap();
        let base = RotationConfig {
            max_backups: 10,
            max_age_days: 30,
            compress: true,
            ..RotationConfig::default()
        };
        let merged = cli.rotation_config(base);
        assert_eq!(merged.max_backups, 2);
        assert_eq!(merged.max_age_days, 30);
        assert!(merged.compress);
    }

    #[test]
    fn filename_is_required() {
        assert!(Cli::try_parse_from(["lumberjack-logger"]).is_err());
    }
}
