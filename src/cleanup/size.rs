//! Byte-size notation for the CLI and for diagnostics.

const KIB: u64 = 1024;
const MIB: u64 = KIB * 1024;
const GIB: u64 = MIB * 1024;

/// Parses `"512K"`, `"2M"`, `"1.5G"`, `"300B"` or a bare byte count.
/// Suffixes are case-insensitive and may carry a trailing `B` (`"2MB"`).
#[must_use]
pub fn parse_size(s: &str) -> Option<u64> {
    let s = s.trim().to_uppercase();
    let unit_start = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (num_str, unit) = s.split_at(unit_start);

    let multiplier = match unit.trim() {
        "" | "B" => 1,
        "K" | "KB" | "KIB" => KIB,
        "M" | "MB" | "MIB" => MIB,
        "G" | "GB" | "GIB" => GIB,
        _ => return None,
    };

    if let Ok(whole) = num_str.parse::<u64>() {
        return whole.checked_mul(multiplier);
    }

    let n = num_str.parse::<f64>().ok()?;
    if !n.is_finite() || n < 0.0 {
        return None;
    }
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let bytes = (n * multiplier as f64) as u64;
    Some(bytes)
}

/// Raw byte counts are unreadable in diagnostics.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let bytes_f = bytes as f64;

    if bytes >= GIB {
        format!("{:.2} GB", bytes_f / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.2} MB", bytes_f / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.2} KB", bytes_f / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_units() {
        assert_eq!(parse_size("100"), Some(100));
        assert_eq!(parse_size("300B"), Some(300));
        assert_eq!(parse_size("1K"), Some(1024));
        assert_eq!(parse_size("1kb"), Some(1024));
        assert_eq!(parse_size("2M"), Some(2 * 1024 * 1024));
        assert_eq!(parse_size("1G"), Some(1024 * 1024 * 1024));
        assert_eq!(parse_size("1.5K"), Some(1536));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_size(""), None);
        assert_eq!(parse_size("M"), None);
        assert_eq!(parse_size("12X"), None);
        assert_eq!(parse_size("-1M"), None);
    }

    #[test]
    fn format_picks_largest_unit() {
        assert_eq!(format_size(100), "100 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1536 * 1024), "1.50 MB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.00 GB");
    }
}
