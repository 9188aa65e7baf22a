//! Human-readable byte sizes ("4MB", "512K").

use thiserror::Error;

const KB: usize = 1024;
const MB: usize = 1024 * KB;
const GB: usize = 1024 * MB;

/// Suffixes in match order; longer forms first.
const UNITS: [(&str, usize); 6] = [
    ("GB", GB),
    ("MB", MB),
    ("KB", KB),
    ("G", GB),
    ("M", MB),
    ("K", KB),
];

/// A size string that could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid size '{input}' - expected format like '4MB', '512KB' or '1048576'")]
pub struct SizeParseError {
    input: String,
}

/// Parse a size into bytes.
///
/// Accepts a bare byte count or a whole number followed by `K`, `M` or `G`
/// (optionally with a trailing `B`), case-insensitive, with optional
/// whitespace before the unit. Units are powers of 1024.
///
/// ```
/// use tilecache::config::parse_size;
///
/// assert_eq!(parse_size("4MB").unwrap(), 4 * 1024 * 1024);
/// assert_eq!(parse_size("512 k").unwrap(), 512 * 1024);
/// assert_eq!(parse_size("100").unwrap(), 100);
/// ```
pub fn parse_size(s: &str) -> Result<usize, SizeParseError> {
    let invalid = || SizeParseError {
        input: s.to_string(),
    };

    let trimmed = s.trim();
    let upper = trimmed.to_ascii_uppercase();
    let (number, multiplier) = UNITS
        .iter()
        .find_map(|(suffix, mult)| upper.strip_suffix(suffix).map(|n| (n, *mult)))
        .unwrap_or((upper.as_str(), 1));

    let number = number.trim_end();
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    number
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(invalid)
}

/// Format a byte count using the largest unit that divides it evenly.
pub fn format_size(bytes: usize) -> String {
    match bytes {
        0 => "0".to_string(),
        b if b % GB == 0 => format!("{}GB", b / GB),
        b if b % MB == 0 => format!("{}MB", b / MB),
        b if b % KB == 0 => format!("{}KB", b / KB),
        b => b.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_bytes() {
        assert_eq!(parse_size("0").unwrap(), 0);
        assert_eq!(parse_size("4096").unwrap(), 4096);
        assert_eq!(parse_size(" 12 ").unwrap(), 12);
    }

    #[test]
    fn test_units() {
        assert_eq!(parse_size("1K").unwrap(), KB);
        assert_eq!(parse_size("1kb").unwrap(), KB);
        assert_eq!(parse_size("4MB").unwrap(), 4 * MB);
        assert_eq!(parse_size("4 mb").unwrap(), 4 * MB);
        assert_eq!(parse_size("2G").unwrap(), 2 * GB);
    }

    #[test]
    fn test_invalid() {
        for input in ["", "MB", "abc", "-1MB", "1.5MB", "3TB", "4 M B"] {
            assert!(parse_size(input).is_err(), "{:?} should not parse", input);
        }
    }

    #[test]
    fn test_overflow_is_an_error() {
        let huge = format!("{}GB", usize::MAX);
        assert!(parse_size(&huge).is_err());
    }

    #[test]
    fn test_error_message_keeps_input() {
        let err = parse_size("lots").unwrap_err();
        assert!(err.to_string().contains("'lots'"));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0");
        assert_eq!(format_size(1000), "1000");
        assert_eq!(format_size(2 * KB), "2KB");
        assert_eq!(format_size(4 * MB), "4MB");
        assert_eq!(format_size(3 * GB), "3GB");
    }
}
