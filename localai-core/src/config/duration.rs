//! Duration parsing for the settle interval (e.g. `10s`, `1500ms`, `2m`)

use std::time::Duration;

/// Unit suffixes and their length in milliseconds, largest first
const UNITS: [(&str, u64); 5] = [
    ("d", 24 * 60 * 60 * 1000),
    ("h", 60 * 60 * 1000),
    ("m", 60 * 1000),
    ("s", 1000),
    ("ms", 1),
];

/// Parse a duration string; a bare number means seconds
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Empty duration string".to_string());
    }

    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, suffix) = s.split_at(split);
    let suffix = if suffix.is_empty() { "s" } else { suffix };

    let count: u64 = digits
        .parse()
        .map_err(|_| format!("Invalid number in duration: {}", s))?;
    let unit_millis = UNITS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(suffix))
        .map(|(_, millis)| *millis)
        .ok_or_else(|| format!("Unknown duration unit: {}", suffix))?;

    count
        .checked_mul(unit_millis)
        .map(Duration::from_millis)
        .ok_or_else(|| format!("Duration value too large: {}", s))
}

/// Format a duration using the largest unit that divides it evenly
pub fn format_duration(duration: &Duration) -> String {
    let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    if millis == 0 {
        return "0s".to_string();
    }

    UNITS
        .iter()
        .find(|(_, unit)| millis.is_multiple_of(*unit))
        .map(|(name, unit)| format!("{}{}", millis / unit, name))
        .unwrap_or_else(|| format!("{}ms", millis))
}
