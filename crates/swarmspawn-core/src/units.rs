//! Human-readable unit parsing for config values.
//!
//! Durations look like `"5s"`, `"500ms"`, `"2m"`; memory sizes use the
//! engine's binary suffixes (`"512m"`, `"1g"`).

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("invalid duration: {0:?}")]
    Duration(String),

    #[error("invalid memory size: {0:?}")]
    MemorySize(String),
}

/// Parse a duration string like "5s", "500ms", "1m". A bare number is seconds.
pub fn parse_duration(s: &str) -> Result<Duration, UnitError> {
    let t = s.trim();
    let parsed = if let Some(secs) = t.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = t.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        t.parse::<u64>().ok().map(Duration::from_secs)
    };
    parsed.ok_or_else(|| UnitError::Duration(s.to_string()))
}

/// Parse a memory size like "1g" or "512m" into bytes (1k = 1024).
pub fn parse_memory_size(s: &str) -> Result<u64, UnitError> {
    let lower = s.trim().to_ascii_lowercase();
    let t = lower.strip_suffix('b').unwrap_or(&lower);

    let (digits, shift) = match t.chars().last() {
        Some('k') => (&t[..t.len() - 1], 10),
        Some('m') => (&t[..t.len() - 1], 20),
        Some('g') => (&t[..t.len() - 1], 30),
        Some('t') => (&t[..t.len() - 1], 40),
        _ => (t, 0),
    };

    digits
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(1u64 << shift))
        .ok_or_else(|| UnitError::MemorySize(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds() {
        assert_eq!(parse_duration("5s"), Ok(Duration::from_secs(5)));
        assert_eq!(parse_duration(" 30s "), Ok(Duration::from_secs(30)));
    }

    #[test]
    fn parse_duration_milliseconds() {
        assert_eq!(parse_duration("500ms"), Ok(Duration::from_millis(500)));
    }

    #[test]
    fn parse_duration_minutes() {
        assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
    }

    #[test]
    fn parse_duration_plain_number_as_seconds() {
        assert_eq!(parse_duration("10"), Ok(Duration::from_secs(10)));
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn parse_duration_rejects_overflowing_minutes() {
        assert_eq!(
            parse_duration("999999999999999999m"),
            Err(UnitError::Duration("999999999999999999m".to_string()))
        );
        assert_eq!(
            parse_duration("307445734561825860m"),
            Ok(Duration::from_secs(307_445_734_561_825_860 * 60))
        );
    }

    #[test]
    fn memory_one_gig_is_binary() {
        assert_eq!(parse_memory_size("1g"), Ok(1_073_741_824));
        assert_eq!(parse_memory_size("1G"), Ok(1_073_741_824));
        assert_eq!(parse_memory_size("1gb"), Ok(1_073_741_824));
    }

    #[test]
    fn memory_other_suffixes() {
        assert_eq!(parse_memory_size("512m"), Ok(512 * 1024 * 1024));
        assert_eq!(parse_memory_size("64k"), Ok(64 * 1024));
        assert_eq!(parse_memory_size("4096"), Ok(4096));
    }

    #[test]
    fn memory_rejects_overflow_and_junk() {
        assert!(parse_memory_size("99999999999t").is_err());
        assert!(parse_memory_size("lots").is_err());
        assert!(parse_memory_size("g").is_err());
    }
}
