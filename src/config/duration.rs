//! Human-readable durations used in stackup.yaml ("120s", "2s", "500ms", "1m").

use std::time::Duration;

/// Parse a duration string.
///
/// A bare number is taken as seconds. Returns `None` for anything else.
///
/// ```
/// use stackup::config::parse_duration_string;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration_string("120s"), Some(Duration::from_secs(120)));
/// assert_eq!(parse_duration_string("500ms"), Some(Duration::from_millis(500)));
/// assert_eq!(parse_duration_string("2m"), Some(Duration::from_secs(120)));
/// assert_eq!(parse_duration_string("15"), Some(Duration::from_secs(15)));
/// ```
pub fn parse_duration_string(s: &str) -> Option<Duration> {
    let s = s.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    if digits.is_empty() {
        return None;
    }
    let value: u64 = digits.parse().ok()?;

    match unit {
        "ms" => Some(Duration::from_millis(value)),
        "" | "s" => Some(Duration::from_secs(value)),
        "m" => value.checked_mul(60).map(Duration::from_secs),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units() {
        assert_eq!(parse_duration_string("2s"), Some(Duration::from_secs(2)));
        assert_eq!(parse_duration_string("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_duration_string("3m"), Some(Duration::from_secs(180)));
        assert_eq!(parse_duration_string(" 45 "), Some(Duration::from_secs(45)));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_duration_string(""), None);
        assert_eq!(parse_duration_string("s"), None);
        assert_eq!(parse_duration_string("10h"), None);
        assert_eq!(parse_duration_string("-1s"), None);
        assert_eq!(parse_duration_string("1.5s"), None);
    }
}
