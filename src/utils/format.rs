use chrono::{Duration, NaiveTime};

use crate::error::{Result, VakitError};

/// Parse an `HH:MM` time. Trailing text such as a timezone tag
/// (`"05:12 (+03)"`) is ignored.
pub fn parse_time(s: &str) -> Result<NaiveTime> {
    let head = s.trim().get(..5).unwrap_or(s.trim());
    NaiveTime::parse_from_str(head, "%H:%M").map_err(|_| VakitError::InvalidTime(s.to_string()))
}

/// Format a NaiveTime to "HH:MM"
pub fn format_time(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

/// Format a duration as zero-padded "HH:MM:SS"; negative durations clamp to zero.
pub fn format_hms(d: Duration) -> String {
    let secs = d.num_seconds().max(0);
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Create a simple ASCII progress bar
pub fn progress_bar(filled: u32, total: u32, width: usize) -> String {
    if total == 0 {
        return "░".repeat(width);
    }
    let ratio = (filled as f64 / total as f64).min(1.0);
    let filled_count = (ratio * width as f64).round() as usize;
    let empty_count = width.saturating_sub(filled_count);
    format!("{}{}", "█".repeat(filled_count), "░".repeat(empty_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_time_ignores_timezone_suffix() {
        let t = parse_time("05:12 (+03)").unwrap();
        assert_eq!(format_time(t), "05:12");
        assert!(parse_time("5am").is_err());
    }

    #[test]
    fn hms_is_zero_padded() {
        assert_eq!(format_hms(Duration::seconds(3 * 3600 + 5 * 60 + 9)), "03:05:09");
        assert_eq!(format_hms(Duration::seconds(-4)), "00:00:00");
    }

    #[test]
    fn progress_bar_caps_at_full() {
        assert_eq!(progress_bar(9, 7, 7), "███████");
        assert_eq!(progress_bar(0, 0, 3), "░░░");
    }
}
