//! Utility functions for common operations

use chrono::{DateTime, Utc};

const LABEL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Minutes in a 31-day month, used to extrapolate per-minute rates
pub const MINUTES_PER_MONTH: f64 = 60.0 * 24.0 * 31.0;

/// `"2024-03-03 12:00 - 2024-03-10 12:00"`
pub fn timespan_label(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!(
        "{} - {}",
        start.format(LABEL_TIME_FORMAT),
        end.format(LABEL_TIME_FORMAT)
    )
}

/// Object key for a resource's artifact: `{prefix}{YYYY-MM-DD}{stack}.{extension}`
pub fn artifact_key(prefix: &str, observed_at: DateTime<Utc>, stack_name: &str, extension: &str) -> String {
    format!(
        "{}{}{}.{}",
        prefix,
        observed_at.format("%Y-%m-%d"),
        stack_name,
        extension
    )
}

/// One decimal place, or `n/a` for an undefined value
pub fn format_optional(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}", v),
        None => "n/a".to_string(),
    }
}

/// Per-minute rate extrapolated over a 31-day month
pub fn monthly_total(per_minute: f64) -> f64 {
    per_minute * MINUTES_PER_MONTH
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_timespan() {
        let start = Utc.with_ymd_and_hms(2024, 3, 3, 9, 5, 59).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 10, 9, 5, 59).unwrap();
        assert_eq!(timespan_label(start, end), "2024-03-03 09:05 - 2024-03-10 09:05");
    }

    #[test]
    fn builds_artifact_key() {
        let at = Utc.with_ymd_and_hms(2024, 3, 10, 23, 0, 0).unwrap();
        assert_eq!(
            artifact_key("graphs/", at, "a.b.c.web", "png"),
            "graphs/2024-03-10a.b.c.web.png"
        );
    }

    #[test]
    fn optional_values() {
        assert_eq!(format_optional(Some(49.46)), "49.5");
        assert_eq!(format_optional(None), "n/a");
        assert_eq!(monthly_total(1.0), 44_640.0);
    }
}
