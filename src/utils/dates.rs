//! Date and time utilities

use chrono::{DateTime, Local, TimeZone, Utc};

/// Local midnight for the day containing `timestamp`.
///
/// This is the calendar-day boundary used for same-day duplicate-vote
/// detection. It takes the reference time explicitly instead of reading the
/// clock so callers stay deterministic.
pub fn start_of_day_for(timestamp: i64) -> i64 {
    let Some(dt) = Local.timestamp_opt(timestamp, 0).single() else {
        return timestamp;
    };

    dt.date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| Local.from_local_datetime(&midnight).earliest())
        .map(|midnight| midnight.timestamp())
        .unwrap_or(timestamp)
}

/// Format a timestamp as "YYYY-MM-DD HH:MM:SS"
pub fn format_datetime(timestamp: i64) -> String {
    let dt = DateTime::from_timestamp(timestamp, 0).unwrap_or_else(Utc::now);
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Convert a timestamp to relative time text (e.g., "in 23 hours").
///
/// Used for rate-limit countdown messages, so it is relative to the real
/// clock rather than an explicit reference time.
pub fn timestamp_to_relative(timestamp: i64) -> String {
    let dt = DateTime::from_timestamp(timestamp, 0).unwrap_or_else(Utc::now);
    chrono_humanize::HumanTime::from(dt).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_of_day_is_midnight() {
        // 2024-06-15 13:45:12 UTC; whatever the local zone, the result must
        // be a midnight at most 24h before the input
        let ts = 1_718_459_112;
        let midnight = start_of_day_for(ts);

        assert!(midnight <= ts);
        assert!(ts - midnight < 86_400);
        assert_eq!(midnight % 60, 0);
    }

    #[test]
    fn test_start_of_day_idempotent() {
        let ts = 1_718_459_112;
        let midnight = start_of_day_for(ts);
        assert_eq!(start_of_day_for(midnight), midnight);
    }

    #[test]
    fn test_same_day_shares_boundary() {
        let morning = 1_718_420_000;
        let later = morning + 3600;
        assert_eq!(start_of_day_for(morning), start_of_day_for(later));
    }

    #[test]
    fn test_format_datetime() {
        assert_eq!(format_datetime(0), "1970-01-01 00:00:00");
    }
}
