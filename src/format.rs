use crate::i18n::Locale;
use chrono::{DateTime, Local, Utc};
use std::fmt::Display;

// The backend reports this for peers it has a live session with.
pub const ZERO_TIMESTAMP: &str = "0001-01-01T00:00:00Z";

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Formats a raw byte count for display. Anything that does not parse as a
/// non-negative integer, and zero itself, renders as "-".
pub fn format_bytes(raw: impl Display) -> String {
    match raw.to_string().trim().parse::<u64>() {
        Ok(n) => format_byte_count(n),
        Err(_) => "-".to_string(),
    }
}

fn format_byte_count(n: u64) -> String {
    if n == 0 {
        return "-".to_string();
    }
    // floor(log1024(n)), computed on integers
    let mut i = 0;
    let mut scale: u64 = 1;
    while i < UNITS.len() - 1 && n / scale >= 1024 {
        scale *= 1024;
        i += 1;
    }
    format!("{:.2} {}", n as f64 / scale as f64, UNITS[i])
}

/// Relative "last seen" text for `timestamp` as observed at `now`.
pub fn format_last_seen(timestamp: Option<&str>, now: DateTime<Utc>, locale: &Locale) -> String {
    let timestamp = match timestamp {
        Some(ts) if !ts.is_empty() => ts,
        _ => return locale.tr("N/A"),
    };
    if timestamp == ZERO_TIMESTAMP {
        return locale.tr("Online");
    }
    let Ok(t) = DateTime::parse_from_rfc3339(timestamp) else {
        return locale.tr("N/A");
    };
    let t = t.with_timezone(&Utc);

    let diff = (now - t).num_milliseconds() as f64 / 1000.0;
    if diff < 0.0 {
        // clock skew between us and the coordination server
        return t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string();
    }
    if diff < 60.0 {
        return locale.tr("Just now");
    }
    let mins = diff / 60.0;
    let hrs = mins / 60.0;
    let days = hrs / 24.0;
    if mins < 60.0 {
        return format!("{} {}", mins.floor(), locale.tr("minutes ago"));
    }
    if hrs < 24.0 {
        return format!("{} {}", hrs.floor(), locale.tr("hours ago"));
    }
    if days < 30.0 {
        return format!("{} {}", days.floor(), locale.tr("days ago"));
    }
    t.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn ago(d: Duration) -> String {
        (now() - d).to_rfc3339()
    }

    #[test]
    fn bytes_zero_and_garbage_render_as_dash() {
        assert_eq!(format_bytes("0"), "-");
        assert_eq!(format_bytes("abc"), "-");
        assert_eq!(format_bytes(""), "-");
        assert_eq!(format_bytes("-12"), "-");
    }

    #[test]
    fn bytes_pick_largest_unit() {
        assert_eq!(format_bytes("1023"), "1023.00 B");
        assert_eq!(format_bytes("1024"), "1.00 KB");
        assert_eq!(format_bytes("1536"), "1.50 KB");
        assert_eq!(format_bytes(1024 * 1024 * 5u64), "5.00 MB");
        assert_eq!(format_bytes(3 * 1024u64.pow(3) / 2), "1.50 GB");
        assert_eq!(format_bytes(2 * 1024u64.pow(4)), "2.00 TB");
    }

    #[test]
    fn bytes_beyond_terabytes_stay_in_terabytes() {
        assert_eq!(format_bytes(2048 * 1024u64.pow(4)), "2048.00 TB");
    }

    #[test]
    fn bytes_accept_quoted_large_values() {
        assert_eq!(format_bytes("123456789012"), "114.98 GB");
    }

    #[test]
    fn last_seen_sentinel_and_missing() {
        let l = Locale::default();
        assert_eq!(format_last_seen(Some(ZERO_TIMESTAMP), now(), &l), "Online");
        assert_eq!(format_last_seen(None, now(), &l), "N/A");
        assert_eq!(format_last_seen(Some(""), now(), &l), "N/A");
        assert_eq!(format_last_seen(Some("yesterday"), now(), &l), "N/A");
    }

    #[test]
    fn last_seen_relative_buckets() {
        let l = Locale::default();
        let at = |d| format_last_seen(Some(&ago(d)), now(), &l);
        assert_eq!(at(Duration::seconds(30)), "Just now");
        assert_eq!(at(Duration::seconds(60)), "1 minutes ago");
        assert_eq!(at(Duration::minutes(59)), "59 minutes ago");
        assert_eq!(at(Duration::minutes(90)), "1 hours ago");
        assert_eq!(at(Duration::hours(23)), "23 hours ago");
        assert_eq!(at(Duration::hours(47)), "1 days ago");
        assert_eq!(at(Duration::days(29)), "29 days ago");
        assert_eq!(at(Duration::days(40)), "2024-05-06");
    }

    #[test]
    fn last_seen_in_the_future_is_absolute() {
        let l = Locale::default();
        let ahead = (now() + Duration::hours(2)).to_rfc3339();
        let s = format_last_seen(Some(&ahead), now(), &l);
        assert!(!s.contains("ago"));
        assert_eq!(s.len(), "2024-06-15 14:00:00".len());
    }

    #[test]
    fn last_seen_uses_locale() {
        let l = Locale::new(
            [("minutes ago".to_string(), "minutes passées".to_string())]
                .into_iter()
                .collect(),
        );
        let s = format_last_seen(Some(&ago(Duration::minutes(5))), now(), &l);
        assert_eq!(s, "5 minutes passées");
    }
}
