use chrono::{DateTime, Utc};

/// Formats the elapsed time since `timestamp` as a coarse label: the
/// largest non-zero unit of days, hours, minutes, or seconds, pluralized.
/// Days are the top unit; a year-old lead still reports in days. A
/// timestamp in the future clamps to "just now" instead of miscomputing.
pub fn time_ago_at(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(timestamp);
    let seconds = elapsed.num_seconds();
    if seconds < 0 {
        return "just now".to_string();
    }

    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        return pluralize(days, "day");
    }
    if hours > 0 {
        return pluralize(hours, "hour");
    }
    if minutes > 0 {
        return pluralize(minutes, "minute");
    }
    pluralize(seconds, "second")
}

/// Convenience form against the current instant. "now" moves forward, so
/// the label must be recomputed on every render tick.
pub fn time_ago(timestamp: DateTime<Utc>) -> String {
    time_ago_at(timestamp, Utc::now())
}

fn pluralize(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}
