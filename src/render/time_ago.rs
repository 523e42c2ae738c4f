use chrono::{DateTime, Local, TimeZone, Utc};

/// Relative label for an order's age, as shown on cards and the dashboard.
pub fn time_ago(instant: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    time_ago_in(&Local, instant, now)
}

/// [`time_ago`] with the calendar-date fallback rendered in `tz`.
pub fn time_ago_in<Tz: TimeZone>(
    tz: &Tz,
    instant: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let Some(instant) = instant else {
        return "Unknown".to_string();
    };

    // Instants ahead of `now` (clock skew) land here too.
    let minutes = (now - instant).num_minutes();
    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return format!("{minutes} min ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    instant.with_timezone(tz).format("%-m/%-d/%Y").to_string()
}
