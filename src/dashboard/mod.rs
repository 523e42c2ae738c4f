//! Dashboard summaries computed from one-shot store reads.

pub mod chart;
pub mod metrics;

use chrono::{DateTime, TimeZone, Timelike};

pub use chart::{ChartPeriod, SalesSeries, sales_series};
pub use metrics::{PopularItem, TodayMetrics, popular_items, start_of_day};

pub const POPULAR_ITEMS: usize = 5;
pub const RECENT_ORDERS: usize = 5;

pub fn time_greeting(hour: u32, email: &str) -> String {
    let period = match hour {
        5..=11 => "Good morning",
        12..=16 => "Good afternoon",
        _ => "Good evening",
    };
    format!("{period}, {email}")
}

/// `Monday, October 19, 2026`
pub fn date_line<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%A, %B %-d, %Y").to_string()
}

/// Greeting for the local hour of `now`.
pub fn greeting_at<Tz: TimeZone>(now: &DateTime<Tz>, email: &str) -> String {
    time_greeting(now.hour(), email)
}
