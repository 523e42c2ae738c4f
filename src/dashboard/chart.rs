use chrono::{Datelike, NaiveDate, TimeZone, Weekday};
use serde::Serialize;
use std::str::FromStr;

use crate::models::order::Order;

/// Window shown by the sales chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartPeriod {
    #[default]
    Week,
    Month,
    Quarter,
}

impl ChartPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            ChartPeriod::Week => "7",
            ChartPeriod::Month => "30",
            ChartPeriod::Quarter => "90",
        }
    }

    /// Days covered, ending today.
    pub fn span_days(self) -> i64 {
        match self {
            ChartPeriod::Week => 7,
            ChartPeriod::Month => 28,
            ChartPeriod::Quarter => 90,
        }
    }

    fn bucket_days(self) -> i64 {
        match self {
            ChartPeriod::Week => 1,
            ChartPeriod::Month => 7,
            ChartPeriod::Quarter => 30,
        }
    }

    /// First calendar day inside the window.
    pub fn first_day(self, today: NaiveDate) -> NaiveDate {
        today - chrono::Duration::days(self.span_days() - 1)
    }

    /// Lenient parse of the `period` query value; anything unknown is a week.
    pub fn from_query(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for ChartPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "7" => Ok(ChartPeriod::Week),
            "30" => Ok(ChartPeriod::Month),
            "90" => Ok(ChartPeriod::Quarter),
            other => Err(format!("unknown chart period '{other}'")),
        }
    }
}

/// Chart.js-ready labels and revenue per bucket, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesSeries {
    pub period: &'static str,
    pub labels: Vec<String>,
    pub data: Vec<f64>,
}

fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Sum order totals into the period's buckets, by local calendar day in `tz`.
/// Orders without a timestamp or outside the window are ignored.
pub fn sales_series<Tz: TimeZone>(
    period: ChartPeriod,
    orders: &[Order],
    today: NaiveDate,
    tz: &Tz,
) -> SalesSeries {
    let span = period.span_days();
    let bucket = period.bucket_days();
    let buckets = (span / bucket) as usize;
    let first = period.first_day(today);

    let labels = (0..buckets)
        .map(|i| match period {
            ChartPeriod::Week => {
                weekday_label((first + chrono::Duration::days(i as i64)).weekday()).to_string()
            }
            ChartPeriod::Month => format!("Week {}", i + 1),
            ChartPeriod::Quarter => format!("Month {}", i + 1),
        })
        .collect();

    let mut data = vec![0.0; buckets];
    for order in orders {
        let Some(ts) = order.timestamp else { continue };
        let day = ts.with_timezone(tz).date_naive();
        let offset = (day - first).num_days();
        if (0..span).contains(&offset) {
            data[(offset / bucket) as usize] += order.total();
        }
    }

    SalesSeries { period: period.as_str(), labels, data }
}
