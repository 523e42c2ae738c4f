use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::collections::{BTreeSet, HashMap};

use crate::models::order::Order;

/// Today's headline numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TodayMetrics {
    pub revenue: f64,
    pub orders: usize,
    pub active_tables: usize,
    pub average_order_value: f64,
}

impl TodayMetrics {
    pub fn from_orders(orders: &[Order]) -> Self {
        let revenue: f64 = orders.iter().map(Order::total).sum();
        let active_tables = orders
            .iter()
            .filter_map(|o| o.table_number.as_deref())
            .filter(|t| !t.is_empty())
            .collect::<BTreeSet<_>>()
            .len();
        let average_order_value = if orders.is_empty() {
            0.0
        } else {
            revenue / orders.len() as f64
        };
        TodayMetrics {
            revenue,
            orders: orders.len(),
            active_tables,
            average_order_value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopularItem {
    pub name: String,
    pub sold: u32,
}

/// Item names ranked by quantity sold, ties broken by name.
pub fn popular_items(orders: &[Order], limit: usize) -> Vec<PopularItem> {
    let mut sold: HashMap<&str, u32> = HashMap::new();
    for item in orders.iter().flat_map(|o| o.items()) {
        if item.name().is_empty() {
            continue;
        }
        *sold.entry(item.name()).or_default() += item.quantity();
    }
    let mut ranked: Vec<PopularItem> = sold
        .into_iter()
        .map(|(name, sold)| PopularItem { name: name.to_string(), sold })
        .collect();
    ranked.sort_by(|a, b| b.sold.cmp(&a.sold).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(limit);
    ranked
}

/// Midnight at the start of `date` in `tz`, as a UTC instant.
pub fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(chrono::NaiveTime::MIN);
    match tz.from_local_datetime(&midnight).earliest() {
        Some(local) => local.with_timezone(&Utc),
        // Midnight skipped by a DST change.
        None => Utc.from_utc_datetime(&midnight),
    }
}
