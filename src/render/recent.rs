use askama::Template;
use chrono::{DateTime, Utc};

use super::orders::format_amount;
use super::time_ago::time_ago;
use crate::models::order::Order;
use crate::templates_structs::RecentOrdersFragment;

/// State of the dashboard's "recent orders" subscription.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RecentOrders {
    #[default]
    Loading,
    Ready(Vec<Order>),
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecentRow {
    pub order_number: String,
    pub table_number: String,
    pub time_ago: String,
    pub total: String,
    pub status: &'static str,
}

/// Shown instead of rows while loading, on failure, or when there are no orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder {
    pub icon: &'static str,
    pub text: &'static str,
}

pub fn recent_rows(orders: &[Order], now: DateTime<Utc>) -> Vec<RecentRow> {
    orders
        .iter()
        .map(|o| RecentRow {
            order_number: o.order_number_display().to_string(),
            table_number: o.table_number_display().to_string(),
            time_ago: time_ago(o.timestamp, now),
            total: format_amount(o.total()),
            status: o.effective_status().as_str(),
        })
        .collect()
}

pub fn render_recent(state: &RecentOrders, now: DateTime<Utc>) -> Result<String, askama::Error> {
    let (rows, placeholder) = match state {
        RecentOrders::Loading => (
            Vec::new(),
            Some(Placeholder { icon: "loader-2", text: "Loading recent orders..." }),
        ),
        RecentOrders::Failed => (
            Vec::new(),
            Some(Placeholder { icon: "alert-circle", text: "Failed to load orders" }),
        ),
        RecentOrders::Ready(orders) if orders.is_empty() => (
            Vec::new(),
            Some(Placeholder { icon: "coffee", text: "No recent orders yet" }),
        ),
        RecentOrders::Ready(orders) => (recent_rows(orders, now), None),
    };
    RecentOrdersFragment { rows, placeholder, currency: super::CURRENCY }.render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::OrderStatus;

    #[test]
    fn placeholders_per_state() {
        let now = Utc::now();
        assert!(render_recent(&RecentOrders::Loading, now).unwrap().contains("Loading recent orders"));
        assert!(render_recent(&RecentOrders::Failed, now).unwrap().contains("Failed to load orders"));
        assert!(render_recent(&RecentOrders::Ready(vec![]), now).unwrap().contains("No recent orders yet"));
    }

    #[test]
    fn rows_use_placeholders_and_default_status() {
        let orders = vec![
            Order { id: "a".into(), order_number: Some("17".into()), ..Default::default() },
            Order { id: "b".into(), status: Some(OrderStatus::Ready), total: Some(99.0), ..Default::default() },
        ];
        let rows = recent_rows(&orders, Utc::now());
        assert_eq!(rows[0].order_number, "17");
        assert_eq!(rows[0].table_number, "N/A");
        assert_eq!(rows[0].status, "pending");
        assert_eq!(rows[1].total, "99");

        let html = render_recent(&RecentOrders::Ready(orders), Utc::now()).unwrap();
        assert!(html.contains("Order #17"));
    }
}
