//! Shared test infrastructure for the sync and handler tests.
//!
//! Everything runs against the in-memory order store, which delivers
//! snapshots the same way the Postgres store does and records every
//! mutation it receives.

#![allow(dead_code)]

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use orderdesk::models::order::{Order, OrderItem, OrderStatus};
use orderdesk::store::{MemoryOrderStore, OrderStore};
use orderdesk::sync::OrderSyncController;

// ============================================================================
// TEST CONSTANTS
// ============================================================================

pub const ADMIN_EMAIL: &str = "admin@orderdesk.test";
pub const ADMIN_PASS: &str = "admin123";

/// Upper bound on any single wait for a snapshot or a channel update.
pub const WAIT: Duration = Duration::from_secs(2);

// ============================================================================
// ORDER BUILDERS
// ============================================================================

pub fn order(
    id: &str,
    number: &str,
    table: &str,
    status: Option<OrderStatus>,
    items: Vec<OrderItem>,
    created: DateTime<Utc>,
) -> Order {
    let total = items.iter().map(|i| i.quantity() as f64 * i.price()).sum();
    Order {
        id: id.to_string(),
        order_number: Some(number.to_string()),
        table_number: Some(table.to_string()),
        status,
        items: Some(items),
        total: Some(total),
        timestamp: Some(created),
        updated_at: None,
    }
}

/// Six orders, newest first by id: two ready, one with no status, and two
/// mentioning naan (once in lower case).
pub fn sample_orders(now: DateTime<Utc>) -> Vec<Order> {
    let ago = |m: i64| now - ChronoDuration::minutes(m);
    vec![
        order("o1", "1001", "4", Some(OrderStatus::Pending), vec![
            OrderItem::new("Butter Chicken", 2, 320.0),
            OrderItem::new("Garlic Naan", 4, 60.0),
        ], ago(1)),
        order("o2", "1002", "7", Some(OrderStatus::Preparing), vec![
            OrderItem::new("Paneer Tikka", 1, 280.0),
        ], ago(5)),
        order("o3", "1003", "2", Some(OrderStatus::Ready), vec![
            OrderItem::new("Chicken Biryani", 2, 350.0),
        ], ago(10)),
        order("o4", "1004", "12", Some(OrderStatus::Ready), vec![
            OrderItem::new("Dal Makhani", 1, 240.0),
        ], ago(20)),
        order("o5", "1005", "5", None, vec![
            OrderItem::new("butter naan", 3, 50.0),
        ], ago(30)),
        order("o6", "0998", "9", Some(OrderStatus::Completed), vec![
            OrderItem::new("Masala Chai", 2, 40.0),
        ], ago(90)),
    ]
}

// ============================================================================
// STORE AND CONTROLLER SETUP
// ============================================================================

pub fn sample_store() -> Arc<MemoryOrderStore> {
    Arc::new(MemoryOrderStore::with_orders(sample_orders(Utc::now())))
}

pub fn as_dyn(store: &Arc<MemoryOrderStore>) -> Arc<dyn OrderStore> {
    Arc::clone(store) as Arc<dyn OrderStore>
}

/// Handle exactly one store event, failing the test if none arrives in time.
pub async fn pump(controller: &mut OrderSyncController) {
    let event = within(controller.next_event())
        .await
        .expect("Subscription ended unexpectedly");
    controller.handle_event(event);
}

/// A controller that has started and applied the initial snapshot.
pub async fn started_controller(store: &Arc<MemoryOrderStore>) -> OrderSyncController {
    let mut controller = OrderSyncController::new(as_dyn(store));
    assert!(controller.start());
    pump(&mut controller).await;
    controller
}

pub async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(WAIT, fut)
        .await
        .expect("Timed out waiting for the order desk")
}

pub fn ids(orders: &[&Order]) -> Vec<String> {
    orders.iter().map(|o| o.id.clone()).collect()
}
