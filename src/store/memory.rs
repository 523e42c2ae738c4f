//! In-process order store.
//!
//! Behaves like the remote store from the dashboard's point of view: every
//! change is followed by a fresh snapshot to each subscriber. Used by the
//! `memory` backend for local demos and by the test-suite, which can also
//! inject failures and inspect the mutations that were attempted.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;

use super::{
    OrderQuery, OrderStore, SUBSCRIPTION_BUFFER, StatusUpdate, StoreError, StoreEvent,
    Subscription, sort_newest_first,
};
use crate::models::order::{NewOrder, Order, OrderItem, OrderStatus};

/// A mutation as it reached the store, recorded whether or not it succeeded.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    StatusUpdate { order_id: String, status: OrderStatus },
    Delete { order_id: String },
}

#[derive(Debug, Clone)]
enum Change {
    Updated,
    Failed(String),
}

#[derive(Default)]
struct State {
    orders: Vec<Order>,
    mutations: Vec<Mutation>,
    fail_next: Option<String>,
    fail_next_fetch: Option<String>,
    next_id: u64,
}

#[derive(Clone)]
pub struct MemoryOrderStore {
    state: Arc<Mutex<State>>,
    changes: broadcast::Sender<Change>,
}

impl Default for MemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            state: Arc::new(Mutex::new(State::default())),
            changes,
        }
    }

    pub fn with_orders(orders: Vec<Order>) -> Self {
        let store = Self::new();
        store.lock().orders = orders;
        store
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn notify(&self) {
        // No receivers just means nobody is subscribed yet.
        let _ = self.changes.send(Change::Updated);
    }

    fn snapshot(&self, query: OrderQuery) -> Vec<Order> {
        let mut orders = self.lock().orders.clone();
        sort_newest_first(&mut orders);
        if let Some(limit) = query.limit {
            orders.truncate(limit);
        }
        orders
    }

    /// Create an order and return its id.
    pub fn insert(&self, new: NewOrder) -> String {
        let id = {
            let mut state = self.lock();
            state.next_id += 1;
            let id = format!("ord-{:06}", state.next_id);
            state.orders.push(Order {
                id: id.clone(),
                total: Some(new.computed_total()),
                order_number: new.order_number,
                table_number: new.table_number,
                status: new.status,
                items: Some(new.items),
                timestamp: Some(new.timestamp.unwrap_or_else(Utc::now)),
                updated_at: None,
            });
            id
        };
        self.notify();
        id
    }

    /// Insert or replace an order document verbatim.
    pub fn put(&self, order: Order) {
        {
            let mut state = self.lock();
            match state.orders.iter_mut().find(|o| o.id == order.id) {
                Some(existing) => *existing = order,
                None => state.orders.push(order),
            }
        }
        self.notify();
    }

    pub fn orders(&self) -> Vec<Order> {
        self.snapshot(OrderQuery::all())
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        self.lock().mutations.clone()
    }

    /// Make the next status update or delete fail with `reason`.
    pub fn fail_next_mutation(&self, reason: &str) {
        self.lock().fail_next = Some(reason.to_string());
    }

    /// Make the next one-shot read fail with `reason`.
    pub fn fail_next_fetch(&self, reason: &str) {
        self.lock().fail_next_fetch = Some(reason.to_string());
    }

    /// Deliver a subscription error to every open subscription.
    pub fn emit_error(&self, reason: &str) {
        let _ = self.changes.send(Change::Failed(reason.to_string()));
    }

    pub fn subscriber_count(&self) -> usize {
        self.changes.receiver_count()
    }

    /// A handful of orders across every status, for the `memory` backend.
    pub fn with_demo_data(now: DateTime<Utc>) -> Self {
        let store = Self::new();
        let demo: [(&str, &str, Option<OrderStatus>, i64, Vec<OrderItem>); 6] = [
            ("1001", "4", Some(OrderStatus::Pending), 2, vec![
                OrderItem::new("Butter Chicken", 2, 320.0),
                OrderItem::new("Garlic Naan", 4, 60.0),
            ]),
            ("1002", "7", Some(OrderStatus::Preparing), 9, vec![
                OrderItem::new("Paneer Tikka", 1, 280.0),
                OrderItem::new("Dal Makhani", 1, 240.0),
            ]),
            ("1003", "2", Some(OrderStatus::Ready), 25, vec![
                OrderItem::new("Chicken Biryani", 2, 350.0),
            ]),
            ("1004", "12", Some(OrderStatus::Completed), 95, vec![
                OrderItem::new("Garlic Naan", 2, 60.0),
                OrderItem::new("Butter Chicken", 1, 320.0),
            ]),
            ("1005", "5", None, 0, vec![
                OrderItem::new("Masala Chai", 3, 40.0),
            ]),
            ("0998", "9", Some(OrderStatus::Completed), 60 * 26, vec![
                OrderItem::new("Dal Makhani", 2, 240.0),
            ]),
        ];
        for (number, table, status, minutes_ago, items) in demo {
            store.insert(NewOrder {
                order_number: Some(number.to_string()),
                table_number: Some(table.to_string()),
                status,
                items,
                timestamp: Some(now - Duration::minutes(minutes_ago)),
            });
        }
        store
    }

    fn record(&self, mutation: Mutation) -> Result<MutexGuard<'_, State>, StoreError> {
        let mut state = self.lock();
        state.mutations.push(mutation);
        match state.fail_next.take() {
            Some(reason) => Err(StoreError::Unavailable(reason)),
            None => Ok(state),
        }
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    fn subscribe(&self, query: OrderQuery) -> Subscription {
        let mut changes = self.changes.subscribe();
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let store = self.clone();

        let task = tokio::spawn(async move {
            if tx.send(StoreEvent::Snapshot(store.snapshot(query))).await.is_err() {
                return;
            }
            loop {
                let event = match changes.recv().await {
                    Ok(Change::Updated) | Err(RecvError::Lagged(_)) => {
                        StoreEvent::Snapshot(store.snapshot(query))
                    }
                    Ok(Change::Failed(reason)) => StoreEvent::Error(StoreError::Unavailable(reason)),
                    Err(RecvError::Closed) => return,
                };
                if tx.send(event).await.is_err() {
                    return;
                }
            }
        });

        Subscription::new(rx, task)
    }

    async fn fetch_since(&self, since: DateTime<Utc>) -> Result<Vec<Order>, StoreError> {
        if let Some(reason) = self.lock().fail_next_fetch.take() {
            return Err(StoreError::Unavailable(reason));
        }
        Ok(self
            .orders()
            .into_iter()
            .filter(|o| o.timestamp.is_some_and(|t| t >= since))
            .collect())
    }

    async fn update_status(&self, order_id: &str, update: StatusUpdate) -> Result<(), StoreError> {
        {
            let mut state = self.record(Mutation::StatusUpdate {
                order_id: order_id.to_string(),
                status: update.status,
            })?;
            let order = state
                .orders
                .iter_mut()
                .find(|o| o.id == order_id)
                .ok_or_else(|| StoreError::NotFound(order_id.to_string()))?;
            order.status = Some(update.status);
            order.updated_at = Some(update.updated_at);
        }
        self.notify();
        Ok(())
    }

    async fn delete(&self, order_id: &str) -> Result<(), StoreError> {
        {
            let mut state = self.record(Mutation::Delete { order_id: order_id.to_string() })?;
            state.orders.retain(|o| o.id != order_id);
        }
        self.notify();
        Ok(())
    }
}
