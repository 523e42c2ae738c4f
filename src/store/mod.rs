//! Remote order store boundary.
//!
//! The dashboard never reads the database directly. It opens a
//! [`Subscription`] that delivers complete, ordered snapshots of the order
//! collection, and it issues point mutations (status update, delete) by
//! document id. Whatever the mutation outcome, the cache only changes when
//! the next snapshot arrives.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::models::order::{Order, OrderStatus};

pub use self::memory::{MemoryOrderStore, Mutation};
pub use self::postgres::PgOrderStore;

/// Buffer between a store's delivery task and its subscriber.
pub const SUBSCRIPTION_BUFFER: usize = 16;

/// Shape of a subscribed query. Ordering is always by creation time, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderQuery {
    pub limit: Option<usize>,
}

impl OrderQuery {
    /// Full history, for the management view.
    pub fn all() -> Self {
        Self { limit: None }
    }

    /// The `n` most recent orders, for the dashboard summary.
    pub fn recent(n: usize) -> Self {
        Self { limit: Some(n) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusUpdate {
    pub status: OrderStatus,
    pub updated_at: DateTime<Utc>,
}

/// What a subscription delivers. Each snapshot supersedes the previous one.
#[derive(Debug)]
pub enum StoreEvent {
    Snapshot(Vec<Order>),
    Error(StoreError),
}

#[derive(Debug)]
pub enum StoreError {
    Database(sqlx::Error),
    NotFound(String),
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Database(e) => write!(f, "Database error: {e}"),
            StoreError::NotFound(id) => write!(f, "No order with id '{id}'"),
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Database(e)
    }
}

/// Receiving end of a realtime query. Dropping it stops the delivery task.
pub struct Subscription {
    events: mpsc::Receiver<StoreEvent>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(events: mpsc::Receiver<StoreEvent>, task: JoinHandle<()>) -> Self {
        Self { events, task: Some(task) }
    }

    /// Next event, or `None` once the delivery task has ended.
    pub async fn recv(&mut self) -> Option<StoreEvent> {
        self.events.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Open a realtime query. The first event is the current state.
    fn subscribe(&self, query: OrderQuery) -> Subscription;

    /// One-shot read of orders created at or after `since`, newest first.
    async fn fetch_since(&self, since: DateTime<Utc>) -> Result<Vec<Order>, StoreError>;

    async fn update_status(&self, order_id: &str, update: StatusUpdate) -> Result<(), StoreError>;

    async fn delete(&self, order_id: &str) -> Result<(), StoreError>;
}

/// Newest first, orders without a timestamp last.
pub(crate) fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| match (a.timestamp, b.timestamp) {
        (Some(x), Some(y)) => y.cmp(&x).then_with(|| a.id.cmp(&b.id)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.id.cmp(&b.id),
    });
}
