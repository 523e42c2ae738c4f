//! Postgres-backed order store.
//!
//! Realtime delivery rides on `LISTEN orders_changed`: a trigger on the
//! `orders` table notifies with the restaurant id, and the subscription
//! task answers each notification by re-reading the whole query and
//! sending it as one snapshot. `PgListener` reconnects on its own; after a
//! listener error the task waits briefly and resends the current state,
//! since notifications may have been missed while disconnected.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgListener;
use std::time::Duration;
use tokio::sync::mpsc;

use super::{
    OrderQuery, OrderStore, SUBSCRIPTION_BUFFER, StatusUpdate, StoreError, StoreEvent,
    Subscription,
};
use crate::models::order::{self, Order};

const LISTENER_BACKOFF: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
    restaurant_id: String,
}

impl PgOrderStore {
    pub fn new(pool: PgPool, restaurant_id: &str) -> Self {
        Self { pool, restaurant_id: restaurant_id.to_string() }
    }

    async fn load(&self, query: OrderQuery) -> StoreEvent {
        let limit = query.limit.map(|n| n as i64);
        match order::queries::find_recent(&self.pool, &self.restaurant_id, limit).await {
            Ok(orders) => StoreEvent::Snapshot(orders),
            Err(e) => StoreEvent::Error(e.into()),
        }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    fn subscribe(&self, query: OrderQuery) -> Subscription {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let store = self.clone();

        let task = tokio::spawn(async move {
            let mut listener = match PgListener::connect_with(&store.pool).await {
                Ok(l) => l,
                Err(e) => {
                    log::error!("Order subscription: listener connect failed: {e}");
                    let _ = tx.send(StoreEvent::Error(e.into())).await;
                    return;
                }
            };
            if let Err(e) = listener.listen(order::queries::ORDERS_CHANNEL).await {
                log::error!("Order subscription: LISTEN failed: {e}");
                let _ = tx.send(StoreEvent::Error(e.into())).await;
                return;
            }

            if tx.send(store.load(query).await).await.is_err() {
                return;
            }

            loop {
                let event = match listener.recv().await {
                    Ok(notification) if notification.payload() == store.restaurant_id => {
                        store.load(query).await
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        log::warn!("Order subscription: listener error: {e}");
                        if tx.send(StoreEvent::Error(e.into())).await.is_err() {
                            return;
                        }
                        tokio::time::sleep(LISTENER_BACKOFF).await;
                        store.load(query).await
                    }
                };
                if tx.send(event).await.is_err() {
                    log::debug!("Order subscription closed by subscriber");
                    return;
                }
            }
        });

        Subscription::new(rx, task)
    }

    async fn fetch_since(&self, since: DateTime<Utc>) -> Result<Vec<Order>, StoreError> {
        Ok(order::queries::find_since(&self.pool, &self.restaurant_id, since).await?)
    }

    async fn update_status(&self, order_id: &str, update: StatusUpdate) -> Result<(), StoreError> {
        let touched = order::queries::update_status(
            &self.pool,
            &self.restaurant_id,
            order_id,
            update.status,
            update.updated_at,
        )
        .await?;
        if touched == 0 {
            return Err(StoreError::NotFound(order_id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, order_id: &str) -> Result<(), StoreError> {
        order::queries::delete(&self.pool, &self.restaurant_id, order_id).await?;
        Ok(())
    }
}
