use std::sync::Arc;
use tokio::sync::watch;

use crate::render::recent::RecentOrders;
use crate::store::{OrderQuery, OrderStore, StoreEvent};

/// Shared subscription to the `limit` newest orders, for the dashboard.
///
/// Every dashboard socket reads the same receiver. A subscription error
/// replaces the list with the failed state until the next snapshot.
pub fn spawn_recent_feed(store: Arc<dyn OrderStore>, limit: usize) -> watch::Receiver<RecentOrders> {
    let (tx, rx) = watch::channel(RecentOrders::Loading);
    let mut subscription = store.subscribe(OrderQuery::recent(limit));
    tokio::spawn(async move {
        while let Some(event) = subscription.recv().await {
            let next = match event {
                StoreEvent::Snapshot(orders) => RecentOrders::Ready(orders),
                StoreEvent::Error(e) => {
                    log::error!("Error loading recent orders: {e}");
                    RecentOrders::Failed
                }
            };
            if tx.send(next).is_err() {
                break;
            }
        }
        log::debug!("Recent orders feed ended");
    });
    rx
}
