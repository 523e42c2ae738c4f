//! Order Sync Controller.
//!
//! Owns one realtime subscription, the cached order list, the filter state
//! and the staged delete. The cache is replaced wholesale by each snapshot
//! and is never edited locally: mutations go to the store and their effect
//! shows up with the next snapshot. Every state change republishes an
//! [`OrdersView`] on a watch channel; transient notices go out on a
//! broadcast channel.

use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

use super::filter::{FilterState, StatusFilter};
use super::notice::Notice;
use crate::export::{self, CsvExport, ExportError};
use crate::models::order::{Order, OrderStatus};
use crate::render::{DeskStats, OrdersView, StagedDelete};
use crate::store::{OrderQuery, OrderStore, StatusUpdate, StoreError, StoreEvent, Subscription};

const NOTICE_BUFFER: usize = 32;

#[derive(Debug)]
pub enum CommandError {
    UnknownOrder(String),
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    NothingStaged,
    Store(StoreError),
    Export(ExportError),
    DeskClosed,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::UnknownOrder(id) => write!(f, "Order '{id}' is not in the current list"),
            CommandError::InvalidTransition { from, to } => {
                write!(f, "Cannot move an order from {from} to {to}")
            }
            CommandError::NothingStaged => write!(f, "No order is awaiting deletion"),
            CommandError::Store(e) => write!(f, "{e}"),
            CommandError::Export(e) => write!(f, "{e}"),
            CommandError::DeskClosed => write!(f, "The order desk has been closed"),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<StoreError> for CommandError {
    fn from(e: StoreError) -> Self {
        CommandError::Store(e)
    }
}

impl From<ExportError> for CommandError {
    fn from(e: ExportError) -> Self {
        CommandError::Export(e)
    }
}

/// A validated store mutation, detached from the controller so it can run
/// while the controller keeps handling snapshots and commands.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingMutation {
    Advance { order_id: String, status: OrderStatus },
    Delete { order_id: String, order_number: String },
}

impl PendingMutation {
    /// Send the mutation and announce the outcome. Never touches the cache.
    pub async fn execute(
        self,
        store: &dyn OrderStore,
        notices: &broadcast::Sender<Notice>,
    ) -> Result<(), CommandError> {
        match self {
            PendingMutation::Advance { order_id, status } => {
                let update = StatusUpdate { status, updated_at: Utc::now() };
                match store.update_status(&order_id, update).await {
                    Ok(()) => {
                        log::info!("Order {order_id} updated to {status}");
                        let _ = notices.send(Notice::success(format!("Order status updated to {status}")));
                        Ok(())
                    }
                    Err(e) => {
                        log::error!("Error updating order {order_id} to {status}: {e}");
                        let _ = notices.send(Notice::error("Failed to update order status"));
                        Err(e.into())
                    }
                }
            }
            PendingMutation::Delete { order_id, order_number } => {
                match store.delete(&order_id).await {
                    Ok(()) => {
                        log::info!("Order {order_id} deleted");
                        let _ = notices.send(Notice::success(format!(
                            "Order #{order_number} deleted successfully"
                        )));
                        Ok(())
                    }
                    Err(e) => {
                        log::error!("Error deleting order {order_id}: {e}");
                        let _ = notices.send(Notice::error("Failed to delete order"));
                        Err(e.into())
                    }
                }
            }
        }
    }
}

pub struct OrderSyncController {
    store: Arc<dyn OrderStore>,
    subscription: Option<Subscription>,
    cache: Vec<Order>,
    filter: FilterState,
    staged_delete: Option<StagedDelete>,
    load_error: Option<String>,
    loaded: bool,
    views: watch::Sender<OrdersView>,
    notices: broadcast::Sender<Notice>,
}

impl OrderSyncController {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        let (views, _) = watch::channel(OrdersView::default());
        let (notices, _) = broadcast::channel(NOTICE_BUFFER);
        Self {
            store,
            subscription: None,
            cache: Vec::new(),
            filter: FilterState::default(),
            staged_delete: None,
            load_error: None,
            loaded: false,
            views,
            notices,
        }
    }

    // ---------------------------------------------------------------------
    // Subscription lifecycle
    // ---------------------------------------------------------------------

    /// Open the full-history subscription. Returns false if one is already open.
    pub fn start(&mut self) -> bool {
        if self.subscription.is_some() {
            return false;
        }
        self.subscription = Some(self.store.subscribe(OrderQuery::all()));
        log::debug!("Order subscription opened");
        true
    }

    /// Drop the subscription. Snapshots already queued are discarded with it.
    pub fn stop(&mut self) {
        if self.subscription.take().is_some() {
            log::debug!("Order subscription closed");
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Wait for the next store event. Pends forever while stopped.
    pub async fn next_event(&mut self) -> Option<StoreEvent> {
        match self.subscription.as_mut() {
            Some(sub) => sub.recv().await,
            None => std::future::pending().await,
        }
    }

    pub fn handle_event(&mut self, event: StoreEvent) {
        match event {
            StoreEvent::Snapshot(orders) => self.on_snapshot(orders),
            StoreEvent::Error(e) => self.on_snapshot_error(e),
        }
    }

    /// Replace the cache with the snapshot, verbatim.
    pub fn on_snapshot(&mut self, orders: Vec<Order>) {
        log::debug!("Orders loaded: {}", orders.len());
        self.cache = orders;
        self.loaded = true;
        self.load_error = None;
        self.publish();
    }

    /// Keep the stale cache and surface the failure.
    pub fn on_snapshot_error(&mut self, err: StoreError) {
        log::error!("Error loading orders: {err}");
        self.load_error = Some("Failed to load orders".to_string());
        let _ = self.notices.send(Notice::error("Failed to load orders"));
        self.publish();
    }

    // ---------------------------------------------------------------------
    // Local view state
    // ---------------------------------------------------------------------

    /// Update whichever filter fields are given and re-render.
    pub fn set_filter(&mut self, status: Option<StatusFilter>, search: Option<String>) {
        if let Some(status) = status {
            self.filter.status = status;
        }
        if let Some(search) = search {
            self.filter.search = search;
        }
        self.publish();
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn orders(&self) -> &[Order] {
        &self.cache
    }

    pub fn filtered_view(&self) -> Vec<&Order> {
        self.filter.apply(&self.cache)
    }

    pub fn stats(&self) -> DeskStats {
        DeskStats::from_orders(&self.cache)
    }

    pub fn staged_delete(&self) -> Option<&StagedDelete> {
        self.staged_delete.as_ref()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Re-render and confirm to the user. The subscription keeps the data fresh.
    pub fn refresh(&mut self) {
        self.publish();
        let _ = self.notices.send(Notice::success("Orders refreshed successfully"));
    }

    // ---------------------------------------------------------------------
    // Commands
    // ---------------------------------------------------------------------

    /// Validate a status change against the cache. Only the next status in
    /// the chain is accepted; anything else is rejected without a store call.
    pub fn prepare_status_advance(
        &self,
        order_id: &str,
        target: OrderStatus,
    ) -> Result<PendingMutation, CommandError> {
        let order = self
            .find(order_id)
            .ok_or_else(|| CommandError::UnknownOrder(order_id.to_string()))?;
        let current = order.effective_status();
        if !current.can_advance_to(target) {
            log::warn!("Rejected status change for {order_id}: {current} -> {target}");
            return Err(CommandError::InvalidTransition { from: current, to: target });
        }
        Ok(PendingMutation::Advance { order_id: order_id.to_string(), status: target })
    }

    pub async fn request_status_advance(
        &self,
        order_id: &str,
        target: OrderStatus,
    ) -> Result<(), CommandError> {
        let mutation = self.prepare_status_advance(order_id, target)?;
        mutation.execute(self.store.as_ref(), &self.notices).await
    }

    /// Stage a delete, replacing any earlier stage. Does not touch the store.
    pub fn request_delete(&mut self, order_id: &str) -> Result<StagedDelete, CommandError> {
        let order = self
            .find(order_id)
            .ok_or_else(|| CommandError::UnknownOrder(order_id.to_string()))?;
        let staged = StagedDelete {
            order_id: order.id.clone(),
            order_number: order.order_number_display().to_string(),
        };
        self.staged_delete = Some(staged.clone());
        self.publish();
        Ok(staged)
    }

    /// Take the staged delete, clearing it, as a mutation ready to send.
    pub fn prepare_confirm_delete(&mut self) -> Result<PendingMutation, CommandError> {
        let staged = self.staged_delete.take().ok_or(CommandError::NothingStaged)?;
        self.publish();
        Ok(PendingMutation::Delete {
            order_id: staged.order_id,
            order_number: staged.order_number,
        })
    }

    pub async fn confirm_delete(&mut self) -> Result<(), CommandError> {
        let mutation = self.prepare_confirm_delete()?;
        mutation.execute(self.store.as_ref(), &self.notices).await
    }

    pub fn cancel_delete(&mut self) {
        if self.staged_delete.take().is_some() {
            self.publish();
        }
    }

    /// CSV of the filtered view, not the whole cache.
    pub fn export_current_view(&self) -> Result<CsvExport, CommandError> {
        let filtered = self.filtered_view();
        match export::export_orders(&filtered) {
            Ok(csv) => {
                log::info!("Exported {} orders to {}", filtered.len(), csv.filename);
                let _ = self.notices.send(Notice::success("Orders exported successfully"));
                Ok(csv)
            }
            Err(e) => {
                log::error!("Error exporting orders: {e}");
                let _ = self.notices.send(Notice::error("Failed to export orders"));
                Err(e.into())
            }
        }
    }

    // ---------------------------------------------------------------------
    // Outputs
    // ---------------------------------------------------------------------

    pub fn view(&self) -> OrdersView {
        let mut view = OrdersView::build(&self.filtered_view(), self.stats(), &self.filter, Utc::now());
        view.staged_delete = self.staged_delete.clone();
        view.load_error = self.load_error.clone();
        view.loaded = self.loaded;
        view
    }

    pub fn watch_views(&self) -> watch::Receiver<OrdersView> {
        self.views.subscribe()
    }

    pub fn notices(&self) -> &broadcast::Sender<Notice> {
        &self.notices
    }

    pub fn store(&self) -> Arc<dyn OrderStore> {
        Arc::clone(&self.store)
    }

    fn publish(&self) {
        self.views.send_replace(self.view());
    }

    fn find(&self, order_id: &str) -> Option<&Order> {
        self.cache.iter().find(|o| o.id == order_id)
    }
}
