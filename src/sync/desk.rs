//! A desk is one signed-in session's controller, running as its own task.
//!
//! The task is the only owner of the controller. Handlers talk to it through
//! a [`DeskHandle`], which sends [`DeskCommand`]s and reads the published
//! view. Store mutations are validated inside the loop and then executed on
//! a separate task, so a slow store never delays snapshot handling or the
//! next user action.

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use super::controller::{CommandError, OrderSyncController};
use super::filter::StatusFilter;
use super::notice::Notice;
use crate::export::CsvExport;
use crate::models::order::OrderStatus;
use crate::render::{OrdersView, StagedDelete};
use crate::store::OrderStore;

const COMMAND_BUFFER: usize = 32;

type Reply<T> = oneshot::Sender<Result<T, CommandError>>;

pub enum DeskCommand {
    SetFilter {
        status: Option<StatusFilter>,
        search: Option<String>,
        reply: oneshot::Sender<OrdersView>,
    },
    Advance {
        order_id: String,
        status: OrderStatus,
        reply: Reply<()>,
    },
    RequestDelete {
        order_id: String,
        reply: Reply<StagedDelete>,
    },
    ConfirmDelete {
        reply: Reply<()>,
    },
    CancelDelete,
    Export {
        reply: Reply<CsvExport>,
    },
    Refresh,
    Stop,
}

impl OrderSyncController {
    fn dispatch(&mut self, command: DeskCommand) {
        match command {
            DeskCommand::SetFilter { status, search, reply } => {
                self.set_filter(status, search);
                let _ = reply.send(self.view());
            }
            DeskCommand::Advance { order_id, status, reply } => {
                match self.prepare_status_advance(&order_id, status) {
                    Ok(mutation) => self.spawn_mutation(mutation, reply),
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }
            DeskCommand::RequestDelete { order_id, reply } => {
                let _ = reply.send(self.request_delete(&order_id));
            }
            DeskCommand::ConfirmDelete { reply } => match self.prepare_confirm_delete() {
                Ok(mutation) => self.spawn_mutation(mutation, reply),
                Err(e) => {
                    let _ = reply.send(Err(e));
                }
            },
            DeskCommand::CancelDelete => self.cancel_delete(),
            DeskCommand::Export { reply } => {
                let _ = reply.send(self.export_current_view());
            }
            DeskCommand::Refresh => self.refresh(),
            // Handled by the loop.
            DeskCommand::Stop => {}
        }
    }

    fn spawn_mutation(&self, mutation: super::controller::PendingMutation, reply: Reply<()>) {
        let store = self.store();
        let notices = self.notices().clone();
        tokio::spawn(async move {
            let result = mutation.execute(store.as_ref(), &notices).await;
            let _ = reply.send(result);
        });
    }
}

/// Drive a controller until it is told to stop or every handle is gone.
pub async fn run_desk(mut controller: OrderSyncController, mut commands: mpsc::Receiver<DeskCommand>) {
    controller.start();
    loop {
        tokio::select! {
            event = controller.next_event() => match event {
                Some(event) => controller.handle_event(event),
                None => {
                    log::warn!("Order subscription ended; keeping the last snapshot");
                    controller.stop();
                }
            },
            command = commands.recv() => match command {
                Some(DeskCommand::Stop) | None => break,
                Some(command) => controller.dispatch(command),
            },
        }
    }
    controller.stop();
    log::debug!("Desk stopped");
}

#[derive(Clone)]
pub struct DeskHandle {
    commands: mpsc::Sender<DeskCommand>,
    views: watch::Receiver<OrdersView>,
    notices: broadcast::Sender<Notice>,
}

/// Start a desk task over `store` and return its handle.
pub fn spawn_desk(store: Arc<dyn OrderStore>) -> DeskHandle {
    let controller = OrderSyncController::new(store);
    let (commands, rx) = mpsc::channel(COMMAND_BUFFER);
    let handle = DeskHandle {
        commands,
        views: controller.watch_views(),
        notices: controller.notices().clone(),
    };
    tokio::spawn(run_desk(controller, rx));
    handle
}

impl DeskHandle {
    async fn send(&self, command: DeskCommand) -> Result<(), CommandError> {
        self.commands.send(command).await.map_err(|_| CommandError::DeskClosed)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> DeskCommand,
    ) -> Result<T, CommandError> {
        let (reply, rx) = oneshot::channel();
        self.send(make(reply)).await?;
        rx.await.map_err(|_| CommandError::DeskClosed)?
    }

    pub async fn set_filter(
        &self,
        status: Option<StatusFilter>,
        search: Option<String>,
    ) -> Result<OrdersView, CommandError> {
        let (reply, rx) = oneshot::channel();
        self.send(DeskCommand::SetFilter { status, search, reply }).await?;
        rx.await.map_err(|_| CommandError::DeskClosed)
    }

    /// Resolves once the store has answered, or immediately if rejected locally.
    pub async fn advance(&self, order_id: &str, status: OrderStatus) -> Result<(), CommandError> {
        let order_id = order_id.to_string();
        self.request(|reply| DeskCommand::Advance { order_id, status, reply }).await
    }

    pub async fn request_delete(&self, order_id: &str) -> Result<StagedDelete, CommandError> {
        let order_id = order_id.to_string();
        self.request(|reply| DeskCommand::RequestDelete { order_id, reply }).await
    }

    pub async fn confirm_delete(&self) -> Result<(), CommandError> {
        self.request(|reply| DeskCommand::ConfirmDelete { reply }).await
    }

    pub async fn cancel_delete(&self) -> Result<(), CommandError> {
        self.send(DeskCommand::CancelDelete).await
    }

    pub async fn export(&self) -> Result<CsvExport, CommandError> {
        self.request(|reply| DeskCommand::Export { reply }).await
    }

    pub async fn refresh(&self) -> Result<(), CommandError> {
        self.send(DeskCommand::Refresh).await
    }

    pub async fn stop(&self) {
        let _ = self.send(DeskCommand::Stop).await;
    }

    /// Latest published view.
    pub fn view(&self) -> OrdersView {
        self.views.borrow().clone()
    }

    pub fn watch_views(&self) -> watch::Receiver<OrdersView> {
        self.views.clone()
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}
