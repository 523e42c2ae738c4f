//! Live pushes to the browser.
//!
//! `/ws/orders` streams the session desk's rendered list and its notices;
//! `/ws/dashboard` streams the shared recent-orders panel. Messages are JSON
//! objects tagged by `type`. Client messages other than ping/close are
//! ignored; actions go through the HTTP endpoints.

use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};
use actix_ws::Message;
use chrono::Utc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;

use super::session_desk;
use crate::auth::session::{get_desk_id, get_user_email};
use crate::render::OrdersView;
use crate::render::recent::{RecentOrders, render_recent};
use crate::sync::{DeskRegistry, Notice};

pub fn orders_message(view: &OrdersView) -> Option<String> {
    match view.render_fragment() {
        Ok(html) => Some(
            serde_json::json!({
                "type": "orders",
                "html": html,
                "total": view.stats.total,
                "pending": view.stats.pending,
            })
            .to_string(),
        ),
        Err(e) => {
            log::error!("Failed to render order list: {e}");
            None
        }
    }
}

pub fn notice_message(notice: &Notice) -> String {
    serde_json::json!({
        "type": "notice",
        "level": notice.level,
        "message": notice.message,
        "dismiss_ms": notice.dismiss_after_ms(),
    })
    .to_string()
}

pub fn recent_message(state: &RecentOrders) -> Option<String> {
    match render_recent(state, Utc::now()) {
        Ok(html) => Some(serde_json::json!({ "type": "recent", "html": html }).to_string()),
        Err(e) => {
            log::error!("Failed to render recent orders: {e}");
            None
        }
    }
}

/// WebSocket for the order management page.
pub async fn orders_ws(
    req: HttpRequest,
    body: web::Payload,
    session: Session,
    registry: web::Data<DeskRegistry>,
) -> Result<HttpResponse, actix_web::Error> {
    if get_user_email(&session).is_none() {
        return Ok(HttpResponse::Unauthorized().finish());
    }
    let desk = session_desk(&session, &registry)?;
    let lease = get_desk_id(&session).and_then(|id| registry.lease(&id));

    let (response, mut ws_session, mut msg_stream) = actix_ws::handle(&req, body)?;

    let mut views = desk.watch_views();
    let mut notices = desk.subscribe_notices();

    actix_web::rt::spawn(async move {
        // Held for the life of the socket so the desk is not swept under it.
        let _lease = lease;
        let initial = views.borrow_and_update().clone();
        if let Some(msg) = orders_message(&initial) {
            if ws_session.text(msg).await.is_err() {
                return;
            }
        }

        loop {
            tokio::select! {
                changed = views.changed() => {
                    // The desk was stopped: sign-out or idle sweep.
                    if changed.is_err() {
                        break;
                    }
                    let view = views.borrow_and_update().clone();
                    if let Some(msg) = orders_message(&view) {
                        if ws_session.text(msg).await.is_err() {
                            break;
                        }
                    }
                }
                notice = notices.recv() => match notice {
                    Ok(notice) => {
                        if ws_session.text(notice_message(&notice)).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(n)) => log::warn!("Orders socket skipped {n} notices"),
                    Err(RecvError::Closed) => break,
                },
                Some(Ok(msg)) = msg_stream.recv() => {
                    match msg {
                        Message::Ping(bytes) => {
                            if ws_session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        Message::Close(_) => break,
                        _ => {}
                    }
                }
                else => break,
            }
        }

        let _ = ws_session.close(None).await;
    });

    Ok(response)
}

/// WebSocket for the dashboard's recent-orders panel.
pub async fn dashboard_ws(
    req: HttpRequest,
    body: web::Payload,
    session: Session,
    recent: web::Data<watch::Receiver<RecentOrders>>,
) -> Result<HttpResponse, actix_web::Error> {
    if get_user_email(&session).is_none() {
        return Ok(HttpResponse::Unauthorized().finish());
    }

    let (response, mut ws_session, mut msg_stream) = actix_ws::handle(&req, body)?;
    let mut recent = recent.get_ref().clone();

    actix_web::rt::spawn(async move {
        loop {
            tokio::select! {
                changed = recent.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = recent.borrow_and_update().clone();
                    if let Some(msg) = recent_message(&state) {
                        if ws_session.text(msg).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(msg)) = msg_stream.recv() => {
                    match msg {
                        Message::Ping(bytes) => {
                            if ws_session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        Message::Close(_) => break,
                        _ => {}
                    }
                }
                else => break,
            }
        }

        let _ = ws_session.close(None).await;
    });

    Ok(response)
}
