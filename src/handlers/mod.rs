pub mod auth_handlers;
pub mod dashboard;
pub mod order_handlers;
pub mod ws;

use actix_session::Session;
use actix_web::{HttpResponse, web};

use crate::auth;
use crate::auth::session::{get_desk_id, set_desk_id, set_flash};
use crate::errors::AppError;
use crate::sync::{DeskHandle, DeskRegistry};

/// The session's desk. A desk that was swept while idle is replaced and
/// the new id written back to the session.
pub(crate) fn session_desk(session: &Session, registry: &DeskRegistry) -> Result<DeskHandle, AppError> {
    let current = get_desk_id(session);
    let (id, handle) = registry.get_or_open(current.as_deref());
    if current.as_deref() != Some(id.as_str()) {
        set_desk_id(session, &id)?;
        if current.is_some() {
            set_flash(session, "Your order desk was idle and has been reloaded");
        }
    }
    Ok(handle)
}

pub(crate) fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header(("Location", location))
        .finish()
}

/// Every route. Shared by `main` and the handler tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // Public routes
        .route("/login", web::get().to(auth_handlers::login_page))
        .route("/login", web::post().to(auth_handlers::login_submit))
        .route("/", web::get().to(|| async { see_other("/dashboard") }))
        // Protected routes
        .service(
            web::scope("")
                .wrap(actix_web::middleware::from_fn(auth::middleware::require_auth))
                .route("/logout", web::post().to(auth_handlers::logout))
                .route("/dashboard", web::get().to(dashboard::index))
                .route("/dashboard/chart", web::get().to(dashboard::chart))
                .route("/ws/dashboard", web::get().to(ws::dashboard_ws))
                .route("/orders", web::get().to(order_handlers::index))
                .route("/orders/view", web::get().to(order_handlers::view))
                .route("/orders/action", web::post().to(order_handlers::action))
                .route("/orders/delete/confirm", web::post().to(order_handlers::confirm_delete))
                .route("/orders/delete/cancel", web::post().to(order_handlers::cancel_delete))
                .route("/orders/refresh", web::post().to(order_handlers::refresh))
                .route("/orders/export", web::get().to(order_handlers::export))
                .route("/ws/orders", web::get().to(ws::orders_ws)),
        );
}
