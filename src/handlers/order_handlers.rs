use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, http::header, web};
use serde::Deserialize;

use super::session_desk;
use crate::auth::{csrf, validate};
use crate::errors::{AppError, render, render_fragment};
use crate::models::order::OrderStatus;
use crate::render::{CURRENCY, OrdersView};
use crate::sync::{CommandError, DeskHandle, DeskRegistry, StatusFilter};
use crate::templates_structs::{OrdersTemplate, PageContext};

#[derive(Deserialize)]
pub struct FilterQuery {
    pub status: Option<String>,
    pub q: Option<String>,
}

/// A card button press, posted by the page's single delegated listener.
#[derive(Deserialize)]
pub struct ActionForm {
    pub action: String,
    pub order_id: String,
    #[serde(default)]
    pub status: String,
}

async fn filtered_view(desk: &DeskHandle, query: &FilterQuery) -> Result<OrdersView, AppError> {
    if query.status.is_none() && query.q.is_none() {
        return Ok(desk.view());
    }
    let status = match query.status.as_deref() {
        Some(s) => Some(
            s.parse::<StatusFilter>()
                .map_err(|e| AppError::BadRequest(e.to_string()))?,
        ),
        None => None,
    };
    let search = query.q.as_deref().map(validate::normalize_search);
    Ok(desk.set_filter(status, search).await?)
}

pub async fn index(
    session: Session,
    registry: web::Data<DeskRegistry>,
    query: web::Query<FilterQuery>,
) -> Result<HttpResponse, AppError> {
    let desk = session_desk(&session, &registry)?;
    let ctx = PageContext::build(&session, "/orders")?;
    let view = filtered_view(&desk, &query).await?;
    render(OrdersTemplate { ctx, view, currency: CURRENCY })
}

/// The list fragment for the current filter, for live filtering.
pub async fn view(
    session: Session,
    registry: web::Data<DeskRegistry>,
    query: web::Query<FilterQuery>,
) -> Result<HttpResponse, AppError> {
    let desk = session_desk(&session, &registry)?;
    let view = filtered_view(&desk, &query).await?;
    Ok(render_fragment(view.render_fragment()?))
}

pub async fn action(
    req: HttpRequest,
    session: Session,
    registry: web::Data<DeskRegistry>,
    form: web::Form<ActionForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_header(&session, &req)?;
    let desk = session_desk(&session, &registry)?;

    match form.action.as_str() {
        "advance" => {
            let status = form
                .status
                .parse::<OrderStatus>()
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            desk.advance(&form.order_id, status).await?;
        }
        "delete" => {
            desk.request_delete(&form.order_id).await?;
        }
        other => {
            return Err(AppError::BadRequest(format!("unknown action '{other}'")));
        }
    }
    Ok(HttpResponse::NoContent().finish())
}

pub async fn confirm_delete(
    req: HttpRequest,
    session: Session,
    registry: web::Data<DeskRegistry>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_header(&session, &req)?;
    let desk = session_desk(&session, &registry)?;
    match desk.confirm_delete().await {
        Ok(()) | Err(CommandError::NothingStaged) => Ok(HttpResponse::NoContent().finish()),
        Err(e) => Err(e.into()),
    }
}

pub async fn cancel_delete(
    req: HttpRequest,
    session: Session,
    registry: web::Data<DeskRegistry>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_header(&session, &req)?;
    session_desk(&session, &registry)?.cancel_delete().await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn refresh(
    req: HttpRequest,
    session: Session,
    registry: web::Data<DeskRegistry>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_header(&session, &req)?;
    session_desk(&session, &registry)?.refresh().await?;
    Ok(HttpResponse::NoContent().finish())
}

/// CSV download of the filtered view.
pub async fn export(
    session: Session,
    registry: web::Data<DeskRegistry>,
) -> Result<HttpResponse, AppError> {
    let desk = session_desk(&session, &registry)?;
    let csv = desk.export().await?;
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(header::ContentDisposition::attachment(csv.filename))
        .body(csv.body))
}
