use actix_session::Session;
use actix_web::{HttpResponse, web};
use chrono::{Local, Utc};
use serde::Deserialize;
use tokio::sync::watch;

use crate::dashboard::{
    self, ChartPeriod, POPULAR_ITEMS, TodayMetrics, popular_items, sales_series, start_of_day,
};
use crate::errors::{AppError, render};
use crate::render::recent::{RecentOrders, render_recent};
use crate::render::{CURRENCY, format_amount};
use crate::store::OrderStore;
use crate::templates_structs::{DashboardTemplate, PageContext};

const METRICS_ERROR: &str = "Failed to load today's orders";

#[derive(Deserialize)]
pub struct ChartQuery {
    pub period: Option<String>,
}

pub async fn index(
    session: Session,
    store: web::Data<dyn OrderStore>,
    recent: web::Data<watch::Receiver<RecentOrders>>,
) -> Result<HttpResponse, AppError> {
    let ctx = PageContext::build(&session, "/dashboard")?;
    let now = Local::now();

    let (today, metrics_error) = match store.fetch_since(start_of_day(&Local, now.date_naive())).await {
        Ok(orders) => (orders, None),
        Err(e) => {
            log::error!("Error loading today's orders: {e}");
            (Vec::new(), Some(METRICS_ERROR.to_string()))
        }
    };
    let metrics = TodayMetrics::from_orders(&today);

    let recent_state = recent.borrow().clone();
    let recent_html = render_recent(&recent_state, Utc::now())?;

    let tmpl = DashboardTemplate {
        greeting: dashboard::greeting_at(&now, &ctx.email),
        ctx,
        revenue: format_amount(metrics.revenue),
        average_order_value: format_amount((metrics.average_order_value * 100.0).round() / 100.0),
        metrics,
        metrics_error,
        popular_items: popular_items(&today, POPULAR_ITEMS),
        recent_html,
        chart_period: ChartPeriod::default().as_str(),
        currency: CURRENCY,
    };
    render(tmpl)
}

/// Sales series for the chart, as JSON.
pub async fn chart(
    store: web::Data<dyn OrderStore>,
    query: web::Query<ChartQuery>,
) -> Result<HttpResponse, AppError> {
    let period = ChartPeriod::from_query(query.period.as_deref());
    let today = Local::now().date_naive();
    let orders = store
        .fetch_since(start_of_day(&Local, period.first_day(today)))
        .await?;
    Ok(HttpResponse::Ok().json(sales_series(period, &orders, today, &Local)))
}
