use askama::Template;

use super::PageContext;
use crate::dashboard::{PopularItem, TodayMetrics};
use crate::render::recent::{Placeholder, RecentRow};

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub greeting: String,
    pub metrics: TodayMetrics,
    /// Set when today's orders could not be read; the numbers are then unknown.
    pub metrics_error: Option<String>,
    pub revenue: String,
    pub average_order_value: String,
    pub popular_items: Vec<PopularItem>,
    /// Rendered `dashboard/_recent.html`, replaced live over the socket.
    pub recent_html: String,
    pub chart_period: &'static str,
    pub currency: &'static str,
}

#[derive(Template)]
#[template(path = "dashboard/_recent.html")]
pub struct RecentOrdersFragment {
    pub rows: Vec<RecentRow>,
    pub placeholder: Option<Placeholder>,
    pub currency: &'static str,
}
