use askama::Template;

use super::PageContext;
use crate::render::OrdersView;

#[derive(Template)]
#[template(path = "orders.html")]
pub struct OrdersTemplate {
    pub ctx: PageContext,
    pub view: OrdersView,
    pub currency: &'static str,
}

/// Stats, confirmation prompt, banner and cards. Pushed whole on every change.
#[derive(Template)]
#[template(path = "orders/_list.html")]
pub struct OrderListFragment<'a> {
    pub view: &'a OrdersView,
    pub currency: &'static str,
}
