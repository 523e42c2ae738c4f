//! View models for the order management page.
//!
//! Built from the filtered projection of the cache. Each card declares the
//! actions it offers so the page can dispatch them without knowing the
//! status chain.

use askama::Template;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::time_ago::time_ago;
use crate::models::order::{Order, OrderStatus};
use crate::sync::filter::{FilterState, StatusFilter};
use crate::templates_structs::OrderListFragment;

pub const CURRENCY: &str = "₹";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeskStats {
    pub total: usize,
    pub pending: usize,
    pub preparing: usize,
    pub ready: usize,
}

impl DeskStats {
    /// Counts over the whole cache, not the filtered view.
    pub fn from_orders(orders: &[Order]) -> Self {
        let mut stats = DeskStats { total: orders.len(), ..Default::default() };
        for order in orders {
            match order.effective_status() {
                OrderStatus::Pending => stats.pending += 1,
                OrderStatus::Preparing => stats.preparing += 1,
                OrderStatus::Ready => stats.ready += 1,
                OrderStatus::Completed => {}
            }
        }
        stats
    }
}

/// A delete waiting for the user's confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedDelete {
    pub order_id: String,
    pub order_number: String,
}

impl StagedDelete {
    pub fn message(&self) -> String {
        format!("Are you sure you want to delete Order #{}?", self.order_number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardAction {
    Advance(OrderStatus),
    Delete,
}

impl CardAction {
    pub fn kind(&self) -> &'static str {
        match self {
            CardAction::Advance(_) => "advance",
            CardAction::Delete => "delete",
        }
    }

    pub fn target(&self) -> &'static str {
        match self {
            CardAction::Advance(status) => status.as_str(),
            CardAction::Delete => "",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CardAction::Advance(status) => status.advance_label(),
            CardAction::Delete => "Delete",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            CardAction::Advance(OrderStatus::Preparing) => "btn-preparing",
            CardAction::Advance(OrderStatus::Ready) => "btn-ready",
            CardAction::Advance(OrderStatus::Completed) => "btn-complete",
            CardAction::Advance(OrderStatus::Pending) => "btn-reopen",
            CardAction::Delete => "btn-delete",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            CardAction::Advance(OrderStatus::Preparing) => "chef-hat",
            CardAction::Advance(OrderStatus::Ready) => "check-circle",
            CardAction::Advance(_) => "package-check",
            CardAction::Delete => "trash-2",
        }
    }
}

/// The next-status action (if the order is not completed) plus delete.
pub fn card_actions(status: OrderStatus) -> Vec<CardAction> {
    status
        .next()
        .map(CardAction::Advance)
        .into_iter()
        .chain(std::iter::once(CardAction::Delete))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemLine {
    pub quantity: u32,
    pub name: String,
    pub price: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderCard {
    pub id: String,
    pub order_number: String,
    pub table_number: String,
    pub status: OrderStatus,
    pub time_ago: String,
    pub items: Vec<ItemLine>,
    pub total: String,
    pub actions: Vec<CardAction>,
}

impl OrderCard {
    pub fn build(order: &Order, now: DateTime<Utc>) -> Self {
        let status = order.effective_status();
        OrderCard {
            id: order.id.clone(),
            order_number: order.order_number_display().to_string(),
            table_number: order.table_number_display().to_string(),
            status,
            time_ago: time_ago(order.timestamp, now),
            items: order
                .items()
                .iter()
                .map(|item| ItemLine {
                    quantity: item.quantity(),
                    name: item.name().to_string(),
                    price: format_amount(item.price()),
                })
                .collect(),
            total: format_amount(order.total()),
            actions: card_actions(status),
        }
    }

    pub fn status_class(&self) -> &'static str {
        self.status.as_str()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Everything the order list fragment needs, and nothing that can reach the store.
#[derive(Debug, Clone, Default)]
pub struct OrdersView {
    pub cards: Vec<OrderCard>,
    pub stats: DeskStats,
    pub filter: FilterState,
    pub staged_delete: Option<StagedDelete>,
    pub load_error: Option<String>,
    /// False until the first snapshot has arrived.
    pub loaded: bool,
}

impl OrdersView {
    pub fn build(
        filtered: &[&Order],
        stats: DeskStats,
        filter: &FilterState,
        now: DateTime<Utc>,
    ) -> Self {
        OrdersView {
            cards: filtered.iter().map(|o| OrderCard::build(o, now)).collect(),
            stats,
            filter: filter.clone(),
            staged_delete: None,
            load_error: None,
            loaded: true,
        }
    }

    /// The "no results" state: loaded, and nothing passes the filter.
    pub fn is_empty(&self) -> bool {
        self.loaded && self.cards.is_empty()
    }

    pub fn filter_options(&self) -> Vec<FilterOption> {
        StatusFilter::choices()
            .into_iter()
            .map(|choice| FilterOption {
                value: choice.as_str(),
                label: choice.label(),
                selected: choice == self.filter.status,
            })
            .collect()
    }

    pub fn render_fragment(&self) -> Result<String, askama::Error> {
        OrderListFragment { view: self, currency: CURRENCY }.render()
    }
}

/// `450` for whole amounts, `12.5` otherwise.
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{value:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::OrderItem;

    #[test]
    fn actions_follow_the_status_chain() {
        assert_eq!(
            card_actions(OrderStatus::Pending),
            vec![CardAction::Advance(OrderStatus::Preparing), CardAction::Delete]
        );
        assert_eq!(
            card_actions(OrderStatus::Ready),
            vec![CardAction::Advance(OrderStatus::Completed), CardAction::Delete]
        );
        assert_eq!(card_actions(OrderStatus::Completed), vec![CardAction::Delete]);
    }

    #[test]
    fn card_resolves_placeholders() {
        let order = Order {
            id: "x1".into(),
            items: Some(vec![OrderItem { name: Some("Dal".into()), quantity: None, price: None }]),
            ..Default::default()
        };
        let card = OrderCard::build(&order, Utc::now());
        assert_eq!(card.order_number, "N/A");
        assert_eq!(card.table_number, "N/A");
        assert_eq!(card.status, OrderStatus::Pending);
        assert_eq!(card.time_ago, "Unknown");
        assert_eq!(card.total, "0");
        assert_eq!(card.items[0].quantity, 1);
        assert_eq!(card.actions[0], CardAction::Advance(OrderStatus::Preparing));
    }

    #[test]
    fn stats_count_the_whole_cache() {
        let orders = vec![
            Order { id: "a".into(), ..Default::default() },
            Order { id: "b".into(), status: Some(OrderStatus::Pending), ..Default::default() },
            Order { id: "c".into(), status: Some(OrderStatus::Ready), ..Default::default() },
        ];
        let stats = DeskStats::from_orders(&orders);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.ready, 1);
    }

    #[test]
    fn empty_view_renders_the_empty_state_marker() {
        let view = OrdersView::build(&[], DeskStats::default(), &FilterState::default(), Utc::now());
        assert!(view.is_empty());
        let html = view.render_fragment().unwrap();
        assert!(html.contains("data-empty-state"));
        assert!(!html.contains("data-order-id"));
    }

    #[test]
    fn populated_view_has_no_empty_state_marker() {
        let order = Order {
            id: "o-7".into(),
            order_number: Some("1007".into()),
            status: Some(OrderStatus::Preparing),
            ..Default::default()
        };
        let view = OrdersView::build(&[&order], DeskStats::default(), &FilterState::default(), Utc::now());
        let html = view.render_fragment().unwrap();
        assert!(!html.contains("data-empty-state"));
        assert!(html.contains(r#"data-order-id="o-7""#));
        assert!(html.contains("Mark Ready"));
    }

    #[test]
    fn amounts() {
        assert_eq!(format_amount(450.0), "450");
        assert_eq!(format_amount(12.5), "12.5");
        assert_eq!(format_amount(12.25), "12.25");
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(1200.0), "1200");
    }

    #[test]
    fn amounts_that_round_to_whole_numbers_have_no_trailing_dot() {
        assert_eq!(format_amount(12.999), "13");
        assert_eq!(format_amount(10.001), "10");
        assert_eq!(format_amount(99.999), "100");
        assert_eq!(format_amount(10.104), "10.1");
        assert_eq!(format_amount(-0.001), "0");
    }
}
