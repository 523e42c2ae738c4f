use std::fmt;
use std::str::FromStr;

use crate::models::order::{Order, OrderStatus, UnknownStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(OrderStatus),
}

impl StatusFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Only(status) => status.as_str(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All Orders",
            StatusFilter::Only(status) => status.label(),
        }
    }

    pub fn choices() -> [StatusFilter; 5] {
        [
            StatusFilter::All,
            StatusFilter::Only(OrderStatus::Pending),
            StatusFilter::Only(OrderStatus::Preparing),
            StatusFilter::Only(OrderStatus::Ready),
            StatusFilter::Only(OrderStatus::Completed),
        ]
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "all" => Ok(StatusFilter::All),
            other => other.parse().map(StatusFilter::Only),
        }
    }
}

/// Status + search criteria the order list is viewed through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub status: StatusFilter,
    pub search: String,
}

impl FilterState {
    /// An order passes when its status matches (or the filter is `all`) and
    /// the search term is empty or a case-insensitive substring of the order
    /// number, the table number, or any item name.
    pub fn matches(&self, order: &Order) -> bool {
        let status_match = match self.status {
            StatusFilter::All => true,
            StatusFilter::Only(status) => order.effective_status() == status,
        };
        status_match && self.search_matches(order)
    }

    fn search_matches(&self, order: &Order) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        let hit = |field: Option<&str>| field.is_some_and(|v| v.to_lowercase().contains(&needle));

        hit(order.order_number.as_deref())
            || hit(order.table_number.as_deref())
            || order.items().iter().any(|item| hit(item.name.as_deref()))
    }

    /// Project the cache through the filter, preserving cache order.
    pub fn apply<'a>(&self, orders: &'a [Order]) -> Vec<&'a Order> {
        orders.iter().filter(|o| self.matches(o)).collect()
    }
}
