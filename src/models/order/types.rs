use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::OrderStatus;

/// Shown wherever an optional display identifier is missing.
pub const PLACEHOLDER: &str = "N/A";

/// One line of an order as stored in the `items` document field.
/// Every field is optional in stored documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "qty")]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub price: Option<f64>,
}

impl OrderItem {
    pub fn new(name: &str, quantity: u32, price: f64) -> Self {
        Self {
            name: Some(name.to_string()),
            quantity: Some(quantity),
            price: Some(price),
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Missing or zero quantities count as one.
    pub fn quantity(&self) -> u32 {
        self.quantity.filter(|q| *q > 0).unwrap_or(1)
    }

    pub fn price(&self) -> f64 {
        self.price.unwrap_or(0.0)
    }
}

/// Cached copy of an order document. The store owns it; nothing in the
/// dashboard edits one of these in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Order {
    pub id: String,
    pub order_number: Option<String>,
    pub table_number: Option<String>,
    pub status: Option<OrderStatus>,
    pub items: Option<Vec<OrderItem>>,
    pub total: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Status used for display, filtering and actions. Absent means pending.
    pub fn effective_status(&self) -> OrderStatus {
        self.status.unwrap_or(OrderStatus::Pending)
    }

    pub fn order_number_display(&self) -> &str {
        non_empty(self.order_number.as_deref()).unwrap_or(PLACEHOLDER)
    }

    pub fn table_number_display(&self) -> &str {
        non_empty(self.table_number.as_deref()).unwrap_or(PLACEHOLDER)
    }

    pub fn items(&self) -> &[OrderItem] {
        self.items.as_deref().unwrap_or(&[])
    }

    pub fn total(&self) -> f64 {
        self.total.unwrap_or(0.0)
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.is_empty())
}

/// Data for creating an order, used by the in-memory store and seeding.
#[derive(Debug, Clone, Default)]
pub struct NewOrder {
    pub order_number: Option<String>,
    pub table_number: Option<String>,
    pub status: Option<OrderStatus>,
    pub items: Vec<OrderItem>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewOrder {
    /// Sum of `quantity * price` over the items.
    pub fn computed_total(&self) -> f64 {
        self.items.iter().map(|i| i.quantity() as f64 * i.price()).sum()
    }
}
