pub mod queries;
pub mod status;
pub mod types;

pub use self::status::{OrderStatus, UnknownStatus};
pub use self::types::{NewOrder, Order, OrderItem, PLACEHOLDER};
