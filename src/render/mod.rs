pub mod orders;
pub mod recent;
pub mod time_ago;

pub use self::orders::{
    CURRENCY, CardAction, DeskStats, OrderCard, OrdersView, StagedDelete, card_actions,
    format_amount,
};
pub use self::time_ago::{time_ago, time_ago_in};
