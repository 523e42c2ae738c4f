//! Live order state for signed-in sessions.

pub mod controller;
pub mod desk;
pub mod filter;
pub mod notice;
pub mod recent;
pub mod registry;

pub use controller::{CommandError, OrderSyncController, PendingMutation};
pub use desk::{DeskCommand, DeskHandle, spawn_desk};
pub use filter::{FilterState, StatusFilter};
pub use notice::{Notice, NoticeLevel};
pub use recent::spawn_recent_feed;
pub use registry::{DeskLease, DeskRegistry};
