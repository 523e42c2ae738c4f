// Template context structures for Askama templates, organized by page.

use actix_session::Session;
use chrono::Local;

use crate::auth::csrf;
use crate::auth::session::{require_user_email, take_flash};
use crate::dashboard::date_line;
use crate::errors::AppError;

pub const APP_NAME: &str = "OrderDesk";

/// Common context shared by all signed-in pages.
/// Templates access these as `ctx.email`, `ctx.csrf_token`, etc.
pub struct PageContext {
    pub email: String,
    pub avatar_initial: String,
    pub flash: Option<String>,
    pub app_name: &'static str,
    pub csrf_token: String,
    pub current_path: String,
    pub today_label: String,
}

impl PageContext {
    pub fn build(session: &Session, current_path: &str) -> Result<Self, AppError> {
        let email = require_user_email(session)?;
        let avatar_initial = email.chars().next().unwrap_or('?').to_uppercase().to_string();
        Ok(Self {
            avatar_initial,
            email,
            flash: take_flash(session),
            app_name: APP_NAME,
            csrf_token: csrf::get_or_create_token(session),
            current_path: current_path.to_string(),
            today_label: date_line(&Local::now()),
        })
    }

    pub fn is_active(&self, path: &str) -> bool {
        self.current_path == path
    }
}

mod common;
mod dashboard;
mod orders;

pub use common::*;
pub use dashboard::*;
pub use orders::*;
