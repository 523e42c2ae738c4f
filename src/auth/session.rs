use actix_session::Session;

use crate::errors::AppError;

pub const USER_EMAIL: &str = "user_email";
pub const DESK_ID: &str = "desk_id";
const FLASH: &str = "flash";

pub fn get_user_email(session: &Session) -> Option<String> {
    session.get::<String>(USER_EMAIL).unwrap_or(None)
}

/// The signed-in email, or a session error for pages behind `require_auth`.
pub fn require_user_email(session: &Session) -> Result<String, AppError> {
    get_user_email(session).ok_or_else(|| AppError::Session("No user in session".to_string()))
}

pub fn get_desk_id(session: &Session) -> Option<String> {
    session.get::<String>(DESK_ID).unwrap_or(None)
}

pub fn set_desk_id(session: &Session, desk_id: &str) -> Result<(), AppError> {
    session
        .insert(DESK_ID, desk_id)
        .map_err(|e| AppError::Session(format!("Failed to store desk id: {e}")))
}

pub fn sign_in(session: &Session, email: &str, desk_id: &str) -> Result<(), AppError> {
    session.renew();
    session
        .insert(USER_EMAIL, email)
        .map_err(|e| AppError::Session(format!("Failed to store user: {e}")))?;
    set_desk_id(session, desk_id)
}

pub fn set_flash(session: &Session, message: &str) {
    let _ = session.insert(FLASH, message);
}

pub fn take_flash(session: &Session) -> Option<String> {
    let flash = session.get::<String>(FLASH).unwrap_or(None);
    if flash.is_some() {
        session.remove(FLASH);
    }
    flash
}
