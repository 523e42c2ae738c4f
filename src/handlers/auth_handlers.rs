use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;

use super::see_other;
use crate::auth::session::{get_desk_id, get_user_email, sign_in};
use crate::auth::{csrf, password, rate_limit::LoginLimiter, validate};
use crate::config::AdminAccount;
use crate::errors::{AppError, render};
use crate::sync::DeskRegistry;
use crate::templates_structs::{APP_NAME, LoginTemplate};

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub csrf_token: String,
}

#[derive(Deserialize)]
pub struct CsrfOnly {
    pub csrf_token: String,
}

fn login_form(session: &Session, error: Option<String>, email: &str) -> Result<HttpResponse, AppError> {
    let tmpl = LoginTemplate {
        error,
        app_name: APP_NAME,
        csrf_token: csrf::get_or_create_token(session),
        email: email.to_string(),
    };
    render(tmpl)
}

pub async fn login_page(session: Session) -> Result<HttpResponse, AppError> {
    if get_user_email(&session).is_some() {
        return Ok(see_other("/dashboard"));
    }
    login_form(&session, None, "")
}

pub async fn login_submit(
    req: HttpRequest,
    session: Session,
    form: web::Form<LoginForm>,
    limiter: web::Data<LoginLimiter>,
    admin: web::Data<AdminAccount>,
    registry: web::Data<DeskRegistry>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let ip = req
        .peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED));

    if limiter.is_blocked(ip) {
        log::warn!("Login blocked for {ip}: too many failed attempts");
        return login_form(
            &session,
            Some("Too many failed login attempts. Please try again later.".to_string()),
            &form.email,
        );
    }

    if let Some(err) = validate::validate_login(&form.email, &form.password) {
        return login_form(&session, Some(err), &form.email);
    }

    let valid = password::check_credentials(&admin, &form.email, &form.password).unwrap_or_else(|e| {
        log::error!("Admin password hash is unusable: {e}");
        false
    });
    if !valid {
        limiter.record_failure(ip);
        log::info!("Failed login for {}", form.email.trim());
        return login_form(&session, Some("Invalid email or password".to_string()), &form.email);
    }

    limiter.clear(ip);
    if let Some(old) = get_desk_id(&session) {
        registry.close(&old).await;
    }
    let (desk_id, _) = registry.open();
    sign_in(&session, &admin.email, &desk_id)?;
    log::info!("{} signed in", admin.email);
    Ok(see_other("/dashboard"))
}

pub async fn logout(
    session: Session,
    form: web::Form<CsrfOnly>,
    registry: web::Data<DeskRegistry>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    if let Some(desk_id) = get_desk_id(&session) {
        registry.close(&desk_id).await;
    }
    session.purge();
    Ok(see_other("/login"))
}
