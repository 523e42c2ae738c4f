//! HTTP tests: routing, the auth gate, login and the order endpoints, run
//! through the real route table with a cookie session.

mod common;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use std::sync::Arc;
use std::time::Duration;

use orderdesk::auth::password;
use orderdesk::auth::rate_limit::LoginLimiter;
use orderdesk::config::AdminAccount;
use orderdesk::handlers;
use orderdesk::store::OrderStore;
use orderdesk::sync::{DeskRegistry, spawn_recent_feed};
use common::*;

macro_rules! test_app {
    () => {
        test_app!(sample_store())
    };
    ($store:expr) => {{
        let store: Arc<dyn OrderStore> = as_dyn(&$store);
        let recent = spawn_recent_feed(Arc::clone(&store), 5);
        let registry = DeskRegistry::new(Arc::clone(&store), Duration::from_secs(600));
        let admin = AdminAccount {
            email: ADMIN_EMAIL.to_string(),
            password_hash: password::hash_password(ADMIN_PASS).expect("Failed to hash password"),
        };
        test::init_service(
            App::new()
                .wrap(
                    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
                        .cookie_secure(false)
                        .build(),
                )
                .app_data(web::Data::from(store))
                .app_data(web::Data::new(recent))
                .app_data(web::Data::new(registry))
                .app_data(web::Data::new(LoginLimiter::default()))
                .app_data(web::Data::new(admin))
                .configure(handlers::configure),
        )
        .await
    }};
}

/// The session cookie set by `resp`, or `previous` if it did not set one.
fn session_cookie<B>(resp: &ServiceResponse<B>, previous: Option<Cookie<'static>>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == "id")
        .map(|c| c.into_owned())
        .or(previous)
}

fn location<B>(resp: &ServiceResponse<B>) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Pull the hidden CSRF field out of a rendered form.
fn csrf_from(html: &str) -> String {
    let marker = r#"name="csrf_token" value=""#;
    let start = html.find(marker).expect("page has a CSRF field") + marker.len();
    let end = html[start..].find('"').expect("CSRF value is terminated") + start;
    html[start..end].to_string()
}

// ============================================================================
// AUTH GATE
// ============================================================================

#[actix_rt::test]
async fn test_protected_routes_redirect_to_login() {
    let app = test_app!();

    for uri in ["/dashboard", "/orders", "/orders/view", "/orders/export", "/dashboard/chart"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location(&resp), "/login", "{uri}");
    }
}

#[actix_rt::test]
async fn test_root_redirects_to_dashboard() {
    let app = test_app!();
    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard");
}

#[actix_rt::test]
async fn test_login_page_renders_form() {
    let app = test_app!();
    let req = test::TestRequest::get().uri("/login").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = test::read_body(resp).await;
    let html = std::str::from_utf8(&body).expect("utf-8 page");
    assert_eq!(csrf_from(html).len(), 64);
    assert!(html.contains(r#"name="password""#));
}

#[actix_rt::test]
async fn test_login_without_csrf_is_forbidden() {
    let app = test_app!();
    let req = test::TestRequest::post()
        .uri("/login")
        .set_form([("email", ADMIN_EMAIL), ("password", ADMIN_PASS), ("csrf_token", "forged")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

// ============================================================================
// SIGNED-IN FLOW
// ============================================================================

/// Sign in as the admin and return the session cookie plus the CSRF token.
macro_rules! sign_in {
    ($app:expr) => {{
        let app = &$app;
        let resp = test::call_service(app, test::TestRequest::get().uri("/login").to_request()).await;
        let cookie = session_cookie(&resp, None).expect("login page sets a session");
        let body = test::read_body(resp).await;
        let token = csrf_from(std::str::from_utf8(&body).expect("utf-8 page"));

        let req = test::TestRequest::post()
            .uri("/login")
            .cookie(cookie.clone())
            .set_form([("email", ADMIN_EMAIL), ("password", ADMIN_PASS), ("csrf_token", token.as_str())])
            .to_request();
        let resp = test::call_service(app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/dashboard");
        let cookie = session_cookie(&resp, Some(cookie)).expect("signed-in session");
        (cookie, token)
    }};
}

#[actix_rt::test]
async fn test_wrong_password_shows_error() {
    let app = test_app!();
    let resp = test::call_service(&app, test::TestRequest::get().uri("/login").to_request()).await;
    let cookie = session_cookie(&resp, None).expect("login page sets a session");
    let body = test::read_body(resp).await;
    let token = csrf_from(std::str::from_utf8(&body).expect("utf-8 page"));

    let req = test::TestRequest::post()
        .uri("/login")
        .cookie(cookie)
        .set_form([("email", ADMIN_EMAIL), ("password", "not-it"), ("csrf_token", token.as_str())])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert!(std::str::from_utf8(&body).expect("utf-8 page").contains("Invalid email or password"));
}

#[actix_rt::test]
async fn test_signed_in_pages_render() {
    let app = test_app!();
    let (cookie, _) = sign_in!(app);

    let req = test::TestRequest::get().uri("/orders").cookie(cookie.clone()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = session_cookie(&resp, Some(cookie)).expect("session kept");
    let body = test::read_body(resp).await;
    assert!(std::str::from_utf8(&body).expect("utf-8 page").contains("orders-root"));

    let req = test::TestRequest::get().uri("/dashboard").cookie(cookie.clone()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/dashboard/chart?period=30")
        .cookie(cookie)
        .to_request();
    let series: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(series["labels"].as_array().map(|a| a.len()), Some(4));
}

#[actix_rt::test]
async fn test_dashboard_marks_metrics_it_could_not_load() {
    let store = sample_store();
    let app = test_app!(store.clone());
    let (cookie, _) = sign_in!(app);

    store.fail_next_fetch("connection reset");
    let req = test::TestRequest::get().uri("/dashboard").cookie(cookie.clone()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    let html = std::str::from_utf8(&body).expect("utf-8 page");
    assert!(html.contains("data-metrics-error"));
    assert!(html.contains("Failed to load today&#x27;s orders") || html.contains("Failed to load today's orders"));
    assert!(html.contains(r#"id="today-orders" class="metric-value">N/A<"#));
    assert!(!html.contains("No sales yet today"));

    // The next load reads the store again.
    let req = test::TestRequest::get().uri("/dashboard").cookie(cookie).to_request();
    let resp = test::call_service(&app, req).await;
    let body = test::read_body(resp).await;
    let html = std::str::from_utf8(&body).expect("utf-8 page");
    assert!(!html.contains("data-metrics-error"));
    assert!(!html.contains(r#"id="today-orders" class="metric-value">N/A<"#));
}

#[actix_rt::test]
async fn test_invalid_status_filter_is_bad_request() {
    let app = test_app!();
    let (cookie, _) = sign_in!(app);

    let req = test::TestRequest::get()
        .uri("/orders/view?status=cancelled")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_export_is_a_csv_download() {
    let app = test_app!();
    let (cookie, _) = sign_in!(app);

    let req = test::TestRequest::get().uri("/orders/export").cookie(cookie).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let disposition = resp
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains("orders_"));

    let body = test::read_body(resp).await;
    assert!(std::str::from_utf8(&body).expect("utf-8 csv").starts_with("\"Order Number\""));
}

#[actix_rt::test]
async fn test_actions_require_the_csrf_header() {
    let app = test_app!();
    let (cookie, token) = sign_in!(app);

    let req = test::TestRequest::post().uri("/orders/refresh").cookie(cookie.clone()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/orders/refresh")
        .cookie(cookie.clone())
        .insert_header(("X-CSRF-Token", token.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // Nothing staged: confirming is a no-op.
    let req = test::TestRequest::post()
        .uri("/orders/delete/confirm")
        .cookie(cookie.clone())
        .insert_header(("X-CSRF-Token", token.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::post()
        .uri("/orders/action")
        .cookie(cookie)
        .insert_header(("X-CSRF-Token", token.as_str()))
        .set_form([("action", "explode"), ("order_id", "o1")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_logout_ends_the_session() {
    let app = test_app!();
    let (cookie, token) = sign_in!(app);

    let req = test::TestRequest::post()
        .uri("/logout")
        .cookie(cookie)
        .set_form([("csrf_token", token.as_str())])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");

    let cleared = resp
        .response()
        .cookies()
        .find(|c| c.name() == "id")
        .map(|c| c.value().is_empty())
        .unwrap_or(false);
    assert!(cleared);
}
