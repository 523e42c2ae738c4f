use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpServer, cookie::Key, middleware, web};
use askama::Template;
use std::sync::Arc;
use std::time::Duration;

use orderdesk::auth::rate_limit::LoginLimiter;
use orderdesk::config::{AppConfig, StoreBackend};
use orderdesk::dashboard::RECENT_ORDERS;
use orderdesk::store::{MemoryOrderStore, OrderStore};
use orderdesk::sync::{DeskRegistry, spawn_recent_feed};
use orderdesk::templates_structs::{APP_NAME, NotFoundTemplate};
use orderdesk::{db, handlers};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            log::error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    let store: Arc<dyn OrderStore> = match config.backend {
        StoreBackend::Memory => {
            log::info!("Using the in-memory order store with demo data");
            Arc::new(MemoryOrderStore::with_demo_data(chrono::Utc::now()))
        }
        StoreBackend::Postgres => {
            let url = config.database_url.as_deref().unwrap_or_default();
            match db::open_store(url, &config.restaurant_id, config.seed_demo).await {
                Ok(store) => store,
                Err(e) => {
                    log::error!("Failed to open the order database: {e}");
                    std::process::exit(1);
                }
            }
        }
    };

    let recent = spawn_recent_feed(Arc::clone(&store), RECENT_ORDERS);
    let registry = DeskRegistry::new(Arc::clone(&store), config.desk_idle_timeout);
    registry.spawn_sweeper(SWEEP_INTERVAL);
    let limiter = LoginLimiter::default();

    // Session encryption key: load from SESSION_KEY for sessions that survive restarts
    let secret_key = match config.session_key.as_deref() {
        Some(val) if val.len() >= 64 => {
            log::info!("Using SESSION_KEY from environment");
            Key::from(val.as_bytes())
        }
        Some(val) => {
            log::warn!("SESSION_KEY too short ({} bytes, need 64+), generating random key", val.len());
            Key::generate()
        }
        None => {
            log::warn!("No SESSION_KEY set, generating random key (sessions lost on restart)");
            Key::generate()
        }
    };

    let not_found = NotFoundTemplate { app_name: APP_NAME }
        .render()
        .unwrap_or_else(|_| "Not Found".to_string());

    log::info!("Serving {} on http://{}", config.restaurant_id, config.bind);

    let store_data = web::Data::from(store);
    let recent_data = web::Data::new(recent);
    let registry_data = web::Data::new(registry);
    let limiter_data = web::Data::new(limiter);
    let admin_data = web::Data::new(config.admin.clone());

    HttpServer::new(move || {
        let session_mw = SessionMiddleware::builder(
            CookieSessionStore::default(),
            secret_key.clone(),
        )
        .cookie_secure(false)
        .cookie_http_only(true)
        .build();
        let not_found = not_found.clone();

        App::new()
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .app_data(store_data.clone())
            .app_data(recent_data.clone())
            .app_data(registry_data.clone())
            .app_data(limiter_data.clone())
            .app_data(admin_data.clone())
            .service(actix_files::Files::new("/static", "./static"))
            .configure(handlers::configure)
            // Default 404 handler (must be registered last)
            .default_service(web::to(move || {
                let html = not_found.clone();
                async move {
                    actix_web::HttpResponse::NotFound()
                        .content_type("text/html; charset=utf-8")
                        .body(html)
                }
            }))
    })
    .bind(&config.bind)?
    .run()
    .await
}
