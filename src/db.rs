use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::models::order::{NewOrder, queries};
use crate::store::{MemoryOrderStore, OrderStore, PgOrderStore};
use std::sync::Arc;

pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(8)
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    log::info!("Database migrations complete");
    Ok(())
}

/// Seed the restaurant with the demo orders if it has none yet.
pub async fn seed_demo_orders(pool: &PgPool, restaurant_id: &str) -> Result<(), sqlx::Error> {
    let count = queries::count(pool, restaurant_id).await?;
    if count > 0 {
        log::info!("Restaurant {restaurant_id} already has {count} orders, skipping demo seed");
        return Ok(());
    }
    let demo = MemoryOrderStore::with_demo_data(chrono::Utc::now()).orders();
    for order in &demo {
        let new = NewOrder {
            order_number: order.order_number.clone(),
            table_number: order.table_number.clone(),
            status: order.status,
            items: order.items().to_vec(),
            timestamp: order.timestamp,
        };
        queries::insert(pool, restaurant_id, &order.id, &new).await?;
    }
    log::info!("Seeded {} demo orders for {restaurant_id}", demo.len());
    Ok(())
}

/// The store named by the configuration, connected and migrated.
pub async fn open_store(
    database_url: &str,
    restaurant_id: &str,
    seed: bool,
) -> Result<Arc<dyn OrderStore>, Box<dyn std::error::Error>> {
    let pool = init_pool(database_url).await?;
    run_migrations(&pool).await?;
    if seed {
        seed_demo_orders(&pool, restaurant_id).await?;
    }
    Ok(Arc::new(PgOrderStore::new(pool, restaurant_id)))
}
