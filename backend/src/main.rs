use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod database;
mod error;
mod handlers;
mod scheduling;
mod store;

pub use error::{ApiError, ApiResult, AppError};

use scheduling::{SchedulingService, SystemClock};
use store::{MemoryStore, PgStore, SchedulingStore};

#[cfg(test)]
mod tests;

pub struct AppState {
    pub scheduler: Arc<SchedulingService>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from_env()?;

    let store: Arc<dyn SchedulingStore> = match &config.database_url {
        Some(url) => {
            let pool_config = database::PoolConfig::from_env(config.storage_timeout);
            let db_pool = database::create_pool(url, pool_config).await?;
            database::migrate(&db_pool).await?;
            Arc::new(PgStore::new(db_pool, config.storage_timeout))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store with sample data");
            Arc::new(MemoryStore::with_sample_data().await)
        }
    };

    let scheduler = SchedulingService::new(store, config.scheduling.clone(), Arc::new(SystemClock));
    let app_state = Arc::new(AppState {
        scheduler: Arc::new(scheduler),
    });

    let app = handlers::app(app_state);

    let listener = tokio::net::TcpListener::bind(&config.server_addr).await?;
    tracing::info!("Server running on {}", config.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
