pub mod integration;

// Common test utilities and shared test setup
use sqlx::PgPool;
use std::sync::Once;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("debug")
            .try_init()
            .ok();
    });
}

pub struct TestContext {
    pub db_pool: PgPool,
}

impl TestContext {
    /// Connects to TEST_DATABASE_URL and starts from empty tables.
    /// Returns None when no test database is configured.
    pub async fn new() -> Option<Self> {
        let database_url = std::env::var("TEST_DATABASE_URL").ok()?;
        init_test_logging();

        let pool = PgPool::connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        let ctx = Self { db_pool: pool };
        ctx.cleanup().await;
        Some(ctx)
    }

    pub async fn cleanup(&self) {
        sqlx::query("TRUNCATE TABLE jobs, technicians, customers RESTART IDENTITY CASCADE")
            .execute(&self.db_pool)
            .await
            .expect("Failed to truncate tables");
    }
}
