use std::time::Duration;

use crate::config::Config;
use crate::error::Result;
use sqlx::{postgres::PgPoolOptions, PgPool};

pub async fn create_pool(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(config.db_timeout.max(Duration::from_secs(1)))
        .connect(&config.database_url)
        .await?;
    Ok(pool)
}
