use crate::config::DatabaseConfig;
use crate::error::AppResult;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;

/// Shared handle to the connection pool. Services clone the `Arc`, never
/// the connection itself.
pub type DbPool = Arc<DatabaseConnection>;

pub async fn create_pool(config: &DatabaseConfig) -> AppResult<DbPool> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let pool = Database::connect(options).await?;
    Ok(Arc::new(pool))
}

pub async fn run_migrations(pool: &DatabaseConnection) -> AppResult<()> {
    Migrator::up(pool, None).await?;
    log::info!("Database migrations applied");
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use sea_orm::{MockDatabase, Transaction};

    pub fn mock_pool(db: MockDatabase) -> DbPool {
        Arc::new(db.into_connection())
    }

    /// Statements recorded by a mock pool. Every service holding a clone of
    /// the pool must be dropped first.
    pub fn transaction_log(pool: DbPool) -> Vec<Transaction> {
        match Arc::try_unwrap(pool) {
            Ok(conn) => conn.into_transaction_log(),
            Err(_) => panic!("mock pool is still shared"),
        }
    }
}
