use crate::config::AppConfig;
use crate::errors::ServiceError;
use metrics::{counter, gauge};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

pub type DbPool = DatabaseConnection;

/// Pool sizing and timeouts.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(8),
        }
    }
}

impl DbConfig {
    /// A small pool for one-shot tools such as the migration and seed binaries.
    pub fn for_tool(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 2,
            ..Default::default()
        }
    }
}

impl From<&AppConfig> for DbConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            url: cfg.database_url.clone(),
            max_connections: cfg.db_max_connections,
            min_connections: cfg.db_min_connections,
            connect_timeout: Duration::from_secs(cfg.db_connect_timeout_secs),
            idle_timeout: Duration::from_secs(cfg.db_idle_timeout_secs),
            acquire_timeout: Duration::from_secs(cfg.db_acquire_timeout_secs),
        }
    }
}

/// Opens a pool against `config.url` (SQLite or PostgreSQL).
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, ServiceError> {
    let backend = config.url.split(':').next().unwrap_or("unknown");
    debug!(backend, max = config.max_connections, min = config.min_connections, "opening pool");

    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .sqlx_logging(false);

    let pool = Database::connect(opt).await.map_err(|e| {
        error!(backend, error = %e, "database connection failed");
        ServiceError::DatabaseError(e)
    })?;

    gauge!("powerloom.db.max_connections", f64::from(config.max_connections));
    info!(backend, "database pool ready");
    Ok(pool)
}

pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, ServiceError> {
    establish_connection_with_config(&DbConfig::from(cfg)).await
}

/// Applies every pending migration. Safe to call repeatedly.
pub async fn run_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    let started = Instant::now();
    let pending = crate::migrator::Migrator::get_pending_migrations(pool)
        .await
        .map(|m| m.len())
        .unwrap_or(0);

    crate::migrator::Migrator::up(pool, None).await.map_err(|e| {
        error!(error = %e, "migrations failed");
        ServiceError::DatabaseError(e)
    })?;

    info!(applied = pending, elapsed_ms = started.elapsed().as_millis() as u64, "migrations up to date");
    Ok(())
}

/// Pings the pool, recording latency or a failure count.
pub async fn check_connection(pool: &DbPool) -> Result<Duration, ServiceError> {
    let started = Instant::now();
    match pool.ping().await {
        Ok(()) => {
            let elapsed = started.elapsed();
            gauge!("powerloom.db.ping_ms", elapsed.as_secs_f64() * 1000.0);
            Ok(elapsed)
        }
        Err(e) => {
            counter!("powerloom.db.ping_failures", 1);
            Err(ServiceError::DatabaseError(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_sqlite_connects_and_migrates() {
        let pool = establish_connection_with_config(&DbConfig {
            url: "sqlite::memory:".into(),
            max_connections: 1,
            ..Default::default()
        })
        .await
        .expect("connect");

        check_connection(&pool).await.expect("ping");
        run_migrations(&pool).await.expect("migrate");
        // Re-running is a no-op.
        run_migrations(&pool).await.expect("migrate twice");
    }

    #[tokio::test]
    async fn unreachable_database_is_reported() {
        let err = check_connection(&DatabaseConnection::Disconnected)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "DATABASE_ERROR");
    }
}
