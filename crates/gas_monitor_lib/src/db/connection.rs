use crate::error::AnalyticsError;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{ConnectOptions, SqliteConnection, SqlitePool};
use std::str::FromStr;
use std::time::Duration;

static MIGRATOR: Migrator = sqlx::migrate!();

pub const DEFAULT_SLOW_QUERY_THRESHOLD_MS: u64 = 1000;

fn sqlite_connect_options(
    file_name: Option<&str>,
    slow_query_threshold_ms: u64,
) -> Result<SqliteConnectOptions, AnalyticsError> {
    let url = if let Some(file_name) = file_name {
        format!("sqlite://{}", file_name)
    } else {
        "sqlite::memory:".to_string()
    };

    let mut options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);
    options
        .log_statements(log::LevelFilter::Debug)
        .log_slow_statements(
            log::LevelFilter::Warn,
            Duration::from_millis(slow_query_threshold_ms),
        );
    Ok(options)
}

pub async fn create_sqlite_connection(
    file_name: Option<&str>,
    run_migrations: bool,
) -> Result<SqliteConnection, AnalyticsError> {
    let options = sqlite_connect_options(file_name, DEFAULT_SLOW_QUERY_THRESHOLD_MS)?;
    let mut conn = options.connect().await?;

    if run_migrations {
        MIGRATOR.run(&mut conn).await?;
    }

    Ok(conn)
}

pub async fn create_sqlite_pool(
    file_name: Option<&str>,
    max_connections: u32,
    slow_query_threshold_ms: u64,
    run_migrations: bool,
) -> Result<SqlitePool, AnalyticsError> {
    let options = sqlite_connect_options(file_name, slow_query_threshold_ms)?;
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
        .connect_with(options)
        .await?;

    if run_migrations {
        MIGRATOR.run(&pool).await?;
    }

    Ok(pool)
}
