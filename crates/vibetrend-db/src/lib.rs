use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;

pub mod ledger;

pub use ledger::{
    filter_new, get_entry, ledger_stats, mark_analyzed, mark_failed, record_analysis,
    recover_interrupted, LedgerRow, LedgerStats,
};

const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/vibetrend-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    #[error("ledger entry {fingerprint} has unrecognized status '{value}'")]
    InvalidStatus { fingerprint: String, value: String },
    #[error("cannot mark {fingerprint} as '{status}'")]
    InvalidTransition {
        fingerprint: String,
        status: &'static str,
    },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Open the ledger database.
///
/// The pool holds exactly one connection that is never recycled: all ledger
/// mutations are serialized through it, and `sqlite::memory:` databases stay
/// alive for the lifetime of the pool.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the URL is malformed or the file cannot be opened.
pub async fn connect_pool(database_url: &str) -> Result<SqlitePool, DbError> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .acquire_timeout(Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS))
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Run all pending migrations against the pool.
///
/// Returns the number of migrations that were applied.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &SqlitePool) -> Result<usize, sqlx::migrate::MigrateError> {
    // The _sqlx_migrations table does not exist on a fresh database; treat
    // absence as zero applied.
    let applied_before: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    MIGRATOR.run(pool).await?;

    let applied_after: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    let delta = (applied_after - applied_before).max(0);
    Ok(usize::try_from(delta).unwrap_or(0))
}

/// Connect and migrate in one step.
///
/// # Errors
///
/// Returns [`DbError`] if either the connection or a migration fails.
pub async fn open_ledger(database_url: &str) -> Result<SqlitePool, DbError> {
    let pool = connect_pool(database_url).await?;
    let applied = run_migrations(&pool).await?;
    if applied > 0 {
        tracing::info!(applied, "applied ledger migrations");
    }
    Ok(pool)
}
