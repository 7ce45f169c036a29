//! Read-only access to the ledger database
//!
//! Queries never fail the caller. A failed query is logged and yields an empty
//! result; a row that does not decode is logged and skipped so one bad record
//! never aborts a listing.

use std::time::Duration;

use futures_util::StreamExt;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::{Query, QueryScalar};
use sqlx::{FromRow, PgPool, Postgres};
use tracing::{error, info, warn};

use crate::config::Config;

pub mod rows;

pub async fn connect(config: &Config) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&config.database_url)
        .await?;

    info!(max_connections = config.db_max_connections, "database pool ready");
    Ok(pool)
}

/// Stream every row of `query`, decoding each independently.
pub async fn fetch_lenient<'q, T>(
    pool: &PgPool,
    query: Query<'q, Postgres, PgArguments>,
    what: &'static str,
) -> Vec<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let mut rows = query.fetch(pool);
    let mut out = Vec::new();

    while let Some(row) = rows.next().await {
        match row {
            Ok(row) => match T::from_row(&row) {
                Ok(value) => out.push(value),
                Err(e) => warn!(query = what, error = %e, "skipping undecodable row"),
            },
            Err(e) => {
                error!(query = what, error = %e, "query failed");
                break;
            }
        }
    }

    out
}

/// First row of `query`, or `None` when there is none or it cannot be read.
pub async fn fetch_optional<'q, T>(
    pool: &PgPool,
    query: Query<'q, Postgres, PgArguments>,
    what: &'static str,
) -> Option<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    match query.fetch_optional(pool).await {
        Ok(Some(row)) => match T::from_row(&row) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(query = what, error = %e, "undecodable row");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            error!(query = what, error = %e, "query failed");
            None
        }
    }
}

/// Single scalar such as a count; the zero value on any failure.
pub async fn fetch_scalar<'q, O>(
    pool: &PgPool,
    query: QueryScalar<'q, Postgres, O, PgArguments>,
    what: &'static str,
) -> O
where
    O: Default + Send + Unpin,
    (O,): Send + Unpin + for<'r> FromRow<'r, PgRow>,
{
    match query.fetch_optional(pool).await {
        Ok(value) => value.unwrap_or_default(),
        Err(e) => {
            error!(query = what, error = %e, "scalar query failed");
            O::default()
        }
    }
}
