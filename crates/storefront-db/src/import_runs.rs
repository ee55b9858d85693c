//! Database operations for `import_runs`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `import_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ImportRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub owner_id: Uuid,
    pub source_file: String,
    pub status: String,
    pub total_products: i32,
    pub succeeded_products: i32,
    pub failed_products: i32,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Final tallies recorded when a run finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportRunTotals {
    pub total: i32,
    pub succeeded: i32,
    pub failed: i32,
}

const RUN_COLUMNS: &str = "id, public_id, owner_id, source_file, status, total_products, \
                           succeeded_products, failed_products, error_message, started_at, \
                           completed_at, created_at";

/// Creates a new import run in `queued` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_import_run(
    pool: &PgPool,
    owner_id: Uuid,
    source_file: &str,
) -> Result<ImportRunRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, ImportRunRow>(&format!(
        "INSERT INTO import_runs (public_id, owner_id, source_file, status) \
         VALUES ($1, $2, $3, 'queued') \
         RETURNING {RUN_COLUMNS}"
    ))
    .bind(public_id)
    .bind(owner_id)
    .bind(source_file)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a run as `running`, sets `started_at = NOW()` and records how many
/// products the run will attempt.
///
/// # Errors
///
/// Returns [`DbError::InvalidImportRunTransition`] if the run is not `queued`,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn start_import_run(pool: &PgPool, id: i64, total_products: i32) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE import_runs \
         SET status = 'running', started_at = NOW(), total_products = $1 \
         WHERE id = $2 AND status = 'queued'",
    )
    .bind(total_products)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidImportRunTransition {
            id,
            expected_status: "queued",
        });
    }

    Ok(())
}

/// Marks a run as `succeeded` with its final tallies.
///
/// # Errors
///
/// Returns [`DbError::InvalidImportRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_import_run(
    pool: &PgPool,
    id: i64,
    totals: ImportRunTotals,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE import_runs \
         SET status = 'succeeded', completed_at = NOW(), total_products = $1, \
             succeeded_products = $2, failed_products = $3 \
         WHERE id = $4 AND status = 'running'",
    )
    .bind(totals.total)
    .bind(totals.succeeded)
    .bind(totals.failed)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidImportRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a run as `failed`, keeping whatever tallies were reached.
///
/// # Errors
///
/// Returns [`DbError::InvalidImportRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_import_run(
    pool: &PgPool,
    id: i64,
    totals: ImportRunTotals,
    error_message: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE import_runs \
         SET status = 'failed', completed_at = NOW(), total_products = $1, \
             succeeded_products = $2, failed_products = $3, error_message = $4 \
         WHERE id = $5 AND status = 'running'",
    )
    .bind(totals.total)
    .bind(totals.succeeded)
    .bind(totals.failed)
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidImportRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_import_run(pool: &PgPool, id: i64) -> Result<ImportRunRow, DbError> {
    let row = sqlx::query_as::<_, ImportRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM import_runs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the most recent `limit` runs, optionally restricted to one owner.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_import_runs(
    pool: &PgPool,
    owner_id: Option<Uuid>,
    limit: i64,
) -> Result<Vec<ImportRunRow>, DbError> {
    let rows = sqlx::query_as::<_, ImportRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM import_runs \
         WHERE ($1::UUID IS NULL OR owner_id = $1) \
         ORDER BY created_at DESC, id DESC \
         LIMIT $2"
    ))
    .bind(owner_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
