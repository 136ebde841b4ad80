//! Borrow, translate, run, release: the single path every statement takes to the driver.

use tracing::info;

use crate::error::SqlModelError;
use crate::pool::Pool;
use crate::results::CustomDbRow;
use crate::translation::to_vendor_dialect;
use crate::types::RowValues;

/// Run a query written with portable `?` placeholders.
///
/// Borrows a connection for the duration of the statement only, fetches all rows (or at
/// most `size`), and returns them keyed by column name.
///
/// # Errors
///
/// Pool errors from acquiring the connection; driver errors are passed through unchanged.
pub async fn select(
    pool: &Pool,
    sql: &str,
    args: &[RowValues],
    size: Option<usize>,
) -> Result<Vec<CustomDbRow>, SqlModelError> {
    info!(sql, ?args, "SQL");
    let mut conn = pool.acquire().await?;
    let translated = to_vendor_dialect(sql, conn.placeholder_style());
    let rows = conn.select(translated.as_ref(), args, size).await?;
    info!(rows = rows.len(), "rows returned");
    Ok(rows)
}

/// Run an insert/update/delete written with portable `?` placeholders.
///
/// Returns the affected row count reported by the driver. There is no retry; on error
/// the connection is still returned to the pool before the error reaches the caller.
///
/// # Errors
///
/// Pool errors from acquiring the connection; driver errors are passed through unchanged.
pub async fn execute(pool: &Pool, sql: &str, args: &[RowValues]) -> Result<usize, SqlModelError> {
    info!(sql, ?args, "SQL");
    let mut conn = pool.acquire().await?;
    let translated = to_vendor_dialect(sql, conn.placeholder_style());
    let affected = conn.execute(translated.as_ref(), args).await?;
    Ok(affected)
}
