use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::spawn_blocking;
use tracing::debug;

use crate::error::DriverError;
use crate::pool::{Connection, Connector, PoolConfig};
use crate::results::CustomDbRow;
use crate::translation::PlaceholderStyle;
use crate::types::RowValues;

use super::params::{Params, sqlite_extract_value};

type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens `SQLite` database files; `PoolConfig::database` is the path.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteConnector;

#[async_trait]
impl Connector for SqliteConnector {
    async fn connect(&self, config: &PoolConfig) -> Result<Box<dyn Connection>, DriverError> {
        let path = config.database.clone();
        let autocommit = config.autocommit;
        let conn = spawn_blocking(move || -> Result<rusqlite::Connection, DriverError> {
            let conn = rusqlite::Connection::open(&path)?;
            conn.busy_timeout(BUSY_TIMEOUT)?;
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            Ok(conn)
        })
        .await
        .map_err(|e| DriverError::Task(format!("sqlite open join error: {e}")))??;
        debug!(path = %config.database, "opened sqlite connection");
        Ok(Box::new(SqliteConnection {
            conn: Arc::new(Mutex::new(conn)),
            autocommit,
        }))
    }
}

/// One `SQLite` connection; statements run on the blocking thread pool.
pub struct SqliteConnection {
    conn: SharedSqliteConnection,
    autocommit: bool,
}

impl SqliteConnection {
    fn handle(&self) -> SharedSqliteConnection {
        Arc::clone(&self.conn)
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Sqlite
    }

    async fn select(
        &mut self,
        sql: &str,
        params: &[RowValues],
        limit: Option<usize>,
    ) -> Result<Vec<CustomDbRow>, DriverError> {
        let sql_owned = sql.to_owned();
        let params = Params::convert(params);
        run_blocking(self.handle(), move |guard| {
            let mut stmt = guard.prepare(&sql_owned)?;
            let column_names: Arc<Vec<String>> = Arc::new(
                stmt.column_names()
                    .iter()
                    .map(std::string::ToString::to_string)
                    .collect(),
            );
            let col_count = column_names.len();
            let mut rows_iter = stmt.query(&params.as_refs()[..])?;
            let mut result = Vec::new();
            while limit.is_none_or(|n| result.len() < n) {
                let Some(row) = rows_iter.next()? else {
                    break;
                };
                let mut values = Vec::with_capacity(col_count);
                for i in 0..col_count {
                    values.push(sqlite_extract_value(row, i)?);
                }
                result.push(CustomDbRow::new(Arc::clone(&column_names), values));
            }
            Ok(result)
        })
        .await
    }

    async fn execute(&mut self, sql: &str, params: &[RowValues]) -> Result<usize, DriverError> {
        let sql_owned = sql.to_owned();
        let params = Params::convert(params);
        let autocommit = self.autocommit;
        run_blocking(self.handle(), move |guard| {
            if autocommit {
                let mut stmt = guard.prepare(&sql_owned)?;
                return Ok(stmt.execute(&params.as_refs()[..])?);
            }
            let tx = guard.transaction()?;
            let affected = {
                let mut stmt = tx.prepare(&sql_owned)?;
                stmt.execute(&params.as_refs()[..])?
            };
            tx.commit()?;
            Ok(affected)
        })
        .await
    }

    async fn ping(&mut self) -> Result<(), DriverError> {
        run_blocking(self.handle(), |guard| {
            guard.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await
    }
}

async fn run_blocking<F, R>(conn: SharedSqliteConnection, func: F) -> Result<R, DriverError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, DriverError> + Send + 'static,
    R: Send + 'static,
{
    spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| DriverError::Task(format!("sqlite spawn_blocking join error: {e}")))?
}
