use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use async_trait::async_trait;
use deadpool::managed::Object;
use tokio::sync::watch;

use crate::error::DriverError;
use crate::results::CustomDbRow;
use crate::translation::PlaceholderStyle;
use crate::types::RowValues;

use super::config::PoolConfig;
use super::manager::ConnectionManager;

/// One live database session, as seen by the executor.
///
/// Statements arrive already translated to [`Connection::placeholder_style`].
#[async_trait]
pub trait Connection: Send {
    fn placeholder_style(&self) -> PlaceholderStyle;

    /// Run a query and return up to `limit` rows (all rows when `None`).
    async fn select(
        &mut self,
        sql: &str,
        params: &[RowValues],
        limit: Option<usize>,
    ) -> Result<Vec<CustomDbRow>, DriverError>;

    /// Run a statement and return the affected row count reported by the driver.
    async fn execute(&mut self, sql: &str, params: &[RowValues]) -> Result<usize, DriverError>;

    /// Cheap liveness check used when a pooled connection is reused.
    async fn ping(&mut self) -> Result<(), DriverError>;
}

/// Opens new [`Connection`]s for the pool.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, config: &PoolConfig) -> Result<Box<dyn Connection>, DriverError>;
}

/// Counts one outstanding borrow (or a pending borrow attempt) for as long as it lives.
pub(crate) struct BorrowTicket {
    borrowed: Arc<watch::Sender<usize>>,
}

impl BorrowTicket {
    pub(crate) fn new(borrowed: &Arc<watch::Sender<usize>>) -> Self {
        borrowed.send_modify(|n| *n += 1);
        Self {
            borrowed: Arc::clone(borrowed),
        }
    }
}

impl Drop for BorrowTicket {
    fn drop(&mut self) {
        self.borrowed.send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// A connection exclusively borrowed from the [`Pool`](crate::Pool).
///
/// Dropping the handle returns the connection, whether the borrowing task finished,
/// failed, or was cancelled mid-statement.
pub struct PooledConnection {
    // Field order matters: the connection goes back to the pool before the borrow is
    // released, so `shutdown` never observes zero borrows while one is still out.
    conn: Object<ConnectionManager>,
    _ticket: BorrowTicket,
}

impl PooledConnection {
    pub(crate) fn new(conn: Object<ConnectionManager>, ticket: BorrowTicket) -> Self {
        Self {
            conn,
            _ticket: ticket,
        }
    }
}

impl Deref for PooledConnection {
    type Target = dyn Connection;

    fn deref(&self) -> &Self::Target {
        &**self.conn
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut **self.conn
    }
}

impl std::fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("placeholder_style", &self.conn.placeholder_style())
            .finish()
    }
}
