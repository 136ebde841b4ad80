//! Process-wide connection pool with an explicit Uninitialized → Ready → Closed lifecycle.

use std::sync::{Arc, Mutex, MutexGuard};

use deadpool::managed::{Pool as ManagedPool, PoolError as ManagedPoolError};
use tokio::sync::watch;
use tracing::info;

use crate::error::{PoolError, SqlModelError};

pub mod config;
mod connection;
mod manager;

pub use config::PoolConfig;
pub use connection::{Connection, Connector, PooledConnection};
pub use manager::ConnectionManager;

use connection::BorrowTicket;

enum PoolState {
    Uninitialized,
    Ready(ManagedPool<ConnectionManager>),
    Closed,
}

struct PoolInner {
    connector: Arc<dyn Connector>,
    state: Mutex<PoolState>,
    borrowed: Arc<watch::Sender<usize>>,
}

/// Handle to the shared connection pool.
///
/// Cloning is cheap and every clone refers to the same pool. The handle starts
/// uninitialized; [`Pool::initialize`] opens it and [`Pool::shutdown`] closes it for good.
///
/// ```rust,no_run
/// use sql_model::prelude::*;
///
/// # async fn demo() -> Result<(), SqlModelError> {
/// let pool = Pool::sqlite();
/// pool.initialize(PoolConfig::new("", "", "app.db")).await?;
/// let mut conn = pool.acquire().await?;
/// conn.execute("create table if not exists t (id int)", &[]).await?;
/// drop(conn);
/// pool.shutdown().await?;
/// # Ok(()) }
/// ```
#[derive(Clone)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

impl std::fmt::Debug for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*self.lock_state() {
            PoolState::Uninitialized => "Uninitialized",
            PoolState::Ready(_) => "Ready",
            PoolState::Closed => "Closed",
        };
        f.debug_struct("Pool")
            .field("state", &state)
            .field("borrowed", &*self.inner.borrowed.borrow())
            .finish()
    }
}

impl Pool {
    /// Create an uninitialized pool that will open connections through `connector`.
    #[must_use]
    pub fn new(connector: impl Connector + 'static) -> Self {
        let (borrowed, _) = watch::channel(0_usize);
        Self {
            inner: Arc::new(PoolInner {
                connector: Arc::new(connector),
                state: Mutex::new(PoolState::Uninitialized),
                borrowed: Arc::new(borrowed),
            }),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, PoolState> {
        match self.inner.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Open the pool and eagerly establish `config.min_size` connections.
    ///
    /// # Errors
    ///
    /// * `PoolError::AlreadyInitialized` if the pool is already open.
    /// * `PoolError::Closed` if the pool has been shut down; pools are not reopened.
    /// * `SqlModelError::ConfigError` for invalid sizing.
    /// * `DriverError` if one of the initial connections cannot be opened; the pool
    ///   then stays uninitialized.
    pub async fn initialize(&self, config: PoolConfig) -> Result<(), SqlModelError> {
        config.validate()?;
        let min_size = config.min_size;
        let max_size = config.max_size;
        let database = config.database.clone();

        let managed = {
            let mut state = self.lock_state();
            match &*state {
                PoolState::Ready(_) => return Err(PoolError::AlreadyInitialized.into()),
                PoolState::Closed => return Err(PoolError::Closed.into()),
                PoolState::Uninitialized => {}
            }
            let manager = ConnectionManager::new(Arc::clone(&self.inner.connector), config);
            let managed = ManagedPool::builder(manager)
                .max_size(max_size)
                .build()
                .map_err(|e| {
                    SqlModelError::ConfigError(format!("failed to build connection pool: {e}"))
                })?;
            *state = PoolState::Ready(managed.clone());
            managed
        };

        info!(database = %database, min_size, max_size, "create database connection pool");

        let mut warm = Vec::with_capacity(min_size);
        for _ in 0..min_size {
            match managed.get().await {
                Ok(conn) => warm.push(conn),
                Err(e) => {
                    drop(warm);
                    managed.close();
                    let mut state = self.lock_state();
                    if matches!(*state, PoolState::Ready(_)) {
                        *state = PoolState::Uninitialized;
                    }
                    return Err(map_pool_error(e));
                }
            }
        }
        Ok(())
    }

    /// Borrow a connection, waiting while all `max_size` connections are in use.
    ///
    /// Waiting only suspends the calling task. Cancelling the wait leaves nothing
    /// reserved, and the returned handle gives the connection back when dropped.
    ///
    /// # Errors
    ///
    /// * `PoolError::NotInitialized` before [`Pool::initialize`].
    /// * `PoolError::Closed` after (or during) [`Pool::shutdown`].
    /// * `DriverError` if a new connection had to be opened and that failed.
    pub async fn acquire(&self) -> Result<PooledConnection, SqlModelError> {
        let managed = match &*self.lock_state() {
            PoolState::Uninitialized => return Err(PoolError::NotInitialized.into()),
            PoolState::Closed => return Err(PoolError::Closed.into()),
            PoolState::Ready(managed) => managed.clone(),
        };
        let ticket = BorrowTicket::new(&self.inner.borrowed);
        let conn = managed.get().await.map_err(map_pool_error)?;
        Ok(PooledConnection::new(conn, ticket))
    }

    /// Close the pool and wait until every borrowed connection has been returned.
    ///
    /// Later `acquire` calls fail with `PoolError::Closed`.
    ///
    /// # Errors
    ///
    /// * `PoolError::NotInitialized` before [`Pool::initialize`]; the pool stays
    ///   uninitialized and can still be opened.
    /// * `PoolError::Closed` if the pool was already shut down.
    pub async fn shutdown(&self) -> Result<(), PoolError> {
        let managed = {
            let mut state = self.lock_state();
            let managed = match &*state {
                PoolState::Uninitialized => return Err(PoolError::NotInitialized),
                PoolState::Closed => return Err(PoolError::Closed),
                PoolState::Ready(managed) => managed.clone(),
            };
            *state = PoolState::Closed;
            managed
        };
        info!("closing database connection pool");
        managed.close();

        let mut borrowed = self.inner.borrowed.subscribe();
        // The sender lives as long as `self`, so this only ends once the count hits zero.
        let _ = borrowed.wait_for(|n| *n == 0).await;
        info!("database connection pool closed");
        Ok(())
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(*self.lock_state(), PoolState::Ready(_))
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(*self.lock_state(), PoolState::Closed)
    }

    /// Connections currently borrowed (including borrowers still waiting for one).
    #[must_use]
    pub fn borrowed(&self) -> usize {
        *self.inner.borrowed.borrow()
    }
}

fn map_pool_error(err: ManagedPoolError<crate::error::DriverError>) -> SqlModelError {
    match err {
        ManagedPoolError::Backend(e) => SqlModelError::Driver(e),
        ManagedPoolError::Closed => PoolError::Closed.into(),
        other => SqlModelError::ConnectionError(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::error::DriverError;
    use crate::results::CustomDbRow;
    use crate::translation::PlaceholderStyle;
    use crate::types::RowValues;

    #[derive(Default)]
    struct FakeConnection {
        started: Arc<AtomicUsize>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl Connection for FakeConnection {
        fn placeholder_style(&self) -> PlaceholderStyle {
            PlaceholderStyle::Sqlite
        }

        async fn select(
            &mut self,
            _sql: &str,
            _params: &[RowValues],
            _limit: Option<usize>,
        ) -> Result<Vec<CustomDbRow>, DriverError> {
            Ok(Vec::new())
        }

        async fn execute(&mut self, _sql: &str, _params: &[RowValues]) -> Result<usize, DriverError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(1)
        }

        async fn ping(&mut self) -> Result<(), DriverError> {
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct FakeConnector {
        opened: Arc<AtomicUsize>,
        started: Arc<AtomicUsize>,
        delay: Option<Duration>,
        fail: bool,
    }

    #[async_trait]
    impl Connector for FakeConnector {
        async fn connect(&self, _config: &PoolConfig) -> Result<Box<dyn Connection>, DriverError> {
            if self.fail {
                return Err(DriverError::Other("refused".into()));
            }
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeConnection {
                started: Arc::clone(&self.started),
                delay: self.delay,
            }))
        }
    }

    fn config() -> PoolConfig {
        PoolConfig::new("root", "", "test")
    }

    #[tokio::test]
    async fn acquire_before_initialize_fails() {
        let pool = Pool::new(FakeConnector::default());
        let err = pool.acquire().await.unwrap_err();
        assert!(matches!(err, SqlModelError::Pool(PoolError::NotInitialized)));
    }

    #[tokio::test]
    async fn initialize_twice_fails() {
        let pool = Pool::new(FakeConnector::default());
        pool.initialize(config()).await.unwrap();
        let err = pool.initialize(config()).await.unwrap_err();
        assert!(matches!(err, SqlModelError::Pool(PoolError::AlreadyInitialized)));
    }

    #[tokio::test]
    async fn initialize_opens_min_size_connections() {
        let connector = FakeConnector::default();
        let opened = Arc::clone(&connector.opened);
        let pool = Pool::new(connector);
        pool.initialize(config().min_size(3).max_size(5)).await.unwrap();
        assert_eq!(opened.load(Ordering::SeqCst), 3);
        assert!(pool.is_ready());
        assert_eq!(pool.borrowed(), 0);
    }

    #[tokio::test]
    async fn failed_initialize_leaves_pool_uninitialized() {
        let pool = Pool::new(FakeConnector {
            fail: true,
            ..FakeConnector::default()
        });
        let err = pool.initialize(config()).await.unwrap_err();
        assert!(matches!(err, SqlModelError::Driver(DriverError::Other(_))));
        assert!(!pool.is_ready());
        assert!(!pool.is_closed());
    }

    #[tokio::test]
    async fn acquire_after_shutdown_fails_and_no_reopen() {
        let pool = Pool::new(FakeConnector::default());
        pool.initialize(config()).await.unwrap();
        pool.shutdown().await.unwrap();
        assert!(pool.is_closed());
        let err = pool.acquire().await.unwrap_err();
        assert!(matches!(err, SqlModelError::Pool(PoolError::Closed)));
        let err = pool.initialize(config()).await.unwrap_err();
        assert!(matches!(err, SqlModelError::Pool(PoolError::Closed)));
    }

    #[tokio::test]
    async fn shutdown_before_initialize_is_rejected() {
        let pool = Pool::new(FakeConnector::default());
        assert!(matches!(pool.shutdown().await, Err(PoolError::NotInitialized)));
        assert!(!pool.is_closed());

        pool.initialize(config()).await.unwrap();
        assert!(pool.is_ready());
        pool.shutdown().await.unwrap();
        assert!(matches!(pool.shutdown().await, Err(PoolError::Closed)));
    }

    #[tokio::test]
    async fn shutdown_waits_for_borrowed_connections() {
        let pool = Pool::new(FakeConnector::default());
        pool.initialize(config()).await.unwrap();

        let conn = pool.acquire().await.unwrap();
        assert_eq!(pool.borrowed(), 1);
        let returned = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&returned);
        let holder = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            flag.store(1, Ordering::SeqCst);
            drop(conn);
        });

        pool.shutdown().await.unwrap();
        assert_eq!(returned.load(Ordering::SeqCst), 1);
        assert_eq!(pool.borrowed(), 0);
        holder.await.unwrap();
    }

    #[tokio::test]
    async fn cancelled_waiter_keeps_no_reservation() {
        let pool = Pool::new(FakeConnector::default());
        pool.initialize(config().max_size(1)).await.unwrap();

        let held = pool.acquire().await.unwrap();
        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.acquire().await.map(|_| ()) })
        };
        tokio::task::yield_now().await;
        assert_eq!(pool.borrowed(), 2);
        waiter.abort();
        assert!(waiter.await.unwrap_err().is_cancelled());
        assert_eq!(pool.borrowed(), 1);

        drop(held);
        let again = tokio::time::timeout(Duration::from_secs(1), pool.acquire())
            .await
            .expect("connection should be free again")
            .unwrap();
        drop(again);
        assert_eq!(pool.borrowed(), 0);
    }

    #[tokio::test]
    async fn task_cancelled_mid_statement_returns_its_connection() {
        let connector = FakeConnector {
            delay: Some(Duration::from_secs(30)),
            ..FakeConnector::default()
        };
        let started = Arc::clone(&connector.started);
        let pool = Pool::new(connector);
        pool.initialize(config().max_size(1)).await.unwrap();

        let running = {
            let pool = pool.clone();
            tokio::spawn(async move {
                crate::executor::execute(&pool, "update t set n = 1", &[]).await
            })
        };
        tokio::time::timeout(Duration::from_secs(1), async {
            while started.load(Ordering::SeqCst) == 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("statement should start");
        assert_eq!(pool.borrowed(), 1);

        running.abort();
        assert!(running.await.unwrap_err().is_cancelled());
        assert_eq!(pool.borrowed(), 0);

        let conn = tokio::time::timeout(Duration::from_secs(1), pool.acquire())
            .await
            .expect("connection should be back in the pool")
            .unwrap();
        drop(conn);
        tokio::time::timeout(Duration::from_secs(1), pool.shutdown())
            .await
            .expect("nothing left borrowed")
            .unwrap();
    }

    #[tokio::test]
    async fn connection_is_reused_after_release() {
        let connector = FakeConnector::default();
        let opened = Arc::clone(&connector.opened);
        let pool = Pool::new(connector);
        pool.initialize(config().max_size(1)).await.unwrap();
        for _ in 0..3 {
            let mut conn = pool.acquire().await.unwrap();
            assert_eq!(conn.execute("select 1", &[]).await.unwrap(), 1);
        }
        assert_eq!(opened.load(Ordering::SeqCst), 1);
    }
}
