use std::fmt;
use std::sync::Arc;

use deadpool::managed::{Manager, Metrics, RecycleError, RecycleResult};
use tracing::debug;

use crate::error::DriverError;

use super::config::PoolConfig;
use super::connection::{Connection, Connector};

/// deadpool manager that opens connections through a [`Connector`].
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    config: PoolConfig,
}

impl ConnectionManager {
    pub(crate) fn new(connector: Arc<dyn Connector>, config: PoolConfig) -> Self {
        Self { connector, config }
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("database", &self.config.database)
            .finish_non_exhaustive()
    }
}

impl Manager for ConnectionManager {
    type Type = Box<dyn Connection>;
    type Error = DriverError;

    async fn create(&self) -> Result<Self::Type, Self::Error> {
        debug!(database = %self.config.database, "opening database connection");
        self.connector.connect(&self.config).await
    }

    async fn recycle(&self, conn: &mut Self::Type, metrics: &Metrics) -> RecycleResult<Self::Error> {
        debug!(recycle_count = metrics.recycle_count, "recycling database connection");
        conn.ping().await.map_err(RecycleError::Backend)
    }
}
