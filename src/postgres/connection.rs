use std::sync::Arc;

use async_trait::async_trait;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, warn};

use crate::error::DriverError;
use crate::pool::{Connection, Connector, PoolConfig};
use crate::results::CustomDbRow;
use crate::translation::PlaceholderStyle;
use crate::types::RowValues;

use super::params::{as_refs, postgres_extract_value};

/// Opens Postgres sessions from the network fields of [`PoolConfig`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresConnector;

#[async_trait]
impl Connector for PostgresConnector {
    async fn connect(&self, config: &PoolConfig) -> Result<Box<dyn Connection>, DriverError> {
        let mut pg_config = tokio_postgres::Config::new();
        pg_config
            .host(&config.host)
            .port(config.port)
            .user(&config.user)
            .password(&config.password)
            .dbname(&config.database)
            .options(&format!("-c client_encoding={}", config.charset));

        let (client, connection) = pg_config.connect(NoTls).await?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!(error = %e, "postgres connection terminated");
            }
        });
        debug!(host = %config.host, database = %config.database, "opened postgres connection");
        Ok(Box::new(PostgresConnection {
            client,
            autocommit: config.autocommit,
        }))
    }
}

pub struct PostgresConnection {
    client: Client,
    autocommit: bool,
}

#[async_trait]
impl Connection for PostgresConnection {
    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Postgres
    }

    async fn select(
        &mut self,
        sql: &str,
        params: &[RowValues],
        limit: Option<usize>,
    ) -> Result<Vec<CustomDbRow>, DriverError> {
        let stmt = self.client.prepare(sql).await?;
        let column_names: Arc<Vec<String>> = Arc::new(
            stmt.columns()
                .iter()
                .map(|col| col.name().to_string())
                .collect(),
        );
        let rows = self.client.query(&stmt, &as_refs(params)).await?;
        let take = limit.unwrap_or(rows.len());

        let mut result = Vec::with_capacity(take.min(rows.len()));
        for row in rows.iter().take(take) {
            let mut values = Vec::with_capacity(column_names.len());
            for i in 0..column_names.len() {
                values.push(postgres_extract_value(row, i)?);
            }
            result.push(CustomDbRow::new(Arc::clone(&column_names), values));
        }
        Ok(result)
    }

    async fn execute(&mut self, sql: &str, params: &[RowValues]) -> Result<usize, DriverError> {
        let refs = as_refs(params);
        let affected = if self.autocommit {
            self.client.execute(sql, &refs).await?
        } else {
            let tx = self.client.transaction().await?;
            let affected = tx.execute(sql, &refs).await?;
            tx.commit().await?;
            affected
        };
        usize::try_from(affected)
            .map_err(|e| DriverError::Other(format!("postgres affected rows conversion error: {e}")))
    }

    async fn ping(&mut self) -> Result<(), DriverError> {
        self.client.simple_query("SELECT 1").await?;
        Ok(())
    }
}
