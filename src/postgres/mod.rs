//! Postgres backend built on tokio-postgres.

mod connection;
pub mod params;

pub use connection::{PostgresConnection, PostgresConnector};

use crate::pool::Pool;

impl Pool {
    /// An uninitialized pool of Postgres connections.
    #[must_use]
    pub fn postgres() -> Self {
        Pool::new(PostgresConnector)
    }
}
