//! `SQLite` backend built on rusqlite.

mod connection;
pub mod params;

pub use connection::{SqliteConnection, SqliteConnector};

use crate::pool::Pool;

impl Pool {
    /// An uninitialized pool of `SQLite` connections.
    #[must_use]
    pub fn sqlite() -> Self {
        Pool::new(SqliteConnector)
    }
}
