use serde::{Deserialize, Serialize};

use crate::error::SqlModelError;

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3306
}

fn default_charset() -> String {
    "utf8".to_string()
}

fn default_autocommit() -> bool {
    true
}

fn default_max_size() -> usize {
    10
}

fn default_min_size() -> usize {
    1
}

/// Settings for [`Pool::initialize`](crate::Pool::initialize).
///
/// `user`, `password` and `database` are required; everything else has a default:
/// ```rust
/// use sql_model::prelude::*;
///
/// let cfg: PoolConfig =
///     serde_json::from_str(r#"{"user":"www","password":"pw","database":"app"}"#).unwrap();
/// assert_eq!(cfg.host, "localhost");
/// assert_eq!(cfg.port, 3306);
/// assert_eq!(cfg.max_size, 10);
/// ```
///
/// The SQLite backend treats `database` as the file path and ignores the network fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    #[serde(default = "default_charset")]
    pub charset: String,
    /// When false, every executed statement runs in its own explicit transaction.
    #[serde(default = "default_autocommit")]
    pub autocommit: bool,
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    /// Connections opened eagerly by `initialize`.
    #[serde(default = "default_min_size")]
    pub min_size: usize,
}

impl PoolConfig {
    #[must_use]
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: user.into(),
            password: password.into(),
            database: database.into(),
            charset: default_charset(),
            autocommit: default_autocommit(),
            max_size: default_max_size(),
            min_size: default_min_size(),
        }
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    #[must_use]
    pub fn autocommit(mut self, autocommit: bool) -> Self {
        self.autocommit = autocommit;
        self
    }

    #[must_use]
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    #[must_use]
    pub fn min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size;
        self
    }

    /// Check the sizing constraints.
    ///
    /// # Errors
    ///
    /// Returns `SqlModelError::ConfigError` if `max_size` is zero or below `min_size`.
    pub fn validate(&self) -> Result<(), SqlModelError> {
        if self.max_size == 0 {
            return Err(SqlModelError::ConfigError(
                "max_size must be at least 1".to_string(),
            ));
        }
        if self.min_size > self.max_size {
            return Err(SqlModelError::ConfigError(format!(
                "min_size ({}) exceeds max_size ({})",
                self.min_size, self.max_size
            )));
        }
        Ok(())
    }
}
