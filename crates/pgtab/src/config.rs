//! Database configuration.
//!
//! ```ignore
//! // Reads DATABASE_URL (and the optional PGTAB_* keys) from the environment or `.env`.
//! let config = DatabaseConfig::from_env()?.max_size(8);
//! let db = Database::connect(&config, TypeRegistry::new())?;
//! ```

use crate::codec::NumberLadder;
use crate::error::{TabError, TabResult};
use crate::logging::SqlLogger;
use std::num::NonZeroUsize;
use tracing::Level;

/// How pooled connections are checked before reuse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Recycling {
    /// Only check that the connection is not closed.
    #[default]
    Fast,
    /// Run a test query before handing the connection out.
    Verified,
}

/// Connection, pool, codec and logging settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    /// Overrides the user in `url`.
    pub user: Option<String>,
    /// Overrides the password in `url`.
    pub password: Option<String>,
    pub max_size: usize,
    pub recycling: Recycling,
    pub number_ladder: NumberLadder,
    pub log_level: Level,
    /// Truncate logged SQL to this many bytes; `None` logs it whole.
    pub max_logged_sql: Option<usize>,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user: None,
            password: None,
            max_size: 16,
            recycling: Recycling::default(),
            number_ladder: NumberLadder::default(),
            log_level: Level::DEBUG,
            max_logged_sql: Some(200),
        }
    }

    /// Load from the process environment, after reading `.env` if present.
    ///
    /// `DATABASE_URL` is required; `PGTAB_POOL_SIZE`, `PGTAB_USER` and
    /// `PGTAB_PASSWORD` are optional.
    pub fn from_env() -> TabResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key lookup, using the same keys as [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> TabResult<Self> {
        let url = lookup("DATABASE_URL")
            .ok_or_else(|| TabError::Connection("DATABASE_URL is not set".to_string()))?;
        let mut config = Self::new(url);

        if let Some(size) = lookup("PGTAB_POOL_SIZE") {
            let parsed: NonZeroUsize = size.trim().parse().map_err(|_| {
                TabError::validation(format!("PGTAB_POOL_SIZE must be a positive integer, got '{}'", size))
            })?;
            config.max_size = parsed.get();
        }
        config.user = lookup("PGTAB_USER");
        config.password = lookup("PGTAB_PASSWORD");
        Ok(config)
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn recycling(mut self, recycling: Recycling) -> Self {
        self.recycling = recycling;
        self
    }

    pub fn number_ladder(mut self, ladder: NumberLadder) -> Self {
        self.number_ladder = ladder;
        self
    }

    pub fn log_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }

    pub fn max_logged_sql(mut self, len: usize) -> Self {
        self.max_logged_sql = Some(len);
        self
    }

    pub fn no_sql_truncation(mut self) -> Self {
        self.max_logged_sql = None;
        self
    }

    /// Parse the URL and apply the user/password overrides.
    pub fn pg_config(&self) -> TabResult<tokio_postgres::Config> {
        let mut pg_config: tokio_postgres::Config = self
            .url
            .parse()
            .map_err(|e: tokio_postgres::Error| TabError::Connection(e.to_string()))?;
        if let Some(user) = &self.user {
            pg_config.user(user);
        }
        if let Some(password) = &self.password {
            pg_config.password(password);
        }
        Ok(pg_config)
    }

    /// SQL logger configured from the logging settings.
    pub fn logger(&self) -> SqlLogger {
        let logger = SqlLogger::new().level(self.log_level);
        match self.max_logged_sql {
            Some(len) => logger.max_sql_length(len),
            None => logger.no_truncate(),
        }
    }
}
