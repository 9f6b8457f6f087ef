//! `tracing`-based SQL logging.
//!
//! Every statement a table runs is emitted on the `pgtab.sql` target before it
//! executes; every failure is emitted at WARN before it is returned.

use crate::error::TabError;
use tracing::Level;

/// The kind of statement being run, detected from its leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    /// CREATE / DROP
    Ddl,
    Other,
}

impl StatementKind {
    pub fn from_sql(sql: &str) -> Self {
        let keyword = sql.split_whitespace().next().unwrap_or_default();
        let is = |k: &str| keyword.eq_ignore_ascii_case(k);
        if is("SELECT") {
            StatementKind::Select
        } else if is("INSERT") {
            StatementKind::Insert
        } else if is("UPDATE") {
            StatementKind::Update
        } else if is("DELETE") {
            StatementKind::Delete
        } else if is("CREATE") || is("DROP") {
            StatementKind::Ddl
        } else {
            StatementKind::Other
        }
    }
}

/// Truncate to at most `max_bytes`, backing off to a char boundary.
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// Emits executed SQL and failures as `tracing` events.
#[derive(Debug, Clone)]
pub struct SqlLogger {
    /// Tracing event level for statements.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for SqlLogger {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl SqlLogger {
    /// Create a new logger with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }

    /// Log a statement that is about to run.
    pub fn statement(&self, table: &str, sql: &str, param_count: usize) {
        /// Dispatch a tracing event at a runtime-determined level.
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let sql = self.truncate_sql(sql);
        emit_at_level!(
            self.level,
            target: "pgtab.sql",
            table,
            kind = ?StatementKind::from_sql(&sql),
            param_count,
            sql = %sql,
        );
    }

    /// Log a failed statement.
    pub fn failure(&self, table: &str, sql: &str, error: &TabError) {
        let sql = self.truncate_sql(sql);
        tracing::warn!(
            target: "pgtab.sql",
            table,
            kind = ?StatementKind::from_sql(&sql),
            sql = %sql,
            error = %error,
            "statement failed"
        );
    }
}
