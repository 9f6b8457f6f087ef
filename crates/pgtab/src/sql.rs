//! SQL builder with text parameters.
//!
//! `Sql` stores SQL pieces and parameters separately and generates `$1, $2, ...`
//! placeholders automatically in the final SQL string. Parameters are storage
//! texts produced by the codec (`None` binds SQL NULL).
//!
//! # Example
//!
//! ```ignore
//! use pgtab::Sql;
//!
//! let mut q = Sql::new("SELECT id, age::text FROM users WHERE id = ");
//! q.push_bind(Some("u1".to_string()));
//! let rows = q.fetch_all(&conn).await?;
//! ```

use crate::client::{GenericClient, TextRow};
use crate::error::{TabError, TabResult};

#[derive(Debug)]
enum SqlPart {
    Raw(String),
    Param,
}

/// A parameter-safe dynamic SQL builder.
#[derive(Debug)]
pub struct Sql {
    parts: Vec<SqlPart>,
    params: Vec<Option<String>>,
}

/// Check that `ident` is a plain or dot-qualified SQL identifier.
///
/// Each `.`-separated segment must match `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_ident(ident: &str) -> TabResult<()> {
    if ident.is_empty() {
        return Err(TabError::validation("empty identifier"));
    }

    let valid = ident.split('.').all(|seg| {
        let mut chars = seg.chars();
        match chars.next() {
            Some(first) if first == '_' || first.is_ascii_alphabetic() => {
                chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
            }
            _ => false,
        }
    });

    if valid {
        Ok(())
    } else {
        Err(TabError::validation(format!(
            "invalid identifier '{}'",
            ident
        )))
    }
}

impl Sql {
    /// Create a new builder with an initial SQL fragment.
    pub fn new(initial_sql: impl Into<String>) -> Self {
        Self {
            parts: vec![SqlPart::Raw(initial_sql.into())],
            params: Vec::new(),
        }
    }

    /// Append raw SQL (no parameters).
    pub fn push(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }

        match self.parts.last_mut() {
            Some(SqlPart::Raw(last)) => last.push_str(sql),
            _ => self.parts.push(SqlPart::Raw(sql.to_string())),
        }
        self
    }

    /// Append a parameter placeholder and bind its value.
    pub fn push_bind(&mut self, value: Option<String>) -> &mut Self {
        self.parts.push(SqlPart::Param);
        self.params.push(value);
        self
    }

    /// Append a placeholder followed by a cast such as `::text::INTEGER`.
    pub fn push_bind_cast(&mut self, value: Option<String>, cast: Option<&str>) -> &mut Self {
        self.push_bind(value);
        if let Some(cast) = cast {
            self.push(cast);
        }
        self
    }

    /// Append a SQL identifier (schema/table/column) safely.
    ///
    /// Identifiers cannot be bound, so this validates them with
    /// [`validate_ident`] instead.
    pub fn push_ident(&mut self, ident: &str) -> TabResult<&mut Self> {
        validate_ident(ident)?;
        Ok(self.push(ident))
    }

    /// Render SQL with `$1, $2, ...` placeholders.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        let mut idx: usize = 0;

        for part in &self.parts {
            match part {
                SqlPart::Raw(s) => out.push_str(s),
                SqlPart::Param => {
                    idx += 1;
                    use std::fmt::Write;
                    let _ = write!(&mut out, "${}", idx);
                }
            }
        }
        out
    }

    /// Bound parameters in placeholder order.
    pub fn params(&self) -> &[Option<String>] {
        &self.params
    }

    /// Execute the built SQL and return all rows.
    pub async fn fetch_all(&self, conn: &impl GenericClient) -> TabResult<Vec<TextRow>> {
        conn.query(&self.to_sql(), &self.params).await
    }

    /// Execute the built SQL and return affected row count.
    pub async fn execute(&self, conn: &impl GenericClient) -> TabResult<u64> {
        conn.execute(&self.to_sql(), &self.params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn builds_placeholders_in_order() {
        let mut q = Sql::new("SELECT * FROM users WHERE a = ");
        q.push_bind(text("1")).push(" AND b = ").push_bind(text("x"));

        assert_eq!(q.to_sql(), "SELECT * FROM users WHERE a = $1 AND b = $2");
        assert_eq!(q.params(), &[text("1"), text("x")]);
    }

    #[test]
    fn casts_follow_placeholders() {
        let mut q = Sql::new("UPDATE users SET age = ");
        q.push_bind_cast(text("31"), Some("::text::INTEGER"))
            .push(" WHERE id = ")
            .push_bind_cast(None, None);
        assert_eq!(
            q.to_sql(),
            "UPDATE users SET age = $1::text::INTEGER WHERE id = $2"
        );
        assert_eq!(q.params(), &[text("31"), None]);
    }

    #[test]
    fn push_ident_accepts_simple_and_dotted() {
        let mut q = Sql::new("");
        q.push_ident("users").unwrap();
        q.push(", ");
        q.push_ident("public.users").unwrap();
        assert_eq!(q.to_sql(), "users, public.users");
    }

    #[test]
    fn push_ident_rejects_unsafe() {
        let mut q = Sql::new("");
        assert!(q.push_ident("users; drop table users; --").is_err());
        assert!(q.push_ident("1users").is_err());
        assert!(q.push_ident("users..name").is_err());
        assert!(q.push_ident("users name").is_err());
        assert!(q.push_ident("").is_err());
    }
}
