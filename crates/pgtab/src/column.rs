//! Column descriptors and lookup keys.

use crate::value::Value;

/// Declared types that are bound and read as text without a cast.
pub const TEXTUAL_TYPES: &[&str] = &[
    "TEXT",
    "VARCHAR",
    "CHAR",
    "CHARACTER",
    "CHARACTER VARYING",
    "BPCHAR",
    "NAME",
    "CITEXT",
];

/// A named, typed column with optional DDL modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    name: String,
    sql_type: String,
    modifiers: Vec<String>,
}

impl Column {
    /// Create a column with no modifiers.
    ///
    /// ```ignore
    /// let id = Column::new("id", "TEXT").modifier("PRIMARY KEY");
    /// assert_eq!(id.to_ddl_fragment(), "id TEXT PRIMARY KEY");
    /// ```
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            modifiers: Vec::new(),
        }
    }

    pub fn with_modifiers<I, M>(
        name: impl Into<String>,
        sql_type: impl Into<String>,
        modifiers: I,
    ) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            modifiers: modifiers.into_iter().map(Into::into).collect(),
        }
    }

    /// Append a raw DDL modifier such as `NOT NULL`.
    pub fn modifier(mut self, modifier: impl Into<String>) -> Self {
        self.modifiers.push(modifier.into());
        self
    }

    pub fn primary_key(self) -> Self {
        self.modifier("PRIMARY KEY")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sql_type(&self) -> &str {
        &self.sql_type
    }

    pub fn modifiers(&self) -> &[String] {
        &self.modifiers
    }

    /// `name TYPE` followed by the modifiers joined with `, `.
    pub fn to_ddl_fragment(&self) -> String {
        if self.modifiers.is_empty() {
            format!("{} {}", self.name, self.sql_type)
        } else {
            format!(
                "{} {} {}",
                self.name,
                self.sql_type,
                self.modifiers.join(", ")
            )
        }
    }

    /// Whether the declared type accepts and yields text directly.
    pub fn is_textual(&self) -> bool {
        let base = self
            .sql_type
            .split('(')
            .next()
            .unwrap_or_default()
            .trim();
        TEXTUAL_TYPES
            .iter()
            .any(|t| t.eq_ignore_ascii_case(base))
    }

    /// Whether the declared type is `JSON` or `JSONB`.
    pub fn is_json(&self) -> bool {
        let base = self.sql_type.trim();
        base.eq_ignore_ascii_case("JSON") || base.eq_ignore_ascii_case("JSONB")
    }

    /// Cast appended to a text parameter bound against this column.
    pub fn bind_cast(&self) -> Option<String> {
        (!self.is_textual()).then(|| format!("::text::{}", self.sql_type))
    }
}

/// A column paired with the value it must equal.
#[derive(Debug, Clone, PartialEq)]
pub struct Key {
    column: Column,
    value: Value,
}

impl Key {
    pub fn new(column: Column, value: impl Into<Value>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }

    pub fn column(&self) -> &Column {
        &self.column
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_parts(self) -> (Column, Value) {
        (self.column, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ddl_fragment_joins_modifiers() {
        assert_eq!(Column::new("age", "INTEGER").to_ddl_fragment(), "age INTEGER");
        assert_eq!(
            Column::new("id", "TEXT").primary_key().to_ddl_fragment(),
            "id TEXT PRIMARY KEY"
        );
        assert_eq!(
            Column::with_modifiers("code", "VARCHAR(8)", ["NOT NULL", "UNIQUE"]).to_ddl_fragment(),
            "code VARCHAR(8) NOT NULL, UNIQUE"
        );
    }

    #[test]
    fn equality_covers_name_type_and_modifiers() {
        let a = Column::new("id", "TEXT");
        assert_eq!(a, Column::new("id", "TEXT"));
        assert_ne!(a, Column::new("id", "INTEGER"));
        assert_ne!(a, Column::new("id", "TEXT").primary_key());
    }

    #[test]
    fn textual_types_skip_casts() {
        assert!(Column::new("a", "text").is_textual());
        assert!(Column::new("a", "VARCHAR(20)").is_textual());
        assert!(Column::new("a", "character varying").is_textual());
        assert!(!Column::new("a", "INTEGER").is_textual());
        assert!(!Column::new("a", "JSONB").is_textual());

        let age = Column::new("age", "INTEGER");
        assert!(!age.is_json());
        assert!(Column::new("doc", "jsonb").is_json());
        assert!(Column::new("doc", "JSON").is_json());
        assert_eq!(age.bind_cast().as_deref(), Some("::text::INTEGER"));
        assert_eq!(Column::new("id", "TEXT").bind_cast(), None);
    }
}
