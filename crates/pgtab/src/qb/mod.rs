//! Statement construction.
//!
//! Two families of pure functions; nothing here executes or sees a connection.
//!
//! - **Textual forms** return SQL strings with values interpolated verbatim.
//!   Every value must already be an escaped literal
//!   ([`ValueCodec::sql_literal`](crate::ValueCodec::sql_literal)); this module
//!   performs no escaping.
//! - **Bound forms** (`*_bound`) return a [`Sql`](crate::Sql) with `$n`
//!   placeholders and storage-text parameters. Identifiers are validated.
//!   Tables only use these.
//!
//! # Usage
//!
//! ```ignore
//! use pgtab::qb;
//!
//! let text = qb::select_where("users", &["id", "age"], &["'u1'", "'30'"])?;
//! assert_eq!(text, "SELECT * FROM users WHERE id = 'u1' AND age = '30'");
//!
//! let age = Column::new("age", "INTEGER");
//! let q = qb::delete_where_bound("users", &[qb::Bound::new(&age, Some("30".into()))])?;
//! assert_eq!(q.to_sql(), "DELETE FROM users WHERE age = $1::text::INTEGER");
//! ```

mod ddl;
mod dml;
mod predicate;

pub use ddl::{create_table, drop_table};
pub use dml::{
    delete_all, delete_where, delete_where_bound, exists_where_bound, insert, insert_bound,
    select_all, select_bound, select_column, select_where, select_where_bound, update,
    update_where, update_where_bound,
};
pub use predicate::{Bound, build_where};

#[cfg(test)]
mod tests;
