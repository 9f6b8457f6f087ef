//! Compile-time table schemas.

use crate::codec::TypeRegistry;
use crate::column::Column;
use crate::error::TabResult;
use crate::record::Record;
use crate::value::Value;

/// A Rust type bound to a table: its columns, and how it maps to and from a
/// decoded row.
///
/// Usually derived:
///
/// ```ignore
/// #[derive(TableModel)]
/// #[orm(table = "users")]
/// struct User {
///     #[orm(id)]
///     id: String,
///     age: i32,
///     address: Option<Address>,
/// }
/// ```
pub trait TableModel: Sized + Send + Sync + 'static {
    /// Table name.
    const TABLE: &'static str;

    /// Columns in field order.
    fn columns() -> Vec<Column>;

    /// Field values in column order.
    fn to_values(&self) -> Vec<Value>;

    /// Build the model from a row decoded in column order.
    fn from_record(record: Record) -> TabResult<Self>;

    /// Register the structured field types the codec must be able to decode.
    fn register_types(registry: &mut TypeRegistry) {
        let _ = registry;
    }
}
