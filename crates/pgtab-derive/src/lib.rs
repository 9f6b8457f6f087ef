//! Derive macros for pgtab
//!
//! Provides `#[derive(TableModel)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod common;
mod table_model;

/// Derive `TableModel` for a struct with one field per column.
///
/// # Example
///
/// ```ignore
/// use pgtab::TableModel;
///
/// #[derive(TableModel)]
/// #[orm(table = "users")]
/// struct User {
///     #[orm(id)]
///     id: String,
///     age: Option<i32>,
///     #[orm(column = "home")]
///     address: Option<Address>,
/// }
/// ```
///
/// # Column types
///
/// `bool`, `i8`, `i16`, `i32`, `i64`, `f32`, `f64`, `String` and
/// `serde_json::Value` (and `Option`s of them) map to their natural PostgreSQL
/// types. Every other field type is stored as a tagged object in a `TEXT`
/// column and registered with the codec by `register_types`; it must implement
/// `Serialize`, `Deserialize`, `Clone`, `PartialEq` and `Debug`.
///
/// # Attributes
///
/// - `#[orm(table = "name")]` - Table name (defaults to the snake_case struct name)
/// - `#[orm(id)]` - Mark field as primary key
/// - `#[orm(column = "name")]` - Map field to a different column name
/// - `#[orm(sql_type = "VARCHAR(64)")]` - Override the declared column type
/// - `#[orm(modifiers = "NOT NULL, UNIQUE")]` - Extra DDL modifiers
/// - `#[orm(object)]` - Store the field as a tagged object even if it is a scalar
#[proc_macro_derive(TableModel, attributes(orm))]
pub fn derive_table_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    table_model::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
