//! Convenient imports for typical `pgtab` usage.
//!
//! ```ignore
//! use pgtab::prelude::*;
//! ```

pub use crate::{
    Column, ConnectionSource, Database, DatabaseConfig, FromValue, GenericClient, Key, Record,
    TabError, TabResult, Table, TableModel, TypeRegistry, Value, ValueCodec,
};

#[cfg(feature = "pool")]
pub use crate::{Pool, create_pool, create_pool_with_config};
