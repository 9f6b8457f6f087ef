//! # pgtab
//!
//! Typed PostgreSQL table access with a tagged text value codec.
//!
//! ## Features
//!
//! - **Fixed schemas**: a [`Table`] is a name plus an ordered column list; rows
//!   decode positionally into a [`Record`] or a mapped domain type
//! - **Tagged values**: structured values are stored as `{"body":..,"type":..}`
//!   envelopes and decoded back through a [`TypeRegistry`]
//! - **Bound statements**: every value travels as a `$n` parameter, cast to the
//!   column type on the server
//! - **One connection per statement**: checked out from a [`ConnectionSource`]
//!   and released before any mapping runs
//! - **Derived models**: `#[derive(TableModel)]` for structs with one field per
//!   column
//!
//! ## Usage
//!
//! ```ignore
//! use pgtab::prelude::*;
//!
//! let config = DatabaseConfig::from_env()?;
//! let db = Database::connect(&config, TypeRegistry::new())?;
//!
//! let users = db
//!     .create_table("users", vec![
//!         Column::new("id", "TEXT").primary_key(),
//!         Column::new("age", "INTEGER"),
//!     ])
//!     .await?;
//!
//! users.insert(vec!["u1".into(), 30.into()]).await?;
//! users.update(&[users.key("id", "u1")?], users.key("age", 31)?).await?;
//!
//! let row = users.get_row_data(&[users.key("id", "u1")?]).await?;
//! assert_eq!(row.get::<i32>(1)?, 31);
//! ```

pub mod client;
pub mod codec;
pub mod column;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod model;
pub mod prelude;
pub mod qb;
pub mod record;
pub mod sql;
pub mod table;
pub mod value;

#[cfg(test)]
mod testing;

pub use client::{ConnectionSource, GenericClient, TextRow};
pub use codec::{DecodeTarget, NumberLadder, TypeRegistry, ValueCodec};
pub use column::{Column, Key, TEXTUAL_TYPES};
pub use config::{DatabaseConfig, Recycling};
pub use database::Database;
pub use error::{TabError, TabResult};
pub use logging::{SqlLogger, StatementKind};
pub use model::TableModel;
pub use record::Record;
pub use sql::Sql;
pub use table::{Demapper, Mapper, Table};
pub use value::{FromValue, Object, Value};

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{
    create_pool, create_pool_with_config, create_pool_with_manager_config, create_pool_with_tls,
};

#[cfg(feature = "pool")]
pub use deadpool_postgres::Pool;

#[cfg(feature = "derive")]
pub use pgtab_derive::TableModel;
