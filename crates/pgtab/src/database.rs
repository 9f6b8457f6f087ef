//! Database handle.
//!
//! A [`Database`] owns a connection source and the codec every one of its
//! tables shares. Tables created from it are cheap handles onto the same
//! source.

use crate::client::ConnectionSource;
use crate::codec::{TypeRegistry, ValueCodec};
use crate::column::Column;
use crate::error::{TabError, TabResult};
use crate::logging::SqlLogger;
use crate::model::TableModel;
use crate::qb;
use crate::record::Record;
use crate::sql::{Sql, validate_ident};
use crate::table::{Table, run_execute};
use std::sync::Arc;

#[cfg(feature = "pool")]
use crate::config::DatabaseConfig;
#[cfg(feature = "pool")]
use deadpool_postgres::Pool;

/// A connection source plus the shared codec.
#[derive(Debug, Clone)]
pub struct Database<S> {
    source: S,
    codec: Arc<ValueCodec>,
    logger: SqlLogger,
}

#[cfg(feature = "pool")]
impl Database<Pool> {
    /// Build a pool from `config` and a codec over `registry`.
    ///
    /// No connection is opened until the first statement runs.
    pub fn connect(config: &DatabaseConfig, registry: TypeRegistry) -> TabResult<Self> {
        let pool = crate::pool::create_pool_with_config(config)?;
        let codec = ValueCodec::new(registry).with_number_ladder(config.number_ladder);
        Ok(Self::new(pool, Arc::new(codec)).with_logger(config.logger()))
    }
}

impl<S: ConnectionSource + Clone> Database<S> {
    pub fn new(source: S, codec: Arc<ValueCodec>) -> Self {
        Self {
            source,
            codec,
            logger: SqlLogger::default(),
        }
    }

    /// Logger handed to every table created from here on.
    pub fn with_logger(mut self, logger: SqlLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn codec(&self) -> &Arc<ValueCodec> {
        &self.codec
    }

    pub fn logger(&self) -> &SqlLogger {
        &self.logger
    }

    /// Handle onto an existing table. Nothing is executed.
    pub fn table(&self, name: &str, columns: Vec<Column>) -> TabResult<Table<S, Record>> {
        Ok(
            Table::new(self.source.clone(), Arc::clone(&self.codec), name, columns)?
                .with_logger(self.logger.clone()),
        )
    }

    /// Create the table if it does not exist and return a handle onto it.
    pub async fn create_table(
        &self,
        name: &str,
        columns: Vec<Column>,
    ) -> TabResult<Table<S, Record>> {
        let table = self.table(name, columns)?;
        table.create_table().await?;
        Ok(table)
    }

    /// Handle onto a model's table.
    ///
    /// Fails with a validation error if the codec cannot decode one of the
    /// model's structured field types.
    pub fn model_table<M: TableModel>(&self) -> TabResult<Table<S, M>> {
        let mut required = TypeRegistry::new();
        M::register_types(&mut required);
        let mut missing: Vec<&str> = required
            .names()
            .filter(|name| !self.codec.registry().contains(name))
            .collect();
        if !missing.is_empty() {
            missing.sort_unstable();
            return Err(TabError::validation(format!(
                "table '{}' stores types the codec does not know: {}",
                M::TABLE,
                missing.join(", ")
            )));
        }

        Ok(
            Table::for_model::<M>(self.source.clone(), Arc::clone(&self.codec))?
                .with_logger(self.logger.clone()),
        )
    }

    /// Create a model's table if it does not exist and return a handle onto it.
    pub async fn create_model_table<M: TableModel>(&self) -> TabResult<Table<S, M>> {
        let table = self.model_table::<M>()?;
        table.create_table().await?;
        Ok(table)
    }

    /// Drop a table by name.
    pub async fn drop_table(&self, name: &str) -> TabResult<()> {
        validate_ident(name)?;
        let statement = Sql::new(qb::drop_table(name));
        run_execute(&self.source, &self.logger, name, &statement)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedSource;
    use crate::value::Value;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Address {
        street: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Home {
        id: String,
        address: Address,
    }

    impl TableModel for Home {
        const TABLE: &'static str = "homes";

        fn columns() -> Vec<Column> {
            vec![
                Column::new("id", "TEXT").primary_key(),
                Column::new("address", "TEXT"),
            ]
        }

        fn to_values(&self) -> Vec<Value> {
            vec![self.id.clone().into(), Value::object(self.address.clone())]
        }

        fn from_record(mut record: Record) -> TabResult<Self> {
            Ok(Self {
                id: record.take(0)?,
                address: record.get_object(1)?,
            })
        }

        fn register_types(registry: &mut TypeRegistry) {
            registry.register::<Address>();
        }
    }

    fn database(source: &ScriptedSource, registry: TypeRegistry) -> Database<ScriptedSource> {
        Database::new(source.clone(), Arc::new(ValueCodec::new(registry)))
    }

    #[tokio::test]
    async fn create_table_returns_a_usable_handle() {
        let source = ScriptedSource::new();
        let db = database(&source, TypeRegistry::new());

        let table = db
            .create_table("kv", vec![Column::new("k", "TEXT"), Column::new("v", "TEXT")])
            .await
            .unwrap();
        table.insert(vec!["a".into(), "b".into()]).await.unwrap();

        assert_eq!(
            source.statements(),
            vec![
                "CREATE TABLE IF NOT EXISTS kv (k TEXT, v TEXT);",
                "INSERT INTO kv (k, v) VALUES ($1, $2)",
            ]
        );
    }

    #[tokio::test]
    async fn drop_table_validates_the_name() {
        let source = ScriptedSource::new();
        let db = database(&source, TypeRegistry::new());

        db.drop_table("kv").await.unwrap();
        assert!(db.drop_table("kv; DROP TABLE users").await.is_err());
        assert_eq!(source.statements(), vec!["DROP TABLE kv"]);
    }

    #[test]
    fn model_table_requires_registered_types() {
        let source = ScriptedSource::new();
        let err = database(&source, TypeRegistry::new())
            .model_table::<Home>()
            .unwrap_err();
        assert!(matches!(err, TabError::Validation(_)));

        let mut registry = TypeRegistry::new();
        registry.register_model::<Home>();
        let table = database(&source, registry).model_table::<Home>().unwrap();
        assert_eq!(table.name(), "homes");
        assert_eq!(table.columns().len(), 2);
    }

    #[tokio::test]
    async fn model_rows_round_trip_through_storage() {
        let source = ScriptedSource::new();
        let mut registry = TypeRegistry::new();
        registry.register_model::<Home>();
        let table = database(&source, registry)
            .create_model_table::<Home>()
            .await
            .unwrap();
        let home = Home {
            id: "h1".to_string(),
            address: Address {
                street: "Elm".to_string(),
            },
        };

        table.insert_object(&home).await.unwrap();
        let stored = source.executed()[1].params.clone();
        let cells: Vec<Option<&str>> = stored.iter().map(|p| p.as_deref()).collect();
        source.reply_rows(&[cells.as_slice()]);

        let loaded = table
            .get_row(&[table.key("id", "h1").unwrap()])
            .await
            .unwrap();
        assert_eq!(loaded, Some(home));
    }
}
