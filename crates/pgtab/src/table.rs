//! Table access.
//!
//! A [`Table`] binds a name and a fixed column list to a connection source and
//! a shared [`ValueCodec`]. Column order is positional everywhere: insert
//! arguments, decoded [`Record`]s and model fields all follow it.
//!
//! Each operation builds one bound statement, checks out one connection for it
//! and releases the connection before any mapper runs. Nothing is retried.
//!
//! # Example
//!
//! ```ignore
//! let users = Table::new(pool, codec, "users", vec![
//!     Column::new("id", "TEXT").primary_key(),
//!     Column::new("age", "INTEGER"),
//! ])?;
//! users.create_table().await?;
//! users.insert(vec!["u1".into(), 30.into()]).await?;
//!
//! let row = users.get_row_data(&[users.key("id", "u1")?]).await?;
//! assert_eq!(row.get::<i32>(1)?, 30);
//! ```

use crate::client::{ConnectionSource, TextRow};
use crate::codec::ValueCodec;
use crate::column::{Column, Key};
use crate::error::{TabError, TabResult};
use crate::logging::SqlLogger;
use crate::model::TableModel;
use crate::qb::{self, Bound};
use crate::record::Record;
use crate::sql::{Sql, validate_ident};
use crate::value::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Turns a decoded row into a domain object.
pub type Mapper<T> = Arc<dyn Fn(Record) -> TabResult<T> + Send + Sync>;

/// Turns a domain object back into values in column order.
pub type Demapper<T> = Arc<dyn Fn(&T) -> TabResult<Vec<Value>> + Send + Sync>;

/// Check out a connection, honoring availability.
async fn checkout<S: ConnectionSource>(
    source: &S,
    logger: &SqlLogger,
    table: &str,
    sql: &str,
) -> TabResult<S::Connection> {
    if !source.is_available() {
        let err = TabError::Unavailable;
        logger.failure(table, sql, &err);
        return Err(err);
    }
    source
        .acquire()
        .await
        .inspect_err(|e| logger.failure(table, sql, e))
}

/// Run a row-returning statement on a freshly checked-out connection.
pub(crate) async fn run_query<S: ConnectionSource>(
    source: &S,
    logger: &SqlLogger,
    table: &str,
    statement: &Sql,
) -> TabResult<Vec<TextRow>> {
    let sql = statement.to_sql();
    let conn = checkout(source, logger, table, &sql).await?;
    logger.statement(table, &sql, statement.params().len());
    let result = statement.fetch_all(&conn).await;
    drop(conn);
    result.inspect_err(|e| logger.failure(table, &sql, e))
}

/// Run a statement on a freshly checked-out connection and return the affected row count.
pub(crate) async fn run_execute<S: ConnectionSource>(
    source: &S,
    logger: &SqlLogger,
    table: &str,
    statement: &Sql,
) -> TabResult<u64> {
    let sql = statement.to_sql();
    let conn = checkout(source, logger, table, &sql).await?;
    logger.statement(table, &sql, statement.params().len());
    let result = statement.execute(&conn).await;
    drop(conn);
    result.inspect_err(|e| logger.failure(table, &sql, e))
}

fn validate_schema(name: &str, columns: &[Column]) -> TabResult<()> {
    validate_ident(name)?;
    if columns.is_empty() {
        return Err(TabError::validation(format!(
            "table '{}' needs at least one column",
            name
        )));
    }

    let mut seen = HashSet::new();
    for column in columns {
        validate_ident(column.name())?;
        if !seen.insert(column.name()) {
            return Err(TabError::validation(format!(
                "table '{}' declares column '{}' twice",
                name,
                column.name()
            )));
        }
    }
    Ok(())
}

/// A table with a fixed column list, mapping rows to `T`.
pub struct Table<S, T = Record> {
    name: String,
    columns: Arc<[Column]>,
    source: S,
    codec: Arc<ValueCodec>,
    mapper: Mapper<T>,
    demapper: Option<Demapper<T>>,
    logger: SqlLogger,
}

impl<S: ConnectionSource> Table<S, Record> {
    /// Create a table handle whose rows are plain [`Record`]s.
    ///
    /// Rejects an empty column list, invalid identifiers and duplicate column
    /// names. Nothing is executed; call [`create_table`](Table::create_table)
    /// to create the table itself.
    pub fn new(
        source: S,
        codec: Arc<ValueCodec>,
        name: impl Into<String>,
        columns: Vec<Column>,
    ) -> TabResult<Self> {
        let name = name.into();
        validate_schema(&name, &columns)?;
        Ok(Self {
            name,
            columns: columns.into(),
            source,
            codec,
            mapper: Arc::new(|record: Record| Ok(record)),
            demapper: Some(Arc::new(|record: &Record| Ok(record.values().to_vec()))),
            logger: SqlLogger::default(),
        })
    }

    /// Create a table handle for a [`TableModel`].
    ///
    /// The codec must already know the model's structured field types
    /// (see [`TypeRegistry::register_model`](crate::TypeRegistry::register_model)).
    pub fn for_model<M: TableModel>(source: S, codec: Arc<ValueCodec>) -> TabResult<Table<S, M>> {
        Ok(Self::new(source, codec, M::TABLE, M::columns())?
            .with_mapper(M::from_record)
            .with_demapper(|model: &M| Ok(model.to_values())))
    }
}

impl<S: ConnectionSource, T> Table<S, T> {
    /// Replace the row mapper. The new row type has no demapper until one is set.
    pub fn with_mapper<U>(
        self,
        mapper: impl Fn(Record) -> TabResult<U> + Send + Sync + 'static,
    ) -> Table<S, U> {
        Table {
            name: self.name,
            columns: self.columns,
            source: self.source,
            codec: self.codec,
            mapper: Arc::new(mapper),
            demapper: None,
            logger: self.logger,
        }
    }

    /// Set the inverse of the mapper, used by the object-taking operations.
    pub fn with_demapper(
        mut self,
        demapper: impl Fn(&T) -> TabResult<Vec<Value>> + Send + Sync + 'static,
    ) -> Self {
        self.demapper = Some(Arc::new(demapper));
        self
    }

    pub fn with_logger(mut self, logger: SqlLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn codec(&self) -> &ValueCodec {
        &self.codec
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Columns whose declared type matches, ignoring case.
    pub fn columns_by_type(&self, sql_type: &str) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|c| c.sql_type().eq_ignore_ascii_case(sql_type))
            .collect()
    }

    /// Build a lookup key on one of this table's columns.
    pub fn key(&self, column: &str, value: impl Into<Value>) -> TabResult<Key> {
        Ok(Key::new(self.resolve(column)?.clone(), value))
    }

    /// Values of `object` in column order, via the demapper.
    pub fn demap(&self, object: &T) -> TabResult<Vec<Value>> {
        let demapper = self.demapper.as_ref().ok_or_else(|| {
            TabError::validation(format!(
                "table '{}' has no demapper for its row type",
                self.name
            ))
        })?;
        let values = demapper(object)?;
        if values.len() != self.columns.len() {
            return Err(TabError::mismatch(self.columns.len(), values.len()));
        }
        Ok(values)
    }

    // ==================== Schema ====================

    /// `CREATE TABLE IF NOT EXISTS` with this table's columns.
    pub async fn create_table(&self) -> TabResult<()> {
        let statement = Sql::new(qb::create_table(&self.name, &self.columns));
        self.run(&statement).await.map(|_| ())
    }

    pub async fn drop_table(&self) -> TabResult<()> {
        let statement = Sql::new(qb::drop_table(&self.name));
        self.run(&statement).await.map(|_| ())
    }

    // ==================== Inserts ====================

    /// Insert one value per column, in column order.
    pub async fn insert(&self, values: Vec<Value>) -> TabResult<&Self> {
        if values.len() != self.columns.len() {
            return Err(TabError::mismatch(self.columns.len(), values.len()));
        }
        let bound = self.bind_row(&values)?;
        self.run(&qb::insert_bound(&self.name, &bound)?).await?;
        Ok(self)
    }

    /// Insert into a named subset of columns; the rest take their defaults.
    pub async fn insert_columns(&self, columns: &[&str], values: Vec<Value>) -> TabResult<&Self> {
        if columns.len() != values.len() {
            return Err(TabError::mismatch(columns.len(), values.len()));
        }
        let bound = columns
            .iter()
            .zip(&values)
            .map(|(name, value)| self.bind(self.resolve(name)?, value))
            .collect::<TabResult<Vec<_>>>()?;
        self.run(&qb::insert_bound(&self.name, &bound)?).await?;
        Ok(self)
    }

    /// Insert a row with a single column set.
    pub async fn insert_value(&self, column: &str, value: impl Into<Value>) -> TabResult<&Self> {
        self.insert_columns(&[column], vec![value.into()]).await
    }

    /// Insert a domain object through the demapper.
    pub async fn insert_object(&self, object: &T) -> TabResult<&Self> {
        let values = self.demap(object)?;
        self.insert(values).await
    }

    /// Insert `value` into `column` if `predicate` approves it.
    ///
    /// Returns whether a row was inserted.
    pub async fn insert_if(
        &self,
        column: &str,
        value: impl Into<Value>,
        predicate: impl FnOnce(&str, &Value) -> bool,
    ) -> TabResult<bool> {
        let value = value.into();
        if !predicate(column, &value) {
            return Ok(false);
        }
        self.insert_value(column, value).await?;
        Ok(true)
    }

    /// Insert `value` into `column` unless a row already holds it.
    ///
    /// Check-then-insert on two connections: not atomic. A concurrent insert
    /// between the check and the insert is only caught by a unique constraint.
    pub async fn insert_if_absent(&self, column: &str, value: impl Into<Value>) -> TabResult<bool> {
        let key = self.key(column, value)?;
        if self.contains(std::slice::from_ref(&key)).await? {
            return Ok(false);
        }
        let (_, value) = key.into_parts();
        self.insert_value(column, value).await?;
        Ok(true)
    }

    /// Insert `object` if `predicate` approves it.
    pub async fn insert_object_if(
        &self,
        object: &T,
        predicate: impl FnOnce(&T) -> bool,
    ) -> TabResult<bool> {
        if !predicate(object) {
            return Ok(false);
        }
        self.insert_object(object).await?;
        Ok(true)
    }

    /// Insert `object` unless an identical row exists. Not atomic, like
    /// [`insert_if_absent`](Self::insert_if_absent).
    pub async fn insert_object_if_absent(&self, object: &T) -> TabResult<bool> {
        let values = self.demap(object)?;
        if self.contains_values(&values).await? {
            return Ok(false);
        }
        self.insert(values).await?;
        Ok(true)
    }

    // ==================== Reads ====================

    /// First row matching every key, mapped; `None` when nothing matches.
    pub async fn get_row(&self, keys: &[Key]) -> TabResult<Option<T>> {
        let record = self.fetch_row(keys).await?;
        record.map(|r| (self.mapper)(r)).transpose()
    }

    /// First row matching every key; an empty record when nothing matches.
    pub async fn get_row_data(&self, keys: &[Key]) -> TabResult<Record> {
        Ok(self.fetch_row(keys).await?.unwrap_or_default())
    }

    /// Every row, mapped.
    pub async fn get_all(&self) -> TabResult<Vec<T>> {
        let records = self.get_all_data().await?;
        records.into_iter().map(|r| (self.mapper)(r)).collect()
    }

    /// Every row as a decoded record.
    pub async fn get_all_data(&self) -> TabResult<Vec<Record>> {
        let statement = qb::select_bound(&self.name, &self.columns)?;
        let rows = self.fetch(&statement).await?;
        rows.into_iter().map(|row| self.decode_row(row)).collect()
    }

    /// Every value of one column, across all rows.
    pub async fn get_all_column_data(&self, column: &str) -> TabResult<Vec<Value>> {
        let mut data = self.get_all_columns_data(&[column]).await?;
        Ok(data.pop().unwrap_or_default())
    }

    /// One value sequence per named column, across all rows.
    pub async fn get_all_columns_data(&self, columns: &[&str]) -> TabResult<Vec<Vec<Value>>> {
        let selected = columns
            .iter()
            .map(|name| self.resolve(name).cloned())
            .collect::<TabResult<Vec<_>>>()?;
        let statement = qb::select_bound(&self.name, &selected)?;
        let rows = self.fetch(&statement).await?;

        let mut data: Vec<Vec<Value>> = (0..selected.len())
            .map(|_| Vec::with_capacity(rows.len()))
            .collect();
        for row in rows {
            for (slot, cell) in data.iter_mut().zip(row) {
                slot.push(self.codec.from_storage(cell.as_deref())?);
            }
        }
        Ok(data)
    }

    /// One column of the first row matching every key.
    pub async fn get_value(&self, keys: &[Key], column: &str) -> TabResult<Option<Value>> {
        let selected = self.resolve(column)?.clone();
        let bound = self.bind_keys(keys)?;
        let statement = qb::select_where_bound(&self.name, std::slice::from_ref(&selected), &bound)?;
        let rows = self.fetch(&statement).await?;
        rows.into_iter()
            .next()
            .map(|row| {
                let cell = row.into_iter().next().flatten();
                self.codec.from_storage(cell.as_deref())
            })
            .transpose()
    }

    // ==================== Writes ====================

    /// Delete the rows matching every key; returns the number deleted.
    pub async fn remove(&self, keys: &[Key]) -> TabResult<u64> {
        let bound = self.bind_keys(keys)?;
        self.run(&qb::delete_where_bound(&self.name, &bound)?).await
    }

    /// Set one column on the rows matching every key; returns the number updated.
    pub async fn update(&self, keys: &[Key], set: Key) -> TabResult<u64> {
        let column = self.resolve(set.column().name())?;
        let set = self.bind(column, set.value())?;
        let bound = self.bind_keys(keys)?;
        self.run(&qb::update_where_bound(&self.name, &set, &bound)?).await
    }

    /// Delete every row; returns the number deleted.
    pub async fn empty(&self) -> TabResult<u64> {
        self.run(&Sql::new(qb::delete_all(&self.name))).await
    }

    // ==================== Checks ====================

    /// Whether any row matches every key.
    pub async fn contains(&self, keys: &[Key]) -> TabResult<bool> {
        let bound = self.bind_keys(keys)?;
        self.exists(&bound).await
    }

    /// Whether a row equal to `object` in every column exists.
    pub async fn contains_object(&self, object: &T) -> TabResult<bool> {
        let values = self.demap(object)?;
        self.contains_values(&values).await
    }

    // ==================== Internals ====================

    fn resolve(&self, name: &str) -> TabResult<&Column> {
        self.column_by_name(name).ok_or_else(|| {
            TabError::validation(format!(
                "table '{}' has no column '{}'",
                self.name, name
            ))
        })
    }

    fn bind<'a>(&self, column: &'a Column, value: &Value) -> TabResult<Bound<'a>> {
        let stored = if column.is_json() {
            self.codec.to_json_storage(value)?
        } else {
            self.codec.to_storage(value)?
        };
        Ok(Bound::new(column, stored))
    }

    fn bind_row(&self, values: &[Value]) -> TabResult<Vec<Bound<'_>>> {
        self.columns
            .iter()
            .zip(values)
            .map(|(column, value)| self.bind(column, value))
            .collect()
    }

    fn bind_keys(&self, keys: &[Key]) -> TabResult<Vec<Bound<'_>>> {
        keys.iter()
            .map(|key| self.bind(self.resolve(key.column().name())?, key.value()))
            .collect()
    }

    fn decode_row(&self, row: TextRow) -> TabResult<Record> {
        row.iter()
            .map(|cell| self.codec.from_storage(cell.as_deref()))
            .collect::<TabResult<Vec<_>>>()
            .map(Record::from)
    }

    async fn contains_values(&self, values: &[Value]) -> TabResult<bool> {
        let bound = self.bind_row(values)?;
        self.exists(&bound).await
    }

    async fn exists(&self, bound: &[Bound<'_>]) -> TabResult<bool> {
        let statement = qb::exists_where_bound(&self.name, bound)?;
        Ok(!self.fetch(&statement).await?.is_empty())
    }

    async fn fetch_row(&self, keys: &[Key]) -> TabResult<Option<Record>> {
        let bound = self.bind_keys(keys)?;
        let statement = qb::select_where_bound(&self.name, &self.columns, &bound)?;
        let rows = self.fetch(&statement).await?;
        rows.into_iter()
            .next()
            .map(|row| self.decode_row(row))
            .transpose()
    }

    async fn fetch(&self, statement: &Sql) -> TabResult<Vec<TextRow>> {
        run_query(&self.source, &self.logger, &self.name, statement).await
    }

    async fn run(&self, statement: &Sql) -> TabResult<u64> {
        run_execute(&self.source, &self.logger, &self.name, statement).await
    }
}

impl<S: Clone, T> Clone for Table<S, T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            columns: Arc::clone(&self.columns),
            source: self.source.clone(),
            codec: Arc::clone(&self.codec),
            mapper: Arc::clone(&self.mapper),
            demapper: self.demapper.clone(),
            logger: self.logger.clone(),
        }
    }
}

impl<S, T> fmt::Debug for Table<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("columns", &self.columns)
            .field("demapper", &self.demapper.is_some())
            .finish_non_exhaustive()
    }
}
