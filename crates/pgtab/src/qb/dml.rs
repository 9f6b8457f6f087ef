use super::predicate::{Bound, build_where, push_where};
use crate::column::Column;
use crate::error::{TabError, TabResult};
use crate::sql::Sql;

fn join<S: AsRef<str>>(items: &[S]) -> String {
    items.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(", ")
}

// ==================== Textual forms ====================

/// `INSERT INTO name (cols) VALUES (vals)`
///
/// Column and value counts must match.
pub fn insert<C, V>(name: &str, columns: &[C], values: &[V]) -> TabResult<String>
where
    C: AsRef<str>,
    V: AsRef<str>,
{
    if columns.len() != values.len() {
        return Err(TabError::mismatch(columns.len(), values.len()));
    }
    if columns.is_empty() {
        return Err(TabError::validation("insert needs at least one column"));
    }
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        name,
        join(columns),
        join(values)
    ))
}

/// `SELECT * FROM name`
pub fn select_all(name: &str) -> String {
    format!("SELECT * FROM {}", name)
}

/// `SELECT column FROM name`
pub fn select_column(column: &str, name: &str) -> String {
    format!("SELECT {} FROM {}", column, name)
}

/// `SELECT * FROM name WHERE ...`
pub fn select_where<C, V>(name: &str, columns: &[C], values: &[V]) -> TabResult<String>
where
    C: AsRef<str>,
    V: AsRef<str>,
{
    Ok(format!(
        "{} WHERE {}",
        select_all(name),
        build_where(columns, values)?
    ))
}

/// `DELETE FROM name WHERE ...`
pub fn delete_where<C, V>(name: &str, columns: &[C], values: &[V]) -> TabResult<String>
where
    C: AsRef<str>,
    V: AsRef<str>,
{
    Ok(format!(
        "DELETE FROM {} WHERE {}",
        name,
        build_where(columns, values)?
    ))
}

/// `DELETE FROM name`
pub fn delete_all(name: &str) -> String {
    format!("DELETE FROM {}", name)
}

/// `UPDATE name SET set_column = set_value WHERE where_column = where_value`
pub fn update(
    name: &str,
    set_column: &str,
    set_value: &str,
    where_column: &str,
    where_value: &str,
) -> String {
    format!(
        "UPDATE {} SET {} = {} WHERE {} = {}",
        name, set_column, set_value, where_column, where_value
    )
}

/// `UPDATE name SET set_column = set_value WHERE ...`
pub fn update_where<C, V>(
    name: &str,
    set_column: &str,
    set_value: &str,
    columns: &[C],
    values: &[V],
) -> TabResult<String>
where
    C: AsRef<str>,
    V: AsRef<str>,
{
    Ok(format!(
        "UPDATE {} SET {} = {} WHERE {}",
        name,
        set_column,
        set_value,
        build_where(columns, values)?
    ))
}

// ==================== Bound forms ====================

fn push_columns<'a>(
    sql: &mut Sql,
    columns: impl IntoIterator<Item = &'a Column>,
    project: bool,
) -> TabResult<()> {
    for (i, column) in columns.into_iter().enumerate() {
        if i > 0 {
            sql.push(", ");
        }
        sql.push_ident(column.name())?;
        if project && !column.is_textual() {
            sql.push("::text");
        }
    }
    Ok(())
}

/// `INSERT INTO name (cols) VALUES ($1, $2::text::TYPE, ...)`
pub fn insert_bound(name: &str, values: &[Bound<'_>]) -> TabResult<Sql> {
    if values.is_empty() {
        return Err(TabError::validation("insert needs at least one column"));
    }

    let mut sql = Sql::new("INSERT INTO ");
    sql.push_ident(name)?.push(" (");
    push_columns(&mut sql, values.iter().map(|b| b.column), false)?;
    sql.push(") VALUES (");
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            sql.push(", ");
        }
        value.push_to(&mut sql);
    }
    sql.push(")");
    Ok(sql)
}

/// `SELECT cols FROM name`, non-textual columns projected as `col::text`.
pub fn select_bound(name: &str, columns: &[Column]) -> TabResult<Sql> {
    if columns.is_empty() {
        return Err(TabError::validation("select needs at least one column"));
    }

    let mut sql = Sql::new("SELECT ");
    push_columns(&mut sql, columns, true)?;
    sql.push(" FROM ");
    sql.push_ident(name)?;
    Ok(sql)
}

/// `SELECT cols FROM name WHERE ...`
pub fn select_where_bound(name: &str, columns: &[Column], keys: &[Bound<'_>]) -> TabResult<Sql> {
    let mut sql = select_bound(name, columns)?;
    push_where(&mut sql, keys)?;
    Ok(sql)
}

/// `SELECT 1::text FROM name WHERE ... LIMIT 1`
///
/// The marker is projected as text like every other row-returning statement.
pub fn exists_where_bound(name: &str, keys: &[Bound<'_>]) -> TabResult<Sql> {
    let mut sql = Sql::new("SELECT 1::text FROM ");
    sql.push_ident(name)?;
    push_where(&mut sql, keys)?;
    sql.push(" LIMIT 1");
    Ok(sql)
}

/// `UPDATE name SET col = $1 WHERE ...`
pub fn update_where_bound(name: &str, set: &Bound<'_>, keys: &[Bound<'_>]) -> TabResult<Sql> {
    let mut sql = Sql::new("UPDATE ");
    sql.push_ident(name)?.push(" SET ");
    sql.push_ident(set.column.name())?.push(" = ");
    set.push_to(&mut sql);
    push_where(&mut sql, keys)?;
    Ok(sql)
}

/// `DELETE FROM name WHERE ...`
pub fn delete_where_bound(name: &str, keys: &[Bound<'_>]) -> TabResult<Sql> {
    let mut sql = Sql::new("DELETE FROM ");
    sql.push_ident(name)?;
    push_where(&mut sql, keys)?;
    Ok(sql)
}
