use crate::column::Column;
use crate::error::{TabError, TabResult};
use crate::sql::Sql;

/// A column and the storage text bound against it (`None` is SQL NULL).
#[derive(Debug, Clone, PartialEq)]
pub struct Bound<'a> {
    pub column: &'a Column,
    pub value: Option<String>,
}

impl<'a> Bound<'a> {
    pub fn new(column: &'a Column, value: Option<String>) -> Self {
        Self { column, value }
    }

    /// Push this value's placeholder, cast to the column type when needed.
    pub(crate) fn push_to(&self, sql: &mut Sql) {
        sql.push_bind_cast(self.value.clone(), self.column.bind_cast().as_deref());
    }
}

/// `col1 = val1 AND col2 = val2 ...` from parallel, already-escaped inputs.
///
/// Values are interpolated verbatim; escape them with
/// [`ValueCodec::sql_literal`](crate::ValueCodec::sql_literal) first.
pub fn build_where<C, V>(columns: &[C], values: &[V]) -> TabResult<String>
where
    C: AsRef<str>,
    V: AsRef<str>,
{
    if columns.len() != values.len() {
        return Err(TabError::mismatch(columns.len(), values.len()));
    }
    if columns.is_empty() {
        return Err(TabError::mismatch(1, 0));
    }

    let predicates: Vec<String> = columns
        .iter()
        .zip(values)
        .map(|(c, v)| format!("{} = {}", c.as_ref(), v.as_ref()))
        .collect();
    Ok(predicates.join(" AND "))
}

/// Append ` WHERE ...` with one bound equality per key; NULL keys render `IS NULL`.
pub(crate) fn push_where(sql: &mut Sql, keys: &[Bound<'_>]) -> TabResult<()> {
    if keys.is_empty() {
        return Err(TabError::mismatch(1, 0));
    }

    sql.push(" WHERE ");
    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            sql.push(" AND ");
        }
        sql.push_ident(key.column.name())?;
        if key.value.is_some() {
            sql.push(" = ");
            key.push_to(sql);
        } else {
            sql.push(" IS NULL");
        }
    }
    Ok(())
}
