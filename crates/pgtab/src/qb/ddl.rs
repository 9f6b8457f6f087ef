use crate::column::Column;

/// `CREATE TABLE IF NOT EXISTS name (col DDL, ...);`
///
/// An existing table of the same name is reused as is; columns are not compared.
pub fn create_table(name: &str, columns: &[Column]) -> String {
    let columns: Vec<String> = columns.iter().map(Column::to_ddl_fragment).collect();
    format!("CREATE TABLE IF NOT EXISTS {} ({});", name, columns.join(", "))
}

/// `DROP TABLE name`
pub fn drop_table(name: &str) -> String {
    format!("DROP TABLE {}", name)
}
