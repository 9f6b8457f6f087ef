//! Tests for the qb module.

use crate::column::Column;
use crate::qb::*;

fn users() -> Vec<Column> {
    vec![
        Column::new("id", "TEXT").primary_key(),
        Column::new("age", "INTEGER"),
    ]
}

fn text(s: &str) -> Option<String> {
    Some(s.to_string())
}

#[test]
fn test_create_table() {
    assert_eq!(
        create_table("users", &users()),
        "CREATE TABLE IF NOT EXISTS users (id TEXT PRIMARY KEY, age INTEGER);"
    );
}

#[test]
fn test_drop_table() {
    assert_eq!(drop_table("users"), "DROP TABLE users");
}

#[test]
fn test_build_where_joins_with_and() {
    assert_eq!(build_where(&["a", "b"], &["1", "2"]).unwrap(), "a = 1 AND b = 2");
    assert_eq!(build_where(&["a"], &["1"]).unwrap(), "a = 1");
}

#[test]
fn test_build_where_rejects_bad_input() {
    let err = build_where(&["a", "b"], &["1"]).unwrap_err();
    assert!(err.is_argument_mismatch());

    let empty: [&str; 0] = [];
    assert!(build_where(&empty, &empty).unwrap_err().is_argument_mismatch());
}

#[test]
fn test_insert_textual() {
    assert_eq!(
        insert("users", &["id", "age"], &["'u1'", "'30'"]).unwrap(),
        "INSERT INTO users (id, age) VALUES ('u1', '30')"
    );
}

#[test]
fn test_insert_textual_mismatch() {
    let err = insert("users", &["a", "b"], &["1"]).unwrap_err();
    assert!(err.is_argument_mismatch());
}

#[test]
fn test_select_and_delete_textual() {
    assert_eq!(select_all("users"), "SELECT * FROM users");
    assert_eq!(select_column("age", "users"), "SELECT age FROM users");
    assert_eq!(
        select_where("users", &["id"], &["'u1'"]).unwrap(),
        "SELECT * FROM users WHERE id = 'u1'"
    );
    assert_eq!(
        delete_where("users", &["id", "age"], &["'u1'", "'30'"]).unwrap(),
        "DELETE FROM users WHERE id = 'u1' AND age = '30'"
    );
    assert_eq!(delete_all("users"), "DELETE FROM users");
}

#[test]
fn test_update_textual() {
    assert_eq!(
        update("users", "age", "'31'", "id", "'u1'"),
        "UPDATE users SET age = '31' WHERE id = 'u1'"
    );
    assert_eq!(
        update_where("users", "age", "'31'", &["id", "age"], &["'u1'", "'30'"]).unwrap(),
        "UPDATE users SET age = '31' WHERE id = 'u1' AND age = '30'"
    );
}

#[test]
fn test_insert_bound_casts_non_text_columns() {
    let cols = users();
    let q = insert_bound(
        "users",
        &[Bound::new(&cols[0], text("u1")), Bound::new(&cols[1], text("30"))],
    )
    .unwrap();
    assert_eq!(
        q.to_sql(),
        "INSERT INTO users (id, age) VALUES ($1, $2::text::INTEGER)"
    );
    assert_eq!(q.params(), &[text("u1"), text("30")]);
}

#[test]
fn test_select_where_bound_projects_text() {
    let cols = users();
    let q = select_where_bound("users", &cols, &[Bound::new(&cols[0], text("u1"))]).unwrap();
    assert_eq!(q.to_sql(), "SELECT id, age::text FROM users WHERE id = $1");
}

#[test]
fn test_null_key_renders_is_null() {
    let cols = users();
    let q = delete_where_bound(
        "users",
        &[Bound::new(&cols[1], None), Bound::new(&cols[0], text("u1"))],
    )
    .unwrap();
    assert_eq!(q.to_sql(), "DELETE FROM users WHERE age IS NULL AND id = $1");
    assert_eq!(q.params(), &[text("u1")]);
}

#[test]
fn test_update_and_exists_bound() {
    let cols = users();
    let q = update_where_bound(
        "users",
        &Bound::new(&cols[1], text("31")),
        &[Bound::new(&cols[0], text("u1"))],
    )
    .unwrap();
    assert_eq!(
        q.to_sql(),
        "UPDATE users SET age = $1::text::INTEGER WHERE id = $2"
    );

    let q = exists_where_bound("users", &[Bound::new(&cols[0], text("u1"))]).unwrap();
    assert_eq!(q.to_sql(), "SELECT 1::text FROM users WHERE id = $1 LIMIT 1");
}

#[test]
fn test_row_returning_statements_project_only_text() {
    use crate::testing::non_text_projections;

    let cols = vec![
        Column::new("id", "TEXT").primary_key(),
        Column::new("age", "INTEGER"),
        Column::new("name", "VARCHAR(20)"),
        Column::new("doc", "JSONB"),
        Column::new("born", "DATE"),
    ];
    let keys = [Bound::new(&cols[0], text("u1")), Bound::new(&cols[1], text("30"))];

    let statements = [
        select_bound("users", &cols).unwrap(),
        select_where_bound("users", &cols, &keys).unwrap(),
        select_where_bound("users", &cols[3..4], &keys).unwrap(),
        exists_where_bound("users", &keys).unwrap(),
    ];
    for q in &statements {
        let sql = q.to_sql();
        assert!(non_text_projections(&sql).is_empty(), "{sql}");
    }
    assert_eq!(
        statements[0].to_sql(),
        "SELECT id, age::text, name, doc::text, born::text FROM users"
    );

    assert_eq!(non_text_projections("SELECT 1 FROM users LIMIT 1"), vec!["1"]);
    assert_eq!(non_text_projections("SELECT id, age FROM users"), Vec::<&str>::new());
}

#[test]
fn test_bound_forms_reject_empty_keys_and_bad_identifiers() {
    assert!(delete_where_bound("users", &[]).unwrap_err().is_argument_mismatch());

    let bad = Column::new("age; --", "INTEGER");
    assert!(exists_where_bound("users", &[Bound::new(&bad, text("1"))]).is_err());
    assert!(select_bound("users x", &users()).is_err());
    assert!(insert_bound("users", &[]).is_err());
}
