//! SQL text shared by the PostgreSQL and SQLite destinations

use itertools::Itertools;

use crate::schema::{ColumnType, TableSpec};

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn drop_table(table: &TableSpec) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_ident(table.name))
}

/// `CREATE TABLE` with the unique key declared as primary key
pub fn create_table(table: &TableSpec, if_not_exists: bool, sql_type: fn(&ColumnType) -> &'static str) -> String {
    let columns = table
        .columns
        .iter()
        .map(|c| {
            let mut def = format!("{} {}", quote_ident(c.name), sql_type(&c.column_type));
            if c.name == table.key {
                def.push_str(" PRIMARY KEY");
            }
            def
        })
        .join(", ");

    format!(
        "CREATE TABLE {}{} ({})",
        if if_not_exists { "IF NOT EXISTS " } else { "" },
        quote_ident(table.name),
        columns
    )
}

/// `INSERT INTO "t" ("a", "b") ` - values are appended by the caller
pub fn insert_prefix(table: &TableSpec) -> String {
    format!(
        "INSERT INTO {} ({}) ",
        quote_ident(table.name),
        table.column_names().map(quote_ident).join(", ")
    )
}

pub fn count_rows(table: &str) -> String {
    format!("SELECT COUNT(*) FROM {}", quote_ident(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::REVIEW_TABLE;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("raw_yelp_review"), "\"raw_yelp_review\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_create_table_postgres() {
        let sql = create_table(&REVIEW_TABLE, false, ColumnType::postgres_type);
        assert!(sql.starts_with("CREATE TABLE \"raw_yelp_review\" ("));
        assert!(sql.contains("\"review_id\" TEXT PRIMARY KEY"));
        assert!(sql.contains("\"date\" DATE"));
        assert!(sql.contains("\"cool\" INTEGER"));
    }

    #[test]
    fn test_create_table_if_not_exists() {
        let sql = create_table(&REVIEW_TABLE, true, ColumnType::sqlite_type);
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"raw_yelp_review\""));
    }

    #[test]
    fn test_insert_prefix() {
        let sql = insert_prefix(&REVIEW_TABLE);
        assert_eq!(
            sql,
            "INSERT INTO \"raw_yelp_review\" (\"review_id\", \"user_id\", \"business_id\", \"stars\", \"date\", \"text\", \"useful\", \"funny\", \"cool\") "
        );
    }
}
