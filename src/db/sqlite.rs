//! SQLite destination using rusqlite
//!
//! Used for local loads without a PostgreSQL server. JSONB columns are stored
//! as JSON text, dates as `YYYY-MM-DD` text and booleans as 0/1.

use async_trait::async_trait;
use itertools::Itertools;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use std::path::Path;
use tracing::debug;

use crate::coerce::Cell;
use crate::db::destination::{rows_per_statement, Destination, WriteMode};
use crate::db::sql;
use crate::error::WriteError;
use crate::schema::{ColumnType, TableSpec};

/// SQLITE_MAX_VARIABLE_NUMBER of the bundled library
pub const MAX_BIND_PARAMETERS: usize = 32_766;

pub struct SqliteDestination {
    conn: Connection,
}

impl SqliteDestination {
    /// Open a database file, or an in-memory database for `:memory:`
    pub fn open(database: &str) -> Result<Self, rusqlite::Error> {
        let conn = if database == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(Path::new(database))?
        };
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn to_sql_value(cell: &Cell) -> SqlValue {
    match cell {
        Cell::Text(Some(s)) => SqlValue::Text(s.clone()),
        Cell::Float(Some(f)) => SqlValue::Real(*f),
        Cell::Integer(Some(i)) => SqlValue::Integer(i64::from(*i)),
        Cell::Boolean(Some(b)) => SqlValue::Integer(i64::from(*b)),
        Cell::Date(Some(d)) => SqlValue::Text(d.format("%Y-%m-%d").to_string()),
        Cell::Json(Some(v)) => SqlValue::Text(v.to_string()),
        _ => SqlValue::Null,
    }
}

fn values_clause(columns: usize, rows: usize) -> String {
    let tuple = format!("({})", std::iter::repeat("?").take(columns).join(", "));
    format!("VALUES {}", std::iter::repeat(tuple.as_str()).take(rows).join(", "))
}

#[async_trait]
impl Destination for SqliteDestination {
    async fn write_batch(
        &mut self,
        table: &TableSpec,
        rows: &[Vec<Cell>],
        mode: WriteMode,
        insert_chunk_size: usize,
    ) -> Result<u64, WriteError> {
        let tx = self.conn.transaction()?;

        match mode {
            WriteMode::ReplaceTable => {
                tx.execute(&sql::drop_table(table), [])?;
                tx.execute(&sql::create_table(table, false, ColumnType::sqlite_type), [])?;
            }
            WriteMode::Append => {
                tx.execute(&sql::create_table(table, true, ColumnType::sqlite_type), [])?;
            }
        }

        let prefix = sql::insert_prefix(table);
        let chunk_size = rows_per_statement(insert_chunk_size, table.columns.len(), MAX_BIND_PARAMETERS);
        let mut written = 0u64;
        for chunk in rows.chunks(chunk_size) {
            let statement = format!("{}{}", prefix, values_clause(table.columns.len(), chunk.len()));
            let params = chunk.iter().flatten().map(to_sql_value);
            written += tx.execute(&statement, params_from_iter(params))? as u64;
            debug!(table = table.name, rows = chunk.len(), "Inserted chunk");
        }

        tx.commit()?;
        Ok(written)
    }

    async fn count_rows(&mut self, table: &str) -> Result<i64, WriteError> {
        let count = self
            .conn
            .query_row(&sql::count_rows(table), [], |row| row.get::<_, i64>(0))?;
        Ok(count)
    }

    async fn close(self: Box<Self>) -> Result<(), WriteError> {
        self.conn.close().map_err(|(_, e)| WriteError::Sqlite(e))
    }
}
