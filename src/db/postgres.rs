//! PostgreSQL destination using sqlx

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::query_builder::Separated;
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};
use std::time::Duration;
use tracing::debug;

use crate::coerce::Cell;
use crate::db::destination::{rows_per_statement, Destination, WriteMode};
use crate::db::sql;
use crate::error::WriteError;
use crate::schema::{ColumnType, TableSpec};

/// Bind parameters the wire protocol allows in one statement
pub const MAX_BIND_PARAMETERS: usize = u16::MAX as usize;

/// A pool capped at one connection, so a run holds exactly one session
pub struct PostgresDestination {
    pool: PgPool,
}

impl PostgresDestination {
    pub async fn connect(options: PgConnectOptions) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        // Test the connection
        sqlx::query("SELECT 1").execute(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn push_cell(row: &mut Separated<'_, '_, Postgres, &'static str>, cell: &Cell) {
    match cell {
        Cell::Text(v) => {
            row.push_bind(v.clone());
        }
        Cell::Float(v) => {
            row.push_bind(*v);
        }
        Cell::Integer(v) => {
            row.push_bind(*v);
        }
        Cell::Boolean(v) => {
            row.push_bind(*v);
        }
        Cell::Date(v) => {
            row.push_bind(*v);
        }
        Cell::Json(v) => {
            row.push_bind(v.clone().map(Json));
        }
    }
}

#[async_trait]
impl Destination for PostgresDestination {
    async fn write_batch(
        &mut self,
        table: &TableSpec,
        rows: &[Vec<Cell>],
        mode: WriteMode,
        insert_chunk_size: usize,
    ) -> Result<u64, WriteError> {
        let mut tx = self.pool.begin().await?;

        match mode {
            WriteMode::ReplaceTable => {
                sqlx::query(&sql::drop_table(table)).execute(&mut *tx).await?;
                sqlx::query(&sql::create_table(table, false, ColumnType::postgres_type))
                    .execute(&mut *tx)
                    .await?;
            }
            WriteMode::Append => {
                sqlx::query(&sql::create_table(table, true, ColumnType::postgres_type))
                    .execute(&mut *tx)
                    .await?;
            }
        }

        let chunk_size = rows_per_statement(insert_chunk_size, table.columns.len(), MAX_BIND_PARAMETERS);
        let mut written = 0u64;
        for chunk in rows.chunks(chunk_size) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(sql::insert_prefix(table));
            builder.push_values(chunk, |mut row, cells| {
                for cell in cells {
                    push_cell(&mut row, cell);
                }
            });
            let result = builder.build().execute(&mut *tx).await?;
            written += result.rows_affected();
            debug!(table = table.name, rows = chunk.len(), "Inserted chunk");
        }

        tx.commit().await?;
        Ok(written)
    }

    async fn count_rows(&mut self, table: &str) -> Result<i64, WriteError> {
        let count: i64 = sqlx::query_scalar(&sql::count_rows(table))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn close(self: Box<Self>) -> Result<(), WriteError> {
        self.pool.close().await;
        Ok(())
    }
}
