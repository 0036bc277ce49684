//! Batch writer - typed column mapping in front of a destination

use tracing::info;

use crate::coerce::coerce_row;
use crate::db::{Destination, WriteMode};
use crate::error::{LoadError, Result};
use crate::ingestion::Batch;
use crate::schema::TableSpec;

pub struct BatchWriter<'a> {
    destination: &'a mut dyn Destination,
    table: &'static TableSpec,
    insert_chunk_size: usize,
}

impl<'a> BatchWriter<'a> {
    pub fn new(destination: &'a mut dyn Destination, table: &'static TableSpec, insert_chunk_size: usize) -> Self {
        Self {
            destination,
            table,
            insert_chunk_size,
        }
    }

    pub fn table(&self) -> &'static TableSpec {
        self.table
    }

    /// Coerce and write one batch.
    ///
    /// Every failure, coercion or database side, comes back as
    /// [`LoadError::Load`] carrying the original cause. Nothing is written
    /// when coercion fails.
    pub async fn write(&mut self, batch: &Batch, mode: WriteMode) -> Result<u64> {
        let table = self.table;
        let cells = batch
            .rows
            .iter()
            .enumerate()
            .map(|(offset, row)| coerce_row(row, table, batch.first_row + offset))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| LoadError::load(table.name, batch.index, e))?;

        let written = self
            .destination
            .write_batch(table, &cells, mode, self.insert_chunk_size)
            .await
            .map_err(|e| LoadError::load(table.name, batch.index, e))?;

        info!(
            table = table.name,
            batch = batch.index,
            rows = written,
            mode = %mode,
            "Loaded chunk"
        );
        Ok(written)
    }
}
