//! Destination trait - a connected database that can receive typed batches

use async_trait::async_trait;

use crate::coerce::Cell;
use crate::config::LoadMode;
use crate::error::WriteError;
use crate::schema::TableSpec;

/// How a single batch lands in its table.
///
/// Threaded explicitly through every write so no call depends on hidden
/// state from an earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Drop and recreate the table, then insert
    ReplaceTable,
    /// Create the table if absent, then insert
    Append,
}

impl WriteMode {
    /// Mode of the first batch of a run
    pub fn initial(mode: LoadMode) -> Self {
        match mode {
            LoadMode::Replace => WriteMode::ReplaceTable,
            LoadMode::Append => WriteMode::Append,
        }
    }

    /// Mode of every batch after the current one
    pub fn next(self) -> Self {
        WriteMode::Append
    }
}

impl std::fmt::Display for WriteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteMode::ReplaceTable => f.write_str("replace"),
            WriteMode::Append => f.write_str("append"),
        }
    }
}

/// Rows per INSERT statement for a table of `columns` columns.
///
/// `requested` is capped so that `rows * columns` never exceeds the backend's
/// `max_params` bind parameters.
pub fn rows_per_statement(requested: usize, columns: usize, max_params: usize) -> usize {
    let cap = (max_params / columns.max(1)).max(1);
    requested.clamp(1, cap)
}

#[async_trait]
pub trait Destination: Send {
    /// Write one batch of coerced rows inside a single transaction.
    ///
    /// `rows` are ordered like `table.columns`. Inserts are split into
    /// statements of at most `insert_chunk_size` rows, fewer when the
    /// backend's bind-parameter limit requires it. Returns the number of
    /// rows inserted.
    async fn write_batch(
        &mut self,
        table: &TableSpec,
        rows: &[Vec<Cell>],
        mode: WriteMode,
        insert_chunk_size: usize,
    ) -> Result<u64, WriteError>;

    async fn count_rows(&mut self, table: &str) -> Result<i64, WriteError>;

    /// Release the underlying connection
    async fn close(self: Box<Self>) -> Result<(), WriteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_mode_sequence() {
        let first = WriteMode::initial(LoadMode::Replace);
        assert_eq!(first, WriteMode::ReplaceTable);
        assert_eq!(first.next(), WriteMode::Append);
        assert_eq!(first.next().next(), WriteMode::Append);
        assert_eq!(WriteMode::initial(LoadMode::Append), WriteMode::Append);
    }

    #[test]
    fn test_rows_per_statement_respects_bind_limit() {
        assert_eq!(rows_per_statement(1_000, 14, 32_766), 1_000);
        assert_eq!(rows_per_statement(10_000, 14, 32_766), 2_340);
        assert_eq!(rows_per_statement(10_000, 9, 65_535), 7_281);
        assert_eq!(rows_per_statement(0, 9, 65_535), 1);
        assert_eq!(rows_per_statement(5, 0, 10), 5);
    }
}
