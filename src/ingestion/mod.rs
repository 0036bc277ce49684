//! Ingestion Module - chunked JSON source to typed destination table
//!
//! - `reader`: lazy fixed-size batches from line-delimited JSON
//! - `writer`: coerces a batch against the table mapping and writes it
//! - `loader`: drives one run, replace on the first batch and append after

pub mod loader;
pub mod reader;
pub mod writer;

pub use loader::{run_load, BatchLoader, BatchProgress, LoadReport, RunState};
pub use reader::BatchReader;
pub use writer::BatchWriter;

/// One source record, exactly as read from the file
pub type Row = serde_json::Map<String, serde_json::Value>;

/// A bounded group of source rows written as one operation
#[derive(Clone, Debug)]
pub struct Batch {
    /// 1-based position of the batch in the run
    pub index: usize,
    /// 1-based run-wide number of the first row
    pub first_row: usize,
    pub rows: Vec<Row>,
}
