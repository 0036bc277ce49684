//! Batch Loader - drives one load run from source file to destination table
//!
//! Run states: `Init -> Connected -> WritingFirstBatch -> WritingAppendBatch* -> Done`.
//! Any failure moves the run to `Failed` and aborts the remaining batches.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::{ConnectionParams, LoadOptions};
use crate::db::{self, Destination, WriteMode};
use crate::error::{LoadError, Result, WriteError};
use crate::ingestion::{BatchReader, BatchWriter};
use crate::schema::Dataset;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Connected,
    WritingFirstBatch,
    WritingAppendBatch,
    Done,
    Failed,
}

/// Per-batch progress notice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    pub batch: usize,
    pub rows: u64,
    pub total_rows: u64,
    pub mode: WriteMode,
}

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub run_id: String,
    pub dataset: Dataset,
    pub table: &'static str,
    pub batches: usize,
    pub rows: u64,
    pub elapsed: Duration,
}

pub struct BatchLoader {
    run_id: String,
    dataset: Dataset,
    source: PathBuf,
    options: LoadOptions,
    state: RunState,
}

impl BatchLoader {
    pub fn new(dataset: Dataset, source: impl Into<PathBuf>, options: LoadOptions) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            dataset,
            source: source.into(),
            options,
            state: RunState::Init,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Load the whole source file through `destination`.
    ///
    /// `progress` is called after every committed batch.
    pub async fn load<F>(&mut self, destination: &mut dyn Destination, mut progress: F) -> Result<LoadReport>
    where
        F: FnMut(&BatchProgress),
    {
        let started = Instant::now();
        self.state = RunState::Connected;
        info!(
            run_id = %self.run_id,
            dataset = %self.dataset,
            source = %self.source.display(),
            batch_size = self.options.batch_size,
            "Starting load"
        );

        match self.write_all(destination, &mut progress).await {
            Ok((batches, rows)) => {
                self.state = RunState::Done;
                let report = LoadReport {
                    run_id: self.run_id.clone(),
                    dataset: self.dataset,
                    table: self.dataset.table().name,
                    batches,
                    rows,
                    elapsed: started.elapsed(),
                };
                info!(
                    run_id = %report.run_id,
                    table = report.table,
                    batches = report.batches,
                    rows = report.rows,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "Load finished"
                );
                Ok(report)
            }
            Err(e) => {
                self.state = RunState::Failed;
                error!(run_id = %self.run_id, error = %e, "Load failed");
                Err(e)
            }
        }
    }

    async fn write_all<F>(&mut self, destination: &mut dyn Destination, progress: &mut F) -> Result<(usize, u64)>
    where
        F: FnMut(&BatchProgress),
    {
        self.options.validate()?;
        let reader = BatchReader::open(&self.source, self.options.batch_size)?;
        let mut writer = BatchWriter::new(destination, self.dataset.table(), self.options.insert_chunk_size);

        let mut mode = WriteMode::initial(self.options.mode);
        let mut batches = 0usize;
        let mut total_rows = 0u64;

        for batch in reader {
            let batch = batch?;
            self.state = if batches == 0 {
                RunState::WritingFirstBatch
            } else {
                RunState::WritingAppendBatch
            };

            let rows = writer.write(&batch, mode).await?;
            batches += 1;
            total_rows += rows;
            progress(&BatchProgress {
                batch: batch.index,
                rows,
                total_rows,
                mode,
            });
            mode = mode.next();
        }

        Ok((batches, total_rows))
    }
}

/// Connect, load one dataset, and release the connection whatever the outcome.
///
/// Missing connection parameters fail with [`LoadError::Configuration`]
/// before any connection attempt or file read.
pub async fn run_load<F>(
    params: &ConnectionParams,
    dataset: Dataset,
    source: impl Into<PathBuf>,
    options: LoadOptions,
    progress: F,
) -> Result<LoadReport>
where
    F: FnMut(&BatchProgress),
{
    options.validate()?;

    let mut destination = db::connect(params).await?.ok_or_else(|| {
        LoadError::Configuration(format!(
            "missing connection parameters: {}",
            params.missing().join(", ")
        ))
    })?;

    let mut loader = BatchLoader::new(dataset, source, options);
    let outcome = loader.load(destination.as_mut(), progress).await;
    let closed = destination.close().await;
    settle(outcome, closed)
}

/// Combine the load outcome with the connection release. A load failure
/// wins; a release failure after a successful load is a connection error.
fn settle(outcome: Result<LoadReport>, closed: std::result::Result<(), WriteError>) -> Result<LoadReport> {
    match (outcome, closed) {
        (Ok(report), Ok(())) => Ok(report),
        (Ok(_), Err(e)) => Err(LoadError::Connection(format!("failed to release connection: {}", e))),
        (Err(load_error), Err(e)) => {
            warn!(error = %e, "Failed to release connection after failed load");
            Err(load_error)
        }
        (Err(load_error), Ok(())) => Err(load_error),
    }
}
