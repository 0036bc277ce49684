//! Chunked reader for line-delimited JSON
//!
//! Yields fixed-size batches lazily; only the current batch is held in
//! memory. Restarting means opening the file again.

use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use crate::error::{LoadError, Result};
use crate::ingestion::{Batch, Row};

pub struct BatchReader<R: BufRead> {
    path: PathBuf,
    lines: Lines<R>,
    batch_size: usize,
    line_number: usize,
    rows_read: usize,
    batches_read: usize,
    finished: bool,
}

impl BatchReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>, batch_size: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| LoadError::read(path, e.to_string()))?;
        Self::from_reader(BufReader::new(file), path, batch_size)
    }
}

impl<R: BufRead> BatchReader<R> {
    /// Wrap any buffered reader; `path` is only used in error messages
    pub fn from_reader(reader: R, path: impl Into<PathBuf>, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(LoadError::Configuration("batch size must be greater than zero".to_string()));
        }
        Ok(Self {
            path: path.into(),
            lines: reader.lines(),
            batch_size,
            line_number: 0,
            rows_read: 0,
            batches_read: 0,
            finished: false,
        })
    }

    /// Rows produced so far
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    fn parse_line(&self, line: &str) -> Result<Row> {
        match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(LoadError::read(
                &self.path,
                format!("line {}: expected a JSON object", self.line_number),
            )),
            Err(e) => Err(LoadError::read(
                &self.path,
                format!("line {}: {}", self.line_number, e),
            )),
        }
    }
}

impl<R: BufRead> Iterator for BatchReader<R> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let first_row = self.rows_read + 1;
        let mut rows = Vec::with_capacity(self.batch_size.min(16_384));

        while rows.len() < self.batch_size {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(LoadError::read(
                        &self.path,
                        format!("line {}: {}", self.line_number + 1, e),
                    )));
                }
                None => {
                    self.finished = true;
                    break;
                }
            };
            self.line_number += 1;

            if line.trim().is_empty() {
                continue;
            }

            match self.parse_line(&line) {
                Ok(row) => rows.push(row),
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }

        if rows.is_empty() {
            return None;
        }

        self.rows_read += rows.len();
        self.batches_read += 1;
        Some(Ok(Batch {
            index: self.batches_read,
            first_row,
            rows,
        }))
    }
}
