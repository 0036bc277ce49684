use std::path::PathBuf;
use thiserror::Error;

use crate::coerce::CoercionError;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unable to access database: {0}")]
    Connection(String),

    #[error("Invalid driver specified: {0}")]
    UnsupportedDriver(String),

    #[error("Error reading {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    #[error("Error loading data into database (table {table}, batch {batch}): {source}")]
    Load {
        table: String,
        batch: usize,
        #[source]
        source: WriteError,
    },
}

/// Failure while writing a single batch. Always surfaced wrapped in
/// [`LoadError::Load`].
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("{0}")]
    Coercion(#[from] CoercionError),

    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("SQLite error: {}", sqlite_message(.0))]
    Sqlite(#[from] rusqlite::Error),
}

const MAX_DRIVER_MESSAGE: usize = 200;

/// Driver message and result code, without the statement text that rusqlite
/// attaches to prepare failures
fn sqlite_message(error: &rusqlite::Error) -> String {
    let message = match error {
        rusqlite::Error::SqliteFailure(code, Some(msg)) => format!("{} ({:?})", msg, code.code),
        rusqlite::Error::SqlInputError { error, msg, .. } => format!("{} ({:?})", msg, error.code),
        other => other.to_string(),
    };
    if message.chars().count() > MAX_DRIVER_MESSAGE {
        format!("{}...", message.chars().take(MAX_DRIVER_MESSAGE).collect::<String>())
    } else {
        message
    }
}

impl LoadError {
    pub fn read(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        LoadError::Read {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn load(table: &str, batch: usize, source: impl Into<WriteError>) -> Self {
        LoadError::Load {
            table: table.to_string(),
            batch,
            source: source.into(),
        }
    }

    /// True for failures raised while writing a batch.
    pub fn is_load_failure(&self) -> bool {
        matches!(self, LoadError::Load { .. })
    }
}

pub type Result<T> = std::result::Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_sqlite_error_omits_statement_text() {
        let conn = Connection::open_in_memory().unwrap();
        let values = std::iter::repeat("(?)").take(500).collect::<Vec<_>>().join(", ");
        let statement = format!("INSERT INTO missing_table (a) VALUES {}", values);
        let err = conn.execute(&statement, []).unwrap_err();

        let message = LoadError::load("missing_table", 1, err).to_string();
        assert!(message.contains("no such table"), "{}", message);
        assert!(!message.contains("VALUES"), "{}", message);
        assert!(message.len() < 400);
    }

    #[test]
    fn test_long_sqlite_message_is_truncated() {
        let err = rusqlite::Error::ToSqlConversionFailure("x".repeat(1_000).into());
        let message = WriteError::from(err).to_string();
        assert!(message.ends_with("..."));
        assert!(message.chars().count() < 300);
    }
}
