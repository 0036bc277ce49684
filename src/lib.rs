pub mod coerce;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod schema;

// Database module for PostgreSQL and SQLite destinations
pub mod db;

pub use config::{ConnectionParams, LoadMode, LoadOptions};
pub use error::{LoadError, Result, WriteError};
pub use ingestion::{run_load, BatchLoader, LoadReport};
pub use schema::Dataset;
