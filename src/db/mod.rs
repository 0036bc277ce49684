//! Database module for the load destinations
//!
//! PostgreSQL is the production destination; SQLite serves local loads and tests.

pub mod connection;
pub mod destination;
pub mod postgres;
pub mod sql;
pub mod sqlite;

pub use connection::{connect, postgres_options};
pub use destination::{Destination, WriteMode};
pub use postgres::PostgresDestination;
pub use sqlite::SqliteDestination;
