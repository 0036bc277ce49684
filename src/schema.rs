//! Destination table schemas for the Yelp datasets
//!
//! Each dataset maps 1:1 to a raw table. The column list is the explicit
//! field-to-type mapping handed to the batch writer; source fields not listed
//! here are ignored.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Target column type of a destination table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Text,
    Float,
    Integer,
    Boolean,
    Date,
    Jsonb,
}

impl ColumnType {
    pub fn postgres_type(&self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Float => "DOUBLE PRECISION",
            ColumnType::Integer => "INTEGER",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Date => "DATE",
            ColumnType::Jsonb => "JSONB",
        }
    }

    pub fn sqlite_type(&self) -> &'static str {
        match self {
            ColumnType::Text | ColumnType::Jsonb => "TEXT",
            ColumnType::Float => "REAL",
            ColumnType::Integer => "INTEGER",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Date => "DATE",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Text => "text",
            ColumnType::Float => "float",
            ColumnType::Integer => "integer",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
            ColumnType::Jsonb => "jsonb",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub column_type: ColumnType,
}

const fn col(name: &'static str, column_type: ColumnType) -> ColumnSpec {
    ColumnSpec { name, column_type }
}

/// Destination table: name, unique key and typed columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    pub key: &'static str,
    pub columns: &'static [ColumnSpec],
}

impl TableSpec {
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }
}

pub static BUSINESS_TABLE: TableSpec = TableSpec {
    name: "raw_yelp_business",
    key: "business_id",
    columns: &[
        col("business_id", ColumnType::Text),
        col("name", ColumnType::Text),
        col("address", ColumnType::Text),
        col("city", ColumnType::Text),
        col("state", ColumnType::Text),
        col("postal_code", ColumnType::Text),
        col("latitude", ColumnType::Float),
        col("longitude", ColumnType::Float),
        col("stars", ColumnType::Float),
        col("review_count", ColumnType::Integer),
        col("is_open", ColumnType::Boolean),
        col("attributes", ColumnType::Jsonb),
        col("categories", ColumnType::Text),
        col("hours", ColumnType::Jsonb),
    ],
};

pub static REVIEW_TABLE: TableSpec = TableSpec {
    name: "raw_yelp_review",
    key: "review_id",
    columns: &[
        col("review_id", ColumnType::Text),
        col("user_id", ColumnType::Text),
        col("business_id", ColumnType::Text),
        col("stars", ColumnType::Integer),
        col("date", ColumnType::Date),
        col("text", ColumnType::Text),
        col("useful", ColumnType::Integer),
        col("funny", ColumnType::Integer),
        col("cool", ColumnType::Integer),
    ],
};

/// The two Yelp datasets this loader knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dataset {
    Business,
    Review,
}

impl Dataset {
    pub fn table(&self) -> &'static TableSpec {
        match self {
            Dataset::Business => &BUSINESS_TABLE,
            Dataset::Review => &REVIEW_TABLE,
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Dataset::Business => "yelp_academic_dataset_business.json",
            Dataset::Review => "yelp_academic_dataset_review.json",
        }
    }

    /// Source file location under the default `data/` directory
    pub fn default_source(&self) -> PathBuf {
        PathBuf::from("data").join(self.file_name())
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dataset::Business => f.write_str("business"),
            Dataset::Review => f.write_str("review"),
        }
    }
}
