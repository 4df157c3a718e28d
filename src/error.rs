//! Error types for a generation run

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading schema metadata
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The provider has no table with this name
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// The underlying database could not be queried
    #[error("Schema query failed for {table}: {source}")]
    Query {
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A schema snapshot file could not be parsed
    #[error("Invalid schema snapshot: {0}")]
    Snapshot(String),
}

/// Errors that abort a generation run
///
/// None of these are recoverable: the first one stops the whole run, because
/// lookup definitions depend on a consistent view of every table.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// A working column has no SQL type in the schema
    #[error("Unknown column type for column {column}, table {table}")]
    UnknownColumnType { table: String, column: String },

    /// A merge override references an alias that is not declared
    #[error("Unknown merge alias \"{alias}\" for column {column}, table {table}")]
    MissingAlias {
        table: String,
        column: String,
        alias: String,
    },

    /// The configured success handler type is not supported
    #[error("Unknown success handler type: {0}")]
    UnsupportedHandlerType(String),

    /// The requested configuration block does not exist in the file
    #[error("Identifier not found: {identifier}, in {}", file.display())]
    MissingIdentifier { identifier: String, file: PathBuf },

    /// Schema metadata could not be read
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The configuration block does not have the expected shape
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// An artifact could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_yaml::Error),

    /// An artifact could not be written
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = GenerateError> = std::result::Result<T, E>;
