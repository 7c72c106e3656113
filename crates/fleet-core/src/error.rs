use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the fleet evaluation pipeline.
#[derive(Error, Debug)]
pub enum FleetError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A required input table was not found in the input directory.
    #[error("Missing required table '{table}' ({file_name}) in {dir}")]
    MissingTable {
        table: String,
        file_name: String,
        dir: PathBuf,
    },

    /// A required column is absent from a table header.
    #[error("Table '{table}' ({path}) is missing required column '{column}'")]
    MissingColumn {
        table: String,
        column: String,
        path: PathBuf,
    },

    /// A numeric cell held something other than a number.
    #[error("Malformed value in table '{table}', row {row}, column '{column}': {value:?}")]
    MalformedValue {
        table: String,
        row: usize,
        column: String,
        value: String,
    },

    /// The input directory does not exist.
    #[error("Input directory not found: {0}")]
    InputDirNotFound(PathBuf),

    /// A CSV document could not be parsed or written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A JSON document could not be parsed or written.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A filter value is not one of the recognised labels.
    #[error("Invalid filter value: {0}")]
    InvalidFilter(String),

    /// The unit pattern is not a valid regular expression.
    #[error("Invalid unit pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// An xlsx workbook could not be opened, read or written.
    #[error("Workbook error in {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the fleet crates.
pub type Result<T> = std::result::Result<T, FleetError>;
