//! Error Types Module
//!
//! One taxonomy for the whole pipeline. Loading and schema failures are
//! fatal and propagate with `?`; per-cell undefined statistics are NOT
//! errors and surface as NaN markers in the summary tables instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A required column is absent from an input file.
    #[error("schema error in {file}: missing required column '{column}'")]
    Schema { file: PathBuf, column: String },

    /// The input directory contains no CSV files.
    #[error("no CSV input files found in {dir}")]
    NoInputFiles { dir: PathBuf },

    /// A comparison needs at least two country groups with data.
    #[error("statistical comparison needs at least 2 country groups, found {found}")]
    InsufficientGroups { found: usize },

    /// A timestamp cell could not be parsed.
    #[error("unparseable timestamp '{value}' in {file} line {line}")]
    Timestamp { file: PathBuf, line: usize, value: String },

    /// A numeric cell could not be parsed.
    #[error("unparseable number '{value}' in column {column} of {file} line {line}")]
    Numeric { file: PathBuf, line: usize, column: String, value: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Rendering failure from the plotting backend.
    #[error("plot error: {0}")]
    Plot(String),
}

pub type Result<T> = std::result::Result<T, Error>;
