use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenError {
    #[error("CSV Error")]
    CsvError(#[from] csv::Error),
    #[error("I/O Error")]
    IoError(#[from] io::Error),
    #[error("Malformed timestamp")]
    MalformedTimestamp(#[from] chrono::ParseError),
    #[error("Histogram Error: {0}")]
    Histogram(String),
    #[error("Sample range {low}..={high} is empty")]
    InvalidRange { low: u32, high: u32 },
    #[error("{batches} batches of {systems} systems is too many records")]
    LayoutTooLarge { batches: usize, systems: usize },
    #[error("System prefix {0:?} may not contain whitespace or quotes")]
    InvalidPrefix(String),
    #[error("Percentile bounds {lower}..={upper} must be ordered and within 0..=100")]
    InvalidPercentiles { lower: f64, upper: f64 },
    #[error("Bucket resolution must be positive")]
    InvalidResolution,
    #[error("Expected {expected} records, found {found}")]
    RecordCount { expected: usize, found: usize },
    #[error("Sample value {value} on line {line} is out of range")]
    OutOfRange { line: usize, value: u32 },
    #[error("Line {line} has system id {found}, expected suffix {expected}")]
    SystemOrder {
        line: usize,
        expected: usize,
        found: String,
    },
    #[error("Line {line} has no column {column}")]
    MissingColumn { line: usize, column: usize },
    #[error("Value {value:?} at line {line}, column {column} is not a number")]
    UnparsableValue {
        line: usize,
        column: usize,
        value: String,
    },
}
