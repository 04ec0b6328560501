use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StemError>;

/// Failures raised while loading, encoding, fitting, or explaining.
#[derive(Debug, Error)]
pub enum StemError {
    #[error("Training file ('{file}') missing required label column '{column}'")]
    MissingLabelColumn { column: String, file: String },

    #[error("File '{file}' is missing column '{column}'")]
    MissingColumn { column: String, file: String },

    #[error("File '{file}' has duplicate column '{column}'")]
    DuplicateColumn { column: String, file: String },

    #[error("No feature columns found in '{file}'")]
    EmptyTable { file: String },

    #[error("Feature schema mismatch: expected [{}], found [{}]", expected.join(", "), found.join(", "))]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Label '{value}' was not seen in the training labels")]
    UnseenLabel { value: String },

    #[error("Category '{value}' in column '{column}' was not seen in the training data")]
    UnseenCategory { column: String, value: String },

    #[error("Invalid numeric value '{value}' in column '{column}' at row {row}")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Missing value in numeric column '{column}' at row {row}")]
    MissingValue { column: String, row: usize },

    #[error("Need at least two distinct classes to fit a classifier, found {found}")]
    TooFewClasses { found: usize },

    #[error("Length mismatch: expected {expected}, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}
