use thiserror::Error;

#[derive(Debug, Error)]
pub enum FieldsSourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing header row")]
    MissingHeader,
    #[error("missing required column '{column}'")]
    MissingColumn { column: &'static str },
    #[error("line {line}: invalid {column} '{value}'")]
    InvalidValue {
        line: u64,
        column: &'static str,
        value: String,
    },
}
