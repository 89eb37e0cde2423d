use thiserror::Error;

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Unknown match system '{0}': expected 'current' or 'new'")]
    UnknownSystem(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Record count mismatch: old run has {old} records, new run has {new}")]
    RecordCountMismatch { old: usize, new: usize },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type TuningResult<T> = Result<T, TuningError>;

#[cfg(test)]
#[path = "tests/errors_tests.rs"]
mod tests;
