use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unknown weekday: {0}")]
    UnknownWeekday(String),

    #[error("Unknown workload: {0}")]
    UnknownWorkload(String),

    #[error("Invalid deadline: {0}")]
    InvalidDeadline(String),

    #[error("Record is missing required field: {0}")]
    MissingField(&'static str),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
