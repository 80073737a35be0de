use thiserror::Error;

#[derive(Error, Debug)]
pub enum RpaxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Descriptor error: {0}")]
    Descriptor(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Resolution error: {0}")]
    Resolution(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Lake error: {0}")]
    Lake(String),

    #[error("URI error: {0}")]
    Uri(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

pub type Result<T> = std::result::Result<T, RpaxError>;
