use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonetaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),

    #[error("A query named '{0}' already exists")]
    Duplicate(String),

    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, MonetaError>;
