use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Missing configuration: {0}")]
    ConfigMissing(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// Short machine-readable name of the failure class, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Serialization(_) => "serialization",
            Error::ConfigMissing(_) => "config_missing",
            Error::Validation(_) => "validation",
            Error::Fetch(_) => "fetch",
            Error::Extraction(_) => "extraction",
            Error::Inference(_) => "inference",
            Error::Conflict(_) => "conflict",
            Error::Storage(_) => "storage",
            Error::NotFound(_) => "not_found",
            Error::External(_) => "external",
        }
    }
}
