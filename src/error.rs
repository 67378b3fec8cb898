use thiserror::Error;

pub type Result<T> = std::result::Result<T, NormalizerError>;

#[derive(Error, Debug)]
pub enum NormalizerError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Extended JSON error: {0}")]
    ExtendedJson(#[from] bson::extjson::de::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Document at position {position} has no _id and cannot be replaced")]
    MissingIdentity { position: usize },

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}
