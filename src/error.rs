use rowforge_compiler::SchemaError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RowforgeError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("Codec error: {0}")]
    Codec(String),
    #[error("Decode error in column '{column}': {message}")]
    Decode { column: String, message: String },
    #[error("Unknown URI: {0}")]
    UnknownUri(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Settings error: {0}")]
    Settings(String),
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, RowforgeError>;

impl RowforgeError {
    pub fn decode(column: &str, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.to_string(),
            message: message.into(),
        }
    }
}

// Helper conversions
impl From<rusqlite::Error> for RowforgeError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<config::ConfigError> for RowforgeError {
    fn from(e: config::ConfigError) -> Self {
        Self::Settings(e.to_string())
    }
}

impl From<serde_json::Error> for RowforgeError {
    fn from(e: serde_json::Error) -> Self {
        Self::Codec(e.to_string())
    }
}
