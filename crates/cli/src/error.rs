//! CLI error type.

use bidii_core::{KeyParseError, Resource};
use bidii_portal::{ApiError, ClientError, ConfigError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Client(#[from] ClientError),

    #[error("Session error: {0}")]
    Store(#[from] StoreError),

    /// Any gateway failure; the message is already fit for display.
    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("Invalid draft JSON: {0}")]
    InvalidDraft(#[from] serde_json::Error),

    #[error("{0}")]
    InvalidKey(#[from] KeyParseError),

    #[error("Invalid {field}: {input:?}")]
    InvalidArgument { field: &'static str, input: String },

    #[error("{} records have no profile picture", .0.label())]
    PictureUnsupported(Resource),

    /// A view recorded an error message.
    #[error("{0}")]
    Failed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
