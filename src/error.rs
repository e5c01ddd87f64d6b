//! Error types for interaction-core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InteractionError {
    /// No access token; the action was rejected before touching any cache
    #[error("Sign in to continue")]
    Unauthenticated,

    /// The interactions endpoint rejected the write
    #[error("Interaction rejected ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl InteractionError {
    /// Whether the user should be prompted to sign in again
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, InteractionError::Unauthenticated)
    }
}

pub type Result<T> = std::result::Result<T, InteractionError>;
