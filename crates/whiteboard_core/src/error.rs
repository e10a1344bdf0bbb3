use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by whiteboard operations.
///
/// "Not found" is never an error here: lookups and mutations by id report a
/// miss through `Option`/`bool` return values so best-effort agent callers can
/// treat it as an ordinary branch.
#[derive(Error, Debug)]
pub enum WhiteboardError {
    /// A wholesale replacement payload did not have the document shape.
    #[error("Malformed whiteboard data: {0}")]
    Structural(String),

    #[error("Element id already in use: {0}")]
    DuplicateId(String),

    /// A partial update would leave a known field with an invalid value.
    #[error("Invalid update for element {id}: {reason}")]
    InvalidPatch { id: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Broad classification for routing and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// The caller sent something unusable.
    InvalidInput,
    /// The request clashes with existing state.
    Conflict,
    /// Internal failure unrelated to the caller's input.
    Internal,
}

impl WhiteboardError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Structural(_) | Self::InvalidPatch { .. } => ErrorCategory::InvalidInput,
            Self::DuplicateId(_) => ErrorCategory::Conflict,
            Self::Serialization(_) => ErrorCategory::Internal,
        }
    }

    /// Returns a message suitable for showing to an agent or a user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Structural(msg) => format!("Whiteboard data rejected: {msg}"),
            Self::DuplicateId(id) => format!("An element with ID {id} already exists"),
            Self::InvalidPatch { id, reason } => {
                format!("Could not update element {id}: {reason}")
            }
            Self::Serialization(_) => "Failed to encode whiteboard data.".into(),
        }
    }
}
