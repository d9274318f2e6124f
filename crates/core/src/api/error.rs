//! Errors surfaced by the REST client.

use thiserror::Error;

/// Errors that can occur when calling the marketplace backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    ///
    /// The message is the backend's own message when it sent one, otherwise
    /// the operation's default message.
    #[error("{message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Human-readable reason.
        message: String,
    },

    /// A success response did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status of a rejection, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status().map(|status| status.as_u16()),
            ApiError::Decode(_) => None,
        }
    }

    /// Whether the backend refused the bearer token.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}
