use std::time::Duration;

use speechwire_frame::FrameError;
use speechwire_transport::TransportError;

/// Errors that can end a synthesis session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A required parameter is missing or invalid. No channel was opened.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The open window or the overall session deadline elapsed.
    #[error("{phase} timed out after {after:?}")]
    ConnectionTimeout { phase: &'static str, after: Duration },

    /// The channel reported an error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The channel closed before the turn completed.
    #[error("channel closed before completion (code {code}): {reason}")]
    UnexpectedClose { code: u16, reason: String },

    /// A metadata frame carried invalid JSON.
    #[error("malformed metadata: {0}")]
    MalformedMetadata(#[source] serde_json::Error),

    /// Fewer audio bytes arrived than the frame headers declared.
    #[error("incomplete audio: got {got} bytes, expected {expected}")]
    IncompleteAudio { got: u64, expected: u64 },

    /// An outbound frame could not be encoded.
    #[error("frame error: {0}")]
    Frame(FrameError),

    /// The session outcome was already taken.
    #[error("session already settled")]
    AlreadySettled,
}

impl From<FrameError> for SessionError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::MalformedMetadata(source) => SessionError::MalformedMetadata(source),
            other => SessionError::Frame(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
