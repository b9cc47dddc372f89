/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A metadata frame carried a body that is not valid JSON.
    #[error("malformed metadata frame: {0}")]
    MalformedMetadata(#[source] serde_json::Error),

    /// An outbound header cannot be represented in a header block.
    #[error("invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: &'static str },
}

pub type Result<T> = std::result::Result<T, FrameError>;
