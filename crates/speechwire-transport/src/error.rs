use tokio_tungstenite::tungstenite;

/// Errors that can occur in channel transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The endpoint could not be turned into a connection request.
    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Failed to connect to the specified endpoint.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        source: Box<tungstenite::Error>,
    },

    /// The WebSocket layer reported an error on an open channel.
    #[error("websocket error: {0}")]
    WebSocket(Box<tungstenite::Error>),

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The channel has been shut down.
    #[error("transport shut down")]
    Shutdown,
}

impl From<tungstenite::Error> for TransportError {
    fn from(err: tungstenite::Error) -> Self {
        match err {
            tungstenite::Error::Io(io) => TransportError::Io(io),
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                TransportError::Shutdown
            }
            other => TransportError::WebSocket(Box::new(other)),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Strip the query string from an endpoint before it is logged or displayed.
///
/// Service endpoints carry client tokens and connection ids in the query.
pub fn redact_endpoint(endpoint: &str) -> String {
    match endpoint.split_once('?') {
        Some((base, _)) => format!("{base}?<redacted>"),
        None => endpoint.to_string(),
    }
}
