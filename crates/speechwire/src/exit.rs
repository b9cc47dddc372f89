use std::fmt;
use std::io;

use speechwire_session::SessionError;
use speechwire_subtitle::SubtitleError;
use speechwire_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::InvalidEndpoint { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::InvalidConfiguration(_) => CliError::new(USAGE, format!("{context}: {err}")),
        SessionError::ConnectionTimeout { .. } => CliError::new(TIMEOUT, format!("{context}: {err}")),
        SessionError::Transport(err) => transport_error(context, err),
        SessionError::UnexpectedClose { .. } => CliError::new(FAILURE, format!("{context}: {err}")),
        SessionError::MalformedMetadata(_) | SessionError::IncompleteAudio { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn subtitle_error(context: &str, err: SubtitleError) -> CliError {
    CliError::new(USAGE, format!("{context}: {err}"))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn session_errors_map_to_exit_codes() {
        let cases = [
            (SessionError::InvalidConfiguration("x".to_string()), USAGE),
            (
                SessionError::ConnectionTimeout {
                    phase: "session",
                    after: Duration::from_secs(1),
                },
                TIMEOUT,
            ),
            (SessionError::Transport(TransportError::Shutdown), TRANSPORT_ERROR),
            (
                SessionError::UnexpectedClose {
                    code: 1006,
                    reason: "stream ended".to_string(),
                },
                FAILURE,
            ),
            (SessionError::IncompleteAudio { got: 1, expected: 2 }, DATA_INVALID),
            (SessionError::AlreadySettled, INTERNAL),
        ];
        for (err, code) in cases {
            assert_eq!(session_error("synthesis failed", err).code, code);
        }
    }

    #[test]
    fn invalid_endpoint_is_a_usage_error() {
        let err = TransportError::InvalidEndpoint {
            endpoint: "nope".to_string(),
            reason: "bad".to_string(),
        };
        let cli = transport_error("probe failed", err);
        assert_eq!(cli.code, USAGE);
        assert!(cli.message.starts_with("probe failed: "));
    }
}
