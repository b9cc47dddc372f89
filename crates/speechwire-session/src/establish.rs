use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;
use speechwire_frame::{TextFrame, SPEECH_CONFIG};
use speechwire_transport::{redact_endpoint, Connector, DuplexChannel, WebSocketConnector};
use tracing::{debug, info, warn};

use crate::error::{Result, SessionError};
use crate::request::{js_timestamp, new_id};

/// Well-known synthesis endpoint.
pub const DEFAULT_ENDPOINT: &str = "wss://speech.platform.bing.com/consumer/speech/synthesize/readaloud/edge/v1?TrustedClientToken=6A5AA1D4EAFF4E9FB37E23D68491D6F4";

/// Output format requested when none is given.
pub const DEFAULT_OUTPUT_FORMAT: &str = "audio-24khz-48kbitrate-mono-mp3";

const EXTENSION_ORIGIN: &str = "chrome-extension://jdiccldimpdaibmpdkjnbmckianbfold";
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36 Edg/130.0.0.0";

/// Configuration for opening a synthesis channel.
#[derive(Clone)]
pub struct EstablishConfig {
    /// Endpoint URL. A fresh `ConnectionId` is appended per connection.
    pub endpoint: String,
    /// Bound on waiting for the open signal.
    pub open_timeout: Duration,
    /// Audio output format requested in the configuration message.
    pub output_format: String,
    /// Request word boundary metadata.
    pub word_boundary: bool,
    /// Request sentence boundary metadata.
    pub sentence_boundary: bool,
}

impl Default for EstablishConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            open_timeout: Duration::from_secs(10),
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
            word_boundary: true,
            sentence_boundary: false,
        }
    }
}

impl fmt::Debug for EstablishConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EstablishConfig")
            .field("endpoint", &redact_endpoint(&self.endpoint))
            .field("open_timeout", &self.open_timeout)
            .field("output_format", &self.output_format)
            .field("word_boundary", &self.word_boundary)
            .field("sentence_boundary", &self.sentence_boundary)
            .finish()
    }
}

impl EstablishConfig {
    /// Endpoint URL for one connection.
    pub fn connection_url(&self, connection_id: &str) -> String {
        let joiner = if self.endpoint.contains('?') { '&' } else { '?' };
        format!("{}{joiner}ConnectionId={connection_id}", self.endpoint)
    }

    /// Check parameters before any connection attempt.
    pub fn validate(&self) -> Result<()> {
        if self.output_format.trim().is_empty() {
            return Err(SessionError::InvalidConfiguration(
                "output format must not be empty".to_string(),
            ));
        }
        if self.endpoint.trim().is_empty() {
            return Err(SessionError::InvalidConfiguration(
                "endpoint must not be empty".to_string(),
            ));
        }
        if self.open_timeout.is_zero() {
            return Err(SessionError::InvalidConfiguration(
                "open timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Encode the `Path:speech.config` frame.
    pub fn config_frame(&self) -> Result<String> {
        let body = SpeechConfig {
            context: ConfigContext {
                synthesis: SynthesisContext {
                    audio: AudioContext {
                        metadata_options: MetadataOptions {
                            sentence_boundary_enabled: flag(self.sentence_boundary),
                            word_boundary_enabled: flag(self.word_boundary),
                        },
                        output_format: &self.output_format,
                    },
                },
            },
        };
        let body = serde_json::to_string(&body)
            .map_err(|err| SessionError::InvalidConfiguration(err.to_string()))?;

        let frame = TextFrame::new()
            .header("X-Timestamp", format!("{}Z", js_timestamp()))
            .header("Content-Type", "application/json; charset=utf-8")
            .header("Path", SPEECH_CONFIG)
            .body(body);
        Ok(frame.encode()?)
    }
}

/// WebSocket connector carrying the headers the service expects.
pub fn edge_connector() -> WebSocketConnector {
    WebSocketConnector::new()
        .with_header("Origin", EXTENSION_ORIGIN)
        .with_header("User-Agent", BROWSER_USER_AGENT)
        .with_header("Pragma", "no-cache")
        .with_header("Cache-Control", "no-cache")
}

/// Open a channel and send the configuration message.
///
/// Resolves once the channel is open and configured. Fails with
/// [`SessionError::ConnectionTimeout`] when the open signal does not arrive
/// within `config.open_timeout`.
pub async fn open<C: Connector>(connector: &C, config: &EstablishConfig) -> Result<C::Channel> {
    config.validate()?;

    let connection_id = new_id();
    let url = config.connection_url(&connection_id);
    let started = Instant::now();

    debug!(
        endpoint = %redact_endpoint(&url),
        timeout_ms = config.open_timeout.as_millis() as u64,
        "opening synthesis channel"
    );
    let mut channel = match tokio::time::timeout(config.open_timeout, connector.connect(&url)).await
    {
        Ok(Ok(channel)) => channel,
        Ok(Err(err)) => {
            warn!(error = %err, "channel open failed");
            return Err(err.into());
        }
        Err(_) => {
            warn!(
                timeout_ms = config.open_timeout.as_millis() as u64,
                "channel open timed out"
            );
            return Err(SessionError::ConnectionTimeout {
                phase: "channel open",
                after: config.open_timeout,
            });
        }
    };

    let frame = match config.config_frame() {
        Ok(frame) => frame,
        Err(err) => {
            if let Err(close_err) = channel.close().await {
                debug!(error = %close_err, "closing channel after config encode failure failed");
            }
            return Err(err);
        }
    };
    if let Err(err) = channel.send_text(frame).await {
        if let Err(close_err) = channel.close().await {
            debug!(error = %close_err, "closing channel after config send failure failed");
        }
        return Err(err.into());
    }

    info!(
        connection_id = %connection_id,
        output_format = %config.output_format,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "synthesis channel open"
    );
    Ok(channel)
}

fn flag(enabled: bool) -> &'static str {
    if enabled {
        "true"
    } else {
        "false"
    }
}

#[derive(Serialize)]
struct SpeechConfig<'a> {
    context: ConfigContext<'a>,
}

#[derive(Serialize)]
struct ConfigContext<'a> {
    synthesis: SynthesisContext<'a>,
}

#[derive(Serialize)]
struct SynthesisContext<'a> {
    audio: AudioContext<'a>,
}

#[derive(Serialize)]
struct AudioContext<'a> {
    #[serde(rename = "metadataoptions")]
    metadata_options: MetadataOptions,
    #[serde(rename = "outputFormat")]
    output_format: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MetadataOptions {
    sentence_boundary_enabled: &'static str,
    word_boundary_enabled: &'static str,
}
