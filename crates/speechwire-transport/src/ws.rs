use std::sync::Once;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use crate::error::{redact_endpoint, Result, TransportError};
use crate::traits::{CloseInfo, Connector, DuplexChannel, Inbound};

static CRYPTO_PROVIDER: Once = Once::new();

fn install_crypto_provider() {
    CRYPTO_PROVIDER.call_once(|| {
        // Another component may already have installed a provider; either way one exists.
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// WebSocket connector.
///
/// Opens `ws://` and `wss://` channels, attaching any configured request
/// headers to the upgrade request.
#[derive(Debug, Clone, Default)]
pub struct WebSocketConnector {
    headers: Vec<(String, String)>,
}

impl WebSocketConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header sent with every upgrade request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Headers attached to upgrade requests, in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    async fn open(&self, endpoint: &str) -> Result<WebSocketChannel> {
        let redacted = redact_endpoint(endpoint);
        let mut request =
            endpoint
                .into_client_request()
                .map_err(|err| TransportError::InvalidEndpoint {
                    endpoint: redacted.clone(),
                    reason: err.to_string(),
                })?;

        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
                TransportError::InvalidEndpoint {
                    endpoint: redacted.clone(),
                    reason: format!("invalid header name '{name}': {err}"),
                }
            })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|err| TransportError::InvalidEndpoint {
                    endpoint: redacted.clone(),
                    reason: format!("invalid value for header '{name}': {err}"),
                })?;
            request.headers_mut().insert(header_name, header_value);
        }

        install_crypto_provider();
        debug!(endpoint = %redacted, "opening websocket");
        let (stream, response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|source| TransportError::Connect {
                endpoint: redacted.clone(),
                source: Box::new(source),
            })?;
        info!(endpoint = %redacted, status = %response.status(), "websocket open");

        Ok(WebSocketChannel::from_stream(stream))
    }
}

impl Connector for WebSocketConnector {
    type Channel = WebSocketChannel;

    fn connect(
        &self,
        endpoint: &str,
    ) -> impl std::future::Future<Output = Result<Self::Channel>> + Send {
        self.open(endpoint)
    }
}

/// An open WebSocket channel.
pub struct WebSocketChannel {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    closed: bool,
}

impl WebSocketChannel {
    pub(crate) fn from_stream(stream: WebSocketStream<MaybeTlsStream<TcpStream>>) -> Self {
        Self {
            stream,
            closed: false,
        }
    }
}

impl DuplexChannel for WebSocketChannel {
    async fn send_text(&mut self, text: String) -> Result<()> {
        if self.closed {
            return Err(TransportError::Shutdown);
        }
        self.stream.send(Message::Text(text.into())).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<Inbound>> {
        loop {
            let message = match self.stream.next().await? {
                Ok(message) => message,
                Err(err) => return Some(Err(err.into())),
            };

            match message {
                Message::Text(text) => return Some(Ok(Inbound::Text(text.as_str().to_owned()))),
                Message::Binary(data) => return Some(Ok(Inbound::Binary(data))),
                Message::Close(frame) => {
                    let info = frame
                        .map(|frame| CloseInfo::new(u16::from(frame.code), frame.reason.as_str()))
                        .unwrap_or_else(CloseInfo::no_status);
                    return Some(Ok(Inbound::Closed(info)));
                }
                // Pings are answered by tungstenite itself while reading.
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        match self.stream.close(None).await {
            Ok(()) | Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl std::fmt::Debug for WebSocketChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketChannel")
            .field("closed", &self.closed)
            .finish()
    }
}
