use std::future::Future;

use bytes::Bytes;

use crate::error::Result;

/// Close code reported when the peer closed without a status.
pub const CLOSE_NO_STATUS: u16 = 1005;

/// Close code reported when the stream ended without a close frame.
pub const CLOSE_ABNORMAL: u16 = 1006;

/// Close code and reason observed when the peer closes a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    pub code: u16,
    pub reason: String,
}

impl CloseInfo {
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// The peer sent a close frame without a status code.
    pub fn no_status() -> Self {
        Self::new(CLOSE_NO_STATUS, "")
    }

    /// The underlying stream ended without a close handshake.
    pub fn abnormal() -> Self {
        Self::new(CLOSE_ABNORMAL, "stream ended")
    }
}

/// A single unit delivered by a duplex channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A textual control frame.
    Text(String),
    /// A binary data frame, uninterpreted.
    Binary(Bytes),
    /// The peer closed the channel.
    Closed(CloseInfo),
}

/// An open, message-oriented duplex channel.
///
/// Inbound units are delivered one at a time in arrival order. `recv` must be
/// cancel-safe: dropping its future before completion loses no unit.
pub trait DuplexChannel: Send {
    /// Send one textual frame.
    fn send_text(&mut self, text: String) -> impl Future<Output = Result<()>> + Send;

    /// Wait for the next inbound unit.
    ///
    /// Returns `None` once the stream has ended.
    fn recv(&mut self) -> impl Future<Output = Option<Result<Inbound>>> + Send;

    /// Close the channel. Closing an already closed channel is not an error.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Opens duplex channels to an endpoint.
///
/// The returned future resolves when the transport reports the channel open.
pub trait Connector: Send + Sync {
    type Channel: DuplexChannel;

    fn connect(&self, endpoint: &str) -> impl Future<Output = Result<Self::Channel>> + Send;
}
