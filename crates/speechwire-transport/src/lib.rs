//! Duplex channel abstraction for streaming speech synthesis.
//!
//! Provides a unified interface over the channels a synthesis session can run on:
//! - WebSocket (TLS) connections to the remote service
//! - In-memory channel pairs for tests and local demos
//!
//! This is the lowest layer of speechwire. Everything else builds on top of
//! the [`DuplexChannel`] and [`Connector`] traits provided here.

pub mod error;
pub mod memory;
pub mod traits;
pub mod ws;

pub use error::{redact_endpoint, Result, TransportError};
pub use memory::{memory_pair, MemoryChannel, MemoryConnector, MemoryPeer};
pub use traits::{CloseInfo, Connector, DuplexChannel, Inbound};
pub use ws::{WebSocketChannel, WebSocketConnector};
