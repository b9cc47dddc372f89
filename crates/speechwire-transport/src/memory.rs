use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::{CloseInfo, Connector, DuplexChannel, Inbound};

/// Create a connected in-memory channel pair.
///
/// The [`MemoryChannel`] side behaves like an open client channel; the
/// [`MemoryPeer`] side plays the remote service, scripting inbound units and
/// observing outbound text frames.
pub fn memory_pair() -> (MemoryChannel, MemoryPeer) {
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let closed = Arc::new(AtomicBool::new(false));

    let channel = MemoryChannel {
        inbound: inbound_rx,
        outbound: outbound_tx,
        closed: Arc::clone(&closed),
    };
    let peer = MemoryPeer {
        inbound: inbound_tx,
        outbound: outbound_rx,
        closed,
    };
    (channel, peer)
}

/// Client side of an in-memory channel pair.
#[derive(Debug)]
pub struct MemoryChannel {
    inbound: mpsc::UnboundedReceiver<Result<Inbound>>,
    outbound: mpsc::UnboundedSender<String>,
    closed: Arc<AtomicBool>,
}

impl DuplexChannel for MemoryChannel {
    async fn send_text(&mut self, text: String) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Shutdown);
        }
        self.outbound
            .send(text)
            .map_err(|_| TransportError::Shutdown)
    }

    async fn recv(&mut self) -> Option<Result<Inbound>> {
        self.inbound.recv().await
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("memory channel closed by client");
        }
        Ok(())
    }
}

/// Remote side of an in-memory channel pair.
#[derive(Debug)]
pub struct MemoryPeer {
    inbound: mpsc::UnboundedSender<Result<Inbound>>,
    outbound: mpsc::UnboundedReceiver<String>,
    closed: Arc<AtomicBool>,
}

impl MemoryPeer {
    /// Deliver a text frame to the client.
    pub fn send_text(&self, text: impl Into<String>) {
        self.push(Ok(Inbound::Text(text.into())));
    }

    /// Deliver a binary frame to the client.
    pub fn send_binary(&self, data: impl Into<Bytes>) {
        self.push(Ok(Inbound::Binary(data.into())));
    }

    /// Deliver a close notification to the client.
    pub fn send_close(&self, code: u16, reason: &str) {
        self.push(Ok(Inbound::Closed(CloseInfo::new(code, reason))));
    }

    /// Deliver a transport error to the client.
    pub fn send_error(&self, err: TransportError) {
        self.push(Err(err));
    }

    /// Wait for the next text frame sent by the client.
    pub async fn recv_text(&mut self) -> Option<String> {
        self.outbound.recv().await
    }

    /// Take a text frame sent by the client, if one is queued.
    pub fn try_recv_text(&mut self) -> Option<String> {
        self.outbound.try_recv().ok()
    }

    /// Whether the client has closed its side.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn push(&self, item: Result<Inbound>) {
        // The client may already have dropped its side; the unit is then moot.
        let _ = self.inbound.send(item);
    }
}

/// Connector that hands out one pre-built [`MemoryChannel`].
#[derive(Debug)]
pub struct MemoryConnector {
    channel: Mutex<Option<MemoryChannel>>,
    endpoints: Mutex<Vec<String>>,
}

impl MemoryConnector {
    pub fn new(channel: MemoryChannel) -> Self {
        Self {
            channel: Mutex::new(Some(channel)),
            endpoints: Mutex::new(Vec::new()),
        }
    }

    /// Endpoints passed to `connect`, in call order.
    pub fn endpoints(&self) -> Vec<String> {
        self.endpoints
            .lock()
            .map(|endpoints| endpoints.clone())
            .unwrap_or_default()
    }

    fn take(&self, endpoint: &str) -> Result<MemoryChannel> {
        if let Ok(mut endpoints) = self.endpoints.lock() {
            endpoints.push(endpoint.to_string());
        }
        self.channel
            .lock()
            .ok()
            .and_then(|mut slot| slot.take())
            .ok_or(TransportError::Shutdown)
    }
}

impl Connector for MemoryConnector {
    type Channel = MemoryChannel;

    fn connect(
        &self,
        endpoint: &str,
    ) -> impl std::future::Future<Output = Result<Self::Channel>> + Send {
        std::future::ready(self.take(endpoint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn units_arrive_in_order() {
        let (mut channel, peer) = memory_pair();
        peer.send_text("one");
        peer.send_binary(vec![1u8, 2, 3]);
        peer.send_close(1000, "done");

        assert_eq!(
            channel.recv().await.unwrap().unwrap(),
            Inbound::Text("one".to_string())
        );
        assert_eq!(
            channel.recv().await.unwrap().unwrap(),
            Inbound::Binary(Bytes::from_static(&[1, 2, 3]))
        );
        assert_eq!(
            channel.recv().await.unwrap().unwrap(),
            Inbound::Closed(CloseInfo::new(1000, "done"))
        );
    }

    #[tokio::test]
    async fn stream_ends_when_peer_dropped() {
        let (mut channel, peer) = memory_pair();
        drop(peer);
        assert!(channel.recv().await.is_none());
    }

    #[tokio::test]
    async fn outbound_text_reaches_peer() {
        let (mut channel, mut peer) = memory_pair();
        channel.send_text("hello".to_string()).await.unwrap();
        assert_eq!(peer.recv_text().await.as_deref(), Some("hello"));
        assert!(peer.try_recv_text().is_none());
    }

    #[tokio::test]
    async fn send_after_close_fails() {
        let (mut channel, peer) = memory_pair();
        channel.close().await.unwrap();
        channel.close().await.unwrap();
        assert!(peer.is_closed());

        let err = channel.send_text("late".to_string()).await.unwrap_err();
        assert!(matches!(err, TransportError::Shutdown));
    }

    #[tokio::test]
    async fn transport_errors_are_delivered() {
        let (mut channel, peer) = memory_pair();
        peer.send_error(TransportError::Io(std::io::Error::from(
            std::io::ErrorKind::ConnectionReset,
        )));
        let err = channel.recv().await.unwrap().unwrap_err();
        assert!(matches!(err, TransportError::Io(_)));
    }

    #[tokio::test]
    async fn connector_hands_out_channel_once() {
        let (channel, _peer) = memory_pair();
        let connector = MemoryConnector::new(channel);

        assert!(connector.connect("mem://first").await.is_ok());
        let err = connector.connect("mem://second").await.unwrap_err();
        assert!(matches!(err, TransportError::Shutdown));
        assert_eq!(connector.endpoints(), vec!["mem://first", "mem://second"]);
    }
}
