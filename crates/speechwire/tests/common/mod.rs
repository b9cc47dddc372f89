#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

/// One step of a scripted service reply.
#[derive(Clone)]
pub enum Reply {
    Text(String),
    Binary(Vec<u8>),
    Close(u16, &'static str),
}

pub fn metadata(offset_ms: u64, duration_ms: u64, text: &str) -> Reply {
    Reply::Text(format!(
        "X-RequestId:test\r\nContent-Type:application/json\r\nPath:audio.metadata\r\n\r\n{{\"offset\":{offset_ms},\"duration\":{duration_ms},\"text\":\"{text}\",\"type\":\"Word\"}}"
    ))
}

pub fn audio(payload: &[u8]) -> Reply {
    let header = format!(
        "X-RequestId:test\r\nContent-Type:audio/mpeg\r\nContent-Length:{}\r\nPath:audio\r\n",
        payload.len()
    );
    // Service frames carry a two-byte big-endian header length before the headers.
    let length = u16::try_from(header.len() - "Path:audio\r\n".len()).unwrap_or(u16::MAX);
    let mut raw = length.to_be_bytes().to_vec();
    raw.extend_from_slice(header.as_bytes());
    raw.extend_from_slice(payload);
    Reply::Binary(raw)
}

pub fn turn_end() -> Reply {
    Reply::Text("X-RequestId:test\r\nContent-Type:application/json\r\nPath:turn.end\r\n\r\n{}".to_string())
}

/// Text frames the fake service received, in order.
pub type Received = Vec<String>;

/// Accept one WebSocket client, read the configuration and synthesis
/// request frames, then play `script` back.
pub async fn fake_service(script: Vec<Reply>) -> (String, JoinHandle<Received>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("listener should have an address");

    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("client should connect");
        let mut ws = tokio_tungstenite::accept_async(stream)
            .await
            .expect("upgrade should succeed");

        let mut received = Vec::new();
        while received.len() < 2 {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => received.push(text.as_str().to_owned()),
                Some(Ok(_)) => continue,
                _ => return received,
            }
        }

        for reply in script {
            let message = match reply {
                Reply::Text(text) => Message::text(text),
                Reply::Binary(data) => Message::binary(data),
                Reply::Close(code, reason) => Message::Close(Some(CloseFrame {
                    code: CloseCode::from(code),
                    reason: reason.into(),
                })),
            };
            if ws.send(message).await.is_err() {
                return received;
            }
        }

        while let Some(Ok(message)) = ws.next().await {
            if message.is_close() {
                break;
            }
        }
        received
    });

    (format!("ws://{addr}/synthesize"), handle)
}
