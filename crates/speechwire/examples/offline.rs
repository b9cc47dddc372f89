//! Runs a full synthesis session against a scripted in-memory service.
//!
//! Run with:
//!   cargo run --example offline

use speechwire::session::synthesize_with;
use speechwire::transport::{memory_pair, MemoryConnector};
use speechwire::{CueOptions, SplitBy, SynthesisOptions};

fn metadata(offset_ms: u64, duration_ms: u64, text: &str) -> String {
    format!(
        "X-RequestId:demo\r\nContent-Type:application/json\r\nPath:audio.metadata\r\n\r\n{{\"offset\":{offset_ms},\"duration\":{duration_ms},\"text\":\"{text}\",\"type\":\"Word\"}}"
    )
}

fn audio(payload: &[u8]) -> Vec<u8> {
    let mut raw = format!(
        "X-RequestId:demo\r\nContent-Type:audio/mpeg\r\nContent-Length:{}\r\nPath:audio\r\n",
        payload.len()
    )
    .into_bytes();
    raw.extend_from_slice(payload);
    raw
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (channel, peer) = memory_pair();
    let connector = MemoryConnector::new(channel);

    // The in-memory peer buffers replies until the session reads them.
    for (i, word) in ["Streaming", "speech", "works."].iter().enumerate() {
        let offset = i as u64 * 400;
        peer.send_text(metadata(offset, 350, word));
        peer.send_binary(audio(&[i as u8; 8]));
    }
    peer.send_text("X-RequestId:demo\r\nPath:turn.end\r\n\r\n{}");

    let options = SynthesisOptions::new("Streaming speech works.");
    let synthesis =
        synthesize_with(&connector, &options, CueOptions::new(SplitBy::Word, 2)).await?;

    eprintln!(
        "request {}: {} bytes of {}",
        synthesis.request_id,
        synthesis.audio.len(),
        synthesis.audio.mime_type
    );
    print!("{}", synthesis.subtitle.to_vtt());
    Ok(())
}
