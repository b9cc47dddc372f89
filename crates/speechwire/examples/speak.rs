//! Synthesizes text with the public service and writes MP3 and SRT files.
//!
//! Run with:
//!   cargo run --example speak -- "Hello from speechwire." out.mp3 out.srt

use speechwire::{synthesize, SynthesisOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let text = args.next().unwrap_or_else(|| "Hello from speechwire.".to_string());
    let audio_path = args.next().unwrap_or_else(|| "speech.mp3".to_string());
    let subtitle_path = args.next().unwrap_or_else(|| "speech.srt".to_string());

    let synthesis = synthesize(&SynthesisOptions::new(text)).await?;

    std::fs::write(&audio_path, &synthesis.audio.data)?;
    std::fs::write(&subtitle_path, synthesis.subtitle.to_srt())?;
    eprintln!(
        "wrote {} bytes to {audio_path} and {} cues to {subtitle_path}",
        synthesis.audio.len(),
        synthesis.subtitle.len()
    );
    Ok(())
}
