//! Streaming text-to-speech over WebSocket with word-boundary subtitles.
//!
//! speechwire opens a duplex channel to a speech synthesis service, sends a
//! configuration message and an SSML request, and reassembles the interleaved
//! audio and boundary metadata frames into one audio buffer plus subtitle cues.
//!
//! # Crate Structure
//!
//! - [`transport`] — Duplex channel abstraction (WebSocket, in-memory)
//! - [`frame`] — Header-block framing and inbound demultiplexing
//! - [`subtitle`] — Cue building and SRT/WebVTT rendering
//! - [`session`] — Channel setup, audio reassembly, session lifecycle
//!
//! ```no_run
//! # async fn run() -> Result<(), speechwire::SessionError> {
//! let options = speechwire::SynthesisOptions::new("Hello, world.");
//! let synthesis = speechwire::synthesize(&options).await?;
//! println!("{} bytes, {} cues", synthesis.audio.len(), synthesis.subtitle.len());
//! # Ok(())
//! # }
//! ```

/// Re-export transport types.
pub mod transport {
    pub use speechwire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use speechwire_frame::*;
}

/// Re-export subtitle types.
pub mod subtitle {
    pub use speechwire_subtitle::*;
}

/// Re-export session types.
pub mod session {
    pub use speechwire_session::*;
}

pub use speechwire_session::{
    synthesize, synthesize_with, AudioBuffer, SessionError, Synthesis, SynthesisOptions,
    SynthesisRequest,
};
pub use speechwire_subtitle::{CueOptions, SplitBy, SubtitleFormat, SubtitleResult};
