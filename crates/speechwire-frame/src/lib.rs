//! Header-block framing and inbound demultiplexing for streaming speech synthesis.
//!
//! Every unit on the wire starts with a header block of `Key:Value` lines:
//! - Text frames end the block with a blank line, followed by an optional body
//! - Binary frames end the block with the literal `Path:audio\r\n`, followed by
//!   raw audio bytes
//!
//! The `Path` header routes the unit. [`demultiplex`] turns one inbound unit
//! into the thing the session should do with it.

pub mod codec;
pub mod demux;
pub mod error;
pub mod header;
pub mod metadata;
pub mod path;

pub use codec::{split_binary, BinaryFrame, TextFrame, AUDIO_SEPARATOR};
pub use demux::{classify_text, demultiplex, Control, Routed};
pub use error::{FrameError, Result};
pub use header::HeaderBlock;
pub use metadata::{BoundaryEvent, BoundaryKind, WordBoundary, TICKS_PER_MILLISECOND};
pub use path::{AUDIO, AUDIO_METADATA, RESPONSE, SPEECH_CONFIG, SSML, TURN_END, TURN_START};
