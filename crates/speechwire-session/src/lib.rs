//! Streaming speech synthesis sessions.
//!
//! This is the "just works" layer. Hand it text and a voice; it opens a
//! channel, configures the output format, sends the synthesis request, and
//! assembles the interleaved audio and boundary metadata into one result.

pub mod client;
pub mod collector;
pub mod error;
pub mod establish;
pub mod lifecycle;
pub mod reassembler;
pub mod request;
pub mod synthesis;

pub use client::{synthesize, synthesize_with, SynthesisOptions};
pub use collector::MetadataCollector;
pub use error::{Result, SessionError};
pub use establish::{
    edge_connector, open, EstablishConfig, DEFAULT_ENDPOINT, DEFAULT_OUTPUT_FORMAT,
};
pub use lifecycle::{drive, SessionConfig, SessionController, SessionEvent, SessionState, Step};
pub use reassembler::AudioReassembler;
pub use request::{escape_xml, Prosody, SynthesisRequest, DEFAULT_VOICE};
pub use synthesis::{mime_for_format, AudioBuffer, Synthesis};
