//! Subtitle cues from speech boundary metadata.
//!
//! Group the ordered word boundaries reported during synthesis into timed
//! cues, then render them as SRT or WebVTT.
//!
//! This crate is a collaborator of the session layer, which only sees it
//! through the [`CueBuilder`] trait. Swap in your own grouping policy by
//! implementing that trait.

pub mod builder;
pub mod error;
pub mod options;
pub mod render;

pub use builder::{build_cues, Cue, CueBuilder, SubtitleResult};
pub use error::{Result, SubtitleError};
pub use options::{CueOptions, SplitBy};
pub use render::SubtitleFormat;
