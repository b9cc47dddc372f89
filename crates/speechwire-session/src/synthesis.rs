use bytes::Bytes;
use speechwire_frame::BoundaryEvent;
use speechwire_subtitle::SubtitleResult;

/// Reassembled audio tagged with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBuffer {
    pub data: Bytes,
    pub mime_type: &'static str,
}

impl AudioBuffer {
    pub fn new(data: Bytes, mime_type: &'static str) -> Self {
        Self { data, mime_type }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Outcome of a completed synthesis session.
#[derive(Debug, Clone)]
pub struct Synthesis {
    pub request_id: String,
    pub audio: AudioBuffer,
    pub subtitle: SubtitleResult,
    /// Boundary events in arrival order.
    pub metadata: Vec<BoundaryEvent>,
}

/// MIME type for a service output format name.
///
/// Anything unrecognized is reported as `audio/mp3`.
pub fn mime_for_format(output_format: &str) -> &'static str {
    let format = output_format.to_ascii_lowercase();
    if format.starts_with("riff-") {
        "audio/wav"
    } else if format.starts_with("raw-") {
        "audio/l16"
    } else if format.starts_with("ogg-") {
        "audio/ogg"
    } else if format.starts_with("webm-") {
        "audio/webm"
    } else {
        "audio/mp3"
    }
}
