use bytes::Bytes;
use speechwire_transport::{CloseInfo, Inbound};
use tracing::{debug, trace};

use crate::codec::TextFrame;
use crate::error::Result;
use crate::metadata::BoundaryEvent;
use crate::path::{is_known_inbound, is_outbound};

const METADATA_MARKER: &str = "Path:audio.metadata";
const TURN_END_MARKER: &str = "Path:turn.end";
const BODY_SEPARATOR: &str = "\r\n\r\n";

/// What a text control frame asks the session to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    /// Record a metadata payload.
    Metadata(BoundaryEvent),
    /// Begin finalization.
    TurnEnd,
    /// Nothing; the frame is unrecognized or informational.
    Ignored { path: Option<String> },
}

/// Where one inbound unit goes.
#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    Control(Control),
    /// Raw binary frame, queued for the reassembler undecoded.
    Audio(Bytes),
    Closed(CloseInfo),
}

/// Route one inbound unit.
///
/// Text frames are classified by [`classify_text`]. Binary frames are passed
/// through untouched; splitting them is the reassembler's job.
pub fn demultiplex(unit: Inbound) -> Result<Routed> {
    match unit {
        Inbound::Text(text) => classify_text(&text).map(Routed::Control),
        Inbound::Binary(data) => {
            trace!(bytes = data.len(), "binary frame");
            Ok(Routed::Audio(data))
        }
        Inbound::Closed(info) => Ok(Routed::Closed(info)),
    }
}

/// Classify a text control frame by its marker substrings.
///
/// The metadata marker is checked first. Its JSON payload is the body after
/// the blank line that follows the marker, or everything after the marker when
/// there is no blank line. A payload that fails to parse is an error.
pub fn classify_text(text: &str) -> Result<Control> {
    if let Some(at) = text.find(METADATA_MARKER) {
        let rest = &text[at + METADATA_MARKER.len()..];
        let body = match rest.find(BODY_SEPARATOR) {
            Some(sep) => &rest[sep + BODY_SEPARATOR.len()..],
            None => rest,
        };
        let event = BoundaryEvent::parse(body)?;
        trace!("metadata frame");
        return Ok(Control::Metadata(event));
    }

    if text.contains(TURN_END_MARKER) {
        debug!("turn.end received");
        return Ok(Control::TurnEnd);
    }

    let path = TextFrame::parse(text).path().map(str::to_string);
    match path.as_deref() {
        Some(known) if is_known_inbound(known) => debug!(path = known, "service frame"),
        Some(other) if is_outbound(other) => {
            debug!(path = other, "ignoring echoed outbound frame")
        }
        other => debug!(path = other.unwrap_or("<none>"), "ignoring unrecognized text frame"),
    }
    Ok(Control::Ignored { path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FrameError;

    #[test]
    fn metadata_frame_is_parsed() {
        let control = classify_text(
            "X-RequestId:r1\r\nContent-Type:application/json\r\nPath:audio.metadata\r\n\r\n{\"offset\":0,\"duration\":500,\"text\":\"Hi\",\"type\":\"Word\"}",
        )
        .unwrap();
        match control {
            Control::Metadata(event) => {
                assert_eq!(event.raw()["text"], "Hi");
            }
            other => panic!("unexpected control: {other:?}"),
        }
    }

    #[test]
    fn metadata_without_blank_line_uses_remainder() {
        let control = classify_text("Path:audio.metadata{\"offset\":1,\"text\":\"a\"}").unwrap();
        assert!(matches!(control, Control::Metadata(_)));
    }

    #[test]
    fn malformed_metadata_is_an_error() {
        let err = classify_text("Path:audio.metadata\r\n\r\n{\"Metadata\":[").unwrap_err();
        assert!(matches!(err, FrameError::MalformedMetadata(_)));
    }

    #[test]
    fn turn_end_is_detected() {
        let control = classify_text("X-RequestId:r1\r\nPath:turn.end\r\n\r\n{}").unwrap();
        assert_eq!(control, Control::TurnEnd);
    }

    #[test]
    fn other_frames_are_ignored_with_path() {
        let control = classify_text("X-RequestId:r1\r\nPath:turn.start\r\n\r\n{}").unwrap();
        assert_eq!(
            control,
            Control::Ignored {
                path: Some("turn.start".to_string())
            }
        );
        let control = classify_text("hello").unwrap();
        assert_eq!(control, Control::Ignored { path: None });
    }

    #[test]
    fn binary_and_close_pass_through() {
        let routed = demultiplex(Inbound::Binary(Bytes::from_static(b"xyz"))).unwrap();
        assert_eq!(routed, Routed::Audio(Bytes::from_static(b"xyz")));

        let routed = demultiplex(Inbound::Closed(CloseInfo::new(1000, "bye"))).unwrap();
        assert_eq!(routed, Routed::Closed(CloseInfo::new(1000, "bye")));
    }

    #[test]
    fn text_units_are_classified() {
        let routed = demultiplex(Inbound::Text("Path:turn.end\r\n".to_string())).unwrap();
        assert_eq!(routed, Routed::Control(Control::TurnEnd));
    }
}
