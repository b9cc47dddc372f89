use bytes::Bytes;

use crate::error::{FrameError, Result};
use crate::header::HeaderBlock;

/// Separator that ends the header block of a binary frame.
pub const AUDIO_SEPARATOR: &[u8] = b"Path:audio\r\n";

const HEADER_TERMINATOR: &str = "\r\n\r\n";

/// A textual frame: a header block, a blank line, and an optional body.
///
/// Wire format:
/// ```text
/// X-Timestamp:Mon Jan 01 2024 00:00:00 GMT+0000 (Coordinated Universal Time)\r\n
/// Content-Type:application/json; charset=utf-8\r\n
/// Path:speech.config\r\n
/// \r\n
/// {"context":{...}}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextFrame {
    pub headers: HeaderBlock,
    pub body: String,
}

impl TextFrame {
    /// Start an empty frame. Headers are encoded in the order they are added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(key, value);
        self
    }

    /// Set the body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Parse a text frame. Everything after the first blank line is the body.
    pub fn parse(text: &str) -> Self {
        match text.split_once(HEADER_TERMINATOR) {
            Some((head, body)) => Self {
                headers: HeaderBlock::parse(head),
                body: body.to_string(),
            },
            None => Self {
                headers: HeaderBlock::parse(text),
                body: String::new(),
            },
        }
    }

    /// The `Path` header.
    pub fn path(&self) -> Option<&str> {
        self.headers.path()
    }

    /// Encode into the wire format.
    pub fn encode(&self) -> Result<String> {
        let mut out = String::with_capacity(self.body.len() + 128);
        for (key, value) in self.headers.iter() {
            validate_header(key, value)?;
            out.push_str(key);
            out.push(':');
            out.push_str(value);
            out.push_str("\r\n");
        }
        out.push_str("\r\n");
        out.push_str(&self.body);
        Ok(out)
    }
}

fn validate_header(key: &str, value: &str) -> Result<()> {
    if key.is_empty() {
        return Err(FrameError::InvalidHeader {
            name: key.to_string(),
            reason: "empty header name",
        });
    }
    if key.contains(':') {
        return Err(FrameError::InvalidHeader {
            name: key.to_string(),
            reason: "header name contains ':'",
        });
    }
    if key.contains(['\r', '\n']) || value.contains(['\r', '\n']) {
        return Err(FrameError::InvalidHeader {
            name: key.to_string(),
            reason: "header contains a line break",
        });
    }
    Ok(())
}

/// A binary frame split into its header block and audio payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryFrame {
    pub headers: HeaderBlock,
    pub payload: Bytes,
}

/// Split a binary frame at [`AUDIO_SEPARATOR`].
///
/// The search is byte-exact over the whole frame and the first occurrence
/// wins. Returns `None` when the separator is absent. The payload shares the
/// frame's allocation.
pub fn split_binary(frame: &Bytes) -> Option<BinaryFrame> {
    let at = find(frame, AUDIO_SEPARATOR)?;
    Some(BinaryFrame {
        headers: HeaderBlock::parse_bytes(&frame[..at]),
        payload: frame.slice(at + AUDIO_SEPARATOR.len()..),
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary(header: &str, payload: &[u8]) -> Bytes {
        let mut raw = header.as_bytes().to_vec();
        raw.extend_from_slice(AUDIO_SEPARATOR);
        raw.extend_from_slice(payload);
        Bytes::from(raw)
    }

    #[test]
    fn encodes_headers_blank_line_and_body() {
        let frame = TextFrame::new()
            .header("Content-Type", "application/json; charset=utf-8")
            .header("Path", "speech.config")
            .body("{}");
        assert_eq!(
            frame.encode().unwrap(),
            "Content-Type:application/json; charset=utf-8\r\nPath:speech.config\r\n\r\n{}"
        );
    }

    #[test]
    fn parses_headers_and_body() {
        let frame = TextFrame::parse("X-RequestId:r1\r\nPath:audio.metadata\r\n\r\n{\"a\":1}");
        assert_eq!(frame.path(), Some("audio.metadata"));
        assert_eq!(frame.headers.request_id(), Some("r1"));
        assert_eq!(frame.body, "{\"a\":1}");
    }

    #[test]
    fn parses_frame_without_body() {
        let frame = TextFrame::parse("X-RequestId:r1\r\nPath:turn.end\r\n");
        assert_eq!(frame.path(), Some("turn.end"));
        assert!(frame.body.is_empty());
    }

    #[test]
    fn body_keeps_inner_blank_lines() {
        let frame = TextFrame::parse("Path:x\r\n\r\nline1\r\n\r\nline2");
        assert_eq!(frame.body, "line1\r\n\r\nline2");
    }

    #[test]
    fn rejects_line_breaks_in_headers() {
        let err = TextFrame::new()
            .header("Path", "ssml\r\nX-Injected:1")
            .encode()
            .unwrap_err();
        assert!(matches!(err, FrameError::InvalidHeader { .. }));
    }

    #[test]
    fn rejects_colon_in_header_name() {
        let err = TextFrame::new().header("Pa:th", "ssml").encode().unwrap_err();
        assert!(matches!(err, FrameError::InvalidHeader { .. }));
    }

    #[test]
    fn splits_binary_frame() {
        let raw = binary("X-RequestId:r1\r\nContent-Length: 4\r\n", &[1, 2, 3, 4]);
        let frame = split_binary(&raw).unwrap();
        assert_eq!(frame.headers.content_length(), Some(4));
        assert_eq!(frame.payload.as_ref(), &[1, 2, 3, 4]);
    }

    #[test]
    fn binary_frame_with_length_prefix() {
        let header = "X-RequestId:r1\r\nContent-Type:audio/mpeg\r\n";
        let mut raw = ((header.len() + AUDIO_SEPARATOR.len()) as u16)
            .to_be_bytes()
            .to_vec();
        raw.extend_from_slice(header.as_bytes());
        raw.extend_from_slice(AUDIO_SEPARATOR);
        raw.extend_from_slice(b"ID3");
        let frame = split_binary(&Bytes::from(raw)).unwrap();
        assert_eq!(frame.headers.get("Content-Type"), Some("audio/mpeg"));
        assert_eq!(frame.payload.as_ref(), b"ID3");
    }

    #[test]
    fn missing_separator_yields_none() {
        let raw = Bytes::from_static(b"X-RequestId:r1\r\nPath:audi\r\n\x01\x02");
        assert!(split_binary(&raw).is_none());
        assert!(split_binary(&Bytes::new()).is_none());
    }

    #[test]
    fn metadata_path_is_not_a_separator() {
        let raw = Bytes::from_static(b"Path:audio.metadata\r\n\x01");
        assert!(split_binary(&raw).is_none());
    }

    #[test]
    fn first_separator_wins() {
        let mut payload = AUDIO_SEPARATOR.to_vec();
        payload.push(9);
        let raw = binary("", &payload);
        let frame = split_binary(&raw).unwrap();
        assert!(frame.headers.is_empty());
        assert_eq!(frame.payload.as_ref(), payload.as_slice());
    }

    #[test]
    fn empty_payload_after_separator() {
        let raw = binary("Content-Length:0\r\n", &[]);
        let frame = split_binary(&raw).unwrap();
        assert!(frame.payload.is_empty());
    }
}
