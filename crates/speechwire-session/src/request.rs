use std::fmt;

use speechwire_frame::{TextFrame, SSML};

use crate::error::{Result, SessionError};

/// Voice used when none is given.
pub const DEFAULT_VOICE: &str = "en-US-EmmaMultilingualNeural";

/// Largest text accepted for one request, in bytes.
pub const MAX_TEXT_BYTES: usize = 64 * 1024;

const DEFAULT_LANG: &str = "en-US";
const MAX_VOICE_LEN: usize = 256;

/// Prosody adjustments relative to the voice defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prosody {
    /// Speaking rate, `[+-]N%`.
    pub rate: String,
    /// Pitch, `[+-]NHz`.
    pub pitch: String,
    /// Volume, `[+-]N%`.
    pub volume: String,
}

impl Default for Prosody {
    fn default() -> Self {
        Self {
            rate: "+0%".to_string(),
            pitch: "+0Hz".to_string(),
            volume: "+0%".to_string(),
        }
    }
}

/// One synthesis request.
#[derive(Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    pub text: String,
    /// Short (`en-US-EmmaMultilingualNeural`) or full voice name.
    pub voice: String,
    /// `xml:lang` of the document. Derived from the voice when unset.
    pub lang: Option<String>,
    pub prosody: Prosody,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: DEFAULT_VOICE.to_string(),
            lang: None,
            prosody: Prosody::default(),
        }
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    /// Check every parameter before any channel is opened.
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(invalid("text must not be empty"));
        }
        if self.text.len() > MAX_TEXT_BYTES {
            return Err(invalid(format!(
                "text too long: {} bytes (max {MAX_TEXT_BYTES})",
                self.text.len()
            )));
        }
        let voice = self.voice.trim();
        if voice.is_empty() || voice.len() > MAX_VOICE_LEN {
            return Err(invalid(format!("invalid voice name length: {}", voice.len())));
        }
        if voice.contains(['<', '>', '\'', '"', '&']) {
            return Err(invalid(format!("invalid character in voice name '{voice}'")));
        }
        if let Some(lang) = &self.lang {
            if lang.is_empty() || !lang.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return Err(invalid(format!("invalid language tag '{lang}'")));
            }
        }
        validate_signed(&self.prosody.rate, "%", "rate")?;
        validate_signed(&self.prosody.volume, "%", "volume")?;
        validate_signed(&self.prosody.pitch, "Hz", "pitch")?;
        Ok(())
    }

    /// Language tag of the document.
    pub fn lang(&self) -> String {
        if let Some(lang) = &self.lang {
            return lang.clone();
        }
        let mut parts = self.voice.trim().splitn(3, '-');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(language), Some(region), Some(_)) => format!("{language}-{region}"),
            _ => DEFAULT_LANG.to_string(),
        }
    }

    /// Voice name as the service expects it.
    ///
    /// `en-US-EmmaMultilingualNeural` becomes
    /// `Microsoft Server Speech Text to Speech Voice (en-US, EmmaMultilingualNeural)`;
    /// anything that is not a short name is passed through.
    pub fn full_voice_name(&self) -> String {
        let voice = self.voice.trim();
        if voice.starts_with("Microsoft Server Speech Text to Speech Voice") {
            return voice.to_string();
        }
        let mut parts = voice.splitn(3, '-');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(language), Some(region), Some(name)) if !name.is_empty() => format!(
                "Microsoft Server Speech Text to Speech Voice ({language}-{region}, {name})"
            ),
            _ => voice.to_string(),
        }
    }

    /// The SSML document for this request.
    pub fn to_ssml(&self) -> String {
        format!(
            "<speak version='1.0' xmlns='http://www.w3.org/2001/10/synthesis' xml:lang='{lang}'>\
             <voice name='{voice}'>\
             <prosody pitch='{pitch}' rate='{rate}' volume='{volume}'>{text}</prosody>\
             </voice></speak>",
            lang = self.lang(),
            voice = self.full_voice_name(),
            pitch = self.prosody.pitch,
            rate = self.prosody.rate,
            volume = self.prosody.volume,
            text = escape_xml(&self.text),
        )
    }

    /// Encode the outbound `Path:ssml` frame.
    pub fn to_frame(&self, request_id: &str, timestamp: &str) -> Result<String> {
        let frame = TextFrame::new()
            .header("X-RequestId", request_id)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Timestamp", format!("{timestamp}Z"))
            .header("Path", SSML)
            .body(self.to_ssml());
        Ok(frame.encode()?)
    }
}

impl fmt::Debug for SynthesisRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynthesisRequest")
            .field("text", &format_args!("<{} bytes>", self.text.len()))
            .field("voice", &self.voice)
            .field("lang", &self.lang)
            .field("prosody", &self.prosody)
            .finish()
    }
}

/// Escape text for inclusion in an XML document.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Timestamp in the format browsers produce for `Date.prototype.toString`.
pub(crate) fn js_timestamp() -> String {
    chrono::Utc::now()
        .format("%a %b %d %Y %H:%M:%S GMT+0000 (Coordinated Universal Time)")
        .to_string()
}

/// A fresh request or connection identifier: a v4 UUID without hyphens.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn validate_signed(value: &str, suffix: &str, name: &str) -> Result<()> {
    let digits = value
        .strip_suffix(suffix)
        .and_then(|rest| rest.strip_prefix(['+', '-']));
    match digits {
        Some(digits) if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => Ok(()),
        _ => Err(invalid(format!(
            "invalid {name} '{value}' (expected [+-]N{suffix})"
        ))),
    }
}

fn invalid(message: impl Into<String>) -> SessionError {
    SessionError::InvalidConfiguration(message.into())
}

#[cfg(test)]
mod tests {
    use speechwire_frame::TextFrame;

    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_xml(r#"Tom & "Jerry" <b>'s</b>"#),
            "Tom &amp; &quot;Jerry&quot; &lt;b&gt;&apos;s&lt;/b&gt;"
        );
    }

    #[test]
    fn ssml_embeds_voice_prosody_and_escaped_text() {
        let mut request = SynthesisRequest::new("1 < 2").with_voice("de-DE-KatjaNeural");
        request.prosody.rate = "+10%".to_string();
        let ssml = request.to_ssml();
        assert!(ssml.contains("xml:lang='de-DE'"));
        assert!(ssml.contains(
            "<voice name='Microsoft Server Speech Text to Speech Voice (de-DE, KatjaNeural)'>"
        ));
        assert!(ssml.contains("<prosody pitch='+0Hz' rate='+10%' volume='+0%'>1 &lt; 2</prosody>"));
    }

    #[test]
    fn explicit_lang_wins() {
        let mut request = SynthesisRequest::new("hi");
        request.lang = Some("en-GB".to_string());
        assert_eq!(request.lang(), "en-GB");
        assert_eq!(SynthesisRequest::new("hi").with_voice("custom").lang(), "en-US");
    }

    #[test]
    fn full_voice_names_pass_through() {
        let full = "Microsoft Server Speech Text to Speech Voice (en-US, AriaNeural)";
        let request = SynthesisRequest::new("hi").with_voice(full);
        assert_eq!(request.full_voice_name(), full);
    }

    #[test]
    fn frame_has_ssml_path_and_request_id() {
        let request = SynthesisRequest::new("hello");
        let encoded = request.to_frame("abc123", "Mon Jan 01 2024").unwrap();
        let frame = TextFrame::parse(&encoded);
        assert_eq!(frame.path(), Some("ssml"));
        assert_eq!(frame.headers.request_id(), Some("abc123"));
        assert_eq!(frame.headers.get("X-Timestamp"), Some("Mon Jan 01 2024Z"));
        assert!(frame.body.starts_with("<speak "));
    }

    #[test]
    fn rejects_empty_text() {
        let err = SynthesisRequest::new("   ").validate().unwrap_err();
        assert!(matches!(err, SessionError::InvalidConfiguration(_)));
    }

    #[test]
    fn rejects_oversized_text() {
        let err = SynthesisRequest::new("a".repeat(MAX_TEXT_BYTES + 1))
            .validate()
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidConfiguration(m) if m.contains("too long")));
    }

    #[test]
    fn rejects_bad_voice_and_prosody() {
        assert!(SynthesisRequest::new("hi").with_voice("").validate().is_err());
        assert!(SynthesisRequest::new("hi")
            .with_voice("x' onload='y")
            .validate()
            .is_err());

        let mut request = SynthesisRequest::new("hi");
        request.prosody.rate = "fast".to_string();
        assert!(request.validate().is_err());

        let mut request = SynthesisRequest::new("hi");
        request.prosody.pitch = "+5%".to_string();
        assert!(request.validate().is_err());

        let mut request = SynthesisRequest::new("hi");
        request.prosody.volume = "-20%".to_string();
        request.prosody.pitch = "-2Hz".to_string();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn ids_are_hyphenless_uuids() {
        let id = new_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, new_id());
    }

    #[test]
    fn debug_hides_text() {
        let rendered = format!("{:?}", SynthesisRequest::new("secret words"));
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<12 bytes>"));
    }
}
