//! Known `Path` header values.
//!
//! Outbound paths are sent by the client; inbound paths arrive from the service.

/// Outbound: one-time synthesis configuration (JSON body).
pub const SPEECH_CONFIG: &str = "speech.config";

/// Outbound: synthesis request (SSML body).
pub const SSML: &str = "ssml";

/// Inbound: the service accepted the request.
pub const TURN_START: &str = "turn.start";

/// Inbound: response acknowledgement.
pub const RESPONSE: &str = "response";

/// Inbound: word/sentence boundary metadata (JSON body).
pub const AUDIO_METADATA: &str = "audio.metadata";

/// Inbound: binary audio chunk.
pub const AUDIO: &str = "audio";

/// Inbound: no further audio for the current request.
pub const TURN_END: &str = "turn.end";

/// Returns true for paths the client sends.
pub fn is_outbound(path: &str) -> bool {
    matches!(path, SPEECH_CONFIG | SSML)
}

/// Returns true for paths the service is known to send.
pub fn is_known_inbound(path: &str) -> bool {
    matches!(path, TURN_START | RESPONSE | AUDIO_METADATA | AUDIO | TURN_END)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_of_known_paths() {
        assert!(is_outbound(SPEECH_CONFIG));
        assert!(is_outbound(SSML));
        assert!(!is_outbound(TURN_END));
        assert!(is_known_inbound(TURN_END));
        assert!(is_known_inbound(AUDIO_METADATA));
        assert!(!is_known_inbound("speech.hypothesis"));
    }
}
