/// Errors that can occur while configuring or rendering subtitles.
#[derive(Debug, thiserror::Error)]
pub enum SubtitleError {
    /// The split policy name is not recognized.
    #[error("unknown split policy '{0}' (expected word, sentence or duration)")]
    UnknownSplit(String),

    /// The subtitle format cannot be inferred or is not supported.
    #[error("unsupported subtitle format '{0}' (expected srt or vtt)")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, SubtitleError>;
