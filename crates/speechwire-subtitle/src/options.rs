use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SubtitleError;

/// How boundaries are grouped into cues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitBy {
    /// `count` words per cue.
    Word,
    /// `count` sentences per cue.
    #[default]
    Sentence,
    /// A cue closes once it spans `count` milliseconds.
    Duration,
}

impl FromStr for SplitBy {
    type Err = SubtitleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "word" | "words" => Ok(Self::Word),
            "sentence" | "sentences" => Ok(Self::Sentence),
            "duration" => Ok(Self::Duration),
            other => Err(SubtitleError::UnknownSplit(other.to_string())),
        }
    }
}

impl fmt::Display for SplitBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Word => "word",
            Self::Sentence => "sentence",
            Self::Duration => "duration",
        };
        f.write_str(name)
    }
}

/// Cue grouping options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CueOptions {
    pub split_by: SplitBy,
    /// Words, sentences or milliseconds per cue depending on `split_by`.
    /// Zero is treated as one.
    pub count: u32,
}

impl Default for CueOptions {
    fn default() -> Self {
        Self {
            split_by: SplitBy::Sentence,
            count: 1,
        }
    }
}

impl CueOptions {
    pub fn new(split_by: SplitBy, count: u32) -> Self {
        Self { split_by, count }
    }

    pub(crate) fn effective_count(&self) -> u32 {
        self.count.max(1)
    }
}
