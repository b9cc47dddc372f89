use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::builder::SubtitleResult;
use crate::error::SubtitleError;

/// Subtitle file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    /// SubRip: numbered cues, `HH:MM:SS,mmm` timestamps.
    Srt,
    /// WebVTT: `WEBVTT` header, `HH:MM:SS.mmm` timestamps.
    Vtt,
}

impl SubtitleFormat {
    /// Infer the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, SubtitleError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        ext.parse()
    }
}

impl FromStr for SubtitleFormat {
    type Err = SubtitleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "srt" => Ok(Self::Srt),
            "vtt" | "webvtt" => Ok(Self::Vtt),
            other => Err(SubtitleError::UnsupportedFormat(other.to_string())),
        }
    }
}

pub(crate) fn render(result: &SubtitleResult, format: SubtitleFormat) -> String {
    let mut out = String::new();
    if format == SubtitleFormat::Vtt {
        out.push_str("WEBVTT\n\n");
    }

    let separator = match format {
        SubtitleFormat::Srt => ',',
        SubtitleFormat::Vtt => '.',
    };

    for cue in &result.cues {
        if format == SubtitleFormat::Srt {
            let _ = writeln!(out, "{}", cue.index);
        }
        let _ = writeln!(
            out,
            "{} --> {}",
            timestamp(cue.start, separator),
            timestamp(cue.end, separator)
        );
        let _ = writeln!(out, "{}", cue.text);
        out.push('\n');
    }
    out
}

fn timestamp(at: Duration, separator: char) -> String {
    let total_ms = at.as_millis();
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02}{separator}{millis:03}")
}
