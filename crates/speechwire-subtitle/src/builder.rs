use std::time::Duration;

use serde::Serialize;
use speechwire_frame::{BoundaryEvent, BoundaryKind, WordBoundary};
use tracing::debug;

use crate::options::{CueOptions, SplitBy};
use crate::render::{render, SubtitleFormat};

/// One timed subtitle entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cue {
    /// 1-based position in the cue list.
    pub index: usize,
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

/// Ordered cues built from one synthesis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubtitleResult {
    pub cues: Vec<Cue>,
}

impl SubtitleResult {
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn to_srt(&self) -> String {
        render(self, SubtitleFormat::Srt)
    }

    pub fn to_vtt(&self) -> String {
        render(self, SubtitleFormat::Vtt)
    }

    pub fn render(&self, format: SubtitleFormat) -> String {
        render(self, format)
    }
}

/// Turns the ordered metadata of a session into cues.
///
/// Implementations must be pure: the session calls this once, after all
/// metadata has arrived.
pub trait CueBuilder {
    fn build_cues(&self, events: &[BoundaryEvent]) -> SubtitleResult;
}

impl CueBuilder for CueOptions {
    fn build_cues(&self, events: &[BoundaryEvent]) -> SubtitleResult {
        build_cues(events, self)
    }
}

impl<F> CueBuilder for F
where
    F: Fn(&[BoundaryEvent]) -> SubtitleResult,
{
    fn build_cues(&self, events: &[BoundaryEvent]) -> SubtitleResult {
        self(events)
    }
}

/// Group boundaries into cues according to `options`.
///
/// Boundaries are taken in event order. Punctuation-only tokens attach to the
/// preceding text without a space, and never open a cue of their own when a
/// previous cue exists.
pub fn build_cues(events: &[BoundaryEvent], options: &CueOptions) -> SubtitleResult {
    let units: Vec<WordBoundary> = events.iter().flat_map(BoundaryEvent::boundaries).collect();
    let count = options.effective_count();

    let mut cues: Vec<Cue> = Vec::new();
    let mut current: Vec<&WordBoundary> = Vec::new();
    let mut sentences = 0u32;

    for unit in &units {
        if current.is_empty() && is_punctuation(&unit.text) {
            if let Some(last) = cues.last_mut() {
                last.text.push_str(unit.text.trim());
                last.end = last.end.max(unit.end());
                continue;
            }
        }

        current.push(unit);
        let close = match options.split_by {
            SplitBy::Word => current.len() as u32 >= count,
            SplitBy::Sentence => {
                if ends_sentence(unit) {
                    sentences += 1;
                }
                sentences >= count
            }
            SplitBy::Duration => {
                let start = current[0].offset;
                unit.end().saturating_sub(start) >= Duration::from_millis(u64::from(count))
            }
        };

        if close {
            flush(&mut cues, &mut current);
            sentences = 0;
        }
    }
    flush(&mut cues, &mut current);

    debug!(
        boundaries = units.len(),
        cues = cues.len(),
        split_by = %options.split_by,
        "built subtitle cues"
    );
    SubtitleResult { cues }
}

fn flush(cues: &mut Vec<Cue>, current: &mut Vec<&WordBoundary>) {
    let (Some(first), Some(last)) = (current.first(), current.last()) else {
        return;
    };

    let mut text = String::new();
    for unit in current.iter() {
        let token = unit.text.trim();
        if token.is_empty() {
            continue;
        }
        if !text.is_empty() && !is_punctuation(token) {
            text.push(' ');
        }
        text.push_str(token);
    }

    let start = first.offset;
    let end = current
        .iter()
        .map(|unit| unit.end())
        .max()
        .unwrap_or_else(|| last.end());
    cues.push(Cue {
        index: cues.len() + 1,
        start,
        end,
        text,
    });
    current.clear();
}

fn is_punctuation(token: &str) -> bool {
    let token = token.trim();
    !token.is_empty() && token.chars().all(|c| c.is_ascii_punctuation() || is_cjk_punctuation(c))
}

fn is_cjk_punctuation(c: char) -> bool {
    matches!(c, '。' | '，' | '、' | '！' | '？' | '；' | '：' | '「' | '」' | '…')
}

fn ends_sentence(unit: &WordBoundary) -> bool {
    if unit.kind == BoundaryKind::Sentence {
        return true;
    }
    matches!(
        unit.text.trim_end().chars().last(),
        Some('.' | '!' | '?' | '。' | '！' | '？')
    )
}
