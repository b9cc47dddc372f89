use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{FrameError, Result};

/// Service offsets and durations are in 100 ns ticks.
pub const TICKS_PER_MILLISECOND: u64 = 10_000;

/// One parsed metadata payload, kept exactly as received.
///
/// No validation happens beyond JSON parsing. Use [`BoundaryEvent::boundaries`]
/// for a normalized view.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryEvent(Value);

impl BoundaryEvent {
    /// Parse a metadata body.
    pub fn parse(body: &str) -> Result<Self> {
        serde_json::from_str(body.trim())
            .map(Self)
            .map_err(FrameError::MalformedMetadata)
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    pub fn into_raw(self) -> Value {
        self.0
    }

    /// Word and sentence boundaries carried by this payload, in payload order.
    ///
    /// Two shapes are understood:
    /// - the service envelope `{"Metadata":[{"Type":..,"Data":{"Offset":..}}]}`
    ///   with tick units
    /// - a flat object `{"offset":..,"duration":..,"text":..,"type":..}` with
    ///   millisecond units
    ///
    /// Entries of any other kind (such as `SessionEnd`) are skipped.
    pub fn boundaries(&self) -> Vec<WordBoundary> {
        if self.0.get("Metadata").is_some() {
            return match ServiceEnvelope::deserialize(&self.0) {
                Ok(envelope) => envelope
                    .metadata
                    .into_iter()
                    .filter_map(ServiceEntry::into_boundary)
                    .collect(),
                Err(_) => Vec::new(),
            };
        }

        FlatEvent::deserialize(&self.0)
            .ok()
            .and_then(FlatEvent::into_boundary)
            .into_iter()
            .collect()
    }
}

/// Kind of boundary a [`WordBoundary`] marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryKind {
    Word,
    Sentence,
}

impl BoundaryKind {
    fn from_type(kind: &str) -> Option<Self> {
        match kind.to_ascii_lowercase().as_str() {
            "word" | "wordboundary" => Some(Self::Word),
            "sentence" | "sentenceboundary" => Some(Self::Sentence),
            _ => None,
        }
    }
}

/// A span of input text and where it sits in the audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordBoundary {
    pub kind: BoundaryKind,
    pub offset: Duration,
    pub duration: Duration,
    pub text: String,
}

impl WordBoundary {
    /// Offset of the end of this span. Saturates at [`Duration::MAX`].
    pub fn end(&self) -> Duration {
        self.offset.saturating_add(self.duration)
    }

    /// Boundaries whose end cannot be represented are not normalizable.
    fn checked(
        kind: BoundaryKind,
        offset: Duration,
        duration: Duration,
        text: String,
    ) -> Option<Self> {
        offset.checked_add(duration)?;
        Some(Self {
            kind,
            offset,
            duration,
            text,
        })
    }
}

#[derive(Deserialize)]
struct ServiceEnvelope {
    #[serde(rename = "Metadata")]
    metadata: Vec<ServiceEntry>,
}

#[derive(Deserialize)]
struct ServiceEntry {
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "Data")]
    data: Option<ServiceData>,
}

#[derive(Deserialize)]
struct ServiceData {
    #[serde(rename = "Offset")]
    offset: u64,
    #[serde(rename = "Duration", default)]
    duration: u64,
    text: Option<ServiceText>,
}

#[derive(Deserialize)]
struct ServiceText {
    #[serde(rename = "Text")]
    text: String,
}

impl ServiceEntry {
    fn into_boundary(self) -> Option<WordBoundary> {
        let kind = BoundaryKind::from_type(&self.kind)?;
        let data = self.data?;
        WordBoundary::checked(
            kind,
            ticks(data.offset),
            ticks(data.duration),
            data.text?.text,
        )
    }
}

fn ticks(value: u64) -> Duration {
    Duration::from_nanos(value.saturating_mul(100))
}

#[derive(Deserialize)]
struct FlatEvent {
    offset: f64,
    #[serde(default)]
    duration: f64,
    text: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

impl FlatEvent {
    fn into_boundary(self) -> Option<WordBoundary> {
        let kind = match self.kind.as_deref() {
            Some(kind) => BoundaryKind::from_type(kind)?,
            None => BoundaryKind::Word,
        };
        WordBoundary::checked(
            kind,
            millis(self.offset)?,
            millis(self.duration)?,
            self.text,
        )
    }
}

fn millis(value: f64) -> Option<Duration> {
    if value < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(value / 1000.0).ok()
}
