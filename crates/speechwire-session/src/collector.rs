use speechwire_frame::BoundaryEvent;
use tracing::trace;

/// Ordered store of boundary metadata for one session.
///
/// Events are kept exactly as they arrived: no dedup, no reordering.
#[derive(Debug, Clone, Default)]
pub struct MetadataCollector {
    events: Vec<BoundaryEvent>,
}

impl MetadataCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, event: BoundaryEvent) {
        self.events.push(event);
        trace!(events = self.events.len(), "metadata event recorded");
    }

    /// Events in arrival order.
    pub fn snapshot(&self) -> &[BoundaryEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<BoundaryEvent> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
