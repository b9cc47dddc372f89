use std::fmt;
use std::time::Duration;

use speechwire_frame::{demultiplex, Control, Routed};
use speechwire_subtitle::CueBuilder;
use speechwire_transport::{CloseInfo, DuplexChannel, Inbound, TransportError};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::collector::MetadataCollector;
use crate::error::{Result, SessionError};
use crate::reassembler::AudioReassembler;
use crate::synthesis::{AudioBuffer, Synthesis};

/// Session lifecycle states.
///
/// ```text
/// Opening -> Streaming -> Finalizing -> Completed
///    |           |            |
///    +-----------+------------+-------> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Opening,
    Streaming,
    Finalizing,
    Completed,
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Opening, Streaming)
                | (Opening, Failed)
                | (Streaming, Finalizing)
                | (Streaming, Failed)
                | (Finalizing, Completed)
                | (Finalizing, Failed)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Opening => "opening",
            Self::Streaming => "streaming",
            Self::Finalizing => "finalizing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Something that happened to a session.
#[derive(Debug)]
pub enum SessionEvent {
    /// The channel is open and configured.
    Opened,
    /// One unit arrived on the channel.
    Inbound(Inbound),
    /// The channel reported an error.
    TransportError(TransportError),
    /// The inbound stream ended without a close frame.
    StreamEnded,
    /// The session deadline passed.
    DeadlineElapsed,
}

/// Whether the session still wants events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Settled,
}

/// Session timing and batching.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Bound on the whole session, measured from before the channel opens.
    pub deadline: Duration,
    /// Queued binary frames that trigger a drain.
    pub drain_batch: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(30),
            drain_batch: 32,
        }
    }
}

/// Synchronous session state machine.
///
/// Feed it [`SessionEvent`]s with [`on_event`](Self::on_event); once it returns
/// [`Step::Settled`] the outcome is fixed and every later event is ignored.
pub struct SessionController<B> {
    state: SessionState,
    request_id: String,
    mime_type: &'static str,
    config: SessionConfig,
    reassembler: AudioReassembler,
    collector: MetadataCollector,
    cue_builder: B,
    outcome: Option<Result<Synthesis>>,
}

impl<B: CueBuilder> SessionController<B> {
    pub fn new(
        request_id: impl Into<String>,
        mime_type: &'static str,
        config: SessionConfig,
        cue_builder: B,
    ) -> Self {
        Self {
            state: SessionState::Opening,
            request_id: request_id.into(),
            mime_type,
            config,
            reassembler: AudioReassembler::new(),
            collector: MetadataCollector::new(),
            cue_builder,
            outcome: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Apply one event.
    pub fn on_event(&mut self, event: SessionEvent) -> Step {
        if self.state.is_terminal() {
            debug!(state = %self.state, event = ?event, "ignoring event after settlement");
            return Step::Settled;
        }

        match event {
            SessionEvent::Opened => {
                self.transition(SessionState::Streaming);
                Step::Continue
            }
            SessionEvent::Inbound(unit) => self.on_inbound(unit),
            SessionEvent::TransportError(err) => self.fail(err.into()),
            SessionEvent::StreamEnded => {
                let info = CloseInfo::abnormal();
                self.fail(SessionError::UnexpectedClose {
                    code: info.code,
                    reason: info.reason,
                })
            }
            SessionEvent::DeadlineElapsed => self.fail(SessionError::ConnectionTimeout {
                phase: "session",
                after: self.config.deadline,
            }),
        }
    }

    /// Settle the session as failed. Has no effect once settled.
    pub fn fail(&mut self, err: SessionError) -> Step {
        warn!(request_id = %self.request_id, state = %self.state, error = %err, "synthesis failed");
        self.settle(SessionState::Failed, Err(err))
    }

    /// Take the settled outcome.
    ///
    /// Returns [`SessionError::AlreadySettled`] when the outcome was already
    /// taken or the session has not settled.
    pub fn take_outcome(&mut self) -> Result<Synthesis> {
        self.outcome.take().unwrap_or(Err(SessionError::AlreadySettled))
    }

    fn on_inbound(&mut self, unit: Inbound) -> Step {
        if self.state != SessionState::Streaming {
            warn!(state = %self.state, "inbound unit before the channel opened; ignoring");
            return Step::Continue;
        }

        let routed = match demultiplex(unit) {
            Ok(routed) => routed,
            Err(err) => return self.fail(err.into()),
        };

        match routed {
            Routed::Audio(frame) => {
                self.reassembler.enqueue(frame);
                if self.reassembler.pending() >= self.config.drain_batch {
                    self.reassembler.drain();
                }
                Step::Continue
            }
            Routed::Control(Control::Metadata(event)) => {
                self.collector.add(event);
                Step::Continue
            }
            Routed::Control(Control::TurnEnd) => self.finish(),
            Routed::Control(Control::Ignored { .. }) => Step::Continue,
            Routed::Closed(info) => self.fail(SessionError::UnexpectedClose {
                code: info.code,
                reason: info.reason,
            }),
        }
    }

    fn finish(&mut self) -> Step {
        self.transition(SessionState::Finalizing);

        let audio = match self.reassembler.finalize() {
            Ok(audio) => audio,
            Err(err) => return self.fail(err),
        };
        let metadata = std::mem::take(&mut self.collector).into_events();
        let subtitle = self.cue_builder.build_cues(&metadata);

        info!(
            request_id = %self.request_id,
            audio_bytes = audio.len(),
            metadata_events = metadata.len(),
            cues = subtitle.len(),
            discarded_frames = self.reassembler.discarded(),
            "synthesis completed"
        );
        let synthesis = Synthesis {
            request_id: self.request_id.clone(),
            audio: AudioBuffer::new(audio, self.mime_type),
            subtitle,
            metadata,
        };
        self.settle(SessionState::Completed, Ok(synthesis))
    }

    fn settle(&mut self, next: SessionState, outcome: Result<Synthesis>) -> Step {
        if self.state.is_terminal() {
            debug!(state = %self.state, "session already settled");
            return Step::Settled;
        }
        if !self.transition(next) {
            // Every non-terminal state may fail; only completion can be refused here.
            self.state = SessionState::Failed;
            self.outcome = Some(Err(SessionError::AlreadySettled));
            return Step::Settled;
        }
        self.outcome = Some(outcome);
        Step::Settled
    }

    fn transition(&mut self, next: SessionState) -> bool {
        if !self.state.can_transition(next) {
            warn!(from = %self.state, to = %next, "illegal session transition ignored");
            return false;
        }
        debug!(from = %self.state, to = %next, "session transition");
        self.state = next;
        true
    }
}

impl<B> fmt::Debug for SessionController<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state)
            .field("request_id", &self.request_id)
            .field("config", &self.config)
            .field("pending_frames", &self.reassembler.pending())
            .field("metadata_events", &self.collector.len())
            .finish()
    }
}

/// Run a session to settlement.
///
/// Waits on the channel and the deadline one event at a time, feeding each to
/// the controller. The deadline wins when both are ready. The channel is
/// closed once the session settles, whatever the outcome.
pub async fn drive<C, B>(
    channel: &mut C,
    controller: &mut SessionController<B>,
    deadline: Instant,
) -> Result<Synthesis>
where
    C: DuplexChannel,
    B: CueBuilder,
{
    let sleep = tokio::time::sleep_until(deadline);
    tokio::pin!(sleep);

    loop {
        let event = tokio::select! {
            biased;
            () = &mut sleep => SessionEvent::DeadlineElapsed,
            unit = channel.recv() => match unit {
                Some(Ok(unit)) => SessionEvent::Inbound(unit),
                Some(Err(err)) => SessionEvent::TransportError(err),
                None => SessionEvent::StreamEnded,
            },
        };
        if controller.on_event(event) == Step::Settled {
            break;
        }
    }

    if let Err(err) = channel.close().await {
        debug!(error = %err, "closing settled channel failed");
    }
    controller.take_outcome()
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use proptest::prelude::*;
    use speechwire_subtitle::CueOptions;
    use speechwire_transport::memory_pair;

    use super::*;

    const METADATA: &str = "X-RequestId:r1\r\nContent-Type:application/json\r\nPath:audio.metadata\r\n\r\n{\"offset\":0,\"duration\":500,\"text\":\"Hi\",\"type\":\"Word\"}";
    const TURN_END: &str = "X-RequestId:r1\r\nPath:turn.end\r\n\r\n{}";

    fn audio(payload: &[u8]) -> Inbound {
        let mut raw = format!("X-RequestId:r1\r\nContent-Length:{}\r\n", payload.len()).into_bytes();
        raw.extend_from_slice(b"Path:audio\r\n");
        raw.extend_from_slice(payload);
        Inbound::Binary(Bytes::from(raw))
    }

    fn text(frame: &str) -> SessionEvent {
        SessionEvent::Inbound(Inbound::Text(frame.to_string()))
    }

    fn streaming() -> SessionController<CueOptions> {
        let mut controller =
            SessionController::new("r1", "audio/mp3", SessionConfig::default(), CueOptions::default());
        assert_eq!(controller.on_event(SessionEvent::Opened), Step::Continue);
        controller
    }

    #[test]
    fn transition_table() {
        use SessionState::*;
        assert!(Opening.can_transition(Streaming));
        assert!(Streaming.can_transition(Failed));
        assert!(Finalizing.can_transition(Completed));
        assert!(!Opening.can_transition(Completed));
        assert!(!Streaming.can_transition(Completed));
        assert!(!Completed.can_transition(Failed));
        assert!(!Failed.can_transition(Streaming));
        assert!(Completed.is_terminal() && Failed.is_terminal());
        assert!(!Finalizing.is_terminal());
    }

    #[test]
    fn turn_end_completes_with_audio_and_cues() {
        let mut controller = streaming();
        controller.on_event(text(METADATA));
        controller.on_event(SessionEvent::Inbound(audio(&[1, 2, 3, 4])));

        assert_eq!(controller.on_event(text(TURN_END)), Step::Settled);
        assert_eq!(controller.state(), SessionState::Completed);

        let synthesis = controller.take_outcome().unwrap();
        assert_eq!(synthesis.audio.data, Bytes::from_static(&[1, 2, 3, 4]));
        assert_eq!(synthesis.audio.mime_type, "audio/mp3");
        assert_eq!(synthesis.metadata.len(), 1);
        assert_eq!(synthesis.subtitle.cues[0].text, "Hi");
    }

    #[test]
    fn later_events_do_not_change_a_settled_outcome() {
        let mut controller = streaming();
        controller.on_event(SessionEvent::Inbound(audio(&[7])));
        controller.on_event(text(TURN_END));

        assert_eq!(
            controller.on_event(SessionEvent::Inbound(Inbound::Closed(CloseInfo::new(1011, "late")))),
            Step::Settled
        );
        assert_eq!(
            controller.on_event(SessionEvent::TransportError(TransportError::Shutdown)),
            Step::Settled
        );
        assert_eq!(controller.on_event(SessionEvent::DeadlineElapsed), Step::Settled);
        assert_eq!(controller.state(), SessionState::Completed);

        assert!(controller.take_outcome().is_ok());
        assert!(matches!(
            controller.take_outcome(),
            Err(SessionError::AlreadySettled)
        ));
    }

    #[test]
    fn fail_after_completion_is_ignored() {
        let mut controller = streaming();
        controller.on_event(text(TURN_END));
        controller.fail(SessionError::AlreadySettled);
        assert_eq!(controller.state(), SessionState::Completed);
        assert!(controller.take_outcome().is_ok());
    }

    #[test]
    fn close_before_turn_end_fails() {
        let mut controller = streaming();
        let step = controller.on_event(SessionEvent::Inbound(Inbound::Closed(CloseInfo::new(
            1011,
            "server error",
        ))));
        assert_eq!(step, Step::Settled);
        match controller.take_outcome() {
            Err(SessionError::UnexpectedClose { code, reason }) => {
                assert_eq!(code, 1011);
                assert_eq!(reason, "server error");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn stream_end_reports_abnormal_close() {
        let mut controller = streaming();
        controller.on_event(SessionEvent::StreamEnded);
        assert!(matches!(
            controller.take_outcome(),
            Err(SessionError::UnexpectedClose { code: 1006, .. })
        ));
    }

    #[test]
    fn malformed_metadata_fails_the_session() {
        let mut controller = streaming();
        let step = controller.on_event(text("Path:audio.metadata\r\n\r\n{broken"));
        assert_eq!(step, Step::Settled);
        assert_eq!(controller.state(), SessionState::Failed);
        assert!(matches!(
            controller.take_outcome(),
            Err(SessionError::MalformedMetadata(_))
        ));
    }

    #[test]
    fn frames_before_open_are_ignored() {
        let mut controller =
            SessionController::new("r1", "audio/mp3", SessionConfig::default(), CueOptions::default());
        assert_eq!(controller.on_event(text(TURN_END)), Step::Continue);
        assert_eq!(controller.state(), SessionState::Opening);
    }

    #[test]
    fn drains_in_batches() {
        let config = SessionConfig {
            drain_batch: 2,
            ..SessionConfig::default()
        };
        let mut controller = SessionController::new("r1", "audio/mp3", config, CueOptions::default());
        controller.on_event(SessionEvent::Opened);
        controller.on_event(SessionEvent::Inbound(audio(&[1])));
        assert_eq!(controller.reassembler.pending(), 1);
        controller.on_event(SessionEvent::Inbound(audio(&[2])));
        assert_eq!(controller.reassembler.pending(), 0);
        assert_eq!(controller.reassembler.received_len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn drive_times_out_and_closes_the_channel() {
        let (mut channel, peer) = memory_pair();
        let mut controller = streaming();
        let deadline = Instant::now() + Duration::from_secs(30);

        let err = drive(&mut channel, &mut controller, deadline).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::ConnectionTimeout { phase: "session", .. }
        ));
        assert!(peer.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_wins_over_ready_frames() {
        let (mut channel, peer) = memory_pair();
        peer.send_text(TURN_END);
        let mut controller = streaming();

        let err = drive(&mut channel, &mut controller, Instant::now()).await.unwrap_err();
        assert!(matches!(err, SessionError::ConnectionTimeout { .. }));
    }

    #[tokio::test]
    async fn drive_reports_transport_errors() {
        let (mut channel, peer) = memory_pair();
        peer.send_error(TransportError::Shutdown);
        let mut controller = streaming();
        let deadline = Instant::now() + Duration::from_secs(30);

        let err = drive(&mut channel, &mut controller, deadline).await.unwrap_err();
        assert!(matches!(err, SessionError::Transport(TransportError::Shutdown)));
    }

    #[tokio::test]
    async fn drive_reports_stream_end() {
        let (mut channel, peer) = memory_pair();
        drop(peer);
        let mut controller = streaming();
        let deadline = Instant::now() + Duration::from_secs(30);

        let err = drive(&mut channel, &mut controller, deadline).await.unwrap_err();
        match err {
            SessionError::UnexpectedClose { code, reason } => {
                assert_eq!(code, 1006);
                assert_eq!(reason, "stream ended");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[derive(Debug, Clone)]
    enum Arrival {
        Audio(Vec<u8>),
        Metadata(u32),
    }

    fn metadata_frame(offset: u32) -> String {
        format!(
            "X-RequestId:r1\r\nPath:audio.metadata\r\n\r\n{{\"offset\":{offset},\"duration\":1,\"text\":\"w{offset}\",\"type\":\"Word\"}}"
        )
    }

    fn arrival() -> impl Strategy<Value = Arrival> {
        prop_oneof![
            proptest::collection::vec(any::<u8>(), 0..6).prop_map(Arrival::Audio),
            (0u32..10_000).prop_map(Arrival::Metadata),
        ]
    }

    proptest! {
        #[test]
        fn any_interleaving_keeps_arrival_order(
            arrivals in proptest::collection::vec(arrival(), 0..24),
            drain_batch in 1usize..8,
        ) {
            let config = SessionConfig {
                drain_batch,
                ..SessionConfig::default()
            };
            let mut controller =
                SessionController::new("r1", "audio/mp3", config, CueOptions::default());
            prop_assert_eq!(controller.on_event(SessionEvent::Opened), Step::Continue);

            let mut expected_audio = Vec::new();
            let mut expected_metadata = Vec::new();
            for arrival in &arrivals {
                let step = match arrival {
                    Arrival::Audio(payload) => {
                        expected_audio.extend_from_slice(payload);
                        controller.on_event(SessionEvent::Inbound(audio(payload)))
                    }
                    Arrival::Metadata(offset) => {
                        expected_metadata.push(format!("w{offset}"));
                        controller.on_event(text(&metadata_frame(*offset)))
                    }
                };
                prop_assert_eq!(step, Step::Continue);
            }
            prop_assert_eq!(controller.on_event(text(TURN_END)), Step::Settled);

            let synthesis = controller.take_outcome().unwrap();
            prop_assert_eq!(synthesis.audio.data.as_ref(), expected_audio.as_slice());
            let texts: Vec<String> = synthesis
                .metadata
                .iter()
                .map(|event| event.raw()["text"].as_str().unwrap_or_default().to_string())
                .collect();
            prop_assert_eq!(texts, expected_metadata);
        }
    }
}
