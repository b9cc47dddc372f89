use speechwire_subtitle::{CueBuilder, CueOptions};
use speechwire_transport::{Connector, DuplexChannel};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::{Result, SessionError};
use crate::establish::{edge_connector, open, EstablishConfig};
use crate::lifecycle::{drive, SessionConfig, SessionController, SessionEvent};
use crate::request::{js_timestamp, new_id, SynthesisRequest};
use crate::synthesis::{mime_for_format, Synthesis};

/// Everything one synthesis needs.
#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    pub request: SynthesisRequest,
    pub establish: EstablishConfig,
    pub session: SessionConfig,
    pub cues: CueOptions,
}

impl SynthesisOptions {
    /// Default options for `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            request: SynthesisRequest::new(text),
            establish: EstablishConfig::default(),
            session: SessionConfig::default(),
            cues: CueOptions::default(),
        }
    }

    /// Check every parameter. Nothing is opened when this fails.
    pub fn validate(&self) -> Result<()> {
        self.request.validate()?;
        self.establish.validate()?;
        if self.session.deadline.is_zero() {
            return Err(SessionError::InvalidConfiguration(
                "session deadline must be greater than zero".to_string(),
            ));
        }
        if self.session.drain_batch == 0 {
            return Err(SessionError::InvalidConfiguration(
                "drain batch must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Synthesize speech against the default service endpoint.
pub async fn synthesize(options: &SynthesisOptions) -> Result<Synthesis> {
    synthesize_with(&edge_connector(), options, options.cues.clone()).await
}

/// Synthesize speech over channels from `connector`, building subtitles
/// with `cue_builder`.
///
/// The session deadline starts before the channel is opened and covers the
/// whole exchange.
pub async fn synthesize_with<C, B>(
    connector: &C,
    options: &SynthesisOptions,
    cue_builder: B,
) -> Result<Synthesis>
where
    C: Connector,
    B: CueBuilder,
{
    options.validate()?;

    let deadline = Instant::now() + options.session.deadline;
    let request_id = new_id();
    let mime_type = mime_for_format(&options.establish.output_format);
    let mut controller = SessionController::new(
        request_id.clone(),
        mime_type,
        options.session.clone(),
        cue_builder,
    );

    info!(
        request_id = %request_id,
        voice = %options.request.voice,
        text_bytes = options.request.text.len(),
        output_format = %options.establish.output_format,
        "starting synthesis"
    );

    let opened = tokio::time::timeout_at(deadline, open(connector, &options.establish)).await;
    let mut channel = match opened {
        Ok(Ok(channel)) => channel,
        Ok(Err(err)) => {
            controller.fail(err);
            return controller.take_outcome();
        }
        Err(_) => {
            controller.on_event(SessionEvent::DeadlineElapsed);
            return controller.take_outcome();
        }
    };
    controller.on_event(SessionEvent::Opened);

    let sent = match options.request.to_frame(&request_id, &js_timestamp()) {
        Ok(frame) => channel.send_text(frame).await.map_err(SessionError::from),
        Err(err) => Err(err),
    };
    if let Err(err) = sent {
        if let Err(close_err) = channel.close().await {
            debug!(error = %close_err, "closing channel after send failure failed");
        }
        controller.fail(err);
        return controller.take_outcome();
    }
    debug!(request_id = %request_id, "synthesis request sent");

    drive(&mut channel, &mut controller, deadline).await
}
