use std::collections::VecDeque;

use bytes::{Bytes, BytesMut};
use speechwire_frame::split_binary;
use tracing::{debug, trace};

use crate::error::{Result, SessionError};

/// Turns queued binary frames into one contiguous audio buffer.
///
/// Frames are queued undecoded and processed in arrival order by
/// [`drain`](Self::drain). A frame without the `Path:audio` separator
/// contributes nothing and is counted in [`discarded`](Self::discarded).
#[derive(Debug, Default)]
pub struct AudioReassembler {
    queue: VecDeque<Bytes>,
    fragments: Vec<Bytes>,
    expected: u64,
    received: u64,
    discarded: usize,
}

impl AudioReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one raw binary frame.
    pub fn enqueue(&mut self, frame: Bytes) {
        self.queue.push_back(frame);
    }

    /// Frames waiting to be drained.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Process every queued frame. Does nothing on an empty queue.
    pub fn drain(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        let frames = self.queue.len();
        while let Some(frame) = self.queue.pop_front() {
            let Some(binary) = split_binary(&frame) else {
                self.discarded += 1;
                debug!(bytes = frame.len(), "discarding binary frame without audio separator");
                continue;
            };

            if let Some(length) = binary.headers.content_length() {
                self.expected = self.expected.saturating_add(length);
            }
            trace!(bytes = binary.payload.len(), "audio fragment");
            self.received += binary.payload.len() as u64;
            if !binary.payload.is_empty() {
                self.fragments.push(binary.payload);
            }
        }
        debug!(
            frames,
            received = self.received,
            expected = self.expected,
            "drained audio frames"
        );
    }

    /// Running total of declared `Content-Length` values. Zero means unknown.
    pub fn expected_len(&self) -> u64 {
        self.expected
    }

    /// Audio bytes reassembled so far.
    pub fn received_len(&self) -> u64 {
        self.received
    }

    /// Frames dropped for lacking the separator.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Drain what remains and concatenate fragments in arrival order.
    ///
    /// Fails when lengths were declared and fewer bytes arrived. Excess
    /// bytes are accepted.
    pub fn finalize(&mut self) -> Result<Bytes> {
        self.drain();

        if self.expected > 0 && self.received < self.expected {
            return Err(SessionError::IncompleteAudio {
                got: self.received,
                expected: self.expected,
            });
        }

        let fragments = std::mem::take(&mut self.fragments);
        let audio = match fragments.len() {
            0 => Bytes::new(),
            1 => fragments.into_iter().next().unwrap_or_default(),
            _ => {
                let mut out = BytesMut::with_capacity(self.received as usize);
                for fragment in &fragments {
                    out.extend_from_slice(fragment);
                }
                out.freeze()
            }
        };
        Ok(audio)
    }
}
