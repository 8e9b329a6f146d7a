//! Pending inbound audio for batch transcription.
//!
//! Frames queue until the batch threshold is reached and the session's turn
//! guard is free. Appending, deciding readiness and taking the batch happen
//! under one lock, so a frame is either part of the handed-off batch or still
//! queued, never both.

use std::collections::VecDeque;
use std::str::FromStr;

use parking_lot::Mutex;
use serde::Deserialize;
use tracing::warn;

use super::guard::{TurnGuard, TurnPermit};
use crate::core::audio::AudioFrame;

/// Default number of frames that makes a batch.
pub const DEFAULT_BATCH_THRESHOLD: usize = 10;

/// Default cap on queued frames.
pub const DEFAULT_MAX_PENDING_FRAMES: usize = 500;

/// What to discard when the buffer is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Evict the oldest queued frame to make room
    #[default]
    DropOldest,
    /// Reject the incoming frame
    DropNewest,
}

impl FromStr for OverflowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "drop_oldest" | "oldest" => Ok(OverflowPolicy::DropOldest),
            "drop_newest" | "newest" => Ok(OverflowPolicy::DropNewest),
            other => Err(format!(
                "Invalid overflow policy '{other}', expected drop_oldest or drop_newest"
            )),
        }
    }
}

/// Buffer sizing and overflow behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    pub batch_threshold: usize,
    pub max_pending_frames: usize,
    pub overflow_policy: OverflowPolicy,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            batch_threshold: DEFAULT_BATCH_THRESHOLD,
            max_pending_frames: DEFAULT_MAX_PENDING_FRAMES,
            overflow_policy: OverflowPolicy::default(),
        }
    }
}

/// Frames handed to one pipeline run together with the turn they belong to.
#[derive(Debug)]
pub struct TurnBatch {
    pub permit: TurnPermit,
    pub frames: Vec<AudioFrame>,
}

/// Outcome of appending a frame.
#[derive(Debug)]
pub enum BatchDecision {
    /// Below threshold
    Pending { buffered: usize },
    /// Threshold reached but a turn is running or the session is not active yet
    Deferred { buffered: usize },
    /// Batch taken; the buffer is now empty
    Ready(TurnBatch),
}

impl BatchDecision {
    pub fn is_ready(&self) -> bool {
        matches!(self, BatchDecision::Ready(_))
    }

    pub fn into_batch(self) -> Option<TurnBatch> {
        match self {
            BatchDecision::Ready(batch) => Some(batch),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct BufferInner {
    frames: VecDeque<AudioFrame>,
    dropped: u64,
}

#[derive(Debug)]
pub struct AudioBuffer {
    config: BufferConfig,
    inner: Mutex<BufferInner>,
}

impl AudioBuffer {
    pub fn new(config: BufferConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(BufferInner::default()),
        }
    }

    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// Queue a frame and, if a batch is ready and the guard is free, take it.
    pub fn append(&self, frame: AudioFrame, guard: &TurnGuard) -> BatchDecision {
        let mut inner = self.inner.lock();

        if inner.frames.len() >= self.config.max_pending_frames.max(1) {
            inner.dropped += 1;
            let dropped = inner.dropped;
            match self.config.overflow_policy {
                OverflowPolicy::DropOldest => {
                    inner.frames.pop_front();
                    inner.frames.push_back(frame);
                }
                OverflowPolicy::DropNewest => {}
            }
            warn!(
                policy = ?self.config.overflow_policy,
                dropped_total = dropped,
                "Audio buffer full, dropping frame"
            );
        } else {
            inner.frames.push_back(frame);
        }

        self.decide(&mut inner, guard)
    }

    /// Re-evaluate readiness without adding a frame, e.g. right after activation.
    pub fn poll_ready(&self, guard: &TurnGuard) -> BatchDecision {
        let mut inner = self.inner.lock();
        self.decide(&mut inner, guard)
    }

    fn decide(&self, inner: &mut BufferInner, guard: &TurnGuard) -> BatchDecision {
        let buffered = inner.frames.len();
        if buffered < self.config.batch_threshold.max(1) {
            return BatchDecision::Pending { buffered };
        }

        match guard.try_acquire() {
            Some(permit) => BatchDecision::Ready(TurnBatch {
                permit,
                frames: inner.frames.drain(..).collect(),
            }),
            None => BatchDecision::Deferred { buffered },
        }
    }

    /// Take and clear all queued frames.
    pub fn take(&self) -> Vec<AudioFrame> {
        self.inner.lock().frames.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frames discarded by the overflow policy so far
    pub fn dropped(&self) -> u64 {
        self.inner.lock().dropped
    }
}
