//! Session lifecycle state machine.
//!
//! ```text
//! Connecting ──activate──▶ Idle ──begin_turn──▶ Processing
//!                           ▲                        │
//!                           └───────end_turn─────────┘
//! any ──close──▶ Closed(Normal | Error)   (terminal)
//! ```
//!
//! The phase lives in a single `AtomicU8` and every transition is a
//! compare-and-set, so racing callers observe exactly one winner.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

const CONNECTING: u8 = 0;
const IDLE: u8 = 1;
const PROCESSING: u8 = 2;
const CLOSED_NORMAL: u8 = 3;
const CLOSED_ERROR: u8 = 4;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Transport closed cleanly or the stream was stopped
    Normal,
    /// Unrecoverable transport error
    Error,
}

/// Observable lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Connecting,
    Idle,
    Processing,
    Closed(CloseReason),
}

impl SessionPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            CONNECTING => SessionPhase::Connecting,
            IDLE => SessionPhase::Idle,
            PROCESSING => SessionPhase::Processing,
            CLOSED_NORMAL => SessionPhase::Closed(CloseReason::Normal),
            _ => SessionPhase::Closed(CloseReason::Error),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SessionPhase::Idle | SessionPhase::Processing)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, SessionPhase::Closed(_))
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhase::Connecting => write!(f, "connecting"),
            SessionPhase::Idle => write!(f, "idle"),
            SessionPhase::Processing => write!(f, "processing"),
            SessionPhase::Closed(CloseReason::Normal) => write!(f, "closed"),
            SessionPhase::Closed(CloseReason::Error) => write!(f, "closed(error)"),
        }
    }
}

/// Shared, lock-free cell holding a session's phase.
#[derive(Debug, Clone)]
pub struct PhaseCell {
    state: Arc<AtomicU8>,
}

impl PhaseCell {
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(CONNECTING)),
        }
    }

    pub fn current(&self) -> SessionPhase {
        SessionPhase::from_u8(self.state.load(Ordering::Acquire))
    }

    fn transition(&self, from: u8, to: u8) -> bool {
        self.state
            .compare_exchange(from, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// `Connecting → Idle`. Returns false if the session was already active or closed.
    pub fn activate(&self) -> bool {
        self.transition(CONNECTING, IDLE)
    }

    /// `Idle → Processing`.
    pub fn begin_turn(&self) -> bool {
        self.transition(IDLE, PROCESSING)
    }

    /// `Processing → Idle`. A no-op once the session is closed.
    pub fn end_turn(&self) -> bool {
        self.transition(PROCESSING, IDLE)
    }

    /// Move to `Closed`. Only the first caller gets `true`.
    pub fn close(&self, reason: CloseReason) -> bool {
        let target = match reason {
            CloseReason::Normal => CLOSED_NORMAL,
            CloseReason::Error => CLOSED_ERROR,
        };

        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if current == CLOSED_NORMAL || current == CLOSED_ERROR {
                return false;
            }
            match self.state.compare_exchange_weak(
                current,
                target,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.current().is_closed()
    }
}

impl Default for PhaseCell {
    fn default() -> Self {
        Self::new()
    }
}
