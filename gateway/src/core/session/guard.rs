//! One-turn-at-a-time guard for a session.
//!
//! Acquisition moves the session phase from `Idle` to `Processing`; the
//! returned [`TurnPermit`] moves it back when dropped, whatever path the turn
//! took to finish.

use std::sync::Arc;

use tokio::sync::Notify;
use tracing::debug;

use super::phase::{PhaseCell, SessionPhase};

#[derive(Debug, Clone)]
pub struct TurnGuard {
    phase: PhaseCell,
    released: Arc<Notify>,
}

impl TurnGuard {
    pub fn new(phase: PhaseCell) -> Self {
        Self {
            phase,
            released: Arc::new(Notify::new()),
        }
    }

    /// Try to start a turn. Returns `None` while another turn is in flight,
    /// before the session is active, or after it has closed.
    pub fn try_acquire(&self) -> Option<TurnPermit> {
        if self.phase.begin_turn() {
            Some(TurnPermit {
                phase: self.phase.clone(),
                released: self.released.clone(),
            })
        } else {
            None
        }
    }

    /// Wait for the turn slot while another turn holds it. Returns `None`
    /// if the session is not active or closes before the slot frees up.
    pub async fn acquire(&self) -> Option<TurnPermit> {
        loop {
            let released = self.released.notified();
            tokio::pin!(released);
            released.as_mut().enable();

            if let Some(permit) = self.try_acquire() {
                return Some(permit);
            }
            if self.phase.current() != SessionPhase::Processing {
                return None;
            }
            released.await;
        }
    }

    pub fn is_busy(&self) -> bool {
        self.phase.current() == SessionPhase::Processing
    }
}

/// Proof that the holder owns the session's single turn slot.
#[derive(Debug)]
#[must_use = "dropping the permit immediately releases the turn"]
pub struct TurnPermit {
    phase: PhaseCell,
    released: Arc<Notify>,
}

impl Drop for TurnPermit {
    fn drop(&mut self) {
        if !self.phase.end_turn() {
            debug!(phase = %self.phase.current(), "Turn released after session left processing");
        }
        self.released.notify_waiters();
    }
}
