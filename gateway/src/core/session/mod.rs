//! Per-connection voice session state.
//!
//! # Modules
//! - `state`: the [`Session`] itself, its key, mode and identity
//! - `registry`: process-wide session index and teardown
//! - `context`: append-only conversation history
//! - `buffer`: bounded inbound audio buffer with batch hand-off
//! - `guard`: one-turn-at-a-time permit
//! - `phase`: lifecycle state machine
//! - `events`: outbound events rendered by the transport
//! - `error`: session error taxonomy

pub mod buffer;
pub mod context;
pub mod error;
pub mod events;
pub mod guard;
pub mod phase;
pub mod registry;
pub mod state;

pub use buffer::{AudioBuffer, BatchDecision, BufferConfig, OverflowPolicy, TurnBatch};
pub use context::{ConversationContext, Role, Turn};
pub use error::{SessionError, SessionResult};
pub use events::{AUDIO_END_MARK, EventReceiver, EventSender, SessionEvent};
pub use guard::{TurnGuard, TurnPermit};
pub use phase::{CloseReason, PhaseCell, SessionPhase};
pub use registry::{InMemorySessionRegistry, SessionRegistry, teardown};
pub use state::{Session, SessionIdentity, SessionKey, SessionMode};
