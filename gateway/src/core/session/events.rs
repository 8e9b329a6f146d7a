//! Transport-agnostic events a session emits toward its client.
//!
//! The WebSocket writer renders these into the wire protocol for the
//! session's mode (telephony `media` frames or browser `audio` frames).

use bytes::Bytes;
use tokio::sync::mpsc;

/// Name of the mark sent after the last frame of a reply.
pub const AUDIO_END_MARK: &str = "audio_end";

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// One egress frame, already in the session's wire encoding
    Audio(Bytes),
    /// All frames of the current reply have been sent
    AudioEnd,
    /// Final user transcript
    Transcript { text: String, confidence: f64 },
    /// Generated agent reply text
    AgentResponse { text: String },
    /// Informational text such as the greeting
    Message { text: String },
    /// Recoverable failure reported to the client
    Error { message: String },
    Pong,
}

pub type EventSender = mpsc::Sender<SessionEvent>;
pub type EventReceiver = mpsc::Receiver<SessionEvent>;
