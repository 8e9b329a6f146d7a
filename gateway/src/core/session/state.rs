use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use super::buffer::{AudioBuffer, BatchDecision, BufferConfig};
use super::context::ConversationContext;
use super::events::{EventSender, SessionEvent};
use super::guard::{TurnGuard, TurnPermit};
use super::phase::{CloseReason, PhaseCell, SessionPhase};
use crate::core::audio::{AudioEncoding, AudioFrame};
use crate::core::stt::StreamingTranscriber;
use crate::core::tts::voices::resolve_voice_id;

/// Registry key of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SessionKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Which kind of client is on the other end of the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Phone call bridged through a media stream: µ-law 8 kHz both ways
    Telephony,
    /// Browser voice chat: PCM16 16 kHz both ways
    DirectChat,
}

impl SessionMode {
    /// Encoding of frames received from the client
    pub fn ingest_encoding(&self) -> AudioEncoding {
        match self {
            SessionMode::Telephony => AudioEncoding::Mulaw,
            SessionMode::DirectChat => AudioEncoding::Linear16,
        }
    }

    /// Encoding of frames sent back to the client
    pub fn egress_encoding(&self) -> AudioEncoding {
        self.ingest_encoding()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Telephony => "telephony",
            SessionMode::DirectChat => "direct_chat",
        }
    }
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who the agent is in this conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub persona: String,
    /// Logical voice name as configured, e.g. `eleven-rachel`
    pub voice_name: String,
    /// Provider voice id resolved from `voice_name`
    pub voice_id: String,
    pub display_name: String,
}

impl SessionIdentity {
    pub fn new(
        persona: impl Into<String>,
        voice_name: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        let voice_name = voice_name.into();
        Self {
            persona: persona.into(),
            voice_id: resolve_voice_id(&voice_name).to_string(),
            voice_name,
            display_name: display_name.into(),
        }
    }
}

/// State of one live conversation.
///
/// Shared as `Arc<Session>` between the socket reader, the writer and any
/// pipeline run. All mutation goes through interior locks or atomics.
pub struct Session {
    key: SessionKey,
    mode: SessionMode,
    created_at: OffsetDateTime,
    context: ConversationContext,
    buffer: AudioBuffer,
    phase: PhaseCell,
    guard: TurnGuard,
    identity: RwLock<SessionIdentity>,
    stream_sid: RwLock<Option<String>>,
    events: EventSender,
    streaming_stt: Mutex<Option<Arc<dyn StreamingTranscriber>>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("key", &self.key)
            .field("mode", &self.mode)
            .field("phase", &self.phase.current())
            .field("turns", &self.context.len())
            .field("buffered_frames", &self.buffer.len())
            .finish()
    }
}

impl Session {
    /// Create a session in the `Connecting` phase.
    pub fn new(
        key: SessionKey,
        mode: SessionMode,
        identity: SessionIdentity,
        buffer_config: BufferConfig,
        events: EventSender,
    ) -> Self {
        let phase = PhaseCell::new();
        Self {
            key,
            mode,
            created_at: OffsetDateTime::now_utc(),
            context: ConversationContext::new(),
            buffer: AudioBuffer::new(buffer_config),
            guard: TurnGuard::new(phase.clone()),
            phase,
            identity: RwLock::new(identity),
            stream_sid: RwLock::new(None),
            events,
            streaming_stt: Mutex::new(None),
        }
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    pub fn buffer(&self) -> &AudioBuffer {
        &self.buffer
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase.current()
    }

    pub fn is_closed(&self) -> bool {
        self.phase.is_closed()
    }

    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    pub fn identity(&self) -> SessionIdentity {
        self.identity.read().clone()
    }

    /// Install the resolved identity and move to `Idle`.
    ///
    /// Returns false if the session had already been activated or closed; the
    /// identity is left untouched in that case.
    pub fn activate(&self, identity: Option<SessionIdentity>) -> bool {
        if self.phase.current() != SessionPhase::Connecting {
            return false;
        }
        if let Some(identity) = identity {
            *self.identity.write() = identity;
        }
        let activated = self.phase.activate();
        if activated {
            info!(session = %self.key, mode = %self.mode, "Session active");
        }
        activated
    }

    /// Queue an inbound frame for batch transcription.
    pub fn ingest(&self, frame: AudioFrame) -> BatchDecision {
        if self.is_closed() {
            return BatchDecision::Pending { buffered: 0 };
        }
        self.buffer.append(frame, &self.guard)
    }

    /// Take the pending batch if it became ready without a new frame.
    pub fn poll_pending(&self) -> BatchDecision {
        self.buffer.poll_ready(&self.guard)
    }

    /// Claim the turn slot for a transcript that did not come from the buffer.
    pub fn begin_turn(&self) -> Option<TurnPermit> {
        self.guard.try_acquire()
    }

    /// Like [`Session::begin_turn`], but waits out a turn already in flight.
    pub async fn wait_for_turn(&self) -> Option<TurnPermit> {
        self.guard.acquire().await
    }

    pub fn set_stream_sid(&self, stream_sid: impl Into<String>) {
        *self.stream_sid.write() = Some(stream_sid.into());
    }

    pub fn stream_sid(&self) -> Option<String> {
        self.stream_sid.read().clone()
    }

    pub fn attach_streaming_stt(&self, stt: Arc<dyn StreamingTranscriber>) {
        *self.streaming_stt.lock() = Some(stt);
    }

    pub fn streaming_stt(&self) -> Option<Arc<dyn StreamingTranscriber>> {
        self.streaming_stt.lock().clone()
    }

    /// Send an event to the client. Returns false once the session is closed
    /// or the writer has gone away.
    pub async fn emit(&self, event: SessionEvent) -> bool {
        if self.is_closed() {
            return false;
        }
        self.events.send(event).await.is_ok()
    }

    /// Close the session, discarding buffered audio and releasing the
    /// streaming transcriber. Only the first call does any work and returns true.
    pub async fn close(&self, reason: CloseReason) -> bool {
        if !self.phase.close(reason) {
            return false;
        }

        let discarded = self.buffer.take().len();
        if discarded > 0 {
            debug!(session = %self.key, frames = discarded, "Discarded unflushed audio");
        }

        let stt = self.streaming_stt.lock().take();
        if let Some(stt) = stt
            && let Err(e) = stt.close().await
        {
            warn!(session = %self.key, "Failed to close streaming transcriber: {}", e);
        }

        info!(
            session = %self.key,
            reason = ?reason,
            turns = self.context.len(),
            "Session closed"
        );
        true
    }
}
