//! Session builders and event collection helpers

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use voicebridge_gateway::core::session::{
    BufferConfig, EventReceiver, Session, SessionEvent, SessionIdentity, SessionKey, SessionMode,
};

/// Default wait for an expected event
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(2);

pub fn test_identity() -> SessionIdentity {
    SessionIdentity::new("You are a helpful AI assistant.", "eleven-rachel", "AI Assistant")
}

/// A session with its event receiver. Not yet activated.
pub fn new_session(key: &str, mode: SessionMode, batch_threshold: usize) -> (Arc<Session>, EventReceiver) {
    let (tx, rx) = mpsc::channel(1024);
    let mut buffer = BufferConfig::default();
    buffer.batch_threshold = batch_threshold;
    let session = Session::new(SessionKey::new(key), mode, test_identity(), buffer, tx);
    (Arc::new(session), rx)
}

/// An activated browser session with a threshold of 10 frames.
pub fn active_chat_session(key: &str) -> (Arc<Session>, EventReceiver) {
    let (session, rx) = new_session(key, SessionMode::DirectChat, 10);
    assert!(session.activate(None), "fresh session should activate");
    (session, rx)
}

/// Everything currently queued, without waiting.
pub fn drain(rx: &mut EventReceiver) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Wait for the next event.
pub async fn next_event(rx: &mut EventReceiver) -> Option<SessionEvent> {
    tokio::time::timeout(EVENT_TIMEOUT, rx.recv()).await.ok().flatten()
}

/// Collect events until one matches `done` (inclusive) or the wait expires.
pub async fn collect_until(
    rx: &mut EventReceiver,
    done: impl Fn(&SessionEvent) -> bool,
) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Some(event) = next_event(rx).await {
        let finished = done(&event);
        events.push(event);
        if finished {
            break;
        }
    }
    events
}

/// Compact label per event for order assertions
pub fn kinds(events: &[SessionEvent]) -> Vec<&'static str> {
    let mut kinds: Vec<&'static str> = Vec::new();
    for event in events {
        let kind = match event {
            SessionEvent::Audio(_) => "audio",
            SessionEvent::AudioEnd => "audio-end",
            SessionEvent::Transcript { .. } => "transcript",
            SessionEvent::AgentResponse { .. } => "agent-response",
            SessionEvent::Message { .. } => "message",
            SessionEvent::Error { .. } => "error",
            SessionEvent::Pong => "pong",
        };
        // Collapse runs of audio frames
        if kind == "audio" && kinds.last() == Some(&"audio") {
            continue;
        }
        kinds.push(kind);
    }
    kinds
}
