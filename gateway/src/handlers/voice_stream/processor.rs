//! Voice stream message processing.
//!
//! Routes each parsed inbound message to the session: audio goes to the
//! streaming transcriber or the batch buffer, control events update session
//! metadata, and ready batches are handed to the pipeline on a spawned task.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::core::audio::{AudioEncoding, AudioFrame};
use crate::core::session::{BatchDecision, Session, SessionError, SessionEvent};
use crate::state::AppState;

use super::messages::IncomingMessage;

/// Process one inbound message.
///
/// # Returns
/// * `bool` - true to keep reading, false when the client ended the stream
#[inline]
pub async fn handle_incoming_message(
    msg: IncomingMessage,
    session: &Arc<Session>,
    app_state: &Arc<AppState>,
) -> bool {
    match msg {
        IncomingMessage::Audio { .. } | IncomingMessage::Media { .. } => {
            let encoding = match msg {
                IncomingMessage::Media { .. } => AudioEncoding::Mulaw,
                _ => AudioEncoding::Linear16,
            };
            match msg.audio_payload() {
                Some(Ok(audio)) => handle_audio(AudioFrame::new(audio, encoding), session, app_state).await,
                Some(Err(e)) => {
                    let error = SessionError::InvalidAudio(e.to_string());
                    warn!(session = %session.key(), "Discarding frame: {}", error);
                }
                None => {}
            }
            true
        }
        IncomingMessage::Ping => {
            session.emit(SessionEvent::Pong).await;
            true
        }
        IncomingMessage::Connected { protocol } => {
            debug!(session = %session.key(), ?protocol, "Media stream connected");
            true
        }
        IncomingMessage::Start { start } => {
            info!(
                session = %session.key(),
                stream_sid = %start.stream_sid,
                call_sid = ?start.call_sid,
                "Media stream started"
            );
            session.set_stream_sid(start.stream_sid);
            true
        }
        IncomingMessage::Stop => {
            info!(session = %session.key(), "Media stream stopped by client");
            false
        }
    }
}

async fn handle_audio(frame: AudioFrame, session: &Arc<Session>, app_state: &Arc<AppState>) {
    if frame.is_empty() {
        return;
    }

    // Live transcription bypasses the batch buffer
    if let Some(stt) = session.streaming_stt()
        && stt.is_ready()
    {
        if let Err(e) = stt.send_audio(frame.data).await {
            warn!(session = %session.key(), "Failed to forward audio to transcriber: {}", e);
        }
        return;
    }

    let decision = session.ingest(frame);
    dispatch(decision, session, app_state);
}

/// Start a pipeline run if `decision` carries a ready batch.
///
/// After each run the buffer is polled again, so frames that arrived while
/// the turn was in flight are processed without waiting for another frame.
pub fn dispatch(decision: BatchDecision, session: &Arc<Session>, app_state: &Arc<AppState>) {
    let batch = match decision {
        BatchDecision::Ready(batch) => batch,
        BatchDecision::Deferred { buffered } => {
            debug!(session = %session.key(), buffered, phase = %session.phase(), "Batch deferred");
            return;
        }
        BatchDecision::Pending { .. } => return,
    };

    let session = session.clone();
    let pipeline = app_state.pipeline.clone();
    tokio::spawn(async move {
        let mut next = Some(batch);
        while let Some(batch) = next.take() {
            let outcome = pipeline.run_batch(&session, batch).await;
            debug!(session = %session.key(), ?outcome, "Turn finished");
            if session.is_closed() {
                break;
            }
            next = session.poll_pending().into_batch();
        }
    });
}
