//! Voice stream WebSocket handler
//!
//! One connection is one conversation. The handler resolves the session from
//! the query string, runs a writer task that renders session events into the
//! wire protocol, and reads inbound messages until the client leaves, the
//! stream stops, or the connection goes idle.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::Response,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio::{select, time::Duration};
use tracing::{debug, error, info, warn};

use crate::core::audio::AudioEncoding;
use crate::core::directory::resolve_agent_identity;
use crate::core::session::{
    CloseReason, EventReceiver, Session, SessionError, SessionEvent, SessionMode, teardown,
};
use crate::state::AppState;

use super::messages::{IncomingMessage, OutgoingMessage};
use super::params::{SessionPlan, VoiceStreamParams};
use super::processor::{dispatch, handle_incoming_message};

/// Outbound event queue depth; a reply of several seconds fits without backpressure
const CHANNEL_BUFFER_SIZE: usize = 1024;

/// Maximum WebSocket frame size (1 MB)
const MAX_WS_FRAME_SIZE: usize = 1024 * 1024;

/// Maximum WebSocket message size (1 MB)
const MAX_WS_MESSAGE_SIZE: usize = 1024 * 1024;

/// How often the idle check runs
const IDLE_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Voice stream WebSocket handler
///
/// Upgrades the connection; the query string is evaluated after the upgrade
/// so the client always receives a proper close frame on rejection.
pub async fn voice_stream_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<VoiceStreamParams>,
    State(state): State<Arc<AppState>>,
) -> Response {
    info!("Voice stream connection upgrade requested");

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_voice_socket(socket, params, state))
}

async fn handle_voice_socket(socket: WebSocket, params: VoiceStreamParams, app_state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let plan = match params.plan() {
        Ok(plan) => plan,
        Err(e) => {
            warn!("Rejecting voice stream connection: {}", e);
            reject(&mut sender, &e).await;
            return;
        }
    };

    let (event_tx, event_rx) = mpsc::channel::<SessionEvent>(CHANNEL_BUFFER_SIZE);
    let defaults = app_state.config.voice.identity_defaults();
    let buffer_config = app_state.config.voice.buffer_config();
    let initial_identity = plan.apply_overrides(defaults.apply(None));

    let (session, created) = app_state.registry.create_or_get(
        &plan.key,
        Box::new(|| {
            Session::new(
                plan.key.clone(),
                plan.mode,
                initial_identity,
                buffer_config,
                event_tx,
            )
        }),
    );
    if !created {
        let e = SessionError::AlreadyActive(plan.key.to_string());
        warn!(session = %plan.key, "Rejecting voice stream connection: {}", e);
        reject(&mut sender, &e).await;
        return;
    }

    info!(session = %session.key(), mode = %session.mode(), "Voice stream connection established");

    let (close_tx, close_rx) = oneshot::channel::<()>();
    let writer = tokio::spawn(write_events(sender, event_rx, close_rx, session.clone()));

    let transcripts = open_streaming_stt(&session, &app_state).await;
    start_session(&plan, &session, &app_state, transcripts);

    if session.mode() == SessionMode::DirectChat
        && let Some(greeting) = app_state.config.voice.greeting.clone()
    {
        let session = session.clone();
        let delay = app_state.config.voice.greeting_delay();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            session.emit(SessionEvent::Message { text: greeting }).await;
        });
    }

    let idle_timeout = app_state.config.voice.idle_timeout();
    let mut last_activity = std::time::Instant::now();
    let mut close_reason = CloseReason::Normal;

    loop {
        select! {
            msg_result = receiver.next() => {
                last_activity = std::time::Instant::now();

                match msg_result {
                    Some(Ok(msg)) => {
                        if !process_message(msg, &session, &app_state).await {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        warn!(session = %session.key(), "Voice stream WebSocket error: {}", e);
                        close_reason = CloseReason::Error;
                        break;
                    }
                    None => {
                        info!(session = %session.key(), "Voice stream closed by client");
                        break;
                    }
                }
            }
            _ = tokio::time::sleep(IDLE_CHECK_INTERVAL) => {
                if last_activity.elapsed() > idle_timeout {
                    warn!(
                        session = %session.key(),
                        "Voice stream idle for {}s, closing stale connection",
                        last_activity.elapsed().as_secs()
                    );
                    session
                        .emit(SessionEvent::Error {
                            message: "Connection closed due to inactivity".to_string(),
                        })
                        .await;
                    break;
                }
                debug!(session = %session.key(), "Voice stream idle check - still active");
            }
        }
    }

    teardown(app_state.registry.as_ref(), &session, close_reason).await;
    let _ = close_tx.send(());
    if let Err(e) = writer.await {
        error!(session = %session.key(), "Voice stream writer task failed: {}", e);
    }

    info!(session = %session.key(), "Voice stream connection terminated");
}

/// Parse and route one WebSocket message. Returns false to end the connection.
async fn process_message(msg: Message, session: &Arc<Session>, app_state: &Arc<AppState>) -> bool {
    match msg {
        Message::Text(text) => {
            let incoming: IncomingMessage = match serde_json::from_str(&text) {
                Ok(msg) => msg,
                Err(e) => {
                    let error = SessionError::InvalidMessage(e.to_string());
                    warn!(session = %session.key(), "Discarding message: {}", error);
                    return true;
                }
            };
            handle_incoming_message(incoming, session, app_state).await
        }
        Message::Binary(data) => {
            debug!(session = %session.key(), bytes = data.len(), "Ignoring binary frame");
            true
        }
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            info!(session = %session.key(), "Voice stream close received");
            false
        }
    }
}

/// Open the live transcriber for telephony sessions.
///
/// Returns the transcript stream, or `None` when the session should use
/// batch transcription instead.
async fn open_streaming_stt(
    session: &Arc<Session>,
    app_state: &Arc<AppState>,
) -> Option<crate::core::stt::TranscriptReceiver> {
    if session.mode() != SessionMode::Telephony {
        return None;
    }
    let factory = app_state.streaming_stt.as_ref()?;

    match factory.open(AudioEncoding::Mulaw).await {
        Ok((stt, transcripts)) => {
            info!(session = %session.key(), provider = stt.provider_info(), "Streaming transcription opened");
            session.attach_streaming_stt(stt);
            Some(transcripts)
        }
        Err(e) => {
            warn!(
                session = %session.key(),
                "Streaming transcription unavailable, using batches: {}", e
            );
            None
        }
    }
}

/// Resolve the identity and activate the session, then start consuming
/// transcripts and any batch that queued up meanwhile.
fn start_session(
    plan: &SessionPlan,
    session: &Arc<Session>,
    app_state: &Arc<AppState>,
    transcripts: Option<crate::core::stt::TranscriptReceiver>,
) {
    let session = session.clone();
    let app_state = app_state.clone();
    let plan = plan.clone();

    let activate = async move {
        if let Some(agent_id) = plan.agent_id.as_deref() {
            let identity = resolve_agent_identity(
                app_state.directory.as_ref(),
                agent_id,
                &app_state.config.voice.identity_defaults(),
                app_state.config.voice.directory_timeout(),
            )
            .await;
            if !session.activate(Some(plan.apply_overrides(identity))) {
                debug!(session = %session.key(), "Session closed before activation");
                return;
            }
        } else if !session.activate(None) {
            return;
        }

        dispatch(session.poll_pending(), &session, &app_state);

        if let Some(transcripts) = transcripts {
            app_state.pipeline.run_transcripts(session, transcripts).await;
        }
    };

    tokio::spawn(activate);
}

/// Render session events onto the socket until asked to close.
async fn write_events(
    mut sender: SplitSink<WebSocket, Message>,
    mut events: EventReceiver,
    mut close_rx: oneshot::Receiver<()>,
    session: Arc<Session>,
) {
    loop {
        select! {
            biased;
            event = events.recv() => {
                let Some(event) = event else { break };
                let message = OutgoingMessage::from_event(event, session.mode(), session.stream_sid());
                let json = match serde_json::to_string(&message) {
                    Ok(json) => json,
                    Err(e) => {
                        error!(session = %session.key(), "Failed to serialize outgoing message: {}", e);
                        continue;
                    }
                };
                if let Err(e) = sender.send(Message::Text(json.into())).await {
                    debug!(session = %session.key(), "Voice stream send failed: {}", e);
                    break;
                }
            }
            _ = &mut close_rx => {
                // Flush whatever was queued before the close request
                while let Ok(event) = events.try_recv() {
                    let message = OutgoingMessage::from_event(event, session.mode(), session.stream_sid());
                    if let Ok(json) = serde_json::to_string(&message)
                        && sender.send(Message::Text(json.into())).await.is_err()
                    {
                        break;
                    }
                }
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
        }
    }
    debug!(session = %session.key(), "Voice stream writer stopped");
}

/// Close a connection that will not get a session.
async fn reject(sender: &mut SplitSink<WebSocket, Message>, error: &SessionError) {
    let code = if error.is_fatal() {
        close_code::POLICY
    } else {
        close_code::ERROR
    };
    let error_message = OutgoingMessage::Error {
        message: error.to_string(),
    };
    if let Ok(json) = serde_json::to_string(&error_message) {
        let _ = sender.send(Message::Text(json.into())).await;
    }
    let _ = sender
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: error.to_string().into(),
        })))
        .await;
}
