//! Voice stream route configuration

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::voice_stream_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the voice stream WebSocket router
///
/// # Endpoint
///
/// `GET /voice-stream` - WebSocket upgrade for a voice conversation
///
/// # Query parameters
///
/// - `callId` + `agentId`: phone call, persona and voice from the agent directory
/// - `campaignId` + `contactId`: phone call placed by a campaign
/// - `voiceId` (+ optional `identity`): browser voice chat
///
/// # Example
///
/// ```json
/// // Browser sends audio
/// {"event": "audio", "data": "<base64 PCM16>"}
///
/// // Server replies
/// {"event": "audio", "audio": "<base64 PCM16>"}
/// {"event": "mark", "mark": {"name": "audio_end"}}
/// {"event": "transcript", "text": "hello", "confidence": 0.98}
/// {"event": "agent-response", "text": "Hi there!"}
/// ```
pub fn create_voice_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/voice-stream", get(voice_stream_handler))
        .layer(TraceLayer::new_for_http())
}
