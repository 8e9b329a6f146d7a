//! Voice stream wire protocol.
//!
//! Every message is a JSON object tagged by its `event` field. Browser
//! clients use `audio`; telephony media streams use `connected`, `start`,
//! `media`, `stop` inbound and `media`/`mark` outbound.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::core::session::{AUDIO_END_MARK, SessionEvent, SessionMode};

// =============================================================================
// Incoming Messages (Client -> Server)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum IncomingMessage {
    /// Browser audio chunk, base64 PCM16 16 kHz
    Audio { data: String },

    Ping,

    /// Media stream handshake
    Connected {
        #[serde(default)]
        protocol: Option<String>,
    },

    /// Media stream metadata
    Start { start: StartPayload },

    /// Media stream audio chunk, base64 µ-law 8 kHz
    Media { media: MediaPayload },

    /// Media stream ended
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartPayload {
    pub stream_sid: String,
    #[serde(default)]
    pub call_sid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MediaPayload {
    pub payload: String,
}

impl IncomingMessage {
    /// Decoded audio bytes for `audio` and `media` messages.
    pub fn audio_payload(&self) -> Option<Result<Bytes, base64::DecodeError>> {
        let encoded = match self {
            IncomingMessage::Audio { data } => data,
            IncomingMessage::Media { media } => &media.payload,
            _ => return None,
        };
        Some(BASE64.decode(encoded).map(Bytes::from))
    }
}

// =============================================================================
// Outgoing Messages (Server -> Client)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum OutgoingMessage {
    /// Browser reply frame, base64 PCM16 16 kHz
    Audio { audio: String },

    /// Telephony reply frame, base64 µ-law 8 kHz
    Media {
        #[serde(rename = "streamSid", skip_serializing_if = "Option::is_none")]
        stream_sid: Option<String>,
        media: MediaPayload,
    },

    Mark {
        #[serde(rename = "streamSid", skip_serializing_if = "Option::is_none")]
        stream_sid: Option<String>,
        mark: MarkPayload,
    },

    Transcript { text: String, confidence: f64 },

    AgentResponse { text: String },

    /// Informational text such as the greeting
    Message { text: String },

    Error { message: String },

    Pong,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MarkPayload {
    pub name: String,
}

impl OutgoingMessage {
    /// Render a session event in the wire format of `mode`.
    pub fn from_event(event: SessionEvent, mode: SessionMode, stream_sid: Option<String>) -> Self {
        match event {
            SessionEvent::Audio(frame) => {
                let encoded = BASE64.encode(&frame);
                match mode {
                    SessionMode::Telephony => OutgoingMessage::Media {
                        stream_sid,
                        media: MediaPayload { payload: encoded },
                    },
                    SessionMode::DirectChat => OutgoingMessage::Audio { audio: encoded },
                }
            }
            SessionEvent::AudioEnd => OutgoingMessage::Mark {
                stream_sid,
                mark: MarkPayload {
                    name: AUDIO_END_MARK.to_string(),
                },
            },
            SessionEvent::Transcript { text, confidence } => {
                OutgoingMessage::Transcript { text, confidence }
            }
            SessionEvent::AgentResponse { text } => OutgoingMessage::AgentResponse { text },
            SessionEvent::Message { text } => OutgoingMessage::Message { text },
            SessionEvent::Error { message } => OutgoingMessage::Error { message },
            SessionEvent::Pong => OutgoingMessage::Pong,
        }
    }
}
