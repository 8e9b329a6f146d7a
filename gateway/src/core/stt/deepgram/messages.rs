//! Deepgram response payloads.
//!
//! - [`ListenResponse`]: body of a pre-recorded `POST /v1/listen`
//! - [`StreamingMessage`]: JSON frames received on the live socket

use serde::{Deserialize, Serialize};

use crate::core::stt::base::Transcript;

// =============================================================================
// Shared
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Alternative {
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub confidence: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Channel {
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
}

impl Channel {
    fn best(&self) -> Transcript {
        self.alternatives
            .first()
            .map(|alt| Transcript::new(alt.transcript.clone(), alt.confidence))
            .unwrap_or_default()
    }
}

// =============================================================================
// Pre-recorded
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ListenResponse {
    pub results: ListenResults,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListenResults {
    #[serde(default)]
    pub channels: Vec<Channel>,
}

impl ListenResponse {
    /// Top alternative of the first channel, or an empty transcript.
    pub fn best_transcript(&self) -> Transcript {
        self.results
            .channels
            .first()
            .map(Channel::best)
            .unwrap_or_default()
    }
}

// =============================================================================
// Live
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ResultsMessage {
    pub channel: Channel,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub speech_final: bool,
}

impl ResultsMessage {
    pub fn transcript(&self) -> Transcript {
        self.channel.best()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum StreamingMessage {
    Results(ResultsMessage),
    UtteranceEnd,
    SpeechStarted,
    Metadata,
    #[serde(other)]
    Unknown,
}

/// Control frames sent to the live socket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ControlMessage {
    KeepAlive,
    CloseStream,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prerecorded_response() {
        let body = r#"{
            "metadata": {"request_id": "abc"},
            "results": {"channels": [{"alternatives": [
                {"transcript": "hello", "confidence": 0.97, "words": []}
            ]}]}
        }"#;
        let response: ListenResponse = serde_json::from_str(body).expect("Should parse");
        let transcript = response.best_transcript();
        assert_eq!(transcript.text, "hello");
        assert!((transcript.confidence - 0.97).abs() < f64::EPSILON);
    }

    #[test]
    fn test_prerecorded_without_alternatives_is_empty() {
        let body = r#"{"results": {"channels": [{"alternatives": []}]}}"#;
        let response: ListenResponse = serde_json::from_str(body).expect("Should parse");
        assert!(response.best_transcript().is_blank());
    }

    #[test]
    fn test_parse_live_results() {
        let raw = r#"{"type":"Results","channel_index":[0,1],"is_final":true,"speech_final":true,
            "channel":{"alternatives":[{"transcript":"book a table","confidence":0.9}]}}"#;
        match serde_json::from_str::<StreamingMessage>(raw).expect("Should parse") {
            StreamingMessage::Results(results) => {
                assert!(results.is_final);
                assert_eq!(results.transcript().text, "book a table");
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn test_parse_other_live_messages() {
        let utterance_end = r#"{"type":"UtteranceEnd","channel":[0,1],"last_word_end":2.3}"#;
        assert!(matches!(
            serde_json::from_str::<StreamingMessage>(utterance_end),
            Ok(StreamingMessage::UtteranceEnd)
        ));
        let unknown = r#"{"type":"Warning","description":"x"}"#;
        assert!(matches!(
            serde_json::from_str::<StreamingMessage>(unknown),
            Ok(StreamingMessage::Unknown)
        ));
    }

    #[test]
    fn test_control_message_serialization() {
        assert_eq!(
            serde_json::to_string(&ControlMessage::CloseStream).expect("Should serialize"),
            r#"{"type":"CloseStream"}"#
        );
    }
}
