use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::core::audio::AudioEncoding;

/// Errors raised by transcription providers.
#[derive(Debug, Error)]
pub enum STTError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Invalid audio format: {0}")]
    InvalidAudioFormat(String),
}

pub type STTResult<T> = Result<T, STTError>;

/// A final transcription result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub confidence: f64,
}

impl Transcript {
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }

    /// True when there is nothing worth answering.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// One-shot transcription of a complete audio batch.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe `audio`, encoded as `encoding`.
    async fn transcribe(&self, audio: Bytes, encoding: AudioEncoding) -> STTResult<Transcript>;

    fn provider_info(&self) -> &'static str;
}

/// A live transcription stream owned by one session.
///
/// Audio is pushed as it arrives; final transcripts are delivered on the
/// receiver returned by [`StreamingTranscriberFactory::open`].
#[async_trait]
pub trait StreamingTranscriber: Send + Sync {
    async fn send_audio(&self, audio: Bytes) -> STTResult<()>;

    /// Finish the stream. Calling it more than once is a no-op.
    async fn close(&self) -> STTResult<()>;

    fn is_ready(&self) -> bool;

    fn provider_info(&self) -> &'static str;
}

/// Receiver side of a streaming transcription.
pub type TranscriptReceiver = mpsc::Receiver<Transcript>;

/// Opens streaming transcriptions on demand.
#[async_trait]
pub trait StreamingTranscriberFactory: Send + Sync {
    async fn open(
        &self,
        encoding: AudioEncoding,
    ) -> STTResult<(Arc<dyn StreamingTranscriber>, TranscriptReceiver)>;
}
