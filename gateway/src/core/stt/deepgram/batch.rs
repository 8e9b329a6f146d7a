//! Deepgram pre-recorded transcription.
//!
//! Each call submits one complete batch to `POST /v1/listen` and returns the
//! top alternative of the first channel.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, info};

use super::config::DeepgramSTTConfig;
use super::messages::ListenResponse;
use crate::core::audio::AudioEncoding;
use crate::core::stt::base::{STTError, STTResult, Transcript, Transcriber};

/// Characters of an error body kept in the error message.
const MAX_ERROR_BODY_CHARS: usize = 200;

pub struct DeepgramBatchSTT {
    config: DeepgramSTTConfig,
    http_client: Client,
}

impl DeepgramBatchSTT {
    pub fn new(config: DeepgramSTTConfig) -> STTResult<Self> {
        config.validate()?;

        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| STTError::ConfigurationError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &DeepgramSTTConfig {
        &self.config
    }
}

#[async_trait]
impl Transcriber for DeepgramBatchSTT {
    async fn transcribe(&self, audio: Bytes, encoding: AudioEncoding) -> STTResult<Transcript> {
        if audio.is_empty() {
            debug!("No audio data to transcribe");
            return Ok(Transcript::default());
        }

        let url = self.config.batch_url(encoding)?;
        let audio_len = audio.len();

        let response = self
            .http_client
            .post(url)
            .header("Authorization", format!("Token {}", self.config.api_key))
            .header("Content-Type", "application/octet-stream")
            .body(audio)
            .send()
            .await
            .map_err(|e| STTError::NetworkError(format!("Request failed: {e}")))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| STTError::NetworkError(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let body: String = response_text.chars().take(MAX_ERROR_BODY_CHARS).collect();
            let error_msg = format!("Deepgram API error ({status}): {body}");
            return Err(match status.as_u16() {
                401 | 403 => STTError::AuthenticationFailed(error_msg),
                400 => STTError::InvalidAudioFormat(error_msg),
                _ => STTError::ProviderError(error_msg),
            });
        }

        let parsed: ListenResponse = serde_json::from_str(&response_text)
            .map_err(|e| STTError::ProviderError(format!("Failed to parse response: {e}")))?;
        let transcript = parsed.best_transcript();

        info!(
            bytes = audio_len,
            chars = transcript.text.len(),
            confidence = transcript.confidence,
            "Deepgram batch transcription complete"
        );
        Ok(transcript)
    }

    fn provider_info(&self) -> &'static str {
        "deepgram"
    }
}
