//! ElevenLabs text-to-speech.
//!
//! # API Reference
//!
//! - Endpoint: `POST {api_url}/v1/text-to-speech/{voice_id}?output_format=...`
//! - Auth: `xi-api-key` header
//! - Output formats used here: `ulaw_8000` (telephony), `pcm_16000` (browser)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info};
use url::Url;

use crate::core::audio::AudioEncoding;
use crate::core::tts::base::{SpeechSynthesizer, SynthesizedAudio, TTSError, TTSResult};

/// ElevenLabs REST base URL
pub const ELEVENLABS_API_URL: &str = "https://api.elevenlabs.io";

/// Model used when none is configured
pub const DEFAULT_ELEVENLABS_MODEL: &str = "eleven_multilingual_v2";

#[derive(Debug, Clone)]
pub struct ElevenLabsConfig {
    pub api_key: String,
    pub api_url: String,
    pub model_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
    pub request_timeout: Duration,
}

impl ElevenLabsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: ELEVENLABS_API_URL.to_string(),
            model_id: DEFAULT_ELEVENLABS_MODEL.to_string(),
            stability: 0.5,
            similarity_boost: 0.75,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// ElevenLabs `output_format` for an encoding
pub fn output_format(encoding: AudioEncoding) -> &'static str {
    match encoding {
        AudioEncoding::Mulaw => "ulaw_8000",
        AudioEncoding::Linear16 => "pcm_16000",
    }
}

pub struct ElevenLabsTTS {
    config: ElevenLabsConfig,
    http_client: Client,
}

impl ElevenLabsTTS {
    pub fn new(config: ElevenLabsConfig) -> TTSResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(TTSError::AuthenticationFailed(
                "ElevenLabs API key is required".to_string(),
            ));
        }

        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| TTSError::ConfigurationError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn speech_url(&self, voice_id: &str, encoding: AudioEncoding) -> TTSResult<Url> {
        let base = format!("{}/v1/text-to-speech", self.config.api_url.trim_end_matches('/'));
        let mut url = Url::parse(&base)
            .map_err(|e| TTSError::ConfigurationError(format!("Invalid ElevenLabs URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| TTSError::ConfigurationError("ElevenLabs URL cannot be a base".into()))?
            .push(voice_id);
        url.query_pairs_mut()
            .append_pair("output_format", output_format(encoding));
        Ok(url)
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsTTS {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        encoding: AudioEncoding,
    ) -> TTSResult<SynthesizedAudio> {
        if text.trim().is_empty() {
            return Err(TTSError::ConfigurationError(
                "Cannot synthesize empty text".to_string(),
            ));
        }

        let body = json!({
            "text": text,
            "model_id": self.config.model_id,
            "voice_settings": {
                "stability": self.config.stability,
                "similarity_boost": self.config.similarity_boost,
            },
        });

        debug!(voice_id, chars = text.len(), %encoding, "Sending ElevenLabs request");

        let response = self
            .http_client
            .post(self.speech_url(voice_id, encoding)?)
            .header("xi-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| TTSError::NetworkError(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let error_msg = format!("ElevenLabs API error ({status}): {error_text}");
            return Err(match status.as_u16() {
                401 | 403 => TTSError::AuthenticationFailed(error_msg),
                _ => TTSError::ProviderError(error_msg),
            });
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| TTSError::NetworkError(format!("Failed to read audio: {e}")))?;
        if audio.is_empty() {
            return Err(TTSError::EmptyAudio);
        }

        let synthesized = SynthesizedAudio::new(audio, encoding);
        info!(
            voice_id,
            bytes = synthesized.data.len(),
            duration_ms = synthesized.duration_ms(),
            "ElevenLabs synthesis complete"
        );
        Ok(synthesized)
    }

    fn provider_info(&self) -> &'static str {
        "elevenlabs"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tts_for(server: &MockServer) -> ElevenLabsTTS {
        let config = ElevenLabsConfig {
            api_url: server.uri(),
            ..ElevenLabsConfig::new("el-key")
        };
        ElevenLabsTTS::new(config).expect("Should create client")
    }

    #[test]
    fn test_output_formats() {
        assert_eq!(output_format(AudioEncoding::Mulaw), "ulaw_8000");
        assert_eq!(output_format(AudioEncoding::Linear16), "pcm_16000");
    }

    #[test]
    fn test_requires_api_key() {
        assert!(ElevenLabsTTS::new(ElevenLabsConfig::default()).is_err());
    }

    #[tokio::test]
    async fn test_synthesize_telephony_audio() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/text-to-speech/21m00Tcm4TlvDq8ikWAM"))
            .and(query_param("output_format", "ulaw_8000"))
            .and(header("xi-api-key", "el-key"))
            .and(body_partial_json(serde_json::json!({
                "text": "hi there",
                "model_id": "eleven_multilingual_v2",
                "voice_settings": {"stability": 0.5, "similarity_boost": 0.75}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFFu8; 320]))
            .expect(1)
            .mount(&server)
            .await;

        let audio = tts_for(&server)
            .synthesize("hi there", "21m00Tcm4TlvDq8ikWAM", AudioEncoding::Mulaw)
            .await
            .expect("Should synthesize");
        assert_eq!(audio.encoding, AudioEncoding::Mulaw);
        assert_eq!(audio.data.len(), 320);
        assert_eq!(audio.duration_ms(), 40);
    }

    #[tokio::test]
    async fn test_empty_body_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let result = tts_for(&server)
            .synthesize("hi", "voice", AudioEncoding::Linear16)
            .await;
        assert!(matches!(result, Err(TTSError::EmptyAudio)));
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let result = tts_for(&server)
            .synthesize("hi", "voice", AudioEncoding::Mulaw)
            .await;
        assert!(matches!(result, Err(TTSError::AuthenticationFailed(_))));
    }

    #[tokio::test]
    async fn test_blank_text_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8]))
            .expect(0)
            .mount(&server)
            .await;

        assert!(
            tts_for(&server)
                .synthesize("   ", "voice", AudioEncoding::Mulaw)
                .await
                .is_err()
        );
    }
}
