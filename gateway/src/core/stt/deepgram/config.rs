use std::time::Duration;

use url::Url;

use crate::core::audio::AudioEncoding;
use crate::core::stt::base::{STTError, STTResult};

/// Deepgram REST base URL
pub const DEEPGRAM_API_URL: &str = "https://api.deepgram.com";

/// Deepgram streaming base URL
pub const DEEPGRAM_WS_URL: &str = "wss://api.deepgram.com";

/// Model used for pre-recorded batches from browser clients
pub const DEFAULT_BATCH_MODEL: &str = "nova-2";

/// Model tuned for narrow-band phone audio
pub const DEFAULT_STREAMING_MODEL: &str = "nova-2-phonecall";

/// Deepgram transcription settings shared by the batch and streaming clients.
#[derive(Debug, Clone)]
pub struct DeepgramSTTConfig {
    pub api_key: String,
    pub api_url: String,
    pub ws_url: String,
    pub batch_model: String,
    pub streaming_model: String,
    pub language: String,
    pub smart_format: bool,
    pub interim_results: bool,
    /// Silence (ms) after which Deepgram closes an utterance
    pub utterance_end_ms: u32,
    pub request_timeout: Duration,
}

impl DeepgramSTTConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Point both clients at another host, e.g. a proxy or a test server.
    pub fn with_base_urls(mut self, api_url: impl Into<String>, ws_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self.ws_url = ws_url.into();
        self
    }

    pub fn validate(&self) -> STTResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(STTError::AuthenticationFailed(
                "Deepgram API key is required".to_string(),
            ));
        }
        Ok(())
    }

    /// `POST /v1/listen` URL for a batch in `encoding`
    pub fn batch_url(&self, encoding: AudioEncoding) -> STTResult<Url> {
        let mut url = Self::listen_url(&self.api_url)?;
        url.query_pairs_mut()
            .append_pair("model", &self.batch_model)
            .append_pair("language", &self.language)
            .append_pair("encoding", encoding.as_str())
            .append_pair("sample_rate", &encoding.sample_rate().to_string());
        Ok(url)
    }

    /// `wss://…/v1/listen` URL for a live stream in `encoding`
    pub fn streaming_url(&self, encoding: AudioEncoding) -> STTResult<Url> {
        let mut url = Self::listen_url(&self.ws_url)?;
        url.query_pairs_mut()
            .append_pair("model", &self.streaming_model)
            .append_pair("language", &self.language)
            .append_pair("encoding", encoding.as_str())
            .append_pair("sample_rate", &encoding.sample_rate().to_string())
            .append_pair("channels", "1")
            .append_pair("smart_format", &self.smart_format.to_string())
            .append_pair("interim_results", &self.interim_results.to_string())
            .append_pair("utterance_end_ms", &self.utterance_end_ms.to_string());
        Ok(url)
    }

    fn listen_url(base: &str) -> STTResult<Url> {
        let joined = format!("{}/v1/listen", base.trim_end_matches('/'));
        Url::parse(&joined)
            .map_err(|e| STTError::ConfigurationError(format!("Invalid Deepgram URL '{joined}': {e}")))
    }
}

impl Default for DeepgramSTTConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: DEEPGRAM_API_URL.to_string(),
            ws_url: DEEPGRAM_WS_URL.to_string(),
            batch_model: DEFAULT_BATCH_MODEL.to_string(),
            streaming_model: DEFAULT_STREAMING_MODEL.to_string(),
            language: "en".to_string(),
            smart_format: true,
            interim_results: false,
            utterance_end_ms: 1000,
            request_timeout: Duration::from_secs(30),
        }
    }
}
