//! Shared application state.
//!
//! Built once at startup from [`ServerConfig`] and handed to every handler as
//! `Arc<AppState>`. Provider clients are created here; a provider whose
//! credentials are missing is left out and the feature it backs is disabled.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::core::directory::{AgentDirectory, StaticAgentDirectory};
use crate::core::llm::{GeminiClient, GeminiConfig, ResponseGenerator};
use crate::core::pipeline::{VoicePipeline, VoiceProviders};
use crate::core::session::{InMemorySessionRegistry, SessionRegistry};
use crate::core::stt::{
    DeepgramBatchSTT, DeepgramSTTConfig, DeepgramStreamingFactory, StreamingTranscriberFactory,
    Transcriber,
};
use crate::core::tts::{ElevenLabsConfig, ElevenLabsTTS, SpeechSynthesizer};

pub struct AppState {
    pub config: ServerConfig,
    pub registry: Arc<dyn SessionRegistry>,
    pub pipeline: Arc<VoicePipeline>,
    /// Live transcription for telephony sessions; `None` falls back to batches
    pub streaming_stt: Option<Arc<dyn StreamingTranscriberFactory>>,
    pub directory: Arc<dyn AgentDirectory>,
}

impl AppState {
    /// Build state with provider clients created from `config`.
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let mut providers = VoiceProviders::default();
        let mut streaming_stt: Option<Arc<dyn StreamingTranscriberFactory>> = None;

        match config.deepgram_api_key.as_deref().filter(|_| config.has_transcription()) {
            Some(api_key) => {
                let stt_config = deepgram_config(&config, api_key);
                match DeepgramBatchSTT::new(stt_config.clone()) {
                    Ok(stt) => providers.transcriber = Some(Arc::new(stt) as Arc<dyn Transcriber>),
                    Err(e) => warn!("Deepgram batch transcription disabled: {}", e),
                }
                match DeepgramStreamingFactory::new(stt_config) {
                    Ok(factory) => streaming_stt = Some(Arc::new(factory)),
                    Err(e) => warn!("Deepgram streaming transcription disabled: {}", e),
                }
            }
            None => warn!("DEEPGRAM_API_KEY not set, speech-to-text disabled"),
        }

        match config.gemini_api_key.as_deref().filter(|_| config.has_generation()) {
            Some(api_key) => {
                let mut gemini = GeminiConfig::new(api_key);
                gemini.model = config.gemini_model.clone();
                gemini.prompt_style = config.voice.prompt_style;
                if let Some(url) = &config.gemini_api_url {
                    gemini.api_url = url.clone();
                }
                match GeminiClient::new(gemini) {
                    Ok(client) => {
                        providers.generator = Some(Arc::new(client) as Arc<dyn ResponseGenerator>)
                    }
                    Err(e) => warn!("Gemini response generation disabled: {}", e),
                }
            }
            None => warn!("GOOGLE_GEMINI_API_KEY not set, response generation disabled"),
        }

        match config
            .elevenlabs_api_key
            .as_deref()
            .filter(|_| config.has_synthesis())
        {
            Some(api_key) => {
                let mut elevenlabs = ElevenLabsConfig::new(api_key);
                if let Some(url) = &config.elevenlabs_api_url {
                    elevenlabs.api_url = url.clone();
                }
                match ElevenLabsTTS::new(elevenlabs) {
                    Ok(tts) => {
                        providers.synthesizer = Some(Arc::new(tts) as Arc<dyn SpeechSynthesizer>)
                    }
                    Err(e) => warn!("ElevenLabs synthesis disabled: {}", e),
                }
            }
            None => warn!("ELEVEN_LABS_API_KEY not set, text-to-speech disabled"),
        }

        let directory = StaticAgentDirectory::new(config.agents.clone());
        info!(agents = directory.len(), "Agent directory loaded");

        let pipeline = VoicePipeline::new(providers, config.voice.frame_ms);
        Self::with_components(
            config,
            Arc::new(InMemorySessionRegistry::new()),
            pipeline,
            streaming_stt,
            Arc::new(directory),
        )
    }

    /// Assemble state from explicit parts.
    pub fn with_components(
        config: ServerConfig,
        registry: Arc<dyn SessionRegistry>,
        pipeline: VoicePipeline,
        streaming_stt: Option<Arc<dyn StreamingTranscriberFactory>>,
        directory: Arc<dyn AgentDirectory>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            registry,
            pipeline: Arc::new(pipeline),
            streaming_stt,
            directory,
        })
    }
}

fn deepgram_config(config: &ServerConfig, api_key: &str) -> DeepgramSTTConfig {
    let mut stt = DeepgramSTTConfig::new(api_key);
    if let Some(url) = &config.deepgram_api_url {
        stt.api_url = url.clone();
    }
    if let Some(url) = &config.deepgram_ws_url {
        stt.ws_url = url.clone();
    }
    stt
}
