//! Configuration module for the voice bridge gateway
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use voicebridge_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

mod env;
mod merge;
mod validation;
mod yaml;

use crate::core::directory::{AgentProfile, IdentityDefaults};
use crate::core::llm::PromptStyle;
use crate::core::session::{BufferConfig, OverflowPolicy};

/// Persona used when neither the agent nor the client supplies one
pub const DEFAULT_PERSONA: &str = "You are a helpful AI assistant.";

/// Display name used when the agent profile has none
pub const DEFAULT_DISPLAY_NAME: &str = "AI Assistant";

/// Greeting sent to browser clients shortly after they connect
pub const DEFAULT_GREETING: &str = "Hello! I'm ready to process your voice.";

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Per-session voice behavior
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceConfig {
    /// Frames that make a batch for batch transcription
    pub batch_threshold: usize,
    /// Upper bound on queued frames per session
    pub max_pending_frames: usize,
    pub overflow_policy: OverflowPolicy,
    /// Duration of one outbound audio frame
    pub frame_ms: u32,
    pub default_persona: String,
    /// Logical voice name or provider voice id
    pub default_voice: String,
    pub default_display_name: String,
    /// Sent as a `message` event to browser clients; `None` disables it
    pub greeting: Option<String>,
    pub greeting_delay_ms: u64,
    /// Deadline for agent directory lookups
    pub directory_timeout_ms: u64,
    pub prompt_style: PromptStyle,
    /// Close connections with no inbound traffic for this long
    pub idle_timeout_secs: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            batch_threshold: crate::core::session::buffer::DEFAULT_BATCH_THRESHOLD,
            max_pending_frames: crate::core::session::buffer::DEFAULT_MAX_PENDING_FRAMES,
            overflow_policy: OverflowPolicy::default(),
            frame_ms: crate::core::audio::framer::DEFAULT_FRAME_MS,
            default_persona: DEFAULT_PERSONA.to_string(),
            default_voice: crate::core::tts::DEFAULT_VOICE.to_string(),
            default_display_name: DEFAULT_DISPLAY_NAME.to_string(),
            greeting: Some(DEFAULT_GREETING.to_string()),
            greeting_delay_ms: 500,
            directory_timeout_ms: 2000,
            prompt_style: PromptStyle::default(),
            idle_timeout_secs: 300,
        }
    }
}

impl VoiceConfig {
    pub fn buffer_config(&self) -> BufferConfig {
        BufferConfig {
            batch_threshold: self.batch_threshold,
            max_pending_frames: self.max_pending_frames,
            overflow_policy: self.overflow_policy,
        }
    }

    pub fn identity_defaults(&self) -> IdentityDefaults {
        IdentityDefaults {
            persona: self.default_persona.clone(),
            voice: self.default_voice.clone(),
            display_name: self.default_display_name.clone(),
        }
    }

    pub fn directory_timeout(&self) -> Duration {
        Duration::from_millis(self.directory_timeout_ms)
    }

    pub fn greeting_delay(&self) -> Duration {
        Duration::from_millis(self.greeting_delay_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// Server configuration
///
/// Contains all configuration needed to run the gateway, including:
/// - Server settings (host, port, TLS)
/// - Provider API keys (Deepgram, Gemini, ElevenLabs) and optional endpoint overrides
/// - Voice session behavior
/// - Static agent directory
/// - Security settings (CORS)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    // Provider API keys
    pub deepgram_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub elevenlabs_api_key: Option<String>,

    // Provider endpoint overrides (proxies, self-hosted gateways, tests)
    pub deepgram_api_url: Option<String>,
    pub deepgram_ws_url: Option<String>,
    pub gemini_api_url: Option<String>,
    pub elevenlabs_api_url: Option<String>,

    pub gemini_model: String,

    pub voice: VoiceConfig,

    /// Agent id → profile, served by the static agent directory
    pub agents: HashMap<String, AgentProfile>,

    // Security settings
    /// Comma-separated list of allowed CORS origins, or "*" for any
    pub cors_allowed_origins: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            tls: None,
            deepgram_api_key: None,
            gemini_api_key: None,
            elevenlabs_api_key: None,
            deepgram_api_url: None,
            deepgram_ws_url: None,
            gemini_api_url: None,
            elevenlabs_api_url: None,
            gemini_model: crate::core::llm::gemini::DEFAULT_GEMINI_MODEL.to_string(),
            voice: VoiceConfig::default(),
            agents: HashMap::new(),
            cors_allowed_origins: None,
        }
    }
}

/// Implement Drop to zeroize all secret fields when ServerConfig is dropped.
/// This ensures sensitive data is cleared from memory immediately after use.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.deepgram_api_key {
            key.zeroize();
        }
        if let Some(ref mut key) = self.gemini_api_key {
            key.zeroize();
        }
        if let Some(ref mut key) = self.elevenlabs_api_key {
            key.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Arguments
    /// * `path` - Path to the YAML configuration file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        // .env is loaded in main.rs at startup, so by now it is part of the environment
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        validation::validate_tls(&self.tls)?;
        validation::validate_voice(&self.voice)?;
        Ok(())
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Whether streaming and batch transcription can be offered
    pub fn has_transcription(&self) -> bool {
        has_value(&self.deepgram_api_key)
    }

    /// Whether reply generation can be offered
    pub fn has_generation(&self) -> bool {
        has_value(&self.gemini_api_key)
    }

    /// Whether spoken replies can be offered
    pub fn has_synthesis(&self) -> bool {
        has_value(&self.elevenlabs_api_key)
    }
}

fn has_value(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}
