use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::core::directory::AgentProfile;
use crate::core::llm::PromptStyle;
use crate::core::session::OverflowPolicy;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present here
/// override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3001
///   tls:
///     enabled: true
///     cert_path: "/etc/certs/server.crt"
///     key_path: "/etc/certs/server.key"
///
/// providers:
///   deepgram_api_key: "your-deepgram-key"
///   gemini_api_key: "your-gemini-key"
///   elevenlabs_api_key: "your-elevenlabs-key"
///   gemini_model: "gemini-2.5-flash"
///
/// voice:
///   batch_threshold: 10
///   max_pending_frames: 500
///   overflow_policy: drop_oldest
///   frame_ms: 20
///   default_persona: "You are a helpful AI assistant."
///   default_voice: "eleven-rachel"
///   greeting: "Hello! I'm ready to process your voice."
///   greeting_delay_ms: 500
///   directory_timeout_ms: 2000
///   prompt_style: structured
///   idle_timeout_secs: 300
///
/// agents:
///   dental-bot:
///     persona: "You book dental appointments."
///     voice_id: "eleven-josh"
///     display_name: "Dr. Smile"
///
/// security:
///   cors_allowed_origins: "https://example.com,https://app.example.com"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub providers: Option<ProvidersYaml>,
    pub voice: Option<VoiceYaml>,
    pub agents: HashMap<String, AgentProfile>,
    pub security: Option<SecurityYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls: Option<TlsYaml>,
}

/// TLS configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsYaml {
    pub enabled: Option<bool>,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

/// Provider credentials and endpoints from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersYaml {
    pub deepgram_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub elevenlabs_api_key: Option<String>,
    pub deepgram_api_url: Option<String>,
    pub deepgram_ws_url: Option<String>,
    pub gemini_api_url: Option<String>,
    pub elevenlabs_api_url: Option<String>,
    pub gemini_model: Option<String>,
}

/// Voice session behavior from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct VoiceYaml {
    pub batch_threshold: Option<usize>,
    pub max_pending_frames: Option<usize>,
    pub overflow_policy: Option<OverflowPolicy>,
    pub frame_ms: Option<u32>,
    pub default_persona: Option<String>,
    pub default_voice: Option<String>,
    pub default_display_name: Option<String>,
    /// Empty string disables the greeting
    pub greeting: Option<String>,
    pub greeting_delay_ms: Option<u64>,
    pub directory_timeout_ms: Option<u64>,
    pub prompt_style: Option<PromptStyle>,
    pub idle_timeout_secs: Option<u64>,
}

/// Security configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    /// CORS allowed origins (comma-separated list or "*" for all)
    pub cors_allowed_origins: Option<String>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Required fields have invalid types
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
