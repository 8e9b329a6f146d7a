//! Environment variable loading.
//!
//! Produces the base [`ServerConfig`] that YAML values are merged over. Unset
//! or empty variables leave the default in place.

use std::path::PathBuf;
use std::str::FromStr;

use super::{ServerConfig, TlsConfig};

/// Read a variable, treating empty values as unset
pub(super) fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// First non-empty variable among `names`
fn env_var_any(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| env_var(name))
}

/// Parse a variable, failing with a descriptive message on bad input
pub(super) fn parse_env<T>(name: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_var(name) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid value for {name} ('{raw}'): {e}")),
        None => Ok(None),
    }
}

fn parse_bool(name: &str) -> Result<Option<bool>, String> {
    match env_var(name) {
        Some(raw) => match raw.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(format!("Invalid value for {name} ('{raw}'): expected true or false")),
        },
        None => Ok(None),
    }
}

/// Build a configuration from environment variables over defaults
pub fn load_from_env() -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = ServerConfig::default();

    // Server
    if let Some(host) = env_var("HOST") {
        config.host = host;
    }
    if let Some(port) = parse_env::<u16>("PORT")? {
        config.port = port;
    }

    if parse_bool("TLS_ENABLED")?.unwrap_or(false) {
        let cert_path = env_var("TLS_CERT_PATH")
            .ok_or("TLS_ENABLED is set but TLS_CERT_PATH is missing")?;
        let key_path =
            env_var("TLS_KEY_PATH").ok_or("TLS_ENABLED is set but TLS_KEY_PATH is missing")?;
        config.tls = Some(TlsConfig {
            cert_path: PathBuf::from(cert_path),
            key_path: PathBuf::from(key_path),
        });
    }

    // Providers
    config.deepgram_api_key = env_var("DEEPGRAM_API_KEY");
    config.gemini_api_key = env_var_any(&["GOOGLE_GEMINI_API_KEY", "GEMINI_API_KEY"]);
    config.elevenlabs_api_key = env_var_any(&["ELEVEN_LABS_API_KEY", "ELEVENLABS_API_KEY"]);
    config.deepgram_api_url = env_var("DEEPGRAM_API_URL");
    config.deepgram_ws_url = env_var("DEEPGRAM_WS_URL");
    config.gemini_api_url = env_var("GEMINI_API_URL");
    config.elevenlabs_api_url = env_var("ELEVENLABS_API_URL");
    if let Some(model) = env_var("GEMINI_MODEL") {
        config.gemini_model = model;
    }

    // Voice
    let voice = &mut config.voice;
    if let Some(threshold) = parse_env("VOICE_BATCH_THRESHOLD")? {
        voice.batch_threshold = threshold;
    }
    if let Some(max) = parse_env("VOICE_MAX_PENDING_FRAMES")? {
        voice.max_pending_frames = max;
    }
    if let Some(policy) = parse_env("VOICE_OVERFLOW_POLICY")? {
        voice.overflow_policy = policy;
    }
    if let Some(frame_ms) = parse_env("VOICE_FRAME_MS")? {
        voice.frame_ms = frame_ms;
    }
    if let Some(persona) = env_var("VOICE_DEFAULT_PERSONA") {
        voice.default_persona = persona;
    }
    if let Some(voice_name) = env_var("VOICE_DEFAULT_VOICE") {
        voice.default_voice = voice_name;
    }
    if let Some(name) = env_var("VOICE_DEFAULT_DISPLAY_NAME") {
        voice.default_display_name = name;
    }
    // Set-but-empty disables the greeting
    if let Ok(greeting) = std::env::var("VOICE_GREETING") {
        let greeting = greeting.trim();
        voice.greeting = (!greeting.is_empty()).then(|| greeting.to_string());
    }
    if let Some(delay) = parse_env("VOICE_GREETING_DELAY_MS")? {
        voice.greeting_delay_ms = delay;
    }
    if let Some(timeout) = parse_env("VOICE_DIRECTORY_TIMEOUT_MS")? {
        voice.directory_timeout_ms = timeout;
    }
    if let Some(style) = parse_env("VOICE_PROMPT_STYLE")? {
        voice.prompt_style = style;
    }
    if let Some(idle) = parse_env("VOICE_IDLE_TIMEOUT_SECS")? {
        voice.idle_timeout_secs = idle;
    }

    // Security
    config.cors_allowed_origins = env_var("CORS_ALLOWED_ORIGINS");

    Ok(config)
}
