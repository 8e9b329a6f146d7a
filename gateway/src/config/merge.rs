//! Merging of environment and YAML configuration.
//!
//! Environment variables (with defaults) form the base; any value present in
//! the YAML file replaces it.

use std::path::PathBuf;

use super::yaml::YamlConfig;
use super::{ServerConfig, TlsConfig, env};

/// Load the environment base and apply `yaml` over it
pub fn merge_config(yaml: Option<YamlConfig>) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = env::load_from_env()?;

    if let Some(yaml) = yaml {
        apply_yaml(&mut config, yaml)?;
    }

    Ok(config)
}

fn apply_yaml(config: &mut ServerConfig, yaml: YamlConfig) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(server) = yaml.server {
        if let Some(host) = server.host {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
        if let Some(tls) = server.tls {
            match tls.enabled {
                Some(false) => config.tls = None,
                Some(true) => {
                    let cert_path = tls
                        .cert_path
                        .or_else(|| {
                            config
                                .tls
                                .as_ref()
                                .map(|t| t.cert_path.display().to_string())
                        })
                        .ok_or("server.tls.enabled is true but cert_path is missing")?;
                    let key_path = tls
                        .key_path
                        .or_else(|| {
                            config
                                .tls
                                .as_ref()
                                .map(|t| t.key_path.display().to_string())
                        })
                        .ok_or("server.tls.enabled is true but key_path is missing")?;
                    config.tls = Some(TlsConfig {
                        cert_path: PathBuf::from(cert_path),
                        key_path: PathBuf::from(key_path),
                    });
                }
                None => {
                    if let Some(existing) = config.tls.as_mut() {
                        if let Some(cert_path) = tls.cert_path {
                            existing.cert_path = PathBuf::from(cert_path);
                        }
                        if let Some(key_path) = tls.key_path {
                            existing.key_path = PathBuf::from(key_path);
                        }
                    }
                }
            }
        }
    }

    if let Some(providers) = yaml.providers {
        override_opt(&mut config.deepgram_api_key, providers.deepgram_api_key);
        override_opt(&mut config.gemini_api_key, providers.gemini_api_key);
        override_opt(&mut config.elevenlabs_api_key, providers.elevenlabs_api_key);
        override_opt(&mut config.deepgram_api_url, providers.deepgram_api_url);
        override_opt(&mut config.deepgram_ws_url, providers.deepgram_ws_url);
        override_opt(&mut config.gemini_api_url, providers.gemini_api_url);
        override_opt(&mut config.elevenlabs_api_url, providers.elevenlabs_api_url);
        if let Some(model) = providers.gemini_model {
            config.gemini_model = model;
        }
    }

    if let Some(voice) = yaml.voice {
        let target = &mut config.voice;
        if let Some(v) = voice.batch_threshold {
            target.batch_threshold = v;
        }
        if let Some(v) = voice.max_pending_frames {
            target.max_pending_frames = v;
        }
        if let Some(v) = voice.overflow_policy {
            target.overflow_policy = v;
        }
        if let Some(v) = voice.frame_ms {
            target.frame_ms = v;
        }
        if let Some(v) = voice.default_persona {
            target.default_persona = v;
        }
        if let Some(v) = voice.default_voice {
            target.default_voice = v;
        }
        if let Some(v) = voice.default_display_name {
            target.default_display_name = v;
        }
        if let Some(v) = voice.greeting {
            let v = v.trim();
            target.greeting = (!v.is_empty()).then(|| v.to_string());
        }
        if let Some(v) = voice.greeting_delay_ms {
            target.greeting_delay_ms = v;
        }
        if let Some(v) = voice.directory_timeout_ms {
            target.directory_timeout_ms = v;
        }
        if let Some(v) = voice.prompt_style {
            target.prompt_style = v;
        }
        if let Some(v) = voice.idle_timeout_secs {
            target.idle_timeout_secs = v;
        }
    }

    if !yaml.agents.is_empty() {
        config.agents = yaml.agents;
    }

    if let Some(security) = yaml.security {
        override_opt(&mut config.cors_allowed_origins, security.cors_allowed_origins);
    }

    Ok(())
}

/// Replace `target` when the YAML value is present and non-empty
fn override_opt(target: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        *target = Some(value);
    }
}
