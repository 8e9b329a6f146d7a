//! Configuration validation.

use super::{TlsConfig, VoiceConfig};

/// TLS files must exist when TLS is enabled
pub fn validate_tls(tls: &Option<TlsConfig>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(tls) = tls {
        if !tls.cert_path.exists() {
            return Err(format!(
                "TLS certificate file not found: {}",
                tls.cert_path.display()
            )
            .into());
        }
        if !tls.key_path.exists() {
            return Err(format!("TLS key file not found: {}", tls.key_path.display()).into());
        }
    }
    Ok(())
}

pub fn validate_voice(voice: &VoiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    if voice.batch_threshold == 0 {
        return Err("voice.batch_threshold must be at least 1".into());
    }
    if voice.max_pending_frames < voice.batch_threshold {
        return Err(format!(
            "voice.max_pending_frames ({}) must not be smaller than voice.batch_threshold ({})",
            voice.max_pending_frames, voice.batch_threshold
        )
        .into());
    }
    if voice.frame_ms == 0 || voice.frame_ms > 1000 {
        return Err(format!(
            "voice.frame_ms must be between 1 and 1000, got {}",
            voice.frame_ms
        )
        .into());
    }
    if voice.default_persona.trim().is_empty() {
        return Err("voice.default_persona must not be empty".into());
    }
    if voice.idle_timeout_secs == 0 {
        return Err("voice.idle_timeout_secs must be at least 1".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_voice_config_is_valid() {
        assert!(validate_voice(&VoiceConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_zero_threshold() {
        let voice = VoiceConfig {
            batch_threshold: 0,
            ..Default::default()
        };
        assert!(validate_voice(&voice).is_err());
    }

    #[test]
    fn test_rejects_capacity_below_threshold() {
        let voice = VoiceConfig {
            batch_threshold: 20,
            max_pending_frames: 10,
            ..Default::default()
        };
        let err = validate_voice(&voice).unwrap_err();
        assert!(err.to_string().contains("max_pending_frames"));
    }

    #[test]
    fn test_rejects_bad_frame_ms() {
        let voice = VoiceConfig {
            frame_ms: 0,
            ..Default::default()
        };
        assert!(validate_voice(&voice).is_err());
    }

    #[test]
    fn test_tls_paths_must_exist() {
        assert!(validate_tls(&None).is_ok());

        let missing = Some(TlsConfig {
            cert_path: PathBuf::from("/nonexistent/cert.pem"),
            key_path: PathBuf::from("/nonexistent/key.pem"),
        });
        assert!(validate_tls(&missing).is_err());

        let cert = NamedTempFile::new().unwrap();
        let key = NamedTempFile::new().unwrap();
        let present = Some(TlsConfig {
            cert_path: cert.path().to_path_buf(),
            key_path: key.path().to_path_buf(),
        });
        assert!(validate_tls(&present).is_ok());
    }
}
