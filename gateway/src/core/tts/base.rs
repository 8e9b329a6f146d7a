use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::core::audio::AudioEncoding;

/// Errors raised by speech synthesis providers.
#[derive(Debug, Error)]
pub enum TTSError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Provider returned no audio")]
    EmptyAudio,
}

pub type TTSResult<T> = Result<T, TTSError>;

/// Synthesized speech in a known encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    pub data: Bytes,
    pub encoding: AudioEncoding,
}

impl SynthesizedAudio {
    pub fn new(data: impl Into<Bytes>, encoding: AudioEncoding) -> Self {
        Self {
            data: data.into(),
            encoding,
        }
    }

    /// Playback length in milliseconds
    pub fn duration_ms(&self) -> u64 {
        let bytes_per_second =
            self.encoding.sample_rate() as u64 * self.encoding.bytes_per_sample() as u64;
        self.data.len() as u64 * 1000 / bytes_per_second
    }
}

/// Turns reply text into audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` with provider voice `voice_id`, asking for `encoding`.
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        encoding: AudioEncoding,
    ) -> TTSResult<SynthesizedAudio>;

    fn provider_info(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration() {
        assert_eq!(
            SynthesizedAudio::new(vec![0u8; 8000], AudioEncoding::Mulaw).duration_ms(),
            1000
        );
        assert_eq!(
            SynthesizedAudio::new(vec![0u8; 640], AudioEncoding::Linear16).duration_ms(),
            20
        );
    }
}
