//! ElevenLabs speech synthesis.

mod provider;

pub use provider::{
    DEFAULT_ELEVENLABS_MODEL, ELEVENLABS_API_URL, ElevenLabsConfig, ElevenLabsTTS, output_format,
};
