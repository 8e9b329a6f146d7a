mod base;
pub mod elevenlabs;
pub mod voices;

// Re-export public types and traits
pub use base::{SpeechSynthesizer, SynthesizedAudio, TTSError, TTSResult};

// Re-export ElevenLabs implementation
pub use elevenlabs::{ElevenLabsConfig, ElevenLabsTTS};

pub use voices::{DEFAULT_VOICE, resolve_voice_id};
