pub mod audio;
pub mod directory;
pub mod llm;
pub mod pipeline;
pub mod session;
pub mod stt;
pub mod tts;

// Re-export commonly used types for convenience
pub use audio::{AudioEncoding, AudioFrame, AudioFramer};

pub use directory::{
    AgentDirectory, AgentProfile, DirectoryError, IdentityDefaults, StaticAgentDirectory,
    resolve_agent_identity,
};

pub use llm::{GeminiClient, GeminiConfig, LlmError, PromptStyle, ResponseGenerator};

pub use pipeline::{PipelineStage, TurnOutcome, VoicePipeline, VoiceProviders};

pub use session::{
    CloseReason, InMemorySessionRegistry, Session, SessionEvent, SessionIdentity, SessionKey,
    SessionMode, SessionPhase, SessionRegistry,
};

pub use stt::{
    DeepgramBatchSTT, DeepgramSTTConfig, DeepgramStreamingFactory, STTError, StreamingTranscriber,
    StreamingTranscriberFactory, Transcriber, Transcript,
};

pub use tts::{ElevenLabsConfig, ElevenLabsTTS, SpeechSynthesizer, SynthesizedAudio, TTSError};
