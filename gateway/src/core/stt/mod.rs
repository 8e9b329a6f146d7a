mod base;
pub mod deepgram;

// Re-export public types and traits
pub use base::{
    STTError, STTResult, StreamingTranscriber, StreamingTranscriberFactory, Transcriber,
    Transcript, TranscriptReceiver,
};

// Re-export Deepgram implementation
pub use deepgram::{
    DeepgramBatchSTT, DeepgramSTTConfig, DeepgramStreamingFactory, DeepgramStreamingSTT,
};
