//! Deepgram speech-to-text.
//!
//! - [`DeepgramBatchSTT`]: pre-recorded `POST /v1/listen` for browser batches
//! - [`DeepgramStreamingSTT`]: live WebSocket stream for telephony sessions

mod batch;
mod config;
mod messages;
mod streaming;

pub use batch::DeepgramBatchSTT;
pub use config::{
    DEEPGRAM_API_URL, DEEPGRAM_WS_URL, DEFAULT_BATCH_MODEL, DEFAULT_STREAMING_MODEL,
    DeepgramSTTConfig,
};
pub use messages::{ListenResponse, StreamingMessage};
pub use streaming::{DeepgramStreamingFactory, DeepgramStreamingSTT};
