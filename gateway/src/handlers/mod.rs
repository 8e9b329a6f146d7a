//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check endpoint
//! - `voice_stream` - Voice conversation WebSocket

pub mod api;
pub mod voice_stream;

// Re-export commonly used handlers for convenient access
pub use voice_stream::voice_stream_handler;
