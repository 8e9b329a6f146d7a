//! Voice stream WebSocket endpoint
//!
//! # Protocol
//!
//! Connection parameters select the session (see [`params`]). Every message
//! is JSON tagged by `event`.
//!
//! ## Client → Server
//!
//! - **audio**: browser audio chunk (`data`, base64 PCM16 16 kHz)
//! - **connected** / **start** / **media** / **stop**: telephony media stream
//!   (`media.payload`, base64 µ-law 8 kHz)
//! - **ping**
//!
//! ## Server → Client
//!
//! - **audio**: browser reply frame
//! - **media**: telephony reply frame with `streamSid`
//! - **mark**: `audio_end` after the last frame of a reply
//! - **transcript**: what the user said, with confidence
//! - **agent-response**: the agent's reply text
//! - **message**: greeting
//! - **error**: recoverable failure
//! - **pong**

mod handler;
pub mod messages;
pub mod params;
mod processor;

pub use handler::voice_stream_handler;
pub use messages::{IncomingMessage, OutgoingMessage};
pub use params::{SessionPlan, VoiceStreamParams};
