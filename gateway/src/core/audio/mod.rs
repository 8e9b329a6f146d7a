//! Audio primitives shared by ingest, transcription, synthesis and egress.
//!
//! Frames arrive in one of two encodings: 8 kHz G.711 µ-law from telephony
//! media streams, or 16 kHz 16-bit little-endian PCM from browser clients.
//! The `codec` module converts between them and the `framer` module slices
//! synthesized audio into fixed-duration chunks for the outbound stream.

pub mod codec;
pub mod framer;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

pub use codec::{
    decode_mulaw, encode_mulaw, frames_to_linear16, linear_to_mulaw, mulaw_to_linear,
    pcm16_from_le_bytes, pcm16_to_le_bytes, resample_linear, transcode,
};
pub use framer::AudioFramer;

/// Wire encoding of an audio payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioEncoding {
    /// G.711 µ-law, 8 kHz mono, one byte per sample
    Mulaw,
    /// Signed 16-bit little-endian PCM, 16 kHz mono
    Linear16,
}

impl AudioEncoding {
    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        match self {
            AudioEncoding::Mulaw => 8_000,
            AudioEncoding::Linear16 => 16_000,
        }
    }

    /// Bytes occupied by a single mono sample
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            AudioEncoding::Mulaw => 1,
            AudioEncoding::Linear16 => 2,
        }
    }

    /// Encoding name as understood by the transcription provider
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioEncoding::Mulaw => "mulaw",
            AudioEncoding::Linear16 => "linear16",
        }
    }

    /// Number of bytes needed to carry `duration_ms` of audio
    pub fn bytes_for_duration(&self, duration_ms: u32) -> usize {
        (self.sample_rate() as usize * duration_ms as usize / 1000) * self.bytes_per_sample()
    }
}

impl std::fmt::Display for AudioEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single inbound audio frame tagged with its encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    pub data: Bytes,
    pub encoding: AudioEncoding,
}

impl AudioFrame {
    pub fn new(data: impl Into<Bytes>, encoding: AudioEncoding) -> Self {
        Self {
            data: data.into(),
            encoding,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
