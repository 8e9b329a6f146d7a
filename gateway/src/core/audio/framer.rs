use bytes::Bytes;

use super::{AudioEncoding, transcode};

/// Default outbound frame duration used by telephony media streams.
pub const DEFAULT_FRAME_MS: u32 = 20;

/// Splits synthesized audio into fixed-duration frames in the session's
/// outbound encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFramer {
    target: AudioEncoding,
    frame_ms: u32,
}

impl AudioFramer {
    pub fn new(target: AudioEncoding, frame_ms: u32) -> Self {
        Self {
            target,
            frame_ms: frame_ms.max(1),
        }
    }

    pub fn target(&self) -> AudioEncoding {
        self.target
    }

    /// Size in bytes of a full frame
    pub fn frame_len(&self) -> usize {
        self.target.bytes_for_duration(self.frame_ms).max(1)
    }

    /// Transcode `audio` into the target encoding and cut it into frames.
    ///
    /// Every frame but the last is exactly `frame_len()` bytes. The final frame
    /// carries the remainder and is not padded.
    pub fn frames(&self, audio: &[u8], source: AudioEncoding) -> Vec<Bytes> {
        let converted = Bytes::from(transcode(audio, source, self.target));
        let frame_len = self.frame_len();

        let mut frames = Vec::with_capacity(converted.len().div_ceil(frame_len));
        let mut offset = 0;
        while offset < converted.len() {
            let end = (offset + frame_len).min(converted.len());
            frames.push(converted.slice(offset..end));
            offset = end;
        }
        frames
    }
}

impl Default for AudioFramer {
    fn default() -> Self {
        Self::new(AudioEncoding::Mulaw, DEFAULT_FRAME_MS)
    }
}
