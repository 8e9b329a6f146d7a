//! Audio Test Fixtures
//!
//! Generated frames in both wire encodings:
//! - Linear16: 16 kHz, 16-bit little-endian PCM, 20 ms = 640 bytes
//! - Mulaw: 8 kHz G.711 µ-law, 20 ms = 160 bytes

use std::f32::consts::PI;

use voicebridge_gateway::core::audio::{AudioEncoding, AudioFrame, encode_mulaw, pcm16_to_le_bytes};

/// Samples in a 20 ms frame at 16 kHz
pub const PCM_FRAME_SAMPLES: usize = 320;

/// Samples in a 20 ms frame at 8 kHz
pub const MULAW_FRAME_SAMPLES: usize = 160;

pub fn sine_samples(count: usize, sample_rate: u32, frequency: f32, amplitude: f32) -> Vec<i16> {
    (0..count)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            ((2.0 * PI * frequency * t).sin() * amplitude * i16::MAX as f32) as i16
        })
        .collect()
}

/// Constructor for one frame, e.g. [`silent_pcm_frame`]
pub type AudioFrameFactory = fn() -> AudioFrame;

/// 20 ms of PCM16 silence
pub fn silent_pcm_frame() -> AudioFrame {
    AudioFrame::new(vec![0u8; PCM_FRAME_SAMPLES * 2], AudioEncoding::Linear16)
}

/// 20 ms of a 440 Hz PCM16 tone
pub fn tone_pcm_frame() -> AudioFrame {
    let samples = sine_samples(PCM_FRAME_SAMPLES, 16000, 440.0, 0.5);
    AudioFrame::new(pcm16_to_le_bytes(&samples), AudioEncoding::Linear16)
}

/// 20 ms of µ-law silence
pub fn silent_mulaw_frame() -> AudioFrame {
    let samples = vec![0i16; MULAW_FRAME_SAMPLES];
    AudioFrame::new(encode_mulaw(&samples), AudioEncoding::Mulaw)
}

/// `count` copies of `frame`
pub fn frames(frame: AudioFrame, count: usize) -> Vec<AudioFrame> {
    std::iter::repeat_n(frame, count).collect()
}
