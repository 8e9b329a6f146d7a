//! G.711 µ-law and PCM16 conversion helpers.
//!
//! The µ-law tables follow ITU-T G.711: samples are biased by 0x84, clipped
//! at 32635, and stored as a sign bit, a 3-bit exponent and a 4-bit mantissa,
//! all inverted on the wire.

use super::{AudioEncoding, AudioFrame};

/// Bias added before µ-law segment lookup.
const MULAW_BIAS: i32 = 0x84;

/// Largest magnitude representable before the bias overflows 15 bits.
const MULAW_CLIP: i32 = 32635;

/// Decode a single µ-law byte to a linear 16-bit sample.
#[inline]
pub fn mulaw_to_linear(byte: u8) -> i16 {
    let u = !byte;
    let exponent = ((u >> 4) & 0x07) as i32;
    let mantissa = (u & 0x0F) as i32;
    let magnitude = (((mantissa << 3) + MULAW_BIAS) << exponent) - MULAW_BIAS;

    if u & 0x80 != 0 {
        -magnitude as i16
    } else {
        magnitude as i16
    }
}

/// Encode a linear 16-bit sample as a µ-law byte.
#[inline]
pub fn linear_to_mulaw(sample: i16) -> u8 {
    let mut pcm = sample as i32;
    let sign = if pcm < 0 {
        pcm = -pcm;
        0x80
    } else {
        0x00
    };

    pcm = pcm.min(MULAW_CLIP) + MULAW_BIAS;

    let mut exponent = 7;
    let mut mask = 0x4000;
    while exponent > 0 && pcm & mask == 0 {
        exponent -= 1;
        mask >>= 1;
    }

    let mantissa = (pcm >> (exponent + 3)) & 0x0F;
    !((sign | (exponent << 4) | mantissa) as u8)
}

/// Decode a µ-law byte stream into linear samples.
pub fn decode_mulaw(data: &[u8]) -> Vec<i16> {
    data.iter().map(|&b| mulaw_to_linear(b)).collect()
}

/// Encode linear samples into a µ-law byte stream.
pub fn encode_mulaw(samples: &[i16]) -> Vec<u8> {
    samples.iter().map(|&s| linear_to_mulaw(s)).collect()
}

/// Interpret little-endian bytes as 16-bit samples. A trailing odd byte is ignored.
pub fn pcm16_from_le_bytes(data: &[u8]) -> Vec<i16> {
    data.chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Serialize 16-bit samples as little-endian bytes.
pub fn pcm16_to_le_bytes(samples: &[i16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    out
}

/// Linear-interpolation resampler for mono PCM.
pub fn resample_linear(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }

    let out_len = (samples.len() as u64 * to_rate as u64 / from_rate as u64) as usize;
    let step = from_rate as f64 / to_rate as f64;
    let last = samples.len() - 1;

    (0..out_len)
        .map(|i| {
            let pos = i as f64 * step;
            let idx = (pos as usize).min(last);
            let frac = pos - idx as f64;
            let a = samples[idx] as f64;
            let b = samples[(idx + 1).min(last)] as f64;
            (a + (b - a) * frac).round() as i16
        })
        .collect()
}

/// Convert a payload between encodings, resampling as needed.
pub fn transcode(data: &[u8], from: AudioEncoding, to: AudioEncoding) -> Vec<u8> {
    match (from, to) {
        (AudioEncoding::Mulaw, AudioEncoding::Mulaw) => data.to_vec(),
        (AudioEncoding::Linear16, AudioEncoding::Linear16) => data[..data.len() & !1].to_vec(),
        (AudioEncoding::Mulaw, AudioEncoding::Linear16) => {
            let samples = decode_mulaw(data);
            let resampled = resample_linear(&samples, from.sample_rate(), to.sample_rate());
            pcm16_to_le_bytes(&resampled)
        }
        (AudioEncoding::Linear16, AudioEncoding::Mulaw) => {
            let samples = pcm16_from_le_bytes(data);
            let resampled = resample_linear(&samples, from.sample_rate(), to.sample_rate());
            encode_mulaw(&resampled)
        }
    }
}

/// Decode buffered frames per their own encoding and concatenate them as 16 kHz PCM16.
pub fn frames_to_linear16(frames: &[AudioFrame]) -> Vec<u8> {
    let mut out = Vec::new();
    for frame in frames {
        out.extend(transcode(
            &frame.data,
            frame.encoding,
            AudioEncoding::Linear16,
        ));
    }
    out
}
