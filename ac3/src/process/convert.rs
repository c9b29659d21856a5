//! Conversion of engine samples to interleaved 16-bit PCM.
//!
//! The decode engine is asked for samples biased by 384.0. Every value in
//! [256.0, 512.0) shares one exponent, and the mantissa step there is
//! 2^-15, so the IEEE-754 bit pattern of `384.0 + x / 32768.0` is exactly
//! `BIAS_BITS + x`. Subtracting the bias bit pattern as an integer yields the
//! 16-bit sample directly.

use crate::structs::header::SAMPLES_PER_BLOCK;
use crate::utils::errors::FrameError;

/// Bias requested from the engine.
pub const BIAS: f32 = 384.0;

/// Bit pattern of [`BIAS`].
pub const BIAS_BITS: i32 = 0x43C0_0000;

/// Converts a raw biased sample to a saturated 16-bit sample.
#[inline(always)]
pub fn convert(raw: i32) -> i16 {
    raw.saturating_sub(BIAS_BITS)
        .clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

#[inline(always)]
pub fn convert_sample(sample: f32) -> i16 {
    convert(sample.to_bits() as i32)
}

/// Appends one block of `channels` channel-major sample runs to `out` as
/// interleaved little-endian 16-bit PCM.
pub fn interleave(samples: &[f32], channels: usize, out: &mut Vec<u8>) -> Result<(), FrameError> {
    let expected = channels * SAMPLES_PER_BLOCK;
    if samples.len() < expected {
        return Err(FrameError::SampleBuffer {
            expected,
            actual: samples.len(),
        });
    }

    out.reserve(expected * 2);
    for i in 0..SAMPLES_PER_BLOCK {
        for ch in 0..channels {
            let sample = convert_sample(samples[ch * SAMPLES_PER_BLOCK + i]);
            out.extend_from_slice(&sample.to_le_bytes());
        }
    }

    Ok(())
}
