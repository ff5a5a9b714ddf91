//! VIS header decoder: leader validation, 10-bit decode, parity check with
//! single-bit correction (spec.md §4.5).

use crate::dsp::FftPeakFinder;
use crate::errors::VisError;
use crate::modes::{self, Mode};

const LEADER_FREQ_HZ: f64 = 1900.0;
const LEADER_TOLERANCE_HZ: f64 = 100.0;
const BREAK_DURATION_S: f64 = 0.01;
const LEADER2_DURATION_S: f64 = 0.3;
const BIT_DURATION_S: f64 = 0.03;
const SYNC_BIT_FREQ_HZ: f64 = 1200.0;
const ONE_BIT_FREQ_HZ: f64 = 1100.0;
const ZERO_BIT_FREQ_HZ: f64 = 1300.0;
const BIT_TOLERANCE_HZ: f64 = 100.0;
const TRANSITION_GUARD_SAMPLES: usize = 5;

/// A pending VIS decode attempt, queued by the streaming controller whenever
/// a 9 ms or 20 ms sync pulse occurs (spec.md §3).
#[derive(Debug, Clone, Copy)]
pub struct VisCandidate {
    pub break_index: u64,
    pub freq_offset: f64,
}

/// Number of raw samples required after `break_index` before a candidate
/// can be evaluated.
pub fn required_samples_after_break(sample_rate: f64) -> u64 {
    ((BREAK_DURATION_S + LEADER2_DURATION_S + 10.0 * BIT_DURATION_S) * sample_rate).round() as u64
}

/// Number of raw samples required before `break_index`, to validate the
/// pre-break leader tone.
pub fn required_samples_before_break(sample_rate: f64) -> u64 {
    (0.06 * sample_rate).round() as u64
}

/// Attempt to decode a VIS header from `raw` audio around `break_index`.
/// Returns the resolved mode, or the reason decoding failed (always
/// recoverable: callers silently discard the candidate on error).
pub fn decode_vis(
    raw: &[f32],
    sample_rate: f64,
    break_index: u64,
    finder: &mut FftPeakFinder,
) -> Result<Mode, VisError> {
    let before = required_samples_before_break(sample_rate);
    let after = required_samples_after_break(sample_rate);
    if break_index < before || break_index + after > raw.len() as u64 {
        return Err(VisError::InsufficientSamples {
            required: (before + after) as usize,
            available: raw.len(),
        });
    }

    let leader_window = window_at(raw, break_index - before, before as usize);
    let leader_freq = finder.estimate_frequency(leader_window);
    if (leader_freq - LEADER_FREQ_HZ).abs() > LEADER_TOLERANCE_HZ {
        return Err(VisError::LeaderToneOutOfRange {
            measured_hz: leader_freq,
        });
    }

    let bits_start = break_index
        + ((BREAK_DURATION_S + LEADER2_DURATION_S) * sample_rate).round() as u64;
    let bit_samples = (BIT_DURATION_S * sample_rate).round() as usize;
    let guard = TRANSITION_GUARD_SAMPLES.min(bit_samples / 4);

    let mut bit_freqs = [0.0f64; 10];
    for (i, slot) in bit_freqs.iter_mut().enumerate() {
        let slot_start = bits_start + i as u64 * bit_samples as u64;
        let inner_start = slot_start + guard as u64;
        let inner_len = bit_samples.saturating_sub(2 * guard).max(1);
        let window = window_at(raw, inner_start, inner_len);
        *slot = finder.estimate_frequency(window);
    }

    for &edge in &[0usize, 9] {
        if (bit_freqs[edge] - SYNC_BIT_FREQ_HZ).abs() > BIT_TOLERANCE_HZ {
            return Err(VisError::FramingBitInvalid {
                index: edge,
                measured_hz: bit_freqs[edge],
            });
        }
    }

    let mut data_bits = [0u8; 7];
    for (i, bit) in data_bits.iter_mut().enumerate() {
        let freq = bit_freqs[i + 1];
        *bit = if (freq - ONE_BIT_FREQ_HZ).abs() <= BIT_TOLERANCE_HZ {
            1
        } else if (freq - ZERO_BIT_FREQ_HZ).abs() <= BIT_TOLERANCE_HZ {
            0
        } else {
            return Err(VisError::BitOutOfRange {
                index: i + 1,
                measured_hz: freq,
            });
        };
    }
    let parity_bit = if (bit_freqs[8] - ONE_BIT_FREQ_HZ).abs() <= BIT_TOLERANCE_HZ {
        1
    } else if (bit_freqs[8] - ZERO_BIT_FREQ_HZ).abs() <= BIT_TOLERANCE_HZ {
        0
    } else {
        return Err(VisError::BitOutOfRange {
            index: 8,
            measured_hz: bit_freqs[8],
        });
    };

    let code = bits_to_code(&data_bits);
    let expected_parity: u8 = data_bits.iter().sum::<u8>() % 2;
    if expected_parity == parity_bit {
        if let Some(mode) = modes::get_by_vis(code) {
            return Ok(mode);
        }
    }

    for flip in 0..7 {
        let mut corrected = data_bits;
        corrected[flip] ^= 1;
        let candidate_code = bits_to_code(&corrected);
        if let Some(mode) = modes::get_by_vis(candidate_code) {
            return Ok(mode);
        }
    }

    Err(VisError::ParityUncorrectable)
}

fn bits_to_code(bits: &[u8; 7]) -> u8 {
    bits.iter()
        .enumerate()
        .fold(0u8, |acc, (i, &b)| acc | (b << i))
}

fn window_at(raw: &[f32], start: u64, len: usize) -> &[f32] {
    let start = start as usize;
    if start >= raw.len() {
        return &[];
    }
    let end = (start + len).min(raw.len());
    &raw[start..end]
}
