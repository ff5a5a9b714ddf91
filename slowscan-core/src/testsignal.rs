//! Synthetic audio fixtures for tests and benches: tones, silence, a VIS
//! header builder, and an AWGN channel. Grounded on the teacher's
//! `audio_generator.rs` (tone synthesis) and `channel.rs` (noise injection).

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

/// A constant-frequency sine tone of `duration_s` seconds.
pub fn tone(freq_hz: f64, sample_rate: f64, duration_s: f64) -> Vec<f32> {
    let n = (duration_s * sample_rate).round() as usize;
    let omega = std::f64::consts::TAU * freq_hz / sample_rate;
    (0..n).map(|i| (omega * i as f64).sin() as f32).collect()
}

/// Silence (all-zero samples) of `duration_s` seconds.
pub fn silence(sample_rate: f64, duration_s: f64) -> Vec<f32> {
    vec![0.0; (duration_s * sample_rate).round() as usize]
}

/// Append a tone to `audio` in place, returning the number of samples added.
pub fn append_tone(audio: &mut Vec<f32>, freq_hz: f64, sample_rate: f64, duration_s: f64) -> usize {
    let t = tone(freq_hz, sample_rate, duration_s);
    let n = t.len();
    audio.extend(t);
    n
}

/// Append a synthetic calibration break + VIS header for `vis_code`
/// (break, leader2, 10 bits), matching the layout `vis::decode_vis` expects
/// starting at the position `audio.len()` had before this call.
pub fn append_vis_header(audio: &mut Vec<f32>, sample_rate: f64, vis_code: u8) {
    append_vis_header_corrupted(audio, sample_rate, vis_code, None);
}

/// Same as [`append_vis_header`], but with one data bit (0-indexed into the
/// 7 data bits) flipped to its opposite tone, simulating a single-bit error.
pub fn append_vis_header_corrupted(
    audio: &mut Vec<f32>,
    sample_rate: f64,
    vis_code: u8,
    corrupt_bit: Option<usize>,
) {
    append_tone(audio, 1200.0, sample_rate, 0.01); // break
    append_tone(audio, 1900.0, sample_rate, 0.3); // leader2

    let bits: [u8; 7] = std::array::from_fn(|i| (vis_code >> i) & 1);
    let parity = bits.iter().sum::<u8>() % 2;

    append_tone(audio, 1200.0, sample_rate, 0.03); // start bit

    for (i, &bit) in bits.iter().enumerate() {
        let actual_bit = if corrupt_bit == Some(i) { bit ^ 1 } else { bit };
        let freq = if actual_bit == 1 { 1100.0 } else { 1300.0 };
        append_tone(audio, freq, sample_rate, 0.03);
    }

    let parity_freq = if parity == 1 { 1100.0 } else { 1300.0 };
    append_tone(audio, parity_freq, sample_rate, 0.03);
    append_tone(audio, 1200.0, sample_rate, 0.03); // stop bit
}

/// Apply AWGN noise to audio samples with a fixed seed for reproducibility.
pub fn apply_noise_seeded(audio: &[f32], noise_std: f64, seed: u64) -> Vec<f32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    apply_noise(audio, noise_std, &mut rng)
}

/// Apply AWGN noise to audio samples using the supplied RNG.
pub fn apply_noise<R: Rng>(audio: &[f32], noise_std: f64, rng: &mut R) -> Vec<f32> {
    audio
        .iter()
        .map(|&s| {
            let noise: f64 = rng.sample::<f64, _>(StandardNormal) * noise_std;
            s + noise as f32
        })
        .collect()
}
