//! Windowed FFT peak finder used for both per-pixel frequency estimation and
//! the VIS decoder's leader/bit frequency measurements (spec.md §4.2, §4.5).

use rustfft::{num_complex::Complex32, Fft, FftPlanner};
use std::collections::VecDeque;
use std::sync::Arc;

const MAX_CACHED_WINDOWS: usize = 8;

/// Maps an estimated frequency to an 8-bit pixel value.
/// `pixel = clamp(round((f - 1500) * 255 / 800), 0, 255)`
pub fn frequency_to_pixel(freq_hz: f64) -> u8 {
    let value = ((freq_hz - 1500.0) * 255.0 / 800.0).round();
    value.clamp(0.0, 255.0) as u8
}

/// Inverse mapping used by the encoder: `f = 1500 + value * 800 / 255`.
pub fn pixel_to_frequency(value: u8) -> f64 {
    1500.0 + value as f64 * 800.0 / 255.0
}

/// Per-instance windowed real-FFT peak estimator with an LRU-bounded cache
/// of Hann windows (keyed by analysis-window length) and FFT plans (keyed
/// by FFT size).
pub struct FftPeakFinder {
    sample_rate: f64,
    fft_size: usize,
    planner: FftPlanner<f32>,
    fft_plans: std::collections::HashMap<usize, Arc<dyn Fft<f32>>>,
    window_cache: std::collections::HashMap<usize, Vec<f32>>,
    window_lru: VecDeque<usize>,
    scratch: Vec<Complex32>,
}

impl FftPeakFinder {
    pub fn new(sample_rate: f64, fft_size: usize) -> Self {
        Self {
            sample_rate,
            fft_size,
            planner: FftPlanner::new(),
            fft_plans: std::collections::HashMap::new(),
            window_cache: std::collections::HashMap::new(),
            window_lru: VecDeque::new(),
            scratch: Vec::new(),
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    fn plan_for(&mut self, size: usize) -> Arc<dyn Fft<f32>> {
        if let Some(plan) = self.fft_plans.get(&size) {
            return Arc::clone(plan);
        }
        let plan = self.planner.plan_fft_forward(size);
        self.fft_plans.insert(size, Arc::clone(&plan));
        plan
    }

    fn hann_window(&mut self, len: usize) -> Vec<f32> {
        if let Some(w) = self.window_cache.get(&len) {
            // Touch LRU order.
            self.window_lru.retain(|&k| k != len);
            self.window_lru.push_back(len);
            return w.clone();
        }

        let window: Vec<f32> = if len <= 1 {
            vec![1.0; len]
        } else {
            (0..len)
                .map(|i| {
                    0.5 - 0.5
                        * (std::f32::consts::TAU * i as f32 / (len as f32 - 1.0)).cos()
                })
                .collect()
        };

        if self.window_lru.len() >= MAX_CACHED_WINDOWS {
            if let Some(evict) = self.window_lru.pop_front() {
                self.window_cache.remove(&evict);
            }
        }
        self.window_lru.push_back(len);
        self.window_cache.insert(len, window.clone());
        window
    }

    /// Estimate the dominant frequency in `samples` (a raw audio window
    /// centered on the pixel/bit under analysis).
    ///
    /// Steps (spec.md §4.2): Hann-window, zero-pad to `fft_size`, real FFT,
    /// argmax bin, quadratic sub-bin interpolation around the argmax.
    pub fn estimate_frequency(&mut self, samples: &[f32]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let n = samples.len();
        let fft_size = self.fft_size.max(n.next_power_of_two());
        let window = self.hann_window(n);

        self.scratch.clear();
        self.scratch.resize(fft_size, Complex32::new(0.0, 0.0));
        for (i, (&s, &w)) in samples.iter().zip(window.iter()).enumerate() {
            self.scratch[i] = Complex32::new(s * w, 0.0);
        }

        let plan = self.plan_for(fft_size);
        plan.process(&mut self.scratch);

        // Only the first half is unique for a real-valued input.
        let half = fft_size / 2;
        let mut peak_bin = 0usize;
        let mut peak_mag_sq = -1.0f32;
        for (k, c) in self.scratch[..half].iter().enumerate() {
            let mag_sq = c.norm_sqr();
            if mag_sq > peak_mag_sq {
                peak_mag_sq = mag_sq;
                peak_bin = k;
            }
        }

        let delta = self.quadratic_interpolation(peak_bin, half);
        (peak_bin as f64 + delta) * self.sample_rate / fft_size as f64
    }

    /// Quadratic peak interpolation around bin `k`, clamped to [-0.5, 0.5]
    /// per spec.md §4.2 step 4.
    fn quadratic_interpolation(&self, k: usize, half: usize) -> f64 {
        if k == 0 || k + 1 >= half {
            return 0.0;
        }
        let y_minus = self.scratch[k - 1].norm() as f64;
        let y0 = self.scratch[k].norm() as f64;
        let y_plus = self.scratch[k + 1].norm() as f64;

        let denom = y_minus - 2.0 * y0 + y_plus;
        if denom.abs() < 1e-12 {
            return 0.0;
        }
        let delta = 0.5 * (y_minus - y_plus) / denom;
        delta.clamp(-0.5, 0.5)
    }

    /// Extract the pixel value estimated from an audio window.
    pub fn estimate_pixel(&mut self, samples: &[f32]) -> u8 {
        frequency_to_pixel(self.estimate_frequency(samples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq_hz: f64, sample_rate: f64, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (std::f64::consts::TAU * freq_hz * i as f64 / sample_rate).sin() as f32)
            .collect()
    }

    #[test]
    fn pixel_frequency_roundtrip_is_exact_for_all_values() {
        for v in 0u8..=255 {
            let f = pixel_to_frequency(v);
            assert_eq!(frequency_to_pixel(f), v);
        }
    }

    #[test]
    fn estimates_pure_tone_within_half_bin() {
        let mut finder = FftPeakFinder::new(48000.0, 4096);
        let samples = tone(1900.0, 48000.0, 512);
        let estimated = finder.estimate_frequency(&samples);
        assert!((estimated - 1900.0).abs() < 15.0, "estimated {estimated}");
    }

    #[test]
    fn interpolation_never_moves_outside_half_bin() {
        let mut finder = FftPeakFinder::new(48000.0, 4096);
        let samples = tone(2137.5, 48000.0, 400);
        finder.estimate_frequency(&samples);
        // quadratic_interpolation is private but bounded internally; verify
        // indirectly that the estimate lands within one bin of a coarse FFT.
        let bin_hz = 48000.0 / 4096.0;
        let estimated = finder.estimate_frequency(&samples);
        let nearest_bin = (estimated / bin_hz).round() * bin_hz;
        assert!((estimated - nearest_bin).abs() <= bin_hz);
    }

    #[test]
    fn empty_window_returns_zero() {
        let mut finder = FftPeakFinder::new(48000.0, 4096);
        assert_eq!(finder.estimate_frequency(&[]), 0.0);
    }
}
