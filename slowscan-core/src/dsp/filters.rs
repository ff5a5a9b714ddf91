//! Kaiser window design and the complex low-pass FIR built from it.
//!
//! Shares the design shape of the teacher's RRC filter (design taps, then
//! convolve), but the window and filter response are specific to this
//! codec's baseband low-pass per spec.md §4.1/§4.3.

use num_complex::Complex64;

/// Modified Bessel function of the first kind, order 0, via its power series.
/// Converges quickly for the alpha values (~2-3) used by SSTV decoders.
fn bessel_i0(x: f64) -> f64 {
    let mut sum = 1.0;
    let mut term = 1.0;
    let half_x = x / 2.0;
    for k in 1..=32 {
        term *= (half_x / k as f64).powi(2);
        sum += term;
        if term < sum * 1e-16 {
            break;
        }
    }
    sum
}

/// Kaiser window of shape parameter `alpha` and length `n`.
pub fn kaiser_window(alpha: f64, n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![1.0];
    }
    let denom = bessel_i0(std::f64::consts::PI * alpha);
    (0..n)
        .map(|i| {
            let r = (2.0 * i as f64 / (n as f64 - 1.0)) - 1.0;
            let inner = (1.0 - r * r).max(0.0);
            bessel_i0(std::f64::consts::PI * alpha * inner.sqrt()) / denom
        })
        .collect()
}

/// Design a low-pass FIR of length `n`, cutoff `cutoff_hz`, at `sample_rate`,
/// windowed by a Kaiser window of shape `alpha`.
pub fn design_lowpass(cutoff_hz: f64, sample_rate: f64, n: usize, alpha: f64) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let window = kaiser_window(alpha, n);
    let mid = (n as f64 - 1.0) / 2.0;
    let fc = cutoff_hz / sample_rate;
    (0..n)
        .map(|i| {
            let x = i as f64 - mid;
            let sinc = if x.abs() < 1e-12 {
                2.0 * fc
            } else {
                (2.0 * std::f64::consts::PI * fc * x).sin() / (std::f64::consts::PI * x)
            };
            sinc * window[i]
        })
        .collect()
}

/// An odd length `n | 1` convenience used throughout §4.3's derived filter
/// lengths (`round(k·R) | 1` forces the next odd number).
pub fn next_odd(n: usize) -> usize {
    n | 1
}

/// A complex-valued circular-buffer FIR filter, per spec.md §4.1: a
/// length-N circular buffer over complex samples producing
/// `sum(taps[i] * x[(pos + i) mod N])`.
#[derive(Debug, Clone)]
pub struct ComplexFir {
    taps: Vec<f64>,
    buffer: Vec<Complex64>,
    pos: usize,
}

impl ComplexFir {
    pub fn new(taps: Vec<f64>) -> Self {
        let n = taps.len();
        Self {
            taps,
            buffer: vec![Complex64::new(0.0, 0.0); n],
            pos: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    /// Push one complex sample and return the filtered output.
    pub fn process(&mut self, sample: Complex64) -> Complex64 {
        let n = self.buffer.len();
        if n == 0 {
            return sample;
        }
        self.buffer[self.pos] = sample;
        let mut acc = Complex64::new(0.0, 0.0);
        for (i, &tap) in self.taps.iter().enumerate() {
            let idx = (self.pos + n - i) % n;
            acc += self.buffer[idx] * tap;
        }
        self.pos = (self.pos + 1) % n;
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kaiser_window_is_symmetric_and_peaks_at_one() {
        let w = kaiser_window(3.0, 65);
        let mid = w[32];
        assert!((mid - 1.0).abs() < 1e-9);
        for i in 0..32 {
            assert!((w[i] - w[64 - i]).abs() < 1e-9);
        }
    }

    #[test]
    fn next_odd_forces_odd() {
        assert_eq!(next_odd(10), 11);
        assert_eq!(next_odd(11), 11);
    }

    #[test]
    fn lowpass_passes_dc() {
        let taps = design_lowpass(900.0, 48000.0, 97, 3.0);
        let mut fir = ComplexFir::new(taps.clone());
        let mut out = Complex64::new(0.0, 0.0);
        // Feed a DC input long enough to fill the delay line.
        for _ in 0..(taps.len() * 3) {
            out = fir.process(Complex64::new(1.0, 0.0));
        }
        // Sum of taps approximates DC gain; a low-pass filter should pass
        // DC with gain close to the tap sum, not attenuate it to zero.
        let tap_sum: f64 = taps.iter().sum();
        assert!((out.re - tap_sum).abs() < 1e-6);
    }
}
