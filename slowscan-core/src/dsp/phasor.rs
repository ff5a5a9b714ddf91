//! Numerically-controlled oscillator (NCO) used for baseband mixing
use num_complex::Complex64;

/// A unit-magnitude rotating phasor, advanced by a fixed angular step per
/// sample. Renormalized after every step so floating-point drift cannot
/// grow the magnitude away from 1.0 over a long transmission.
#[derive(Debug, Clone, Copy)]
pub struct Phasor {
    state: Complex64,
    step: Complex64,
}

impl Phasor {
    /// `freq_hz` is the oscillator frequency, `sample_rate` the audio rate.
    pub fn new(freq_hz: f64, sample_rate: f64) -> Self {
        let omega = std::f64::consts::TAU * freq_hz / sample_rate;
        Self {
            state: Complex64::new(1.0, 0.0),
            step: Complex64::new(omega.cos(), omega.sin()),
        }
    }

    /// Current phasor value before advancing.
    pub fn value(&self) -> Complex64 {
        self.state
    }

    /// Advance one sample and return the new value.
    pub fn tick(&mut self) -> Complex64 {
        self.state *= self.step;
        let norm = self.state.norm();
        if norm > 0.0 {
            self.state /= norm;
        }
        self.state
    }

    pub fn reset(&mut self) {
        self.state = Complex64::new(1.0, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_unit_magnitude_over_many_steps() {
        let mut p = Phasor::new(1900.0, 48000.0);
        for _ in 0..100_000 {
            p.tick();
        }
        assert!((p.value().norm() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn completes_full_rotation_at_nyquist_ratio() {
        // At freq = sample_rate / 4, four ticks should return to start.
        let mut p = Phasor::new(12000.0, 48000.0);
        p.tick();
        p.tick();
        p.tick();
        let v = p.tick();
        assert!((v.re - 1.0).abs() < 1e-9);
        assert!(v.im.abs() < 1e-9);
    }
}
