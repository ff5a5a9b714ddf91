//! DSP primitives shared by the demodulator, encoder, and FFT peak finder.
//!
//! Complex arithmetic is `num_complex::Complex64` directly; this module adds
//! the signal-processing building blocks spec.md §4.1 names on top of it.

pub mod delay_line;
pub mod fft_peak;
pub mod filters;
pub mod moving_sum;
pub mod phasor;
pub mod schmitt;

pub use delay_line::DelayLine;
pub use fft_peak::FftPeakFinder;
pub use filters::{design_lowpass, kaiser_window, next_odd, ComplexFir};
pub use moving_sum::MovingSum;
pub use phasor::Phasor;
pub use schmitt::SchmittTrigger;
