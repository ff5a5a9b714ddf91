//! FM demodulator: baseband down-conversion, phase-difference demodulation,
//! and Schmitt-triggered sync-pulse detection (spec.md §4.3).

use crate::dsp::{design_lowpass, next_odd, ComplexFir, DelayLine, MovingSum, Phasor, SchmittTrigger};
use num_complex::Complex64;

/// Center of the SSTV tone band; normalized-frequency zero point.
pub const CENTER_FREQ_HZ: f64 = 1900.0;
/// Span of the scan-line tone band (1500 Hz black .. 2300 Hz white).
pub const BANDWIDTH_HZ: f64 = 800.0;
/// Nominal 1200 Hz sync tone frequency.
pub const SYNC_TARGET_HZ: f64 = 1200.0;

/// Sync pulse width bucket, per spec.md §4.3's classification thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncWidth {
    Five,
    Nine,
    Twenty,
}

impl SyncWidth {
    pub fn nominal_ms(self) -> f64 {
        match self {
            SyncWidth::Five => 5.0,
            SyncWidth::Nine => 9.0,
            SyncWidth::Twenty => 20.0,
        }
    }
}

/// Classify a pulse duration (in samples) into a width bucket per spec.md
/// §8's monotonic boundaries: 5 ms in [2.5, 7) ms, 9 ms in [7, 14.5) ms,
/// 20 ms in [14.5, 25] ms. Outside that range, the pulse is rejected.
pub fn classify_sync_width(duration_samples: f64, sample_rate: f64) -> Option<SyncWidth> {
    let ms = duration_samples * 1000.0 / sample_rate;
    if ms < 2.5 {
        None
    } else if ms < 7.0 {
        Some(SyncWidth::Five)
    } else if ms < 14.5 {
        Some(SyncWidth::Nine)
    } else if ms <= 25.0 {
        Some(SyncWidth::Twenty)
    } else {
        None
    }
}

/// A detected sync pulse, emitted by the demodulator and consumed by the
/// sync history / mode arbiter and the streaming controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncPulseEvent {
    pub width: SyncWidth,
    pub sample_index: u64,
    pub frequency_offset: f64,
}

/// Result of feeding one chunk of audio to the demodulator.
#[derive(Debug, Clone, Default)]
pub struct DemodResult {
    /// Normalized frequency stream, one value per input sample, in [-1, 1].
    pub freq_stream: Vec<f64>,
    pub sync_events: Vec<SyncPulseEvent>,
}

/// Streaming FM demodulator. Owns all per-sample state (oscillator, filter,
/// smoothing/delay lines, Schmitt trigger, running sample counter) so two
/// independent sessions never share mutable state.
pub struct FmDemodulator {
    sample_rate: f64,
    oscillator: Phasor,
    lowpass: ComplexFir,
    prev_baseband_arg: f64,
    smoother: MovingSum,
    delay: DelayLine,
    schmitt: SchmittTrigger,
    filter_delay: u64,
    sync_counter: u64,
    sample_index: u64,
}

impl FmDemodulator {
    pub fn new(sample_rate: f64) -> Self {
        let filter_len = next_odd((0.002 * sample_rate).round() as usize);
        let taps = design_lowpass(900.0, sample_rate, filter_len, 3.0);
        let ma_len = next_odd((0.0025 * sample_rate).round() as usize);

        Self {
            sample_rate,
            // Conjugate oscillator: mix down by -center_freq.
            oscillator: Phasor::new(-CENTER_FREQ_HZ, sample_rate),
            lowpass: ComplexFir::new(taps),
            prev_baseband_arg: 0.0,
            smoother: MovingSum::new(ma_len),
            delay: DelayLine::new(ma_len),
            schmitt: SchmittTrigger::new(1300.0, 1400.0),
            filter_delay: (filter_len as u64) / 2,
            sync_counter: 0,
            sample_index: 0,
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Absolute number of samples processed so far.
    pub fn samples_processed(&self) -> u64 {
        self.sample_index
    }

    /// Feed a chunk of real audio samples, producing a parallel normalized
    /// frequency stream and any sync-pulse events detected within the chunk.
    pub fn process(&mut self, chunk: &[f32]) -> DemodResult {
        let mut freq_stream = Vec::with_capacity(chunk.len());
        let mut sync_events = Vec::new();

        for &sample in chunk {
            let i = self.sample_index;

            let osc = self.oscillator.tick();
            let baseband = Complex64::new(sample as f64, 0.0) * osc;
            let filtered = self.lowpass.process(baseband);

            let arg = filtered.arg();
            let mut diff = arg - self.prev_baseband_arg;
            diff = wrap_to_pi(diff);
            self.prev_baseband_arg = arg;

            let freq_hz = CENTER_FREQ_HZ + diff * self.sample_rate / std::f64::consts::TAU;
            let normalized = 2.0 * (freq_hz - CENTER_FREQ_HZ) / BANDWIDTH_HZ;
            freq_stream.push(normalized.clamp(-1.0, 1.0));

            let smoothed_freq = {
                self.smoother.push(freq_hz);
                self.smoother.mean()
            };
            let delayed_freq = self.delay.push(smoothed_freq);

            let was_low = !self.schmitt.state();
            let is_low = !self.schmitt.update(smoothed_freq);

            if is_low {
                self.sync_counter += 1;
            } else if was_low && self.sync_counter > 0 {
                // Trigger just released: classify and possibly emit.
                if let Some(event) = self.classify_release(i, delayed_freq) {
                    sync_events.push(event);
                }
                self.sync_counter = 0;
            }

            self.sample_index += 1;
        }

        DemodResult {
            freq_stream,
            sync_events,
        }
    }

    fn classify_release(&self, i: u64, delayed_freq: f64) -> Option<SyncPulseEvent> {
        let width = classify_sync_width(self.sync_counter as f64, self.sample_rate)?;
        let frequency_offset = delayed_freq - SYNC_TARGET_HZ;
        if frequency_offset.abs() > 50.0 {
            return None;
        }
        let sample_index = i
            .saturating_sub(self.filter_delay)
            .saturating_sub(self.sync_counter);
        Some(SyncPulseEvent {
            width,
            sample_index,
            frequency_offset,
        })
    }
}

fn wrap_to_pi(mut angle: f64) -> f64 {
    const TAU: f64 = std::f64::consts::TAU;
    while angle > std::f64::consts::PI {
        angle -= TAU;
    }
    while angle < -std::f64::consts::PI {
        angle += TAU;
    }
    angle
}
