//! Sync history rings and the timing/VIS mode arbiter (spec.md §3, §4.6).

use std::collections::VecDeque;

use crate::demodulator::{SyncPulseEvent, SyncWidth};
use crate::modes::{self, Mode};

const RING_CAPACITY: usize = 5;
const STDDEV_TOLERANCE_S: f64 = 0.001;
const LINE_TIME_TOLERANCE_S: f64 = 0.001;

/// Last N sync-pulse indices and frequency offsets for one pulse width.
#[derive(Debug, Clone, Default)]
struct SyncRing {
    indices: VecDeque<u64>,
    freq_offsets: VecDeque<f64>,
}

impl SyncRing {
    fn push(&mut self, sample_index: u64, frequency_offset: f64) {
        if self.indices.len() == RING_CAPACITY {
            self.indices.pop_front();
        }
        if self.freq_offsets.len() == RING_CAPACITY {
            self.freq_offsets.pop_front();
        }
        self.indices.push_back(sample_index);
        self.freq_offsets.push_back(frequency_offset);
    }

    /// Inter-pulse intervals, most recent last (up to N-1 entries).
    fn intervals(&self) -> Vec<f64> {
        self.indices
            .iter()
            .zip(self.indices.iter().skip(1))
            .map(|(&a, &b)| b.saturating_sub(a) as f64)
            .collect()
    }
}

fn mean_stddev(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// How a mode was latched, carried in the `mode-detected` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMethod {
    Vis,
    Timing,
}

/// Per-width sync rings plus the mode arbiter's latch state.
pub struct SyncHistory {
    sample_rate: f64,
    five_ms: SyncRing,
    nine_ms: SyncRing,
    twenty_ms: SyncRing,
    latched: Option<Mode>,
}

impl SyncHistory {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            five_ms: SyncRing::default(),
            nine_ms: SyncRing::default(),
            twenty_ms: SyncRing::default(),
            latched: None,
        }
    }

    pub fn latched(&self) -> Option<Mode> {
        self.latched
    }

    fn ring_mut(&mut self, width: SyncWidth) -> &mut SyncRing {
        match width {
            SyncWidth::Five => &mut self.five_ms,
            SyncWidth::Nine => &mut self.nine_ms,
            SyncWidth::Twenty => &mut self.twenty_ms,
        }
    }

    /// Feed a new sync pulse event into its ring and run the timing-based
    /// arbiter. Returns `Some(mode)` only when a *new* timing latch occurs
    /// this call (spec.md §4.6): an already-latched mode that's merely
    /// reconfirmed, or no stable match, both return `None`.
    pub fn on_sync_pulse(&mut self, event: SyncPulseEvent) -> Option<Mode> {
        let width = event.width;
        self.ring_mut(width).push(event.sample_index, event.frequency_offset);

        let intervals = self.ring_mut(width).intervals();
        if intervals.len() < 2 {
            return None;
        }

        let (mean_samples, stddev_samples) = mean_stddev(&intervals);
        if stddev_samples > STDDEV_TOLERANCE_S * self.sample_rate {
            return None;
        }

        let tolerance_samples = LINE_TIME_TOLERANCE_S * self.sample_rate;
        let buckets = modes::categorize_by_sync_width();
        let candidates = match width {
            SyncWidth::Five => &buckets.five_ms,
            SyncWidth::Nine => &buckets.nine_ms,
            SyncWidth::Twenty => &buckets.twenty_ms,
        };

        let best = candidates
            .iter()
            .map(|m| (m, (m.line_time * self.sample_rate - mean_samples).abs()))
            .filter(|&(_, dist)| dist <= tolerance_samples)
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap());

        match (self.latched, best) {
            (None, Some((mode, _))) => {
                self.latched = Some(*mode);
                Some(*mode)
            }
            (Some(current), Some((mode, _))) => {
                let current_samples = current.line_time * self.sample_rate;
                if (mean_samples - current_samples).abs() <= tolerance_samples {
                    None
                } else {
                    // Drifted mean disagrees with the latched mode: ignore,
                    // per spec.md §4.6 ("prevents drift").
                    let _ = mode;
                    None
                }
            }
            _ => None,
        }
    }

    /// Whether a VIS-indicated `candidate` may override the currently
    /// latched mode, per spec.md §4.6's two conditions.
    pub fn can_vis_override(&self, candidate: &Mode, image_progress_fraction: f64) -> bool {
        match self.latched {
            None => true,
            Some(current) => {
                if current.id == candidate.id {
                    return true;
                }
                let less_than_10_percent = image_progress_fraction < 0.10;
                let same_sync_width =
                    (current.sync_pulse - candidate.sync_pulse).abs() <= 0.005;
                less_than_10_percent || same_sync_width
            }
        }
    }

    /// Latch `mode` via VIS, resetting the timing rings so subsequent
    /// timing-based inference starts from the new mode's expected line time.
    pub fn latch_vis(&mut self, mode: Mode) {
        self.latched = Some(mode);
        self.five_ms = SyncRing::default();
        self.nine_ms = SyncRing::default();
        self.twenty_ms = SyncRing::default();
    }

    pub fn reset(&mut self) {
        self.latched = None;
        self.five_ms = SyncRing::default();
        self.nine_ms = SyncRing::default();
        self.twenty_ms = SyncRing::default();
    }
}
