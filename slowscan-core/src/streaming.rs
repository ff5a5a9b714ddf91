//! Streaming decode controller (spec.md §4.9). This is also the shared
//! engine `batch.rs` drives per Design Note §9 ("duplicate implementations
//! between batch and streaming decoders... factor into one engine
//! parameterized by a sample provider"): batch feeds the whole sample
//! vector through `process()` once, then calls `flush()`.

use crate::config::StreamingOptions;
use crate::demodulator::{FmDemodulator, SyncWidth};
use crate::dsp::FftPeakFinder;
use crate::errors::ModeError;
use crate::events::{DecoderState, EventSink, SstvEvent};
use crate::image_buffer::{DecodedImage, ImageChannelBuffer};
use crate::line_decoder::decode_line;
use crate::logging::{LogConfig, SignalLogger};
use crate::modes::{self, Mode};
use crate::ring_buffer::RingBuffer;
use crate::sync_history::{DetectionMethod, SyncHistory};
use crate::vis::{self, VisCandidate};

const DRIFT_EMA_ALPHA: f64 = 0.1;
const SLANT_THRESHOLD: f64 = 0.1;
/// Accept a partial final line on flush if it has at least half its samples.
const FLUSH_PARTIAL_FACTOR: f64 = 0.5;

/// Streaming SSTV decoder: the bounded-memory engine behind both the
/// streaming and batch entry points.
pub struct StreamingDecoder {
    options: StreamingOptions,
    forced_mode: Option<Mode>,
    state: DecoderState,
    mode: Option<Mode>,
    ring: RingBuffer,
    demod: FmDemodulator,
    sync_history: SyncHistory,
    finder: FftPeakFinder,
    image: Option<ImageChannelBuffer>,
    vis_candidates: Vec<VisCandidate>,
    next_line: u32,
    last_sync_index: u64,
    current_line_samples: f64,
    expected_line_samples: f64,
    drift_per_line: f64,
    image_completed: bool,
    pub events: EventSink,
    pub logger: SignalLogger,
}

impl StreamingDecoder {
    pub fn new(options: StreamingOptions) -> Result<Self, ModeError> {
        let forced_mode = match options.force_mode {
            Some(code) => Some(
                modes::get_by_vis(code).ok_or(ModeError::UnknownVisCode { code })?,
            ),
            None => None,
        };
        let sample_rate = options.sample_rate;
        let capacity = ((options.max_buffer_seconds * sample_rate).round() as usize).max(1);

        let mut decoder = Self {
            forced_mode,
            state: DecoderState::Searching,
            mode: None,
            ring: RingBuffer::new(capacity),
            demod: FmDemodulator::new(sample_rate),
            sync_history: SyncHistory::new(sample_rate),
            finder: FftPeakFinder::new(sample_rate, options.fft_size),
            image: None,
            vis_candidates: Vec::new(),
            next_line: 0,
            last_sync_index: 0,
            current_line_samples: 0.0,
            expected_line_samples: 0.0,
            drift_per_line: 0.0,
            image_completed: false,
            events: EventSink::new(),
            logger: SignalLogger::new(LogConfig::default()),
            options,
        };

        if let Some(forced) = decoder.forced_mode {
            decoder.latch_mode(forced, DetectionMethod::Vis, forced.id);
        }

        Ok(decoder)
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    /// Feed one chunk of samples. Returns `false` once cancelled (per
    /// spec.md §4.9, cancellation makes further `process` calls no-ops).
    pub fn process(&mut self, chunk: &[f32]) -> bool {
        if self.state == DecoderState::Cancelled {
            return false;
        }

        if self.mode.is_none() {
            self.events.emit(SstvEvent::Searching {
                buffer_seconds: self.ring.len() as f64 / self.options.sample_rate,
            });
        }

        let result = self.demod.process(chunk);
        self.ring.extend(chunk);

        for sync_event in &result.sync_events {
            let is_vis_width = matches!(sync_event.width, SyncWidth::Nine | SyncWidth::Twenty);
            if is_vis_width && self.forced_mode.is_none() {
                self.vis_candidates.push(VisCandidate {
                    break_index: sync_event.sample_index,
                    freq_offset: sync_event.frequency_offset,
                });
            }

            if self.forced_mode.is_none() {
                if let Some(newly_latched) = self.sync_history.on_sync_pulse(*sync_event) {
                    self.latch_mode(newly_latched, DetectionMethod::Timing, newly_latched.id);
                }
            }

            if self.mode.is_some() && !self.image_completed {
                self.decode_at(sync_event.sample_index, false);
            }
        }

        self.evaluate_vis_candidates();

        if self.mode.is_some() && !self.image_completed && result.sync_events.is_empty() {
            self.timing_fallback();
        }

        true
    }

    fn evaluate_vis_candidates(&mut self) {
        if self.vis_candidates.is_empty() {
            return;
        }
        let sample_rate = self.options.sample_rate;
        let after = vis::required_samples_after_break(sample_rate);
        let before = vis::required_samples_before_break(sample_rate);

        let mut remaining = Vec::new();
        let candidates = std::mem::take(&mut self.vis_candidates);
        for candidate in candidates {
            let window_end = candidate.break_index + after;
            if window_end > self.ring.write_index() {
                // Not enough samples yet; try again once more audio arrives.
                if self.ring.contains(candidate.break_index) {
                    remaining.push(candidate);
                }
                continue;
            }
            if candidate.break_index < before || !self.ring.contains(candidate.break_index - before)
            {
                continue; // evicted or too close to start; drop silently
            }

            let start = candidate.break_index - before;
            let len = (before + after) as usize;
            let raw = self.ring.slice(start, len);
            if raw.len() != len {
                continue;
            }

            match vis::decode_vis(&raw, sample_rate, before, &mut self.finder) {
                Ok(decoded_mode) => {
                    let progress = self.image_progress_fraction();
                    if self.sync_history.can_vis_override(&decoded_mode, progress) {
                        self.sync_history.latch_vis(decoded_mode);
                        self.latch_mode(decoded_mode, DetectionMethod::Vis, decoded_mode.id);
                    }
                }
                Err(err) => {
                    self.logger.debug("VIS", format!("candidate discarded: {err}"));
                }
            }
        }
        self.vis_candidates = remaining;
    }

    fn image_progress_fraction(&self) -> f64 {
        match (&self.image, self.mode) {
            (Some(image), Some(mode)) if mode.height > 0 => {
                image.lines_decoded() as f64 / mode.height as f64
            }
            _ => 0.0,
        }
    }

    fn latch_mode(&mut self, mode: Mode, method: DetectionMethod, vis_code: u8) {
        let is_new_image = match self.mode {
            Some(current) => current.id != mode.id,
            None => true,
        };

        if is_new_image {
            if let Some(image) = self.image.take() {
                self.emit_image_complete(image);
            }
            self.image = Some(ImageChannelBuffer::allocate(mode));
            self.next_line = 0;
            self.last_sync_index = self.ring.write_index();
        }

        self.mode = Some(mode);
        self.current_line_samples = mode.line_time * self.options.sample_rate;
        self.expected_line_samples = self.current_line_samples;
        self.drift_per_line = 0.0;
        self.image_completed = false;
        self.set_state(DecoderState::DecodingImage);
        self.events.emit(SstvEvent::ModeDetected {
            mode,
            vis_code,
            method,
        });
    }

    fn set_state(&mut self, state: DecoderState) {
        if self.state != state {
            self.state = state;
            self.events.emit(SstvEvent::StateChange { state });
        }
    }

    /// Decode the line(s) anchored at `sync_index`, per step 3 of spec.md
    /// §4.9. `is_noise` tags lines produced by the timing fallback rather
    /// than an actual detected sync edge.
    fn decode_at(&mut self, sync_index: u64, is_noise: bool) {
        let Some(mode) = self.mode else { return };
        let Some(image) = self.image.as_mut() else {
            return;
        };

        let interval = sync_index.saturating_sub(self.last_sync_index) as f64;
        if interval > 0.0 {
            let deviation = interval - self.expected_line_samples;
            self.drift_per_line =
                (1.0 - DRIFT_EMA_ALPHA) * self.drift_per_line + DRIFT_EMA_ALPHA * deviation;
        }
        self.last_sync_index = sync_index;

        let advanced = decode_line(
            &self.ring,
            self.options.sample_rate,
            &mode,
            self.next_line,
            sync_index,
            image,
            &mut self.finder,
        );
        self.next_line += if mode.channel_count == 4 { 2 } else { 1 };

        for row in advanced {
            let pixels = image.convert_line_to_rgb(row);
            self.events.emit(SstvEvent::Line {
                line: row,
                pixels,
                width: mode.width,
                height: mode.height,
                mode_name: mode.name,
                lines_decoded: image.lines_decoded(),
                is_noise,
            });
        }
    }

    /// Step 5: resilience path for lost sync pulses, and preview output over
    /// noise when no pulse has confirmed a line boundary.
    fn timing_fallback(&mut self) {
        if self.current_line_samples <= 0.0 {
            return;
        }
        while (self.ring.write_index().saturating_sub(self.last_sync_index)) as f64
            >= self.current_line_samples
        {
            let next_index = self.last_sync_index + self.current_line_samples.round() as u64;
            self.decode_at(next_index, true);
        }
    }

    fn emit_image_complete(&mut self, mut image: ImageChannelBuffer) {
        self.apply_slant_correction(&mut image);
        self.image_completed = true;
        self.set_state(DecoderState::DecodingImage);
        self.events.emit(SstvEvent::ImageComplete {
            image: image.to_decoded_image(),
        });
    }

    /// Post-process a complete image: shift each row by a constant multiple
    /// of its index to undo sample-rate mismatch drift (spec.md §4.9).
    fn apply_slant_correction(&self, image: &mut ImageChannelBuffer) {
        if self.expected_line_samples <= 0.0 {
            return;
        }
        let pixels_per_line =
            self.drift_per_line / self.expected_line_samples * image.width() as f64;
        if pixels_per_line.abs() < SLANT_THRESHOLD {
            return;
        }
        for line in 0..image.lines_decoded() {
            let shift = (line as f64 * pixels_per_line).round() as i64;
            shift_row(image, line, shift);
        }
    }

    /// Decode remaining lines up to buffer exhaustion, accepting a final
    /// partial line whose sample count is at least half a line's worth, then
    /// emit the image.
    pub fn flush(&mut self) -> Option<DecodedImage> {
        if self.mode.is_none() || self.image_completed {
            return None;
        }
        self.timing_fallback();

        let remaining = self
            .ring
            .write_index()
            .saturating_sub(self.last_sync_index) as f64;
        if self.current_line_samples > 0.0
            && remaining >= self.current_line_samples * FLUSH_PARTIAL_FACTOR
        {
            let sync_index = self.last_sync_index;
            self.decode_at(sync_index, true);
        }

        let image = self.image.take()?;
        let mut snapshot = image;
        self.apply_slant_correction(&mut snapshot);
        let decoded = snapshot.to_decoded_image();
        self.image_completed = true;
        self.events.emit(SstvEvent::ImageComplete {
            image: decoded.clone(),
        });
        Some(decoded)
    }

    pub fn cancel(&mut self) {
        self.state = DecoderState::Cancelled;
        self.events.emit(SstvEvent::StateChange {
            state: DecoderState::Cancelled,
        });
    }

    /// Re-initialize all state; re-applies a forced mode if one was given
    /// at construction.
    pub fn reset(&mut self) {
        let sample_rate = self.options.sample_rate;
        self.state = DecoderState::Searching;
        self.mode = None;
        self.ring = RingBuffer::new(self.ring.capacity());
        self.demod = FmDemodulator::new(sample_rate);
        self.sync_history = SyncHistory::new(sample_rate);
        self.image = None;
        self.vis_candidates.clear();
        self.next_line = 0;
        self.last_sync_index = 0;
        self.current_line_samples = 0.0;
        self.expected_line_samples = 0.0;
        self.drift_per_line = 0.0;
        self.image_completed = false;
        self.events.emit(SstvEvent::Reset);

        if let Some(forced) = self.forced_mode {
            self.latch_mode(forced, DetectionMethod::Vis, forced.id);
        }
    }

    pub fn get_partial_image(&self) -> Option<DecodedImage> {
        self.image.as_ref().map(ImageChannelBuffer::to_decoded_image)
    }
}

fn shift_row(image: &mut ImageChannelBuffer, line: u32, shift: i64) {
    let width = image.width() as i64;
    if width == 0 {
        return;
    }
    for plane in 0..3 {
        let original: Vec<u8> = (0..width)
            .map(|x| image.get_pixel(plane, line, x as u32))
            .collect();
        for x in 0..width {
            let src = (((x - shift) % width) + width) % width;
            image.set_pixel(plane, line, x as u32, original[src as usize]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsignal;

    #[test]
    fn decodes_a_full_martin_m1_image_via_vis_then_timing() {
        let sample_rate = 48_000.0;
        let mode = modes::martin_m1();
        let mut audio = testsignal::tone(1900.0, sample_rate, 0.3);
        testsignal::append_vis_header(&mut audio, sample_rate, mode.id);

        let width = mode.width as usize;
        let height = mode.height as usize;
        let rgb = vec![128u8; width * height * 3];
        let options = crate::encoder::EncoderOptions {
            mode,
            sample_rate,
            add_calibration_header: false,
            add_vox_tones: false,
        };
        let line_audio = crate::encoder::encode(&options, &rgb, mode.width, mode.height)
            .expect("encode");
        audio.extend(line_audio);

        let mut decoder = StreamingDecoder::new(StreamingOptions {
            sample_rate,
            ..StreamingOptions::default()
        })
        .unwrap();

        let chunk_size = 4096;
        for chunk in audio.chunks(chunk_size) {
            decoder.process(chunk);
        }
        let image = decoder.flush();
        assert!(image.is_some());
        assert!(image.unwrap().lines_decoded >= 1);
    }

    #[test]
    fn cancel_makes_subsequent_process_calls_inert() {
        let mut decoder = StreamingDecoder::new(StreamingOptions::default()).unwrap();
        decoder.cancel();
        assert_eq!(decoder.state(), DecoderState::Cancelled);
        assert!(!decoder.process(&[0.0; 100]));
    }

    #[test]
    fn forced_mode_skips_straight_to_decoding_image() {
        let mode = modes::martin_m1();
        let decoder = StreamingDecoder::new(StreamingOptions {
            force_mode: Some(mode.id),
            ..StreamingOptions::default()
        })
        .unwrap();
        assert_eq!(decoder.state(), DecoderState::DecodingImage);
        assert_eq!(decoder.mode().unwrap().id, mode.id);
    }

    #[test]
    fn rejects_an_unknown_forced_vis_code() {
        let err = StreamingDecoder::new(StreamingOptions {
            force_mode: Some(250),
            ..StreamingOptions::default()
        })
        .unwrap_err();
        assert!(matches!(err, ModeError::UnknownVisCode { code: 250 }));
    }
}
