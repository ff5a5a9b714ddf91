//! Per-line pixel window extraction, driven by a mode's timing tables
//! (spec.md §4.7).

use crate::dsp::FftPeakFinder;
use crate::image_buffer::ImageChannelBuffer;
use crate::modes::Mode;
use crate::ring_buffer::RingBuffer;

fn window_len_samples(mode: &Mode, sample_rate: f64, line: u32, channel: usize) -> usize {
    let pixel_time = mode.scan_time(line, channel) / mode.width as f64;
    let half_window = pixel_time * mode.window_factor / 2.0;
    (2.0 * half_window * sample_rate).round().max(1.0) as usize
}

/// Extract one pixel window, returning `None` when any part of it falls
/// outside the samples the ring buffer currently retains.
fn extract_window(
    buffer: &RingBuffer,
    channel_start: f64,
    pixel: u32,
    pixel_time_samples: f64,
    window_len: usize,
) -> Option<Vec<f32>> {
    let center = channel_start + pixel as f64 * pixel_time_samples;
    let start = (center - window_len as f64 / 2.0).round();
    if start < 0.0 {
        return None;
    }
    let start = start as u64;
    if start + window_len as u64 > buffer.write_index() || start < buffer.oldest_available() {
        return None;
    }
    Some(buffer.slice(start, window_len))
}

fn decode_channel(
    buffer: &RingBuffer,
    sample_rate: f64,
    mode: &Mode,
    line: u32,
    sync_index: u64,
    channel: usize,
    plane: usize,
    row: u32,
    out: &mut ImageChannelBuffer,
    finder: &mut FftPeakFinder,
) {
    let channel_start =
        sync_index as f64 + (mode.channel_offset(line, channel) * sample_rate).round();
    let pixel_time_samples = mode.scan_time(line, channel) / mode.width as f64 * sample_rate;
    let window_len = window_len_samples(mode, sample_rate, line, channel);

    for p in 0..mode.width {
        if let Some(window) =
            extract_window(buffer, channel_start, p, pixel_time_samples, window_len)
        {
            let value = finder.estimate_pixel(&window);
            out.set_pixel(plane, row, p, value);
        }
    }
}

/// Whether channel `channel`'s full scan extent, for line `line`, lies
/// within the samples the ring buffer currently retains.
fn channel_fully_available(
    buffer: &RingBuffer,
    sample_rate: f64,
    mode: &Mode,
    line: u32,
    sync_index: u64,
    channel: usize,
) -> bool {
    let end_s = mode.channel_offset(line, channel) + mode.scan_time(line, channel);
    let end = sync_index + (end_s * sample_rate).round() as u64;
    end <= buffer.write_index()
}

/// Decode the ordinary (non-PD) single-line case: one sync pulse maps to
/// exactly one image row.
fn decode_single_line(
    buffer: &RingBuffer,
    sample_rate: f64,
    mode: &Mode,
    line: u32,
    sync_index: u64,
    out: &mut ImageChannelBuffer,
    finder: &mut FftPeakFinder,
) -> Vec<u32> {
    for c in 0..mode.channel_count {
        let plane = mode.channel_order[c];
        decode_channel(buffer, sample_rate, mode, line, sync_index, c, plane, line, out, finder);
    }
    match out.advance_line(line) {
        Some(l) => vec![l],
        None => Vec::new(),
    }
}

/// Decode a PD-mode line pair: four channels per sync pulse, routed to
/// Y-even, V, U, Y-odd (spec.md §4.7's PD variant).
fn decode_pd_pair(
    buffer: &RingBuffer,
    sample_rate: f64,
    mode: &Mode,
    line: u32,
    sync_index: u64,
    out: &mut ImageChannelBuffer,
    finder: &mut FftPeakFinder,
) -> Vec<u32> {
    let y_even_ok = channel_fully_available(buffer, sample_rate, mode, line, sync_index, 0);
    let chroma_ok = channel_fully_available(buffer, sample_rate, mode, line, sync_index, 1)
        && channel_fully_available(buffer, sample_rate, mode, line, sync_index, 2);
    let y_odd_ok = channel_fully_available(buffer, sample_rate, mode, line, sync_index, 3);

    decode_channel(buffer, sample_rate, mode, line, sync_index, 0, 0, line, out, finder);
    decode_channel(buffer, sample_rate, mode, line, sync_index, 1, 1, line, out, finder);
    decode_channel(buffer, sample_rate, mode, line, sync_index, 1, 1, line + 1, out, finder);
    decode_channel(buffer, sample_rate, mode, line, sync_index, 2, 2, line, out, finder);
    decode_channel(buffer, sample_rate, mode, line, sync_index, 2, 2, line + 1, out, finder);
    decode_channel(buffer, sample_rate, mode, line, sync_index, 3, 0, line + 1, out, finder);

    let mut advanced = Vec::new();
    if y_even_ok && chroma_ok {
        if let Some(l) = out.advance_line(line) {
            advanced.push(l);
        }
    }
    if y_even_ok && chroma_ok && y_odd_ok {
        if let Some(l) = out.advance_line(line + 1) {
            advanced.push(l);
        }
    }
    advanced
}

/// Decode the line(s) associated with one sync pulse. Returns the image row
/// indices newly advanced (0, 1, or 2 of them for PD's line-pair case).
pub fn decode_line(
    buffer: &RingBuffer,
    sample_rate: f64,
    mode: &Mode,
    line: u32,
    sync_index: u64,
    out: &mut ImageChannelBuffer,
    finder: &mut FftPeakFinder,
) -> Vec<u32> {
    if mode.channel_count == 4 {
        decode_pd_pair(buffer, sample_rate, mode, line, sync_index, out, finder)
    } else {
        decode_single_line(buffer, sample_rate, mode, line, sync_index, out, finder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{encode, EncoderOptions};
    use crate::modes::martin_m1;

    #[test]
    fn decodes_a_gradient_line_within_tolerance() {
        let mode = martin_m1();
        let sample_rate = 48_000.0;
        let width = mode.width as usize;
        let mut rgb = vec![0u8; width * 3];
        for x in 0..width {
            let v = (x % 256) as u8;
            rgb[x * 3] = v;
            rgb[x * 3 + 1] = v;
            rgb[x * 3 + 2] = v;
        }
        let options = EncoderOptions {
            mode,
            sample_rate,
            add_calibration_header: false,
            add_vox_tones: false,
        };
        let audio = encode(&options, &rgb, mode.width, 1).expect("encode");

        let mut buffer = RingBuffer::new(audio.len() + 10);
        buffer.extend(&audio);
        let sync_index = (mode.sync_pulse * 0.0 * sample_rate) as u64; // line starts at sample 0
        let mut image = ImageChannelBuffer::allocate(mode);
        let mut finder = FftPeakFinder::new(sample_rate, 4096);
        decode_line(&buffer, sample_rate, &mode, 0, sync_index, &mut image, &mut finder);

        let decoded = image.convert_line_to_rgb(0);
        let mut max_err = 0i32;
        for i in 0..decoded.len() {
            max_err = max_err.max((decoded[i] as i32 - rgb[i] as i32).abs());
        }
        assert!(max_err <= 6, "max_err = {max_err}");
    }
}
