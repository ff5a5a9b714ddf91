//! Symmetric encoder: phase-continuous tone and pixel-line synthesis in
//! mode-specified order (spec.md §4.10).

use crate::errors::EncodeError;
use crate::modes::{ChromaSubsampling, ColorFormat, Mode};

const VOX_TONE_HZ: f64 = 1900.0;
const VOX_TONE_S: f64 = 0.1;
const VOX_GAP_S: f64 = 0.1;
const CAL_LEADER_S: f64 = 0.3;
const CAL_BREAK_S: f64 = 0.01;
const CAL_TAIL_SYNC_S: f64 = 0.03;
const VIS_BIT_S: f64 = 0.03;
const SYNC_FREQ_HZ: f64 = 1200.0;
const PORCH_FREQ_HZ: f64 = 1500.0;
const ONE_BIT_FREQ_HZ: f64 = 1100.0;
const ZERO_BIT_FREQ_HZ: f64 = 1300.0;

/// Encoder configuration, grounded on `chimera-cli`'s serde-derived option
/// structs (SPEC_FULL.md §10.3).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EncoderOptions {
    #[serde(skip)]
    pub mode: Mode,
    pub sample_rate: f64,
    pub add_calibration_header: bool,
    pub add_vox_tones: bool,
}

/// A single accumulating phase oscillator used for every tone in the
/// transmission; wrapped mod 2pi after each tone to keep float precision
/// bounded without introducing a phase discontinuity (spec.md §4.10).
struct PhaseWriter {
    phi: f64,
}

impl PhaseWriter {
    fn new() -> Self {
        Self { phi: 0.0 }
    }

    fn write_tone(&mut self, out: &mut Vec<f32>, freq_hz: f64, sample_rate: f64, duration_s: f64) {
        let n = (duration_s * sample_rate).round() as usize;
        let step = std::f64::consts::TAU * freq_hz / sample_rate;
        for _ in 0..n {
            out.push(self.phi.sin() as f32);
            self.phi += step;
        }
        self.phi %= std::f64::consts::TAU;
    }

    fn write_silence(&mut self, out: &mut Vec<f32>, sample_rate: f64, duration_s: f64) {
        let n = (duration_s * sample_rate).round() as usize;
        out.extend(std::iter::repeat(0.0f32).take(n));
    }
}

fn pixel_to_freq(value: u8) -> f64 {
    1500.0 + value as f64 * 800.0 / 255.0
}

fn nearest_neighbor_resize(
    rgb: &[u8],
    src_w: u32,
    src_h: u32,
    dst_w: u32,
    dst_h: u32,
) -> Vec<u8> {
    if src_w == dst_w && src_h == dst_h {
        return rgb.to_vec();
    }
    let mut out = vec![0u8; (dst_w * dst_h * 3) as usize];
    for y in 0..dst_h {
        let sy = (y * src_h / dst_h.max(1)).min(src_h.saturating_sub(1));
        for x in 0..dst_w {
            let sx = (x * src_w / dst_w.max(1)).min(src_w.saturating_sub(1));
            let src_idx = ((sy * src_w + sx) * 3) as usize;
            let dst_idx = ((y * dst_w + x) * 3) as usize;
            out[dst_idx..dst_idx + 3].copy_from_slice(&rgb[src_idx..src_idx + 3]);
        }
    }
    out
}

fn luma(r: u8, g: u8, b: u8) -> f64 {
    0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64
}

fn clamp_u8(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Three logical planes (R/G/B, or Y/V/U, or Y only) derived from an RGB
/// image, matching the decoder's plane semantics (spec.md §4.8, §4.10).
struct Planes {
    width: u32,
    height: u32,
    p0: Vec<u8>,
    p1: Vec<u8>,
    p2: Vec<u8>,
}

impl Planes {
    fn at(&self, plane: usize, line: u32, x: u32) -> u8 {
        let idx = (line * self.width + x) as usize;
        match plane {
            0 => self.p0[idx],
            1 => self.p1[idx],
            _ => self.p2[idx],
        }
    }
}

fn build_planes(mode: &Mode, rgb: &[u8]) -> Planes {
    let (width, height) = (mode.width, mode.height);
    let n = (width * height) as usize;
    let mut p0 = vec![0u8; n];
    let mut p1 = vec![0u8; n];
    let mut p2 = vec![0u8; n];

    for i in 0..n {
        let (r, g, b) = (rgb[i * 3], rgb[i * 3 + 1], rgb[i * 3 + 2]);
        match mode.color_format {
            ColorFormat::Rgb | ColorFormat::Gbr => {
                p0[i] = r;
                p1[i] = g;
                p2[i] = b;
            }
            ColorFormat::Grayscale => {
                p0[i] = clamp_u8(luma(r, g, b));
            }
            ColorFormat::YCrCb => {
                let y = luma(r, g, b);
                p0[i] = clamp_u8(y);
                p1[i] = clamp_u8(r as f64 - y + 128.0); // V
                p2[i] = clamp_u8(b as f64 - y + 128.0); // U
            }
        }
    }
    Planes { width, height, p0, p1, p2 }
}

/// Transmission-order channel pixel rows for one sync unit (one line, or
/// one PD line-pair), in `mode.channel_count` order.
fn transmission_channels(mode: &Mode, planes: &Planes, base_line: u32) -> Vec<Vec<u8>> {
    let width = mode.width;
    match (mode.color_format, mode.chroma_subsampling, mode.channel_count) {
        (ColorFormat::YCrCb, _, 4) => {
            // PD: Y-even, V (averaged over the pair), U (averaged), Y-odd.
            let has_odd = base_line + 1 < mode.height;
            let y_even: Vec<u8> = (0..width).map(|x| planes.at(0, base_line, x)).collect();
            let y_odd: Vec<u8> = (0..width)
                .map(|x| {
                    if has_odd {
                        planes.at(0, base_line + 1, x)
                    } else {
                        0
                    }
                })
                .collect();
            let avg_plane = |plane: usize| -> Vec<u8> {
                (0..width)
                    .map(|x| {
                        let a = planes.at(plane, base_line, x) as f64;
                        let b = if has_odd {
                            planes.at(plane, base_line + 1, x) as f64
                        } else {
                            a
                        };
                        clamp_u8((a + b) / 2.0)
                    })
                    .collect()
            };
            vec![y_even, avg_plane(1), avg_plane(2), y_odd]
        }
        (ColorFormat::YCrCb, ChromaSubsampling::FourTwoZero, 2) => {
            let y: Vec<u8> = (0..width).map(|x| planes.at(0, base_line, x)).collect();
            let chroma_plane = if base_line % 2 == 0 { 1 } else { 2 };
            let chroma: Vec<u8> = (0..width)
                .map(|x| planes.at(chroma_plane, base_line, x))
                .collect();
            vec![y, chroma]
        }
        _ => (0..mode.channel_count)
            .map(|c| {
                let logical = mode.channel_order[c];
                (0..width).map(|x| planes.at(logical, base_line, x)).collect()
            })
            .collect(),
    }
}

fn emit_sync_unit(
    writer: &mut PhaseWriter,
    out: &mut Vec<f32>,
    mode: &Mode,
    sample_rate: f64,
    line: u32,
    channels: &[Vec<u8>],
) {
    writer.write_tone(out, SYNC_FREQ_HZ, sample_rate, mode.sync_pulse);
    writer.write_tone(out, PORCH_FREQ_HZ, sample_rate, mode.sync_porch);

    for (c, pixels) in channels.iter().enumerate() {
        if mode.separator[c] > 0.0 && !mode.separator_after {
            writer.write_tone(out, mode.separator_freq[c], sample_rate, mode.separator[c]);
        }
        let pixel_time = mode.scan_time(line, c) / mode.width as f64;
        for &value in pixels {
            writer.write_tone(out, pixel_to_freq(value), sample_rate, pixel_time);
        }
        if mode.separator[c] > 0.0 && mode.separator_after {
            writer.write_tone(out, mode.separator_freq[c], sample_rate, mode.separator[c]);
        }
    }
}

fn emit_vis(writer: &mut PhaseWriter, out: &mut Vec<f32>, sample_rate: f64, vis_code: u8) {
    writer.write_tone(out, SYNC_FREQ_HZ, sample_rate, VIS_BIT_S);
    let mut parity = 0u8;
    for i in 0..7 {
        let bit = (vis_code >> i) & 1;
        parity ^= bit;
        let freq = if bit == 1 { ONE_BIT_FREQ_HZ } else { ZERO_BIT_FREQ_HZ };
        writer.write_tone(out, freq, sample_rate, VIS_BIT_S);
    }
    let parity_freq = if parity == 1 { ONE_BIT_FREQ_HZ } else { ZERO_BIT_FREQ_HZ };
    writer.write_tone(out, parity_freq, sample_rate, VIS_BIT_S);
    writer.write_tone(out, SYNC_FREQ_HZ, sample_rate, VIS_BIT_S);
}

/// Encode an RGB image into an SSTV audio waveform for `options.mode`.
pub fn encode(
    options: &EncoderOptions,
    rgb: &[u8],
    width: u32,
    height: u32,
) -> Result<Vec<f32>, EncodeError> {
    let expected = (width as usize) * (height as usize) * 3;
    if rgb.len() != expected {
        return Err(EncodeError::ImageSizeMismatch {
            mode_name: options.mode.name,
            width,
            height,
            expected,
            actual: rgb.len(),
        });
    }

    let resized = nearest_neighbor_resize(rgb, width, height, options.mode.width, options.mode.height);
    let planes = build_planes(&options.mode, &resized);
    let sample_rate = options.sample_rate;

    let mut writer = PhaseWriter::new();
    let mut out = Vec::new();

    if options.add_vox_tones {
        writer.write_tone(&mut out, VOX_TONE_HZ, sample_rate, VOX_TONE_S);
        writer.write_silence(&mut out, sample_rate, VOX_GAP_S);
        writer.write_tone(&mut out, VOX_TONE_HZ, sample_rate, VOX_TONE_S);
        writer.write_silence(&mut out, sample_rate, VOX_GAP_S);
    }

    if options.add_calibration_header {
        writer.write_tone(&mut out, 1900.0, sample_rate, CAL_LEADER_S);
        writer.write_tone(&mut out, SYNC_FREQ_HZ, sample_rate, CAL_BREAK_S);
        writer.write_tone(&mut out, 1900.0, sample_rate, CAL_LEADER_S);
        writer.write_tone(&mut out, SYNC_FREQ_HZ, sample_rate, CAL_TAIL_SYNC_S);
    }

    emit_vis(&mut writer, &mut out, sample_rate, options.mode.id);

    if options.mode.has_start_sync {
        writer.write_tone(&mut out, SYNC_FREQ_HZ, sample_rate, 0.009);
    }

    let step = if options.mode.channel_count == 4 { 2 } else { 1 };
    let mut line = 0u32;
    while line < options.mode.height {
        let channels = transmission_channels(&options.mode, &planes, line);
        emit_sync_unit(&mut writer, &mut out, &options.mode, sample_rate, line, &channels);
        line += step;
    }

    Ok(out)
}
