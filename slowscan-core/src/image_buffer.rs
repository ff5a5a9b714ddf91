//! Planar per-channel image storage and RGB conversion (spec.md §4.8).

use crate::modes::{ChromaSubsampling, ColorFormat, Mode};

/// Extra rows of slack appended past `mode.height` to absorb over-length
/// transmissions (spec.md §3).
const SLACK_LINES: u32 = 128;

fn plane_count(mode: &Mode) -> usize {
    match mode.color_format {
        ColorFormat::Rgb | ColorFormat::Gbr => 3,
        ColorFormat::Grayscale => 1,
        ColorFormat::YCrCb => match mode.chroma_subsampling {
            ChromaSubsampling::FourTwoZero => 2,
            _ => 3,
        },
    }
}

/// An owned, `Clone`-able snapshot of a decoded image, returned by both the
/// batch and streaming engines (grounded on the teacher's
/// `BatchOutput`/`ProcessorOutput` split between live state and result).
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub mode_name: &'static str,
    pub lines_decoded: u32,
    /// width * lines_decoded * 3 interleaved RGB bytes.
    pub rgb: Vec<u8>,
}

/// Live, mutable per-channel planar buffer for one in-progress image.
pub struct ImageChannelBuffer {
    mode: Mode,
    width: u32,
    total_lines: u32,
    planes: Vec<Vec<u8>>,
    lines_decoded: u32,
}

impl ImageChannelBuffer {
    pub fn allocate(mode: Mode) -> Self {
        let width = mode.width;
        let total_lines = mode.height + SLACK_LINES;
        let planes = vec![vec![0u8; (width * total_lines) as usize]; plane_count(&mode)];
        Self {
            mode,
            width,
            total_lines,
            planes,
            lines_decoded: 0,
        }
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn lines_decoded(&self) -> u32 {
        self.lines_decoded
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn total_lines(&self) -> u32 {
        self.total_lines
    }

    fn index(&self, line: u32, x: u32) -> Option<usize> {
        if line >= self.total_lines || x >= self.width {
            return None;
        }
        Some((line * self.width + x) as usize)
    }

    /// Write a pixel into plane `plane`, at (`line`, `x`). Out-of-range
    /// writes are silently ignored (spec.md §4.7's out-of-range policy).
    pub fn set_pixel(&mut self, plane: usize, line: u32, x: u32, value: u8) {
        if plane >= self.planes.len() {
            return;
        }
        if let Some(idx) = self.index(line, x) {
            self.planes[plane][idx] = value;
        }
    }

    pub fn get_pixel(&self, plane: usize, line: u32, x: u32) -> u8 {
        self.index(line, x)
            .and_then(|idx| self.planes.get(plane).map(|p| p[idx]))
            .unwrap_or(0)
    }

    /// Centralizes the `linesDecoded` mutation per Design Note §9: every
    /// stage that fills a line calls this once, so "lines emitted in
    /// increasing order" holds regardless of which channel finished last.
    /// Returns the line index that was just advanced to, if `line` extends
    /// the current count.
    pub fn advance_line(&mut self, line: u32) -> Option<u32> {
        if line + 1 > self.lines_decoded {
            self.lines_decoded = line + 1;
            Some(line)
        } else {
            None
        }
    }

    /// Convert one line to interleaved RGB bytes (`width * 3`).
    pub fn convert_line_to_rgb(&self, line: u32) -> Vec<u8> {
        let mut out = vec![0u8; (self.width * 3) as usize];
        match self.mode.color_format {
            ColorFormat::Rgb | ColorFormat::Gbr => {
                for x in 0..self.width {
                    out[(x * 3) as usize] = self.get_pixel(0, line, x);
                    out[(x * 3 + 1) as usize] = self.get_pixel(1, line, x);
                    out[(x * 3 + 2) as usize] = self.get_pixel(2, line, x);
                }
            }
            ColorFormat::Grayscale => {
                for x in 0..self.width {
                    let y = self.get_pixel(0, line, x);
                    out[(x * 3) as usize] = y;
                    out[(x * 3 + 1) as usize] = y;
                    out[(x * 3 + 2) as usize] = y;
                }
            }
            ColorFormat::YCrCb => match self.mode.chroma_subsampling {
                ChromaSubsampling::FourTwoZero => {
                    let (v_line, u_line) = if line % 2 == 0 {
                        (line, line + 1)
                    } else {
                        (line.wrapping_sub(1), line)
                    };
                    let v_present = v_line < self.total_lines;
                    let u_present = u_line < self.total_lines;
                    for x in 0..self.width {
                        let y = self.get_pixel(0, line, x);
                        let v = if v_present {
                            self.get_pixel(1, v_line, x)
                        } else {
                            128
                        };
                        let u = if u_present {
                            self.get_pixel(1, u_line, x)
                        } else {
                            128
                        };
                        let rgb = ycrcb_to_rgb(y, v, u);
                        out[(x * 3) as usize] = rgb[0];
                        out[(x * 3 + 1) as usize] = rgb[1];
                        out[(x * 3 + 2) as usize] = rgb[2];
                    }
                }
                _ => {
                    for x in 0..self.width {
                        let y = self.get_pixel(0, line, x);
                        let v = self.get_pixel(1, line, x);
                        let u = self.get_pixel(2, line, x);
                        let rgb = ycrcb_to_rgb(y, v, u);
                        out[(x * 3) as usize] = rgb[0];
                        out[(x * 3 + 1) as usize] = rgb[1];
                        out[(x * 3 + 2) as usize] = rgb[2];
                    }
                }
            },
        }
        out
    }

    /// Convert every decoded line to one interleaved RGB buffer.
    pub fn to_rgb(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity((self.width * self.lines_decoded * 3) as usize);
        for line in 0..self.lines_decoded {
            out.extend(self.convert_line_to_rgb(line));
        }
        out
    }

    pub fn to_decoded_image(&self) -> DecodedImage {
        DecodedImage {
            width: self.width,
            height: self.lines_decoded,
            mode_name: self.mode.name,
            lines_decoded: self.lines_decoded,
            rgb: self.to_rgb(),
        }
    }

    /// Zero all planes and reset `linesDecoded`, keeping allocation.
    pub fn reset(&mut self) {
        for plane in &mut self.planes {
            plane.iter_mut().for_each(|b| *b = 0);
        }
        self.lines_decoded = 0;
    }

    /// Release the plane storage entirely.
    pub fn clear(&mut self) {
        self.planes.clear();
        self.lines_decoded = 0;
    }
}

/// YCrCb -> RGB, full-range BT.601 (spec.md §4.8).
pub fn ycrcb_to_rgb(y: u8, v: u8, u: u8) -> [u8; 3] {
    let y = y as f64;
    let v = v as f64 - 128.0;
    let u = u as f64 - 128.0;
    let r = y + 1.402 * v;
    let g = y - 0.344_136 * u - 0.714_136 * v;
    let b = y + 1.772 * u;
    [clamp_u8(r), clamp_u8(g), clamp_u8(b)]
}

fn clamp_u8(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::{martin_m1, robot_36};

    #[test]
    fn rgb_mode_round_trips_direct_plane_values() {
        let mut buf = ImageChannelBuffer::allocate(martin_m1());
        buf.set_pixel(0, 0, 5, 10);
        buf.set_pixel(1, 0, 5, 20);
        buf.set_pixel(2, 0, 5, 30);
        let line = buf.convert_line_to_rgb(0);
        assert_eq!(&line[15..18], &[10, 20, 30]);
    }

    #[test]
    fn ycrcb_gray_round_trips_to_equal_rgb() {
        let rgb = ycrcb_to_rgb(128, 128, 128);
        assert_eq!(rgb, [128, 128, 128]);
    }

    #[test]
    fn chroma_defaults_to_128_at_image_boundary() {
        let mut buf = ImageChannelBuffer::allocate(robot_36());
        buf.set_pixel(0, 0, 0, 200);
        // No chroma written at all; odd line has no paired even line below.
        let line = buf.convert_line_to_rgb(0);
        let rgb = ycrcb_to_rgb(200, 128, 128);
        assert_eq!(&line[0..3], &rgb);
    }

    #[test]
    fn advance_line_only_fires_on_new_maximum() {
        let mut buf = ImageChannelBuffer::allocate(martin_m1());
        assert_eq!(buf.advance_line(0), Some(0));
        assert_eq!(buf.advance_line(0), None);
        assert_eq!(buf.advance_line(2), Some(2));
        assert_eq!(buf.lines_decoded(), 3);
    }
}
