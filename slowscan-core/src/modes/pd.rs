//! PD modes: one 20 ms sync covers a pair of image lines, with four
//! sequential channels (Y-even, V, U, Y-odd) and no separators
//! (spec.md §4.4, §4.7's PD variant).

use super::{ChromaSubsampling, ColorFormat, Mode};

const SYNC_PULSE: f64 = 0.02;
const SYNC_PORCH: f64 = 0.002_08;

fn channel_offset(mode: &Mode, _line: u32, channel: usize) -> f64 {
    mode.sync_pulse + mode.sync_porch + channel as f64 * mode.scan_time_base[0]
}

fn scan_time(mode: &Mode, _line: u32, _channel: usize) -> f64 {
    mode.scan_time_base[0]
}

fn pd(id: u8, name: &'static str, width: u32, height: u32, scan: f64) -> Mode {
    let line_time = SYNC_PULSE + SYNC_PORCH + 4.0 * scan;
    Mode {
        id,
        name,
        color_format: ColorFormat::YCrCb,
        chroma_subsampling: ChromaSubsampling::FourTwoTwo,
        width,
        height,
        sync_pulse: SYNC_PULSE,
        sync_porch: SYNC_PORCH,
        channel_count: 4,
        // Transmission order Y-even, V, U, Y-odd is already the logical
        // order the line decoder's PD variant expects (spec.md §4.7).
        channel_order: [0, 1, 2, 3],
        scan_time_base: [scan, scan, scan, scan],
        separator: [0.0, 0.0, 0.0, 0.0],
        separator_freq: [0.0, 0.0, 0.0, 0.0],
        separator_after: false,
        line_time,
        has_start_sync: false,
        sync_channel: None,
        window_factor: 1.0,
        channel_offset,
        scan_time,
    }
}

pub fn pd_90() -> Mode {
    pd(99, "PD90", 320, 240, 0.170_24)
}

pub fn pd_290() -> Mode {
    pd(94, "PD290", 800, 616, 0.2288)
}
