//! Scottie modes: sync+porch falls between the Green/Blue pair and Red,
//! so channel offsets are reckoned forward from that sync edge in Red,
//! Green, Blue order (spec.md §4.4). The very first line has no preceding
//! mid-line sync to anchor it, hence `has_start_sync = true`.

use super::{ChromaSubsampling, ColorFormat, Mode};

const SYNC_PULSE: f64 = 0.009;
const SYNC_PORCH: f64 = 0.0015;
const SEPARATOR: f64 = 0.0015;
const SEPARATOR_FREQ: f64 = 1500.0;

fn channel_offset(mode: &Mode, _line: u32, channel: usize) -> f64 {
    let mut offset = mode.sync_pulse + mode.sync_porch;
    for k in 0..channel {
        offset += mode.scan_time_base[k] + mode.separator[k + 1];
    }
    offset
}

fn scan_time(mode: &Mode, _line: u32, channel: usize) -> f64 {
    mode.scan_time_base[channel]
}

fn scottie(id: u8, name: &'static str, width: u32, height: u32, scan: f64) -> Mode {
    let line_time = SYNC_PULSE + SYNC_PORCH + 2.0 * SEPARATOR + 3.0 * scan;
    Mode {
        id,
        name,
        color_format: ColorFormat::Rgb,
        chroma_subsampling: ChromaSubsampling::FourFourFour,
        width,
        height,
        sync_pulse: SYNC_PULSE,
        sync_porch: SYNC_PORCH,
        channel_count: 3,
        // Forward order from the sync edge is Red, Green, Blue.
        channel_order: [0, 1, 2, 0],
        scan_time_base: [scan, scan, scan, 0.0],
        // separator[0] unused (Red has no leading separator at the sync
        // edge); separator[1], separator[2] precede Green and Blue.
        separator: [0.0, SEPARATOR, SEPARATOR, 0.0],
        separator_freq: [SEPARATOR_FREQ, SEPARATOR_FREQ, SEPARATOR_FREQ, 0.0],
        separator_after: false,
        line_time,
        has_start_sync: true,
        sync_channel: Some(0),
        window_factor: 1.0,
        channel_offset,
        scan_time,
    }
}

pub fn scottie_s1() -> Mode {
    scottie(60, "Scottie S1", 320, 256, 0.138_24)
}

pub fn scottie_s2() -> Mode {
    scottie(56, "Scottie S2", 320, 256, 0.088_064)
}
