//! Martin modes: line-start sync, "sync -> porch -> (channel + separator)×3"
//! transmitted in Green, Blue, Red order (spec.md §4.4). Unlike Scottie and
//! Robot, each channel's separator tone trails its scan rather than leading
//! it, including after the last (Red) channel.

use super::{ChromaSubsampling, ColorFormat, Mode};

const SYNC_PULSE: f64 = 0.004_862;
const SYNC_PORCH: f64 = 0.000_572;
const SEPARATOR: f64 = 0.000_572;
const SEPARATOR_FREQ: f64 = 1500.0;

fn channel_offset(mode: &Mode, _line: u32, channel: usize) -> f64 {
    let mut offset = mode.sync_pulse + mode.sync_porch;
    for k in 0..channel {
        offset += mode.scan_time_base[k] + mode.separator[k];
    }
    offset
}

fn scan_time(mode: &Mode, _line: u32, channel: usize) -> f64 {
    mode.scan_time_base[channel]
}

fn martin(id: u8, name: &'static str, width: u32, height: u32, scan: f64) -> Mode {
    let line_time = SYNC_PULSE + SYNC_PORCH + 3.0 * (SEPARATOR + scan);
    Mode {
        id,
        name,
        color_format: ColorFormat::Gbr,
        chroma_subsampling: ChromaSubsampling::FourFourFour,
        width,
        height,
        sync_pulse: SYNC_PULSE,
        sync_porch: SYNC_PORCH,
        channel_count: 3,
        // Transmission order Green, Blue, Red -> logical RGB indices 1, 2, 0.
        channel_order: [1, 2, 0, 0],
        scan_time_base: [scan, scan, scan, 0.0],
        separator: [SEPARATOR, SEPARATOR, SEPARATOR, 0.0],
        separator_freq: [SEPARATOR_FREQ, SEPARATOR_FREQ, SEPARATOR_FREQ, 0.0],
        separator_after: true,
        line_time,
        has_start_sync: false,
        sync_channel: None,
        window_factor: 1.0,
        channel_offset,
        scan_time,
    }
}

pub fn martin_m1() -> Mode {
    martin(44, "Martin M1", 320, 256, 0.146_432)
}

pub fn martin_m2() -> Mode {
    martin(40, "Martin M2", 320, 256, 0.073_216)
}
