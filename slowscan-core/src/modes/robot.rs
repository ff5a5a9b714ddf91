//! Robot 36 (2-channel 4:2:0 YCrCb) and Robot 72 (3-channel 4:2:2 YCrCb)
//! modes, both line-start synced (spec.md §4.4).

use super::{ChromaSubsampling, ColorFormat, Mode};

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

/// Robot 36: Y (88 ms) then one chroma channel (44 ms), routed to V or U by
/// line parity at the image-buffer layer (spec.md §4.8), not here.
pub fn robot_36() -> Mode {
    const SYNC_PULSE: f64 = 0.009;
    const Y_PORCH: f64 = 0.003;
    const Y_SCAN: f64 = 0.088;
    // Separator (4.5 ms) + porch (1.5 ms) preceding the chroma channel,
    // folded into one duration per the Mode record's single separator field.
    const CHROMA_SEP: f64 = 0.0045 + 0.0015;
    const CHROMA_SCAN: f64 = 0.044;
    const SEPARATOR_FREQ: f64 = 1500.0;

    let line_time = SYNC_PULSE + Y_PORCH + Y_SCAN + CHROMA_SEP + CHROMA_SCAN;
    Mode {
        id: 8,
        name: "Robot 36",
        color_format: ColorFormat::YCrCb,
        chroma_subsampling: ChromaSubsampling::FourTwoZero,
        width: 320,
        height: 240,
        sync_pulse: SYNC_PULSE,
        sync_porch: Y_PORCH,
        channel_count: 2,
        channel_order: [0, 1, 0, 0],
        scan_time_base: [Y_SCAN, CHROMA_SCAN, 0.0, 0.0],
        separator: [0.0, CHROMA_SEP, 0.0, 0.0],
        separator_freq: [0.0, SEPARATOR_FREQ, 0.0, 0.0],
        separator_after: false,
        line_time,
        has_start_sync: false,
        sync_channel: None,
        window_factor: 1.0,
        channel_offset,
        scan_time,
    }
}

/// Robot 72: Y, V, U, each preceded by a separator+porch pair of equal
/// length, but the porch tone before V is 1900 Hz and before U is 2300 Hz
/// (spec.md §4.4, §9) so a decoder listening for the porch frequency alone
/// could tell the two chroma channels apart.
pub fn robot_72() -> Mode {
    const SYNC_PULSE: f64 = 0.009;
    const Y_PORCH: f64 = 0.003;
    const Y_SCAN: f64 = 0.138;
    const CHROMA_SEP: f64 = 0.0045 + 0.0015;
    const CHROMA_SCAN: f64 = 0.069;
    const V_SEPARATOR_FREQ: f64 = 1900.0;
    const U_SEPARATOR_FREQ: f64 = 2300.0;

    let line_time = SYNC_PULSE + Y_PORCH + Y_SCAN + 2.0 * (CHROMA_SEP + CHROMA_SCAN);
    Mode {
        id: 12,
        name: "Robot 72",
        color_format: ColorFormat::YCrCb,
        chroma_subsampling: ChromaSubsampling::FourTwoTwo,
        width: 320,
        height: 240,
        sync_pulse: SYNC_PULSE,
        sync_porch: Y_PORCH,
        channel_count: 3,
        channel_order: [0, 1, 2, 0],
        scan_time_base: [Y_SCAN, CHROMA_SCAN, CHROMA_SCAN, 0.0],
        separator: [0.0, CHROMA_SEP, CHROMA_SEP, 0.0],
        separator_freq: [0.0, V_SEPARATOR_FREQ, U_SEPARATOR_FREQ, 0.0],
        separator_after: false,
        line_time,
        has_start_sync: false,
        sync_channel: None,
        window_factor: 1.0,
        channel_offset,
        scan_time,
    }
}
