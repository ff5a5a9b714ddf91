//! Mode registry: immutable per-mode parameter records (spec.md §3, §4.4).
//!
//! Per Design Note §9 ("Polymorphism across mode records"), a single
//! concrete struct carries two function-typed fields instead of a class
//! hierarchy; per-mode behavior is otherwise data plus these two lookups.

mod martin;
mod pd;
mod robot;
mod scottie;

pub use martin::{martin_m1, martin_m2};
pub use pd::{pd_290, pd_90};
pub use robot::{robot_36, robot_72};
pub use scottie::{scottie_s1, scottie_s2};

use crate::demodulator::SyncWidth;

/// Channel color encoding carried by transmission-order channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorFormat {
    Rgb,
    Gbr,
    YCrCb,
    Grayscale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromaSubsampling {
    FourFourFour,
    FourTwoTwo,
    FourTwoZero,
}

/// Offset, from a channel's reference sync edge, to the start of channel
/// `c`'s scan on line `line` (seconds). Signature takes `&Mode` so each
/// mode family's function can read its own stored per-channel tables.
pub type ChannelOffsetFn = fn(&Mode, line: u32, channel: usize) -> f64;

/// Duration of channel `c`'s scan on line `line` (seconds).
pub type ScanTimeFn = fn(&Mode, line: u32, channel: usize) -> f64;

/// An immutable, shareable per-mode parameter record (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mode {
    pub id: u8,
    pub name: &'static str,
    pub color_format: ColorFormat,
    pub chroma_subsampling: ChromaSubsampling,
    pub width: u32,
    pub height: u32,
    pub sync_pulse: f64,
    pub sync_porch: f64,
    pub channel_count: usize,
    pub channel_order: [usize; 4],
    /// Nominal per-channel scan duration (seconds); read by `scan_time` fns.
    pub scan_time_base: [f64; 4],
    /// Nominal per-channel separator/porch duration (seconds); whether it
    /// precedes or follows the channel's scan is given by `separator_after`.
    pub separator: [f64; 4],
    /// Tone frequency (Hz) of each channel's separator. Flat 1500 Hz for
    /// most families; Robot 72 uses distinct porch frequencies for its V
    /// and U separators (spec.md §4.4, §9).
    pub separator_freq: [f64; 4],
    /// If true, channel `c`'s separator is written after its scan instead
    /// of before it. Martin is the only family transmitted this way.
    pub separator_after: bool,
    pub line_time: f64,
    pub has_start_sync: bool,
    pub sync_channel: Option<usize>,
    pub window_factor: f64,
    pub channel_offset: ChannelOffsetFn,
    pub scan_time: ScanTimeFn,
}

impl Default for Mode {
    /// Used only as the placeholder a `#[serde(skip)]` field needs when
    /// `EncoderOptions` is deserialized from a config file without a mode.
    fn default() -> Self {
        martin::martin_m1()
    }
}

impl Mode {
    pub fn channel_offset(&self, line: u32, channel: usize) -> f64 {
        (self.channel_offset)(self, line, channel)
    }

    pub fn scan_time(&self, line: u32, channel: usize) -> f64 {
        (self.scan_time)(self, line, channel)
    }

    /// Expected sync-pulse width bucket for this mode, per spec.md §4.6.
    pub fn sync_width(&self) -> SyncWidth {
        crate::demodulator::classify_sync_width(
            (self.sync_pulse * 48_000.0).round(),
            48_000.0,
        )
        .unwrap_or(SyncWidth::Nine)
    }
}

/// All modes known to the registry, in no particular order.
pub fn all() -> Vec<Mode> {
    vec![
        martin::martin_m1(),
        martin::martin_m2(),
        scottie::scottie_s1(),
        scottie::scottie_s2(),
        robot::robot_36(),
        robot::robot_72(),
        pd::pd_90(),
        pd::pd_290(),
    ]
}

/// Look up a mode by its 7-bit VIS code.
pub fn get_by_vis(code: u8) -> Option<Mode> {
    all().into_iter().find(|m| m.id == code)
}

/// Modes bucketed by expected sync-pulse width, per spec.md §4.4's
/// categorization ("three lists bucketed by sync-pulse width").
pub struct ModesByWidth {
    pub five_ms: Vec<Mode>,
    pub nine_ms: Vec<Mode>,
    pub twenty_ms: Vec<Mode>,
}

pub fn categorize_by_sync_width() -> ModesByWidth {
    let mut five_ms = Vec::new();
    let mut nine_ms = Vec::new();
    let mut twenty_ms = Vec::new();
    for mode in all() {
        match mode.sync_width() {
            SyncWidth::Five => five_ms.push(mode),
            SyncWidth::Nine => nine_ms.push(mode),
            SyncWidth::Twenty => twenty_ms.push(mode),
        }
    }
    ModesByWidth {
        five_ms,
        nine_ms,
        twenty_ms,
    }
}
