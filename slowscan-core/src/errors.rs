//! SlowScan error types with granular categories

use thiserror::Error;

/// Top-level error type for all SlowScan operations
#[derive(Debug, Error)]
pub enum SstvError {
    #[error("Mode error: {0}")]
    Mode(#[from] ModeError),

    #[error("VIS decoding error: {0}")]
    Vis(#[from] VisError),

    #[error("DSP processing error: {0}")]
    Dsp(#[from] DspError),

    #[error("Encoding error: {0}")]
    Encode(#[from] EncodeError),
}

/// Mode registry / mode record errors. Unrecoverable: surfaced immediately.
#[derive(Debug, Error)]
pub enum ModeError {
    #[error("Unknown VIS code: {code}")]
    UnknownVisCode { code: u8 },

    #[error("Malformed mode record {name}: {reason}")]
    MalformedRecord { name: &'static str, reason: String },
}

/// VIS header decode errors. Always recovered locally by discarding the
/// candidate; never escapes the streaming/batch engines as an observer
/// error, but typed for direct unit testing of the VIS decoder.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VisError {
    #[error("Leader tone at {measured_hz:.1} Hz outside tolerance of 1900 Hz")]
    LeaderToneOutOfRange { measured_hz: f64 },

    #[error("Bit {index} frequency {measured_hz:.1} Hz did not match any expected tone")]
    BitOutOfRange { index: usize, measured_hz: f64 },

    #[error("Start/stop bit {index} at {measured_hz:.1} Hz failed 1200 Hz check")]
    FramingBitInvalid { index: usize, measured_hz: f64 },

    #[error("Parity failed and single-bit correction found no known mode")]
    ParityUncorrectable,

    #[error("Insufficient samples after break: need {required}, have {available}")]
    InsufficientSamples { required: usize, available: usize },
}

/// DSP primitive errors.
#[derive(Debug, Error)]
pub enum DspError {
    #[error("FFT size {size} is not a power of 2")]
    InvalidFftSize { size: usize },

    #[error("filter design failed: {reason}")]
    FilterDesignFailed { reason: String },
}

/// Encoder errors.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("image has {actual} pixels, expected {expected} for mode {mode_name} ({width}x{height})")]
    ImageSizeMismatch {
        mode_name: &'static str,
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Result type alias for SlowScan operations
pub type Result<T> = std::result::Result<T, SstvError>;
