//! Core SSTV signal-processing and protocol engine: FM demodulation, VIS
//! header decoding, mode timing tables, streaming/batch decode, and the
//! symmetric encoder.

pub mod batch;
pub mod config;
pub mod demodulator;
pub mod dsp;
pub mod encoder;
pub mod errors;
pub mod events;
pub mod image_buffer;
pub mod line_decoder;
pub mod logging;
pub mod modes;
pub mod ring_buffer;
pub mod streaming;
pub mod sync_history;
pub mod testsignal;
pub mod vis;

pub use errors::{DspError, EncodeError, ModeError, Result, SstvError, VisError};
pub use image_buffer::DecodedImage;
pub use modes::Mode;
