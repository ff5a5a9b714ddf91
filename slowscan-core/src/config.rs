//! Streaming decoder configuration, loadable from TOML at the CLI boundary
//! (spec.md §6, §10.3). Grounded on `chimera-core/src/config.rs`'s
//! serde-derived, `Default`-implementing option structs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingOptions {
    pub sample_rate: f64,
    pub max_buffer_seconds: f64,
    pub fft_size: usize,
    /// Skip VIS detection and assume this VIS code's mode from sample 0
    /// (spec.md §10.5's forced-mode decision: still runs the full line
    /// timing state machine, just never consults VIS/timing arbitration).
    pub force_mode: Option<u8>,
    pub output_noise: bool,
    pub allow_vis_interrupt: bool,
}

impl Default for StreamingOptions {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            max_buffer_seconds: 10.0,
            fft_size: 4096,
            force_mode: None,
            output_noise: false,
            allow_vis_interrupt: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_spec_nominal_values() {
        let options = StreamingOptions::default();
        assert_eq!(options.fft_size, 4096);
        assert_eq!(options.max_buffer_seconds, 10.0);
        assert!(options.force_mode.is_none());
    }
}
