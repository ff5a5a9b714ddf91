//! Optional TOML-file overrides for decode options, applied at the CLI
//! boundary (spec.md §10.3). Grounded on `chimera-cli/src/config.rs`'s
//! TOML-loading shape, trimmed of the include/merge system this CLI's
//! scope doesn't need (see DESIGN.md).

use color_eyre::eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use slowscan_core::config::StreamingOptions;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CliConfig {
    #[serde(default)]
    pub streaming: StreamingOptionsOverride,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StreamingOptionsOverride {
    pub sample_rate: Option<f64>,
    pub max_buffer_seconds: Option<f64>,
    pub fft_size: Option<usize>,
    pub force_mode: Option<u8>,
    pub output_noise: Option<bool>,
    pub allow_vis_interrupt: Option<bool>,
}

impl StreamingOptionsOverride {
    pub fn apply(&self, mut base: StreamingOptions) -> StreamingOptions {
        if let Some(v) = self.sample_rate {
            base.sample_rate = v;
        }
        if let Some(v) = self.max_buffer_seconds {
            base.max_buffer_seconds = v;
        }
        if let Some(v) = self.fft_size {
            base.fft_size = v;
        }
        if self.force_mode.is_some() {
            base.force_mode = self.force_mode;
        }
        if let Some(v) = self.output_noise {
            base.output_noise = v;
        }
        if let Some(v) = self.allow_vis_interrupt {
            base.allow_vis_interrupt = v;
        }
        base
    }
}

impl CliConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&content).wrap_err("failed to parse TOML configuration")
    }
}
