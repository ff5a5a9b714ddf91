//! Print a core `SignalLogger`'s collected entries after a run, grounded on
//! `chimera-cli/src/logging.rs`'s format-selectable `StructuredLogger`,
//! trimmed to the two formats this CLI actually offers (see DESIGN.md).

use slowscan_core::logging::SignalLogger;

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

pub fn print_log(logger: &SignalLogger, format: LogFormat) {
    match format {
        LogFormat::Pretty => {
            for entry in logger.entries() {
                println!("[{}] {}: {}", entry.level, entry.subsystem, entry.message);
            }
        }
        LogFormat::Json => {
            for entry in logger.entries() {
                println!(
                    "{{\"level\":\"{}\",\"subsystem\":\"{}\",\"message\":{:?}}}",
                    entry.level, entry.subsystem, entry.message
                );
            }
        }
    }
}
