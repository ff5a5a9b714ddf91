//! Structured logging for the decode/encode pipeline
//!
//! A per-instance, bounded log collector. Not a process-wide subscriber:
//! each `StreamingDecoder` / `Encoder` owns its own logger, filtered by
//! level and by subsystem.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,

    pub enable_demod: bool,
    pub enable_sync: bool,
    pub enable_vis: bool,
    pub enable_line: bool,

    /// Bound on retained entries (oldest evicted first).
    pub max_entries: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            enable_demod: true,
            enable_sync: true,
            enable_vis: true,
            enable_line: true,
            max_entries: 1000,
        }
    }
}

impl LogConfig {
    pub fn verbose() -> Self {
        Self {
            level: LogLevel::Debug,
            max_entries: 5000,
            ..Default::default()
        }
    }

    pub fn quiet() -> Self {
        Self {
            level: LogLevel::Warn,
            enable_demod: false,
            enable_sync: false,
            enable_vis: false,
            enable_line: false,
            max_entries: 100,
        }
    }

    pub fn disabled() -> Self {
        Self {
            level: LogLevel::Error,
            enable_demod: false,
            enable_sync: false,
            enable_vis: false,
            enable_line: false,
            max_entries: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub subsystem: &'static str,
    pub message: String,
}

/// Logger that collects structured log entries for one decode/encode session.
#[derive(Debug, Clone)]
pub struct SignalLogger {
    config: LogConfig,
    entries: Vec<LogEntry>,
}

impl SignalLogger {
    pub fn new(config: LogConfig) -> Self {
        let capacity = config.max_entries.min(1000);
        Self {
            config,
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn log(&mut self, level: LogLevel, subsystem: &'static str, message: impl fmt::Display) {
        if level < self.config.level {
            return;
        }

        let enabled = match subsystem {
            "DEMOD" | "FM" => self.config.enable_demod,
            "SYNC" | "MODE" | "STREAM" => self.config.enable_sync,
            "VIS" => self.config.enable_vis,
            "LINE" | "ENCODE" => self.config.enable_line,
            _ => true,
        };

        if !enabled {
            return;
        }

        let entry = LogEntry {
            level,
            subsystem,
            message: message.to_string(),
        };

        if self.config.max_entries > 0 {
            if self.entries.len() >= self.config.max_entries {
                self.entries.remove(0);
            }
            self.entries.push(entry);
        }
    }

    pub fn trace(&mut self, subsystem: &'static str, message: impl fmt::Display) {
        self.log(LogLevel::Trace, subsystem, message);
    }
    pub fn debug(&mut self, subsystem: &'static str, message: impl fmt::Display) {
        self.log(LogLevel::Debug, subsystem, message);
    }
    pub fn info(&mut self, subsystem: &'static str, message: impl fmt::Display) {
        self.log(LogLevel::Info, subsystem, message);
    }
    pub fn warn(&mut self, subsystem: &'static str, message: impl fmt::Display) {
        self.log(LogLevel::Warn, subsystem, message);
    }
    pub fn error(&mut self, subsystem: &'static str, message: impl fmt::Display) {
        self.log(LogLevel::Error, subsystem, message);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn entries_for_subsystem(&self, subsystem: &str) -> Vec<&LogEntry> {
        self.entries.iter().filter(|e| e.subsystem == subsystem).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for SignalLogger {
    fn default() -> Self {
        Self::new(LogConfig::default())
    }
}

impl fmt::Display for SignalLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "[{}] {}: {}", entry.level, entry.subsystem, entry.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_by_level() {
        let mut logger = SignalLogger::new(LogConfig {
            level: LogLevel::Info,
            ..Default::default()
        });
        logger.trace("DEMOD", "trace");
        logger.debug("DEMOD", "debug");
        logger.info("DEMOD", "info");
        logger.warn("DEMOD", "warn");
        assert_eq!(logger.entries().len(), 2);
    }

    #[test]
    fn filters_by_subsystem() {
        let mut logger = SignalLogger::new(LogConfig {
            level: LogLevel::Debug,
            enable_demod: false,
            ..Default::default()
        });
        logger.info("DEMOD", "a");
        logger.info("VIS", "b");
        assert_eq!(logger.entries().len(), 1);
        assert_eq!(logger.entries()[0].subsystem, "VIS");
    }

    #[test]
    fn evicts_oldest_past_capacity() {
        let mut logger = SignalLogger::new(LogConfig {
            level: LogLevel::Debug,
            max_entries: 2,
            ..Default::default()
        });
        logger.info("SYNC", "one");
        logger.info("SYNC", "two");
        logger.info("SYNC", "three");
        assert_eq!(logger.entries().len(), 2);
        assert!(logger.entries()[0].message.contains("two"));
    }
}
