//! Logging utilities
//!
//! The engine logs through the `log` facade. Scene-level records use a fixed
//! channel format, `[LEVEL] [type id]: message`, so observers can attribute
//! every line to the node that produced it. The same formatted record is
//! re-fired as a `log`/`warn`/`error` event on the owning scene (see
//! [`crate::scene::Scene`]).

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging backend from `RUST_LOG`.
pub fn init() {
    env_logger::init();
}

/// Severity of a scene log channel record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Informational channel (`log` event).
    Log,
    /// Recoverable problems (`warn` event).
    Warn,
    /// Failed operations (`error` event).
    Error,
}

impl LogLevel {
    /// Channel name, which doubles as the scene event name.
    pub fn channel(self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Upper-case tag used in the formatted record.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Log => "LOG",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

/// Format a record for the scene log channel: `[LEVEL] [type id]: message`.
pub fn format_record(level: LogLevel, type_tag: &str, id: &str, message: &str) -> String {
    format!("[{}] [{} {}]: {}", level.tag(), type_tag, id, message)
}

/// Emit a formatted record through the `log` facade at the matching severity.
pub fn emit(level: LogLevel, formatted: &str) {
    match level {
        LogLevel::Log => info!("{formatted}"),
        LogLevel::Warn => warn!("{formatted}"),
        LogLevel::Error => error!("{formatted}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_format_includes_level_type_and_id() {
        let line = format_record(LogLevel::Warn, "sphere", "s1", "radius coerced");
        assert_eq!(line, "[WARN] [sphere s1]: radius coerced");
    }

    #[test]
    fn channel_names_match_event_names() {
        assert_eq!(LogLevel::Log.channel(), "log");
        assert_eq!(LogLevel::Warn.channel(), "warn");
        assert_eq!(LogLevel::Error.channel(), "error");
    }
}
