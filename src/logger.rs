//! Console logging macros shared by every component.
//!
//! Every line carries a coloured level tag and the UTC wall time with millisecond resolution.
//! `warn!` and `error!` go to stderr, the rest to stdout. `event!` is meant for per-tick
//! traces and stays silent unless `LOG_VIGIL_EVENTS` was set when the first event was logged.

use chrono::Utc;
use std::{fmt, sync::LazyLock};
use strum_macros::Display;

pub const EVENTS_ENV: &str = "LOG_VIGIL_EVENTS";

static EVENTS_ENABLED: LazyLock<bool> = LazyLock::new(|| std::env::var_os(EVENTS_ENV).is_some());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Level {
    Info,
    Log,
    Warn,
    Error,
    Fatal,
    /// Operator-relevant safety events: escalations, mandatory reserve actions, mode changes.
    Safe,
    Event,
}

impl Level {
    fn colour(self) -> &'static str {
        match self {
            Level::Info => "\x1b[32m",
            Level::Log => "\x1b[33m",
            Level::Warn => "\x1b[35m",
            Level::Error => "\x1b[31m",
            Level::Fatal | Level::Safe => "\x1b[1;31m",
            Level::Event => "\x1b[36m",
        }
    }

    fn to_stderr(self) -> bool { matches!(self, Level::Warn | Level::Error | Level::Fatal) }
}

/// Formats one log line without printing it.
pub fn render(level: Level, args: fmt::Arguments<'_>) -> String {
    let tag = format!("[{level}]");
    format!("{}{tag:<7}[{}]\x1b[0m {args}", level.colour(), Utc::now().format("%H:%M:%S%.3f"))
}

pub fn emit(level: Level, args: fmt::Arguments<'_>) {
    let line = render(level, args);
    if level.to_stderr() {
        eprintln!("{line}");
    } else {
        println!("{line}");
    }
}

pub fn events_enabled() -> bool { *EVENTS_ENABLED }

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => { $crate::logger::emit($crate::logger::Level::Info, format_args!($($arg)*)) };
}

#[macro_export]
macro_rules! log {
    ($($arg:tt)*) => { $crate::logger::emit($crate::logger::Level::Log, format_args!($($arg)*)) };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => { $crate::logger::emit($crate::logger::Level::Warn, format_args!($($arg)*)) };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => { $crate::logger::emit($crate::logger::Level::Error, format_args!($($arg)*)) };
}

#[macro_export]
macro_rules! fatal {
    ($($arg:tt)*) => {
        panic!("{}", $crate::logger::render($crate::logger::Level::Fatal, format_args!($($arg)*)))
    };
}

#[macro_export]
macro_rules! safety {
    ($($arg:tt)*) => { $crate::logger::emit($crate::logger::Level::Safe, format_args!($($arg)*)) };
}

#[macro_export]
macro_rules! event {
    ($($arg:tt)*) => {
        if $crate::logger::events_enabled() {
            $crate::logger::emit($crate::logger::Level::Event, format_args!($($arg)*))
        }
    };
}

#[cfg(test)]
mod tests {
    use super::{Level, render};

    #[test]
    fn test_render_aligns_tags() {
        let reading = 0.25;
        let info = render(Level::Info, format_args!("battery at {reading}"));
        let safe = render(Level::Safe, format_args!("battery at {reading}"));
        assert!(info.starts_with("\x1b[32m[INFO] ["));
        assert!(safe.starts_with("\x1b[1;31m[SAFE] ["));
        assert!(info.ends_with("\x1b[0m battery at 0.25"));
        assert_eq!(info.len(), safe.len() - 2);
    }

    #[test]
    #[should_panic(expected = "[FATAL][")]
    fn test_fatal_panics_with_tag() {
        crate::fatal!("config rejected: {}", "bad range");
    }
}
