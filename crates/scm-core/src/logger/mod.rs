//! # SCM Logger Capability
//!
//! The logger contract every `logger`-typed component satisfies, the shared
//! [`LogLevel`] scale, and the [`DefaultLogger`] that `init()` registers when
//! the configuration did not provide one.
pub mod default;

use std::fmt::{self, Debug};
use std::str::FromStr;
use std::sync::Arc;

use crate::kernel::error::Error;

pub use default::DefaultLogger;

/// Verbosity scale, ordered from quietest to noisiest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Silent = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Verbose = 4,
    Debug = 5,
    Silly = 6,
}

impl LogLevel {
    pub const ALL: [LogLevel; 7] = [
        LogLevel::Silent,
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Verbose,
        LogLevel::Debug,
        LogLevel::Silly,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Silent => "silent",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Verbose => "verbose",
            LogLevel::Debug => "debug",
            LogLevel::Silly => "silly",
        }
    }

    pub fn index(&self) -> u8 {
        *self as u8
    }

    /// Level at position `index` on the scale, if there is one.
    pub fn from_index(index: i64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| LogLevel::ALL.get(i).copied())
    }

    /// The `log` crate level this maps onto. `Silent` has none.
    pub fn to_log_level(&self) -> Option<log::Level> {
        match self {
            LogLevel::Silent => None,
            LogLevel::Error => Some(log::Level::Error),
            LogLevel::Warn => Some(log::Level::Warn),
            LogLevel::Info => Some(log::Level::Info),
            LogLevel::Verbose | LogLevel::Debug => Some(log::Level::Debug),
            LogLevel::Silly => Some(log::Level::Trace),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogLevel::ALL
            .iter()
            .find(|level| level.name() == s)
            .copied()
            .ok_or_else(|| Error::LoggerLevel { level: s.to_string() })
    }
}

/// Logger capability consumed wherever the core logs.
pub trait Logger: Send + Sync + Debug {
    fn log(&self, level: LogLevel, message: &str);

    /// Child logger that prefixes its output with `name`.
    fn create(&self, name: &str) -> Arc<dyn Logger>;

    /// Configuration features understood by this logger; must include `set-level`.
    fn features(&self) -> Vec<String>;

    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message)
    }

    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message)
    }

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message)
    }

    fn verbose(&self, message: &str) {
        self.log(LogLevel::Verbose, message)
    }

    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message)
    }

    fn silly(&self, message: &str) {
        self.log(LogLevel::Silly, message)
    }
}
