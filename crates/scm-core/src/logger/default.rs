use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use crate::kernel::component::{Component, Configurable};
use crate::kernel::constants::{GET_LEVEL_FEATURE, LOG_TARGET, SET_LEVEL_FEATURE};
use crate::kernel::error::{Error, Result};
use crate::logger::{LogLevel, Logger};

/// Leveled logger that forwards to the `log` facade.
///
/// Child loggers from [`Logger::create`] share their parent's level, so a
/// `set-level` applied to the registered `logger` component governs every
/// logger handed out by it.
#[derive(Debug, Clone)]
pub struct DefaultLogger {
    name: String,
    level: Arc<AtomicU8>,
}

impl DefaultLogger {
    pub fn new() -> Self {
        Self::named("unknown")
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            level: Arc::new(AtomicU8::new(LogLevel::Debug.index())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> LogLevel {
        LogLevel::from_index(i64::from(self.level.load(Ordering::SeqCst))).unwrap_or(LogLevel::Debug)
    }

    /// Set the level from a level name (`"warn"`) or an index on the scale (`2`).
    pub fn set_level(&self, value: &Value) -> Result<()> {
        let level = match value {
            Value::String(name) => name.parse::<LogLevel>()?,
            Value::Number(number) => number
                .as_i64()
                .and_then(LogLevel::from_index)
                .ok_or_else(|| Error::LoggerLevel { level: number.to_string() })?,
            other => return Err(Error::LoggerLevel { level: other.to_string() }),
        };
        self.level.store(level.index(), Ordering::SeqCst);
        Ok(())
    }

    /// Logger named `name` that shares this logger's level.
    pub fn child(&self, name: &str) -> DefaultLogger {
        DefaultLogger {
            name: name.to_string(),
            level: Arc::clone(&self.level),
        }
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::Silent && level <= self.level()
    }
}

impl Default for DefaultLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for DefaultLogger {
    fn log(&self, level: LogLevel, message: &str) {
        if !self.enabled(level) {
            return;
        }
        let Some(log_level) = level.to_log_level() else {
            return;
        };
        let marker = match level {
            LogLevel::Error => "!!! ERROR: ",
            LogLevel::Warn => "! WARNING: ",
            _ => "",
        };
        log::log!(target: LOG_TARGET, log_level, "{}: {}{}", self.name, marker, message);
    }

    fn create(&self, name: &str) -> Arc<dyn Logger> {
        Arc::new(self.child(name))
    }

    fn features(&self) -> Vec<String> {
        vec![SET_LEVEL_FEATURE.to_string(), GET_LEVEL_FEATURE.to_string()]
    }
}

#[async_trait]
impl Component for DefaultLogger {
    fn configurable(&self) -> Option<&dyn Configurable> {
        Some(self)
    }

    fn as_logger(&self) -> Option<&dyn Logger> {
        Some(self)
    }
}

#[async_trait]
impl Configurable for DefaultLogger {
    fn features(&self) -> Option<Vec<String>> {
        Some(Logger::features(self))
    }

    async fn config(&self, feature: &str, value: Value) -> Result<Value> {
        match feature {
            SET_LEVEL_FEATURE => {
                self.set_level(&value)?;
                Ok(Value::Null)
            }
            GET_LEVEL_FEATURE => Ok(Value::String(self.level().name().to_string())),
            other => Err(Error::FeatureNotFound {
                name: self.name.clone(),
                feature: other.to_string(),
            }),
        }
    }
}
