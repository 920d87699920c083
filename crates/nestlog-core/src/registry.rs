//! Logger registry for looking up and creating loggers by name

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::config::{self, ConfigSource, LoggingConfig};
use crate::error::Result;
use crate::format::SinkSettings;
use crate::logger::Logger;

/// Named loggers plus the default settings new sinks start from
///
/// A registry can be owned locally (tests, embedded use) or reached through
/// [`global`].
#[derive(Debug, Default)]
pub struct LoggerRegistry {
    loggers: RwLock<HashMap<String, Arc<Logger>>>,
    defaults: RwLock<SinkSettings>,
}

/// Process-wide registry, created on first use
static GLOBAL: Lazy<LoggerRegistry> = Lazy::new(LoggerRegistry::new);

/// The process-wide registry
///
/// # Example
///
/// ```
/// use nestlog_core::registry;
///
/// let logger = registry::global().get_or_create("doc-example");
/// assert_eq!(logger.name(), "doc-example");
/// registry::global().close("doc-example").unwrap();
/// ```
pub fn global() -> &'static LoggerRegistry {
    &GLOBAL
}

impl LoggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(defaults: SinkSettings) -> Self {
        Self {
            loggers: RwLock::new(HashMap::new()),
            defaults: RwLock::new(defaults),
        }
    }

    /// Return the logger called `name`, creating an empty one if needed
    pub fn get_or_create(&self, name: &str) -> Arc<Logger> {
        if let Some(logger) = self.loggers.read().get(name) {
            return logger.clone();
        }
        self.loggers
            .write()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Logger::new(name)))
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<Logger>> {
        self.loggers.read().get(name).cloned()
    }

    /// Registered logger names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.loggers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Close the logger's sinks and forget it
    ///
    /// Unknown names are ignored. Handles still held by callers keep working
    /// only in the sense that their writes now fail with `SinkClosed`.
    pub fn close(&self, name: &str) -> Result<()> {
        let removed = self.loggers.write().remove(name);
        match removed {
            Some(logger) => logger.close_sinks(),
            None => Ok(()),
        }
    }

    pub fn close_all(&self) -> Result<()> {
        let drained: Vec<Arc<Logger>> = self.loggers.write().drain().map(|(_, l)| l).collect();
        let mut first_error = None;
        for logger in drained {
            if let Err(e) = logger.close_sinks() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Settings copied into sinks created from now on
    pub fn defaults(&self) -> SinkSettings {
        self.defaults.read().clone()
    }

    pub fn set_defaults(&self, defaults: SinkSettings) {
        *self.defaults.write() = defaults;
    }

    /// Load a configuration and attach its sinks
    ///
    /// The whole configuration is parsed and validated first; on error no
    /// logger is touched. Loggers that already exist keep their sinks and
    /// gain the configured ones.
    pub fn set_config(&self, source: ConfigSource) -> Result<()> {
        let config = LoggingConfig::load(&source)?;
        let plans = config::plan(&config, &self.defaults());

        for logger_plan in plans {
            let logger = self.get_or_create(&logger_plan.name);
            for sink_plan in &logger_plan.sinks {
                logger.add_sink(Arc::new(sink_plan.build()));
            }
        }
        Ok(())
    }
}
