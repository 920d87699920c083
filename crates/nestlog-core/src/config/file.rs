//! YAML logging configuration
//!
//! Schema of a `logging.yaml` file. The same schema is accepted from a YAML
//! string or from an already parsed `serde_json::Value`.
//!
//! ```yaml
//! log_level: INFO
//! style: line
//! loggers:
//!   - name: app
//!     stream_handlers:
//!       - type: console
//!       - type: file
//!         file_path: logs/app.log
//!         limit_file_size: 10 MB
//!         files_amount: 5
//!         style: yaml
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::format::{DateFormat, LineTemplate, LogStyle, SinkSettings, YamlElements};
use crate::level::Level;
use crate::sink::FileSize;

/// Where a configuration comes from
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// YAML file on disk
    File(PathBuf),
    /// YAML document held in memory
    Yaml(String),
    /// Already parsed structure, e.g. built with `serde_json::json!`
    Value(serde_json::Value),
}

impl ConfigSource {
    /// Pick the source from an optional path and an optional value
    ///
    /// Exactly one of the two must be given.
    pub fn from_parts(file_path: Option<PathBuf>, config: Option<serde_json::Value>) -> Result<Self> {
        match (file_path, config) {
            (Some(path), None) => Ok(ConfigSource::File(path)),
            (None, Some(value)) => Ok(ConfigSource::Value(value)),
            (Some(_), Some(_)) => Err(Error::config(
                "Only one of file path or config value may be given",
            )),
            (None, None) => Err(Error::config("Either file path or config value is required")),
        }
    }
}

/// Settings that can be set at manager, logger or stream handler level
///
/// Unset fields fall through to the next level out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsLayer {
    pub log_level: Option<Level>,
    pub style: Option<LogStyle>,
    pub date_format: Option<DateFormat>,
    pub log_line_template: Option<String>,
    pub log_yaml_elements: Option<YamlElements>,
    pub debug: Option<bool>,
}

impl SettingsLayer {
    /// Fill unset fields from `outer`
    pub fn or(self, outer: &SettingsLayer) -> SettingsLayer {
        SettingsLayer {
            log_level: self.log_level.or(outer.log_level),
            style: self.style.or(outer.style),
            date_format: self.date_format.or_else(|| outer.date_format.clone()),
            log_line_template: self
                .log_line_template
                .or_else(|| outer.log_line_template.clone()),
            log_yaml_elements: self
                .log_yaml_elements
                .or_else(|| outer.log_yaml_elements.clone()),
            debug: self.debug.or(outer.debug),
        }
    }

    /// Resolve against the registry defaults
    pub fn apply_to(&self, defaults: &SinkSettings) -> SinkSettings {
        let mut settings = defaults.clone();
        if let Some(level) = self.log_level {
            settings.level = level;
        }
        if let Some(style) = self.style {
            settings.style = style;
        }
        if let Some(date_format) = &self.date_format {
            settings.date_format = date_format.clone();
        }
        if let Some(template) = &self.log_line_template {
            settings.line_template = LineTemplate::new(template.clone());
        }
        if let Some(elements) = &self.log_yaml_elements {
            settings.yaml_elements = elements.clone();
        }
        if let Some(debug) = self.debug {
            settings.debug = debug;
        }
        settings
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerKind {
    Console,
    File,
}

/// One output of a logger
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamHandlerConfig {
    #[serde(rename = "type")]
    pub kind: HandlerKind,
    #[serde(default)]
    pub file_path: Option<PathBuf>,
    #[serde(default)]
    pub limit_file_size: Option<FileSize>,
    #[serde(default)]
    pub files_amount: Option<usize>,
    #[serde(default)]
    pub is_zip: Option<bool>,

    #[serde(default)]
    pub log_level: Option<Level>,
    #[serde(default)]
    pub style: Option<LogStyle>,
    #[serde(default)]
    pub date_format: Option<DateFormat>,
    #[serde(default)]
    pub log_line_template: Option<String>,
    #[serde(default)]
    pub log_yaml_elements: Option<YamlElements>,
    #[serde(default)]
    pub debug: Option<bool>,
}

impl StreamHandlerConfig {
    pub fn layer(&self) -> SettingsLayer {
        SettingsLayer {
            log_level: self.log_level,
            style: self.style,
            date_format: self.date_format.clone(),
            log_line_template: self.log_line_template.clone(),
            log_yaml_elements: self.log_yaml_elements.clone(),
            debug: self.debug,
        }
    }

    fn validate(&self, logger: &str) -> Result<()> {
        let has_rotation_keys = self.files_amount.is_some() || self.is_zip.is_some();
        match self.kind {
            HandlerKind::File => {
                if self.file_path.is_none() {
                    return Err(Error::config(format!(
                        "Logger [{}] has a file stream handler without file_path",
                        logger
                    )));
                }
                if has_rotation_keys && self.limit_file_size.is_none() {
                    return Err(Error::config(format!(
                        "Logger [{}]: files_amount and is_zip require limit_file_size",
                        logger
                    )));
                }
            }
            HandlerKind::Console => {
                if self.file_path.is_some() || self.limit_file_size.is_some() || has_rotation_keys {
                    return Err(Error::config(format!(
                        "Logger [{}]: console stream handler does not take file options",
                        logger
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggerConfig {
    pub name: String,
    pub stream_handlers: Vec<StreamHandlerConfig>,

    #[serde(default)]
    pub log_level: Option<Level>,
    #[serde(default)]
    pub style: Option<LogStyle>,
    #[serde(default)]
    pub date_format: Option<DateFormat>,
    #[serde(default)]
    pub log_line_template: Option<String>,
    #[serde(default)]
    pub log_yaml_elements: Option<YamlElements>,
    #[serde(default)]
    pub debug: Option<bool>,
}

impl LoggerConfig {
    pub fn layer(&self) -> SettingsLayer {
        SettingsLayer {
            log_level: self.log_level,
            style: self.style,
            date_format: self.date_format.clone(),
            log_line_template: self.log_line_template.clone(),
            log_yaml_elements: self.log_yaml_elements.clone(),
            debug: self.debug,
        }
    }
}

/// Top level of a logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    pub loggers: Vec<LoggerConfig>,

    #[serde(default)]
    pub log_level: Option<Level>,
    #[serde(default)]
    pub style: Option<LogStyle>,
    #[serde(default)]
    pub date_format: Option<DateFormat>,
    #[serde(default)]
    pub log_line_template: Option<String>,
    #[serde(default)]
    pub log_yaml_elements: Option<YamlElements>,
    #[serde(default)]
    pub debug: Option<bool>,
}

impl LoggingConfig {
    /// Default user-level location (`~/.config/nestlog/logging.yaml` on Linux)
    pub fn user_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config")
        });
        config_dir.join("nestlog").join("logging.yaml")
    }

    /// Parse and validate a configuration from any source
    pub fn load(source: &ConfigSource) -> Result<Self> {
        match source {
            ConfigSource::File(path) => Self::from_path(path),
            ConfigSource::Yaml(text) => Self::from_yaml(text),
            ConfigSource::Value(value) => Self::from_value(value.clone()),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: LoggingConfig = serde_yaml::from_str(text)
            .map_err(|e| Error::config(format!("Failed to parse YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let config: LoggingConfig = serde_json::from_value(value)
            .map_err(|e| Error::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn layer(&self) -> SettingsLayer {
        SettingsLayer {
            log_level: self.log_level,
            style: self.style,
            date_format: self.date_format.clone(),
            log_line_template: self.log_line_template.clone(),
            log_yaml_elements: self.log_yaml_elements.clone(),
            debug: self.debug,
        }
    }

    /// Structural checks serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.loggers.is_empty() {
            return Err(Error::config("Config has no loggers"));
        }

        let mut names = HashSet::new();
        for logger in &self.loggers {
            if logger.name.trim().is_empty() {
                return Err(Error::config("Logger name must not be empty"));
            }
            if !names.insert(logger.name.as_str()) {
                return Err(Error::config(format!(
                    "Logger [{}] is configured more than once",
                    logger.name
                )));
            }
            if logger.stream_handlers.is_empty() {
                return Err(Error::config(format!(
                    "Logger [{}] has no stream handlers",
                    logger.name
                )));
            }
            for handler in &logger.stream_handlers {
                handler.validate(&logger.name)?;
            }
        }
        Ok(())
    }
}
