//! Logging configuration
//!
//! - `LoggingConfig`: YAML schema, loaded from a file, a string or a value
//! - `builder`: resolves settings inheritance into ready-to-build sinks

mod builder;
mod file;

pub use builder::{plan, LoggerPlan, SinkPlan, SinkTarget};
pub use file::{
    ConfigSource, HandlerKind, LoggerConfig, LoggingConfig, SettingsLayer, StreamHandlerConfig,
};
