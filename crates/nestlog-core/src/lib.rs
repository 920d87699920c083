//! nestlog Core
//!
//! Hierarchical logging: every entry is placed in a tree that mirrors the call
//! stack at the moment it was logged. A method called from a method that
//! already logged nests its entries under the caller's entry, and returning
//! to an ancestor continues at the ancestor's level. The output is valid
//! YAML, either one document per root entry (`yaml` style) or an indented
//! list of `log:` lines (`line` style).
//!
//! ## Pipeline
//!
//! A log call resolves the live call stack once (`frame`), then each sink
//! runs its own `tracker` to decide where the entry sits in the tree,
//! `render`s it and writes it, all under that sink's lock.
//!
//! ```rust,ignore
//! use nestlog_core::{registry, ConfigSource};
//!
//! registry::global().set_config(ConfigSource::File("logging.yaml".into()))?;
//! let logger = registry::global().get_or_create("app");
//!
//! logger.info("starting")?;
//! logger.increase_depth()?;
//! logger.info("nested under starting")?;
//! logger.decrease_depth(1)?;
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod format;
pub mod frame;
pub mod level;
pub mod logger;
pub mod registry;
pub mod render;
pub mod sink;
pub mod tracker;

// Re-export commonly used types
pub use error::{Error, ErrorKind, Result};
pub use level::Level;

pub use format::{DateFormat, LineTemplate, LogElement, LogStyle, SinkSettings, YamlElements};

pub use frame::{Frame, FrameIdentity};

pub use tracker::{Decision, DepthTracker, ManualDepth, Transition};

pub use sink::{
    ConsoleOutput, FileOutput, FileSize, MemoryOutput, Output, RotationPolicy, Sink,
};

pub use logger::Logger;

pub use registry::LoggerRegistry;

pub use config::{ConfigSource, LoggingConfig};
