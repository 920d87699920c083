//! Turn a validated [`LoggingConfig`] into sinks
//!
//! Planning resolves every setting up front, so applying a plan cannot fail
//! halfway through.

use std::path::PathBuf;

use super::file::{HandlerKind, LoggingConfig, StreamHandlerConfig};
use crate::format::SinkSettings;
use crate::sink::{RotationPolicy, Sink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkTarget {
    Console,
    File(PathBuf),
}

/// Fully resolved description of one sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkPlan {
    pub target: SinkTarget,
    pub settings: SinkSettings,
    pub rotation: Option<RotationPolicy>,
}

impl SinkPlan {
    pub fn build(&self) -> Sink {
        match &self.target {
            SinkTarget::Console => Sink::console(self.settings.clone()),
            SinkTarget::File(path) => {
                Sink::file(path.clone(), self.settings.clone(), self.rotation.clone())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerPlan {
    pub name: String,
    pub sinks: Vec<SinkPlan>,
}

/// Resolve each stream handler through handler, logger, manager and `defaults`
pub fn plan(config: &LoggingConfig, defaults: &SinkSettings) -> Vec<LoggerPlan> {
    let manager = config.layer();
    config
        .loggers
        .iter()
        .map(|logger| {
            let logger_layer = logger.layer().or(&manager);
            let sinks = logger
                .stream_handlers
                .iter()
                .map(|handler| SinkPlan {
                    target: target_of(handler),
                    settings: handler.layer().or(&logger_layer).apply_to(defaults),
                    rotation: rotation_of(handler),
                })
                .collect();
            LoggerPlan {
                name: logger.name.clone(),
                sinks,
            }
        })
        .collect()
}

fn target_of(handler: &StreamHandlerConfig) -> SinkTarget {
    match (handler.kind, &handler.file_path) {
        (HandlerKind::File, Some(path)) => SinkTarget::File(path.clone()),
        // validation guarantees file handlers carry a path
        _ => SinkTarget::Console,
    }
}

fn rotation_of(handler: &StreamHandlerConfig) -> Option<RotationPolicy> {
    let max_file_size = handler.limit_file_size?;
    let mut policy = RotationPolicy::new(max_file_size);
    if let Some(files_amount) = handler.files_amount {
        policy = policy.with_files_amount(files_amount);
    }
    if let Some(is_zip) = handler.is_zip {
        policy = policy.with_zip(is_zip);
    }
    Some(policy)
}
