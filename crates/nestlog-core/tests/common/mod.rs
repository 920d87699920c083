//! Shared integration test helpers.
//!
//! Include with `mod common;` at the top of a test file.

#![allow(dead_code)]

use std::sync::Arc;

use serde::Deserialize;

use nestlog_core::{Level, LineTemplate, LogStyle, Logger, MemoryOutput, Sink, SinkSettings};

/// One entry of a line style tree
#[derive(Debug, Deserialize)]
pub struct Node {
    pub log: String,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Node {
    /// Number of entries in this subtree, this one included
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Node::count).sum::<usize>()
    }
}

/// Settings that log every level and render only the message
pub fn message_only(style: LogStyle) -> SinkSettings {
    SinkSettings {
        level: Level::Trace,
        style,
        line_template: LineTemplate::new("$message$"),
        ..SinkSettings::default()
    }
}

/// Logger with a single in-memory sink
pub fn memory_logger(name: &str, settings: SinkSettings) -> (Arc<Logger>, MemoryOutput) {
    let logger = Arc::new(Logger::new(name));
    let (sink, buffer) = Sink::memory(settings);
    logger.add_sink(Arc::new(sink));
    (logger, buffer)
}

/// Line style logger rendering only messages
pub fn line_logger(name: &str) -> (Arc<Logger>, MemoryOutput) {
    memory_logger(name, message_only(LogStyle::Line))
}

pub fn parse_tree(output: &str) -> Vec<Node> {
    serde_yaml::from_str(output).expect("line style output must be valid YAML")
}

/// Every document of a YAML style output
pub fn parse_documents(output: &str) -> Vec<serde_yaml::Value> {
    serde_yaml::Deserializer::from_str(output)
        .map(|doc| serde_yaml::Value::deserialize(doc).expect("document must be valid YAML"))
        .collect()
}
