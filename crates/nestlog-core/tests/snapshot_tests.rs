mod common;

use common::{line_logger, memory_logger, message_only, parse_tree};
use nestlog_core::{Error, Level, LogStyle, Logger, ManualDepth, SinkSettings};

#[inline(never)]
fn outer(logger: &Logger, depth: usize) {
    inner(logger, depth);
}

#[inline(never)]
fn inner(logger: &Logger, depth: usize) {
    logger.snapshot_with(depth, ManualDepth::None).unwrap();
}

#[inline(never)]
fn default_snapshot(logger: &Logger) {
    logger.snapshot().unwrap();
}

#[test]
fn test_snapshot_lists_frames() {
    let (logger, buffer) = line_logger("snapshot");
    outer(&logger, 2);

    let tree = parse_tree(&buffer.contents());
    assert_eq!(tree.len(), 1);

    let lines: Vec<&str> = tree[0].log.lines().collect();
    assert_eq!(lines[0], "Stack snapshot:");
    assert!(lines[1].starts_with("Frame: snapshot_tests.rs.inner:"), "{}", lines[1]);
    assert_eq!(lines[2], "==============");
    assert!(lines[3].starts_with("Frame: snapshot_tests.rs.outer:"), "{}", lines[3]);
    assert_eq!(lines[4], "==============");
    assert_eq!(lines.len(), 5);
}

#[test]
fn test_default_snapshot_depth_is_one() {
    let (logger, buffer) = line_logger("snapshot-default");
    default_snapshot(&logger);

    let tree = parse_tree(&buffer.contents());
    let message = &tree[0].log;
    assert_eq!(message.matches("Frame: ").count(), 1);
    assert!(message.contains("default_snapshot:"));
}

#[test]
fn test_snapshot_logged_at_trace() {
    let (logger, buffer) = memory_logger(
        "snapshot-filtered",
        SinkSettings {
            level: Level::Debug,
            ..message_only(LogStyle::Line)
        },
    );
    default_snapshot(&logger);
    assert!(buffer.is_empty());

    let (logger, buffer) = memory_logger("snapshot-yaml", message_only(LogStyle::Yaml));
    default_snapshot(&logger);
    let docs = common::parse_documents(&buffer.contents());
    assert_eq!(docs[0]["log_level"].as_str(), Some("TRACE"));
}

#[test]
fn test_snapshot_rejects_zero_depth() {
    let (logger, buffer) = line_logger("snapshot-zero");
    let err = logger.snapshot_with(0, ManualDepth::None).unwrap_err();
    assert!(matches!(err, Error::InvalidParameter(_)));
    assert!(!err.is_bug());
    assert!(buffer.is_empty());
}

#[test]
fn test_snapshot_takes_part_in_nesting() {
    let (logger, buffer) = line_logger("snapshot-nesting");
    logger.info("before").unwrap();
    logger.snapshot_with(1, ManualDepth::Increase).unwrap();

    let tree = parse_tree(&buffer.contents());
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].log, "before");
    assert!(tree[0].children[0].log.starts_with("Stack snapshot:"));
}
