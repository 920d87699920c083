//! Nesting driven by the real call stack.
//!
//! Every helper is `#[inline(never)]` so that each method keeps its own frame.

mod common;

use std::sync::Arc;

use common::{line_logger, parse_documents, parse_tree};
use nestlog_core::{LogStyle, Logger, ManualDepth};

struct ComplexLogs1 {
    logger: Arc<Logger>,
}

impl ComplexLogs1 {
    #[inline(never)]
    fn a(&self) {
        self.b();
        self.logger.info("A METHOD 1").unwrap();
    }

    #[inline(never)]
    fn b(&self) {
        self.logger.info("B METHOD 1").unwrap();
        self.c();
    }

    #[inline(never)]
    fn c(&self) {
        self.d();
    }

    #[inline(never)]
    fn d(&self) {
        self.logger.info("D METHOD 1").unwrap();
        self.logger.info("D METHOD 2").unwrap();
    }

    #[inline(never)]
    fn e(&self) {
        self.logger.info("E METHOD 1").unwrap();
        self.f();
    }

    #[inline(never)]
    fn f(&self) {
        self.g();
        self.logger.info("F METHOD 1").unwrap();
    }

    #[inline(never)]
    fn g(&self) {
        self.h();
        self.logger.info("G METHOD 1").unwrap();
    }

    #[inline(never)]
    fn h(&self) {
        self.logger.info("H METHOD 1").unwrap();
    }
}

struct ComplexLogs2 {
    logger: Arc<Logger>,
}

impl ComplexLogs2 {
    #[inline(never)]
    fn a(&self) {
        self.b();
        self.logger.info("A METHOD 1").unwrap();
    }

    #[inline(never)]
    fn b(&self) {
        self.logger.info("B METHOD 1").unwrap();
        self.c();
    }

    #[inline(never)]
    fn c(&self) {
        self.d();
        self.logger.info("C METHOD 1").unwrap();
    }

    #[inline(never)]
    fn d(&self) {
        self.logger.info("D METHOD 1").unwrap();
        self.e();
        self.logger.info("D METHOD 2").unwrap();
    }

    #[inline(never)]
    fn e(&self) {
        self.logger.info("E METHOD 1").unwrap();
        self.f();
    }

    #[inline(never)]
    fn f(&self) {
        self.logger.info("F METHOD 1").unwrap();
        self.g();
    }

    #[inline(never)]
    fn g(&self) {
        self.logger.info("G METHOD 1").unwrap();
        self.h();
    }

    #[inline(never)]
    fn h(&self) {
        self.logger.info("H METHOD 1").unwrap();
    }
}

#[inline(never)]
fn recurse(logger: &Logger, i: u32) {
    if i == 0 {
        return;
    }
    logger.info(format!("A METHOD 1 i={}", i)).unwrap();
    recurse(logger, i - 1);
}

#[inline(never)]
fn chain_a(logger: &Logger) {
    logger.info("a").unwrap();
    chain_b(logger);
}

#[inline(never)]
fn chain_b(logger: &Logger) {
    logger.info("b").unwrap();
    chain_c(logger);
}

#[inline(never)]
fn chain_c(logger: &Logger) {
    logger.info("c").unwrap();
}

#[inline(never)]
fn two_chains(logger: &Logger) {
    chain_b(logger);
    chain_e(logger);
}

#[inline(never)]
fn chain_e(logger: &Logger) {
    logger.info("e").unwrap();
    chain_h(logger);
}

#[inline(never)]
fn chain_h(logger: &Logger) {
    logger.info("h").unwrap();
}

#[test]
fn test_nested_call_chain() {
    let (logger, buffer) = line_logger("chain");
    chain_a(&logger);

    let tree = parse_tree(&buffer.contents());
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].log, "a");
    assert_eq!(tree[0].children.len(), 1);
    assert_eq!(tree[0].children[0].log, "b");
    assert_eq!(tree[0].children[0].children.len(), 1);
    assert_eq!(tree[0].children[0].children[0].log, "c");
}

#[test]
fn test_sibling_chains_nest_under_their_own_parent() {
    let (logger, buffer) = line_logger("siblings");
    two_chains(&logger);

    let tree = parse_tree(&buffer.contents());
    assert_eq!(tree.len(), 2);

    let b = &tree[0];
    assert_eq!(b.log, "b");
    assert_eq!(b.children.len(), 1);
    assert_eq!(b.children[0].log, "c");

    let e = &tree[1];
    assert_eq!(e.log, "e");
    assert_eq!(e.children.len(), 1);
    assert_eq!(e.children[0].log, "h");
}

#[test]
fn test_complex_structure_1() {
    let (logger, buffer) = line_logger("complex1");
    let logs = ComplexLogs1 { logger };
    logs.a();
    logs.e();

    let tree = parse_tree(&buffer.contents());
    assert_eq!(tree.len(), 5);

    assert_eq!(tree[0].log, "B METHOD 1");
    assert_eq!(tree[0].children.len(), 2);
    assert_eq!(tree[0].children[0].log, "D METHOD 1");
    assert_eq!(tree[0].children[1].log, "D METHOD 2");

    assert_eq!(tree[1].log, "A METHOD 1");
    assert_eq!(tree[2].log, "E METHOD 1");
    assert_eq!(tree[2].children.len(), 1);
    assert_eq!(tree[2].children[0].log, "H METHOD 1");

    assert_eq!(tree[3].log, "G METHOD 1");
    assert_eq!(tree[4].log, "F METHOD 1");
}

#[test]
fn test_complex_structure_2() {
    let (logger, buffer) = line_logger("complex2");
    let logs = ComplexLogs2 { logger };
    logs.a();
    logs.e();

    let tree = parse_tree(&buffer.contents());
    assert_eq!(tree.len(), 4);

    assert_eq!(tree[0].log, "B METHOD 1");
    let d_entries = &tree[0].children;
    assert_eq!(d_entries.len(), 2);
    assert_eq!(d_entries[0].log, "D METHOD 1");
    assert_eq!(d_entries[1].log, "D METHOD 2");

    let mut node = &d_entries[0];
    for expected in ["E METHOD 1", "F METHOD 1", "G METHOD 1", "H METHOD 1"] {
        assert_eq!(node.children.len(), 1);
        node = &node.children[0];
        assert_eq!(node.log, expected);
    }

    assert_eq!(tree[1].log, "C METHOD 1");
    assert_eq!(tree[2].log, "A METHOD 1");

    let mut node = &tree[3];
    assert_eq!(node.log, "E METHOD 1");
    for expected in ["F METHOD 1", "G METHOD 1", "H METHOD 1"] {
        assert_eq!(node.children.len(), 1);
        node = &node.children[0];
        assert_eq!(node.log, expected);
    }
}

#[test]
fn test_recursion_nests_each_call() {
    let (logger, buffer) = line_logger("recursive");
    recurse(&logger, 3);

    let tree = parse_tree(&buffer.contents());
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].log, "A METHOD 1 i=3");
    assert_eq!(tree[0].children[0].log, "A METHOD 1 i=2");
    assert_eq!(tree[0].children[0].children[0].log, "A METHOD 1 i=1");
}

#[test]
fn test_yaml_style_chain() {
    let (logger, buffer) =
        common::memory_logger("yaml-chain", common::message_only(LogStyle::Yaml));
    chain_a(&logger);
    chain_a(&logger);

    let docs = parse_documents(&buffer.contents());
    assert_eq!(docs.len(), 2);
    for doc in &docs {
        assert_eq!(doc["message"].as_str(), Some("a"));
        assert_eq!(doc["log_level"].as_str(), Some("INFO"));
        assert_eq!(doc["method"].as_str(), Some("chain_a"));
        assert_eq!(doc["path"].as_str(), Some("tree_tests.rs"));
        assert_eq!(doc["children"][0]["message"].as_str(), Some("b"));
        assert_eq!(doc["children"][0]["children"][0]["message"].as_str(), Some("c"));
    }
}

#[test]
fn test_path_names_declaring_type() {
    let (logger, buffer) = common::memory_logger(
        "path",
        nestlog_core::SinkSettings {
            line_template: nestlog_core::LineTemplate::new("$path$ $method$ $message$"),
            ..common::message_only(LogStyle::Line)
        },
    );
    let logs = ComplexLogs1 { logger };
    logs.h();

    let tree = parse_tree(&buffer.contents());
    assert_eq!(tree[0].log, "tree_tests.rs.ComplexLogs1 h H METHOD 1");
}

#[test]
fn test_manual_directives_in_one_method() {
    let (logger, buffer) = line_logger("manual");

    logger.warn_with("abc", ManualDepth::Increase).unwrap();
    logger.error_with("child_msg_1", ManualDepth::Increase).unwrap();
    logger.critical("child_msg_2").unwrap();
    logger.warn_with("child_msg_3", ManualDepth::Increase).unwrap();
    logger.info_with("child_msg_2", ManualDepth::Decrease).unwrap();

    let tree = parse_tree(&buffer.contents());
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].log, "abc");

    let children = &tree[0].children;
    assert_eq!(children.len(), 3);
    assert_eq!(children[0].log, "child_msg_1");
    assert_eq!(children[1].log, "child_msg_2");
    assert_eq!(children[1].children.len(), 1);
    assert_eq!(children[1].children[0].log, "child_msg_3");
    assert_eq!(children[2].log, "child_msg_2");
}

#[test]
fn test_increase_then_decrease_depth() {
    let (logger, buffer) = line_logger("xyzw");

    logger.info("X").unwrap();
    logger.increase_depth().unwrap();
    logger.error("Y").unwrap();
    logger.increase_depth().unwrap();
    logger.critical("Z").unwrap();
    logger.decrease_depth(2).unwrap();
    logger.error("W").unwrap();

    let tree = parse_tree(&buffer.contents());
    assert_eq!(tree.len(), 2);
    assert_eq!(tree[0].log, "X");
    assert_eq!(tree[0].children[0].log, "Y");
    assert_eq!(tree[0].children[0].children[0].log, "Z");
    assert_eq!(tree[1].log, "W");
    assert!(tree[1].children.is_empty());
}

#[test]
fn test_decrease_depth_zero_is_noop() {
    let (logger, buffer) = line_logger("noop");

    logger.info("X").unwrap();
    logger.increase_depth().unwrap();
    logger.info("Y").unwrap();
    logger.decrease_depth(0).unwrap();
    logger.info("Z").unwrap();

    let tree = parse_tree(&buffer.contents());
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].children.len(), 2);
}

#[test]
fn test_multiline_messages_survive() {
    let (logger, buffer) = line_logger("multiline");
    let first = "\nabc\nqwer";
    let second = "child_msg_1\nqwer\n\nq\n";

    logger.warn_with(first, ManualDepth::Increase).unwrap();
    logger.error_with(second, ManualDepth::Increase).unwrap();

    let tree = parse_tree(&buffer.contents());
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].log, first);
    assert_eq!(tree[0].children[0].log, second);
}

#[test]
fn test_escaped_messages_survive() {
    let messages = ["\x1b[31mred\x1b[0m", "a\r\nb", "0b101", "yes", "~"];

    for style in [LogStyle::Line, LogStyle::Yaml] {
        let (logger, buffer) = common::memory_logger("escaped", common::message_only(style));
        for message in messages {
            logger.info(message).unwrap();
        }

        let contents = buffer.contents();
        let loaded: Vec<String> = match style {
            LogStyle::Line => parse_tree(&contents).into_iter().map(|node| node.log).collect(),
            LogStyle::Yaml => parse_documents(&contents)
                .iter()
                .map(|doc| doc["message"].as_str().unwrap().to_string())
                .collect(),
        };
        assert_eq!(loaded, messages, "style {}", style);
    }
}

#[test]
fn test_each_sink_tracks_its_own_tree() {
    let (logger, verbose) = line_logger("two-sinks");
    let (quiet_sink, quiet) = nestlog_core::Sink::memory(nestlog_core::SinkSettings {
        level: nestlog_core::Level::Warn,
        ..common::message_only(LogStyle::Line)
    });
    logger.add_sink(Arc::new(quiet_sink));

    chain_a(&logger);
    logger.warn("after").unwrap();

    let verbose_tree = parse_tree(&verbose.contents());
    assert_eq!(verbose_tree.len(), 2);
    assert_eq!(verbose_tree[0].count(), 3);

    let quiet_tree = parse_tree(&quiet.contents());
    assert_eq!(quiet_tree.len(), 1);
    assert_eq!(quiet_tree[0].log, "after");
}

#[test]
fn test_macros_format_messages() {
    let (logger, buffer) = line_logger("macros");
    nestlog_core::log_info!(logger, "value={}", 7).unwrap();
    nestlog_core::log_error!(logger, "{} failed", "step").unwrap();

    let tree = parse_tree(&buffer.contents());
    assert_eq!(tree[0].log, "value=7");
    assert_eq!(tree[1].log, "step failed");
}
