//! Entry rendering
//!
//! Turns a [`Decision`] plus the entry's metadata into one text fragment.
//! Both styles produce YAML: line style is a single sequence of `log:`
//! mappings, YAML style is a stream of documents, one per root entry.
//! Nesting is expressed with `children:` keys, four columns per level.
//!
//! A single-line value is written plain only when `serde_yaml` would emit it
//! plain itself. Other printable text, multi-line messages included, becomes
//! a literal block scalar. Carriage returns and other control characters are
//! not allowed in block scalars, so such values are written double-quoted
//! with escapes. Either way the output loads back to the exact original
//! strings.

use crate::format::{LogElement, LogStyle, SinkSettings};
use crate::level::Level;
use crate::tracker::Decision;

const LEVEL_WIDTH: usize = 4;

/// Metadata of one log entry
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub level: Level,
    pub path: &'a str,
    pub method: &'a str,
    pub line: u32,
    pub message: &'a str,
}

pub struct Renderer<'a> {
    settings: &'a SinkSettings,
}

impl<'a> Renderer<'a> {
    pub fn new(settings: &'a SinkSettings) -> Self {
        Self { settings }
    }

    /// Render an entry stamped with the current local time
    pub fn render(&self, decision: &Decision, record: &Record<'_>) -> String {
        self.render_at(decision, record, &self.settings.date_format.now())
    }

    /// Render an entry with an explicit date string
    pub fn render_at(&self, decision: &Decision, record: &Record<'_>, date: &str) -> String {
        match self.settings.style {
            LogStyle::Line => self.render_line(decision, record, date),
            LogStyle::Yaml => self.render_yaml(decision, record, date),
        }
    }

    fn render_line(&self, decision: &Decision, record: &Record<'_>, date: &str) -> String {
        let depth = decision.depth;
        let mut out = String::new();

        if decision.nested {
            out.push_str("  ");
            out.push_str(&spaces(LEVEL_WIDTH * depth.saturating_sub(1)));
            out.push_str("children:\n");
        }

        let line = self
            .settings
            .line_template
            .fill(|element| element_value(element, record, date));
        let key = format!("{}- log:", spaces(LEVEL_WIDTH * depth));
        push_field(&mut out, &key, &line, LEVEL_WIDTH * depth + 4);
        out
    }

    fn render_yaml(&self, decision: &Decision, record: &Record<'_>, date: &str) -> String {
        let depth = decision.depth;
        let mut out = String::new();

        if decision.nested {
            out.push_str(&spaces(LEVEL_WIDTH * depth.saturating_sub(1)));
            out.push_str("children:\n");
        } else if depth == 0 {
            out.push_str("---\n");
        }

        let indent = LEVEL_WIDTH * depth;
        for (idx, element) in self.settings.yaml_elements.iter().enumerate() {
            let lead = if depth == 0 {
                String::new()
            } else if idx == 0 {
                format!("{}- ", spaces(indent - 2))
            } else {
                spaces(indent)
            };
            let key = format!("{}{}:", lead, element.key());
            let value = element_value(element, record, date);

            match element {
                // plain decimal and a fixed name, both always safe
                LogElement::LineNumber | LogElement::LogLevel => {
                    out.push_str(&key);
                    out.push(' ');
                    out.push_str(&value);
                    out.push('\n');
                }
                _ => push_field(&mut out, &key, &value, indent + 2),
            }
        }
        out
    }
}

fn element_value(element: LogElement, record: &Record<'_>, date: &str) -> String {
    match element {
        LogElement::Date => date.to_string(),
        LogElement::LogLevel => record.level.as_str().to_string(),
        LogElement::Path => record.path.to_string(),
        LogElement::Method => record.method.to_string(),
        LogElement::LineNumber => record.line.to_string(),
        LogElement::Message => record.message.to_string(),
    }
}

fn spaces(count: usize) -> String {
    " ".repeat(count)
}

/// Append `key value` as a plain, double-quoted or literal block scalar
///
/// `content_indent` is two columns past the indentation of the mapping that
/// owns `key`, which is what the explicit indentation indicator encodes.
fn push_field(out: &mut String, key: &str, value: &str, content_indent: usize) {
    out.push_str(key);
    if needs_escapes(value) {
        out.push(' ');
        out.push_str(&double_quoted(value));
        out.push('\n');
        return;
    }
    if is_plain_safe(value) {
        out.push(' ');
        out.push_str(value);
        out.push('\n');
        return;
    }

    let body = value.trim_end_matches('\n');
    let trailing = value.len() - body.len();

    let needs_indicator = body.is_empty()
        || body
            .split('\n')
            .find(|line| !line.is_empty())
            .is_some_and(|line| line.starts_with(' '));
    let chomp = match (body.is_empty(), trailing) {
        (true, 0) => "-",
        (true, _) => "+",
        (false, 0) => "-",
        (false, 1) => "",
        (false, _) => "+",
    };

    out.push_str(" |");
    if needs_indicator {
        out.push('2');
    }
    out.push_str(chomp);
    out.push('\n');

    if !body.is_empty() {
        let indent = spaces(content_indent);
        for line in body.split('\n') {
            if !line.is_empty() {
                out.push_str(&indent);
                out.push_str(line);
            }
            out.push('\n');
        }
    }

    let extra_lines = if body.is_empty() {
        trailing
    } else {
        trailing.saturating_sub(1)
    };
    for _ in 0..extra_lines {
        out.push('\n');
    }
}

/// Characters a literal block scalar cannot carry unchanged
fn is_unprintable(c: char) -> bool {
    (c.is_control() && c != '\n' && c != '\t')
        || matches!(c, '\u{2028}' | '\u{2029}' | '\u{feff}')
}

fn needs_escapes(value: &str) -> bool {
    value.chars().any(is_unprintable)
}

/// `value` as a single-line YAML double-quoted scalar
fn double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if is_unprintable(c) => out.push_str(&format!("\\u{:04X}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Whether `value` loads back as the same string when written as a plain scalar
///
/// `serde_yaml` quotes anything that would resolve to another type or clash
/// with YAML syntax, so a plain emission from it settles the question.
fn is_plain_safe(value: &str) -> bool {
    if value.is_empty() || value.contains('\n') || needs_escapes(value) {
        return false;
    }
    serde_yaml::to_string(value).is_ok_and(|emitted| emitted.strip_suffix('\n') == Some(value))
}
