//! Output format options
//!
//! Everything a sink needs to know to render an entry: style, date pattern,
//! YAML element selection and the line template. [`SinkSettings`] bundles them
//! together with the level threshold and the debug flag.

use std::fmt;
use std::str::FromStr;

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};
use crate::level::Level;

/// Output serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogStyle {
    /// One YAML document per root entry, one key per element
    Yaml,
    /// A YAML sequence of `log:` lines built from the line template
    #[default]
    Line,
}

impl LogStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStyle::Yaml => "yaml",
            LogStyle::Line => "line",
        }
    }
}

impl fmt::Display for LogStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "yaml" => Ok(LogStyle::Yaml),
            "line" => Ok(LogStyle::Line),
            _ => Err(Error::config(format!("[{}] is not valid log style", s))),
        }
    }
}

impl<'de> Deserialize<'de> for LogStyle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// A field of a rendered entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogElement {
    Date,
    LogLevel,
    Path,
    Method,
    LineNumber,
    Message,
}

impl LogElement {
    pub const ALL: [LogElement; 6] = [
        LogElement::Date,
        LogElement::LogLevel,
        LogElement::Path,
        LogElement::Method,
        LogElement::LineNumber,
        LogElement::Message,
    ];

    /// Key used in YAML style
    pub fn key(&self) -> &'static str {
        match self {
            LogElement::Date => "date",
            LogElement::LogLevel => "log_level",
            LogElement::Path => "path",
            LogElement::Method => "method",
            LogElement::LineNumber => "line_number",
            LogElement::Message => "message",
        }
    }

    /// Placeholder used in line templates
    pub fn placeholder(&self) -> &'static str {
        match self {
            LogElement::Date => "$date$",
            LogElement::LogLevel => "$log_level$",
            LogElement::Path => "$path$",
            LogElement::Method => "$method$",
            LogElement::LineNumber => "$line_number$",
            LogElement::Message => "$message$",
        }
    }
}

impl fmt::Display for LogElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for LogElement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_lowercase();
        LogElement::ALL
            .into_iter()
            .find(|element| element.key() == key)
            .ok_or_else(|| Error::config(format!("[{}] is not valid yaml element", s)))
    }
}

/// Ordered, de-duplicated, non-empty selection of YAML elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YamlElements(Vec<LogElement>);

impl YamlElements {
    pub fn new(elements: impl IntoIterator<Item = LogElement>) -> Result<Self> {
        let mut selected: Vec<LogElement> = Vec::new();
        for element in elements {
            if !selected.contains(&element) {
                selected.push(element);
            }
        }
        if selected.is_empty() {
            return Err(Error::config("yaml elements must not be empty"));
        }
        Ok(Self(selected))
    }

    pub fn iter(&self) -> impl Iterator<Item = LogElement> + '_ {
        self.0.iter().copied()
    }

    pub fn contains(&self, element: LogElement) -> bool {
        self.0.contains(&element)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for YamlElements {
    fn default() -> Self {
        Self(LogElement::ALL.to_vec())
    }
}

impl<'de> Deserialize<'de> for YamlElements {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        let elements = names
            .iter()
            .map(|name| name.parse::<LogElement>())
            .collect::<Result<Vec<_>>>()
            .map_err(serde::de::Error::custom)?;
        YamlElements::new(elements).map_err(serde::de::Error::custom)
    }
}

/// Validated strftime pattern for the `date` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat(String);

impl DateFormat {
    pub const DEFAULT: &'static str = "%Y-%m-%d %H:%M:%S%.6f";

    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            return Err(Error::config(format!("[{}] is not valid date format", pattern)));
        }
        Ok(Self(pattern))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render the current local time
    pub fn now(&self) -> String {
        chrono::Local::now().format(&self.0).to_string()
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl<'de> Deserialize<'de> for DateFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let pattern = String::deserialize(deserializer)?;
        DateFormat::new(pattern).map_err(serde::de::Error::custom)
    }
}

/// Template for line style entries, using `$element$` placeholders
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct LineTemplate(String);

impl LineTemplate {
    pub const DEFAULT: &'static str =
        "$date$ [$log_level$] [$path$.$method$:$line_number$] $message$";

    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitute placeholders in a single pass
    ///
    /// Substituted values are never rescanned, so a message that itself
    /// contains `$date$` is emitted verbatim.
    pub fn fill(&self, value_of: impl Fn(LogElement) -> String) -> String {
        let mut out = String::with_capacity(self.0.len() + 64);
        let mut rest = self.0.as_str();

        'scan: while let Some(start) = rest.find('$') {
            for element in LogElement::ALL {
                if rest[start..].starts_with(element.placeholder()) {
                    out.push_str(&rest[..start]);
                    out.push_str(&value_of(element));
                    rest = &rest[start + element.placeholder().len()..];
                    continue 'scan;
                }
            }
            out.push_str(&rest[..=start]);
            rest = &rest[start + 1..];
        }
        out.push_str(rest);
        out
    }
}

impl Default for LineTemplate {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

/// Settings of one sink
///
/// New sinks copy a `SinkSettings` value at construction; nothing is shared.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SinkSettings {
    pub level: Level,
    pub style: LogStyle,
    pub date_format: DateFormat,
    pub yaml_elements: YamlElements,
    pub line_template: LineTemplate,
    pub debug: bool,
}
