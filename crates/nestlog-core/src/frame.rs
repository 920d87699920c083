//! Call-stack introspection
//!
//! Every log call resolves the live call stack into an ordered list of
//! [`Frame`]s, nearest caller first. The depth tracker only ever compares
//! [`FrameIdentity`] values, so an identity must be stable for a function
//! across invocations and independent of line numbers and arguments.
//!
//! Frames that belong to this library (anything compiled from its own `src/`
//! directory) and to the capture machinery are dropped, so the first returned
//! frame is always the function that called the logging API.

use std::fmt;

use crate::error::{Error, Result};

/// Stable key identifying "this call site": `{path}_{method}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameIdentity(String);

impl FrameIdentity {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FrameIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FrameIdentity {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// One resolved stack frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    identity: FrameIdentity,
    file_name: Option<String>,
    module_path: String,
    type_name: Option<String>,
    method: String,
    line: Option<u32>,
}

impl Frame {
    /// Build a frame from a demangled symbol name and optional debug info
    ///
    /// `symbol` is expected without the trailing hash, e.g.
    /// `app::worker::Worker::run`, `<app::Job as app::Task>::execute` or
    /// `app::main::{{closure}}`.
    pub fn from_symbol(symbol: &str, file: Option<&str>, line: Option<u32>) -> Self {
        let segments = split_path(symbol);

        // Closure segments stay attached to the function that owns them.
        let method_start = segments
            .iter()
            .rposition(|segment| !segment.starts_with('{'))
            .unwrap_or(0);
        let method = if segments.is_empty() {
            symbol.to_string()
        } else {
            segments[method_start..].join("::")
        };

        let type_name = method_start
            .checked_sub(1)
            .and_then(|idx| enclosing_type(segments[idx]));
        let module_end = if type_name.is_some() {
            method_start.saturating_sub(1)
        } else {
            method_start
        };
        let module_path = segments[..module_end].join("::");

        let file_name = file.map(base_name);
        let mut frame = Self {
            identity: FrameIdentity::new(String::new()),
            file_name,
            module_path,
            type_name,
            method,
            line,
        };
        frame.identity = FrameIdentity::new(format!("{}_{}", frame.path(), frame.method));
        frame
    }

    /// Frame for an address that could not be symbolized
    pub fn unresolved(ip: usize) -> Self {
        Self {
            identity: FrameIdentity::new(format!("<unknown>_{:#x}", ip)),
            file_name: None,
            module_path: String::new(),
            type_name: None,
            method: format!("{:#x}", ip),
            line: None,
        }
    }

    pub fn identity(&self) -> &FrameIdentity {
        &self.identity
    }

    /// Source file name without directories, when debug info is available
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Declaring type of an associated function (`Worker` for `Worker::run`)
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn line(&self) -> Option<u32> {
        self.line
    }

    /// Rendered path: `{file}.{Type}`, `{file}`, or the module path without debug info
    pub fn path(&self) -> String {
        let base = self
            .file_name
            .clone()
            .unwrap_or_else(|| self.module_path.clone());
        qualify(&base, self.type_name.as_deref())
    }

    /// Path for an explicit source file (the log call's `Location`), keeping this frame's type
    pub fn path_in(&self, file: &str) -> String {
        qualify(&base_name(file), self.type_name.as_deref())
    }
}

fn qualify(base: &str, type_name: Option<&str>) -> String {
    match type_name {
        Some(type_name) if base.is_empty() => type_name.to_string(),
        Some(type_name) => format!("{}.{}", base, type_name),
        None => base.to_string(),
    }
}

/// File name component of a path, accepting both separators
pub(crate) fn base_name(path: &str) -> String {
    path.rsplit(['/', '\\']).next().unwrap_or(path).to_string()
}

/// Split a symbol path on `::`, ignoring separators nested in `<...>`
fn split_path(symbol: &str) -> Vec<&str> {
    let bytes = symbol.as_bytes();
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b'<' => depth += 1,
            // `->` inside fn pointer types is not a closing bracket
            b'>' if i == 0 || bytes[i - 1] != b'-' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                segments.push(&symbol[start..i]);
                i += 2;
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    if start < symbol.len() {
        segments.push(&symbol[start..]);
    }
    segments
}

/// The self type named by a path segment, if the segment is a type
fn enclosing_type(segment: &str) -> Option<String> {
    if let Some(inner) = segment.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
        // `<path::Type as path::Trait>` or `<path::Type>`
        let self_type = inner.split(" as ").next().unwrap_or(inner).trim();
        let last = split_path(self_type).last().copied().unwrap_or(self_type);
        return Some(strip_generics(last).to_string());
    }

    let name = strip_generics(segment);
    if name.chars().next().is_some_and(|c| c.is_uppercase()) {
        Some(name.to_string())
    } else {
        None
    }
}

fn strip_generics(segment: &str) -> &str {
    segment.split('<').next().unwrap_or(segment)
}

/// Source directory of this library as it appears in debug info paths
fn source_marker() -> String {
    let this_file = file!().replace('\\', "/");
    match this_file.rfind('/') {
        Some(idx) => this_file[..=idx].to_string(),
        None => this_file,
    }
}

struct RawFrame {
    symbol: Option<String>,
    file: Option<String>,
    line: Option<u32>,
    ip: usize,
}

impl RawFrame {
    fn is_internal(&self, marker: &str) -> bool {
        match (&self.file, &self.symbol) {
            (Some(file), _) => file.contains(marker),
            (None, Some(symbol)) => {
                let crate_prefix = concat!(env!("CARGO_CRATE_NAME"), "::");
                symbol.starts_with(crate_prefix)
                    || symbol.starts_with(&format!("<{}", crate_prefix))
            }
            (None, None) => false,
        }
    }

    fn into_frame(self) -> Frame {
        match self.symbol {
            Some(symbol) => Frame::from_symbol(&symbol, self.file.as_deref(), self.line),
            None => Frame::unresolved(self.ip),
        }
    }
}

/// Capture the live call stack, nearest caller of the logging API first
///
/// Library frames are always excluded; `skip_frames` drops that many further
/// frames (for callers that wrap the logging API in their own helpers).
#[inline(never)]
pub fn resolve(skip_frames: usize) -> Result<Vec<Frame>> {
    let marker = source_marker();
    let mut raw_frames: Vec<RawFrame> = Vec::new();

    backtrace::trace(|frame| {
        let ip = frame.ip() as usize;
        let mut symbolized = false;
        backtrace::resolve_frame(frame, |symbol| {
            symbolized = true;
            raw_frames.push(RawFrame {
                symbol: symbol.name().map(|name| format!("{:#}", name)),
                file: symbol
                    .filename()
                    .map(|path| path.to_string_lossy().replace('\\', "/")),
                line: symbol.lineno(),
                ip,
            });
        });
        if !symbolized {
            raw_frames.push(RawFrame {
                symbol: None,
                file: None,
                line: None,
                ip,
            });
        }
        true
    });

    let first_internal = raw_frames
        .iter()
        .position(|frame| frame.is_internal(&marker))
        .ok_or(Error::StackUnavailable)?;
    let caller = raw_frames[first_internal..]
        .iter()
        .position(|frame| !frame.is_internal(&marker))
        .map(|offset| first_internal + offset)
        .ok_or(Error::StackUnavailable)?;

    let frames: Vec<Frame> = raw_frames
        .into_iter()
        .skip(caller + skip_frames)
        .map(RawFrame::into_frame)
        .collect();

    if frames.is_empty() {
        return Err(Error::StackUnavailable);
    }
    Ok(frames)
}

/// Identities of a resolved frame list, in the same order
pub fn identities(frames: &[Frame]) -> Vec<FrameIdentity> {
    frames.iter().map(|frame| frame.identity().clone()).collect()
}
