//! Output sinks
//!
//! A [`Sink`] is one destination plus its private nesting state. Every entry
//! goes through decide, render and write while the sink's lock is held, so
//! threads sharing a sink can never interleave tracker updates or partial
//! fragments.

mod console;
mod file;
mod memory;
pub mod rotation;
mod traits;

pub use console::ConsoleOutput;
pub use file::FileOutput;
pub use memory::MemoryOutput;
pub use rotation::{FileSize, RotationPolicy};
pub use traits::{BoxedOutput, Output};

use std::panic::Location;
use std::path::PathBuf;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::format::{DateFormat, LineTemplate, LogStyle, SinkSettings, YamlElements};
use crate::frame::{Frame, FrameIdentity};
use crate::level::Level;
use crate::render::{Record, Renderer};
use crate::tracker::{DepthTracker, ManualDepth};

/// One log call, already resolved against the call stack
#[derive(Debug, Clone, Copy)]
pub struct Entry<'a> {
    pub level: Level,
    pub message: &'a str,
    pub location: &'static Location<'static>,
    /// Caller frames, nearest first
    pub frames: &'a [Frame],
    pub identities: &'a [FrameIdentity],
}

struct SinkState {
    settings: SinkSettings,
    tracker: DepthTracker,
    output: Option<BoxedOutput>,
}

pub struct Sink {
    description: String,
    state: Mutex<SinkState>,
}

impl std::fmt::Debug for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sink")
            .field("description", &self.description)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Sink {
    pub fn new(output: impl Output + 'static, settings: SinkSettings) -> Self {
        Self {
            description: output.describe(),
            state: Mutex::new(SinkState {
                settings,
                tracker: DepthTracker::new(),
                output: Some(Box::new(output)),
            }),
        }
    }

    /// Sink writing to stdout
    pub fn console(settings: SinkSettings) -> Self {
        Self::new(ConsoleOutput::new(), settings)
    }

    /// Sink appending to `path`, optionally rotating it
    pub fn file(
        path: impl Into<PathBuf>,
        settings: SinkSettings,
        rotation: Option<RotationPolicy>,
    ) -> Self {
        let output = FileOutput::new(path);
        match rotation {
            Some(policy) => Self::new(output.with_rotation(policy), settings),
            None => Self::new(output, settings),
        }
    }

    /// Sink writing into a shared buffer, returned alongside it
    pub fn memory(settings: SinkSettings) -> (Self, MemoryOutput) {
        let buffer = MemoryOutput::new();
        (Self::new(buffer.clone(), settings), buffer)
    }

    pub fn describe(&self) -> &str {
        &self.description
    }

    pub fn settings(&self) -> SinkSettings {
        self.state.lock().settings.clone()
    }

    pub fn level(&self) -> Level {
        self.state.lock().settings.level
    }

    /// Whether an entry at `level` passes this sink's threshold
    pub fn accepts(&self, level: Level) -> bool {
        level.passes(self.level())
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().output.is_none()
    }

    pub fn set_level(&self, level: Level) {
        self.state.lock().settings.level = level;
    }

    pub fn set_style(&self, style: LogStyle) {
        self.state.lock().settings.style = style;
    }

    pub fn set_date_format(&self, pattern: &str) -> Result<()> {
        let date_format = DateFormat::new(pattern)?;
        self.state.lock().settings.date_format = date_format;
        Ok(())
    }

    pub fn set_yaml_elements(&self, elements: YamlElements) {
        self.state.lock().settings.yaml_elements = elements;
    }

    pub fn set_line_template(&self, template: impl Into<String>) {
        self.state.lock().settings.line_template = LineTemplate::new(template);
    }

    pub fn set_debug(&self, debug: bool) {
        self.state.lock().settings.debug = debug;
    }

    /// Replace all settings at once
    pub fn set_settings(&self, settings: SinkSettings) {
        self.state.lock().settings = settings;
    }

    /// Decide, render and write one entry under the sink's lock
    pub fn emit(&self, entry: &Entry<'_>, manual: ManualDepth) -> Result<()> {
        let mut state = self.state.lock();
        let SinkState {
            settings,
            tracker,
            output,
        } = &mut *state;

        let output = output.as_mut().ok_or(Error::SinkClosed)?;
        if !entry.level.passes(settings.level) {
            return Ok(());
        }
        let caller = entry
            .frames
            .first()
            .ok_or_else(|| Error::internal("log entry without caller frame"))?;

        let decision = tracker.decide(entry.identities, manual)?;

        let message = if settings.debug {
            with_debug_trace(entry.message, entry.identities)
        } else {
            entry.message.to_string()
        };
        let path = caller.path_in(entry.location.file());
        let record = Record {
            level: entry.level,
            path: &path,
            method: caller.method(),
            line: entry.location.line(),
            message: &message,
        };

        let fragment = Renderer::new(settings).render(&decision, &record);
        output.write_fragment(&fragment)
    }

    /// Nest the next entry logged from `caller` one level deeper
    pub fn increase_depth(&self, caller: FrameIdentity) {
        self.state.lock().tracker.increase_depth(caller);
    }

    /// Undo up to `level` manual increases opened by `caller`
    pub fn decrease_depth(&self, caller: &FrameIdentity, level: usize) {
        self.state.lock().tracker.decrease_depth(caller, level);
    }

    /// Release the output and discard nesting state
    ///
    /// Writes after this return [`Error::SinkClosed`]. Closing twice is a no-op.
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.tracker.reset();
        match state.output.take() {
            Some(mut output) => output.close(),
            None => Ok(()),
        }
    }
}

/// Message with the resolved caller chain appended
fn with_debug_trace(message: &str, identities: &[FrameIdentity]) -> String {
    let mut out = String::from(message);
    out.push_str("\nnestlog DEBUG:");
    for identity in identities {
        out.push('\n');
        out.push_str(identity.as_str());
    }
    out
}
