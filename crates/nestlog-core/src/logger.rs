//! Hierarchical logger
//!
//! A [`Logger`] fans each call out to its sinks. The call stack is resolved
//! once per call and only when at least one sink will act on it; every sink
//! then applies the same frames to its own nesting state.

use std::panic::Location;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::frame::{self, Frame};
use crate::level::Level;
use crate::sink::{Entry, Sink};
use crate::tracker::ManualDepth;

const SNAPSHOT_SEPARATOR: &str = "==============";

#[derive(Debug)]
pub struct Logger {
    name: String,
    sinks: RwLock<Vec<Arc<Sink>>>,
}

impl Logger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sinks: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_sink(&self, sink: Arc<Sink>) {
        self.sinks.write().push(sink);
    }

    pub fn sinks(&self) -> Vec<Arc<Sink>> {
        self.sinks.read().clone()
    }

    /// Close every sink; later log calls fail with [`Error::SinkClosed`]
    pub fn close_sinks(&self) -> Result<()> {
        let mut first_error = None;
        for sink in self.sinks.read().iter() {
            if let Err(e) = sink.close() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    #[track_caller]
    pub fn trace(&self, message: impl AsRef<str>) -> Result<()> {
        self.log_at(Level::Trace, message.as_ref(), ManualDepth::None, Location::caller())
    }

    #[track_caller]
    pub fn debug(&self, message: impl AsRef<str>) -> Result<()> {
        self.log_at(Level::Debug, message.as_ref(), ManualDepth::None, Location::caller())
    }

    #[track_caller]
    pub fn info(&self, message: impl AsRef<str>) -> Result<()> {
        self.log_at(Level::Info, message.as_ref(), ManualDepth::None, Location::caller())
    }

    #[track_caller]
    pub fn warn(&self, message: impl AsRef<str>) -> Result<()> {
        self.log_at(Level::Warn, message.as_ref(), ManualDepth::None, Location::caller())
    }

    #[track_caller]
    pub fn error(&self, message: impl AsRef<str>) -> Result<()> {
        self.log_at(Level::Error, message.as_ref(), ManualDepth::None, Location::caller())
    }

    #[track_caller]
    pub fn critical(&self, message: impl AsRef<str>) -> Result<()> {
        self.log_at(Level::Critical, message.as_ref(), ManualDepth::None, Location::caller())
    }

    #[track_caller]
    pub fn trace_with(&self, message: impl AsRef<str>, manual: ManualDepth) -> Result<()> {
        self.log_at(Level::Trace, message.as_ref(), manual, Location::caller())
    }

    #[track_caller]
    pub fn debug_with(&self, message: impl AsRef<str>, manual: ManualDepth) -> Result<()> {
        self.log_at(Level::Debug, message.as_ref(), manual, Location::caller())
    }

    #[track_caller]
    pub fn info_with(&self, message: impl AsRef<str>, manual: ManualDepth) -> Result<()> {
        self.log_at(Level::Info, message.as_ref(), manual, Location::caller())
    }

    #[track_caller]
    pub fn warn_with(&self, message: impl AsRef<str>, manual: ManualDepth) -> Result<()> {
        self.log_at(Level::Warn, message.as_ref(), manual, Location::caller())
    }

    #[track_caller]
    pub fn error_with(&self, message: impl AsRef<str>, manual: ManualDepth) -> Result<()> {
        self.log_at(Level::Error, message.as_ref(), manual, Location::caller())
    }

    #[track_caller]
    pub fn critical_with(&self, message: impl AsRef<str>, manual: ManualDepth) -> Result<()> {
        self.log_at(Level::Critical, message.as_ref(), manual, Location::caller())
    }

    /// Log at an explicit level
    #[track_caller]
    pub fn log(&self, level: Level, message: impl AsRef<str>, manual: ManualDepth) -> Result<()> {
        self.log_at(level, message.as_ref(), manual, Location::caller())
    }

    /// Nest the next entry logged from the calling function one level deeper
    pub fn increase_depth(&self) -> Result<()> {
        let sinks = self.sinks();
        if sinks.is_empty() {
            return Ok(());
        }
        let caller = caller_frame()?;
        for sink in &sinks {
            sink.increase_depth(caller.identity().clone());
        }
        Ok(())
    }

    /// Undo up to `level` manual increases made by the calling function
    pub fn decrease_depth(&self, level: usize) -> Result<()> {
        let sinks = self.sinks();
        if level < 1 || sinks.is_empty() {
            return Ok(());
        }
        let caller = caller_frame()?;
        for sink in &sinks {
            sink.decrease_depth(caller.identity(), level);
        }
        Ok(())
    }

    /// Log the innermost frame of the live stack at TRACE
    #[track_caller]
    pub fn snapshot(&self) -> Result<()> {
        self.snapshot_with(1, ManualDepth::None)
    }

    /// Log up to `methods_depth` frames of the live stack at TRACE
    ///
    /// Each frame is listed as `Frame: {path}.{method}:{line}` followed by a
    /// separator line.
    #[track_caller]
    pub fn snapshot_with(&self, methods_depth: usize, manual: ManualDepth) -> Result<()> {
        if methods_depth == 0 {
            return Err(Error::invalid_parameter("methods_depth must be bigger than 0"));
        }
        let location = Location::caller();
        let Some(frames) = self.frames_for(Level::Trace)? else {
            return Ok(());
        };

        let mut message = String::from("Stack snapshot:");
        for frame in frames.iter().take(methods_depth) {
            let line = frame
                .line()
                .map(|line| line.to_string())
                .unwrap_or_else(|| "?".to_string());
            message.push_str(&format!(
                "\nFrame: {}.{}:{}\n{}",
                frame.path(),
                frame.method(),
                line,
                SNAPSHOT_SEPARATOR
            ));
        }

        self.dispatch(Level::Trace, &message, manual, location, &frames)
    }

    fn log_at(
        &self,
        level: Level,
        message: &str,
        manual: ManualDepth,
        location: &'static Location<'static>,
    ) -> Result<()> {
        let Some(frames) = self.frames_for(level)? else {
            return Ok(());
        };
        self.dispatch(level, message, manual, location, &frames)
    }

    /// Resolve the caller's frames, or `None` if no sink would use them
    ///
    /// Closed sinks still count so that the write reports the closure.
    fn frames_for(&self, level: Level) -> Result<Option<Vec<Frame>>> {
        let wanted = self
            .sinks
            .read()
            .iter()
            .any(|sink| sink.is_closed() || sink.accepts(level));
        if !wanted {
            return Ok(None);
        }
        frame::resolve(0).map(Some)
    }

    fn dispatch(
        &self,
        level: Level,
        message: &str,
        manual: ManualDepth,
        location: &'static Location<'static>,
        frames: &[Frame],
    ) -> Result<()> {
        let identities = frame::identities(frames);
        let entry = Entry {
            level,
            message,
            location,
            frames,
            identities: &identities,
        };

        let mut first_error = None;
        for sink in self.sinks() {
            if let Err(e) = sink.emit(&entry, manual) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

fn caller_frame() -> Result<Frame> {
    frame::resolve(0)?
        .into_iter()
        .next()
        .ok_or(Error::StackUnavailable)
}

#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $($arg:tt)*) => {
        $logger.trace(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warn(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)*) => {
        $logger.error(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_critical {
    ($logger:expr, $($arg:tt)*) => {
        $logger.critical(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::SinkSettings;

    #[test]
    fn test_logger_without_sinks() {
        let logger = Logger::new("quiet");
        assert_eq!(logger.name(), "quiet");
        assert!(logger.sinks().is_empty());
        logger.info("nobody listens").unwrap();
        logger.increase_depth().unwrap();
        logger.decrease_depth(1).unwrap();
    }

    #[test]
    fn test_filtered_level_skips_stack() {
        let logger = Logger::new("filtered");
        let settings = SinkSettings {
            level: Level::Error,
            ..SinkSettings::default()
        };
        let (sink, buffer) = Sink::memory(settings);
        logger.add_sink(Arc::new(sink));

        logger.debug("dropped").unwrap();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_snapshot_rejects_zero_depth() {
        let logger = Logger::new("snap");
        let err = logger.snapshot_with(0, ManualDepth::None).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn test_close_sinks() {
        let logger = Logger::new("closing");
        let (sink, _buffer) = Sink::memory(SinkSettings::default());
        let sink = Arc::new(sink);
        logger.add_sink(sink.clone());

        logger.close_sinks().unwrap();
        assert!(sink.is_closed());
    }
}
