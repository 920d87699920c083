//! Output trait definition

use crate::error::Result;

/// Destination stream of a sink
///
/// Implementations:
/// - `ConsoleOutput`: stdout
/// - `FileOutput`: append-only file with optional size rotation
/// - `MemoryOutput`: shared in-process buffer, mostly for tests
///
/// A sink calls these methods while holding its own lock, so
/// implementations never see concurrent calls.
pub trait Output: Send {
    /// Short description used in diagnostics, e.g. `console` or a file path
    fn describe(&self) -> String;

    /// Write one complete rendered fragment
    fn write_fragment(&mut self, fragment: &str) -> Result<()>;

    /// Flush buffered bytes, if any
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Release the stream; called once, before the sink drops the output
    fn close(&mut self) -> Result<()> {
        self.flush()
    }
}

/// Type alias for a boxed output
pub type BoxedOutput = Box<dyn Output>;
