//! In-memory output

use std::sync::Arc;

use parking_lot::Mutex;

use super::traits::Output;
use crate::error::Result;

/// In-memory output for testing and capture
///
/// Clones share the same buffer, so a test can keep one handle and give the
/// other to a sink.
///
/// # Example
///
/// ```
/// use nestlog_core::sink::{MemoryOutput, Output};
///
/// let buffer = MemoryOutput::new();
/// let mut output = buffer.clone();
/// output.write_fragment("- log: hello\n").unwrap();
/// assert_eq!(buffer.contents(), "- log: hello\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryOutput {
    buffer: Arc<Mutex<String>>,
}

impl MemoryOutput {
    /// Create a new empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn contents(&self) -> String {
        self.buffer.lock().clone()
    }

    /// Drain the buffer, returning its contents
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.buffer.lock())
    }

    pub fn clear(&self) {
        self.buffer.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Output for MemoryOutput {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn write_fragment(&mut self, fragment: &str) -> Result<()> {
        self.buffer.lock().push_str(fragment);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_buffer() {
        let buffer = MemoryOutput::new();
        assert!(buffer.is_empty());

        let mut writer = buffer.clone();
        writer.write_fragment("a\n").unwrap();
        writer.write_fragment("b\n").unwrap();
        assert_eq!(buffer.contents(), "a\nb\n");
        assert_eq!(buffer.len(), 4);
    }

    #[test]
    fn test_take_and_clear() {
        let buffer = MemoryOutput::new();
        buffer.clone().write_fragment("x").unwrap();
        assert_eq!(buffer.take(), "x");
        assert!(buffer.is_empty());

        buffer.clone().write_fragment("y").unwrap();
        buffer.clear();
        assert_eq!(buffer.contents(), "");
    }
}
