//! Console output implementation

use std::io::Write;

use super::traits::Output;
use crate::error::Result;

/// An output that writes to stdout
#[derive(Debug, Clone, Default)]
pub struct ConsoleOutput;

impl ConsoleOutput {
    pub fn new() -> Self {
        Self
    }
}

impl Output for ConsoleOutput {
    fn describe(&self) -> String {
        "console".to_string()
    }

    fn write_fragment(&mut self, fragment: &str) -> Result<()> {
        // one locked write per fragment keeps it contiguous on the terminal
        std::io::stdout().lock().write_all(fragment.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        std::io::stdout().flush()?;
        Ok(())
    }
}
