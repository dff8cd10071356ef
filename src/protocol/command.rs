//! Command line builder

use core::fmt::{self, Write};

use heapless::String;

use super::numeric;
use crate::config::COMMAND_LINE_SIZE;
use crate::error::{Error, Result};
use crate::types::Scale;

/// One outgoing command or query line, without the terminator
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Command {
    buffer: String<COMMAND_LINE_SIZE>,
}

impl Command {
    /// Create an empty command
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    /// Build a command from format arguments
    pub fn from_args(args: fmt::Arguments<'_>) -> Result<Self> {
        let mut cmd = Self::new();
        cmd.buffer.write_fmt(args)?;
        Ok(cmd)
    }

    /// Append text
    pub fn push_str(&mut self, text: &str) -> Result<&mut Self> {
        self.buffer.push_str(text).map_err(|()| Error::Format)?;
        Ok(self)
    }

    /// Append a `0`/`1` flag
    pub fn push_bool(&mut self, value: bool) -> Result<&mut Self> {
        self.push_str(if value { "1" } else { "0" })
    }

    /// Append a value in scientific form
    pub fn push_scientific(&mut self, value: f32) -> Result<&mut Self> {
        let token = numeric::format_scientific(value)?;
        self.push_str(&token)
    }

    /// Append a 1-2-5 scale in scientific form
    pub fn push_scale(&mut self, scale: Scale) -> Result<&mut Self> {
        let token = numeric::format_scale(scale)?;
        self.push_str(&token)
    }

    /// Command text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.buffer
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.buffer)
    }
}
