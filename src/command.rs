//! Host command line protocol.
//!
//! The host drives one channel per line as ASCII `"<channel>,<value>\n"`,
//! e.g. `"0,2048\n"`. A trailing `\r` and spaces around either number are
//! accepted. Blank lines are ignored.

use heapless::Vec;

use crate::config::SERIAL_RX_CAPACITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Set { channel: u8, value: u16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    Empty,
    /// No `,` separator.
    BadFormat,
    /// A field is not a number or does not fit its type.
    BadNumber,
    NotUtf8,
    /// The line did not fit the input buffer and was dropped.
    LineTooLong,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(CommandError::Empty);
        }
        let (channel, value) = line.split_once(',').ok_or(CommandError::BadFormat)?;
        let channel = channel
            .trim()
            .parse::<u8>()
            .map_err(|_| CommandError::BadNumber)?;
        let value = value
            .trim()
            .parse::<u16>()
            .map_err(|_| CommandError::BadNumber)?;
        Ok(Command::Set { channel, value })
    }

    pub fn parse_bytes(line: &[u8]) -> Result<Self, CommandError> {
        let line = core::str::from_utf8(line).map_err(|_| CommandError::NotUtf8)?;
        Self::parse(line)
    }
}

/// Assembles newline terminated commands from raw serial bytes.
pub struct LineBuffer {
    buf: Vec<u8, SERIAL_RX_CAPACITY>,
    overflowed: bool,
}

impl LineBuffer {
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            overflowed: false,
        }
    }

    /// Bytes of the current, unfinished line.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.overflowed = false;
    }

    /// Feed one byte. Returns the parse result once a line is complete.
    pub fn push(&mut self, byte: u8) -> Option<Result<Command, CommandError>> {
        if byte == b'\n' {
            if self.overflowed {
                self.clear();
                return Some(Err(CommandError::LineTooLong));
            }
            let result = match Command::parse_bytes(&self.buf) {
                Err(CommandError::Empty) => None,
                other => Some(other),
            };
            self.buf.clear();
            return result;
        }

        if !self.overflowed && self.buf.push(byte).is_err() {
            warn!("command line exceeds {} bytes, dropping", SERIAL_RX_CAPACITY);
            // drop everything up to the next newline
            self.buf.clear();
            self.overflowed = true;
        }
        None
    }

    pub fn feed<'a>(&'a mut self, bytes: &'a [u8]) -> Lines<'a> {
        Lines {
            buffer: self,
            bytes: bytes.iter(),
        }
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the commands completed by one chunk of input.
pub struct Lines<'a> {
    buffer: &'a mut LineBuffer,
    bytes: core::slice::Iter<'a, u8>,
}

impl Iterator for Lines<'_> {
    type Item = Result<Command, CommandError>;

    fn next(&mut self) -> Option<Self::Item> {
        for &byte in self.bytes.by_ref() {
            if let Some(result) = self.buffer.push(byte) {
                return Some(result);
            }
        }
        None
    }
}
