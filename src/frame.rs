//! Receiver side framing: recover [`Message`]s from a continuous byte stream.
//!
//! The decoder locks onto the little-endian [`SYNC_WORD`] and only accepts a
//! frame whose values are all within the 12-bit DAC range. A rejected
//! candidate costs one byte, after which the search resumes on the bytes
//! already buffered.

use heapless::Vec;

use crate::channels::{Message, FRAME_LEN};
use crate::config::{DAC_MAX, SYNC_WORD};

const SYNC_BYTES: [u8; 2] = SYNC_WORD.to_le_bytes();

pub struct FrameDecoder {
    // never full between calls: a complete frame is emitted or shortened
    buf: Vec<u8, FRAME_LEN>,
    skipped: usize,
}

impl FrameDecoder {
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            skipped: 0,
        }
    }

    /// Bytes discarded while searching for a sync word.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn reset(&mut self) {
        self.buf.clear();
        self.skipped = 0;
    }

    pub fn push(&mut self, byte: u8) -> Option<Message> {
        if self.buf.push(byte).is_err() {
            self.drop_front();
            let _ = self.buf.push(byte);
        }
        self.realign();

        if self.buf.len() < FRAME_LEN {
            return None;
        }

        match Message::from_bytes(&self.buf) {
            Ok(msg) if msg.values.iter().all(|&v| v <= DAC_MAX) => {
                self.buf.clear();
                Some(msg)
            }
            _ => {
                trace!("false sync, resuming search");
                self.drop_front();
                self.realign();
                None
            }
        }
    }

    pub fn decode<'a>(&'a mut self, bytes: &'a [u8]) -> Frames<'a> {
        Frames {
            decoder: self,
            bytes: bytes.iter(),
        }
    }

    fn drop_front(&mut self) {
        if !self.buf.is_empty() {
            self.buf.remove(0);
            self.skipped += 1;
        }
    }

    /// Discard leading bytes until the buffer could start a frame.
    fn realign(&mut self) {
        loop {
            let n = self.buf.len().min(SYNC_BYTES.len());
            if self.buf[..n] == SYNC_BYTES[..n] {
                return;
            }
            self.drop_front();
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Frames<'a> {
    decoder: &'a mut FrameDecoder,
    bytes: core::slice::Iter<'a, u8>,
}

impl Iterator for Frames<'_> {
    type Item = Message;

    fn next(&mut self) -> Option<Message> {
        for &byte in self.bytes.by_ref() {
            if let Some(msg) = self.decoder.push(byte) {
                return Some(msg);
            }
        }
        None
    }
}
