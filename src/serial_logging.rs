//! Serial logging with a build-time selected tier.
//!
//! | level | `log` / `logln` | `debug` / `debugln` / buffer fill |
//! |-------|-----------------|-----------------------------------|
//! | 0     | off             | off                               |
//! | 1     | on              | off                               |
//! | >= 2  | on              | on                                |
//!
//! The tier is a const generic on [`SerialLogger`], so a disabled call is an
//! `if false` on a constant and leaves no code behind. [`Logger`] is the
//! logger for the tier selected by [`DEBUG_LEVEL`].
//!
//! ```ignore
//! let mut out = Logger::new(uart);
//! logln!(out, "bad command: {:?}", err);
//! buffer_fill!(out);
//! ```

use core::fmt;

use crate::config::{DEBUG_LEVEL, SERIAL_RX_CAPACITY};

/// Line terminator appended by the `*ln` variants.
pub const NEWLINE: &str = "\r\n";

/// The platform print primitive plus the input buffer occupancy.
pub trait SerialOut: fmt::Write {
    /// Number of bytes currently waiting to be read.
    fn available(&self) -> usize;
}

impl<T: SerialOut + ?Sized> SerialOut for &mut T {
    fn available(&self) -> usize {
        (**self).available()
    }
}

/// Gives a plain writer the [`SerialOut`] occupancy query.
///
/// The count is whatever the owner last recorded with
/// [`record_read`](Self::record_read): the bytes one read took out of the
/// receive ring, i.e. what was waiting at that moment. It is capped at
/// [`SERIAL_RX_CAPACITY`], the size the report is measured against.
pub struct RxGauge<W> {
    writer: W,
    pending: usize,
}

impl<W> RxGauge<W> {
    pub const fn new(writer: W) -> Self {
        Self { writer, pending: 0 }
    }

    pub fn record_read(&mut self, bytes: usize) {
        self.pending = bytes.min(SERIAL_RX_CAPACITY);
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: fmt::Write> fmt::Write for RxGauge<W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.writer.write_str(s)
    }
}

impl<W: fmt::Write> SerialOut for RxGauge<W> {
    fn available(&self) -> usize {
        self.pending
    }
}

pub struct SerialLogger<S, const LEVEL: u8> {
    serial: S,
}

/// Logger at the build-time [`DEBUG_LEVEL`].
pub type Logger<S> = SerialLogger<S, { DEBUG_LEVEL }>;

impl<S, const LEVEL: u8> SerialLogger<S, LEVEL> {
    pub const LOG_ENABLED: bool = LEVEL >= 1;
    pub const DEBUG_ENABLED: bool = LEVEL >= 2;

    pub const fn new(serial: S) -> Self {
        Self { serial }
    }

    pub fn serial(&self) -> &S {
        &self.serial
    }

    /// Direct access for non-log traffic on the same port, e.g. frames.
    pub fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }

    pub fn into_inner(self) -> S {
        self.serial
    }
}

impl<S: SerialOut, const LEVEL: u8> SerialLogger<S, LEVEL> {
    #[inline(always)]
    pub fn log(&mut self, args: fmt::Arguments<'_>) {
        if Self::LOG_ENABLED {
            self.print(args);
        }
    }

    #[inline(always)]
    pub fn logln(&mut self, args: fmt::Arguments<'_>) {
        if Self::LOG_ENABLED {
            self.println(args);
        }
    }

    #[inline(always)]
    pub fn debug(&mut self, args: fmt::Arguments<'_>) {
        if Self::DEBUG_ENABLED {
            self.print(args);
        }
    }

    #[inline(always)]
    pub fn debugln(&mut self, args: fmt::Arguments<'_>) {
        if Self::DEBUG_ENABLED {
            self.println(args);
        }
    }

    /// Emit `buf: <available>/64` on the debug tier.
    #[inline(always)]
    pub fn report_buffer_fill(&mut self) {
        if Self::DEBUG_ENABLED {
            let available = self.serial.available();
            self.debug(format_args!("buf: "));
            self.debug(format_args!("{}", available));
            self.debugln(format_args!("/{}", SERIAL_RX_CAPACITY));
        }
    }

    // Write errors are dropped: nothing downstream can act on them.
    fn print(&mut self, args: fmt::Arguments<'_>) {
        let _ = self.serial.write_fmt(args);
    }

    fn println(&mut self, args: fmt::Arguments<'_>) {
        let _ = self.serial.write_fmt(args);
        let _ = self.serial.write_str(NEWLINE);
    }
}

/// Print on the log tier: `log!(logger, "fmt", args..)`.
#[macro_export]
macro_rules! log {
    ($logger:expr, $($arg:tt)*) => {
        $logger.log(::core::format_args!($($arg)*))
    };
}

/// Print a line on the log tier.
#[macro_export]
macro_rules! logln {
    ($logger:expr) => {
        $logger.logln(::core::format_args!(""))
    };
    ($logger:expr, $($arg:tt)*) => {
        $logger.logln(::core::format_args!($($arg)*))
    };
}

/// Print on the debug tier.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(::core::format_args!($($arg)*))
    };
}

/// Print a line on the debug tier.
#[macro_export]
macro_rules! debugln {
    ($logger:expr) => {
        $logger.debugln(::core::format_args!(""))
    };
    ($logger:expr, $($arg:tt)*) => {
        $logger.debugln(::core::format_args!($($arg)*))
    };
}

/// Report serial input buffer occupancy on the debug tier.
#[macro_export]
macro_rules! buffer_fill {
    ($logger:expr) => {
        $logger.report_buffer_fill()
    };
}
