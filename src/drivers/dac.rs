//! 12‑bit SPI DAC bank (MCP4921 family)
//! ===========================================================
//!
//! Every channel has its own DAC on a shared SPI bus, selected by a
//! dedicated chip-select line. One update is a single 16-bit command word,
//! MSB first, framed by CS low/high.

use embedded_hal::blocking::spi::Write;
use embedded_hal::digital::v2::OutputPin;

use crate::channels::Message;
use crate::config::DAC_MAX;

/* ------------------------------------------------------------------------- */
/*  Command word                                                             */
/* ------------------------------------------------------------------------- */
const CMD_CHANNEL_B: u16 = 1 << 15;
const CMD_BUFFERED: u16 = 1 << 14;
const CMD_GAIN_1X: u16 = 1 << 13;
const CMD_ACTIVE: u16 = 1 << 12;

/// DAC A, unbuffered Vref, 1x gain, output enabled.
pub const CMD_CONFIG: u16 = CMD_GAIN_1X | CMD_ACTIVE;

const _: () = assert!(CMD_CONFIG & (CMD_CHANNEL_B | CMD_BUFFERED) == 0);

#[inline]
pub fn command_word(value: u16) -> [u8; 2] {
    (CMD_CONFIG | (value & DAC_MAX)).to_be_bytes()
}

/* ------------------------------------------------------------------------- */
/*  Error enum                                                               */
/* ------------------------------------------------------------------------- */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DacError<SE, PE> {
    Spi(SE),
    Pin(PE),
    UnknownChannel(usize),
}

/* ------------------------------------------------------------------------- */
/*  Driver                                                                   */
/* ------------------------------------------------------------------------- */
pub struct DacBank<SPI, CS, const N: usize> {
    spi: SPI,
    cs: [CS; N],
}

impl<SPI, CS, SE, PE, const N: usize> DacBank<SPI, CS, N>
where
    SPI: Write<u8, Error = SE>,
    CS: OutputPin<Error = PE>,
{
    /// Takes the bus and deselects every DAC.
    pub fn new(spi: SPI, mut cs: [CS; N]) -> Result<Self, DacError<SE, PE>> {
        for pin in cs.iter_mut() {
            pin.set_high().map_err(DacError::Pin)?;
        }
        Ok(Self { spi, cs })
    }

    pub fn write(&mut self, channel: usize, value: u16) -> Result<(), DacError<SE, PE>> {
        let cs = self
            .cs
            .get_mut(channel)
            .ok_or(DacError::UnknownChannel(channel))?;
        let word = command_word(value);

        cs.set_low().map_err(DacError::Pin)?;
        let res = self.spi.write(&word).map_err(DacError::Spi);
        // release the bus even if the transfer failed
        cs.set_high().map_err(DacError::Pin)?;
        res
    }

    /// Drive every channel to the values of `msg`, in channel order.
    pub fn write_frame(&mut self, msg: &Message) -> Result<(), DacError<SE, PE>> {
        for (channel, &value) in msg.values.iter().enumerate() {
            self.write(channel, value)?;
        }
        Ok(())
    }

    pub fn release(self) -> (SPI, [CS; N]) {
        (self.spi, self.cs)
    }
}
