//! Channel records and the outgoing frame layout.
//!
//! Wire format of a [`Message`], little-endian:
//!
//! ```text
//! | sync (2) | value[0] (2) | ... | value[N-1] (2) |
//! ```
//!
//! `N` is [`NR_OF_CHANNELS`]; with two channels a frame is 6 bytes.

use bytemuck::{Pod, Zeroable};

use crate::config::{DAC_MAX, NR_OF_CHANNELS, SYNC_WORD};

/// Pin sentinel for a channel without a chip select.
pub const UNASSIGNED_PIN: i8 = -1;

/// Encoded size of one [`Message`].
pub const FRAME_LEN: usize = 2 + 2 * NR_OF_CHANNELS;

const _: () = assert!(FRAME_LEN == core::mem::size_of::<Message>());

/// One physical output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Channel {
    pub select_pin: i8,
    pub value: u16,
}

impl Channel {
    pub const fn new(select_pin: i8) -> Self {
        Self {
            select_pin,
            value: 0,
        }
    }

    pub const fn unassigned() -> Self {
        Self::new(UNASSIGNED_PIN)
    }

    pub const fn is_assigned(&self) -> bool {
        self.select_pin >= 0
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self::unassigned()
    }
}

/// Wire-format packet: one sync word plus one value per channel.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Zeroable, Pod)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Message {
    pub sync: u16,
    pub values: [u16; NR_OF_CHANNELS],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Fewer than [`FRAME_LEN`] bytes available.
    Truncated,
    /// The leading word was not [`SYNC_WORD`].
    BadSync(u16),
}

impl Message {
    pub const fn new(values: [u16; NR_OF_CHANNELS]) -> Self {
        Self {
            sync: SYNC_WORD,
            values,
        }
    }

    pub fn to_bytes(&self) -> [u8; FRAME_LEN] {
        let wire = Message {
            sync: self.sync.to_le(),
            values: self.values.map(u16::to_le),
        };
        let mut out = [0u8; FRAME_LEN];
        out.copy_from_slice(bytemuck::bytes_of(&wire));
        out
    }

    /// Encode into the front of `buf`, returning the number of bytes written.
    pub fn write_to(&self, buf: &mut [u8]) -> Result<usize, FrameError> {
        let dst = buf.get_mut(..FRAME_LEN).ok_or(FrameError::Truncated)?;
        dst.copy_from_slice(&self.to_bytes());
        Ok(FRAME_LEN)
    }

    /// Decode the first [`FRAME_LEN`] bytes of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FrameError> {
        let raw = bytes.get(..FRAME_LEN).ok_or(FrameError::Truncated)?;
        let wire: Message = bytemuck::pod_read_unaligned(raw);
        let msg = Message {
            sync: u16::from_le(wire.sync),
            values: wire.values.map(u16::from_le),
        };
        if msg.sync != SYNC_WORD {
            return Err(FrameError::BadSync(msg.sync));
        }
        Ok(msg)
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::new([0; NR_OF_CHANNELS])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelError {
    UnassignedPin { channel: usize },
    DuplicatePin { pin: i8 },
    UnknownChannel { channel: usize },
}

/// A validated update, see [`ChannelBank::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Applied {
    pub index: usize,
    pub channel: Channel,
    pub requested: u16,
}

impl Applied {
    pub fn is_clamped(&self) -> bool {
        self.channel.value != self.requested
    }
}

/// All configured channels, in frame order.
///
/// Construction checks the pin map once, so every later update can rely on
/// each channel owning a distinct chip select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelBank {
    channels: [Channel; NR_OF_CHANNELS],
}

impl ChannelBank {
    pub fn new(pins: [i8; NR_OF_CHANNELS]) -> Result<Self, ChannelError> {
        for (channel, &pin) in pins.iter().enumerate() {
            if pin < 0 {
                return Err(ChannelError::UnassignedPin { channel });
            }
            if pins[..channel].contains(&pin) {
                return Err(ChannelError::DuplicatePin { pin });
            }
        }
        info!("channel bank ready: {} channel(s)", NR_OF_CHANNELS);
        Ok(Self {
            channels: pins.map(Channel::new),
        })
    }

    pub fn channels(&self) -> &[Channel; NR_OF_CHANNELS] {
        &self.channels
    }

    pub fn get(&self, channel: usize) -> Option<&Channel> {
        self.channels.get(channel)
    }

    /// Validate an update and clamp it to the DAC range without storing it.
    pub fn check(&self, channel: usize, value: u16) -> Result<Applied, ChannelError> {
        let current = self
            .channels
            .get(channel)
            .ok_or(ChannelError::UnknownChannel { channel })?;
        Ok(Applied {
            index: channel,
            channel: Channel {
                select_pin: current.select_pin,
                value: value.min(DAC_MAX),
            },
            requested: value,
        })
    }

    /// Store an update previously returned by [`check`](Self::check).
    pub fn commit(&mut self, applied: &Applied) {
        if let Some(slot) = self.channels.get_mut(applied.index) {
            slot.value = applied.channel.value;
        }
    }

    /// [`check`](Self::check) then [`commit`](Self::commit).
    pub fn set(&mut self, channel: usize, value: u16) -> Result<Applied, ChannelError> {
        let applied = self.check(channel, value)?;
        self.commit(&applied);
        Ok(applied)
    }

    pub fn snapshot(&self) -> Message {
        Message::new(self.channels.map(|c| c.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_layout_is_little_endian() {
        let msg = Message::new([100, 4095]);
        assert_eq!(msg.to_bytes(), [0xAA, 0xAA, 0x64, 0x00, 0xFF, 0x0F]);
        assert_eq!(FRAME_LEN, 6);
    }

    #[test]
    fn decode_restores_every_field() {
        let msg = Message::new([0x0123, 0x0ABC]);
        let decoded = Message::from_bytes(&msg.to_bytes()).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(decoded.values.len(), NR_OF_CHANNELS);
    }

    #[test]
    fn decode_rejects_short_and_unsynced_input() {
        assert_eq!(
            Message::from_bytes(&[0xAA, 0xAA, 0x01]),
            Err(FrameError::Truncated)
        );
        assert_eq!(
            Message::from_bytes(&[0x55, 0xAA, 0, 0, 0, 0]),
            Err(FrameError::BadSync(0xAA55))
        );
    }

    #[test]
    fn write_to_needs_room() {
        let msg = Message::new([1, 2]);
        let mut small = [0u8; FRAME_LEN - 1];
        assert_eq!(msg.write_to(&mut small), Err(FrameError::Truncated));

        let mut buf = [0u8; 16];
        assert_eq!(msg.write_to(&mut buf), Ok(FRAME_LEN));
        assert_eq!(&buf[..FRAME_LEN], &msg.to_bytes());
        assert!(buf[FRAME_LEN..].iter().all(|&b| b == 0));
    }

    #[test]
    fn bank_validates_pin_map() {
        assert!(ChannelBank::new([10, 9]).is_ok());
        assert_eq!(
            ChannelBank::new([10, UNASSIGNED_PIN]),
            Err(ChannelError::UnassignedPin { channel: 1 })
        );
        assert_eq!(
            ChannelBank::new([7, 7]),
            Err(ChannelError::DuplicatePin { pin: 7 })
        );
    }

    #[test]
    fn bank_set_clamps_and_snapshots() {
        let mut bank = ChannelBank::new([10, 9]).unwrap();

        let applied = bank.set(0, 100).unwrap();
        assert!(!applied.is_clamped());
        assert_eq!(applied.channel, Channel { select_pin: 10, value: 100 });

        let applied = bank.set(1, 5000).unwrap();
        assert!(applied.is_clamped());
        assert_eq!(applied.channel.value, DAC_MAX);

        assert_eq!(
            bank.set(NR_OF_CHANNELS, 1),
            Err(ChannelError::UnknownChannel { channel: NR_OF_CHANNELS })
        );

        assert_eq!(bank.snapshot(), Message::new([100, 4095]));
    }

    #[test]
    fn check_leaves_bank_untouched_until_commit() {
        let mut bank = ChannelBank::new([10, 9]).unwrap();
        let applied = bank.check(1, 9000).unwrap();
        assert_eq!(applied.index, 1);
        assert_eq!(applied.channel, Channel { select_pin: 9, value: DAC_MAX });
        assert_eq!(bank.snapshot(), Message::new([0, 0]));

        bank.commit(&applied);
        assert_eq!(bank.snapshot(), Message::new([0, DAC_MAX]));
        assert_eq!(
            bank.check(2, 1),
            Err(ChannelError::UnknownChannel { channel: 2 })
        );
    }

    #[test]
    fn default_channel_is_unassigned() {
        let ch = Channel::default();
        assert!(!ch.is_assigned());
        assert_eq!(ch.value, 0);
        assert!(Channel::new(0).is_assigned());
    }
}
