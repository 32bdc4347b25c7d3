//! Host link command handling.
//!
//! [`HostLink`] turns raw serial input into DAC updates: it assembles lines,
//! validates them against the [`ChannelBank`], reports problems on the log
//! tier and hands every accepted update to an [`UpdateQueue`]. The bank is
//! only changed once the queue has taken the update, so a frame built from
//! [`HostLink::snapshot`] never shows a value the DAC side did not receive.

use crate::channels::{Applied, ChannelBank, Message};
use crate::command::{Command, CommandError, LineBuffer};
use crate::logln;
use crate::serial_logging::{SerialLogger, SerialOut};

/// A validated, already clamped value for one DAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DacUpdate {
    pub channel: usize,
    pub value: u16,
}

impl From<&Applied> for DacUpdate {
    fn from(applied: &Applied) -> Self {
        Self {
            channel: applied.index,
            value: applied.channel.value,
        }
    }
}

/// Where accepted updates go. `send` waits for room instead of dropping.
#[allow(async_fn_in_trait)]
pub trait UpdateQueue {
    async fn send(&mut self, update: DacUpdate);
}

pub struct HostLink {
    bank: ChannelBank,
    lines: LineBuffer,
}

impl HostLink {
    pub const fn new(bank: ChannelBank) -> Self {
        Self {
            bank,
            lines: LineBuffer::new(),
        }
    }

    pub fn bank(&self) -> &ChannelBank {
        &self.bank
    }

    /// Current outputs as an outgoing frame.
    pub fn snapshot(&self) -> Message {
        self.bank.snapshot()
    }

    /// Process one chunk of received bytes.
    ///
    /// Waits on `queue` for every accepted command, so a chunk holding more
    /// commands than the queue is deep still delivers all of them in order.
    pub async fn handle_chunk<S, Q, const LEVEL: u8>(
        &mut self,
        out: &mut SerialLogger<S, LEVEL>,
        chunk: &[u8],
        queue: &mut Q,
    ) where
        S: SerialOut,
        Q: UpdateQueue,
    {
        for result in self.lines.feed(chunk) {
            let Some(applied) = check(&self.bank, out, result) else {
                continue;
            };
            queue.send(DacUpdate::from(&applied)).await;
            self.bank.commit(&applied);
        }
    }
}

fn check<S: SerialOut, const LEVEL: u8>(
    bank: &ChannelBank,
    out: &mut SerialLogger<S, LEVEL>,
    result: Result<Command, CommandError>,
) -> Option<Applied> {
    let Command::Set { channel, value } = match result {
        Ok(cmd) => cmd,
        Err(e) => {
            logln!(out, "E: {:?}", e);
            return None;
        }
    };
    match bank.check(channel as usize, value) {
        Ok(applied) => {
            if applied.is_clamped() {
                logln!(
                    out,
                    "W: ch {} value {} clamped to {}",
                    channel,
                    value,
                    applied.channel.value
                );
            }
            Some(applied)
        }
        Err(e) => {
            logln!(out, "E: {:?}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CHANNEL_SELECT_PINS, DAC_CHANNEL_SIZE, DAC_MAX};
    use embassy_futures::{block_on, join::join};
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use embassy_sync::channel::{Channel, Sender};
    use std::string::String;
    use std::vec::Vec;

    #[derive(Default)]
    struct Wire(String);

    impl core::fmt::Write for Wire {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            self.0.push_str(s);
            Ok(())
        }
    }

    impl SerialOut for Wire {
        fn available(&self) -> usize {
            0
        }
    }

    #[derive(Default)]
    struct Recorder(Vec<DacUpdate>);

    impl UpdateQueue for Recorder {
        async fn send(&mut self, update: DacUpdate) {
            self.0.push(update);
        }
    }

    struct Bounded<'a>(Sender<'a, NoopRawMutex, DacUpdate, DAC_CHANNEL_SIZE>);

    impl UpdateQueue for Bounded<'_> {
        async fn send(&mut self, update: DacUpdate) {
            self.0.send(update).await;
        }
    }

    fn link() -> HostLink {
        HostLink::new(ChannelBank::new(CHANNEL_SELECT_PINS).unwrap())
    }

    #[test]
    fn chunk_deeper_than_queue_delivers_every_update() {
        const COMMANDS: usize = 16;
        assert!(COMMANDS > DAC_CHANNEL_SIZE);

        let mut input = String::new();
        for i in 0..COMMANDS {
            input.push_str(&std::format!("{},{}\n", i % 2, i % 10));
        }
        assert_eq!(input.len(), 64);

        let queue = Channel::<NoopRawMutex, DacUpdate, DAC_CHANNEL_SIZE>::new();
        let mut link = link();
        let mut out = SerialLogger::<_, 1>::new(Wire::default());
        let mut received = Vec::new();

        block_on(join(
            link.handle_chunk(&mut out, input.as_bytes(), &mut Bounded(queue.sender())),
            async {
                for _ in 0..COMMANDS {
                    received.push(queue.receive().await);
                }
            },
        ));

        let expected: Vec<DacUpdate> = (0..COMMANDS)
            .map(|i| DacUpdate {
                channel: i % 2,
                value: (i % 10) as u16,
            })
            .collect();
        assert_eq!(received, expected);
        // last value per channel: i = 14 and i = 15
        assert_eq!(link.snapshot(), Message::new([4, 5]));
        assert!(out.serial().0.is_empty());
    }

    #[test]
    fn snapshot_follows_what_was_queued() {
        let mut link = link();
        let mut out = SerialLogger::<_, 1>::new(Wire::default());
        let mut queue = Recorder::default();

        block_on(link.handle_chunk(&mut out, b"0,100\n1,9000\n", &mut queue));

        assert_eq!(
            queue.0,
            [
                DacUpdate {
                    channel: 0,
                    value: 100
                },
                DacUpdate {
                    channel: 1,
                    value: DAC_MAX
                },
            ]
        );
        assert_eq!(link.snapshot(), Message::new([100, DAC_MAX]));
        assert_eq!(out.serial().0, "W: ch 1 value 9000 clamped to 4095\r\n");
    }

    #[test]
    fn rejected_lines_reach_neither_queue_nor_bank() {
        let mut link = link();
        let mut out = SerialLogger::<_, 1>::new(Wire::default());
        let mut queue = Recorder::default();

        block_on(link.handle_chunk(&mut out, b"5,1\nnope\n0,x\n", &mut queue));

        assert!(queue.0.is_empty());
        assert_eq!(link.snapshot(), Message::default());
        assert_eq!(
            out.serial().0,
            "E: UnknownChannel { channel: 5 }\r\nE: BadFormat\r\nE: BadNumber\r\n"
        );
    }

    #[test]
    fn silent_build_still_applies_commands() {
        let mut link = link();
        let mut out = SerialLogger::<_, 0>::new(Wire::default());
        let mut queue = Recorder::default();

        block_on(link.handle_chunk(&mut out, b"0,9000\nnope\n", &mut queue));

        assert!(out.serial().0.is_empty());
        assert_eq!(link.bank().channels()[0].value, DAC_MAX);
        assert_eq!(queue.0.len(), 1);
    }

    #[test]
    fn partial_line_waits_for_next_chunk() {
        let mut link = link();
        let mut out = SerialLogger::<_, 1>::new(Wire::default());
        let mut queue = Recorder::default();

        block_on(link.handle_chunk(&mut out, b"1,20", &mut queue));
        assert!(queue.0.is_empty());
        block_on(link.handle_chunk(&mut out, b"48\n", &mut queue));
        assert_eq!(
            queue.0,
            [DacUpdate {
                channel: 1,
                value: 2048
            }]
        );
    }
}
