use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex as RawMutex, channel::Channel};

use crate::config::DAC_CHANNEL_SIZE;
use crate::link::{DacUpdate, UpdateQueue};

/* serial ➜ dac */
pub static DAC_CH: Channel<RawMutex, DacUpdate, DAC_CHANNEL_SIZE> = Channel::new();

/// Sending half of [`DAC_CH`]; waits while the DAC task catches up.
pub struct DacQueue;

impl UpdateQueue for DacQueue {
    async fn send(&mut self, update: DacUpdate) {
        DAC_CH.send(update).await;
    }
}
