use embassy_executor::task;

use crate::board::BoardDacs;
use crate::ipc::DAC_CH;
use crate::link::DacUpdate;

#[task]
pub async fn dac_task(mut dacs: BoardDacs) {
    info!("dac task started");
    loop {
        let DacUpdate { channel, value } = DAC_CH.receive().await;
        match dacs.write(channel, value) {
            Ok(()) => trace!("dac {} <- {}", channel, value),
            Err(_) => error!("dac write failed on channel {}", channel),
        }
    }
}
