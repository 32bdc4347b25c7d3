#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use {defmt_rtt as _, panic_probe as _};

use dac_bridge::{
    channels::ChannelBank,
    config::{CHANNEL_SELECT_PINS, DEBUG_LEVEL, NR_OF_CHANNELS},
    drivers::DacBank,
    tasks::{dac_task, serial_task},
    Board, HostLink,
};

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!(
        "Starting dac-bridge: {} channel(s), serial debug level {}",
        NR_OF_CHANNELS, DEBUG_LEVEL
    );
    let board = Board::init();

    let bank = unwrap!(ChannelBank::new(CHANNEL_SELECT_PINS));
    let mut dacs = DacBank::new(board.dac_spi, board.dac_cs).unwrap();
    // start from a known output before the host says anything
    if dacs.write_frame(&bank.snapshot()).is_err() {
        warn!("initial DAC write failed");
    }

    spawner.spawn(dac_task(dacs)).unwrap();
    info!("DAC task spawned");

    spawner.spawn(serial_task(board.host_uart, HostLink::new(bank))).unwrap();
    info!("Serial task spawned");

    core::future::pending::<()>().await;
}
