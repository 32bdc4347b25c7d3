//! Host link task.
//!
//! Owns the UART and the [`HostLink`]. Incoming `"ch,val"` lines are handed
//! to the DAC task through [`DacQueue`]; every frame period the current bank
//! is sent back as a binary [`Message`]. Problems are reported to the host as
//! text lines on the log tier, the buffer fill on the debug tier.
use core::fmt;

use embassy_executor::task;
use embassy_futures::select::{select, Either};
use embassy_stm32::usart::{self, BufferedUart, BufferedUartTx};
use embassy_time::{Duration, Ticker};

use crate::buffer_fill;
use crate::channels::Message;
use crate::config::{DEBUG_LEVEL, FRAME_PERIOD_MS, SERIAL_RX_CAPACITY, UART_BAUDRATE};
use crate::ipc::DacQueue;
use crate::link::HostLink;
use crate::serial_logging::{Logger, RxGauge};

/// Transmit half of the host link.
///
/// Wrapped in an [`RxGauge`], so the `buf: n/64` debug line reports how many
/// bytes the last read took out of the 64 byte RX ring.
pub struct HostTx {
    tx: BufferedUartTx<'static>,
}

impl HostTx {
    pub fn new(tx: BufferedUartTx<'static>) -> Self {
        Self { tx }
    }

    pub async fn send_frame(&mut self, msg: &Message) -> Result<(), usart::Error> {
        embedded_io_async::Write::write_all(&mut self.tx, &msg.to_bytes()).await
    }
}

impl fmt::Write for HostTx {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        embedded_io::Write::write_all(&mut self.tx, s.as_bytes()).map_err(|_| fmt::Error)
    }
}

#[task]
pub async fn serial_task(uart: BufferedUart<'static>, mut link: HostLink) {
    info!(
        "serial task started at {} baud, debug level {}",
        UART_BAUDRATE, DEBUG_LEVEL
    );
    let (tx, mut rx) = uart.split();
    let mut out = Logger::new(RxGauge::new(HostTx::new(tx)));
    let mut chunk = [0u8; SERIAL_RX_CAPACITY];
    let mut ticker = Ticker::every(Duration::from_millis(FRAME_PERIOD_MS));

    loop {
        let event = select(
            embedded_io_async::Read::read(&mut rx, &mut chunk),
            ticker.next(),
        )
        .await;

        match event {
            Either::First(Ok(n)) => {
                out.serial_mut().record_read(n);
                buffer_fill!(out);
                link.handle_chunk(&mut out, &chunk[..n], &mut DacQueue).await;
            }
            Either::First(Err(e)) => warn!("host uart read failed: {:?}", e),
            Either::Second(()) => {
                let frame = link.snapshot();
                if let Err(e) = out.serial_mut().writer_mut().send_frame(&frame).await {
                    warn!("frame write failed: {:?}", e);
                }
            }
        }
    }
}
