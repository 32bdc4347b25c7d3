use embassy_stm32::gpio::{Level, Output, Pull, Speed};
use embassy_stm32::mode::Blocking;
use embassy_stm32::spi::{self, Spi};
use embassy_stm32::time::Hertz;
use embassy_stm32::usart::{self, BufferedUart, Config as UsartConfig};
use embassy_stm32::{bind_interrupts, peripherals, rcc, Config};
use static_cell::StaticCell;

use crate::config::{
    NR_OF_CHANNELS, SERIAL_RX_CAPACITY, SERIAL_TX_CAPACITY, SPI_FREQUENCY_HZ, UART_BAUDRATE,
};
use crate::drivers::DacBank;

// ── IRQ table ─────────────────────────────────────────────
bind_interrupts!(pub struct Irqs {
    USART1 => usart::BufferedInterruptHandler<peripherals::USART1>;
});

static UART_TX_BUF: StaticCell<[u8; SERIAL_TX_CAPACITY]> = StaticCell::new();
static UART_RX_BUF: StaticCell<[u8; SERIAL_RX_CAPACITY]> = StaticCell::new();

pub type BoardDacs = DacBank<Spi<'static, Blocking>, Output<'static>, NR_OF_CHANNELS>;

// ── Board struct ──────────────────────────────────────────
pub struct Board {
    pub host_uart: BufferedUart<'static>,
    pub dac_spi: Spi<'static, Blocking>,
    /// Chip selects in channel order (header D10, D9).
    pub dac_cs: [Output<'static>; NR_OF_CHANNELS],
}

impl Board {
    pub fn init() -> Self {
        let mut config = Config::default();

        // HSI16 ➜ PLL ➜ 64MHz sysclk
        config.rcc.hsi = Some(rcc::Hsi {
            sys_div: rcc::HsiSysDiv::DIV1,
        });
        config.rcc.pll = Some(rcc::Pll {
            source: rcc::PllSource::HSI,    // 16MHz
            prediv: rcc::PllPreDiv::DIV2,   // 8MHz
            mul: rcc::PllMul::MUL16,        // 128MHz
            divp: None,
            divq: None,
            divr: Some(rcc::PllRDiv::DIV2), // 64MHz
        });
        config.rcc.sys = rcc::Sysclk::PLL1_R;
        let p = embassy_stm32::init(config);

        // Host link, interrupt driven with a 64 byte RX ring
        let mut us_cfg = UsartConfig::default();
        us_cfg.baudrate = UART_BAUDRATE;
        us_cfg.rx_pull = Pull::Up;

        let host_uart = BufferedUart::new(
            p.USART1,
            Irqs,
            p.PC5, // RX
            p.PC4, // TX
            UART_TX_BUF.init([0; SERIAL_TX_CAPACITY]),
            UART_RX_BUF.init([0; SERIAL_RX_CAPACITY]),
            us_cfg,
        )
        .unwrap();

        // SPI1, TX only: the DACs never answer
        let mut spi_cfg = spi::Config::default();
        spi_cfg.mode = spi::MODE_0;
        spi_cfg.frequency = Hertz(SPI_FREQUENCY_HZ);
        let dac_spi = Spi::new_blocking_txonly(p.SPI1, p.PA5, p.PA7, spi_cfg); // SCK, MOSI

        // Idle high; DacBank::new deselects again before first use
        let dac_cs = [
            Output::new(p.PB0, Level::High, Speed::VeryHigh), // D10
            Output::new(p.PA8, Level::High, Speed::VeryHigh), // D9
        ];

        Self {
            host_uart,
            dac_spi,
            dac_cs,
        }
    }
}
