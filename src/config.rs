// Centralize all configuration constants

/* ───── Channels ──────────────────────────────────────────────────── */
pub const NR_OF_CHANNELS: usize = 2;

/// Marker that opens every outgoing frame. DAC values are 12 bit, so this
/// pattern can never be mistaken for a value word.
pub const SYNC_WORD: u16 = 0xAAAA;

/// Full scale of the 12-bit DACs.
pub const DAC_MAX: u16 = 0x0FFF;

/// Chip-select header position per channel, in channel order.
pub const CHANNEL_SELECT_PINS: [i8; NR_OF_CHANNELS] = [10, 9];

const _: () = assert!(NR_OF_CHANNELS >= 1);

/* ───── Serial link ───────────────────────────────────────────────── */
pub const UART_BAUDRATE: u32 = 256_000;
/// Capacity of the serial input buffer, reported by the buffer-fill line.
pub const SERIAL_RX_CAPACITY: usize = 64;
pub const SERIAL_TX_CAPACITY: usize = 128;

pub const SPI_FREQUENCY_HZ: u32 = 1_000_000;

/* ───── Timing ────────────────────────────────────────────────────── */
pub const FRAME_RATE_HZ: u32 = 50;
pub const FRAME_PERIOD_MS: u64 = 1000 / FRAME_RATE_HZ as u64;

// Channel sizes
pub const DAC_CHANNEL_SIZE: usize = 8;

/* ───── Serial logging tier ───────────────────────────────────────── */

const FEATURE_DEBUG_LEVEL: u8 = if cfg!(feature = "debug-level-2") {
    2
} else if cfg!(feature = "debug-level-1") {
    1
} else {
    0
};

/// Serial logging tier, fixed at build time.
///
/// The higher of the `debug-level-*` cargo features and the `DEBUG_LEVEL`
/// environment variable seen by the compiler. Unset, negative or non-numeric
/// values count as 0.
pub const DEBUG_LEVEL: u8 = max(
    FEATURE_DEBUG_LEVEL,
    parse_level(option_env!("DEBUG_LEVEL")),
);

pub(crate) const fn parse_level(raw: Option<&str>) -> u8 {
    let bytes = match raw {
        Some(s) => s.as_bytes(),
        None => return 0,
    };
    if bytes.is_empty() {
        return 0;
    }

    let mut level: u8 = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        // also rejects a leading '-'
        if !b.is_ascii_digit() {
            return 0;
        }
        level = level.saturating_mul(10).saturating_add(b - b'0');
        i += 1;
    }
    level
}

const fn max(a: u8, b: u8) -> u8 {
    if a > b {
        a
    } else {
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parsing() {
        assert_eq!(parse_level(None), 0);
        assert_eq!(parse_level(Some("")), 0);
        assert_eq!(parse_level(Some("1")), 1);
        assert_eq!(parse_level(Some("2")), 2);
        assert_eq!(parse_level(Some("-2")), 0);
        assert_eq!(parse_level(Some("two")), 0);
        assert_eq!(parse_level(Some("999")), u8::MAX);
    }

    #[test]
    fn feature_level_is_a_floor() {
        assert!(DEBUG_LEVEL >= FEATURE_DEBUG_LEVEL);
    }

    #[test]
    fn frame_period() {
        assert_eq!(FRAME_PERIOD_MS, 20);
    }
}
