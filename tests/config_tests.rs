//! Configuration and Constants Tests
//!
//! Tests to verify configuration values are valid and consistent.
//! Run with: cargo test --features std --test config_tests

use scope_panel::config::*;
use scope_panel::drivers::encoder::panel_banks;
use scope_panel::protocol::framing::REPLY_FOOTER_LEN;

// =============================================================================
// Instrument Connection Tests
// =============================================================================

#[test]
fn default_instrument_endpoint() {
    assert_eq!(DEFAULT_INSTRUMENT_HOST, "169.254.254.254");
    assert_eq!(DEFAULT_INSTRUMENT_PORT, 5024);
}

#[test]
fn reply_buffers_fit() {
    assert!(REPLY_PAYLOAD_SIZE < REPLY_CHUNK_SIZE);
    assert!(REPLY_CHUNK_SIZE > REPLY_FOOTER_LEN);
    assert!(COMMAND_LINE_SIZE >= "TRIG:EDGE:LEV -1.25E-1V".len());
}

#[test]
fn settle_times_ordered() {
    // queries wait for a reply, commands only for the parser
    assert!(QUERY_SETTLE_MS > COMMAND_SETTLE_MS);
}

// =============================================================================
// Panel Configuration Tests
// =============================================================================

#[test]
fn panel_config_defaults() {
    let config = PanelConfig::new();
    assert_eq!(config.instrument_port, DEFAULT_INSTRUMENT_PORT);
    assert_eq!(config.connect_retry_secs, 30);
    assert_eq!(config.read_timeout_ms, None);
    assert_eq!(config.debounce_ms, BUTTON_DEBOUNCE_MS);
    assert_eq!(config.max_restarts, None);
    assert_eq!(config, PanelConfig::default());
}

#[test]
fn stuck_button_window_is_thirty_seconds() {
    assert_eq!(BUTTON_RELEASE_POLL_LIMIT * BUTTON_RELEASE_POLL_MS, 30_000);
}

// =============================================================================
// Expander Tests
// =============================================================================

#[test]
fn register_banks_are_split() {
    assert_eq!(registers::IODIRB - registers::IODIRA, 0x10);
    assert_eq!(registers::GPIOB - registers::GPIOA, 0x10);
    assert_eq!(registers::OLATB - registers::OLATA, 0x10);
}

#[test]
fn iocon_values() {
    assert_eq!(bringup::BUTTON_IOCON, 0xA3);
    assert_eq!(bringup::ENCODER_IOCON, 0xA2);
    // BANK bit set on both
    assert_ne!(bringup::BUTTON_IOCON & 0x80, 0);
    assert_ne!(bringup::ENCODER_IOCON & 0x80, 0);
    // MIRROR clear: each port keeps its own interrupt line
    assert_eq!(bringup::BUTTON_IOCON & 0x40, 0);
    assert_eq!(bringup::ENCODER_IOCON & 0x40, 0);
}

#[test]
fn button_columns_are_outputs() {
    assert_eq!(bringup::BUTTON_IODIRA & 0x3F, 0);
    assert_eq!(bringup::BUTTON_OLATA, 0x3F);
}

#[test]
fn bank1_port_a_skips_unused_pins() {
    // pins 0/1 have no encoder on bank 1 port A
    let used = panel_banks()[2]
        .encoders()
        .iter()
        .fold(0u8, |mask, e| mask | e.pin_mask());
    assert_eq!(used, bringup::ENCODER1_GPINTENA);
    assert_eq!(used & bringup::ENCODER1_GPPUA, 0);
}

// =============================================================================
// Encoder Tests
// =============================================================================

#[test]
fn encoder_thresholds() {
    assert_eq!(ENCODER_PPR, 24);
    assert_eq!(ENCODER_DETENT_MAX, 2);
    assert_eq!(ENCODER_SENSITIVITY, 1);
}

// =============================================================================
// Scale Limit Tests
// =============================================================================

#[test]
fn scale_limits_ordered() {
    assert!(CHANNEL_SCALE_MIN < CHANNEL_SCALE_MAX);
    assert!(TIMEBASE_SCALE_MIN_NORMAL < TIMEBASE_SCALE_MIN_ROLL);
    assert!(TIMEBASE_SCALE_MIN_ROLL < TIMEBASE_SCALE_MAX);
}

#[test]
fn trigger_limit_is_three_quarters() {
    assert!((TRIGGER_CHANNEL_LIMIT - 0.75).abs() < f32::EPSILON);
    assert!((NUDGE_FRACTION * VERTICAL_DIVISIONS - 1.0).abs() < f32::EPSILON);
}

// =============================================================================
// Pin Assignment Tests
// =============================================================================

#[test]
fn spi_devices() {
    assert_eq!(pins::SPIDEV_CE0, "/dev/spidev0.0");
    assert_eq!(pins::SPIDEV_CE1, "/dev/spidev0.1");
}

#[test]
fn gpio_lines_unique() {
    let mut lines = vec![
        pins::POWER_ENABLE,
        pins::POWER_FAULT,
        pins::BACKLIGHT_ENABLE,
        pins::BACKLIGHT_FAULT,
        pins::EXPANDER_RESET,
        pins::BUTTON_CHIP_SELECT,
        pins::BUTTON_IRQ,
        pins::BANK0A_IRQ,
        pins::BANK0B_IRQ,
        pins::BANK1A_IRQ,
        pins::BANK1B_IRQ,
        pins::LCD_RS,
        pins::LCD_RW,
        pins::LCD_E,
    ];
    lines.extend(pins::LCD_DATA);
    let count = lines.len();
    lines.sort_unstable();
    lines.dedup();
    assert_eq!(lines.len(), count);
}
