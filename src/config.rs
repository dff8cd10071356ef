//! System configuration and hardware constants
//!
//! This module defines compile-time constants for the panel hardware and
//! the instrument connection. Register addresses, pin bit assignments,
//! encoder wiring and timing parameters are centralized here, together
//! with the runtime [`PanelConfig`] the binary fills from its arguments.

/// Default instrument address (link-local address of the scope)
pub const DEFAULT_INSTRUMENT_HOST: &str = "169.254.254.254";

/// Default instrument control port (telnet-style SCPI socket)
pub const DEFAULT_INSTRUMENT_PORT: u16 = 5024;

/// Seconds between connection attempts
pub const CONNECT_RETRY_SECS: u32 = 30;

/// How long "Connected!" stays on screen
pub const CONNECTED_BANNER_MS: u32 = 1_000;

/// Settle time between sending a query and reading its reply
pub const QUERY_SETTLE_MS: u32 = 100;

/// Settle time after a set command
pub const COMMAND_SETTLE_MS: u32 = 10;

/// Largest reply chunk read in one go
pub const REPLY_CHUNK_SIZE: usize = 4096;

/// Largest reply payload kept after framing
pub const REPLY_PAYLOAD_SIZE: usize = 96;

/// Largest command line built by the panel
pub const COMMAND_LINE_SIZE: usize = 96;

/// Button debounce time in milliseconds
pub const BUTTON_DEBOUNCE_MS: u32 = 35;

/// Interval between release polls of a held button
pub const BUTTON_RELEASE_POLL_MS: u32 = 10;

/// Release polls before a held button is reported stuck (30 s)
pub const BUTTON_RELEASE_POLL_LIMIT: u32 = 3_000;

/// Pause between fail-safe and restart
pub const RESTART_PAUSE_MS: u32 = 1_000;

/// Display columns
pub const DISPLAY_COLUMNS: usize = 20;

/// Display rows
pub const DISPLAY_ROWS: usize = 4;

/// Encoder pulses per revolution
pub const ENCODER_PPR: u16 = 24;

/// Electrical steps per mechanical click in detent mode
pub const ENCODER_DETENT_MAX: i16 = 2;

/// Electrical steps per action in fine mode
pub const ENCODER_SENSITIVITY: i16 = 1;

/// Vertical divisions on screen (range = scale x divisions)
pub const VERTICAL_DIVISIONS: f32 = 8.0;

/// Fraction of the scale moved per nudge step
pub const NUDGE_FRACTION: f32 = 0.125;

/// Smallest channel scale in V/div
pub const CHANNEL_SCALE_MIN: f32 = 0.002;

/// Channel scale upper bound in V/div (exclusive)
pub const CHANNEL_SCALE_MAX: f32 = 5.0;

/// Timebase scale upper bound in s/div (exclusive)
pub const TIMEBASE_SCALE_MAX: f32 = 50.0;

/// Smallest timebase scale in Main and Window modes
pub const TIMEBASE_SCALE_MIN_NORMAL: f32 = 5e-9;

/// Smallest timebase scale in Roll mode
pub const TIMEBASE_SCALE_MIN_ROLL: f32 = 50e-3;

/// Trigger level limit as a fraction of the channel range
pub const TRIGGER_CHANNEL_LIMIT: f32 = 0.75;

/// Full range of the external trigger input in volts
pub const EXTERNAL_TRIGGER_RANGE: f32 = 5.0;

/// MCP23S17 register addresses (IOCON.BANK = 1 layout)
pub mod registers {
    //! Port A registers sit at 0x00..0x0A, port B at 0x10..0x1A.

    /// I/O direction, port A
    pub const IODIRA: u8 = 0x00;
    /// Input polarity, port A
    pub const IPOLA: u8 = 0x01;
    /// Interrupt-on-change enable, port A
    pub const GPINTENA: u8 = 0x02;
    /// Default compare value, port A
    pub const DEFVALA: u8 = 0x03;
    /// Interrupt control, port A
    pub const INTCONA: u8 = 0x04;
    /// Configuration register (mirrored on both ports)
    pub const IOCON: u8 = 0x05;
    /// Pull-up enable, port A
    pub const GPPUA: u8 = 0x06;
    /// Interrupt flags, port A
    pub const INTFA: u8 = 0x07;
    /// Interrupt capture, port A
    pub const INTCAPA: u8 = 0x08;
    /// Port value, port A
    pub const GPIOA: u8 = 0x09;
    /// Output latch, port A
    pub const OLATA: u8 = 0x0A;

    /// I/O direction, port B
    pub const IODIRB: u8 = 0x10;
    /// Input polarity, port B
    pub const IPOLB: u8 = 0x11;
    /// Interrupt-on-change enable, port B
    pub const GPINTENB: u8 = 0x12;
    /// Default compare value, port B
    pub const DEFVALB: u8 = 0x13;
    /// Interrupt control, port B
    pub const INTCONB: u8 = 0x14;
    /// Pull-up enable, port B
    pub const GPPUB: u8 = 0x16;
    /// Interrupt flags, port B
    pub const INTFB: u8 = 0x17;
    /// Interrupt capture, port B
    pub const INTCAPB: u8 = 0x18;
    /// Port value, port B
    pub const GPIOB: u8 = 0x19;
    /// Output latch, port B
    pub const OLATB: u8 = 0x1A;

    /// IOCON address before BANK is set (power-on BANK = 0 layout)
    pub const IOCON_INITIAL: u8 = 0x0A;

    /// SPI write opcode (hardware address 0)
    pub const OPCODE_WRITE: u8 = 0x40;
    /// SPI read opcode (hardware address 0)
    pub const OPCODE_READ: u8 = 0x41;
}

/// Expander bring-up values
pub mod bringup {
    //! BANK=1, MIRROR off, sequential addressing off, INTPOL active high.

    /// IOCON for the button expander: BANK, SEQOP, INTPOL, bit 0 set
    pub const BUTTON_IOCON: u8 = 0xA3;
    /// Columns on port A bits 0..5 are outputs
    pub const BUTTON_IODIRA: u8 = 0xC0;
    /// All columns idle high
    pub const BUTTON_OLATA: u8 = 0x3F;
    /// Rows read active high after inversion
    pub const BUTTON_IPOLB: u8 = 0xFF;
    /// Interrupt on every row
    pub const BUTTON_GPINTENB: u8 = 0x3F;
    /// Row pull-ups
    pub const BUTTON_GPPUB: u8 = 0xFF;

    /// IOCON for both encoder expanders: BANK, SEQOP, INTPOL
    pub const ENCODER_IOCON: u8 = 0xA2;
    /// Interrupt on every encoder pin
    pub const ENCODER_GPINTEN: u8 = 0xFF;
    /// Bank 1 port A only uses pins 2..7
    pub const ENCODER1_GPINTENA: u8 = 0xFC;
    /// Pull-ups on the unused bank 1 port A pins
    pub const ENCODER1_GPPUA: u8 = 0x03;
}

/// Raspberry Pi GPIO line offsets (gpiochip0)
pub mod pins {
    //! BCM numbering, matching the panel carrier board.

    /// Board power rail enable
    pub const POWER_ENABLE: u32 = 5;
    /// Board power fault (active low)
    pub const POWER_FAULT: u32 = 6;
    /// Display backlight enable
    pub const BACKLIGHT_ENABLE: u32 = 4;
    /// Backlight fault (active low)
    pub const BACKLIGHT_FAULT: u32 = 2;

    /// Shared expander reset (active low)
    pub const EXPANDER_RESET: u32 = 19;
    /// Extra chip select for the button expander
    pub const BUTTON_CHIP_SELECT: u32 = 12;

    /// Button expander interrupt
    pub const BUTTON_IRQ: u32 = 20;
    /// Encoder bank 0 port A interrupt
    pub const BANK0A_IRQ: u32 = 26;
    /// Encoder bank 0 port B interrupt
    pub const BANK0B_IRQ: u32 = 21;
    /// Encoder bank 1 port A interrupt
    pub const BANK1A_IRQ: u32 = 13;
    /// Encoder bank 1 port B interrupt
    pub const BANK1B_IRQ: u32 = 16;

    /// LCD register select
    pub const LCD_RS: u32 = 25;
    /// LCD read/write (held low)
    pub const LCD_RW: u32 = 24;
    /// LCD enable strobe
    pub const LCD_E: u32 = 22;
    /// LCD data lines D4..D7
    pub const LCD_DATA: [u32; 4] = [23, 27, 17, 18];

    /// SPI device on CE0: encoder bank 0, and the button expander
    /// when [`BUTTON_CHIP_SELECT`] is also driven
    pub const SPIDEV_CE0: &str = "/dev/spidev0.0";
    /// SPI device on CE1: encoder bank 1
    pub const SPIDEV_CE1: &str = "/dev/spidev0.1";
    /// SPI clock
    pub const SPI_SPEED_HZ: u32 = 10_000_000;
}

/// Runtime configuration for one panel session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelConfig {
    /// Instrument control port
    pub instrument_port: u16,
    /// Seconds between connection attempts
    pub connect_retry_secs: u32,
    /// Read timeout on the instrument socket; `None` blocks forever
    pub read_timeout_ms: Option<u32>,
    /// Settle time between query and reply read
    pub query_settle_ms: u32,
    /// Settle time after a set command
    pub command_settle_ms: u32,
    /// Button debounce
    pub debounce_ms: u32,
    /// Interval between release polls
    pub release_poll_ms: u32,
    /// Release polls before reporting a stuck button
    pub release_poll_limit: u32,
    /// Pause between fail-safe and restart
    pub restart_pause_ms: u32,
    /// Restart limit; `None` restarts forever
    pub max_restarts: Option<u32>,
}

impl PanelConfig {
    /// Configuration built from the compile-time defaults
    #[must_use]
    pub const fn new() -> Self {
        Self {
            instrument_port: DEFAULT_INSTRUMENT_PORT,
            connect_retry_secs: CONNECT_RETRY_SECS,
            read_timeout_ms: None,
            query_settle_ms: QUERY_SETTLE_MS,
            command_settle_ms: COMMAND_SETTLE_MS,
            debounce_ms: BUTTON_DEBOUNCE_MS,
            release_poll_ms: BUTTON_RELEASE_POLL_MS,
            release_poll_limit: BUTTON_RELEASE_POLL_LIMIT,
            restart_pause_ms: RESTART_PAUSE_MS,
            max_restarts: None,
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self::new()
    }
}
