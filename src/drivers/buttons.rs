//! Button matrix scanner
//!
//! Six column lines on port A of the button expander are driven low one
//! at a time; six row lines on port B are read back inverted and raise
//! the expander interrupt when they change. A press is reported once,
//! after the button has been released.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use log::{debug, trace, warn};

use super::expander::{Device, ExpanderBus};
use crate::config::{bringup, registers, PanelConfig};
use crate::error::{Error, Result};
use crate::types::ChannelId;

/// Number of column lines
pub const COLUMNS: u8 = 6;

/// A completed press: the asserted row bits and the driven column bit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatrixPress {
    /// Row bits read from port B (bit 5 = R1 ... bit 0 = R6)
    pub rows: u8,
    /// Column bit driven low on port A (bit 5 = C1 ... bit 0 = C6)
    pub columns: u8,
}

/// Column-scan state and timing
#[derive(Clone, Debug)]
pub struct ButtonMatrix {
    column: u8,
    debounce_ms: u32,
    release_poll_ms: u32,
    release_poll_limit: u32,
}

impl ButtonMatrix {
    /// Scanner with the configured timing, starting at column bit 0
    #[must_use]
    pub const fn new(config: &PanelConfig) -> Self {
        Self {
            column: 0,
            debounce_ms: config.debounce_ms,
            release_poll_ms: config.release_poll_ms,
            release_poll_limit: config.release_poll_limit,
        }
    }

    /// Bring up the button expander
    pub fn configure<B: ExpanderBus>(bus: &mut B) -> Result<()> {
        use registers::{GPINTENB, GPPUB, IODIRA, IOCON_INITIAL, IPOLB, OLATA};
        let dev = Device::Buttons;
        bus.write_register(dev, IOCON_INITIAL, bringup::BUTTON_IOCON)?;
        bus.write_register(dev, IODIRA, bringup::BUTTON_IODIRA)?;
        bus.write_register(dev, OLATA, bringup::BUTTON_OLATA)?;
        bus.write_register(dev, IPOLB, bringup::BUTTON_IPOLB)?;
        bus.write_register(dev, GPINTENB, bringup::BUTTON_GPINTENB)?;
        bus.write_register(dev, GPPUB, bringup::BUTTON_GPPUB)?;
        Ok(())
    }

    /// Column bit driven on the next pass
    #[must_use]
    pub const fn next_column(&self) -> u8 {
        self.column
    }

    /// One scan pass
    ///
    /// Drives the next column low. If the row interrupt is asserted the
    /// press is debounced, checked against the interrupt flags and then
    /// held until release. Returns the press once the rows read clear.
    pub fn scan<B, P, D>(&mut self, bus: &mut B, irq: &mut P, delay: &mut D) -> Result<Option<MatrixPress>>
    where
        B: ExpanderBus,
        P: InputPin,
        D: DelayNs,
    {
        use registers::{GPIOB, INTCAPB, INTFB, OLATA};
        let dev = Device::Buttons;

        let columns = 1u8 << self.column;
        self.column = (self.column + 1) % COLUMNS;
        bus.write_register(dev, OLATA, !columns)?;

        if !irq.is_high().map_err(Error::pin)? {
            return Ok(None);
        }

        let flags = bus.read_register(dev, INTFB)?;
        delay.delay_ms(self.debounce_ms);
        let rows = bus.read_register(dev, GPIOB)?;
        // Clears the interrupt latch
        bus.read_register(dev, INTCAPB)?;
        trace!("button irq: flags {flags:#04x} rows {rows:#04x} column {columns:#04x}");

        if flags & rows == 0 {
            return Ok(None);
        }

        let mut held = rows;
        for _ in 0..self.release_poll_limit {
            held = bus.read_register(dev, GPIOB)?;
            if held == 0 {
                let press = MatrixPress { rows, columns };
                debug!("button press {press:?}");
                return Ok(Some(press));
            }
            delay.delay_ms(self.release_poll_ms);
        }
        warn!("button stuck, rows {held:#04x}");
        Err(Error::StuckButton { rows: held })
    }
}

/// Front-panel buttons
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PanelButton {
    /// Menu select
    Select,
    /// Menu back
    Back,
    /// Horizontal menu
    Horizontal,
    /// Zero horizontal position
    Delay,
    /// Run/stop acquisition
    RunStop,
    /// Single acquisition
    Single,
    /// Horizontal scale push (main mode)
    HorizScale,
    /// Zoom window
    Zoom,
    /// Default setup
    DefaultSetup,
    /// Auto scale
    AutoScale,
    /// Math scale push
    MathScale,
    /// Trigger menu
    Trigger,
    /// Trigger level push (centre)
    TrigLevel,
    /// Measure menu
    Measure,
    /// Cursor menu
    Cursors,
    /// Cycle active cursor
    CursorCtl,
    /// Math menu
    Math,
    /// Acquire menu
    Acquire,
    /// Display menu
    Display,
    /// Label menu
    Label,
    /// Save/recall menu
    SaveRecall,
    /// Utility menu
    Utility,
    /// Math offset push
    MathOffset,
    /// Channel scale push
    ChannelScale(ChannelId),
    /// Channel on/off and menu
    Channel(ChannelId),
    /// Channel offset push (zero)
    ChannelOffset(ChannelId),
}

impl PanelButton {
    /// Buttons by row (R1 first) then column (C1 first)
    const MAP: [[Option<Self>; 6]; 6] = {
        use ChannelId::{Ch1, Ch2, Ch3, Ch4};
        use PanelButton::*;
        [
            [Some(Select), Some(Back), Some(Horizontal), Some(Delay), Some(RunStop), Some(Single)],
            [Some(HorizScale), Some(Zoom), Some(DefaultSetup), Some(AutoScale), Some(MathScale), None],
            [Some(Trigger), Some(TrigLevel), Some(Measure), Some(Cursors), Some(CursorCtl), Some(Math)],
            [Some(Acquire), Some(Display), Some(Label), Some(SaveRecall), Some(Utility), Some(MathOffset)],
            [
                Some(ChannelScale(Ch1)),
                Some(ChannelScale(Ch2)),
                Some(ChannelScale(Ch3)),
                Some(ChannelScale(Ch4)),
                Some(Channel(Ch3)),
                Some(Channel(Ch4)),
            ],
            [
                Some(Channel(Ch1)),
                Some(Channel(Ch2)),
                Some(ChannelOffset(Ch1)),
                Some(ChannelOffset(Ch2)),
                Some(ChannelOffset(Ch3)),
                Some(ChannelOffset(Ch4)),
            ],
        ]
    };

    /// Decode a press; the highest set row and column bit win
    #[must_use]
    pub fn from_press(press: MatrixPress) -> Option<Self> {
        let row = first_line(press.rows)?;
        let column = first_line(press.columns)?;
        Self::MAP[row][column]
    }

    /// Text shown for functions the panel does not model
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Select => "Select",
            Self::Back => "Back",
            Self::Horizontal => "Horizontal",
            Self::Delay => "Delay",
            Self::RunStop => "Run/Stop",
            Self::Single => "Single",
            Self::HorizScale => "Horiz Scale",
            Self::Zoom => "Zoom",
            Self::DefaultSetup => "Default Setup",
            Self::AutoScale => "Auto Scale",
            Self::MathScale => "Math Scale",
            Self::Trigger => "Trigger",
            Self::TrigLevel => "Trig Level",
            Self::Measure => "Measure",
            Self::Cursors => "Cursors",
            Self::CursorCtl => "Cursor Ctl",
            Self::Math => "Math",
            Self::Acquire => "Acquire",
            Self::Display => "Display",
            Self::Label => "Label",
            Self::SaveRecall => "Save/Recall",
            Self::Utility => "Utility",
            Self::MathOffset => "Math Offset",
            Self::ChannelScale(_) => "Channel Scale",
            Self::Channel(_) => "Channel",
            Self::ChannelOffset(_) => "Channel Offset",
        }
    }
}

/// Line index 0..6 of the highest set bit among bits 5..0
fn first_line(bits: u8) -> Option<usize> {
    (0..6).find(|line| bits & (0x20 >> line) != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_prefers_high_bits() {
        assert_eq!(first_line(0b10_0001), Some(0));
        assert_eq!(first_line(0b00_0001), Some(5));
        assert_eq!(first_line(0b1100_0000), None);
    }
}
