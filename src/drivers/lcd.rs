//! HD44780 character LCD in 4-bit mode
//!
//! Write-only (R/W tied low), so fixed delays stand in for the busy flag.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use super::display::CharDisplay;
use crate::error::{Error, Result};

/// HD44780 instruction set
mod cmd {
    pub const CLEAR: u8 = 0x01;
    pub const ENTRY_MODE_INCREMENT: u8 = 0x06;
    pub const DISPLAY_ON: u8 = 0x0C;
    pub const FUNCTION_4BIT_2LINE: u8 = 0x28;
    pub const SET_CGRAM: u8 = 0x40;
    pub const SET_DDRAM: u8 = 0x80;
}

/// DDRAM address of the first column of each row on a 20x4 module
const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

/// HD44780 driver over six GPIO lines
pub struct Hd44780<P, D> {
    rs: P,
    en: P,
    data: [P; 4],
    delay: D,
}

impl<P, D> Hd44780<P, D>
where
    P: OutputPin,
    D: DelayNs,
{
    /// Take the pins and run the 4-bit initialisation sequence
    pub fn new(rs: P, en: P, data: [P; 4], delay: D) -> Result<Self> {
        let mut lcd = Self { rs, en, data, delay };
        lcd.init()?;
        Ok(lcd)
    }

    fn init(&mut self) -> Result<()> {
        self.delay.delay_ms(50);
        self.rs.set_low().map_err(Error::pin)?;
        self.en.set_low().map_err(Error::pin)?;

        // Force 8-bit mode three times, then switch to 4-bit
        self.write_nibble(0x3)?;
        self.delay.delay_us(4_500);
        self.write_nibble(0x3)?;
        self.delay.delay_us(4_500);
        self.write_nibble(0x3)?;
        self.delay.delay_us(150);
        self.write_nibble(0x2)?;

        self.command(cmd::FUNCTION_4BIT_2LINE)?;
        self.command(cmd::DISPLAY_ON)?;
        self.command(cmd::CLEAR)?;
        self.delay.delay_ms(2);
        self.command(cmd::ENTRY_MODE_INCREMENT)
    }

    fn write_nibble(&mut self, nibble: u8) -> Result<()> {
        for (bit, pin) in self.data.iter_mut().enumerate() {
            if nibble & (1 << bit) != 0 {
                pin.set_high().map_err(Error::pin)?;
            } else {
                pin.set_low().map_err(Error::pin)?;
            }
        }
        self.en.set_high().map_err(Error::pin)?;
        self.delay.delay_us(1);
        self.en.set_low().map_err(Error::pin)?;
        self.delay.delay_us(50);
        Ok(())
    }

    fn write_byte(&mut self, byte: u8, data: bool) -> Result<()> {
        if data {
            self.rs.set_high().map_err(Error::pin)?;
        } else {
            self.rs.set_low().map_err(Error::pin)?;
        }
        self.write_nibble(byte >> 4)?;
        self.write_nibble(byte & 0x0F)
    }

    fn command(&mut self, byte: u8) -> Result<()> {
        self.write_byte(byte, false)
    }
}

impl<P, D> CharDisplay for Hd44780<P, D>
where
    P: OutputPin,
    D: DelayNs,
{
    fn clear(&mut self) -> Result<()> {
        self.command(cmd::CLEAR)?;
        self.delay.delay_ms(2);
        Ok(())
    }

    fn set_cursor(&mut self, row: u8, col: u8) -> Result<()> {
        let offset = ROW_OFFSETS[usize::from(row) % ROW_OFFSETS.len()];
        self.command(cmd::SET_DDRAM | (offset + col))
    }

    fn write_str(&mut self, text: &str) -> Result<()> {
        for c in text.chars() {
            let code = if c.is_ascii() { c as u8 } else { b'?' };
            self.write_byte(code, true)?;
        }
        Ok(())
    }

    fn write_glyph(&mut self, code: u8) -> Result<()> {
        self.write_byte(code, true)
    }

    fn define_glyph(&mut self, slot: u8, bitmap: &[u8; 8]) -> Result<()> {
        self.command(cmd::SET_CGRAM | ((slot & 0x07) << 3))?;
        for &row in bitmap {
            self.write_byte(row, true)?;
        }
        // Back to DDRAM so later text lands on screen
        self.set_cursor(0, 0)
    }
}
