//! MCP23S17 I/O expander bus
//!
//! Three expanders share the SPI bus: two carry the encoder banks and one
//! scans the button matrix. The core only needs register reads and
//! writes addressed by device.

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;
use log::trace;

use crate::config::{bringup, registers};
use crate::error::{Error, Result};

/// Physical expander chip
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Device {
    /// Encoder bank 0 (channel knobs)
    Encoders0,
    /// Encoder bank 1 (horizontal, select, cursor, trigger, math)
    Encoders1,
    /// Button matrix
    Buttons,
}

impl Device {
    /// All devices in bus order
    pub const ALL: [Self; 3] = [Self::Encoders0, Self::Encoders1, Self::Buttons];

    /// Index into the bus' chip table
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Encoders0 => 0,
            Self::Encoders1 => 1,
            Self::Buttons => 2,
        }
    }
}

/// Expander port
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Port {
    /// Port A
    A,
    /// Port B
    B,
}

impl Port {
    /// GPIO register for this port
    #[must_use]
    pub const fn gpio(self) -> u8 {
        match self {
            Self::A => registers::GPIOA,
            Self::B => registers::GPIOB,
        }
    }
}

/// Register access to the expanders
pub trait ExpanderBus {
    /// Write one register
    fn write_register(&mut self, device: Device, register: u8, value: u8) -> Result<()>;

    /// Read one register
    fn read_register(&mut self, device: Device, register: u8) -> Result<u8>;
}

/// Bring up an encoder expander: interrupt on change for every pin
pub fn configure_encoders<B: ExpanderBus>(bus: &mut B, device: Device) -> Result<()> {
    use registers::{GPINTENA, GPINTENB, GPPUA, IOCON_INITIAL};

    // IOCON lives at 0x0A until BANK is set
    bus.write_register(device, IOCON_INITIAL, bringup::ENCODER_IOCON)?;
    if device == Device::Encoders1 {
        bus.write_register(device, GPINTENA, bringup::ENCODER1_GPINTENA)?;
        bus.write_register(device, GPPUA, bringup::ENCODER1_GPPUA)?;
    } else {
        bus.write_register(device, GPINTENA, bringup::ENCODER_GPINTEN)?;
    }
    bus.write_register(device, GPINTENB, bringup::ENCODER_GPINTEN)?;
    // Reading the ports clears any change latched during reset
    bus.read_register(device, Port::A.gpio())?;
    bus.read_register(device, Port::B.gpio())?;
    Ok(())
}

/// One expander on its SPI device, with an optional extra chip select
pub struct ExpanderChip<SPI, CS> {
    spi: SPI,
    cs: Option<CS>,
}

impl<SPI, CS> ExpanderChip<SPI, CS> {
    /// Chip selected by the SPI device alone
    pub const fn new(spi: SPI) -> Self {
        Self { spi, cs: None }
    }

    /// Chip that also needs a GPIO chip select (active low)
    pub const fn with_chip_select(spi: SPI, cs: CS) -> Self {
        Self { spi, cs: Some(cs) }
    }
}

impl<SPI, CS> ExpanderChip<SPI, CS>
where
    SPI: SpiDevice,
    CS: OutputPin,
{
    fn transfer(&mut self, frame: &mut [u8]) -> Result<()> {
        if let Some(cs) = self.cs.as_mut() {
            cs.set_low().map_err(Error::pin)?;
        }
        let result = self.spi.transfer_in_place(frame).map_err(Error::bus);
        if let Some(cs) = self.cs.as_mut() {
            cs.set_high().map_err(Error::pin)?;
        }
        result
    }
}

/// [`ExpanderBus`] over `embedded-hal` SPI devices
pub struct SpiExpanderBus<SPI, CS> {
    chips: [ExpanderChip<SPI, CS>; 3],
}

impl<SPI, CS> SpiExpanderBus<SPI, CS>
where
    SPI: SpiDevice,
    CS: OutputPin,
{
    /// Chips in [`Device`] order: encoders 0, encoders 1, buttons
    pub fn new(
        encoders0: ExpanderChip<SPI, CS>,
        encoders1: ExpanderChip<SPI, CS>,
        buttons: ExpanderChip<SPI, CS>,
    ) -> Self {
        Self {
            chips: [encoders0, encoders1, buttons],
        }
    }
}

impl<SPI, CS> ExpanderBus for SpiExpanderBus<SPI, CS>
where
    SPI: SpiDevice,
    CS: OutputPin,
{
    fn write_register(&mut self, device: Device, register: u8, value: u8) -> Result<()> {
        trace!("{device:?} [{register:#04x}] <- {value:#04x}");
        let mut frame = [registers::OPCODE_WRITE, register, value];
        self.chips[device.index()].transfer(&mut frame)
    }

    fn read_register(&mut self, device: Device, register: u8) -> Result<u8> {
        let mut frame = [registers::OPCODE_READ, register, 0];
        self.chips[device.index()].transfer(&mut frame)?;
        trace!("{device:?} [{register:#04x}] -> {:#04x}", frame[2]);
        Ok(frame[2])
    }
}
