//! Peripheral Drivers
//!
//! Drivers for the panel's external parts. The expander bus is the only
//! path to the encoder and button hardware; the display is reached
//! through the [`display::CharDisplay`] contract.

pub mod buttons;
pub mod display;
pub mod encoder;
pub mod expander;
pub mod lcd;
