//! Power Management
//!
//! Board power and display backlight rails. Each rail has an enable
//! output and an active-low fault input (pulled up on the board). A rail
//! is never switched on while its fault is asserted, and a fault seen
//! while polling switches the rail off and puts a message on the
//! instrument's screen.

use embedded_hal::digital::{InputPin, OutputPin};
use log::{info, warn};

use crate::error::{Error, Result};
use crate::link::InstrumentLink;
use crate::scope::send_fmt;

/// Rails under control
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rail {
    /// Board power
    Power,
    /// Display backlight
    Backlight,
}

impl Rail {
    /// Text shown on the instrument when the rail faults
    #[must_use]
    pub const fn fault_message(self) -> &'static str {
        match self {
            Self::Power => "Panel power fault",
            Self::Backlight => "Panel backlight fault",
        }
    }
}

/// Rail state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RailState {
    /// Switched off
    #[default]
    Off,
    /// Switched on
    On,
    /// Switched off by a fault
    Faulted,
}

struct RailPins<O, I> {
    enable: O,
    fault: I,
    state: RailState,
}

impl<O: OutputPin, I: InputPin> RailPins<O, I> {
    const fn new(enable: O, fault: I) -> Self {
        Self {
            enable,
            fault,
            state: RailState::Off,
        }
    }

    fn fault_asserted(&mut self) -> Result<bool> {
        self.fault.is_low().map_err(Error::pin)
    }

    fn switch_on(&mut self) -> Result<bool> {
        if self.fault_asserted()? {
            self.switch_off(RailState::Faulted)?;
            return Ok(false);
        }
        self.enable.set_high().map_err(Error::pin)?;
        self.state = RailState::On;
        Ok(true)
    }

    fn switch_off(&mut self, state: RailState) -> Result<()> {
        self.enable.set_low().map_err(Error::pin)?;
        self.state = state;
        Ok(())
    }
}

/// Power and backlight enables with their fault inputs
pub struct PowerRails<O, I> {
    power: RailPins<O, I>,
    backlight: RailPins<O, I>,
}

impl<O, I> PowerRails<O, I>
where
    O: OutputPin,
    I: InputPin,
{
    /// Take the four lines; both rails start off
    pub const fn new(power_enable: O, power_fault: I, backlight_enable: O, backlight_fault: I) -> Self {
        Self {
            power: RailPins::new(power_enable, power_fault),
            backlight: RailPins::new(backlight_enable, backlight_fault),
        }
    }

    fn rail(&mut self, rail: Rail) -> &mut RailPins<O, I> {
        match rail {
            Rail::Power => &mut self.power,
            Rail::Backlight => &mut self.backlight,
        }
    }

    /// Current state of `rail`
    #[must_use]
    pub const fn state(&self, rail: Rail) -> RailState {
        match rail {
            Rail::Power => self.power.state,
            Rail::Backlight => self.backlight.state,
        }
    }

    /// Switch board power on; `false` while its fault is asserted
    pub fn enable_power(&mut self) -> Result<bool> {
        self.enable(Rail::Power)
    }

    /// Switch the backlight on; `false` while its fault is asserted
    pub fn enable_backlight(&mut self) -> Result<bool> {
        self.enable(Rail::Backlight)
    }

    fn enable(&mut self, rail: Rail) -> Result<bool> {
        let on = self.rail(rail).switch_on()?;
        if on {
            info!("{rail:?} enabled");
        } else {
            warn!("{rail:?} fault asserted, not enabling");
        }
        Ok(on)
    }

    /// Switch a rail off
    pub fn disable(&mut self, rail: Rail) -> Result<()> {
        self.rail(rail).switch_off(RailState::Off)
    }

    /// Check both fault inputs
    ///
    /// A rail that is on and whose fault is asserted is switched off and
    /// the instrument is told. Notification failures are logged only.
    /// Returns the rails that faulted on this poll.
    pub fn poll_faults<L: InstrumentLink + ?Sized>(&mut self, link: &mut L) -> Result<heapless::Vec<Rail, 2>> {
        let mut faulted = heapless::Vec::new();
        for rail in [Rail::Power, Rail::Backlight] {
            let pins = self.rail(rail);
            if pins.state != RailState::On || !pins.fault_asserted()? {
                continue;
            }
            pins.switch_off(RailState::Faulted)?;
            warn!("{rail:?} fault, rail disabled");
            if let Err(e) = send_fmt(link, format_args!("SYST:DSP \"{}\"", rail.fault_message())) {
                warn!("fault notice not delivered: {e}");
            }
            // two rails, capacity two
            let _ = faulted.push(rail);
        }
        Ok(faulted)
    }

    /// Drive both rails off; the first failure is returned after both
    /// have been attempted
    pub fn safe_state(&mut self) -> Result<()> {
        let power = self.power.switch_off(RailState::Off);
        let backlight = self.backlight.switch_off(RailState::Off);
        info!("rails off");
        power.and(backlight)
    }
}
