//! Rotary Encoder Driver
//!
//! Quadrature decoding for the panel knobs. Each knob's A/B phases sit
//! on two bits of an expander port; an [`EncoderBank`] reads the port
//! once and fans the byte out to every knob wired to it.

use heapless::Vec;
use log::trace;

use super::expander::{Device, ExpanderBus, Port};
use crate::action::Action;
use crate::config::{ENCODER_DETENT_MAX, ENCODER_PPR, ENCODER_SENSITIVITY};
use crate::error::Result;
pub use crate::types::Direction;
use crate::types::{ChannelId, Direction as Dir};

/// Knobs on the panel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Knob {
    /// Channel volts/div
    Scale(ChannelId),
    /// Channel vertical position
    Offset(ChannelId),
    /// Horizontal time/div
    Horizontal,
    /// Horizontal position
    Delay,
    /// Menu select
    Select,
    /// Active cursor position
    Cursor,
    /// Trigger level
    TriggerLevel,
    /// Math scale (wired, not modelled)
    MathScale,
    /// Math offset (wired, not modelled)
    MathOffset,
}

impl Knob {
    /// Actions this knob fires when first wired
    #[must_use]
    pub const fn default_bindings(self) -> (Action, Action) {
        match self {
            Self::Scale(ch) => (
                Action::ChannelScale(ch, Dir::Clockwise),
                Action::ChannelScale(ch, Dir::CounterClockwise),
            ),
            Self::Offset(ch) => (
                Action::ChannelOffset(ch, Dir::Clockwise),
                Action::ChannelOffset(ch, Dir::CounterClockwise),
            ),
            Self::Horizontal => (
                Action::TimebaseScale(Dir::Clockwise),
                Action::TimebaseScale(Dir::CounterClockwise),
            ),
            Self::Delay => (
                Action::TimebasePosition(Dir::Clockwise),
                Action::TimebasePosition(Dir::CounterClockwise),
            ),
            Self::Cursor => (
                Action::CursorMove(Dir::Clockwise),
                Action::CursorMove(Dir::CounterClockwise),
            ),
            Self::TriggerLevel => (
                Action::TriggerLevel(Dir::Clockwise),
                Action::TriggerLevel(Dir::CounterClockwise),
            ),
            Self::Select | Self::MathScale | Self::MathOffset => (Action::None, Action::None),
        }
    }

    /// Scale knobs click once per detent
    #[must_use]
    pub const fn uses_detent(self) -> bool {
        matches!(self, Self::Scale(_) | Self::Horizontal)
    }

    /// Math knobs are wired but do nothing
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        !matches!(self, Self::MathScale | Self::MathOffset)
    }
}

/// Quadrature decoder with detent and sensitivity thresholds
#[derive(Clone, Debug)]
pub struct Encoder {
    knob: Knob,
    a_bit: u8,
    b_bit: u8,
    last_a: bool,
    last_b: bool,
    ppr: u16,
    raw_count: u16,
    clockwise: bool,
    count: i16,
    sensitivity: i16,
    detent_count: i16,
    detent_max: i16,
    enabled: bool,
    detent: bool,
    on_clockwise: Action,
    on_counterclockwise: Action,
}

impl Encoder {
    /// Create an encoder on bits `a_bit`/`b_bit` with the knob's defaults
    #[must_use]
    pub const fn new(knob: Knob, a_bit: u8, b_bit: u8) -> Self {
        let (on_clockwise, on_counterclockwise) = knob.default_bindings();
        Self {
            knob,
            a_bit,
            b_bit,
            last_a: false,
            last_b: false,
            ppr: ENCODER_PPR,
            raw_count: 0,
            clockwise: true,
            count: 0,
            sensitivity: ENCODER_SENSITIVITY,
            detent_count: 0,
            detent_max: ENCODER_DETENT_MAX,
            enabled: knob.is_enabled(),
            detent: knob.uses_detent(),
            on_clockwise,
            on_counterclockwise,
        }
    }

    /// Override the detent mode
    #[must_use]
    pub const fn with_detent(mut self, detent: bool) -> Self {
        self.detent = detent;
        self
    }

    /// Override the fine-mode threshold (minimum 1)
    #[must_use]
    pub const fn with_sensitivity(mut self, sensitivity: i16) -> Self {
        self.sensitivity = if sensitivity < 1 { 1 } else { sensitivity };
        self
    }

    /// Override the steps per detent (minimum 1)
    #[must_use]
    pub const fn with_detent_max(mut self, detent_max: i16) -> Self {
        self.detent_max = if detent_max < 1 { 1 } else { detent_max };
        self
    }

    /// Feed a port byte; returns the action fired by this step, if any
    pub fn update(&mut self, port: u8) -> Option<Action> {
        let a = port & (1 << self.a_bit) != 0;
        let b = port & (1 << self.b_bit) != 0;
        let a_changed = a != self.last_a;
        let b_changed = b != self.last_b;
        self.last_a = a;
        self.last_b = b;

        // Both phases moving at once is not a single step
        if a_changed == b_changed {
            return None;
        }

        self.clockwise = if a_changed { a != b } else { a == b };
        self.adjust_count();
        if self.enabled {
            self.action()
        } else {
            None
        }
    }

    fn adjust_count(&mut self) {
        let delta: i16 = if self.clockwise { 1 } else { -1 };
        self.raw_count = if self.clockwise {
            (self.raw_count + 1) % self.ppr
        } else {
            (self.raw_count + self.ppr - 1) % self.ppr
        };
        self.detent_count = (self.detent_count + delta).clamp(-self.detent_max, self.detent_max);
        self.count = (self.count + delta).clamp(-self.sensitivity, self.sensitivity);
    }

    fn action(&mut self) -> Option<Action> {
        let fire = if self.detent {
            let fire = self.detent_count.abs() >= self.detent_max;
            if fire {
                self.detent_count = 0;
            }
            fire
        } else {
            let fire = self.count.abs() >= self.sensitivity;
            if fire {
                self.count = 0;
            }
            fire
        };
        if !fire {
            return None;
        }
        let action = if self.clockwise {
            self.on_clockwise
        } else {
            self.on_counterclockwise
        };
        trace!("{:?} -> {action:?}", self.knob);
        Some(action)
    }

    /// Rebind both directions
    pub fn bind(&mut self, on_clockwise: Action, on_counterclockwise: Action) {
        self.on_clockwise = on_clockwise;
        self.on_counterclockwise = on_counterclockwise;
    }

    /// Current bindings (clockwise, counter-clockwise)
    #[must_use]
    pub const fn bindings(&self) -> (Action, Action) {
        (self.on_clockwise, self.on_counterclockwise)
    }

    /// Enable or disable action firing (counting continues)
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Knob this encoder belongs to
    #[must_use]
    pub const fn knob(&self) -> Knob {
        self.knob
    }

    /// Port bits this encoder occupies
    #[must_use]
    pub const fn pin_mask(&self) -> u8 {
        (1 << self.a_bit) | (1 << self.b_bit)
    }

    /// Position within one revolution
    #[must_use]
    pub const fn raw_count(&self) -> u16 {
        self.raw_count
    }

    /// Fine accumulator
    #[must_use]
    pub const fn count(&self) -> i16 {
        self.count
    }

    /// Detent accumulator
    #[must_use]
    pub const fn detent_count(&self) -> i16 {
        self.detent_count
    }

    /// Direction of the last valid step
    #[must_use]
    pub const fn direction(&self) -> Direction {
        if self.clockwise {
            Direction::Clockwise
        } else {
            Direction::CounterClockwise
        }
    }

    /// Whether the knob fires actions
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the knob is in detent mode
    #[must_use]
    pub const fn is_detent(&self) -> bool {
        self.detent
    }
}

/// Maximum knobs on one port
pub const MAX_BANK_ENCODERS: usize = 4;

/// Encoders sharing one expander port
#[derive(Clone, Debug)]
pub struct EncoderBank {
    device: Device,
    port: Port,
    encoders: Vec<Encoder, MAX_BANK_ENCODERS>,
}

impl EncoderBank {
    /// Empty bank on `device`/`port`
    #[must_use]
    pub const fn new(device: Device, port: Port) -> Self {
        Self {
            device,
            port,
            encoders: Vec::new(),
        }
    }

    /// Add an encoder; returns it back if the bank is full
    pub fn push(&mut self, encoder: Encoder) -> core::result::Result<(), Encoder> {
        self.encoders.push(encoder)
    }

    /// Builder form of [`EncoderBank::push`]; extra encoders are dropped
    #[must_use]
    pub fn with(mut self, encoder: Encoder) -> Self {
        if self.encoders.push(encoder).is_err() {
            log::warn!("encoder bank {:?}/{:?} full", self.device, self.port);
        }
        self
    }

    /// Fan one port byte out to every encoder in wiring order
    pub fn update(&mut self, port: u8) -> Vec<Action, MAX_BANK_ENCODERS> {
        let mut fired = Vec::new();
        for encoder in &mut self.encoders {
            if let Some(action) = encoder.update(port) {
                // Capacity equals the encoder count
                let _ = fired.push(action);
            }
        }
        fired
    }

    /// Read the port and update every encoder
    pub fn poll<B: ExpanderBus>(&mut self, bus: &mut B) -> Result<Vec<Action, MAX_BANK_ENCODERS>> {
        let value = bus.read_register(self.device, self.port.gpio())?;
        Ok(self.update(value))
    }

    /// Encoder for `knob`, if it is on this bank
    pub fn encoder_mut(&mut self, knob: Knob) -> Option<&mut Encoder> {
        self.encoders.iter_mut().find(|e| e.knob == knob)
    }

    /// Encoders in wiring order
    #[must_use]
    pub fn encoders(&self) -> &[Encoder] {
        &self.encoders
    }

    /// Expander this bank reads
    #[must_use]
    pub const fn device(&self) -> Device {
        self.device
    }

    /// Port this bank reads
    #[must_use]
    pub const fn port(&self) -> Port {
        self.port
    }
}

/// The four banks as wired on the panel
#[must_use]
pub fn panel_banks() -> [EncoderBank; 4] {
    use ChannelId::{Ch1, Ch2, Ch3, Ch4};
    [
        EncoderBank::new(Device::Encoders0, Port::A)
            .with(Encoder::new(Knob::Offset(Ch2), 1, 0))
            .with(Encoder::new(Knob::Offset(Ch1), 2, 3))
            .with(Encoder::new(Knob::Scale(Ch1), 4, 5))
            .with(Encoder::new(Knob::Scale(Ch2), 7, 6)),
        EncoderBank::new(Device::Encoders0, Port::B)
            .with(Encoder::new(Knob::Scale(Ch3), 1, 0))
            .with(Encoder::new(Knob::Scale(Ch4), 3, 2))
            .with(Encoder::new(Knob::Offset(Ch4), 5, 4))
            .with(Encoder::new(Knob::Offset(Ch3), 7, 6)),
        EncoderBank::new(Device::Encoders1, Port::A)
            .with(Encoder::new(Knob::Horizontal, 2, 3))
            .with(Encoder::new(Knob::Delay, 4, 5))
            .with(Encoder::new(Knob::Select, 6, 7)),
        EncoderBank::new(Device::Encoders1, Port::B)
            .with(Encoder::new(Knob::MathScale, 1, 0))
            .with(Encoder::new(Knob::MathOffset, 3, 2))
            .with(Encoder::new(Knob::Cursor, 4, 5))
            .with(Encoder::new(Knob::TriggerLevel, 6, 7)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_count_wraps_backwards() {
        let mut enc = Encoder::new(Knob::Delay, 0, 1);
        // 00 -> 01: b changed, a != b -> counter-clockwise
        enc.update(0b10);
        assert_eq!(enc.raw_count(), ENCODER_PPR - 1);
    }

    #[test]
    fn math_knobs_disabled() {
        let banks = panel_banks();
        assert!(banks[3]
            .encoders()
            .iter()
            .filter(|e| matches!(e.knob(), Knob::MathScale | Knob::MathOffset))
            .all(|e| !e.is_enabled()));
    }
}
