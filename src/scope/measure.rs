//! Automatic measurements
//!
//! Measurements are fire-and-forget: the instrument keeps the list, the
//! panel only remembers the two source channels.

use super::send_fmt;
use crate::action::Action;
use crate::error::{Error, Result};
use crate::link::InstrumentLink;
use crate::types::{ChannelId, SourceSlot};
use crate::ui::menu::{MenuId, MenuTree};

/// Measurement kinds offered on the panel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeasureKind {
    /// Peak to peak
    PeakToPeak,
    /// Maximum
    Maximum,
    /// Minimum
    Minimum,
    /// Amplitude (top - base)
    Amplitude,
    /// Top
    Top,
    /// Base
    Base,
    /// Average
    Average,
    /// RMS
    Rms,
    /// Overshoot
    Overshoot,
    /// Preshoot
    Preshoot,
    /// Frequency
    Frequency,
    /// Period
    Period,
    /// Positive pulse width
    PositiveWidth,
    /// Negative pulse width
    NegativeWidth,
    /// Positive duty cycle
    Duty,
    /// Negative duty cycle
    NegativeDuty,
    /// Rise time
    RiseTime,
    /// Fall time
    FallTime,
    /// Positive pulse count
    PositivePulses,
    /// Negative pulse count
    NegativePulses,
    /// Rising edge count
    RisingEdges,
    /// Falling edge count
    FallingEdges,
    /// Delay between the two sources
    Delay,
    /// Phase between the two sources
    Phase,
}

impl MeasureKind {
    /// Voltage measurements in menu order
    pub const VOLTAGE: [Self; 10] = [
        Self::PeakToPeak,
        Self::Maximum,
        Self::Minimum,
        Self::Amplitude,
        Self::Top,
        Self::Base,
        Self::Average,
        Self::Rms,
        Self::Overshoot,
        Self::Preshoot,
    ];

    /// Time measurements in menu order
    pub const TIME: [Self; 12] = [
        Self::Frequency,
        Self::Period,
        Self::PositiveWidth,
        Self::NegativeWidth,
        Self::Duty,
        Self::NegativeDuty,
        Self::RiseTime,
        Self::FallTime,
        Self::PositivePulses,
        Self::NegativePulses,
        Self::RisingEdges,
        Self::FallingEdges,
    ];

    /// `:MEAS:` keyword
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::PeakToPeak => "VPP",
            Self::Maximum => "VMAX",
            Self::Minimum => "VMIN",
            Self::Amplitude => "VAMP",
            Self::Top => "VTOP",
            Self::Base => "VBAS",
            Self::Average => "VAV",
            Self::Rms => "VRMS",
            Self::Overshoot => "OVER",
            Self::Preshoot => "PRES",
            Self::Frequency => "FREQ",
            Self::Period => "PER",
            Self::PositiveWidth => "PWID",
            Self::NegativeWidth => "NWID",
            Self::Duty => "DUTY",
            Self::NegativeDuty => "NDUT",
            Self::RiseTime => "RIS",
            Self::FallTime => "FALL",
            Self::PositivePulses => "PPUL",
            Self::NegativePulses => "NPUL",
            Self::RisingEdges => "PEDG",
            Self::FallingEdges => "NEDG",
            Self::Delay => "DEL",
            Self::Phase => "PHAS",
        }
    }

    /// Menu label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PeakToPeak => "Peak-peak",
            Self::Maximum => "Maximum",
            Self::Minimum => "Minimum",
            Self::Amplitude => "Amplitude",
            Self::Top => "Top",
            Self::Base => "Base",
            Self::Average => "Average",
            Self::Rms => "RMS",
            Self::Overshoot => "Overshoot",
            Self::Preshoot => "Preshoot",
            Self::Frequency => "Frequency",
            Self::Period => "Period",
            Self::PositiveWidth => "+ Width",
            Self::NegativeWidth => "- Width",
            Self::Duty => "Duty cycle",
            Self::NegativeDuty => "- Duty cycle",
            Self::RiseTime => "Rise time",
            Self::FallTime => "Fall time",
            Self::PositivePulses => "+ Pulses",
            Self::NegativePulses => "- Pulses",
            Self::RisingEdges => "Rising edges",
            Self::FallingEdges => "Falling edges",
            Self::Delay => "Delay",
            Self::Phase => "Phase",
        }
    }

    /// Delay and phase compare both sources
    #[must_use]
    pub const fn is_two_source(self) -> bool {
        matches!(self, Self::Delay | Self::Phase)
    }
}

/// Measurement sources
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Measure {
    sources: [ChannelId; 2],
    menu: MenuId,
}

impl Measure {
    /// Create the measurement menu under the root
    pub fn new(tree: &mut MenuTree) -> Result<Self> {
        let menu = tree.add_list(MenuId::ROOT, "Measure")?;
        let voltage = tree.add_submenu(menu, "Voltage")?;
        for kind in MeasureKind::VOLTAGE {
            tree.add_action(voltage, kind.label(), Action::Measure(kind))?;
        }
        let time = tree.add_submenu(menu, "Time")?;
        for kind in MeasureKind::TIME {
            tree.add_action(time, kind.label(), Action::Measure(kind))?;
        }
        tree.add_action(menu, "Delay", Action::Measure(MeasureKind::Delay))?;
        tree.add_action(menu, "Phase", Action::Measure(MeasureKind::Phase))?;
        for (title, slot) in [("Source 1", SourceSlot::First), ("Source 2", SourceSlot::Second)] {
            let sources = tree.add_submenu(menu, title)?;
            for ch in ChannelId::ALL {
                tree.add_action(sources, ch.label(), Action::SetMeasureSource(slot, ch))?;
            }
        }
        tree.add_action(menu, "Clear all", Action::ClearMeasurements)?;

        Ok(Self {
            sources: [ChannelId::Ch1, ChannelId::Ch2],
            menu,
        })
    }

    /// Measurement menu
    #[must_use]
    pub const fn menu(&self) -> MenuId {
        self.menu
    }

    /// Source channel for a slot
    #[must_use]
    pub const fn source(&self, slot: SourceSlot) -> ChannelId {
        match slot {
            SourceSlot::First => self.sources[0],
            SourceSlot::Second => self.sources[1],
        }
    }

    /// Apply a source change to the cache only
    pub fn apply_local(&mut self, slot: SourceSlot, ch: ChannelId) {
        match slot {
            SourceSlot::First => self.sources[0] = ch,
            SourceSlot::Second => self.sources[1] = ch,
        }
    }

    /// Re-read the sources (`CHANa,CHANb`); a missing second source
    /// reads as the first
    pub fn resync<L: InstrumentLink + ?Sized>(&mut self, link: &mut L) -> Result<()> {
        let reply = link.query(":MEAS:SOUR?")?;
        let mut parts = reply.split(|&b| b == b',');
        let first = parts
            .next()
            .and_then(ChannelId::from_keyword)
            .ok_or(Error::UnexpectedReply)?;
        let second = parts.next().and_then(ChannelId::from_keyword).unwrap_or(first);
        self.sources = [first, second];
        Ok(())
    }

    /// Add a measurement on the current sources
    pub fn measure<L: InstrumentLink + ?Sized>(&self, kind: MeasureKind, link: &mut L) -> Result<()> {
        let [first, second] = self.sources;
        if kind.is_two_source() {
            send_fmt(link, format_args!(":MEAS:{} {first},{second}", kind.keyword()))
        } else {
            send_fmt(link, format_args!(":MEAS:{} {first}", kind.keyword()))
        }
    }

    /// Set a source channel
    pub fn set_source<L: InstrumentLink + ?Sized>(&mut self, slot: SourceSlot, ch: ChannelId, link: &mut L) -> Result<()> {
        let mut sources = self.sources;
        match slot {
            SourceSlot::First => sources[0] = ch,
            SourceSlot::Second => sources[1] = ch,
        }
        send_fmt(link, format_args!(":MEAS:SOUR {},{}", sources[0], sources[1]))?;
        self.apply_local(slot, ch);
        Ok(())
    }

    /// Remove every measurement from the instrument display
    pub fn clear<L: InstrumentLink + ?Sized>(&self, link: &mut L) -> Result<()> {
        send_fmt(link, format_args!(":MEAS:CLE"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_dozen_kinds() {
        let singles = MeasureKind::VOLTAGE.len() + MeasureKind::TIME.len();
        assert_eq!(singles + 2, 24);
        assert!(MeasureKind::VOLTAGE
            .iter()
            .chain(MeasureKind::TIME.iter())
            .all(|k| !k.is_two_source()));
    }
}
