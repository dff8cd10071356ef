//! Analog channel mirror

use log::debug;

use super::{query_fmt, send_bool, send_fmt, send_scientific, within};
use crate::action::Action;
use crate::config::{CHANNEL_SCALE_MAX, CHANNEL_SCALE_MIN, NUDGE_FRACTION, VERTICAL_DIVISIONS};
use crate::error::Result;
use crate::link::InstrumentLink;
use crate::protocol::Command;
use crate::types::{ChannelId, Coupling, Direction, Impedance, Scale};
use crate::ui::menu::{MenuId, MenuTree, Setting, ToggleMenu};

/// A cached change to one channel
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChannelChange {
    /// Display on/off
    Display(bool),
    /// New scale; the offset follows by the same factor
    Scale(Scale),
    /// New offset in volts
    Offset(f32),
    /// Input coupling
    Coupling(Coupling),
    /// Input impedance
    Impedance(Impedance),
    /// Bandwidth limit
    BandwidthLimit(bool),
    /// Inversion
    Invert(bool),
}

/// Cached state of one analog channel
#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    id: ChannelId,
    enabled: bool,
    coupling: Coupling,
    impedance: Impedance,
    bandwidth_limit: bool,
    inverted: bool,
    scale: Scale,
    offset: f32,
    menu: MenuId,
}

impl Channel {
    /// Create the channel and its menu under the root
    pub fn new(id: ChannelId, tree: &mut MenuTree) -> Result<Self> {
        let menu = tree.add_list(MenuId::ROOT, id.label())?;
        tree.add_toggle_submenu(
            menu,
            "Coupling",
            ToggleMenu {
                setting: Setting::AcCoupling(id),
                labels: ["DC", "AC"],
                actions: [
                    Action::SetCoupling(id, Coupling::Ac),
                    Action::SetCoupling(id, Coupling::Dc),
                ],
            },
        )?;
        tree.add_toggle_submenu(
            menu,
            "Impedance",
            ToggleMenu {
                setting: Setting::FiftyOhm(id),
                labels: ["1M Ohm", "50 Ohm"],
                actions: [
                    Action::SetImpedance(id, Impedance::Fifty),
                    Action::SetImpedance(id, Impedance::OneMeg),
                ],
            },
        )?;
        tree.add_toggle_submenu(
            menu,
            "BW Limit",
            ToggleMenu {
                setting: Setting::BandwidthLimit(id),
                labels: ["Off", "On"],
                actions: [
                    Action::SetBandwidthLimit(id, true),
                    Action::SetBandwidthLimit(id, false),
                ],
            },
        )?;
        tree.add_toggle_submenu(
            menu,
            "Invert",
            ToggleMenu {
                setting: Setting::Invert(id),
                labels: ["Off", "On"],
                actions: [Action::SetInvert(id, true), Action::SetInvert(id, false)],
            },
        )?;
        tree.add_action(menu, "Zero offset", Action::ChannelOffsetZero(id))?;

        Ok(Self::detached(id, menu))
    }

    /// Power-on defaults bound to an existing menu
    #[must_use]
    pub fn detached(id: ChannelId, menu: MenuId) -> Self {
        Self {
            id,
            enabled: id == ChannelId::Ch1,
            coupling: Coupling::Dc,
            impedance: Impedance::OneMeg,
            bandwidth_limit: false,
            inverted: false,
            scale: Scale::default(),
            offset: 0.0,
            menu,
        }
    }

    /// Channel id
    #[must_use]
    pub const fn id(&self) -> ChannelId {
        self.id
    }

    /// Menu for this channel
    #[must_use]
    pub const fn menu(&self) -> MenuId {
        self.menu
    }

    /// Whether the trace is displayed
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Input coupling
    #[must_use]
    pub const fn coupling(&self) -> Coupling {
        self.coupling
    }

    /// Input impedance
    #[must_use]
    pub const fn impedance(&self) -> Impedance {
        self.impedance
    }

    /// Bandwidth limit
    #[must_use]
    pub const fn bandwidth_limit(&self) -> bool {
        self.bandwidth_limit
    }

    /// Inversion
    #[must_use]
    pub const fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Vertical scale (V/div)
    #[must_use]
    pub const fn scale(&self) -> Scale {
        self.scale
    }

    /// Vertical offset in volts
    #[must_use]
    pub const fn offset(&self) -> f32 {
        self.offset
    }

    /// Full-scale range in volts (scale x 8)
    #[must_use]
    pub fn range(&self) -> f32 {
        self.scale.value() * VERTICAL_DIVISIONS
    }

    /// Apply a change to the cache only
    pub fn apply_local(&mut self, change: ChannelChange) {
        match change {
            ChannelChange::Display(on) => self.enabled = on,
            ChannelChange::Scale(scale) => {
                let old = self.scale.value();
                if old != 0.0 {
                    self.offset *= scale.value() / old;
                }
                self.scale = scale;
            }
            ChannelChange::Offset(offset) => self.offset = offset,
            ChannelChange::Coupling(coupling) => self.coupling = coupling,
            ChannelChange::Impedance(impedance) => self.impedance = impedance,
            ChannelChange::BandwidthLimit(on) => self.bandwidth_limit = on,
            ChannelChange::Invert(on) => self.inverted = on,
        }
    }

    /// Re-read every field from the instrument
    pub fn resync<L: InstrumentLink + ?Sized>(&mut self, link: &mut L) -> Result<()> {
        let id = self.id;
        let enabled = link.query_bool(query_fmt(format_args!("{id}:DISP?"))?.as_str())?;
        let (mantissa, exponent) = link.query_scientific(query_fmt(format_args!("{id}:SCAL?"))?.as_str())?;
        let offset = link.query_number(query_fmt(format_args!("{id}:OFFS?"))?.as_str())?;
        let coupling = link.query_keyword(
            query_fmt(format_args!("{id}:COUP?"))?.as_str(),
            Coupling::from_keyword,
        )?;
        let impedance = link.query_keyword(
            query_fmt(format_args!("{id}:IMP?"))?.as_str(),
            Impedance::from_keyword,
        )?;
        let bandwidth_limit = link.query_bool(query_fmt(format_args!("{id}:BWL?"))?.as_str())?;
        let inverted = link.query_bool(query_fmt(format_args!("{id}:INV?"))?.as_str())?;

        *self = Self {
            id,
            enabled,
            coupling,
            impedance,
            bandwidth_limit,
            inverted,
            scale: Scale::new(mantissa, exponent),
            offset,
            menu: self.menu,
        };
        Ok(())
    }

    /// Show or hide the trace
    pub fn set_enabled<L: InstrumentLink + ?Sized>(&mut self, enabled: bool, link: &mut L) -> Result<()> {
        send_bool(link, format_args!("{}:DISP", self.id), enabled)?;
        self.apply_local(ChannelChange::Display(enabled));
        Ok(())
    }

    /// Step the scale on the 1-2-5 ladder
    ///
    /// Steps that would leave `[0.002, 5)` V/div send nothing and return
    /// `false`. The offset is rescaled and sent so the trace stays put.
    pub fn adjust_scale<L: InstrumentLink + ?Sized>(&mut self, direction: Direction, link: &mut L) -> Result<bool> {
        let next = self.scale.step(direction);
        if !within(next.value(), CHANNEL_SCALE_MIN, CHANNEL_SCALE_MAX) {
            debug!("{} scale limit", self.id);
            return Ok(false);
        }
        let mut cmd = Command::from_args(format_args!("{}:SCAL ", self.id))?;
        cmd.push_scale(next)?.push_str("V")?;
        link.send(cmd.as_str())?;

        self.apply_local(ChannelChange::Scale(next));
        send_scientific(link, format_args!("{}:OFFS", self.id), self.offset, "V")?;
        Ok(true)
    }

    /// Move the offset by 1/8 of the scale
    pub fn nudge_offset<L: InstrumentLink + ?Sized>(&mut self, direction: Direction, link: &mut L) -> Result<()> {
        let offset = self.offset + direction.sign() * self.scale.value() * NUDGE_FRACTION;
        self.set_offset(offset, link)
    }

    /// Set the offset in volts
    pub fn set_offset<L: InstrumentLink + ?Sized>(&mut self, offset: f32, link: &mut L) -> Result<()> {
        send_scientific(link, format_args!("{}:OFFS", self.id), offset, "V")?;
        self.apply_local(ChannelChange::Offset(offset));
        Ok(())
    }

    /// Set input coupling
    pub fn set_coupling<L: InstrumentLink + ?Sized>(&mut self, coupling: Coupling, link: &mut L) -> Result<()> {
        send_fmt(link, format_args!("{}:COUP {}", self.id, coupling.keyword()))?;
        self.apply_local(ChannelChange::Coupling(coupling));
        Ok(())
    }

    /// Set input impedance
    pub fn set_impedance<L: InstrumentLink + ?Sized>(&mut self, impedance: Impedance, link: &mut L) -> Result<()> {
        send_fmt(link, format_args!("{}:IMP {}", self.id, impedance.keyword()))?;
        self.apply_local(ChannelChange::Impedance(impedance));
        Ok(())
    }

    /// Set the bandwidth limit
    pub fn set_bandwidth_limit<L: InstrumentLink + ?Sized>(&mut self, on: bool, link: &mut L) -> Result<()> {
        send_bool(link, format_args!("{}:BWL", self.id), on)?;
        self.apply_local(ChannelChange::BandwidthLimit(on));
        Ok(())
    }

    /// Set inversion
    pub fn set_inverted<L: InstrumentLink + ?Sized>(&mut self, on: bool, link: &mut L) -> Result<()> {
        send_bool(link, format_args!("{}:INV", self.id), on)?;
        self.apply_local(ChannelChange::Invert(on));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_change_rescales_offset() {
        let mut ch = Channel::detached(ChannelId::Ch2, MenuId::ROOT);
        ch.apply_local(ChannelChange::Offset(0.5));
        ch.apply_local(ChannelChange::Scale(Scale::new(2.0, 0)));
        assert!((ch.offset() - 1.0).abs() < 1e-6);
        assert!((ch.range() - 16.0).abs() < 1e-4);
    }
}
