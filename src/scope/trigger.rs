//! Edge trigger mirror

use log::debug;

use super::{send_bool, send_fmt, send_scientific};
use crate::action::Action;
use crate::error::Result;
use crate::link::InstrumentLink;
use crate::types::{Direction, TriggerSlope, TriggerSource, TriggerSweep};
use crate::ui::menu::{MenuId, MenuTree, Setting, ToggleMenu};

/// A cached change to the trigger
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TriggerChange {
    /// Edge source
    Source(TriggerSource),
    /// Edge slope
    Slope(TriggerSlope),
    /// Sweep mode
    Sweep(TriggerSweep),
    /// Level in volts
    Level(f32),
    /// Noise reject
    NoiseReject(bool),
}

/// Allowed level span and nudge step for the current source
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelLimits {
    /// Level is clamped to `-limit..=limit`
    pub limit: f32,
    /// Change per knob step
    pub step: f32,
}

/// Cached edge trigger state
#[derive(Clone, Debug, PartialEq)]
pub struct Trigger {
    source: TriggerSource,
    slope: TriggerSlope,
    sweep: TriggerSweep,
    level: f32,
    noise_reject: bool,
    menu: MenuId,
}

impl Trigger {
    /// Create the trigger and its menu under the root
    pub fn new(tree: &mut MenuTree) -> Result<Self> {
        let menu = tree.add_list(MenuId::ROOT, "Trigger")?;
        let sources = tree.add_submenu(menu, "Source")?;
        for source in TriggerSource::ALL {
            tree.add_action(sources, source.label(), Action::SetTriggerSource(source))?;
        }
        let slopes = tree.add_submenu(menu, "Slope")?;
        for slope in TriggerSlope::ALL {
            tree.add_action(slopes, slope.label(), Action::SetTriggerSlope(slope))?;
        }
        tree.add_toggle_submenu(
            menu,
            "Sweep",
            ToggleMenu {
                setting: Setting::NormalSweep,
                labels: ["Auto", "Normal"],
                actions: [
                    Action::SetTriggerSweep(TriggerSweep::Normal),
                    Action::SetTriggerSweep(TriggerSweep::Auto),
                ],
            },
        )?;
        tree.add_toggle_submenu(
            menu,
            "Noise reject",
            ToggleMenu {
                setting: Setting::NoiseReject,
                labels: ["Off", "On"],
                actions: [Action::SetNoiseReject(true), Action::SetNoiseReject(false)],
            },
        )?;

        Ok(Self {
            source: TriggerSource::default(),
            slope: TriggerSlope::Positive,
            sweep: TriggerSweep::Auto,
            level: 0.0,
            noise_reject: false,
            menu,
        })
    }

    /// Trigger menu
    #[must_use]
    pub const fn menu(&self) -> MenuId {
        self.menu
    }

    /// Edge source
    #[must_use]
    pub const fn source(&self) -> TriggerSource {
        self.source
    }

    /// Edge slope
    #[must_use]
    pub const fn slope(&self) -> TriggerSlope {
        self.slope
    }

    /// Sweep mode
    #[must_use]
    pub const fn sweep(&self) -> TriggerSweep {
        self.sweep
    }

    /// Level in volts
    #[must_use]
    pub const fn level(&self) -> f32 {
        self.level
    }

    /// Noise reject
    #[must_use]
    pub const fn noise_reject(&self) -> bool {
        self.noise_reject
    }

    /// Apply a change to the cache only
    pub fn apply_local(&mut self, change: TriggerChange) {
        match change {
            TriggerChange::Source(source) => self.source = source,
            TriggerChange::Slope(slope) => self.slope = slope,
            TriggerChange::Sweep(sweep) => self.sweep = sweep,
            TriggerChange::Level(level) => self.level = level,
            TriggerChange::NoiseReject(on) => self.noise_reject = on,
        }
    }

    /// Re-read every field from the instrument
    pub fn resync<L: InstrumentLink + ?Sized>(&mut self, link: &mut L) -> Result<()> {
        let sweep = link.query_keyword("TRIG:SWE?", TriggerSweep::from_keyword)?;
        let slope = link.query_keyword("TRIG:EDGE:SLOP?", TriggerSlope::from_keyword)?;
        let source = link.query_keyword("TRIG:EDGE:SOUR?", TriggerSource::from_keyword)?;
        let level = link.query_number("TRIG:EDGE:LEV?")?;
        let noise_reject = link.query_bool("TRIG:NREJ?")?;
        *self = Self {
            source,
            slope,
            sweep,
            level,
            noise_reject,
            menu: self.menu,
        };
        Ok(())
    }

    /// Move the level by one step, clamped to the source's limits
    pub fn nudge_level<L: InstrumentLink + ?Sized>(
        &mut self,
        direction: Direction,
        limits: LevelLimits,
        link: &mut L,
    ) -> Result<()> {
        self.set_level(self.level + direction.sign() * limits.step, limits, link)
    }

    /// Set the level, clamped to the source's limits
    pub fn set_level<L: InstrumentLink + ?Sized>(&mut self, level: f32, limits: LevelLimits, link: &mut L) -> Result<()> {
        let level = level.clamp(-limits.limit, limits.limit);
        if (level - self.level).abs() < f32::EPSILON && level.abs() >= limits.limit {
            debug!("trigger level at limit");
            return Ok(());
        }
        send_scientific(link, format_args!("TRIG:EDGE:LEV"), level, "V")?;
        self.apply_local(TriggerChange::Level(level));
        Ok(())
    }

    /// Set the edge source
    pub fn set_source<L: InstrumentLink + ?Sized>(&mut self, source: TriggerSource, link: &mut L) -> Result<()> {
        send_fmt(link, format_args!("TRIG:EDGE:SOUR {source}"))?;
        self.apply_local(TriggerChange::Source(source));
        Ok(())
    }

    /// Set the edge slope
    pub fn set_slope<L: InstrumentLink + ?Sized>(&mut self, slope: TriggerSlope, link: &mut L) -> Result<()> {
        send_fmt(link, format_args!("TRIG:EDGE:SLOP {}", slope.keyword()))?;
        self.apply_local(TriggerChange::Slope(slope));
        Ok(())
    }

    /// Set the sweep mode
    pub fn set_sweep<L: InstrumentLink + ?Sized>(&mut self, sweep: TriggerSweep, link: &mut L) -> Result<()> {
        send_fmt(link, format_args!("TRIG:SWE {}", sweep.keyword()))?;
        self.apply_local(TriggerChange::Sweep(sweep));
        Ok(())
    }

    /// Set noise reject
    pub fn set_noise_reject<L: InstrumentLink + ?Sized>(&mut self, on: bool, link: &mut L) -> Result<()> {
        send_bool(link, format_args!("TRIG:NREJ"), on)?;
        self.apply_local(TriggerChange::NoiseReject(on));
        Ok(())
    }
}
