//! Horizontal (timebase) mirror

use log::debug;

use super::{send_fmt, send_scientific, within};
use crate::action::Action;
use crate::config::{
    NUDGE_FRACTION, TIMEBASE_SCALE_MAX, TIMEBASE_SCALE_MIN_NORMAL, TIMEBASE_SCALE_MIN_ROLL,
};
use crate::error::Result;
use crate::link::InstrumentLink;
use crate::protocol::Command;
use crate::types::{Direction, Scale, TimebaseMode, TimebaseReference};
use crate::ui::menu::{MenuId, MenuTree};

/// A cached change to the timebase
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimebaseChange {
    /// Horizontal mode
    Mode(TimebaseMode),
    /// Reference position
    Reference(TimebaseReference),
    /// Time per division
    Scale(Scale),
    /// Delay from the trigger in seconds
    Position(f32),
}

/// Cached horizontal state
#[derive(Clone, Debug, PartialEq)]
pub struct Timebase {
    mode: TimebaseMode,
    reference: TimebaseReference,
    scale: Scale,
    position: f32,
    menu: MenuId,
}

impl Timebase {
    /// Create the timebase and its menu under the root
    pub fn new(tree: &mut MenuTree) -> Result<Self> {
        let menu = tree.add_list(MenuId::ROOT, "Horizontal")?;
        let modes = tree.add_submenu(menu, "Mode")?;
        for mode in TimebaseMode::ALL {
            tree.add_action(modes, mode.label(), Action::SetTimebaseMode(mode))?;
        }
        let references = tree.add_submenu(menu, "Reference")?;
        for reference in TimebaseReference::ALL {
            tree.add_action(references, reference.label(), Action::SetTimebaseReference(reference))?;
        }
        tree.add_action(menu, "Zero delay", Action::TimebasePositionZero)?;

        Ok(Self {
            mode: TimebaseMode::Main,
            reference: TimebaseReference::Center,
            scale: Scale::new(1.0, -4),
            position: 0.0,
            menu,
        })
    }

    /// Smallest scale allowed in `mode`; `None` where the scale is fixed
    #[must_use]
    pub const fn min_scale(mode: TimebaseMode) -> Option<f32> {
        match mode {
            TimebaseMode::Main | TimebaseMode::Window => Some(TIMEBASE_SCALE_MIN_NORMAL),
            TimebaseMode::Roll => Some(TIMEBASE_SCALE_MIN_ROLL),
            TimebaseMode::Xy => None,
        }
    }

    /// Horizontal menu
    #[must_use]
    pub const fn menu(&self) -> MenuId {
        self.menu
    }

    /// Horizontal mode
    #[must_use]
    pub const fn mode(&self) -> TimebaseMode {
        self.mode
    }

    /// Reference position
    #[must_use]
    pub const fn reference(&self) -> TimebaseReference {
        self.reference
    }

    /// Time per division
    #[must_use]
    pub const fn scale(&self) -> Scale {
        self.scale
    }

    /// Delay in seconds
    #[must_use]
    pub const fn position(&self) -> f32 {
        self.position
    }

    /// Apply a change to the cache only
    pub fn apply_local(&mut self, change: TimebaseChange) {
        match change {
            TimebaseChange::Mode(mode) => self.mode = mode,
            TimebaseChange::Reference(reference) => self.reference = reference,
            TimebaseChange::Scale(scale) => self.scale = scale,
            TimebaseChange::Position(position) => self.position = position,
        }
    }

    /// Re-read every field from the instrument
    pub fn resync<L: InstrumentLink + ?Sized>(&mut self, link: &mut L) -> Result<()> {
        let mode = link.query_keyword("TIM:MODE?", TimebaseMode::from_keyword)?;
        let reference = link.query_keyword("TIM:REF?", TimebaseReference::from_keyword)?;
        let (mantissa, exponent) = link.query_scientific("TIM:SCAL?")?;
        let position = link.query_number("TIM:POS?")?;
        *self = Self {
            mode,
            reference,
            scale: Scale::new(mantissa, exponent),
            position,
            menu: self.menu,
        };
        Ok(())
    }

    /// Step the scale on the 1-2-5 ladder within the mode's limits
    ///
    /// Returns `false` without sending when the step is refused.
    pub fn adjust_scale<L: InstrumentLink + ?Sized>(&mut self, direction: Direction, link: &mut L) -> Result<bool> {
        let Some(min) = Self::min_scale(self.mode) else {
            debug!("timebase scale fixed in {:?}", self.mode);
            return Ok(false);
        };
        let next = self.scale.step(direction);
        if !within(next.value(), min, TIMEBASE_SCALE_MAX) {
            debug!("timebase scale limit");
            return Ok(false);
        }
        let mut cmd = Command::from_args(format_args!("TIM:SCAL "))?;
        cmd.push_scale(next)?;
        link.send(cmd.as_str())?;
        self.apply_local(TimebaseChange::Scale(next));
        Ok(true)
    }

    /// Move the delay by 1/8 of the scale
    pub fn nudge_position<L: InstrumentLink + ?Sized>(&mut self, direction: Direction, link: &mut L) -> Result<()> {
        let position = self.position + direction.sign() * self.scale.value() * NUDGE_FRACTION;
        self.set_position(position, link)
    }

    /// Set the delay in seconds
    pub fn set_position<L: InstrumentLink + ?Sized>(&mut self, position: f32, link: &mut L) -> Result<()> {
        send_scientific(link, format_args!("TIM:POS"), position, "")?;
        self.apply_local(TimebaseChange::Position(position));
        Ok(())
    }

    /// Change mode; the caller resyncs afterwards
    pub fn set_mode<L: InstrumentLink + ?Sized>(&mut self, mode: TimebaseMode, link: &mut L) -> Result<()> {
        send_fmt(link, format_args!("TIM:MODE {}", mode.keyword()))?;
        self.apply_local(TimebaseChange::Mode(mode));
        Ok(())
    }

    /// Set the reference position
    pub fn set_reference<L: InstrumentLink + ?Sized>(
        &mut self,
        reference: TimebaseReference,
        link: &mut L,
    ) -> Result<()> {
        send_fmt(link, format_args!("TIM:REF {}", reference.keyword()))?;
        self.apply_local(TimebaseChange::Reference(reference));
        Ok(())
    }
}
