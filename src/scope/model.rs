//! Whole-instrument model
//!
//! Owns one mirror per front-panel section and the operations that span
//! more than one of them (trigger level limits follow the source
//! channel, cursor steps follow the timebase or a channel scale).

use log::{debug, info};

use super::channel::Channel;
use super::cursor::Cursor;
use super::measure::Measure;
use super::timebase::Timebase;
use super::trigger::{LevelLimits, Trigger};
use crate::config::{
    EXTERNAL_TRIGGER_RANGE, NUDGE_FRACTION, TRIGGER_CHANNEL_LIMIT, VERTICAL_DIVISIONS,
};
use crate::error::Result;
use crate::link::InstrumentLink;
use crate::types::{ChannelId, Coupling, Direction, Impedance, TriggerSource, TriggerSweep};
use crate::ui::menu::{MenuTree, Setting, SettingSource};

/// Cached oscilloscope state
#[derive(Clone, Debug, PartialEq)]
pub struct ScopeModel {
    channels: [Channel; 4],
    timebase: Timebase,
    trigger: Trigger,
    cursor: Cursor,
    measure: Measure,
}

impl ScopeModel {
    /// Build every entity and its menu subtree, in root-menu order
    pub fn new(tree: &mut MenuTree) -> Result<Self> {
        let channels = [
            Channel::new(ChannelId::Ch1, tree)?,
            Channel::new(ChannelId::Ch2, tree)?,
            Channel::new(ChannelId::Ch3, tree)?,
            Channel::new(ChannelId::Ch4, tree)?,
        ];
        let timebase = Timebase::new(tree)?;
        let trigger = Trigger::new(tree)?;
        let cursor = Cursor::new(tree)?;
        let measure = Measure::new(tree)?;
        debug!("menu tree has {} nodes", tree.len());
        Ok(Self {
            channels,
            timebase,
            trigger,
            cursor,
            measure,
        })
    }

    /// Re-read everything; the cache is only replaced if every query succeeds
    pub fn resync<L: InstrumentLink + ?Sized>(&mut self, link: &mut L) -> Result<()> {
        let mut fresh = self.clone();
        for channel in &mut fresh.channels {
            channel.resync(link)?;
        }
        fresh.timebase.resync(link)?;
        fresh.trigger.resync(link)?;
        fresh.cursor.resync(link)?;
        fresh.measure.resync(link)?;
        *self = fresh;
        info!("model resynced");
        Ok(())
    }

    /// All four channels
    #[must_use]
    pub const fn channels(&self) -> &[Channel; 4] {
        &self.channels
    }

    /// One channel
    #[must_use]
    pub const fn channel(&self, id: ChannelId) -> &Channel {
        &self.channels[id.index()]
    }

    /// One channel, mutably
    pub fn channel_mut(&mut self, id: ChannelId) -> &mut Channel {
        &mut self.channels[id.index()]
    }

    /// Horizontal state
    #[must_use]
    pub const fn timebase(&self) -> &Timebase {
        &self.timebase
    }

    /// Horizontal state, mutably
    pub fn timebase_mut(&mut self) -> &mut Timebase {
        &mut self.timebase
    }

    /// Trigger state
    #[must_use]
    pub const fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    /// Trigger state, mutably
    pub fn trigger_mut(&mut self) -> &mut Trigger {
        &mut self.trigger
    }

    /// Cursor state
    #[must_use]
    pub const fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Cursor state, mutably
    pub fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }

    /// Measurement sources
    #[must_use]
    pub const fn measure(&self) -> &Measure {
        &self.measure
    }

    /// Measurement sources, mutably
    pub fn measure_mut(&mut self) -> &mut Measure {
        &mut self.measure
    }

    /// Level limits for the current trigger source
    ///
    /// A channel source allows +-75% of its range in 1/8-division steps;
    /// the external input has a fixed range. The line source has no
    /// adjustable level.
    #[must_use]
    pub fn level_limits(&self) -> Option<LevelLimits> {
        match self.trigger.source() {
            TriggerSource::Channel(ch) => {
                let channel = self.channel(ch);
                Some(LevelLimits {
                    limit: channel.range() * TRIGGER_CHANNEL_LIMIT,
                    step: channel.scale().value() * NUDGE_FRACTION,
                })
            }
            TriggerSource::External => Some(LevelLimits {
                limit: EXTERNAL_TRIGGER_RANGE,
                step: EXTERNAL_TRIGGER_RANGE / VERTICAL_DIVISIONS * NUDGE_FRACTION,
            }),
            TriggerSource::Line => None,
        }
    }

    /// Nudge the trigger level
    pub fn adjust_trigger_level<L: InstrumentLink + ?Sized>(&mut self, direction: Direction, link: &mut L) -> Result<()> {
        let Some(limits) = self.level_limits() else {
            debug!("trigger level fixed for {}", self.trigger.source());
            return Ok(());
        };
        self.trigger.nudge_level(direction, limits, link)
    }

    /// Move the trigger level to the source channel's offset
    pub fn center_trigger_level<L: InstrumentLink + ?Sized>(&mut self, link: &mut L) -> Result<()> {
        let TriggerSource::Channel(ch) = self.trigger.source() else {
            debug!("no channel to center on");
            return Ok(());
        };
        let Some(limits) = self.level_limits() else {
            return Ok(());
        };
        let offset = self.channel(ch).offset();
        self.trigger.set_level(offset, limits, link)
    }

    /// Nudge the active cursor by 1/8 of the relevant scale
    pub fn move_cursor<L: InstrumentLink + ?Sized>(&mut self, direction: Direction, link: &mut L) -> Result<()> {
        let active = self.cursor.active();
        let scale = if active.is_time() {
            self.timebase.scale()
        } else if let Some(ch) = self.cursor.source(active.slot()) {
            self.channel(ch).scale()
        } else {
            debug!("{active:?} has no channel source");
            return Ok(());
        };
        self.cursor.nudge(direction, scale.value() * NUDGE_FRACTION, link)
    }
}

impl SettingSource for ScopeModel {
    fn setting(&self, setting: Setting) -> bool {
        match setting {
            Setting::AcCoupling(ch) => self.channel(ch).coupling() == Coupling::Ac,
            Setting::FiftyOhm(ch) => self.channel(ch).impedance() == Impedance::Fifty,
            Setting::BandwidthLimit(ch) => self.channel(ch).bandwidth_limit(),
            Setting::Invert(ch) => self.channel(ch).is_inverted(),
            Setting::NormalSweep => self.trigger.sweep() == TriggerSweep::Normal,
            Setting::NoiseReject => self.trigger.noise_reject(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_tree_fits() {
        let mut tree = MenuTree::new();
        let model = ScopeModel::new(&mut tree).unwrap();
        assert!(tree.len() <= crate::ui::menu::MAX_MENUS);
        assert_eq!(model.channel(ChannelId::Ch3).id(), ChannelId::Ch3);
    }

    #[test]
    fn channel_source_limits_follow_scale() {
        let mut tree = MenuTree::new();
        let model = ScopeModel::new(&mut tree).unwrap();
        // default 1 V/div: 8 V range, limit 6 V, step 0.125 V
        let limits = model.level_limits().unwrap();
        assert!((limits.limit - 6.0).abs() < 1e-4);
        assert!((limits.step - 0.125).abs() < 1e-6);
    }
}
