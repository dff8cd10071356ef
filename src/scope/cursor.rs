//! Cursor (marker) mirror

use log::{debug, warn};

use super::{query_fmt, send_fmt, send_scientific};
use crate::action::Action;
use crate::error::Result;
use crate::link::InstrumentLink;
use crate::types::{ChannelId, CursorId, CursorMode, Direction, SourceSlot};
use crate::ui::menu::{MenuId, MenuTree};

/// A cached change to the cursors
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CursorChange {
    /// Cursor mode
    Mode(CursorMode),
    /// Cursor moved by the knob
    Active(CursorId),
    /// Cursor position (seconds for X, volts for Y)
    Position(CursorId, f32),
    /// Source channel for X1/Y1 or X2/Y2
    Source(SourceSlot, ChannelId),
}

/// Cached cursor state
#[derive(Clone, Debug, PartialEq)]
pub struct Cursor {
    mode: CursorMode,
    active: CursorId,
    positions: [f32; 4],
    sources: [Option<ChannelId>; 2],
    menu: MenuId,
}

const fn slot_index(slot: SourceSlot) -> usize {
    match slot {
        SourceSlot::First => 0,
        SourceSlot::Second => 1,
    }
}

const fn source_header(slot: SourceSlot) -> &'static str {
    match slot {
        SourceSlot::First => "MARK:X1Y1",
        SourceSlot::Second => "MARK:X2Y2",
    }
}

fn marker_source<L: InstrumentLink + ?Sized>(link: &mut L, slot: SourceSlot) -> Result<Option<ChannelId>> {
    let query = query_fmt(format_args!("{}?", source_header(slot)))?;
    let reply = link.query(query.as_str())?;
    let source = ChannelId::from_keyword(&reply);
    if source.is_none() {
        warn!("{} source is not a channel", source_header(slot));
    }
    Ok(source)
}

impl Cursor {
    /// Create the cursors and their menu under the root
    pub fn new(tree: &mut MenuTree) -> Result<Self> {
        let menu = tree.add_list(MenuId::ROOT, "Cursors")?;
        let modes = tree.add_submenu(menu, "Mode")?;
        for mode in CursorMode::ALL {
            tree.add_action(modes, mode.label(), Action::SetCursorMode(mode))?;
        }
        let active = tree.add_submenu(menu, "Active cursor")?;
        for cursor in CursorId::ALL {
            tree.add_action(active, cursor.label(), Action::SelectCursor(cursor))?;
        }
        for (title, slot) in [("Source 1", SourceSlot::First), ("Source 2", SourceSlot::Second)] {
            let sources = tree.add_submenu(menu, title)?;
            for ch in ChannelId::ALL {
                tree.add_action(sources, ch.label(), Action::SetCursorSource(slot, ch))?;
            }
        }

        Ok(Self {
            mode: CursorMode::Off,
            active: CursorId::X1,
            positions: [0.0; 4],
            sources: [Some(ChannelId::Ch1), Some(ChannelId::Ch1)],
            menu,
        })
    }

    /// Cursor menu
    #[must_use]
    pub const fn menu(&self) -> MenuId {
        self.menu
    }

    /// Cursor mode
    #[must_use]
    pub const fn mode(&self) -> CursorMode {
        self.mode
    }

    /// Cursor the knob moves
    #[must_use]
    pub const fn active(&self) -> CursorId {
        self.active
    }

    /// Position of `cursor`
    #[must_use]
    pub const fn position(&self, cursor: CursorId) -> f32 {
        self.positions[cursor.index()]
    }

    /// Source channel for a slot; `None` when the instrument reports
    /// a source the panel has no channel for (math, function, `NONE`)
    #[must_use]
    pub const fn source(&self, slot: SourceSlot) -> Option<ChannelId> {
        self.sources[slot_index(slot)]
    }

    /// Apply a change to the cache only
    pub fn apply_local(&mut self, change: CursorChange) {
        match change {
            CursorChange::Mode(mode) => self.mode = mode,
            CursorChange::Active(cursor) => self.active = cursor,
            CursorChange::Position(cursor, position) => self.positions[cursor.index()] = position,
            CursorChange::Source(slot, ch) => self.sources[slot_index(slot)] = Some(ch),
        }
    }

    /// Re-read every instrument field; the active cursor is panel state
    pub fn resync<L: InstrumentLink + ?Sized>(&mut self, link: &mut L) -> Result<()> {
        let mode = link.query_keyword("MARK:MODE?", CursorMode::from_keyword)?;
        let first = marker_source(link, SourceSlot::First)?;
        let second = marker_source(link, SourceSlot::Second)?;
        let mut positions = [0.0; 4];
        for cursor in CursorId::ALL {
            let query = query_fmt(format_args!("{}?", cursor.position_header()))?;
            positions[cursor.index()] = link.query_number(query.as_str())?;
        }
        *self = Self {
            mode,
            active: self.active,
            positions,
            sources: [first, second],
            menu: self.menu,
        };
        Ok(())
    }

    /// Make `cursor` the one the knob moves
    pub fn select(&mut self, cursor: CursorId) {
        self.apply_local(CursorChange::Active(cursor));
    }

    /// Advance to the next cursor
    pub fn cycle(&mut self) {
        self.select(self.active.next());
    }

    /// Move the active cursor by `step`; nothing while cursors are off
    pub fn nudge<L: InstrumentLink + ?Sized>(&mut self, direction: Direction, step: f32, link: &mut L) -> Result<()> {
        if self.mode == CursorMode::Off {
            debug!("cursors off");
            return Ok(());
        }
        let cursor = self.active;
        let position = self.position(cursor) + direction.sign() * step;
        send_scientific(link, format_args!("{}", cursor.position_header()), position, "")?;
        self.apply_local(CursorChange::Position(cursor, position));
        Ok(())
    }

    /// Change mode; the caller resyncs afterwards
    pub fn set_mode<L: InstrumentLink + ?Sized>(&mut self, mode: CursorMode, link: &mut L) -> Result<()> {
        send_fmt(link, format_args!("MARK:MODE {}", mode.keyword()))?;
        self.apply_local(CursorChange::Mode(mode));
        Ok(())
    }

    /// Set a source channel
    pub fn set_source<L: InstrumentLink + ?Sized>(&mut self, slot: SourceSlot, ch: ChannelId, link: &mut L) -> Result<()> {
        send_fmt(link, format_args!("{} {ch}", source_header(slot)))?;
        self.apply_local(CursorChange::Source(slot, ch));
        Ok(())
    }
}
