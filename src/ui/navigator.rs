//! Menu navigation and rendering
//!
//! Exactly one node is active at a time. Pushing a node deactivates the
//! current one; `back` returns to the container. List menus show a
//! four-row window with a `>` cursor in column 0 and scroll arrows in
//! column 19.

use log::debug;

use super::menu::{ItemTarget, ListMenu, MenuId, MenuKind, MenuTree, SettingSource, ToggleMenu};
use crate::action::Action;
use crate::config::{DISPLAY_COLUMNS, DISPLAY_ROWS};
use crate::drivers::display::{truncate, CharDisplay, GLYPH_DOWN, GLYPH_UP};
use crate::error::{MenuError, Result};
use crate::types::Direction;

const CURSOR: &str = ">";
const NO_CURSOR: &str = " ";
const SET_MARK: &str = "*";
/// Rows below the first visible one
const WINDOW: usize = DISPLAY_ROWS - 1;
/// Label width between the cursor and arrow columns
const LABEL_WIDTH: usize = DISPLAY_COLUMNS - 2;
#[allow(clippy::cast_possible_truncation)]
const ARROW_COLUMN: u8 = (DISPLAY_COLUMNS - 1) as u8;
#[allow(clippy::cast_possible_truncation)]
const LAST_ROW: u8 = WINDOW as u8;

/// Owner of the menu tree and the active-menu pointer
#[derive(Clone, Debug)]
pub struct Navigator {
    tree: MenuTree,
    active: MenuId,
}

impl Navigator {
    /// Start at the blank root
    #[must_use]
    pub fn new(tree: MenuTree) -> Self {
        Self {
            tree,
            active: MenuId::ROOT,
        }
    }

    /// The active node
    #[must_use]
    pub const fn active(&self) -> MenuId {
        self.active
    }

    /// The menu tree
    #[must_use]
    pub const fn tree(&self) -> &MenuTree {
        &self.tree
    }

    /// Whether `id` is the active node
    #[must_use]
    pub fn is_active(&self, id: MenuId) -> bool {
        self.active == id
    }

    /// Select-knob actions for the active node
    #[must_use]
    pub fn knob_bindings(&self) -> (Action, Action) {
        match self.tree.node(self.active).map(|n| &n.kind) {
            Ok(MenuKind::List(_)) => (
                Action::MenuCursor {
                    menu: self.active,
                    direction: Direction::Clockwise,
                },
                Action::MenuCursor {
                    menu: self.active,
                    direction: Direction::CounterClockwise,
                },
            ),
            _ => (Action::None, Action::None),
        }
    }

    fn enable(&mut self, id: MenuId) -> Result<()> {
        let node = self.tree.node_mut(id)?;
        if !node.has_content() {
            return Err(MenuError::Empty.into());
        }
        node.active = true;
        if let MenuKind::List(list) = &mut node.kind {
            list.cursor = 0;
            list.start_index = 0;
        }
        Ok(())
    }

    fn disable<D: CharDisplay>(&mut self, id: MenuId, display: &mut D) -> Result<()> {
        let node = self.tree.node_mut(id)?;
        if !node.active {
            return Err(MenuError::NotActive.into());
        }
        node.active = false;
        display.clear()
    }

    /// Make `id` the active node and render it
    pub fn push<D, S>(&mut self, id: MenuId, display: &mut D, settings: &S) -> Result<()>
    where
        D: CharDisplay,
        S: SettingSource + ?Sized,
    {
        if !self.tree.node(id)?.has_content() {
            return Err(MenuError::Empty.into());
        }
        self.disable(self.active, display)?;
        self.active = id;
        self.enable(id)?;
        debug!("menu -> {:?} ({})", id, self.tree.node(id)?.title);
        self.render(display, settings)
    }

    /// Push `id` unless it is already active
    pub fn open<D, S>(&mut self, id: MenuId, display: &mut D, settings: &S) -> Result<()>
    where
        D: CharDisplay,
        S: SettingSource + ?Sized,
    {
        if self.active == id {
            Ok(())
        } else {
            self.push(id, display, settings)
        }
    }

    /// Select on node `id`
    ///
    /// An inactive node is pushed. On the active node a sub-menu item is
    /// pushed, while an action item or toggle returns its action for the
    /// caller to invoke; re-render afterwards with [`Navigator::render`].
    pub fn select_node<D, S>(&mut self, id: MenuId, display: &mut D, settings: &S) -> Result<Option<Action>>
    where
        D: CharDisplay,
        S: SettingSource + ?Sized,
    {
        if self.active != id {
            self.push(id, display, settings)?;
            return Ok(None);
        }
        let target = match &self.tree.node(id)?.kind {
            MenuKind::Blank => return Ok(None),
            MenuKind::List(list) => list
                .items
                .get(list.cursor)
                .map(|item| item.target)
                .ok_or(MenuError::Empty)?,
            MenuKind::Toggle(toggle) => {
                let current = settings.setting(toggle.setting);
                ItemTarget::Action(toggle.actions[usize::from(current)])
            }
        };
        match target {
            ItemTarget::Submenu(child) => {
                self.push(child, display, settings)?;
                Ok(None)
            }
            ItemTarget::Action(action) => Ok(Some(action)),
        }
    }

    /// Select on the active node
    pub fn select<D, S>(&mut self, display: &mut D, settings: &S) -> Result<Option<Action>>
    where
        D: CharDisplay,
        S: SettingSource + ?Sized,
    {
        self.select_node(self.active, display, settings)
    }

    /// Return to the active node's container; a no-op at the root
    pub fn back<D, S>(&mut self, display: &mut D, settings: &S) -> Result<()>
    where
        D: CharDisplay,
        S: SettingSource + ?Sized,
    {
        let Some(container) = self.tree.node(self.active)?.container else {
            return Ok(());
        };
        self.disable(self.active, display)?;
        self.active = container;
        self.enable(container)?;
        debug!("menu back -> {container:?}");
        self.render(display, settings)
    }

    /// Drop straight back to the blank root
    pub fn reset<D: CharDisplay>(&mut self, display: &mut D) -> Result<()> {
        if self.active != MenuId::ROOT {
            self.disable(self.active, display)?;
            self.active = MenuId::ROOT;
            self.enable(MenuId::ROOT)?;
        }
        display.clear()
    }

    /// Move the active list's cursor down one item
    pub fn increment_cursor<D: CharDisplay>(&mut self, display: &mut D) -> Result<()> {
        self.move_cursor(display, Direction::Clockwise)
    }

    /// Move the active list's cursor up one item
    pub fn decrement_cursor<D: CharDisplay>(&mut self, display: &mut D) -> Result<()> {
        self.move_cursor(display, Direction::CounterClockwise)
    }

    fn move_cursor<D: CharDisplay>(&mut self, display: &mut D, direction: Direction) -> Result<()> {
        let MenuKind::List(list) = &mut self.tree.node_mut(self.active)?.kind else {
            return Ok(());
        };
        let Some(max_index) = list.max_index() else {
            return Ok(());
        };
        let old = list.cursor;
        let new = match direction {
            Direction::Clockwise if old < max_index => old + 1,
            Direction::CounterClockwise if old > 0 => old - 1,
            _ => return Ok(()),
        };
        list.cursor = new;

        if new < list.start_index {
            list.start_index = new;
            render_list(list, display)
        } else if new > list.start_index + WINDOW {
            list.start_index = new - WINDOW;
            render_list(list, display)
        } else {
            // Only the cursor glyph moves
            display.set_cursor(window_row(list, old), 0)?;
            display.write_str(NO_CURSOR)?;
            display.set_cursor(window_row(list, new), 0)?;
            display.write_str(CURSOR)
        }
    }

    /// Draw the active node
    pub fn render<D, S>(&self, display: &mut D, settings: &S) -> Result<()>
    where
        D: CharDisplay,
        S: SettingSource + ?Sized,
    {
        let node = self.tree.node(self.active)?;
        match &node.kind {
            MenuKind::Blank => display.clear(),
            MenuKind::List(list) => render_list(list, display),
            MenuKind::Toggle(toggle) => render_toggle(node.title, toggle, display, settings),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn window_row(list: &ListMenu, index: usize) -> u8 {
    (index - list.start_index) as u8
}

fn render_list<D: CharDisplay>(list: &ListMenu, display: &mut D) -> Result<()> {
    display.clear()?;
    let Some(max_index) = list.max_index() else {
        return Ok(());
    };
    let visible = list.items.iter().enumerate().skip(list.start_index).take(DISPLAY_ROWS);
    for (index, item) in visible {
        display.set_cursor(window_row(list, index), 0)?;
        display.write_str(if index == list.cursor { CURSOR } else { NO_CURSOR })?;
        display.write_str(truncate(item.label, LABEL_WIDTH))?;
    }
    if list.start_index > 0 {
        display.set_cursor(0, ARROW_COLUMN)?;
        display.write_glyph(GLYPH_UP)?;
    }
    if list.start_index + WINDOW < max_index {
        display.set_cursor(LAST_ROW, ARROW_COLUMN)?;
        display.write_glyph(GLYPH_DOWN)?;
    }
    Ok(())
}

fn render_toggle<D, S>(title: &str, toggle: &ToggleMenu, display: &mut D, settings: &S) -> Result<()>
where
    D: CharDisplay,
    S: SettingSource + ?Sized,
{
    let current = usize::from(settings.setting(toggle.setting));
    display.clear()?;
    display.set_cursor(0, 0)?;
    display.write_str(truncate(title, DISPLAY_COLUMNS))?;
    for (row, label) in (1u8..).zip(toggle.labels) {
        display.set_cursor(row, 0)?;
        display.write_str(if usize::from(row - 1) == current { SET_MARK } else { NO_CURSOR })?;
        display.write_str(truncate(label, LABEL_WIDTH))?;
    }
    Ok(())
}
