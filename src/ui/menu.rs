//! Menu arena
//!
//! Nodes are list menus, two-option toggle menus, or the blank root.
//! Each node records its container so `back` can return to it.

use heapless::Vec;

use crate::action::Action;
use crate::error::{MenuError, Result};
use crate::types::ChannelId;

/// Maximum menu nodes in the tree
pub const MAX_MENUS: usize = 48;

/// Maximum items in one list menu
pub const MAX_ITEMS: usize = 16;

/// Index of a node in the [`MenuTree`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MenuId(u8);

impl MenuId {
    /// The blank root
    pub const ROOT: Self = Self(0);

    /// Arena index
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Boolean settings shown by toggle menus
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Setting {
    /// Channel is AC coupled
    AcCoupling(ChannelId),
    /// Channel input is 50 Ohm
    FiftyOhm(ChannelId),
    /// Channel bandwidth limit on
    BandwidthLimit(ChannelId),
    /// Channel inverted
    Invert(ChannelId),
    /// Trigger sweep is Normal
    NormalSweep,
    /// Trigger noise reject on
    NoiseReject,
}

/// Where toggle menus read their current value
pub trait SettingSource {
    /// Current value of `setting`
    fn setting(&self, setting: Setting) -> bool;
}

/// What selecting an item does
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemTarget {
    /// Fire an action
    Action(Action),
    /// Push a sub-menu
    Submenu(MenuId),
}

/// One line of a list menu
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MenuItem {
    /// Text shown after the cursor column
    pub label: &'static str,
    /// Selection target
    pub target: ItemTarget,
}

/// Scrollable list of items
#[derive(Clone, Debug, Default)]
pub struct ListMenu {
    pub(crate) items: Vec<MenuItem, MAX_ITEMS>,
    pub(crate) cursor: usize,
    pub(crate) start_index: usize,
}

impl ListMenu {
    /// Items in display order
    #[must_use]
    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    /// Selected item index
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// First visible item index
    #[must_use]
    pub const fn start_index(&self) -> usize {
        self.start_index
    }

    /// Index of the last item, `None` while empty
    #[must_use]
    pub fn max_index(&self) -> Option<usize> {
        self.items.len().checked_sub(1)
    }
}

/// Two options bound to one boolean setting
#[derive(Clone, Copy, Debug)]
pub struct ToggleMenu {
    /// Setting whose value marks the current option
    pub setting: Setting,
    /// Labels for the `false` and `true` states
    pub labels: [&'static str; 2],
    /// Actions fired when selected in the `false` and `true` states
    pub actions: [Action; 2],
}

/// Node variants
#[derive(Clone, Debug)]
pub enum MenuKind {
    /// Renders nothing
    Blank,
    /// Item list
    List(ListMenu),
    /// Two-option toggle
    Toggle(ToggleMenu),
}

/// One node of the tree
#[derive(Clone, Debug)]
pub struct MenuNode {
    pub(crate) title: &'static str,
    pub(crate) kind: MenuKind,
    pub(crate) container: Option<MenuId>,
    pub(crate) active: bool,
}

impl MenuNode {
    /// Title shown on toggle screens and as the parent item label
    #[must_use]
    pub const fn title(&self) -> &'static str {
        self.title
    }

    /// Node variant
    #[must_use]
    pub const fn kind(&self) -> &MenuKind {
        &self.kind
    }

    /// Parent node; `None` only for the root
    #[must_use]
    pub const fn container(&self) -> Option<MenuId> {
        self.container
    }

    /// Whether this node has input focus
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// List state if this is a list menu
    #[must_use]
    pub const fn as_list(&self) -> Option<&ListMenu> {
        match &self.kind {
            MenuKind::List(list) => Some(list),
            _ => None,
        }
    }

    /// Nodes without content may not become active
    #[must_use]
    pub fn has_content(&self) -> bool {
        match &self.kind {
            MenuKind::Blank | MenuKind::Toggle(_) => true,
            MenuKind::List(list) => !list.items.is_empty(),
        }
    }
}

/// Arena of menu nodes rooted at a blank menu
#[derive(Clone, Debug)]
pub struct MenuTree {
    nodes: Vec<MenuNode, MAX_MENUS>,
}

impl MenuTree {
    /// Tree holding only the blank root
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = Vec::new();
        // An empty Vec always has room for the root
        let _ = nodes.push(MenuNode {
            title: "",
            kind: MenuKind::Blank,
            container: None,
            active: true,
        });
        Self { nodes }
    }

    fn insert(&mut self, container: MenuId, title: &'static str, kind: MenuKind) -> Result<MenuId> {
        self.node(container)?;
        let id = u8::try_from(self.nodes.len()).map_err(|_| MenuError::Full)?;
        self.nodes
            .push(MenuNode {
                title,
                kind,
                container: Some(container),
                active: false,
            })
            .map_err(|_| MenuError::Full)?;
        Ok(MenuId(id))
    }

    /// Add an empty list menu under `container` without linking an item
    pub fn add_list(&mut self, container: MenuId, title: &'static str) -> Result<MenuId> {
        self.insert(container, title, MenuKind::List(ListMenu::default()))
    }

    /// Add a toggle menu under `container` without linking an item
    pub fn add_toggle(&mut self, container: MenuId, title: &'static str, toggle: ToggleMenu) -> Result<MenuId> {
        self.insert(container, title, MenuKind::Toggle(toggle))
    }

    /// Append an item to a list menu
    pub fn add_item(&mut self, menu: MenuId, label: &'static str, target: ItemTarget) -> Result<()> {
        match &mut self.node_mut(menu)?.kind {
            MenuKind::List(list) => list
                .items
                .push(MenuItem { label, target })
                .map_err(|_| MenuError::Full.into()),
            _ => Err(MenuError::UnknownNode.into()),
        }
    }

    /// Append an action item to a list menu
    pub fn add_action(&mut self, menu: MenuId, label: &'static str, action: Action) -> Result<()> {
        self.add_item(menu, label, ItemTarget::Action(action))
    }

    /// Add a list menu and an item in `parent` that opens it
    pub fn add_submenu(&mut self, parent: MenuId, title: &'static str) -> Result<MenuId> {
        let child = self.add_list(parent, title)?;
        self.add_item(parent, title, ItemTarget::Submenu(child))?;
        Ok(child)
    }

    /// Add a toggle menu and an item in `parent` that opens it
    pub fn add_toggle_submenu(&mut self, parent: MenuId, title: &'static str, toggle: ToggleMenu) -> Result<MenuId> {
        let child = self.add_toggle(parent, title, toggle)?;
        self.add_item(parent, title, ItemTarget::Submenu(child))?;
        Ok(child)
    }

    /// Node by id
    pub fn node(&self, id: MenuId) -> Result<&MenuNode> {
        self.nodes.get(id.index()).ok_or_else(|| MenuError::UnknownNode.into())
    }

    pub(crate) fn node_mut(&mut self, id: MenuId) -> Result<&mut MenuNode> {
        self.nodes.get_mut(id.index()).ok_or_else(|| MenuError::UnknownNode.into())
    }

    /// Number of nodes including the root
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root exists from construction
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for MenuTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_blank_and_active() {
        let tree = MenuTree::new();
        let root = tree.node(MenuId::ROOT).unwrap();
        assert!(root.is_active());
        assert!(matches!(root.kind(), MenuKind::Blank));
        assert_eq!(root.container(), None);
    }

    #[test]
    fn submenu_links_parent_item() {
        let mut tree = MenuTree::new();
        let top = tree.add_list(MenuId::ROOT, "Top").unwrap();
        let child = tree.add_submenu(top, "Child").unwrap();
        let list = tree.node(top).unwrap().as_list().unwrap();
        assert_eq!(list.items()[0].target, ItemTarget::Submenu(child));
        assert_eq!(tree.node(child).unwrap().container(), Some(top));
    }

    #[test]
    fn items_only_on_lists() {
        let mut tree = MenuTree::new();
        assert!(tree.add_action(MenuId::ROOT, "x", Action::None).is_err());
    }
}
