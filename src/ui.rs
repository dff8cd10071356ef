//! User Interface
//!
//! Menu screens for the 20x4 display. Menus live in an arena
//! ([`menu::MenuTree`]) with parent indices instead of back pointers, and
//! a single [`navigator::Navigator`] owns the active-menu pointer and
//! every push/pop.

pub mod menu;
pub mod navigator;

pub use menu::{ItemTarget, MenuId, MenuTree, Setting, SettingSource};
pub use navigator::Navigator;
