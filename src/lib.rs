//! Oscilloscope Front-Panel Controller Library
//!
//! This library provides the core of a bench-oscilloscope front panel:
//! a bank of rotary encoders and a 6x6 button matrix read through
//! SPI-attached I/O expanders, a 20x4 character display carrying a
//! navigable menu tree, and a cached mirror of the remote instrument's
//! channel/timebase/trigger/cursor state driven over a line-oriented
//! SCPI-style socket.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CONTROL LAYER                            │
//! │   Supervisor  │  Panel control loop  │  Action dispatch      │
//! ├─────────────────────────────────────────────────────────────┤
//! │                  MODEL / UI LAYER                            │
//! │  ScopeModel (channels, timebase, trigger, cursor, measure)   │
//! │  Menu arena + navigator                                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │                 PROTOCOL / DRIVER LAYER                      │
//! │  Numeric codec │ Reply framing │ Encoders │ Button matrix    │
//! │  Expander bus  │ Char display  │ Power rails                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │          embedded-hal 1.0 / embedded-io 0.6 traits           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Single-threaded polling**: one loop owns every piece of state
//! - **Closed action set**: knobs, buttons and menu leaves all resolve to
//!   an [`action::Action`] dispatched in one place
//! - **Optimistic vs. authoritative**: fine adjustments update the cache
//!   locally, coarse operations re-read everything from the instrument
//! - **Explicit error handling**: all fallible operations return `Result`

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Unified error type
pub mod error;

/// System configuration and constants
pub mod config;

/// Shared types used across modules
pub mod types;

/// Instrument Protocol
///
/// Numeric codec, reply framing and command vocabulary.
pub mod protocol;

/// Instrument Link
///
/// Command/reply transport over any `embedded-io` stream.
pub mod link;

/// Peripheral Drivers
///
/// I/O expanders, encoders, button matrix and character display.
pub mod drivers;

/// Panel actions
pub mod action;

/// User Interface
///
/// Menu arena, navigation and rendering.
pub mod ui;

/// Instrument State Model
///
/// Cached mirrors of the remote oscilloscope state.
pub mod scope;

/// Power Management
///
/// Board power and backlight rails with fault inputs.
pub mod power;

/// Control Loop
///
/// Polls inputs and dispatches actions.
pub mod control;

/// Session supervision and fail-safe restart
pub mod supervisor;

pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::action::Action;
    pub use crate::config::*;
    pub use crate::control::Panel;
    pub use crate::drivers::display::CharDisplay;
    pub use crate::drivers::expander::ExpanderBus;
    pub use crate::error::{Error, Result};
    pub use crate::link::InstrumentLink;
    pub use crate::scope::model::ScopeModel;
    pub use crate::types::*;

    // Common traits
    pub use embedded_hal::delay::DelayNs;
    pub use embedded_hal::digital::{InputPin, OutputPin};
}
