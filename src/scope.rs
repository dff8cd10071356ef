//! Instrument State Model
//!
//! Cached mirrors of the oscilloscope's channel, timebase, trigger,
//! cursor and measurement state. Each entity has two ways of changing:
//!
//! - `apply_local(change)`: optimistic update after a fine adjustment,
//!   no I/O
//! - `resync(link)`: full re-read from the instrument, overwriting every
//!   cached field
//!
//! Mutators send their command and then apply the change locally.
//! Coarse operations (reset, autoscale, mode changes) are followed by a
//! [`model::ScopeModel::resync`] instead.

pub mod channel;
pub mod cursor;
pub mod measure;
pub mod model;
pub mod timebase;
pub mod trigger;

pub use channel::{Channel, ChannelChange};
pub use cursor::{Cursor, CursorChange};
pub use measure::{Measure, MeasureKind};
pub use model::ScopeModel;
pub use timebase::{Timebase, TimebaseChange};
pub use trigger::{Trigger, TriggerChange};

use crate::error::Result;
use crate::link::InstrumentLink;
use crate::protocol::Command;

/// Relative tolerance for scale bound checks
const BOUND_TOLERANCE: f32 = 1e-3;

/// `min <= value < max`, tolerant of float rounding at the edges
pub(crate) fn within(value: f32, min: f32, max: f32) -> bool {
    value >= min * (1.0 - BOUND_TOLERANCE) && value < max * (1.0 - BOUND_TOLERANCE)
}

/// Send `<header> <value in scientific form><unit>`
pub(crate) fn send_scientific<L: InstrumentLink + ?Sized>(
    link: &mut L,
    header: core::fmt::Arguments<'_>,
    value: f32,
    unit: &str,
) -> Result<()> {
    let mut cmd = Command::from_args(header)?;
    cmd.push_str(" ")?.push_scientific(value)?.push_str(unit)?;
    link.send(cmd.as_str())
}

/// Send `<header> <0|1>`
pub(crate) fn send_bool<L: InstrumentLink + ?Sized>(
    link: &mut L,
    header: core::fmt::Arguments<'_>,
    value: bool,
) -> Result<()> {
    let mut cmd = Command::from_args(header)?;
    cmd.push_str(" ")?.push_bool(value)?;
    link.send(cmd.as_str())
}

/// Send a fully formatted command
pub(crate) fn send_fmt<L: InstrumentLink + ?Sized>(
    link: &mut L,
    args: core::fmt::Arguments<'_>,
) -> Result<()> {
    let cmd = Command::from_args(args)?;
    link.send(cmd.as_str())
}

/// Format a query header
pub(crate) fn query_fmt(args: core::fmt::Arguments<'_>) -> Result<Command> {
    Command::from_args(args)
}

#[cfg(test)]
mod tests {
    use super::within;

    #[test]
    fn bounds_are_half_open() {
        assert!(within(0.002, 0.002, 5.0));
        assert!(within(2.0, 0.002, 5.0));
        assert!(!within(5.0, 0.002, 5.0));
        assert!(!within(0.001, 0.002, 5.0));
    }
}
