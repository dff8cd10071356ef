//! Panel actions
//!
//! Every knob binding, button and menu leaf resolves to one [`Action`].
//! The control loop dispatches them in a single place, so no input
//! holds a reference into the model.

use crate::scope::measure::MeasureKind;
use crate::types::{
    ChannelId, Coupling, CursorId, CursorMode, Direction, Impedance, SourceSlot, TimebaseMode,
    TimebaseReference, TriggerSlope, TriggerSource, TriggerSweep,
};
use crate::ui::menu::MenuId;

/// A discrete user intent
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Action {
    /// Do nothing
    #[default]
    None,

    // Navigation
    /// Select on the active menu
    MenuSelect,
    /// Return to the active menu's container
    MenuBack,
    /// Move the cursor of `menu` if it is still active
    MenuCursor {
        /// Menu the knob was bound to
        menu: MenuId,
        /// Clockwise moves down the list
        direction: Direction,
    },
    /// Push a menu unless it is already active
    OpenMenu(MenuId),
    /// Show a label for a function the panel does not model
    ShowLabel(&'static str),

    // Channels
    /// Channel button: enable and open, close and disable, or open
    ChannelButton(ChannelId),
    /// Step the vertical scale on the 1-2-5 ladder
    ChannelScale(ChannelId, Direction),
    /// Nudge the vertical offset
    ChannelOffset(ChannelId, Direction),
    /// Zero the vertical offset
    ChannelOffsetZero(ChannelId),
    /// Set input coupling
    SetCoupling(ChannelId, Coupling),
    /// Set input impedance
    SetImpedance(ChannelId, Impedance),
    /// Set the bandwidth limit
    SetBandwidthLimit(ChannelId, bool),
    /// Set waveform inversion
    SetInvert(ChannelId, bool),

    // Timebase
    /// Step the horizontal scale
    TimebaseScale(Direction),
    /// Nudge the horizontal position
    TimebasePosition(Direction),
    /// Zero the horizontal position
    TimebasePositionZero,
    /// Change horizontal mode (resyncs)
    SetTimebaseMode(TimebaseMode),
    /// Toggle between Main and Window
    ToggleZoom,
    /// Set the reference position
    SetTimebaseReference(TimebaseReference),

    // Trigger
    /// Nudge the trigger level
    TriggerLevel(Direction),
    /// Move the trigger level to the source channel's offset
    TriggerLevelCenter,
    /// Set the edge trigger source
    SetTriggerSource(TriggerSource),
    /// Set the edge slope
    SetTriggerSlope(TriggerSlope),
    /// Set the sweep mode
    SetTriggerSweep(TriggerSweep),
    /// Set noise reject
    SetNoiseReject(bool),

    // Cursors
    /// Set the cursor mode (resyncs)
    SetCursorMode(CursorMode),
    /// Make one cursor active
    SelectCursor(CursorId),
    /// Advance to the next cursor
    CycleCursor,
    /// Nudge the active cursor
    CursorMove(Direction),
    /// Set a cursor source channel
    SetCursorSource(SourceSlot, ChannelId),

    // Measurements
    /// Add a measurement on the current sources
    Measure(MeasureKind),
    /// Set a measurement source channel
    SetMeasureSource(SourceSlot, ChannelId),
    /// Remove all measurements
    ClearMeasurements,

    // Acquisition
    /// Toggle between running and stopped
    RunStop,
    /// Single acquisition
    Single,
    /// Autoscale (resyncs)
    AutoScale,
    /// Factory default setup (resyncs)
    DefaultSetup,
}

impl Action {
    /// Whether the action rewrites enough state to need a full resync
    #[must_use]
    pub const fn needs_resync(self) -> bool {
        matches!(
            self,
            Self::SetTimebaseMode(_)
                | Self::ToggleZoom
                | Self::SetCursorMode(_)
                | Self::AutoScale
                | Self::DefaultSetup
        )
    }
}
