//! Shared types used across the panel
//!
//! This module defines the instrument-facing vocabulary (channels,
//! timebase modes, trigger and cursor settings) together with the
//! [`Scale`] value that carries the 1-2-5 stepping policy.

use core::fmt;
#[cfg(not(feature = "std"))]
use micromath::F32Ext;

/// Knob rotation direction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Clockwise rotation
    Clockwise,
    /// Counter-clockwise rotation
    CounterClockwise,
}

impl Direction {
    /// +1.0 for clockwise, -1.0 otherwise
    #[must_use]
    pub const fn sign(self) -> f32 {
        match self {
            Self::Clockwise => 1.0,
            Self::CounterClockwise => -1.0,
        }
    }
}

/// Case-insensitive prefix match of an instrument keyword reply
#[must_use]
pub fn keyword_matches(reply: &[u8], keyword: &str) -> bool {
    let keyword = keyword.as_bytes();
    reply.len() >= keyword.len()
        && reply
            .iter()
            .zip(keyword)
            .all(|(r, k)| r.to_ascii_uppercase() == *k)
}

/// Analog input channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChannelId {
    /// Channel 1
    Ch1,
    /// Channel 2
    Ch2,
    /// Channel 3
    Ch3,
    /// Channel 4
    Ch4,
}

impl ChannelId {
    /// All channels in front-panel order
    pub const ALL: [Self; 4] = [Self::Ch1, Self::Ch2, Self::Ch3, Self::Ch4];

    /// Channel number 1..=4
    #[must_use]
    pub const fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    /// Zero-based index
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Ch1 => 0,
            Self::Ch2 => 1,
            Self::Ch3 => 2,
            Self::Ch4 => 3,
        }
    }

    /// Channel from a zero-based index
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Ch1),
            1 => Some(Self::Ch2),
            2 => Some(Self::Ch3),
            3 => Some(Self::Ch4),
            _ => None,
        }
    }

    /// Parse a `CHANn` keyword
    #[must_use]
    pub fn from_keyword(reply: &[u8]) -> Option<Self> {
        if !keyword_matches(reply, "CHAN") {
            return None;
        }
        // Long form is CHANNEL<n>; the digit is always last
        match reply.iter().rev().find(|b| !b.is_ascii_whitespace()) {
            Some(b'1') => Some(Self::Ch1),
            Some(b'2') => Some(Self::Ch2),
            Some(b'3') => Some(Self::Ch3),
            Some(b'4') => Some(Self::Ch4),
            _ => None,
        }
    }

    /// Menu label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ch1 => "Channel 1",
            Self::Ch2 => "Channel 2",
            Self::Ch3 => "Channel 3",
            Self::Ch4 => "Channel 4",
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CHAN{}", self.number())
    }
}

/// Which of a pair of source slots (cursor and measurement sources)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceSlot {
    /// First source
    First,
    /// Second source
    Second,
}

/// Input coupling
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Coupling {
    /// DC coupled
    #[default]
    Dc,
    /// AC coupled
    Ac,
}

impl Coupling {
    /// Command keyword
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Dc => "DC",
            Self::Ac => "AC",
        }
    }

    /// Parse a reply keyword
    #[must_use]
    pub fn from_keyword(reply: &[u8]) -> Option<Self> {
        if keyword_matches(reply, "AC") {
            Some(Self::Ac)
        } else if keyword_matches(reply, "DC") {
            Some(Self::Dc)
        } else {
            None
        }
    }
}

/// Input impedance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Impedance {
    /// 1 MOhm
    #[default]
    OneMeg,
    /// 50 Ohm
    Fifty,
}

impl Impedance {
    /// Command keyword
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::OneMeg => "ONEM",
            Self::Fifty => "FIFT",
        }
    }

    /// Parse a reply keyword
    #[must_use]
    pub fn from_keyword(reply: &[u8]) -> Option<Self> {
        if keyword_matches(reply, "ONEM") {
            Some(Self::OneMeg)
        } else if keyword_matches(reply, "FIFT") {
            Some(Self::Fifty)
        } else {
            None
        }
    }
}

/// Horizontal mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TimebaseMode {
    /// Normal display
    #[default]
    Main,
    /// Zoomed window
    Window,
    /// XY display
    Xy,
    /// Roll mode
    Roll,
}

impl TimebaseMode {
    /// All modes in menu order
    pub const ALL: [Self; 4] = [Self::Main, Self::Window, Self::Xy, Self::Roll];

    /// Command keyword
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Main => "MAIN",
            Self::Window => "WIND",
            Self::Xy => "XY",
            Self::Roll => "ROLL",
        }
    }

    /// Menu label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Main => "Main",
            Self::Window => "Zoom",
            Self::Xy => "XY",
            Self::Roll => "Roll",
        }
    }

    /// Parse a reply keyword
    #[must_use]
    pub fn from_keyword(reply: &[u8]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| keyword_matches(reply, mode.keyword()))
    }
}

/// Horizontal reference position
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TimebaseReference {
    /// Left edge
    Left,
    /// Screen centre
    #[default]
    Center,
    /// Right edge
    Right,
}

impl TimebaseReference {
    /// All references in menu order
    pub const ALL: [Self; 3] = [Self::Left, Self::Center, Self::Right];

    /// Command keyword
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Left => "LEFT",
            Self::Center => "CENT",
            Self::Right => "RIGH",
        }
    }

    /// Menu label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Left => "Left",
            Self::Center => "Center",
            Self::Right => "Right",
        }
    }

    /// Parse a reply keyword
    #[must_use]
    pub fn from_keyword(reply: &[u8]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|reference| keyword_matches(reply, reference.keyword()))
    }
}

/// Trigger source
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerSource {
    /// Analog channel
    Channel(ChannelId),
    /// External trigger input
    External,
    /// Mains line
    Line,
}

impl Default for TriggerSource {
    fn default() -> Self {
        Self::Channel(ChannelId::Ch1)
    }
}

impl TriggerSource {
    /// All sources in menu order
    pub const ALL: [Self; 6] = [
        Self::Channel(ChannelId::Ch1),
        Self::Channel(ChannelId::Ch2),
        Self::Channel(ChannelId::Ch3),
        Self::Channel(ChannelId::Ch4),
        Self::External,
        Self::Line,
    ];

    /// Menu label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Channel(ch) => ch.label(),
            Self::External => "External",
            Self::Line => "Line",
        }
    }

    /// Parse a reply keyword
    #[must_use]
    pub fn from_keyword(reply: &[u8]) -> Option<Self> {
        if keyword_matches(reply, "EXT") {
            Some(Self::External)
        } else if keyword_matches(reply, "LINE") {
            Some(Self::Line)
        } else {
            ChannelId::from_keyword(reply).map(Self::Channel)
        }
    }
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(ch) => write!(f, "{ch}"),
            Self::External => write!(f, "EXT"),
            Self::Line => write!(f, "LINE"),
        }
    }
}

/// Edge trigger slope
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TriggerSlope {
    /// Rising edge
    #[default]
    Positive,
    /// Falling edge
    Negative,
    /// Either edge
    Either,
    /// Alternating edges
    Alternating,
}

impl TriggerSlope {
    /// All slopes in menu order
    pub const ALL: [Self; 4] = [
        Self::Positive,
        Self::Negative,
        Self::Either,
        Self::Alternating,
    ];

    /// Command keyword
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Positive => "POS",
            Self::Negative => "NEG",
            Self::Either => "EITH",
            Self::Alternating => "ALT",
        }
    }

    /// Menu label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Positive => "Rising",
            Self::Negative => "Falling",
            Self::Either => "Either",
            Self::Alternating => "Alternating",
        }
    }

    /// Parse a reply keyword
    #[must_use]
    pub fn from_keyword(reply: &[u8]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|slope| keyword_matches(reply, slope.keyword()))
    }
}

/// Trigger sweep
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TriggerSweep {
    /// Free-run when no trigger arrives
    #[default]
    Auto,
    /// Wait for a trigger
    Normal,
}

impl TriggerSweep {
    /// Command keyword
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Auto => "AUTO",
            Self::Normal => "NORM",
        }
    }

    /// Parse a reply keyword
    #[must_use]
    pub fn from_keyword(reply: &[u8]) -> Option<Self> {
        if keyword_matches(reply, "AUTO") {
            Some(Self::Auto)
        } else if keyword_matches(reply, "NORM") {
            Some(Self::Normal)
        } else {
            None
        }
    }
}

/// Cursor (marker) mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CursorMode {
    /// Cursors hidden
    #[default]
    Off,
    /// Manually placed
    Manual,
    /// Follow the active measurement
    Measurement,
    /// Track the waveform
    Waveform,
}

impl CursorMode {
    /// All modes in menu order
    pub const ALL: [Self; 4] = [Self::Off, Self::Manual, Self::Measurement, Self::Waveform];

    /// Command keyword
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Manual => "MAN",
            Self::Measurement => "MEAS",
            Self::Waveform => "WAV",
        }
    }

    /// Menu label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Manual => "Manual",
            Self::Measurement => "Measurement",
            Self::Waveform => "Track waveform",
        }
    }

    /// Parse a reply keyword
    #[must_use]
    pub fn from_keyword(reply: &[u8]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| keyword_matches(reply, mode.keyword()))
    }
}

/// Individual cursor
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CursorId {
    /// First time cursor
    #[default]
    X1,
    /// Second time cursor
    X2,
    /// First voltage cursor
    Y1,
    /// Second voltage cursor
    Y2,
}

impl CursorId {
    /// All cursors in cycle order
    pub const ALL: [Self; 4] = [Self::X1, Self::X2, Self::Y1, Self::Y2];

    /// Zero-based index
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::X1 => 0,
            Self::X2 => 1,
            Self::Y1 => 2,
            Self::Y2 => 3,
        }
    }

    /// Next cursor in cycle order
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::X1 => Self::X2,
            Self::X2 => Self::Y1,
            Self::Y1 => Self::Y2,
            Self::Y2 => Self::X1,
        }
    }

    /// Time cursors move along X
    #[must_use]
    pub const fn is_time(self) -> bool {
        matches!(self, Self::X1 | Self::X2)
    }

    /// Source slot that scales this cursor's voltage axis
    #[must_use]
    pub const fn slot(self) -> SourceSlot {
        match self {
            Self::X1 | Self::Y1 => SourceSlot::First,
            Self::X2 | Self::Y2 => SourceSlot::Second,
        }
    }

    /// Command header for the position
    #[must_use]
    pub const fn position_header(self) -> &'static str {
        match self {
            Self::X1 => "MARK:X1P",
            Self::X2 => "MARK:X2P",
            Self::Y1 => "MARK:Y1P",
            Self::Y2 => "MARK:Y2P",
        }
    }

    /// Menu label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::X1 => "X1",
            Self::X2 => "X2",
            Self::Y1 => "Y1",
            Self::Y2 => "Y2",
        }
    }
}

/// A 1-2-5 scale value kept as mantissa and decimal exponent
///
/// The mantissa is normalised to `1 <= m < 10` so its leading digit
/// drives the stepping policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scale {
    mantissa: f32,
    exponent: i32,
}

impl Scale {
    const EPSILON: f32 = 1e-3;

    /// Build from mantissa and exponent, normalising the mantissa
    #[must_use]
    pub fn new(mantissa: f32, exponent: i32) -> Self {
        let mut scale = Self { mantissa, exponent };
        if mantissa == 0.0 || !mantissa.is_finite() {
            return scale;
        }
        while scale.mantissa.abs() >= 10.0 - Self::EPSILON {
            scale.mantissa /= 10.0;
            scale.exponent += 1;
        }
        while scale.mantissa.abs() < 1.0 - Self::EPSILON {
            scale.mantissa *= 10.0;
            scale.exponent -= 1;
        }
        scale
    }

    /// Split a value into mantissa and exponent
    #[must_use]
    pub fn from_value(value: f32) -> Self {
        if value == 0.0 || !value.is_finite() {
            return Self {
                mantissa: 0.0,
                exponent: 0,
            };
        }
        #[allow(clippy::cast_possible_truncation)]
        let exponent = value.abs().log10().floor() as i32;
        Self::new(value / 10f32.powi(exponent), exponent)
    }

    /// Normalised mantissa
    #[must_use]
    pub const fn mantissa(self) -> f32 {
        self.mantissa
    }

    /// Decimal exponent
    #[must_use]
    pub const fn exponent(self) -> i32 {
        self.exponent
    }

    /// Derived value `mantissa x 10^exponent`
    #[must_use]
    pub fn value(self) -> f32 {
        self.mantissa * 10f32.powi(self.exponent)
    }

    /// Whether the mantissa is a whole number (1, 2 and 5 always are)
    #[must_use]
    pub fn is_integral(self) -> bool {
        (self.mantissa - self.mantissa.round()).abs() < Self::EPSILON
    }

    /// Next value on the 1-2-5 ladder
    ///
    /// Mantissas off the ladder snap to the next ladder value in the
    /// direction of rotation.
    #[must_use]
    pub fn step(self, direction: Direction) -> Self {
        let m = self.mantissa;
        let e = self.exponent;
        let (mantissa, exponent) = match direction {
            Direction::Clockwise => {
                if m < 2.0 - Self::EPSILON {
                    (2.0, e)
                } else if m < 5.0 - Self::EPSILON {
                    (5.0, e)
                } else {
                    (1.0, e + 1)
                }
            }
            Direction::CounterClockwise => {
                if m > 5.0 + Self::EPSILON {
                    (5.0, e)
                } else if m > 2.0 + Self::EPSILON {
                    (2.0, e)
                } else if m > 1.0 + Self::EPSILON {
                    (1.0, e)
                } else {
                    (5.0, e - 1)
                }
            }
        };
        Self { mantissa, exponent }
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self {
            mantissa: 1.0,
            exponent: 0,
        }
    }
}
