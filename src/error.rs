//! Unified error type for the panel.
//!
//! All variants carry only fixed-size data so the core stays `no_std`
//! and allocation free.

use core::fmt;

/// Failures decoding the instrument's signed mantissa/exponent numerals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumericError {
    /// Token had no bytes at all.
    Empty,
    /// First byte was not `+` or `-`.
    MissingSign,
    /// Sign present but no digit followed.
    NoDigits,
    /// A byte that is neither digit, sign nor decimal point.
    InvalidByte(u8),
    /// More than one decimal point in the mantissa.
    MultiplePoints,
    /// Scientific literal without the `E` separator.
    MissingExponent,
    /// Encoded token does not fit the output buffer.
    Overflow,
}

impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty numeric token"),
            Self::MissingSign => write!(f, "numeric token has no leading sign"),
            Self::NoDigits => write!(f, "numeric token has no digits"),
            Self::InvalidByte(b) => write!(f, "invalid byte 0x{b:02X} in numeric token"),
            Self::MultiplePoints => write!(f, "numeric token has more than one decimal point"),
            Self::MissingExponent => write!(f, "numeric literal has no exponent"),
            Self::Overflow => write!(f, "numeric token too long"),
        }
    }
}

/// Illegal menu transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuError {
    /// Node has no items or options to show.
    Empty,
    /// Operation needs an active node.
    NotActive,
    /// Menu arena or item list is at capacity.
    Full,
    /// Menu id does not name a node in the tree.
    UnknownNode,
}

impl fmt::Display for MenuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "menu has no content"),
            Self::NotActive => write!(f, "menu is not active"),
            Self::Full => write!(f, "menu capacity exceeded"),
            Self::UnknownNode => write!(f, "unknown menu node"),
        }
    }
}

/// Top-level error type used across the panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// Malformed numeral in an instrument reply.
    Numeric(NumericError),
    /// Reply chunk did not follow the footer/line framing.
    Framing,
    /// Keyword reply outside the accepted set.
    UnexpectedReply,
    /// Instrument stream failed.
    Transport(embedded_io::ErrorKind),
    /// Instrument closed the stream.
    Closed,
    /// SPI transaction to an expander failed.
    Bus(embedded_hal::spi::ErrorKind),
    /// GPIO line could not be read or driven.
    Pin(embedded_hal::digital::ErrorKind),
    /// Character display rejected a write.
    Display,
    /// Illegal menu transition.
    Menu(MenuError),
    /// A button row stayed asserted past the release poll limit.
    StuckButton {
        /// Row bits still asserted on the last poll.
        rows: u8,
    },
    /// Command line did not fit its buffer.
    Format,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(e) => write!(f, "numeric: {e}"),
            Self::Framing => write!(f, "reply framing not recognised"),
            Self::UnexpectedReply => write!(f, "unexpected instrument reply"),
            Self::Transport(kind) => write!(f, "instrument transport error: {kind:?}"),
            Self::Closed => write!(f, "instrument closed the connection"),
            Self::Bus(kind) => write!(f, "expander bus error: {kind:?}"),
            Self::Pin(kind) => write!(f, "gpio error: {kind:?}"),
            Self::Display => write!(f, "display write failed"),
            Self::Menu(e) => write!(f, "menu: {e}"),
            Self::StuckButton { rows } => write!(f, "button stuck (rows 0b{rows:06b})"),
            Self::Format => write!(f, "command buffer overflow"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for NumericError {}

#[cfg(feature = "std")]
impl std::error::Error for MenuError {}

// Convenience conversions

impl From<NumericError> for Error {
    fn from(e: NumericError) -> Self {
        Error::Numeric(e)
    }
}

impl From<MenuError> for Error {
    fn from(e: MenuError) -> Self {
        Error::Menu(e)
    }
}

impl From<core::fmt::Error> for Error {
    fn from(_: core::fmt::Error) -> Self {
        Error::Format
    }
}

impl Error {
    /// Map any `embedded-io` error onto the transport variant.
    pub fn transport<E: embedded_io::Error>(e: E) -> Self {
        Error::Transport(e.kind())
    }

    /// Map any SPI error onto the bus variant.
    pub fn bus<E: embedded_hal::spi::Error>(e: E) -> Self {
        Error::Bus(e.kind())
    }

    /// Map any GPIO error onto the pin variant.
    pub fn pin<E: embedded_hal::digital::Error>(e: E) -> Self {
        Error::Pin(e.kind())
    }
}

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, Error>;
