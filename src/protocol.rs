//! Instrument Protocol
//!
//! The oscilloscope speaks a line-oriented SCPI-style dialect over a
//! telnet-like socket. Commands are `HEADER argument\r\n`, queries are
//! `HEADER?\r\n` and every reply arrives framed behind an echo of the
//! query and ahead of a fixed prompt footer.
//!
//! - [`numeric`]: signed mantissa/exponent numerals
//! - [`framing`]: reply payload extraction
//! - [`command`]: command line builder

pub mod command;
pub mod framing;
pub mod numeric;

pub use command::Command;
pub use framing::extract_payload;
pub use numeric::{decode, encode, format_scientific, parse_scientific};

/// Parse a boolean reply (`0`, `1`, `+0`, `+1`, `ON`, `OFF`)
pub fn parse_bool(reply: &[u8]) -> crate::Result<bool> {
    match reply {
        b"1" | b"+1" | b"ON" => Ok(true),
        b"0" | b"+0" | b"OFF" => Ok(false),
        _ => Err(crate::Error::UnexpectedReply),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_replies() {
        assert_eq!(parse_bool(b"+1"), Ok(true));
        assert_eq!(parse_bool(b"0"), Ok(false));
        assert_eq!(parse_bool(b"2"), Err(crate::Error::UnexpectedReply));
    }
}
