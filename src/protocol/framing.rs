//! Reply framing
//!
//! A reply chunk read from the socket looks like
//!
//! ```text
//! <echoed query>\r\n<payload>\r\n>
//! ```
//!
//! Older bytes (echoes and prompts of earlier commands) may precede it.
//! The chunk is read from the end: drop the fixed 4-byte footer, then the
//! payload is everything after the last line feed that remains.

use crate::error::{Error, Result};

/// Bytes that trail every reply (`\r\n> `)
pub const REPLY_FOOTER_LEN: usize = 4;

/// Prompt the instrument prints after every line
pub const REPLY_FOOTER: &[u8; REPLY_FOOTER_LEN] = b"\r\n> ";

/// Line terminator for outgoing commands
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

/// Isolate the payload of one reply chunk
///
/// Fails with [`Error::Framing`] when the chunk is shorter than the
/// footer or no line feed precedes the payload.
pub fn extract_payload(chunk: &[u8]) -> Result<&[u8]> {
    if chunk.len() < REPLY_FOOTER_LEN {
        return Err(Error::Framing);
    }
    let body = &chunk[..chunk.len() - REPLY_FOOTER_LEN];
    let start = body
        .iter()
        .rposition(|&b| b == b'\n')
        .ok_or(Error::Framing)?;
    Ok(&body[start + 1..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_after_echo() {
        assert_eq!(
            extract_payload(b"CHAN1:SCAL?\r\n+2.0E-01\r\n> "),
            Ok(&b"+2.0E-01"[..])
        );
    }

    #[test]
    fn stale_prefix_ignored() {
        assert_eq!(
            extract_payload(b":RUN\r\n> TIM:MODE?\r\nMAIN\r\n> "),
            Ok(&b"MAIN"[..])
        );
    }

    #[test]
    fn short_chunk_rejected() {
        assert_eq!(extract_payload(b"> "), Err(Error::Framing));
    }

    #[test]
    fn missing_line_feed_rejected() {
        assert_eq!(extract_payload(b"MAIN\r\n> "), Err(Error::Framing));
    }
}
