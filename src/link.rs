//! Instrument Link
//!
//! Command/reply transport to the oscilloscope. [`InstrumentLink`] is the
//! contract the model and control loop rely on; [`ScpiLink`] implements
//! it over any `embedded-io` byte stream with the instrument's settle
//! times and reply framing.

use embedded_hal::delay::DelayNs;
use embedded_io::{Read, Write};
use heapless::Vec;
use log::{debug, info, trace, warn};

use crate::config::{
    PanelConfig, CONNECTED_BANNER_MS, REPLY_CHUNK_SIZE, REPLY_PAYLOAD_SIZE,
};
use crate::drivers::display::{show_lines, CharDisplay};
use crate::error::{Error, Result};
use crate::protocol::framing::{extract_payload, LINE_TERMINATOR};
use crate::protocol::numeric;
use crate::protocol::parse_bool;

/// One reply payload
pub type Reply = Vec<u8, REPLY_PAYLOAD_SIZE>;

/// Command/reply contract to the instrument
pub trait InstrumentLink {
    /// Send one command line
    fn send(&mut self, command: &str) -> Result<()>;

    /// Send a query and return its framed payload
    fn query(&mut self, query: &str) -> Result<Reply>;

    /// Stop using the link; later calls fail with [`Error::Closed`]
    ///
    /// Pending output is flushed. The underlying stream is only released
    /// when the link is dropped, which for a panel session is when the
    /// supervisor drops the failed session.
    fn close(&mut self) -> Result<()>;

    /// Query a scientific numeral and return its value
    fn query_number(&mut self, query: &str) -> Result<f32> {
        let reply = self.query(query)?;
        Ok(numeric::decode_scientific(&reply)?)
    }

    /// Query a scientific numeral and return mantissa and exponent
    fn query_scientific(&mut self, query: &str) -> Result<(f32, i32)> {
        let reply = self.query(query)?;
        Ok(numeric::parse_scientific(&reply)?)
    }

    /// Query a signed integer-style numeral
    fn query_decimal(&mut self, query: &str) -> Result<f32> {
        let reply = self.query(query)?;
        Ok(numeric::decode(&reply)?)
    }

    /// Query a `0`/`1` flag
    fn query_bool(&mut self, query: &str) -> Result<bool> {
        let reply = self.query(query)?;
        parse_bool(&reply)
    }

    /// Query a keyword and parse it with `parse`
    fn query_keyword<T>(&mut self, query: &str, parse: fn(&[u8]) -> Option<T>) -> Result<T> {
        let reply = self.query(query)?;
        parse(&reply).ok_or(Error::UnexpectedReply)
    }
}

/// [`InstrumentLink`] over a byte stream
pub struct ScpiLink<T, D> {
    io: T,
    delay: D,
    query_settle_ms: u32,
    command_settle_ms: u32,
    rx: [u8; REPLY_CHUNK_SIZE],
    closed: bool,
}

impl<T, D> ScpiLink<T, D>
where
    T: Read + Write,
    D: DelayNs,
{
    /// Wrap a connected stream
    pub fn new(io: T, delay: D, config: &PanelConfig) -> Self {
        Self {
            io,
            delay,
            query_settle_ms: config.query_settle_ms,
            command_settle_ms: config.command_settle_ms,
            rx: [0; REPLY_CHUNK_SIZE],
            closed: false,
        }
    }

    /// Give the stream back
    pub fn into_inner(self) -> T {
        self.io
    }

    /// Whether [`InstrumentLink::close`] has been called
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        if self.closed {
            return Err(Error::Closed);
        }
        trace!("-> {line}");
        self.io.write_all(line.as_bytes()).map_err(Error::transport)?;
        self.io.write_all(LINE_TERMINATOR).map_err(Error::transport)?;
        self.io.flush().map_err(Error::transport)
    }
}

impl<T, D> InstrumentLink for ScpiLink<T, D>
where
    T: Read + Write,
    D: DelayNs,
{
    fn send(&mut self, command: &str) -> Result<()> {
        self.write_line(command)?;
        self.delay.delay_ms(self.command_settle_ms);
        Ok(())
    }

    fn query(&mut self, query: &str) -> Result<Reply> {
        self.write_line(query)?;
        self.delay.delay_ms(self.query_settle_ms);

        let n = self.io.read(&mut self.rx).map_err(Error::transport)?;
        if n == 0 {
            return Err(Error::Closed);
        }
        let payload = extract_payload(&self.rx[..n])?;
        trace!("<- {:?}", core::str::from_utf8(payload).unwrap_or("<binary>"));
        Vec::from_slice(payload).map_err(|()| Error::Framing)
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            info!("instrument link closed");
            return self.io.flush().map_err(Error::transport);
        }
        Ok(())
    }
}

/// Connect to the instrument, retrying until it answers
///
/// `connect` is tried once per round. The display shows the address
/// while trying and a per-second countdown after a failure.
pub fn connect_with_retry<T, F, C, D>(
    mut connect: F,
    host: &str,
    config: &PanelConfig,
    display: &mut C,
    delay: &mut D,
) -> Result<T>
where
    F: FnMut() -> Result<T>,
    C: CharDisplay,
    D: DelayNs,
{
    let mut port = heapless::String::<16>::new();
    core::fmt::write(&mut port, format_args!("Port: {}", config.instrument_port))?;
    let mut address = heapless::String::<32>::new();
    let shown = host.get(..16).unwrap_or(host);
    core::fmt::write(&mut address, format_args!("IP: {shown}"))?;

    loop {
        show_lines(display, &["Trying to connect...", &address, &port])?;
        match connect() {
            Ok(link) => {
                info!("connected to {host}:{}", config.instrument_port);
                show_lines(display, &["Connected!"])?;
                delay.delay_ms(CONNECTED_BANNER_MS);
                return Ok(link);
            }
            Err(e) => {
                warn!("connect to {host}:{} failed: {e}", config.instrument_port);
                for remaining in (1..=config.connect_retry_secs).rev() {
                    let countdown = countdown_line(remaining)?;
                    show_lines(display, &["Unable to connect...", &countdown])?;
                    delay.delay_ms(1_000);
                }
                debug!("retrying connection");
            }
        }
    }
}

fn countdown_line(remaining: u32) -> Result<heapless::String<24>> {
    let mut line = heapless::String::new();
    core::fmt::write(&mut line, format_args!("Trying again in {remaining}s"))?;
    Ok(line)
}
