//! Instrument Link Tests
//!
//! Tests for the command/reply transport against a scripted instrument:
//! settle delays, reply framing behind stale echoes, closed and broken
//! streams, typed queries and the connect/retry screen flow.
//! Run with: cargo test --features std --test link_tests

mod common;

use std::cell::Cell;

use common::{link, test_config, FakeDelay, RecordingDisplay, SimInstrument};
use scope_panel::config::{PanelConfig, COMMAND_SETTLE_MS, CONNECTED_BANNER_MS, QUERY_SETTLE_MS};
use scope_panel::link::{connect_with_retry, InstrumentLink, ScpiLink};
use scope_panel::types::{Coupling, TimebaseMode};
use scope_panel::Error;

// =============================================================================
// Send / Query Tests
// =============================================================================

#[test]
fn send_writes_one_line() {
    let scope = SimInstrument::new();
    let mut link = link(&scope);
    link.send("CHAN1:BWL 1").unwrap();
    assert_eq!(scope.received(), vec!["CHAN1:BWL 1"]);
    assert_eq!(scope.get("CHAN1:BWL").as_deref(), Some("1"));
}

#[test]
fn query_returns_payload() {
    let scope = SimInstrument::new();
    let mut link = link(&scope);
    let reply = link.query("TIM:SCAL?").unwrap();
    assert_eq!(reply.as_slice(), b"+1.0E-04");
}

#[test]
fn query_skips_stale_echoes() {
    let scope = SimInstrument::new();
    let mut link = link(&scope);
    // both set commands leave their echo and prompt unread
    link.send("TRIG:SWE NORM").unwrap();
    link.send("CHAN1:COUP AC").unwrap();
    let reply = link.query("TRIG:SWE?").unwrap();
    assert_eq!(reply.as_slice(), b"NORM");
}

#[test]
fn settle_delays_follow_config() {
    let scope = SimInstrument::new();
    let delay = FakeDelay::default();
    let mut link = ScpiLink::new(scope.clone(), delay.clone(), &PanelConfig::new());
    link.send("CHAN1:INV 1").unwrap();
    assert_eq!(delay.elapsed_ms(), u64::from(COMMAND_SETTLE_MS));
    link.query("CHAN1:INV?").unwrap();
    assert_eq!(delay.elapsed_ms(), u64::from(COMMAND_SETTLE_MS + QUERY_SETTLE_MS));
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn empty_read_means_closed() {
    let scope = SimInstrument::new();
    scope.set_silent(true);
    let mut link = link(&scope);
    assert_eq!(link.query("TIM:SCAL?"), Err(Error::Closed));
}

#[test]
fn broken_stream_is_transport_error() {
    let scope = SimInstrument::new();
    scope.set_broken(true);
    let mut link = link(&scope);
    assert_eq!(
        link.send("*CLS"),
        Err(Error::Transport(embedded_io::ErrorKind::BrokenPipe))
    );
}

#[test]
fn unframed_reply_is_framing_error() {
    let scope = SimInstrument::new();
    scope.set_silent(true);
    scope.push_raw(b"no footer here");
    let mut link = link(&scope);
    assert_eq!(link.query("TIM:SCAL?"), Err(Error::Framing));
}

#[test]
fn closed_link_refuses_traffic() {
    let scope = SimInstrument::new();
    let mut link = link(&scope);
    link.close().unwrap();
    assert!(link.is_closed());
    assert_eq!(link.send("*CLS"), Err(Error::Closed));
    assert_eq!(link.query("TIM:SCAL?"), Err(Error::Closed));
    assert!(scope.received().is_empty());
    // closing twice is harmless
    assert_eq!(link.close(), Ok(()));
}

// =============================================================================
// Typed Query Tests
// =============================================================================

#[test]
fn typed_queries() {
    let scope = SimInstrument::new();
    scope.set("CHAN2:COUP", "AC");
    scope.set("TIM:MODE", "ROLL");
    let mut link = link(&scope);

    assert!(link.query_bool("CHAN1:DISP?").unwrap());
    assert!(!link.query_bool("CHAN2:DISP?").unwrap());
    assert_eq!(link.query_keyword("CHAN2:COUP?", Coupling::from_keyword), Ok(Coupling::Ac));
    assert_eq!(
        link.query_keyword("TIM:MODE?", TimebaseMode::from_keyword),
        Ok(TimebaseMode::Roll)
    );
    assert_eq!(link.query_decimal(":OPER:COND?"), Ok(8.0));
    assert!((link.query_number("TIM:SCAL?").unwrap() - 1e-4).abs() < 1e-9);
}

#[test]
fn query_scientific_keeps_parts() {
    let scope = SimInstrument::new();
    scope.set("CHAN3:SCAL", "+5.0E-02");
    let mut link = link(&scope);
    let (mantissa, exponent) = link.query_scientific("CHAN3:SCAL?").unwrap();
    assert!((mantissa - 5.0).abs() < 1e-6);
    assert_eq!(exponent, -2);
}

#[test]
fn unknown_reply_is_rejected() {
    let scope = SimInstrument::new();
    let mut link = link(&scope);
    assert!(matches!(link.query_number("BOGUS?"), Err(Error::Numeric(_))));
    assert_eq!(link.query_bool("BOGUS?"), Err(Error::UnexpectedReply));
    assert_eq!(
        link.query_keyword("BOGUS?", Coupling::from_keyword),
        Err(Error::UnexpectedReply)
    );
}

// =============================================================================
// Connect Tests
// =============================================================================

#[test]
fn connect_first_try_shows_banner() {
    let mut display = RecordingDisplay::default();
    let mut delay = FakeDelay::default();
    let config = test_config();
    let value = connect_with_retry(|| Ok(7), "10.0.0.2", &config, &mut display, &mut delay).unwrap();
    assert_eq!(value, 7);
    assert_eq!(display.line(0), "Connected!");
    assert_eq!(delay.elapsed_ms(), u64::from(CONNECTED_BANNER_MS));
}

#[test]
fn connect_retries_after_countdown() {
    let mut display = RecordingDisplay::default();
    let mut delay = FakeDelay::default();
    let config = PanelConfig {
        connect_retry_secs: 2,
        ..test_config()
    };
    let attempts = Cell::new(0);
    let value = connect_with_retry(
        || {
            attempts.set(attempts.get() + 1);
            if attempts.get() == 1 {
                Err(Error::Closed)
            } else {
                Ok("link")
            }
        },
        "10.0.0.2",
        &config,
        &mut display,
        &mut delay,
    )
    .unwrap();

    assert_eq!(value, "link");
    assert_eq!(attempts.get(), 2);
    // two countdown seconds plus the banner
    assert_eq!(delay.elapsed_ms(), 2_000 + u64::from(CONNECTED_BANNER_MS));
    // trying, 2s, 1s, trying, connected
    assert_eq!(display.clears, 5);
    assert_eq!(display.line(0), "Connected!");
}
