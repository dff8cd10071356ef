//! Power Management Tests
//!
//! Tests for the board power and backlight rails: fault-gated enables,
//! fault polling with instrument notification, and the safe state.
//! Run with: cargo test --features std --test power_tests

mod common;

use common::{link, FakeOutput, FakePin, RailLines, SimInstrument, TestRails};
use scope_panel::power::{PowerRails, Rail, RailState};
use scope_panel::Error;

// =============================================================================
// Enable Tests
// =============================================================================

#[test]
fn rails_start_off() {
    let lines = RailLines::new();
    let rails = lines.rails();
    assert_eq!(rails.state(Rail::Power), RailState::Off);
    assert_eq!(rails.state(Rail::Backlight), RailState::Off);
    assert!(!lines.power_enable.get());
}

#[test]
fn enable_drives_output() {
    let lines = RailLines::new();
    let mut rails = lines.rails();
    assert_eq!(rails.enable_power(), Ok(true));
    assert_eq!(rails.enable_backlight(), Ok(true));
    assert!(lines.power_enable.get());
    assert!(lines.backlight_enable.get());
    assert_eq!(rails.state(Rail::Backlight), RailState::On);
}

#[test]
fn enable_refused_while_fault_asserted() {
    let lines = RailLines::new();
    lines.power_fault.set(false);
    let mut rails = lines.rails();
    assert_eq!(rails.enable_power(), Ok(false));
    assert!(!lines.power_enable.get());
    assert_eq!(rails.state(Rail::Power), RailState::Faulted);
}

#[test]
fn disable_switches_off() {
    let lines = RailLines::new();
    let mut rails = lines.rails();
    rails.enable_backlight().unwrap();
    rails.disable(Rail::Backlight).unwrap();
    assert!(!lines.backlight_enable.get());
    assert_eq!(rails.state(Rail::Backlight), RailState::Off);
}

// =============================================================================
// Fault Polling Tests
// =============================================================================

#[test]
fn poll_without_faults_is_quiet() {
    let lines = RailLines::new();
    let mut rails = lines.rails();
    rails.enable_power().unwrap();
    let scope = SimInstrument::new();
    let mut link = link(&scope);
    assert!(rails.poll_faults(&mut link).unwrap().is_empty());
    assert!(scope.received().is_empty());
}

#[test]
fn poll_reports_new_fault() {
    let lines = RailLines::new();
    let mut rails = lines.rails();
    rails.enable_power().unwrap();
    rails.enable_backlight().unwrap();
    let scope = SimInstrument::new();
    let mut link = link(&scope);

    lines.backlight_fault.set(false);
    let faulted = rails.poll_faults(&mut link).unwrap();
    assert_eq!(faulted.as_slice(), &[Rail::Backlight]);
    assert!(!lines.backlight_enable.get());
    assert!(lines.power_enable.get());
    assert_eq!(scope.commands(), vec!["SYST:DSP \"Panel backlight fault\""]);
}

#[test]
fn fault_on_off_rail_is_ignored() {
    let lines = RailLines::new();
    let mut rails = lines.rails();
    lines.power_fault.set(false);
    let scope = SimInstrument::new();
    let mut link = link(&scope);
    assert!(rails.poll_faults(&mut link).unwrap().is_empty());
    assert_eq!(rails.state(Rail::Power), RailState::Off);
}

#[test]
fn undelivered_notice_still_disables() {
    let lines = RailLines::new();
    let mut rails = lines.rails();
    rails.enable_power().unwrap();
    let scope = SimInstrument::new();
    scope.set_broken(true);
    let mut link = link(&scope);

    lines.power_fault.set(false);
    assert_eq!(rails.poll_faults(&mut link).unwrap().as_slice(), &[Rail::Power]);
    assert!(!lines.power_enable.get());
}

// =============================================================================
// Safe State Tests
// =============================================================================

#[test]
fn safe_state_turns_both_off() {
    let lines = RailLines::new();
    let mut rails = lines.rails();
    rails.enable_power().unwrap();
    rails.enable_backlight().unwrap();
    rails.safe_state().unwrap();
    assert!(!lines.power_enable.get());
    assert!(!lines.backlight_enable.get());
}

#[test]
fn safe_state_attempts_both_rails() {
    let lines = RailLines::new();
    let mut broken = FakeOutput::new(&lines.power_enable);
    broken.broken = true;
    let mut rails: TestRails = PowerRails::new(
        broken,
        FakePin::line(&lines.power_fault),
        FakeOutput::new(&lines.backlight_enable),
        FakePin::line(&lines.backlight_fault),
    );
    rails.enable_backlight().unwrap();

    assert!(matches!(rails.safe_state(), Err(Error::Pin(_))));
    assert!(!lines.backlight_enable.get());
    assert_eq!(rails.state(Rail::Backlight), RailState::Off);
}

#[test]
fn fault_messages() {
    assert_eq!(Rail::Power.fault_message(), "Panel power fault");
    assert_eq!(Rail::Backlight.fault_message(), "Panel backlight fault");
}
