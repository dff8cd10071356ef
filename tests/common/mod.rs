//! Shared test fixtures
//!
//! Fakes for every collaborator the panel core talks to: the expander
//! bus with a simulated button matrix and encoder ports, GPIO lines,
//! a recording character display, a no-op delay and a scripted
//! instrument that answers queries from a settings table.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorType, InputPin, OutputPin};

use scope_panel::config::{registers, PanelConfig};
use scope_panel::control::{Panel, PanelIo};
use scope_panel::drivers::display::{CharDisplay, GLYPH_DOWN, GLYPH_UP};
use scope_panel::drivers::expander::{Device, ExpanderBus};
use scope_panel::link::ScpiLink;
use scope_panel::power::PowerRails;
use scope_panel::types::Direction;
use scope_panel::{Error, Result};

// =============================================================================
// Configuration
// =============================================================================

/// Panel configuration with short stuck-button detection
pub fn test_config() -> PanelConfig {
    PanelConfig {
        release_poll_limit: 5,
        restart_pause_ms: 0,
        ..PanelConfig::new()
    }
}

// =============================================================================
// Delay
// =============================================================================

/// Delay that only counts the time it was asked to wait
#[derive(Clone, Default)]
pub struct FakeDelay {
    elapsed_ns: Rc<Cell<u64>>,
}

impl FakeDelay {
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ns.get() / 1_000_000
    }
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns.set(self.elapsed_ns.get() + u64::from(ns));
    }
}

// =============================================================================
// Expander board
// =============================================================================

/// A button held down on the simulated matrix
#[derive(Clone, Copy, Debug)]
pub struct HeldButton {
    /// Row bit (bit 5 = R1)
    pub rows: u8,
    /// Column bit (bit 5 = C1)
    pub columns: u8,
    /// Port B reads that still see the row asserted
    pub reads_left: u32,
}

#[derive(Default)]
pub struct BoardState {
    pub writes: Vec<(Device, u8, u8)>,
    pub press: Option<HeldButton>,
    /// Column bits currently driven low
    pub driven: u8,
    /// Queued port bytes per encoder bank (0A, 0B, 1A, 1B)
    pub ports: [VecDeque<u8>; 4],
    /// Last byte read from each bank
    pub last_port: [u8; 4],
    pub fail: bool,
}

/// Three MCP23S17s: two encoder banks and the button matrix
#[derive(Clone, Default)]
pub struct FakeBoard(pub Rc<RefCell<BoardState>>);

impl FakeBoard {
    /// Hold the button at `row`/`column` (0-based, R1/C1 first) for
    /// `reads` port B reads
    pub fn press(&self, row: usize, column: usize, reads: u32) {
        self.0.borrow_mut().press = Some(HeldButton {
            rows: 0x20 >> row,
            columns: 0x20 >> column,
            reads_left: reads,
        });
    }

    pub fn is_pressed(&self) -> bool {
        self.0.borrow().press.is_some()
    }

    /// Queue port bytes for encoder bank `bank`
    pub fn turn(&self, bank: usize, bytes: &[u8]) {
        self.0.borrow_mut().ports[bank].extend(bytes.iter().copied());
    }

    pub fn pending(&self, bank: usize) -> usize {
        self.0.borrow().ports[bank].len()
    }

    pub fn set_failing(&self, fail: bool) {
        self.0.borrow_mut().fail = fail;
    }

    pub fn writes_to(&self, device: Device) -> Vec<(u8, u8)> {
        self.0
            .borrow()
            .writes
            .iter()
            .filter(|(d, _, _)| *d == device)
            .map(|&(_, r, v)| (r, v))
            .collect()
    }

    fn button_irq(&self) -> bool {
        let state = self.0.borrow();
        state.press.is_some_and(|p| p.columns & state.driven != 0)
    }

    fn bank_irq(&self, bank: usize) -> bool {
        !self.0.borrow().ports[bank].is_empty()
    }
}

fn bank_index(device: Device, register: u8) -> Option<usize> {
    match (device, register) {
        (Device::Encoders0, registers::GPIOA) => Some(0),
        (Device::Encoders0, registers::GPIOB) => Some(1),
        (Device::Encoders1, registers::GPIOA) => Some(2),
        (Device::Encoders1, registers::GPIOB) => Some(3),
        _ => None,
    }
}

impl ExpanderBus for FakeBoard {
    fn write_register(&mut self, device: Device, register: u8, value: u8) -> Result<()> {
        let mut state = self.0.borrow_mut();
        if state.fail {
            return Err(Error::Bus(embedded_hal::spi::ErrorKind::Other));
        }
        state.writes.push((device, register, value));
        if device == Device::Buttons && register == registers::OLATA {
            state.driven = !value & 0x3F;
        }
        Ok(())
    }

    fn read_register(&mut self, device: Device, register: u8) -> Result<u8> {
        let mut state = self.0.borrow_mut();
        if state.fail {
            return Err(Error::Bus(embedded_hal::spi::ErrorKind::Other));
        }
        if let Some(bank) = bank_index(device, register) {
            if let Some(byte) = state.ports[bank].pop_front() {
                state.last_port[bank] = byte;
            }
            return Ok(state.last_port[bank]);
        }
        if device != Device::Buttons {
            return Ok(0);
        }

        let driven = state.driven;
        let Some(mut held) = state.press.filter(|p| p.columns & driven != 0) else {
            return Ok(0);
        };
        let value = match register {
            registers::INTFB | registers::INTCAPB => held.rows,
            registers::GPIOB if held.reads_left > 0 => {
                held.reads_left -= 1;
                state.press = Some(held);
                held.rows
            }
            registers::GPIOB => {
                state.press = None;
                0
            }
            _ => 0,
        };
        Ok(value)
    }
}

/// Port bytes for `steps` quadrature steps of an encoder resting at 00
///
/// Clockwise runs A/B through 10, 11, 01, 00.
pub fn quadrature(a_bit: u8, b_bit: u8, direction: Direction, steps: usize) -> Vec<u8> {
    let cycle: [(bool, bool); 4] = match direction {
        Direction::Clockwise => [(true, false), (true, true), (false, true), (false, false)],
        Direction::CounterClockwise => [(false, true), (true, true), (true, false), (false, false)],
    };
    cycle
        .iter()
        .cycle()
        .take(steps)
        .map(|&(a, b)| (u8::from(a) << a_bit) | (u8::from(b) << b_bit))
        .collect()
}

// =============================================================================
// GPIO lines
// =============================================================================

enum PinSource {
    ButtonIrq(FakeBoard),
    BankIrq(FakeBoard, usize),
    Line(Rc<Cell<bool>>),
}

/// Input line backed by the board or a shared level
pub struct FakePin {
    source: PinSource,
}

impl FakePin {
    pub fn button_irq(board: &FakeBoard) -> Self {
        Self {
            source: PinSource::ButtonIrq(board.clone()),
        }
    }

    pub fn bank_irq(board: &FakeBoard, bank: usize) -> Self {
        Self {
            source: PinSource::BankIrq(board.clone(), bank),
        }
    }

    pub fn line(level: &Rc<Cell<bool>>) -> Self {
        Self {
            source: PinSource::Line(level.clone()),
        }
    }
}

impl ErrorType for FakePin {
    type Error = digital::ErrorKind;
}

impl InputPin for FakePin {
    fn is_high(&mut self) -> core::result::Result<bool, Self::Error> {
        Ok(match &self.source {
            PinSource::ButtonIrq(board) => board.button_irq(),
            PinSource::BankIrq(board, bank) => board.bank_irq(*bank),
            PinSource::Line(level) => level.get(),
        })
    }

    fn is_low(&mut self) -> core::result::Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Output line writing a shared level; `broken` lines refuse every write
pub struct FakeOutput {
    pub level: Rc<Cell<bool>>,
    pub broken: bool,
}

impl FakeOutput {
    pub fn new(level: &Rc<Cell<bool>>) -> Self {
        Self {
            level: level.clone(),
            broken: false,
        }
    }
}

impl ErrorType for FakeOutput {
    type Error = digital::ErrorKind;
}

impl OutputPin for FakeOutput {
    fn set_low(&mut self) -> core::result::Result<(), Self::Error> {
        if self.broken {
            return Err(digital::ErrorKind::Other);
        }
        self.level.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> core::result::Result<(), Self::Error> {
        if self.broken {
            return Err(digital::ErrorKind::Other);
        }
        self.level.set(true);
        Ok(())
    }
}

// =============================================================================
// Display
// =============================================================================

/// 20x4 character grid that records what was drawn
#[derive(Clone, Debug)]
pub struct RecordingDisplay {
    grid: [[char; 20]; 4],
    row: usize,
    col: usize,
    pub clears: usize,
    pub glyphs: Vec<u8>,
    pub fail: bool,
}

impl Default for RecordingDisplay {
    fn default() -> Self {
        Self {
            grid: [[' '; 20]; 4],
            row: 0,
            col: 0,
            clears: 0,
            glyphs: Vec::new(),
            fail: false,
        }
    }
}

impl RecordingDisplay {
    /// One row with trailing blanks removed
    pub fn line(&self, row: usize) -> String {
        self.grid[row].iter().collect::<String>().trim_end().to_string()
    }

    pub fn lines(&self) -> Vec<String> {
        (0..4).map(|row| self.line(row)).collect()
    }

    pub fn is_blank(&self) -> bool {
        self.lines().iter().all(String::is_empty)
    }

    fn put(&mut self, c: char) {
        if self.row < 4 && self.col < 20 {
            self.grid[self.row][self.col] = c;
        }
        self.col += 1;
    }

    fn check(&self) -> Result<()> {
        if self.fail {
            Err(Error::Display)
        } else {
            Ok(())
        }
    }
}

impl CharDisplay for RecordingDisplay {
    fn clear(&mut self) -> Result<()> {
        self.check()?;
        self.grid = [[' '; 20]; 4];
        self.row = 0;
        self.col = 0;
        self.clears += 1;
        Ok(())
    }

    fn set_cursor(&mut self, row: u8, col: u8) -> Result<()> {
        self.check()?;
        self.row = usize::from(row);
        self.col = usize::from(col);
        Ok(())
    }

    fn write_str(&mut self, text: &str) -> Result<()> {
        self.check()?;
        for c in text.chars() {
            self.put(c);
        }
        Ok(())
    }

    fn write_glyph(&mut self, code: u8) -> Result<()> {
        self.check()?;
        let c = match code {
            GLYPH_UP => '^',
            GLYPH_DOWN => 'v',
            _ => '?',
        };
        self.put(c);
        Ok(())
    }

    fn define_glyph(&mut self, slot: u8, _bitmap: &[u8; 8]) -> Result<()> {
        self.check()?;
        self.glyphs.push(slot);
        Ok(())
    }
}

// =============================================================================
// Instrument
// =============================================================================

pub struct SimState {
    pub settings: BTreeMap<String, String>,
    /// Every line received, in order
    pub received: Vec<String>,
    pending: Vec<u8>,
    partial: Vec<u8>,
    /// Queries get no reply (reads return 0 bytes)
    pub silent: bool,
    /// Writes fail with a broken pipe
    pub broken: bool,
}

/// Scripted oscilloscope behind an `embedded-io` stream
///
/// Queries are echoed and answered from the settings table framed as
/// `<echo>\r\n<value>\r\n> `. Set commands store their argument (a
/// trailing `V` unit after a number is dropped) and are echoed with a prompt.
#[derive(Clone)]
pub struct SimInstrument(pub Rc<RefCell<SimState>>);

impl Default for SimInstrument {
    fn default() -> Self {
        Self::new()
    }
}

impl SimInstrument {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(SimState {
            settings: default_settings(),
            received: Vec::new(),
            pending: Vec::new(),
            partial: Vec::new(),
            silent: false,
            broken: false,
        })))
    }

    pub fn set(&self, key: &str, value: &str) {
        self.0.borrow_mut().settings.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.0.borrow().settings.get(key).cloned()
    }

    pub fn received(&self) -> Vec<String> {
        self.0.borrow().received.clone()
    }

    /// Lines received that are not queries
    pub fn commands(&self) -> Vec<String> {
        self.received().into_iter().filter(|l| !l.ends_with('?')).collect()
    }

    pub fn clear_log(&self) {
        self.0.borrow_mut().received.clear();
    }

    pub fn set_silent(&self, silent: bool) {
        self.0.borrow_mut().silent = silent;
    }

    pub fn set_broken(&self, broken: bool) {
        self.0.borrow_mut().broken = broken;
    }

    /// Queue raw bytes for the next read
    pub fn push_raw(&self, bytes: &[u8]) {
        self.0.borrow_mut().pending.extend_from_slice(bytes);
    }
}

impl SimState {
    fn handle_line(&mut self, line: String) {
        self.received.push(line.clone());
        if let Some(key) = line.strip_suffix('?') {
            if !self.silent {
                let value = self.settings.get(key).cloned().unwrap_or_else(|| "UNKNOWN".into());
                self.pending
                    .extend_from_slice(format!("{line}\r\n{value}\r\n> ").as_bytes());
            }
            return;
        }

        match line.as_str() {
            "*RST" => self.settings = default_settings(),
            "*CLS" | ":SINGLE" => {}
            ":AUTOSCALE" => {
                for key in ["CHAN1:SCAL", "CHAN2:SCAL"] {
                    self.settings.insert(key.into(), "+5.0E-01".into());
                }
                self.settings.insert("CHAN2:DISP".into(), "1".into());
                self.settings.insert("TIM:SCAL".into(), "+2.0E-04".into());
            }
            ":RUN" => {
                self.settings.insert(":OPER:COND".into(), "+8".into());
            }
            ":STOP" => {
                self.settings.insert(":OPER:COND".into(), "+0".into());
            }
            other => {
                if let Some((header, value)) = other.split_once(' ') {
                    // drop a volt unit, not the V of a keyword like WAV
                    let value = value
                        .strip_suffix('V')
                        .filter(|v| v.ends_with(|c: char| c.is_ascii_digit()))
                        .unwrap_or(value);
                    self.settings.insert(header.into(), value.into());
                }
            }
        }
        self.pending.extend_from_slice(format!("{line}\r\n> ").as_bytes());
    }
}

fn default_settings() -> BTreeMap<String, String> {
    let mut settings = BTreeMap::new();
    let mut put = |k: &str, v: &str| {
        settings.insert(k.to_string(), v.to_string());
    };
    for n in 1..=4 {
        put(&format!("CHAN{n}:DISP"), if n == 1 { "1" } else { "0" });
        put(&format!("CHAN{n}:SCAL"), "+1.0E+00");
        put(&format!("CHAN{n}:OFFS"), "+0.0E+00");
        put(&format!("CHAN{n}:COUP"), "DC");
        put(&format!("CHAN{n}:IMP"), "ONEM");
        put(&format!("CHAN{n}:BWL"), "0");
        put(&format!("CHAN{n}:INV"), "0");
    }
    put("TIM:MODE", "MAIN");
    put("TIM:REF", "CENT");
    put("TIM:SCAL", "+1.0E-04");
    put("TIM:POS", "+0.0E+00");
    put("TRIG:SWE", "AUTO");
    put("TRIG:EDGE:SLOP", "POS");
    put("TRIG:EDGE:SOUR", "CHAN1");
    put("TRIG:EDGE:LEV", "+0.0E+00");
    put("TRIG:NREJ", "0");
    put("MARK:MODE", "OFF");
    put("MARK:X1Y1", "CHAN1");
    put("MARK:X2Y2", "CHAN1");
    for p in ["X1P", "X2P", "Y1P", "Y2P"] {
        put(&format!("MARK:{p}"), "+0.0E+00");
    }
    put(":MEAS:SOUR", "CHAN1,CHAN2");
    put(":OPER:COND", "+8");
    settings
}

impl embedded_io::ErrorType for SimInstrument {
    type Error = embedded_io::ErrorKind;
}

impl embedded_io::Read for SimInstrument {
    fn read(&mut self, buf: &mut [u8]) -> core::result::Result<usize, Self::Error> {
        let mut state = self.0.borrow_mut();
        let n = state.pending.len().min(buf.len());
        buf[..n].copy_from_slice(&state.pending[..n]);
        state.pending.drain(..n);
        Ok(n)
    }
}

impl embedded_io::Write for SimInstrument {
    fn write(&mut self, buf: &[u8]) -> core::result::Result<usize, Self::Error> {
        let mut state = self.0.borrow_mut();
        if state.broken {
            return Err(embedded_io::ErrorKind::BrokenPipe);
        }
        state.partial.extend_from_slice(buf);
        while let Some(end) = state.partial.windows(2).position(|w| w == b"\r\n") {
            let line: Vec<u8> = state.partial.drain(..end + 2).take(end).collect();
            state.handle_line(String::from_utf8_lossy(&line).into_owned());
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> core::result::Result<(), Self::Error> {
        Ok(())
    }
}

// =============================================================================
// Panel rig
// =============================================================================

pub type TestLink = ScpiLink<SimInstrument, FakeDelay>;
pub type TestPanel = Panel<FakeBoard, TestLink, RecordingDisplay, FakePin, FakeOutput, FakeDelay>;
pub type TestRails = PowerRails<FakeOutput, FakePin>;

pub fn link(scope: &SimInstrument) -> TestLink {
    ScpiLink::new(scope.clone(), FakeDelay::default(), &test_config())
}

/// Rails with shared enable levels and fault lines (faults idle high)
pub struct RailLines {
    pub power_enable: Rc<Cell<bool>>,
    pub power_fault: Rc<Cell<bool>>,
    pub backlight_enable: Rc<Cell<bool>>,
    pub backlight_fault: Rc<Cell<bool>>,
}

impl RailLines {
    pub fn new() -> Self {
        Self {
            power_enable: Rc::new(Cell::new(false)),
            power_fault: Rc::new(Cell::new(true)),
            backlight_enable: Rc::new(Cell::new(false)),
            backlight_fault: Rc::new(Cell::new(true)),
        }
    }

    pub fn rails(&self) -> TestRails {
        PowerRails::new(
            FakeOutput::new(&self.power_enable),
            FakePin::line(&self.power_fault),
            FakeOutput::new(&self.backlight_enable),
            FakePin::line(&self.backlight_fault),
        )
    }
}

/// Everything a panel session is started on, with handles kept for
/// inspection after the panel takes ownership
pub struct Rig {
    pub board: FakeBoard,
    pub scope: SimInstrument,
    pub lines: RailLines,
    pub delay: FakeDelay,
}

impl Rig {
    pub fn new() -> Self {
        Self {
            board: FakeBoard::default(),
            scope: SimInstrument::new(),
            lines: RailLines::new(),
            delay: FakeDelay::default(),
        }
    }

    pub fn io(&self) -> PanelIo<FakeBoard, RecordingDisplay, FakePin, FakeOutput, FakeDelay> {
        PanelIo {
            bus: self.board.clone(),
            display: RecordingDisplay::default(),
            button_irq: FakePin::button_irq(&self.board),
            bank_irqs: [0, 1, 2, 3].map(|bank| FakePin::bank_irq(&self.board, bank)),
            power: self.lines.rails(),
            delay: self.delay.clone(),
        }
    }

    pub fn try_start(&self) -> Result<TestPanel> {
        Panel::start(self.io(), link(&self.scope), test_config())
    }

    pub fn start(&self) -> TestPanel {
        self.try_start().expect("panel starts against the simulated scope")
    }

    /// Press and release a button, stepping until the scan reaches it
    pub fn press(&self, panel: &mut TestPanel, row: usize, column: usize) -> Result<()> {
        self.board.press(row, column, 1);
        for _ in 0..6 {
            panel.step()?;
            if !self.board.is_pressed() {
                return Ok(());
            }
        }
        panic!("press at R{}C{} never scanned", row + 1, column + 1);
    }

    /// Feed quadrature steps to bank `bank` and step until consumed
    pub fn turn(&self, panel: &mut TestPanel, bank: usize, bytes: &[u8]) -> Result<()> {
        self.board.turn(bank, bytes);
        while self.board.pending(bank) > 0 {
            panel.step()?;
        }
        Ok(())
    }
}
