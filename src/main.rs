//! Scope Panel Main Application
//!
//! Entry point for the Raspberry Pi front panel. Opens the SPI
//! expanders, GPIO lines and the LCD, connects to the instrument and
//! runs supervised panel sessions until the restart limit (if any) is
//! reached.

use std::net::TcpStream;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use embedded_io_adapters::std::FromStd;
use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};
use linux_embedded_hal::{CdevPin, Delay, SpidevDevice};
use log::info;

use scope_panel::control::{Panel, PanelIo};
use scope_panel::drivers::expander::{ExpanderChip, SpiExpanderBus};
use scope_panel::drivers::lcd::Hd44780;
use scope_panel::link::{connect_with_retry, ScpiLink};
use scope_panel::power::PowerRails;
use scope_panel::prelude::*;
use scope_panel::supervisor::{supervise, SupervisorPolicy};

const CONSUMER: &str = "scope-panel";

/// Oscilloscope front-panel controller
#[derive(Parser, Debug)]
#[command(name = "scope-panel")]
#[command(version, about)]
struct Args {
    /// Instrument address
    #[arg(long, default_value = DEFAULT_INSTRUMENT_HOST)]
    host: String,

    /// Instrument control port
    #[arg(long, default_value_t = DEFAULT_INSTRUMENT_PORT)]
    port: u16,

    /// Seconds between connection attempts
    #[arg(long, default_value_t = CONNECT_RETRY_SECS)]
    retry_secs: u32,

    /// Socket read timeout in milliseconds (blocks forever when unset)
    #[arg(long)]
    read_timeout_ms: Option<u32>,

    /// Wait between a query and reading its reply
    #[arg(long, default_value_t = QUERY_SETTLE_MS)]
    query_settle_ms: u32,

    /// Wait after a set command
    #[arg(long, default_value_t = COMMAND_SETTLE_MS)]
    command_settle_ms: u32,

    /// Button debounce in milliseconds
    #[arg(long, default_value_t = BUTTON_DEBOUNCE_MS)]
    debounce_ms: u32,

    /// Stop after this many restarts
    #[arg(long)]
    max_restarts: Option<u32>,

    /// GPIO character device
    #[arg(long, default_value = "/dev/gpiochip0")]
    gpiochip: String,
}

impl Args {
    fn panel_config(&self) -> PanelConfig {
        PanelConfig {
            instrument_port: self.port,
            connect_retry_secs: self.retry_secs,
            read_timeout_ms: self.read_timeout_ms,
            query_settle_ms: self.query_settle_ms,
            command_settle_ms: self.command_settle_ms,
            debounce_ms: self.debounce_ms,
            max_restarts: self.max_restarts,
            ..PanelConfig::new()
        }
    }
}

type Bus = SpiExpanderBus<SpidevDevice, CdevPin>;
type Lcd = Hd44780<CdevPin, Delay>;
type Link = ScpiLink<FromStd<TcpStream>, Delay>;
type FrontPanel = Panel<Bus, Link, Lcd, CdevPin, CdevPin, Delay>;

fn output(chip: &mut Chip, offset: u32, initial: u8) -> Result<CdevPin> {
    let handle = chip
        .get_line(offset)
        .with_context(|| format!("getting GPIO {offset}"))?
        .request(LineRequestFlags::OUTPUT, initial, CONSUMER)
        .with_context(|| format!("requesting GPIO {offset} as output"))?;
    CdevPin::new(handle).with_context(|| format!("creating pin for GPIO {offset}"))
}

fn input(chip: &mut Chip, offset: u32) -> Result<CdevPin> {
    let handle = chip
        .get_line(offset)
        .with_context(|| format!("getting GPIO {offset}"))?
        .request(LineRequestFlags::INPUT, 0, CONSUMER)
        .with_context(|| format!("requesting GPIO {offset} as input"))?;
    CdevPin::new(handle).with_context(|| format!("creating pin for GPIO {offset}"))
}

fn spidev(path: &str) -> Result<SpidevDevice> {
    let mut spi = SpidevDevice::open(path).with_context(|| format!("opening {path}"))?;
    let options = SpidevOptions::new()
        .bits_per_word(8)
        .max_speed_hz(pins::SPI_SPEED_HZ)
        .mode(SpiModeFlags::SPI_MODE_0)
        .build();
    spi.configure(&options).with_context(|| format!("configuring {path}"))?;
    Ok(spi)
}

/// Pulse the shared expander reset line (active low)
fn reset_expanders(reset: &mut CdevPin) -> Result<()> {
    reset.set_low().map_err(Error::pin)?;
    Delay.delay_ms(1);
    reset.set_high().map_err(Error::pin)?;
    Ok(())
}

fn open_stream(host: &str, config: &PanelConfig) -> scope_panel::Result<FromStd<TcpStream>> {
    let stream = TcpStream::connect((host, config.instrument_port)).map_err(Error::transport)?;
    stream.set_nodelay(true).map_err(Error::transport)?;
    let timeout = config.read_timeout_ms.map(|ms| Duration::from_millis(u64::from(ms)));
    stream.set_read_timeout(timeout).map_err(Error::transport)?;
    Ok(FromStd::new(stream))
}

/// Acquire the hardware, connect and start one panel session
fn start_session(args: &Args, config: &PanelConfig, chip: &mut Chip, reset: &mut CdevPin) -> Result<FrontPanel> {
    let power = PowerRails::new(
        output(chip, pins::POWER_ENABLE, 0)?,
        input(chip, pins::POWER_FAULT)?,
        output(chip, pins::BACKLIGHT_ENABLE, 0)?,
        input(chip, pins::BACKLIGHT_FAULT)?,
    );

    reset_expanders(reset)?;
    let bus = SpiExpanderBus::new(
        ExpanderChip::new(spidev(pins::SPIDEV_CE0)?),
        ExpanderChip::new(spidev(pins::SPIDEV_CE1)?),
        ExpanderChip::with_chip_select(
            spidev(pins::SPIDEV_CE0)?,
            output(chip, pins::BUTTON_CHIP_SELECT, 1)?,
        ),
    );

    let mut display = Hd44780::new(
        output(chip, pins::LCD_RS, 0)?,
        output(chip, pins::LCD_E, 0)?,
        [
            output(chip, pins::LCD_DATA[0], 0)?,
            output(chip, pins::LCD_DATA[1], 0)?,
            output(chip, pins::LCD_DATA[2], 0)?,
            output(chip, pins::LCD_DATA[3], 0)?,
        ],
        Delay,
    )
    .context("initialising LCD")?;

    let mut delay = Delay;
    let stream = connect_with_retry(
        || open_stream(&args.host, config),
        &args.host,
        config,
        &mut display,
        &mut delay,
    )?;
    let link = ScpiLink::new(stream, Delay, config);

    let io = PanelIo {
        bus,
        display,
        button_irq: input(chip, pins::BUTTON_IRQ)?,
        bank_irqs: [
            input(chip, pins::BANK0A_IRQ)?,
            input(chip, pins::BANK0B_IRQ)?,
            input(chip, pins::BANK1A_IRQ)?,
            input(chip, pins::BANK1B_IRQ)?,
        ],
        power,
        delay,
    };
    Ok(Panel::start(io, link, *config)?)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = args.panel_config();
    info!("scope-panel v{}", env!("CARGO_PKG_VERSION"));

    // Lines held for the whole process; R/W stays low
    let mut chip = Chip::new(&args.gpiochip).with_context(|| format!("opening {}", args.gpiochip))?;
    let _lcd_rw = output(&mut chip, pins::LCD_RW, 0)?;
    let mut reset = output(&mut chip, pins::EXPANDER_RESET, 1)?;

    let mut pause = Delay;
    let cause: anyhow::Error = supervise(
        || start_session(&args, &config, &mut chip, &mut reset),
        SupervisorPolicy::from_config(&config),
        &mut pause,
    );
    Err(cause.context("panel stopped"))
}
