//! Panel Control Loop
//!
//! One [`Panel`] owns every collaborator: expander bus, instrument link,
//! display, interrupt lines, power rails, encoder banks, the menu
//! navigator and the cached model. Each [`Panel::step`] polls the rail
//! faults, scans one button column, then reads every encoder bank whose
//! interrupt line is asserted, in bank order. Every input resolves to an
//! [`Action`] and goes through [`Panel::invoke`].

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, error, info, warn};

use crate::action::Action;
use crate::config::PanelConfig;
use crate::drivers::buttons::{ButtonMatrix, PanelButton};
use crate::drivers::display::{load_glyphs, show_lines, CharDisplay};
use crate::drivers::encoder::{panel_banks, EncoderBank, Knob};
use crate::drivers::expander::{configure_encoders, Device, ExpanderBus};
use crate::error::{Error, Result};
use crate::link::InstrumentLink;
use crate::power::PowerRails;
use crate::scope::model::ScopeModel;
use crate::supervisor::Session;
use crate::types::{ChannelId, Direction, TimebaseMode};
use crate::ui::menu::{MenuId, MenuTree};
use crate::ui::navigator::Navigator;

/// `:OPER:COND?` bit set while acquiring
const OPERATION_RUNNING: u32 = 1 << 3;

/// Hardware a panel session is started on
pub struct PanelIo<B, D, P, O, T> {
    /// Expander bus (encoders and buttons)
    pub bus: B,
    /// Character display
    pub display: D,
    /// Button expander interrupt
    pub button_irq: P,
    /// Encoder bank interrupts: 0A, 0B, 1A, 1B
    pub bank_irqs: [P; 4],
    /// Power and backlight rails
    pub power: PowerRails<O, P>,
    /// Blocking waits
    pub delay: T,
}

/// A running front-panel session
pub struct Panel<B, L, D, P, O, T> {
    bus: B,
    link: L,
    display: D,
    button_irq: P,
    bank_irqs: [P; 4],
    power: PowerRails<O, P>,
    delay: T,
    matrix: ButtonMatrix,
    banks: [EncoderBank; 4],
    nav: Navigator,
    model: ScopeModel,
    config: PanelConfig,
}

impl<B, L, D, P, O, T> Panel<B, L, D, P, O, T>
where
    B: ExpanderBus,
    L: InstrumentLink,
    D: CharDisplay,
    P: InputPin,
    O: OutputPin,
    T: DelayNs,
{
    /// Bring the panel up against a connected instrument
    ///
    /// Enables the rails, configures the expanders, builds the menu tree
    /// and the model, reads the instrument state and shows the blank root.
    /// A failure after the rails are enabled runs [`Panel::fail_safe`]
    /// before the error is returned.
    pub fn start(io: PanelIo<B, D, P, O, T>, link: L, config: PanelConfig) -> Result<Self> {
        let PanelIo {
            bus,
            display,
            button_irq,
            bank_irqs,
            power,
            delay,
        } = io;

        let mut tree = MenuTree::new();
        let model = ScopeModel::new(&mut tree)?;
        let mut panel = Self {
            bus,
            link,
            display,
            button_irq,
            bank_irqs,
            power,
            delay,
            matrix: ButtonMatrix::new(&config),
            banks: panel_banks(),
            nav: Navigator::new(tree),
            model,
            config,
        };

        if let Err(e) = panel.bring_up() {
            panel.fail_safe(&e);
            return Err(e);
        }
        info!("panel started");
        Ok(panel)
    }

    fn bring_up(&mut self) -> Result<()> {
        self.power.enable_power()?;
        self.power.enable_backlight()?;

        ButtonMatrix::configure(&mut self.bus)?;
        configure_encoders(&mut self.bus, Device::Encoders0)?;
        configure_encoders(&mut self.bus, Device::Encoders1)?;
        load_glyphs(&mut self.display)?;

        self.model.resync(&mut self.link)?;
        self.nav.render(&mut self.display, &self.model)?;
        self.sync_select_knob();
        Ok(())
    }

    /// Cached instrument state
    #[must_use]
    pub const fn model(&self) -> &ScopeModel {
        &self.model
    }

    /// Menu navigator
    #[must_use]
    pub const fn navigator(&self) -> &Navigator {
        &self.nav
    }

    /// Character display
    #[must_use]
    pub const fn display(&self) -> &D {
        &self.display
    }

    /// Instrument link
    #[must_use]
    pub const fn link(&self) -> &L {
        &self.link
    }

    /// Power rails
    #[must_use]
    pub const fn power(&self) -> &PowerRails<O, P> {
        &self.power
    }

    /// Encoder banks
    #[must_use]
    pub const fn banks(&self) -> &[EncoderBank; 4] {
        &self.banks
    }

    /// Session configuration
    #[must_use]
    pub const fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// One control-loop iteration
    pub fn step(&mut self) -> Result<()> {
        self.power.poll_faults(&mut self.link)?;

        if let Some(press) = self.matrix.scan(&mut self.bus, &mut self.button_irq, &mut self.delay)? {
            match PanelButton::from_press(press) {
                Some(button) => {
                    debug!("button {button:?}");
                    self.invoke(self.button_action(button))?;
                }
                None => debug!("unmapped press {press:?}"),
            }
        }

        for index in 0..self.banks.len() {
            if !self.bank_irqs[index].is_high().map_err(Error::pin)? {
                continue;
            }
            let actions = self.banks[index].poll(&mut self.bus)?;
            for action in actions {
                self.invoke(action)?;
            }
        }
        Ok(())
    }

    /// Run until an iteration fails
    pub fn run(&mut self) -> Error {
        loop {
            if let Err(e) = self.step() {
                return e;
            }
        }
    }

    /// Action bound to a front-panel button
    #[must_use]
    pub fn button_action(&self, button: PanelButton) -> Action {
        match button {
            PanelButton::Select => Action::MenuSelect,
            PanelButton::Back => Action::MenuBack,
            PanelButton::Horizontal => Action::OpenMenu(self.model.timebase().menu()),
            PanelButton::Delay => Action::TimebasePositionZero,
            PanelButton::RunStop => Action::RunStop,
            PanelButton::Single => Action::Single,
            PanelButton::HorizScale => Action::SetTimebaseMode(TimebaseMode::Main),
            PanelButton::Zoom => Action::ToggleZoom,
            PanelButton::DefaultSetup => Action::DefaultSetup,
            PanelButton::AutoScale => Action::AutoScale,
            PanelButton::Trigger => Action::OpenMenu(self.model.trigger().menu()),
            PanelButton::TrigLevel => Action::TriggerLevelCenter,
            PanelButton::Measure => Action::OpenMenu(self.model.measure().menu()),
            PanelButton::Cursors => Action::OpenMenu(self.model.cursor().menu()),
            PanelButton::CursorCtl => Action::CycleCursor,
            PanelButton::ChannelScale(ch) => Action::OpenMenu(self.model.channel(ch).menu()),
            PanelButton::Channel(ch) => Action::ChannelButton(ch),
            PanelButton::ChannelOffset(ch) => Action::ChannelOffsetZero(ch),
            PanelButton::MathScale
            | PanelButton::Math
            | PanelButton::MathOffset
            | PanelButton::Acquire
            | PanelButton::Display
            | PanelButton::Label
            | PanelButton::SaveRecall
            | PanelButton::Utility => Action::ShowLabel(button.label()),
        }
    }

    /// Dispatch one action
    pub fn invoke(&mut self, action: Action) -> Result<()> {
        if action != Action::None {
            debug!("invoke {action:?}");
        }
        let link = &mut self.link;
        match action {
            Action::None => {}

            Action::MenuSelect => {
                if let Some(next) = self.nav.select(&mut self.display, &self.model)? {
                    self.invoke(next)?;
                    self.nav.render(&mut self.display, &self.model)?;
                }
            }
            Action::MenuBack => self.nav.back(&mut self.display, &self.model)?,
            Action::MenuCursor { menu, direction } => {
                if self.nav.is_active(menu) {
                    match direction {
                        Direction::Clockwise => self.nav.increment_cursor(&mut self.display)?,
                        Direction::CounterClockwise => self.nav.decrement_cursor(&mut self.display)?,
                    }
                }
            }
            Action::OpenMenu(menu) => self.nav.open(menu, &mut self.display, &self.model)?,
            Action::ShowLabel(label) => self.show_label(label)?,

            Action::ChannelButton(ch) => self.channel_button(ch)?,
            Action::ChannelScale(ch, direction) => {
                self.model.channel_mut(ch).adjust_scale(direction, link)?;
            }
            Action::ChannelOffset(ch, direction) => self.model.channel_mut(ch).nudge_offset(direction, link)?,
            Action::ChannelOffsetZero(ch) => self.model.channel_mut(ch).set_offset(0.0, link)?,
            Action::SetCoupling(ch, coupling) => self.model.channel_mut(ch).set_coupling(coupling, link)?,
            Action::SetImpedance(ch, impedance) => self.model.channel_mut(ch).set_impedance(impedance, link)?,
            Action::SetBandwidthLimit(ch, on) => self.model.channel_mut(ch).set_bandwidth_limit(on, link)?,
            Action::SetInvert(ch, on) => self.model.channel_mut(ch).set_inverted(on, link)?,

            Action::TimebaseScale(direction) => {
                self.model.timebase_mut().adjust_scale(direction, link)?;
            }
            Action::TimebasePosition(direction) => self.model.timebase_mut().nudge_position(direction, link)?,
            Action::TimebasePositionZero => self.model.timebase_mut().set_position(0.0, link)?,
            Action::SetTimebaseMode(mode) => self.model.timebase_mut().set_mode(mode, link)?,
            Action::ToggleZoom => {
                let mode = if self.model.timebase().mode() == TimebaseMode::Window {
                    TimebaseMode::Main
                } else {
                    TimebaseMode::Window
                };
                self.model.timebase_mut().set_mode(mode, link)?;
            }
            Action::SetTimebaseReference(reference) => self.model.timebase_mut().set_reference(reference, link)?,

            Action::TriggerLevel(direction) => self.model.adjust_trigger_level(direction, link)?,
            Action::TriggerLevelCenter => self.model.center_trigger_level(link)?,
            Action::SetTriggerSource(source) => self.model.trigger_mut().set_source(source, link)?,
            Action::SetTriggerSlope(slope) => self.model.trigger_mut().set_slope(slope, link)?,
            Action::SetTriggerSweep(sweep) => self.model.trigger_mut().set_sweep(sweep, link)?,
            Action::SetNoiseReject(on) => self.model.trigger_mut().set_noise_reject(on, link)?,

            Action::SetCursorMode(mode) => self.model.cursor_mut().set_mode(mode, link)?,
            Action::SelectCursor(cursor) => self.model.cursor_mut().select(cursor),
            Action::CycleCursor => self.model.cursor_mut().cycle(),
            Action::CursorMove(direction) => self.model.move_cursor(direction, link)?,
            Action::SetCursorSource(slot, ch) => self.model.cursor_mut().set_source(slot, ch, link)?,

            Action::Measure(kind) => self.model.measure().measure(kind, link)?,
            Action::SetMeasureSource(slot, ch) => self.model.measure_mut().set_source(slot, ch, link)?,
            Action::ClearMeasurements => self.model.measure().clear(link)?,

            Action::RunStop => {
                let condition = link.query_decimal(":OPER:COND?")?;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let bits = condition as u32;
                if bits & OPERATION_RUNNING == 0 {
                    link.send(":RUN")?;
                } else {
                    link.send(":STOP")?;
                }
            }
            Action::Single => link.send(":SINGLE")?,
            Action::AutoScale => link.send(":AUTOSCALE")?,
            Action::DefaultSetup => {
                link.send("*CLS")?;
                link.send("*RST")?;
                self.nav.reset(&mut self.display)?;
                self.show_label("Default Setup")?;
            }
        }

        if action.needs_resync() {
            self.model.resync(&mut self.link)?;
            if self.nav.active() != MenuId::ROOT {
                self.nav.render(&mut self.display, &self.model)?;
            }
        }
        self.sync_select_knob();
        Ok(())
    }

    fn channel_button(&mut self, ch: ChannelId) -> Result<()> {
        let menu = self.model.channel(ch).menu();
        if !self.model.channel(ch).is_enabled() {
            self.model.channel_mut(ch).set_enabled(true, &mut self.link)?;
            self.nav.push(menu, &mut self.display, &self.model)
        } else if self.nav.is_active(menu) {
            self.model.channel_mut(ch).set_enabled(false, &mut self.link)?;
            self.nav.back(&mut self.display, &self.model)
        } else {
            self.nav.push(menu, &mut self.display, &self.model)
        }
    }

    /// Labels only show over the blank root
    fn show_label(&mut self, label: &str) -> Result<()> {
        if self.nav.active() != MenuId::ROOT {
            debug!("menu open, label {label} not shown");
            return Ok(());
        }
        show_lines(&mut self.display, &[label])
    }

    fn sync_select_knob(&mut self) {
        let (clockwise, counterclockwise) = self.nav.knob_bindings();
        for bank in &mut self.banks {
            if let Some(encoder) = bank.encoder_mut(Knob::Select) {
                encoder.bind(clockwise, counterclockwise);
            }
        }
    }

    /// Leave the board safe after a fatal error
    ///
    /// Every step runs even when an earlier one fails.
    pub fn fail_safe(&mut self, cause: &Error) {
        error!("session failed: {cause}");
        if let Err(e) = self.nav.reset(&mut self.display) {
            warn!("menu reset failed: {e}");
        }
        if let Err(e) = show_lines(&mut self.display, &["Unexpected error", "Restarting..."]) {
            warn!("error screen failed: {e}");
        }
        self.delay.delay_ms(self.config.restart_pause_ms);
        if let Err(e) = self.power.safe_state() {
            warn!("rails not driven off: {e}");
        }
        if let Err(e) = self.link.close() {
            warn!("link close failed: {e}");
        }
    }
}

impl<B, L, D, P, O, T> Session for Panel<B, L, D, P, O, T>
where
    B: ExpanderBus,
    L: InstrumentLink,
    D: CharDisplay,
    P: InputPin,
    O: OutputPin,
    T: DelayNs,
{
    fn run(&mut self) -> Error {
        Panel::run(self)
    }

    fn fail_safe(&mut self, cause: &Error) {
        Panel::fail_safe(self, cause);
    }
}
