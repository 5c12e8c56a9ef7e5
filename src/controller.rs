//! Power latch state machine.
//!
//! Provides [`PowerController`], the foreground loop that samples the power
//! button, selects indicator patterns and switches the power rail, and the
//! [`Board`] trait for the peripherals it drives directly.
//!
//! One wake cycle runs from [`begin_cycle`](PowerController::begin_cycle)
//! through repeated [`poll`](PowerController::poll) calls, one per poll
//! interval, to [`end_cycle`](PowerController::end_cycle), which shuts the
//! peripherals down and enters sleep. Nothing in the session survives sleep.

use embedded_hal::delay::DelayNs;

use crate::config::{ConfigError, ControllerConfig, RunningIdlePolicy};
use crate::indicator::{battery_pattern, confirm_shutdown_pattern, shutdown_pattern, startup_pattern};
use crate::pattern::PATTERN_STEPS;
use crate::player::{BlinkPlayer, LedBank, TickTimer};
use crate::telemetry::{NoTelemetry, TelemetryLink};
use crate::time::{TimeInstant, TimeSource};
use crate::voltage::{AnalogSampler, VoltageMonitor};

/// Trait for the peripherals owned by the foreground loop.
pub trait Board {
    type Sampler: AnalogSampler;
    type Ticker: TickTimer;

    /// Returns true while the power button is held.
    fn button_pressed(&mut self) -> bool;

    /// Switches the latched power rail.
    fn set_power_rail(&mut self, enabled: bool);

    /// Battery voltage ADC.
    fn sampler(&mut self) -> &mut Self::Sampler;

    /// Timer driving the blink player.
    fn tick_timer(&mut self) -> &mut Self::Ticker;

    /// Enters the lowest power mode. Returns after the next wake-up.
    fn enter_sleep(&mut self);
}

/// Step to take once the button is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReleaseAction {
    /// Long press while off: switch the rail on.
    PowerOn,
    /// Long press while running: switch the rail off.
    PowerOff,
    /// Press after a long idle while running: only a warning.
    ResumeRunning,
}

/// Phase of the current wake cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Waiting for the press that woke the device to end.
    WakeRelease,
    /// Off, showing the battery level, waiting for a long press.
    AwaitingStart,
    /// Power rail on.
    Running,
    /// A press was handled; waiting for the button to come up.
    AwaitingRelease(ReleaseAction),
    /// Cycle finished. The next poll does nothing until the next cycle begins.
    Asleep,
}

/// Per-wake-cycle state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerSession<I> {
    phase: Phase,
    idle_since: Option<I>,
    press_started: Option<I>,
    release_wait_since: Option<I>,
}

impl<I: TimeInstant> PowerSession<I> {
    fn new(phase: Phase, now: Option<I>) -> Self {
        Self {
            phase,
            idle_since: None,
            press_started: None,
            release_wait_since: now,
        }
    }

    /// Phase of the cycle.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Start of the current idle period. `None` counts as already timed out.
    pub fn idle_since(&self) -> Option<I> {
        self.idle_since
    }

    /// Start of the press being tracked, if any.
    pub fn press_started(&self) -> Option<I> {
        self.press_started
    }

    /// Returns true while a press is being tracked.
    pub fn is_pressing(&self) -> bool {
        self.press_started.is_some()
    }

    /// Start of the current wait for release, if any.
    pub fn release_wait_since(&self) -> Option<I> {
        self.release_wait_since
    }
}

/// Drives the power latch through one wake cycle after another.
///
/// The controller owns the [`Board`] and shares the blink player and voltage
/// monitor with their interrupt handlers.
///
/// # Type Parameters
/// * `'a` - Lifetime of the shared components
/// * `I` - Time instant type
/// * `T` - Time source implementation type
/// * `B` - Board implementation type
/// * `L` - LED implementation type of the blink player
/// * `Tm` - Telemetry link type
/// * `N` - Sample count of the voltage monitor
pub struct PowerController<'a, I, T, B, L, Tm, const N: usize>
where
    I: TimeInstant,
    T: TimeSource<I>,
    B: Board,
    L: LedBank,
    Tm: TelemetryLink,
{
    board: B,
    time_source: &'a T,
    player: &'a BlinkPlayer<'a, I, L, T, PATTERN_STEPS>,
    monitor: &'a VoltageMonitor<N>,
    telemetry: Tm,
    config: ControllerConfig,
    session: PowerSession<I>,
}

impl<'a, I, T, B, L, const N: usize> PowerController<'a, I, T, B, L, NoTelemetry, N>
where
    I: TimeInstant,
    T: TimeSource<I>,
    B: Board,
    L: LedBank,
{
    /// Creates a controller without telemetry.
    ///
    /// # Errors
    /// Returns the first problem found by [`ControllerConfig::validate`], or
    /// by the monitor's [`BatteryConfig`](crate::BatteryConfig) and
    /// [`Calibration`](crate::Calibration) checks.
    pub fn new(
        board: B,
        time_source: &'a T,
        player: &'a BlinkPlayer<'a, I, L, T, PATTERN_STEPS>,
        monitor: &'a VoltageMonitor<N>,
        config: ControllerConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        monitor.battery().validate()?;
        monitor.calibration().validate()?;

        Ok(Self {
            board,
            time_source,
            player,
            monitor,
            telemetry: NoTelemetry,
            config,
            session: PowerSession::new(Phase::Asleep, None),
        })
    }
}

impl<'a, I, T, B, L, Tm, const N: usize> PowerController<'a, I, T, B, L, Tm, N>
where
    I: TimeInstant,
    T: TimeSource<I>,
    B: Board,
    L: LedBank,
    Tm: TelemetryLink,
{
    /// Attaches a telemetry link, enabled only while running.
    pub fn with_telemetry<U: TelemetryLink>(self, telemetry: U) -> PowerController<'a, I, T, B, L, U, N> {
        PowerController {
            board: self.board,
            time_source: self.time_source,
            player: self.player,
            monitor: self.monitor,
            telemetry,
            config: self.config,
            session: self.session,
        }
    }

    /// Runs wake cycles forever.
    pub fn run<D: DelayNs>(&mut self, delay: &mut D) -> ! {
        loop {
            self.run_wake_cycle(delay);
        }
    }

    /// Runs one wake cycle: polls until the controller decides to sleep, then
    /// shuts down and enters sleep. Returns after the next wake-up.
    pub fn run_wake_cycle<D: DelayNs>(&mut self, delay: &mut D) {
        self.begin_cycle();
        while self.poll() != Phase::Asleep {
            delay.delay_ms(self.config.timing.poll_interval_ms);
        }
        self.end_cycle();
    }

    /// Starts a fresh session and the tick and sampling peripherals.
    pub fn begin_cycle(&mut self) {
        self.session = PowerSession::new(Phase::WakeRelease, Some(self.time_source.now()));
        self.player.start(self.board.tick_timer());
        self.monitor.start(self.board.sampler());

        #[cfg(feature = "defmt")]
        defmt::debug!("wake cycle started");
    }

    /// Samples the button once and advances the state machine.
    ///
    /// Call once per poll interval. Returns the phase after the poll.
    pub fn poll(&mut self) -> Phase {
        if self.session.phase == Phase::Asleep {
            return Phase::Asleep;
        }

        let now = self.time_source.now();
        let pressed = self.board.button_pressed();

        match self.session.phase {
            Phase::WakeRelease => self.poll_wake_release(now, pressed),
            Phase::AwaitingStart => self.poll_awaiting_start(now, pressed),
            Phase::Running => self.poll_running(now, pressed),
            Phase::AwaitingRelease(action) => self.poll_release(now, pressed, action),
            Phase::Asleep => {}
        }

        self.session.phase
    }

    /// Stops sampling, blanks the LEDs, disables telemetry and enters sleep.
    pub fn end_cycle(&mut self) {
        self.monitor.stop(self.board.sampler());
        self.player.stop(self.board.tick_timer());
        self.telemetry.disable();
        self.session = PowerSession::new(Phase::Asleep, None);

        #[cfg(feature = "defmt")]
        defmt::debug!("entering sleep");

        self.board.enter_sleep();
    }

    fn poll_wake_release(&mut self, now: I, pressed: bool) {
        if pressed {
            if self.release_wait_expired(now) {
                #[cfg(feature = "defmt")]
                defmt::warn!("button held since wake-up, giving up");
                self.session.phase = Phase::Asleep;
            }
            return;
        }

        self.session.release_wait_since = None;
        self.session.idle_since = Some(now);
        self.session.phase = Phase::AwaitingStart;
        self.poll_awaiting_start(now, false);
    }

    fn poll_awaiting_start(&mut self, now: I, pressed: bool) {
        if self.idle_expired(now) {
            #[cfg(feature = "defmt")]
            defmt::info!("no power-on press, going back to sleep");
            self.session.phase = Phase::Asleep;
            return;
        }

        if pressed {
            self.session.idle_since = Some(now);
            match self.session.press_started {
                None => {
                    self.player.replace(&startup_pattern());
                    self.session.press_started = Some(now);
                }
                Some(start) if self.is_long_press(now, start) => {
                    self.await_release(now, ReleaseAction::PowerOn);
                }
                Some(_) => {}
            }
        } else {
            self.show_battery_level();
            self.session.press_started = None;
        }
    }

    fn poll_running(&mut self, now: I, pressed: bool) {
        if pressed {
            if self.idle_expired(now) {
                self.session.idle_since = Some(now);
                self.player.show(&confirm_shutdown_pattern());
                self.await_release(now, ReleaseAction::ResumeRunning);
                return;
            }

            self.session.idle_since = Some(now);
            match self.session.press_started {
                None => {
                    self.player.replace(&shutdown_pattern());
                    self.session.press_started = Some(now);
                }
                Some(start) if self.is_long_press(now, start) => {
                    self.await_release(now, ReleaseAction::PowerOff);
                }
                Some(_) => {}
            }
        } else {
            if self.idle_expired(now) {
                self.show_battery_level();
            } else if self.config.running_idle == RunningIdlePolicy::ConfirmReminder {
                self.player.show(&confirm_shutdown_pattern());
            }
            self.session.press_started = None;
        }
    }

    fn poll_release(&mut self, now: I, pressed: bool, action: ReleaseAction) {
        if !pressed {
            self.finish_release(action, false);
        } else if self.release_wait_expired(now) {
            #[cfg(feature = "defmt")]
            defmt::warn!("button stuck, forcing {}", action);
            self.finish_release(action, true);
        }
    }

    fn finish_release(&mut self, action: ReleaseAction, forced: bool) {
        self.session.release_wait_since = None;
        self.session.press_started = None;

        match action {
            ReleaseAction::PowerOn if forced => {
                self.session.phase = Phase::Asleep;
            }
            ReleaseAction::PowerOn => {
                self.board.set_power_rail(true);
                // Cleared, so the first press while running asks for confirmation
                self.session.idle_since = None;
                self.session.phase = Phase::Running;
                self.telemetry.enable();

                #[cfg(feature = "defmt")]
                defmt::info!("power rail enabled");
            }
            ReleaseAction::PowerOff => {
                self.board.set_power_rail(false);
                self.session.phase = Phase::Asleep;

                #[cfg(feature = "defmt")]
                defmt::info!("power rail disabled");
            }
            ReleaseAction::ResumeRunning => {
                self.session.phase = Phase::Running;
            }
        }
    }

    fn await_release(&mut self, now: I, action: ReleaseAction) {
        self.session.release_wait_since = Some(now);
        self.session.phase = Phase::AwaitingRelease(action);
    }

    fn show_battery_level(&mut self) {
        let percentage = self.monitor.percentage();
        self.player.show(&battery_pattern(percentage));
    }

    fn idle_expired(&self, now: I) -> bool {
        let timeout = self.config.timing.idle_timeout_ms as u64;
        self.session
            .idle_since
            .is_none_or(|since| now.millis_since(since) > timeout)
    }

    fn is_long_press(&self, now: I, start: I) -> bool {
        now.millis_since(start) > self.config.timing.long_press_ms as u64
    }

    fn release_wait_expired(&self, now: I) -> bool {
        let limit = self.config.timing.release_wait_limit_ms as u64;
        self.session
            .release_wait_since
            .is_some_and(|since| now.millis_since(since) > limit)
    }

    /// Returns the current phase.
    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    /// Returns the state of the current wake cycle.
    pub fn session(&self) -> &PowerSession<I> {
        &self.session
    }

    /// Returns the validated configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Returns a reference to the board.
    pub fn board(&self) -> &B {
        &self.board
    }

    /// Returns a mutable reference to the board.
    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }

    /// Returns the attached telemetry link.
    pub fn telemetry(&self) -> &Tm {
        &self.telemetry
    }
}
