//! Shared test infrastructure for power-latch integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use core::cell::Cell;

use embedded_hal::delay::DelayNs;
use power_latch::{
    AnalogSampler, Board, LedBank, LedMask, TelemetryBus, TickTimer, TimeDuration, TimeInstant,
    TimeSource,
};

// ============================================================================
// Mock Time Types
// ============================================================================

/// Mock duration type for testing (wraps milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestDuration(pub u64);

impl TimeDuration for TestDuration {
    fn as_millis(&self) -> u64 {
        self.0
    }
}

/// Mock instant type for testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestInstant(pub u64);

impl TimeInstant for TestInstant {
    type Duration = TestDuration;

    fn duration_since(&self, earlier: Self) -> Self::Duration {
        TestDuration(self.0 - earlier.0)
    }
}

// ============================================================================
// Mock Time Source
// ============================================================================

/// Mock time source with controllable time advancement
pub struct MockTimeSource {
    current_time: Cell<TestInstant>,
}

impl MockTimeSource {
    pub fn new() -> Self {
        Self {
            current_time: Cell::new(TestInstant(0)),
        }
    }

    /// Advance time by the given duration
    pub fn advance(&self, duration: TestDuration) {
        let current = self.current_time.get();
        self.current_time.set(TestInstant(current.0 + duration.0));
    }

    pub fn millis(&self) -> u64 {
        self.current_time.get().0
    }
}

impl TimeSource<TestInstant> for MockTimeSource {
    fn now(&self) -> TestInstant {
        self.current_time.get()
    }
}

// ============================================================================
// Mock LEDs
// ============================================================================

/// Mock LED bank that records every mask written
pub struct MockLeds {
    current: LedMask,
    history: heapless::Vec<LedMask, 64>,
}

impl MockLeds {
    pub fn new() -> Self {
        Self {
            current: LedMask::NONE,
            history: heapless::Vec::new(),
        }
    }

    pub fn current(&self) -> LedMask {
        self.current
    }

    /// First 64 writes
    pub fn history(&self) -> &[LedMask] {
        &self.history
    }
}

impl LedBank for MockLeds {
    fn write_mask(&mut self, mask: LedMask) {
        self.current = mask;
        let _ = self.history.push(mask);
    }
}

// ============================================================================
// Mock Board
// ============================================================================

/// Peripheral that only records whether it is running
#[derive(Debug, Default)]
pub struct MockSwitch {
    pub running: bool,
    pub starts: u32,
    pub stops: u32,
}

impl AnalogSampler for MockSwitch {
    fn start(&mut self) {
        self.running = true;
        self.starts += 1;
    }

    fn stop(&mut self) {
        self.running = false;
        self.stops += 1;
    }
}

impl TickTimer for MockSwitch {
    fn start(&mut self) {
        self.running = true;
        self.starts += 1;
    }

    fn stop(&mut self) {
        self.running = false;
        self.stops += 1;
    }
}

/// Board whose button follows a script of `[start, end)` press intervals in
/// milliseconds on the shared mock clock
pub struct MockBoard<'t> {
    time: &'t MockTimeSource,
    presses: heapless::Vec<(u64, u64), 8>,
    pub rail: bool,
    pub rail_writes: heapless::Vec<bool, 8>,
    pub sampler: MockSwitch,
    pub ticker: MockSwitch,
    pub sleeps: u32,
}

impl<'t> MockBoard<'t> {
    pub fn new(time: &'t MockTimeSource) -> Self {
        Self {
            time,
            presses: heapless::Vec::new(),
            rail: false,
            rail_writes: heapless::Vec::new(),
            sampler: MockSwitch::default(),
            ticker: MockSwitch::default(),
            sleeps: 0,
        }
    }

    /// Holds the button from `start_ms` until just before `end_ms`
    pub fn press(mut self, start_ms: u64, end_ms: u64) -> Self {
        self.presses.push((start_ms, end_ms)).unwrap();
        self
    }

    pub fn add_press(&mut self, start_ms: u64, end_ms: u64) {
        self.presses.push((start_ms, end_ms)).unwrap();
    }
}

impl Board for MockBoard<'_> {
    type Sampler = MockSwitch;
    type Ticker = MockSwitch;

    fn button_pressed(&mut self) -> bool {
        let now = self.time.millis();
        self.presses
            .iter()
            .any(|&(start, end)| now >= start && now < end)
    }

    fn set_power_rail(&mut self, enabled: bool) {
        self.rail = enabled;
        let _ = self.rail_writes.push(enabled);
    }

    fn sampler(&mut self) -> &mut Self::Sampler {
        &mut self.sampler
    }

    fn tick_timer(&mut self) -> &mut Self::Ticker {
        &mut self.ticker
    }

    fn enter_sleep(&mut self) {
        self.sleeps += 1;
    }
}

// ============================================================================
// Mock Delay
// ============================================================================

/// Delay that advances the mock clock one millisecond at a time, running the
/// tick handler after every millisecond
pub struct MockDelay<'t, F: Fn()> {
    time: &'t MockTimeSource,
    on_tick: F,
    pending_ns: u64,
}

impl<'t, F: Fn()> MockDelay<'t, F> {
    pub fn new(time: &'t MockTimeSource, on_tick: F) -> Self {
        Self {
            time,
            on_tick,
            pending_ns: 0,
        }
    }

    fn step_ms(&mut self, ms: u64) {
        for _ in 0..ms {
            self.time.advance(TestDuration(1));
            (self.on_tick)();
        }
    }
}

impl<F: Fn()> DelayNs for MockDelay<'_, F> {
    fn delay_ns(&mut self, ns: u32) {
        self.pending_ns += ns as u64;
        let whole_ms = self.pending_ns / 1_000_000;
        self.pending_ns %= 1_000_000;
        self.step_ms(whole_ms);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.step_ms(ms as u64);
    }
}

// ============================================================================
// Mock Telemetry Bus
// ============================================================================

/// Bus that records replies and can be told to fail the next listen
#[derive(Debug, Default)]
pub struct MockBus {
    pub listening: bool,
    pub listens: u32,
    pub fail_next_listen: bool,
    pub fail_send: bool,
    pub sent: heapless::Vec<u8, 16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

impl TelemetryBus for MockBus {
    type Error = BusFault;

    fn listen(&mut self) -> Result<(), Self::Error> {
        self.listens += 1;
        if self.fail_next_listen {
            self.fail_next_listen = false;
            self.listening = false;
            return Err(BusFault);
        }
        self.listening = true;
        Ok(())
    }

    fn stop_listening(&mut self) {
        self.listening = false;
    }

    fn send_final(&mut self, byte: u8) -> Result<(), Self::Error> {
        let _ = self.sent.push(byte);
        if self.fail_send { Err(BusFault) } else { Ok(()) }
    }
}

// ============================================================================
// Test Helper Functions
// ============================================================================

/// Volts per count that makes raw readings easy to reason about: 2500 -> 25.0 V
pub const TEST_SCALE: f32 = 0.01;

/// Calls `tick` once per millisecond for `ms` milliseconds, starting now
pub fn tick_for(time: &MockTimeSource, ms: u64, tick: impl Fn()) {
    for _ in 0..ms {
        tick();
        time.advance(TestDuration(1));
    }
}
