//! Non-blocking blink pattern player.
//!
//! Provides [`BlinkPlayer`] which drives the indicator LEDs through the active
//! [`BlinkPattern`] from a periodic tick, and the [`LedBank`] and
//! [`TickTimer`] traits for hardware abstraction.
//!
//! The player is shared between the foreground loop (which installs patterns)
//! and the tick interrupt (which advances them). All state sits behind a
//! `critical_section::Mutex`, so every method takes `&self` and the player can
//! live in a `static`.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::pattern::BlinkPattern;
use crate::time::{TimeInstant, TimeSource};
use crate::types::LedMask;

/// Trait for abstracting the indicator LED outputs.
///
/// Implement this for your LED hardware to allow the player to control it.
/// Handle any hardware errors internally - this method cannot fail.
pub trait LedBank {
    /// Drives LED `i` on when bit `i` of `mask` is set, off otherwise.
    fn write_mask(&mut self, mask: LedMask);
}

/// Trait for the periodic timer that calls [`BlinkPlayer::on_tick`].
pub trait TickTimer {
    /// Starts the periodic tick interrupt.
    fn start(&mut self);

    /// Stops the periodic tick interrupt.
    fn stop(&mut self);
}

/// Position of the player within the active pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternCursor<I> {
    /// Index of the step currently shown.
    pub index: usize,

    /// Instant of the last advance. `None` until the first tick after a reset.
    pub last_advance: Option<I>,
}

impl<I> PatternCursor<I> {
    const fn start() -> Self {
        Self {
            index: 0,
            last_advance: None,
        }
    }
}

struct PlayerState<I, L, const N: usize> {
    led: L,
    pattern: BlinkPattern<N>,
    cursor: PatternCursor<I>,
    shown: LedMask,
}

impl<I: TimeInstant, L: LedBank, const N: usize> PlayerState<I, L, N> {
    fn write(&mut self, mask: LedMask) {
        self.led.write_mask(mask);
        self.shown = mask;
    }

    fn advance(&mut self, now: I) {
        let len = self.pattern.step_count();
        if len == 0 {
            return;
        }

        // A shorter pattern may have been installed without a reset
        if self.cursor.index >= len {
            self.cursor.index = 0;
        }

        let step = self.pattern.steps()[self.cursor.index];
        self.write(step.mask);

        let last = *self.cursor.last_advance.get_or_insert(now);
        if now.millis_since(last) < step.duration_ms as u64 {
            return;
        }

        self.cursor.last_advance = Some(now);
        self.cursor.index += 1;
        if self.cursor.index >= len {
            if self.pattern.is_one_shot() {
                self.pattern.clear();
            } else {
                self.cursor.index = 0;
            }
        }
    }
}

/// Plays blink patterns on a bank of indicator LEDs.
///
/// The player owns the LEDs and holds exactly one active pattern. Each call
/// to [`on_tick`](Self::on_tick) re-asserts the current step's mask and moves
/// to the next step once the step's duration has elapsed.
///
/// # Type Parameters
/// * `'t` - Lifetime of the time source reference
/// * `I` - Time instant type
/// * `L` - LED implementation type
/// * `T` - Time source implementation type
/// * `N` - Maximum number of steps in patterns
pub struct BlinkPlayer<'t, I: TimeInstant, L: LedBank, T: TimeSource<I>, const N: usize> {
    state: Mutex<RefCell<PlayerState<I, L, N>>>,
    time_source: &'t T,
}

impl<'t, I: TimeInstant, L: LedBank, T: TimeSource<I>, const N: usize> BlinkPlayer<'t, I, L, T, N> {
    /// Creates an idle player with all LEDs off.
    pub fn new(mut led: L, time_source: &'t T) -> Self {
        led.write_mask(LedMask::NONE);

        Self {
            state: Mutex::new(RefCell::new(PlayerState {
                led,
                pattern: BlinkPattern::empty(),
                cursor: PatternCursor::start(),
                shown: LedMask::NONE,
            })),
            time_source,
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut PlayerState<I, L, N>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.state.borrow_ref_mut(cs)))
    }

    /// Starts the tick timer that drives this player.
    pub fn start<K: TickTimer>(&self, timer: &mut K) {
        timer.start();
    }

    /// Stops the tick timer, drops the active pattern and turns all LEDs off.
    pub fn stop<K: TickTimer>(&self, timer: &mut K) {
        timer.stop();
        self.blank();
    }

    /// Replaces the active pattern. The cursor is left where it is.
    ///
    /// Call [`reset_cursor`](Self::reset_cursor) as well, or use
    /// [`replace`](Self::replace), to start the new pattern from its first step.
    pub fn install(&self, pattern: &BlinkPattern<N>) {
        self.with_state(|state| state.pattern = pattern.clone());
    }

    /// Moves the cursor back to the first step.
    pub fn reset_cursor(&self) {
        self.with_state(|state| state.cursor = PatternCursor::start());
    }

    /// Replaces the active pattern and restarts it from its first step.
    pub fn replace(&self, pattern: &BlinkPattern<N>) {
        self.with_state(|state| {
            state.pattern = pattern.clone();
            state.cursor = PatternCursor::start();
        });
    }

    /// Replaces the active pattern only if it differs from `pattern`.
    ///
    /// Returns true if the pattern was replaced. Re-showing the pattern that
    /// is already playing keeps its position, so a pattern refreshed every
    /// poll still advances.
    pub fn show(&self, pattern: &BlinkPattern<N>) -> bool {
        self.with_state(|state| {
            if state.pattern == *pattern {
                return false;
            }
            state.pattern = pattern.clone();
            state.cursor = PatternCursor::start();
            true
        })
    }

    /// Drops the active pattern and turns all LEDs off.
    pub fn blank(&self) {
        self.with_state(|state| {
            state.pattern = BlinkPattern::empty();
            state.cursor = PatternCursor::start();
            state.write(LedMask::NONE);
        });
    }

    /// Advances the active pattern. Call from the periodic tick interrupt.
    ///
    /// Does nothing while the pattern is empty.
    pub fn on_tick(&self) {
        let now = self.time_source.now();
        self.with_state(|state| state.advance(now));
    }

    /// Returns the mask most recently written to the LEDs.
    pub fn current_mask(&self) -> LedMask {
        self.with_state(|state| state.shown)
    }

    /// Returns the current cursor position.
    pub fn cursor(&self) -> PatternCursor<I> {
        self.with_state(|state| state.cursor)
    }

    /// Returns a copy of the active pattern.
    pub fn active_pattern(&self) -> BlinkPattern<N> {
        self.with_state(|state| state.pattern.clone())
    }

    /// Returns true if no pattern is playing.
    pub fn is_idle(&self) -> bool {
        self.with_state(|state| state.pattern.is_empty())
    }

    /// Gives temporary access to the LED implementation.
    pub fn with_led<R>(&self, f: impl FnOnce(&mut L) -> R) -> R {
        self.with_state(|state| f(&mut state.led))
    }
}
