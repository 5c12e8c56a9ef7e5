//! Adapters from `embedded-hal` digital pins to the crate's hardware traits.
//!
//! Pin errors are swallowed here: a failed read reports the button as
//! released and a failed write is dropped.

use embedded_hal::digital::{InputPin, OutputPin, PinState};

use crate::player::LedBank;
use crate::types::{LED_COUNT, LedMask};

/// Push button wired to pull its input low while pressed.
pub struct ActiveLowButton<P: InputPin> {
    pin: P,
}

impl<P: InputPin> ActiveLowButton<P> {
    /// Wraps an input pin.
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Returns true while the button is held.
    pub fn is_pressed(&mut self) -> bool {
        self.pin.is_low().unwrap_or(false)
    }

    /// Returns the wrapped pin.
    pub fn release(self) -> P {
        self.pin
    }
}

/// Output pin that enables the latched power rail when driven high.
pub struct PowerRailPin<P: OutputPin> {
    pin: P,
    enabled: bool,
}

impl<P: OutputPin> PowerRailPin<P> {
    /// Wraps `pin` and drives it low.
    pub fn new(mut pin: P) -> Self {
        let _ = pin.set_low();
        Self {
            pin,
            enabled: false,
        }
    }

    /// Drives the rail on or off.
    pub fn set_enabled(&mut self, enabled: bool) {
        let _ = self.pin.set_state(PinState::from(enabled));
        self.enabled = enabled;
    }

    /// Last state requested through [`set_enabled`](Self::set_enabled).
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the wrapped pin.
    pub fn release(self) -> P {
        self.pin
    }
}

/// Indicator LEDs on individual active-high output pins.
///
/// Pin `i` shows bit `i` of the mask.
pub struct GpioLeds<P: OutputPin> {
    pins: [P; LED_COUNT],
}

impl<P: OutputPin> GpioLeds<P> {
    /// Wraps the four LED pins, lowest bit first.
    pub fn new(pins: [P; LED_COUNT]) -> Self {
        Self { pins }
    }

    /// Returns the wrapped pins.
    pub fn release(self) -> [P; LED_COUNT] {
        self.pins
    }
}

impl<P: OutputPin> LedBank for GpioLeds<P> {
    fn write_mask(&mut self, mask: LedMask) {
        for (index, pin) in self.pins.iter_mut().enumerate() {
            let _ = pin.set_state(PinState::from(mask.is_lit(index)));
        }
    }
}
