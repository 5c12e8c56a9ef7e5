#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`BlinkPattern`**: Ordered LED mask + duration steps, looping or one-shot
//! - **`BlinkPlayer`**: Plays the active pattern from a 1 ms tick interrupt
//! - **`VoltageMonitor`**: Averages raw ADC readings into pack voltage and percentage
//! - **`PowerController`**: Button-driven power latch state machine, polled every 100 ms
//! - **`TelemetryResponder`**: Answers single-byte battery percentage reads while running
//! - **`LedBank`**, **`TickTimer`**, **`AnalogSampler`**, **`Board`**, **`TelemetryBus`**:
//!   Traits to implement for your hardware
//! - **`TimeSource`**: Trait to implement for your timing system
//!
//! The player, monitor and responder are shared with interrupt handlers and
//! take `&self` everywhere; the controller owns the board and runs in the
//! foreground.

pub mod time;
pub mod types;
pub mod pattern;
pub mod indicator;
pub mod player;
pub mod voltage;
pub mod config;
pub mod controller;
pub mod telemetry;
pub mod gpio;

pub use pattern::{BlinkPattern, PATTERN_STEPS, PatternBuilder, StatusPattern};
pub use types::{BlinkStep, LED_COUNT, LedMask, PatternError};
pub use time::{TimeDuration, TimeInstant, TimeSource};
pub use player::{BlinkPlayer, LedBank, PatternCursor, TickTimer};
pub use voltage::{AnalogSampler, SAMPLE_COUNT, SampleRing, VoltageMonitor};
pub use config::{
    BatteryConfig, Calibration, ConfigError, ControllerConfig, RunningIdlePolicy, TimingConfig,
};
pub use controller::{Board, Phase, PowerController, PowerSession, ReleaseAction};
pub use telemetry::{
    NoTelemetry, ResponderState, TelemetryBus, TelemetryLink, TelemetryResponder,
    TransferDirection,
};
pub use gpio::{ActiveLowButton, GpioLeds, PowerRailPin};
