//! Controller, battery and calibration configuration.
//!
//! Defaults match the reference hardware: a 6S LiPo pack measured through a
//! 10.43:1 divider into a 12-bit ADC with a 3.3 V reference.

/// Poll cadence, thresholds and guards of the power state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingConfig {
    /// Period of the foreground loop. The button is sampled once per poll.
    pub poll_interval_ms: u32,

    /// Inactivity after which the controller gives up waiting for a press.
    pub idle_timeout_ms: u32,

    /// Hold time that turns a press into a power on/off gesture.
    pub long_press_ms: u32,

    /// Longest wait for the button to be released before a forced transition.
    pub release_wait_limit_ms: u32,
}

impl TimingConfig {
    /// Reference timings: 100 ms poll, 3 s idle, 1 s long press, 10 s release guard.
    pub const DEFAULT: Self = Self {
        poll_interval_ms: 100,
        idle_timeout_ms: 3000,
        long_press_ms: 1000,
        release_wait_limit_ms: 10_000,
    };
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Cell count and per-cell voltage window of the battery pack.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BatteryConfig {
    pub cell_count: u8,
    /// Cell voltage reported as 0%.
    pub min_cell_voltage: f32,
    /// Cell voltage reported as 100%.
    pub max_cell_voltage: f32,
}

impl BatteryConfig {
    /// 6S LiPo, 3.0 V to 4.2 V per cell.
    pub const LIPO_6S: Self = Self {
        cell_count: 6,
        min_cell_voltage: 3.0,
        max_cell_voltage: 4.2,
    };

    /// Pack voltage reported as 0%.
    #[inline]
    pub fn min_pack_voltage(&self) -> f32 {
        self.cell_count as f32 * self.min_cell_voltage
    }

    /// Pack voltage reported as 100%.
    #[inline]
    pub fn max_pack_voltage(&self) -> f32 {
        self.cell_count as f32 * self.max_cell_voltage
    }

    /// Checks that the pack has cells and a non-empty voltage window.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cell_count == 0 {
            return Err(ConfigError::ZeroCellCount);
        }
        if !(self.min_cell_voltage >= 0.0 && self.min_cell_voltage < self.max_cell_voltage) {
            return Err(ConfigError::InvalidCellWindow);
        }
        Ok(())
    }
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self::LIPO_6S
    }
}

/// Linear ADC calibration: volts per raw count.
///
/// The scale depends on the voltage divider fitted to a given board revision.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    pub volts_per_count: f32,
}

impl Calibration {
    /// 3.3 V reference, 10.43:1 divider, 12-bit ADC.
    pub const REFERENCE: Self = Self::from_divider(3.3, 10.43, 12);

    /// Creates a calibration from a known scale.
    pub const fn new(volts_per_count: f32) -> Self {
        Self { volts_per_count }
    }

    /// Derives the scale from the ADC reference, divider ratio and resolution.
    pub const fn from_divider(vref: f32, divider_ratio: f32, adc_bits: u32) -> Self {
        Self {
            volts_per_count: vref * divider_ratio / (1u32 << adc_bits) as f32,
        }
    }

    /// Checks that the scale is positive and finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.volts_per_count > 0.0 && self.volts_per_count.is_finite() {
            Ok(())
        } else {
            Err(ConfigError::InvalidCalibration)
        }
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::REFERENCE
    }
}

/// What the indicator shows while running, released, before the idle timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunningIdlePolicy {
    /// Leave whatever pattern is playing.
    #[default]
    RetainPattern,

    /// Keep blinking the confirm-shutdown pattern as a reminder.
    ConfirmReminder,
}

/// Full configuration of the power controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerConfig {
    pub timing: TimingConfig,
    pub running_idle: RunningIdlePolicy,
}

impl ControllerConfig {
    /// Checks the timing invariants the state machine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timing.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.timing.long_press_ms >= self.timing.idle_timeout_ms {
            return Err(ConfigError::LongPressNotBelowTimeout);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Poll interval of zero would spin the foreground loop.
    ZeroPollInterval,

    /// A long press must be detectable before the idle timeout expires.
    LongPressNotBelowTimeout,

    /// Battery pack has no cells.
    ZeroCellCount,

    /// Cell voltage window is empty, inverted or negative.
    InvalidCellWindow,

    /// Calibration scale is not a positive finite number.
    InvalidCalibration,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::ZeroPollInterval => {
                write!(f, "poll interval must be non-zero")
            }
            ConfigError::LongPressNotBelowTimeout => {
                write!(f, "long press threshold must be shorter than the idle timeout")
            }
            ConfigError::ZeroCellCount => {
                write!(f, "battery must have at least one cell")
            }
            ConfigError::InvalidCellWindow => {
                write!(f, "minimum cell voltage must be non-negative and below the maximum")
            }
            ConfigError::InvalidCalibration => {
                write!(f, "calibration scale must be positive and finite")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(ControllerConfig::default().validate(), Ok(()));
        assert_eq!(BatteryConfig::default().validate(), Ok(()));
        assert_eq!(Calibration::default().validate(), Ok(()));
    }

    #[test]
    fn reference_calibration_matches_divider() {
        let expected = 3.3 * 10.43 / 4096.0;
        assert!((Calibration::REFERENCE.volts_per_count - expected).abs() < 1e-7);
    }

    #[test]
    fn long_press_must_fit_inside_timeout() {
        let config = ControllerConfig {
            timing: TimingConfig {
                long_press_ms: 3000,
                ..TimingConfig::DEFAULT
            },
            ..ControllerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::LongPressNotBelowTimeout));
    }

    #[test]
    fn inverted_cell_window_is_rejected() {
        let battery = BatteryConfig {
            min_cell_voltage: 4.2,
            max_cell_voltage: 3.0,
            ..BatteryConfig::LIPO_6S
        };
        assert_eq!(battery.validate(), Err(ConfigError::InvalidCellWindow));
    }

    #[test]
    fn zero_scale_is_rejected() {
        assert_eq!(
            Calibration::new(0.0).validate(),
            Err(ConfigError::InvalidCalibration)
        );
    }
}
