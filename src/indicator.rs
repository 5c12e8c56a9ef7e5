//! Fixed status patterns and the battery level bands.

use crate::pattern::{PATTERN_STEPS, StatusPattern};
use crate::types::{BlinkStep, LedMask};

/// Hold time of each step in a battery level pattern.
pub const BATTERY_STEP_MS: u16 = 500;

/// LEDs fill from the bottom while the power-on press is held.
pub const STARTUP_STEPS: &[BlinkStep] = &[
    BlinkStep::new(LedMask::NONE, 100),
    BlinkStep::new(LedMask::QUARTER, 300),
    BlinkStep::new(LedMask::HALF, 300),
    BlinkStep::new(LedMask::ALL_BUT_HIGHEST, 300),
    BlinkStep::new(LedMask::ALL, 300),
];

/// LEDs drain from the top while the power-off press is held.
pub const SHUTDOWN_STEPS: &[BlinkStep] = &[
    BlinkStep::new(LedMask::ALL, 300),
    BlinkStep::new(LedMask::ALL_BUT_HIGHEST, 300),
    BlinkStep::new(LedMask::HALF, 300),
    BlinkStep::new(LedMask::QUARTER, 300),
    BlinkStep::new(LedMask::NONE, 100),
];

/// All LEDs flash, asking for a second press to power off.
pub const CONFIRM_SHUTDOWN_STEPS: &[BlinkStep] = &[
    BlinkStep::new(LedMask::ALL, 300),
    BlinkStep::new(LedMask::NONE, 300),
];

const _: () = assert!(STARTUP_STEPS.len() <= PATTERN_STEPS);
const _: () = assert!(SHUTDOWN_STEPS.len() <= PATTERN_STEPS);
const _: () = assert!(CONFIRM_SHUTDOWN_STEPS.len() <= PATTERN_STEPS);

/// One-shot power-on animation.
pub fn startup_pattern() -> StatusPattern {
    StatusPattern::from_table(STARTUP_STEPS, true)
}

/// One-shot power-off animation.
pub fn shutdown_pattern() -> StatusPattern {
    StatusPattern::from_table(SHUTDOWN_STEPS, true)
}

/// Looping confirm-shutdown warning.
pub fn confirm_shutdown_pattern() -> StatusPattern {
    StatusPattern::from_table(CONFIRM_SHUTDOWN_STEPS, false)
}

/// Masks shown for a battery percentage.
///
/// A single mask is shown solid. Two masks alternate, marking a level halfway
/// between the two solid levels.
pub fn battery_masks(percentage: u8) -> &'static [LedMask] {
    match percentage {
        88.. => &[LedMask::ALL],
        76..=87 => &[LedMask::ALL, LedMask::ALL_BUT_HIGHEST],
        63..=75 => &[LedMask::ALL_BUT_HIGHEST],
        51..=62 => &[LedMask::ALL_BUT_HIGHEST, LedMask::HALF],
        38..=50 => &[LedMask::HALF],
        26..=37 => &[LedMask::HALF, LedMask::QUARTER],
        13..=25 => &[LedMask::QUARTER],
        _ => &[LedMask::QUARTER, LedMask::NONE],
    }
}

/// Looping battery level pattern for a percentage.
pub fn battery_pattern(percentage: u8) -> StatusPattern {
    let mut steps = [BlinkStep::new(LedMask::NONE, BATTERY_STEP_MS); 2];
    let masks = battery_masks(percentage);
    for (step, mask) in steps.iter_mut().zip(masks) {
        step.mask = *mask;
    }
    StatusPattern::from_table(&steps[..masks.len()], false)
}
