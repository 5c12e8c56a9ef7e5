use crate::types::{BlinkStep, LedMask, PatternError};
use heapless::Vec;

/// Step capacity of the status patterns shown by the controller.
pub const PATTERN_STEPS: usize = 8;

/// A blink pattern sized for the controller's status indications.
pub type StatusPattern = BlinkPattern<PATTERN_STEPS>;

/// An ordered list of LED masks with hold durations.
///
/// A looping pattern restarts from its first step after the last one. A
/// one-shot pattern plays once; the player then drops it and leaves the LEDs
/// showing the final step's mask.
///
/// Patterns are replaced wholesale on the player and never edited in place.
///
/// # Type Parameters
/// * `N` - Maximum number of steps this pattern can hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlinkPattern<const N: usize> {
    steps: Vec<BlinkStep, N>,
    one_shot: bool,
}

impl<const N: usize> BlinkPattern<N> {
    /// Creates an empty pattern. The player ignores empty patterns.
    pub const fn empty() -> Self {
        Self {
            steps: Vec::new(),
            one_shot: false,
        }
    }

    /// Creates a new pattern builder.
    pub fn builder() -> PatternBuilder<N> {
        PatternBuilder::new()
    }

    /// Builds a pattern from a fixed step table.
    ///
    /// Steps beyond the capacity `N` are dropped. The crate's own tables are
    /// checked against [`PATTERN_STEPS`] at compile time.
    pub fn from_table(table: &[BlinkStep], one_shot: bool) -> Self {
        let mut steps = Vec::new();
        for step in table.iter().take(N) {
            let _ = steps.push(*step);
        }
        Self { steps, one_shot }
    }

    /// Returns the number of steps in this pattern.
    #[inline]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the pattern has no steps.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns true if the pattern plays once and then freezes.
    #[inline]
    pub fn is_one_shot(&self) -> bool {
        self.one_shot
    }

    /// Returns the step at the given index.
    #[inline]
    pub fn get_step(&self, index: usize) -> Option<&BlinkStep> {
        self.steps.get(index)
    }

    /// Returns all steps in order.
    pub fn steps(&self) -> &[BlinkStep] {
        &self.steps
    }

    /// Total duration of one pass through all steps, in milliseconds.
    pub fn total_duration_ms(&self) -> u32 {
        self.steps.iter().map(|s| s.duration_ms as u32).sum()
    }

    /// Drops every step, keeping the one-shot flag.
    pub(crate) fn clear(&mut self) {
        self.steps.clear();
    }
}

impl<const N: usize> Default for BlinkPattern<N> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Builder for constructing validated blink patterns.
#[derive(Debug)]
pub struct PatternBuilder<const N: usize> {
    steps: Vec<BlinkStep, N>,
    one_shot: bool,
}

impl<const N: usize> PatternBuilder<N> {
    /// Creates a new empty pattern builder.
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            one_shot: false,
        }
    }

    /// Adds a step to the pattern.
    ///
    /// # Errors
    /// * `MaskOutOfRange` - `mask` sets a bit with no LED behind it
    /// * `CapacityExceeded` - The pattern already holds `N` steps
    pub fn step(mut self, mask: u8, duration_ms: u16) -> Result<Self, PatternError> {
        let mask = LedMask::checked(mask).ok_or(PatternError::MaskOutOfRange(mask))?;
        self.steps
            .push(BlinkStep::new(mask, duration_ms))
            .map_err(|_| PatternError::CapacityExceeded)?;
        Ok(self)
    }

    /// Marks the pattern as one-shot.
    ///
    /// Default is looping.
    pub fn one_shot(mut self, one_shot: bool) -> Self {
        self.one_shot = one_shot;
        self
    }

    /// Builds and validates the pattern.
    ///
    /// # Errors
    /// * `EmptyPattern` - No steps were added
    pub fn build(self) -> Result<BlinkPattern<N>, PatternError> {
        if self.steps.is_empty() {
            return Err(PatternError::EmptyPattern);
        }

        Ok(BlinkPattern {
            steps: self.steps,
            one_shot: self.one_shot,
        })
    }
}

impl<const N: usize> Default for PatternBuilder<N> {
    fn default() -> Self {
        Self::new()
    }
}
