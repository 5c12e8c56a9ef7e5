//! Core types for pattern construction.

/// Number of physical indicator LEDs.
pub const LED_COUNT: usize = 4;

/// On/off state of the indicator LEDs, one bit per LED.
///
/// Bit `i` drives LED `i`. Only the low [`LED_COUNT`] bits are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedMask(u8);

impl LedMask {
    /// Bits that map to a physical LED.
    pub const VALID_BITS: u8 = (1 << LED_COUNT) - 1;

    /// All LEDs off.
    pub const NONE: Self = LedMask(0b0000);
    /// Lowest LED only.
    pub const QUARTER: Self = LedMask(0b0001);
    /// Lower two LEDs.
    pub const HALF: Self = LedMask(0b0011);
    /// Every LED except the highest.
    pub const ALL_BUT_HIGHEST: Self = LedMask(0b0111);
    /// All LEDs on.
    pub const ALL: Self = LedMask(0b1111);

    /// Creates a mask, dropping bits above [`LED_COUNT`].
    #[inline]
    pub const fn new(bits: u8) -> Self {
        LedMask(bits & Self::VALID_BITS)
    }

    /// Creates a mask, rejecting bits that do not map to an LED.
    #[inline]
    pub const fn checked(bits: u8) -> Option<Self> {
        if bits & !Self::VALID_BITS != 0 {
            None
        } else {
            Some(LedMask(bits))
        }
    }

    /// Raw bit representation.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if LED `index` is on.
    #[inline]
    pub const fn is_lit(self, index: usize) -> bool {
        index < LED_COUNT && self.0 & (1 << index) != 0
    }

    /// Number of LEDs that are on.
    #[inline]
    pub const fn lit_count(self) -> u32 {
        self.0.count_ones()
    }
}

/// A single step in a blink pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlinkStep {
    /// LEDs lit during this step.
    pub mask: LedMask,

    /// How long the step is held, in milliseconds.
    pub duration_ms: u16,
}

impl BlinkStep {
    /// Creates a new blink step.
    #[inline]
    pub const fn new(mask: LedMask, duration_ms: u16) -> Self {
        Self { mask, duration_ms }
    }
}

/// Pattern validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PatternError {
    /// No steps provided.
    EmptyPattern,

    /// Pattern capacity exceeded.
    CapacityExceeded,

    /// Mask sets a bit with no LED behind it.
    MaskOutOfRange(u8),
}

impl core::fmt::Display for PatternError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PatternError::EmptyPattern => {
                write!(f, "pattern must have at least one step")
            }
            PatternError::CapacityExceeded => {
                write!(f, "pattern capacity exceeded")
            }
            PatternError::MaskOutOfRange(bits) => {
                write!(
                    f,
                    "mask {:#06b} uses bits beyond the {} indicator LEDs",
                    bits, LED_COUNT
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PatternError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_truncates_unmapped_bits() {
        assert_eq!(LedMask::new(0b1111_0101).bits(), 0b0101);
    }

    #[test]
    fn checked_rejects_unmapped_bits() {
        assert_eq!(LedMask::checked(0b1_0000), None);
        assert_eq!(LedMask::checked(0b1111), Some(LedMask::ALL));
    }

    #[test]
    fn is_lit_reads_individual_bits() {
        let mask = LedMask::HALF;
        assert!(mask.is_lit(0));
        assert!(mask.is_lit(1));
        assert!(!mask.is_lit(2));
        assert!(!mask.is_lit(3));
        assert!(!mask.is_lit(LED_COUNT));
        assert_eq!(mask.lit_count(), 2);
    }
}
