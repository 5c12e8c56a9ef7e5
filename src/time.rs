//! Time abstraction traits for platform-agnostic timing.

/// Trait for abstracting time sources.
pub trait TimeSource<I: TimeInstant> {
    /// Returns the current time instant.
    fn now(&self) -> I;
}

/// Trait abstraction for duration types.
pub trait TimeDuration: Copy + PartialEq {
    /// Converts duration to milliseconds.
    fn as_millis(&self) -> u64;
}

/// Trait abstraction for instant types.
pub trait TimeInstant: Copy {
    /// Duration type for this instant.
    type Duration: TimeDuration;

    /// Calculates duration since an earlier instant.
    ///
    /// Implementations backed by a wrapping tick counter should use wrapping
    /// arithmetic so that intervals spanning the wrap stay correct.
    fn duration_since(&self, earlier: Self) -> Self::Duration;

    /// Milliseconds elapsed since `earlier`.
    #[inline]
    fn millis_since(&self, earlier: Self) -> u64 {
        self.duration_since(earlier).as_millis()
    }
}
