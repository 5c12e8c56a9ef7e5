//! Battery voltage sampling and averaging.
//!
//! The ADC completion interrupt feeds raw readings into a [`SampleRing`]; the
//! foreground loop and the telemetry responder read the average through
//! [`VoltageMonitor`]. The ring has a single writer and uses plain atomic
//! loads and stores, so it needs no critical section and works on cores
//! without compare-and-swap.

use core::sync::atomic::{AtomicU16, AtomicUsize, Ordering};

use crate::config::{BatteryConfig, Calibration};

/// Number of raw readings averaged by default.
pub const SAMPLE_COUNT: usize = 10;

/// Trait for the analog acquisition peripheral.
///
/// After [`start`](Self::start) the peripheral converts continuously and
/// reports each reading through [`VoltageMonitor::on_sample_ready`]. Re-arming
/// between conversions is the peripheral's job.
pub trait AnalogSampler {
    /// Starts continuous conversions.
    fn start(&mut self);

    /// Stops conversions.
    fn stop(&mut self);
}

/// Fixed-capacity ring of the most recent raw readings.
///
/// Slots that were never written read as zero.
pub struct SampleRing<const N: usize> {
    slots: [AtomicU16; N],
    head: AtomicUsize,
}

impl<const N: usize> SampleRing<N> {
    /// Creates a ring with every slot at zero.
    pub const fn new() -> Self {
        Self {
            slots: [const { AtomicU16::new(0) }; N],
            head: AtomicUsize::new(0),
        }
    }

    /// Stores a reading over the oldest slot. Single writer only.
    pub fn push(&self, raw: u16) {
        if N == 0 {
            return;
        }
        let head = self.head.load(Ordering::Relaxed);
        self.slots[head].store(raw, Ordering::Relaxed);
        self.head.store((head + 1) % N, Ordering::Release);
    }

    /// Sum of all slots.
    pub fn sum(&self) -> u32 {
        self.slots
            .iter()
            .map(|slot| slot.load(Ordering::Acquire) as u32)
            .sum()
    }

    /// Truncating integer mean over all `N` slots, written or not.
    pub fn average(&self) -> u16 {
        if N == 0 {
            return 0;
        }
        (self.sum() / N as u32) as u16
    }

    /// Index of the slot the next reading will overwrite.
    pub fn head(&self) -> usize {
        self.head.load(Ordering::Acquire)
    }

    /// Copy of every slot in storage order.
    pub fn snapshot(&self) -> [u16; N] {
        core::array::from_fn(|i| self.slots[i].load(Ordering::Acquire))
    }
}

impl<const N: usize> Default for SampleRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts averaged ADC readings into pack voltage and charge percentage.
///
/// The average covers all `N` slots unconditionally. Right after power-up
/// the unwritten slots are zero and the estimate reads low until `N` readings
/// have arrived.
///
/// # Type Parameters
/// * `N` - Number of readings averaged
pub struct VoltageMonitor<const N: usize = SAMPLE_COUNT> {
    ring: SampleRing<N>,
    calibration: Calibration,
    battery: BatteryConfig,
}

impl<const N: usize> VoltageMonitor<N> {
    /// Creates a monitor with an empty sample ring.
    pub const fn new(calibration: Calibration, battery: BatteryConfig) -> Self {
        Self {
            ring: SampleRing::new(),
            calibration,
            battery,
        }
    }

    /// Starts continuous acquisition.
    pub fn start<A: AnalogSampler>(&self, sampler: &mut A) {
        sampler.start();
    }

    /// Stops acquisition. Collected readings are kept.
    pub fn stop<A: AnalogSampler>(&self, sampler: &mut A) {
        sampler.stop();
    }

    /// Records one raw reading. Call from the ADC completion interrupt.
    #[inline]
    pub fn on_sample_ready(&self, raw: u16) {
        self.ring.push(raw);
    }

    /// Mean of the stored raw readings.
    pub fn average_raw(&self) -> u16 {
        self.ring.average()
    }

    /// Converts a raw reading to volts.
    #[inline]
    pub fn to_voltage(&self, raw: u16) -> f32 {
        raw as f32 * self.calibration.volts_per_count
    }

    /// Maps a pack voltage onto 0-100%, saturating outside the cell window.
    ///
    /// The result is truncated, not rounded.
    pub fn to_percentage(&self, voltage: f32) -> u8 {
        let min = self.battery.min_pack_voltage();
        let max = self.battery.max_pack_voltage();

        if voltage <= min {
            0
        } else if voltage >= max {
            100
        } else {
            ((voltage - min) / (max - min) * 100.0) as u8
        }
    }

    /// Current averaged pack voltage.
    pub fn voltage(&self) -> f32 {
        self.to_voltage(self.average_raw())
    }

    /// Current charge estimate.
    pub fn percentage(&self) -> u8 {
        self.to_percentage(self.voltage())
    }

    /// Returns the underlying sample ring.
    pub fn ring(&self) -> &SampleRing<N> {
        &self.ring
    }

    /// Returns the ADC calibration.
    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    /// Returns the battery pack configuration.
    pub fn battery(&self) -> BatteryConfig {
        self.battery
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_overwrites_oldest_slot() {
        let ring = SampleRing::<3>::new();
        for raw in [1, 2, 3, 4] {
            ring.push(raw);
        }
        assert_eq!(ring.snapshot(), [4, 2, 3]);
        assert_eq!(ring.head(), 1);
    }

    #[test]
    fn average_truncates() {
        let ring = SampleRing::<4>::new();
        for raw in [1, 1, 1, 2] {
            ring.push(raw);
        }
        assert_eq!(ring.sum(), 5);
        assert_eq!(ring.average(), 1);
    }

    #[test]
    fn unwritten_slots_pull_average_down() {
        let monitor = VoltageMonitor::<10>::new(Calibration::new(0.01), BatteryConfig::LIPO_6S);
        for _ in 0..5 {
            monitor.on_sample_ready(2000);
        }
        assert_eq!(monitor.average_raw(), 1000);
    }

    #[test]
    fn percentage_is_truncated() {
        let monitor = VoltageMonitor::<10>::new(Calibration::new(0.01), BatteryConfig::LIPO_6S);
        // 20.0 V is 27.7% of the 18.0..25.2 V window
        assert_eq!(monitor.to_percentage(20.0), 27);
    }
}
