//! Integration tests for VoltageMonitor

mod common;
use common::*;

use power_latch::{BatteryConfig, Calibration, SAMPLE_COUNT, VoltageMonitor};

fn monitor() -> VoltageMonitor<SAMPLE_COUNT> {
    VoltageMonitor::new(Calibration::new(TEST_SCALE), BatteryConfig::LIPO_6S)
}

#[test]
fn average_of_full_buffer_is_exact() {
    let monitor = monitor();
    let samples: [u16; SAMPLE_COUNT] = [1900, 1950, 2000, 2050, 2100, 1900, 1950, 2000, 2050, 2100];
    for raw in samples {
        monitor.on_sample_ready(raw);
    }

    let sum: u32 = samples.iter().map(|&s| s as u32).sum();
    assert_eq!(monitor.average_raw() as u32, sum / SAMPLE_COUNT as u32);
    assert_eq!(monitor.average_raw(), 2000);
    assert_eq!(monitor.voltage(), 2000.0 * TEST_SCALE);
}

#[test]
fn only_latest_samples_count_after_wrap() {
    let monitor = monitor();
    for _ in 0..SAMPLE_COUNT {
        monitor.on_sample_ready(100);
    }
    for _ in 0..SAMPLE_COUNT {
        monitor.on_sample_ready(2400);
    }
    assert_eq!(monitor.average_raw(), 2400);

    // Half-overwritten
    for _ in 0..SAMPLE_COUNT / 2 {
        monitor.on_sample_ready(2000);
    }
    assert_eq!(monitor.average_raw(), 2200);
}

#[test]
fn startup_transient_reads_low() {
    let monitor = monitor();
    monitor.on_sample_ready(2500);
    assert_eq!(monitor.average_raw(), 250);
    assert_eq!(monitor.percentage(), 0);
}

#[test]
fn window_edges_map_to_zero_and_hundred() {
    let monitor = monitor();
    let battery = BatteryConfig::LIPO_6S;

    assert_eq!(monitor.to_percentage(battery.min_pack_voltage()), 0);
    assert_eq!(monitor.to_percentage(battery.max_pack_voltage()), 100);
}

#[test]
fn percentage_saturates_outside_window() {
    let monitor = monitor();
    assert_eq!(monitor.to_percentage(0.0), 0);
    assert_eq!(monitor.to_percentage(12.5), 0);
    assert_eq!(monitor.to_percentage(26.0), 100);
    assert_eq!(monitor.to_percentage(100.0), 100);
}

#[test]
fn percentage_is_monotonic_in_voltage() {
    let monitor = monitor();
    let mut previous = 0;
    let mut voltage = 15.0_f32;
    while voltage < 28.0 {
        let percentage = monitor.to_percentage(voltage);
        assert!(percentage >= previous, "{} V gave {}% after {}%", voltage, percentage, previous);
        assert!(percentage <= 100);
        previous = percentage;
        voltage += 0.05;
    }
    assert_eq!(previous, 100);
}

#[test]
fn start_and_stop_drive_sampler() {
    let monitor = monitor();
    let mut adc = MockSwitch::default();

    monitor.start(&mut adc);
    assert!(adc.running);
    monitor.stop(&mut adc);
    assert!(!adc.running);
    assert_eq!((adc.starts, adc.stops), (1, 1));
}

#[test]
fn reference_calibration_reads_full_pack() {
    let monitor: VoltageMonitor = VoltageMonitor::new(Calibration::REFERENCE, BatteryConfig::LIPO_6S);
    // 25.2 V through the 10.43:1 divider is about 2.416 V, or 2999 counts
    for _ in 0..SAMPLE_COUNT {
        monitor.on_sample_ready(3000);
    }
    assert!((monitor.voltage() - 25.2).abs() < 0.05);
    assert!(monitor.percentage() >= 99);
}
