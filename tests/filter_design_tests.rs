// tests/filter_design_tests.rs
//! Butterworth design and zero-phase filtering through the public API

mod common;

use common::sine;
use ecg_quality::processing::{butterworth, estimate_order, FilterBand, FilterSpec, PowerSpectrum};
use ecg_quality::{RuleBasedConfig, SqaError};

const FS: f64 = 500.0;

fn to_db(gain: f64) -> f64 {
    20.0 * gain.log10()
}

#[test]
fn test_rule_based_filter_orders() {
    let config = RuleBasedConfig::default();

    let noise = estimate_order(&FilterSpec::high_frequency_noise(&config)).unwrap();
    assert_eq!(noise.order, 11);
    assert!(matches!(noise.band, FilterBand::Lowpass { .. }));

    let baseline = estimate_order(&FilterSpec::baseline_wander(&config)).unwrap();
    assert_eq!(baseline.order, 2);
    assert!(baseline.cutoff_hz > 0.5 && baseline.cutoff_hz < 8.0);
}

#[test]
fn test_designed_filters_meet_their_specification() {
    let config = RuleBasedConfig::default();
    for spec in [
        FilterSpec::high_frequency_noise(&config),
        FilterSpec::baseline_wander(&config),
    ] {
        let filter = spec.design().unwrap();
        assert!(filter.is_stable());

        let pass = to_db(filter.magnitude_response(spec.passband_edge_hz, FS));
        let stop = to_db(filter.magnitude_response(spec.stopband_edge_hz, FS));
        assert!(pass >= -spec.max_passband_loss_db - 1e-6, "passband {} dB", pass);
        assert!(stop <= -spec.min_stopband_attenuation_db + 1e-6, "stopband {} dB", stop);
    }
}

#[test]
fn test_zero_phase_filtering_keeps_passband_content_in_place() {
    let filter = FilterSpec::high_frequency_noise(&RuleBasedConfig::default())
        .design()
        .unwrap();
    let input = sine(5.0, 1.0, FS, 5000);
    let output = filter.filtfilt(&input).unwrap();

    assert_eq!(output.len(), input.len());
    for (x, y) in input[500..4500].iter().zip(&output[500..4500]) {
        assert!((x - y).abs() < 1e-2, "expected {}, got {}", x, y);
    }
}

#[test]
fn test_zero_phase_filtering_removes_stopband_content() {
    let filter = FilterSpec::high_frequency_noise(&RuleBasedConfig::default())
        .design()
        .unwrap();
    let input = sine(60.0, 1.0, FS, 5000);
    let output = filter.filtfilt(&input).unwrap();

    let peak = output[500..4500].iter().fold(0.0f64, |m, v| m.max(v.abs()));
    assert!(peak < 0.01, "residual amplitude {}", peak);
}

#[test]
fn test_constant_survives_lowpass_filtfilt() {
    let filter = FilterSpec::baseline_wander(&RuleBasedConfig::default())
        .design()
        .unwrap();
    let output = filter.filtfilt(&vec![2.5; 1000]).unwrap();
    assert!(output.iter().all(|v| (v - 2.5).abs() < 1e-6));
}

#[test]
fn test_bandpass_shapes_spectrum() {
    let filter = butterworth(
        3,
        FilterBand::Bandpass { low_hz: 1.0, high_hz: 15.0 },
        200.0,
    )
    .unwrap();
    let mixed: Vec<f64> = sine(8.0, 1.0, 200.0, 4000)
        .iter()
        .zip(sine(60.0, 1.0, 200.0, 4000))
        .map(|(a, b)| a + b)
        .collect();

    let filtered = filter.filtfilt_padded(&mixed, 150).unwrap();
    let spectrum = PowerSpectrum::periodogram(&filtered, 200.0).unwrap();
    let in_band = spectrum.band_power(7.0, 9.0);
    let rejected = spectrum.band_power(59.0, 61.0);
    assert!(in_band > 1000.0 * rejected);
}

#[test]
fn test_unrealisable_specifications_are_rejected() {
    // Edge above Nyquist
    let spec = FilterSpec::new(20.0, 300.0, 0.1, 20.0, FS);
    assert!(matches!(spec.design(), Err(SqaError::InvalidFilterSpec { .. })));

    // Stopband no deeper than the passband loss
    let spec = FilterSpec::new(20.0, 30.0, 3.0, 1.0, FS);
    assert!(matches!(spec.design(), Err(SqaError::InvalidFilterSpec { .. })));
}

#[test]
fn test_design_is_deterministic() {
    let spec = FilterSpec::high_frequency_noise(&RuleBasedConfig::default());
    assert_eq!(spec.design().unwrap(), spec.design().unwrap());
}
