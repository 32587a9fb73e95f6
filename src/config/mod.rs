// src/config/mod.rs
//! Assessment configuration
//!
//! Configuration is an immutable value handed to each assessor. Nothing here
//! is global: two assessments with different thresholds can run side by side.

pub mod constants;
pub mod loader;

pub use constants::*;
pub use loader::{ConfigError, ConfigLoader};

use crate::detection::DetectorKind;
use serde::{Deserialize, Serialize};

/// Complete engine configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct AssessmentConfig {
    #[serde(default)]
    pub rule_based: RuleBasedConfig,
    #[serde(default)]
    pub template: TemplateConfig,
}

/// Settings for the multi-lead rule-based pipeline
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RuleBasedConfig {
    /// Working rate of the engine; recordings at other rates are resampled
    #[serde(default = "defaults::rule_sampling_rate_hz")]
    pub sampling_rate_hz: f64,

    #[serde(default = "defaults::max_passband_loss_db")]
    pub max_passband_loss_db: f64,

    #[serde(default = "defaults::min_stopband_attenuation_db")]
    pub min_stopband_attenuation_db: f64,

    /// Passband and stopband edges of the high-frequency noise lowpass
    #[serde(default = "defaults::noise_filter_edges_hz")]
    pub noise_filter_edges_hz: (f64, f64),

    /// Passband and stopband edges of the baseline estimator
    #[serde(default = "defaults::baseline_filter_edges_hz")]
    pub baseline_filter_edges_hz: (f64, f64),

    #[serde(default = "defaults::signal_band_hz")]
    pub signal_band_hz: (f64, f64),

    #[serde(default = "defaults::heart_rate_limits_bpm")]
    pub heart_rate_limits_bpm: (f64, f64),

    #[serde(default = "defaults::snr_threshold")]
    pub snr_threshold: f64,

    /// Only used to derive the expected beat-count bounds
    #[serde(default = "defaults::analysis_duration_s")]
    pub analysis_duration_s: f64,

    #[serde(default = "defaults::stationarity_window_samples")]
    pub stationarity_window_samples: usize,

    #[serde(default = "defaults::stationarity_stride_samples")]
    pub stationarity_stride_samples: usize,

    #[serde(default)]
    pub detector: DetectorKind,
}

/// Settings for the single-lead template-correlation pipeline
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TemplateConfig {
    #[serde(default = "defaults::template_sampling_rate_hz")]
    pub sampling_rate_hz: f64,

    #[serde(default = "defaults::bandpass_order")]
    pub bandpass_order: usize,

    #[serde(default = "defaults::bandpass_edges_hz")]
    pub bandpass_edges_hz: (f64, f64),

    #[serde(default = "defaults::bandpass_pad_samples")]
    pub bandpass_pad_samples: usize,

    #[serde(default = "defaults::peak_refinement_tolerance_s")]
    pub peak_refinement_tolerance_s: f64,

    #[serde(default = "defaults::feasible_heart_rate_bpm")]
    pub feasible_heart_rate_bpm: (f64, f64),

    #[serde(default = "defaults::max_rr_interval_s")]
    pub max_rr_interval_s: f64,

    #[serde(default = "defaults::max_rr_ratio")]
    pub max_rr_ratio: f64,

    #[serde(default = "defaults::correlation_threshold")]
    pub correlation_threshold: f64,

    #[serde(default)]
    pub detector: DetectorKind,
}

/// Default value providers using constants
mod defaults {
    use crate::config::constants::*;

    pub fn rule_sampling_rate_hz() -> f64 { rule_based::DEFAULT_SAMPLING_RATE_HZ }
    pub fn max_passband_loss_db() -> f64 { rule_based::MAX_PASSBAND_LOSS_DB }
    pub fn min_stopband_attenuation_db() -> f64 { rule_based::MIN_STOPBAND_ATTENUATION_DB }
    pub fn noise_filter_edges_hz() -> (f64, f64) {
        (rule_based::NOISE_PASSBAND_EDGE_HZ, rule_based::NOISE_STOPBAND_EDGE_HZ)
    }
    pub fn baseline_filter_edges_hz() -> (f64, f64) {
        (rule_based::BASELINE_PASSBAND_EDGE_HZ, rule_based::BASELINE_STOPBAND_EDGE_HZ)
    }
    pub fn signal_band_hz() -> (f64, f64) { rule_based::SIGNAL_BAND_HZ }
    pub fn heart_rate_limits_bpm() -> (f64, f64) { rule_based::HEART_RATE_LIMITS_BPM }
    pub fn snr_threshold() -> f64 { rule_based::SNR_THRESHOLD }
    pub fn analysis_duration_s() -> f64 { rule_based::ANALYSIS_DURATION_S }
    pub fn stationarity_window_samples() -> usize { rule_based::STATIONARITY_WINDOW_SAMPLES }
    pub fn stationarity_stride_samples() -> usize { rule_based::STATIONARITY_STRIDE_SAMPLES }

    pub fn template_sampling_rate_hz() -> f64 { template::DEFAULT_SAMPLING_RATE_HZ }
    pub fn bandpass_order() -> usize { template::BANDPASS_ORDER }
    pub fn bandpass_edges_hz() -> (f64, f64) { (template::BANDPASS_LOW_HZ, template::BANDPASS_HIGH_HZ) }
    pub fn bandpass_pad_samples() -> usize { template::BANDPASS_PAD_SAMPLES }
    pub fn peak_refinement_tolerance_s() -> f64 { template::PEAK_REFINEMENT_TOLERANCE_S }
    pub fn feasible_heart_rate_bpm() -> (f64, f64) { template::FEASIBLE_HEART_RATE_BPM }
    pub fn max_rr_interval_s() -> f64 { template::MAX_RR_INTERVAL_S }
    pub fn max_rr_ratio() -> f64 { template::MAX_RR_RATIO }
    pub fn correlation_threshold() -> f64 { template::CORRELATION_THRESHOLD }
}

impl Default for RuleBasedConfig {
    fn default() -> Self {
        Self {
            sampling_rate_hz: defaults::rule_sampling_rate_hz(),
            max_passband_loss_db: defaults::max_passband_loss_db(),
            min_stopband_attenuation_db: defaults::min_stopband_attenuation_db(),
            noise_filter_edges_hz: defaults::noise_filter_edges_hz(),
            baseline_filter_edges_hz: defaults::baseline_filter_edges_hz(),
            signal_band_hz: defaults::signal_band_hz(),
            heart_rate_limits_bpm: defaults::heart_rate_limits_bpm(),
            snr_threshold: defaults::snr_threshold(),
            analysis_duration_s: defaults::analysis_duration_s(),
            stationarity_window_samples: defaults::stationarity_window_samples(),
            stationarity_stride_samples: defaults::stationarity_stride_samples(),
            detector: DetectorKind::default(),
        }
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            sampling_rate_hz: defaults::template_sampling_rate_hz(),
            bandpass_order: defaults::bandpass_order(),
            bandpass_edges_hz: defaults::bandpass_edges_hz(),
            bandpass_pad_samples: defaults::bandpass_pad_samples(),
            peak_refinement_tolerance_s: defaults::peak_refinement_tolerance_s(),
            feasible_heart_rate_bpm: defaults::feasible_heart_rate_bpm(),
            max_rr_interval_s: defaults::max_rr_interval_s(),
            max_rr_ratio: defaults::max_rr_ratio(),
            correlation_threshold: defaults::correlation_threshold(),
            detector: DetectorKind::default(),
        }
    }
}

impl RuleBasedConfig {
    /// Expected beat-count bounds `(min, max)` over the analysis duration
    pub fn beat_count_bounds(&self) -> (f64, f64) {
        let (low_bpm, high_bpm) = self.heart_rate_limits_bpm;
        (
            low_bpm * self.analysis_duration_s / 60.0,
            high_bpm * self.analysis_duration_s / 60.0,
        )
    }

    /// Collect every inconsistency in the rule-based settings
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let nyquist = self.sampling_rate_hz / 2.0;

        if self.sampling_rate_hz <= 0.0 || !self.sampling_rate_hz.is_finite() {
            errors.push(format!("Sampling rate must be positive, got {}", self.sampling_rate_hz));
        }

        for (name, (pass, stop)) in [
            ("noise filter", self.noise_filter_edges_hz),
            ("baseline filter", self.baseline_filter_edges_hz),
        ] {
            if pass <= 0.0 || pass >= stop {
                errors.push(format!(
                    "{} passband edge ({} Hz) must be positive and below the stopband edge ({} Hz)",
                    name, pass, stop
                ));
            }
            if stop >= nyquist {
                errors.push(format!(
                    "{} stopband edge ({} Hz) must be less than Nyquist frequency ({} Hz)",
                    name, stop, nyquist
                ));
            }
        }

        if self.max_passband_loss_db <= 0.0
            || self.min_stopband_attenuation_db <= self.max_passband_loss_db
        {
            errors.push(format!(
                "Attenuation spec invalid: passband loss {} dB, stopband attenuation {} dB",
                self.max_passband_loss_db, self.min_stopband_attenuation_db
            ));
        }

        let (band_low, band_high) = self.signal_band_hz;
        if band_low < 0.0 || band_low >= band_high || band_high > nyquist {
            errors.push(format!(
                "Signal band {}-{} Hz must be ordered and within Nyquist ({} Hz)",
                band_low, band_high, nyquist
            ));
        }

        let (hr_low, hr_high) = self.heart_rate_limits_bpm;
        if hr_low < 0.0 || hr_low >= hr_high {
            errors.push(format!("Heart-rate limits {}-{} bpm must be ordered", hr_low, hr_high));
        }

        if self.snr_threshold < 0.0 {
            errors.push("SNR threshold cannot be negative".to_string());
        }
        if self.analysis_duration_s <= 0.0 {
            errors.push("Analysis duration must be positive".to_string());
        }
        if self.stationarity_window_samples == 0 {
            errors.push("Stationarity window must be greater than 0".to_string());
        }
        if self.stationarity_stride_samples == 0 {
            errors.push("Stationarity stride must be greater than 0".to_string());
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl TemplateConfig {
    /// Collect every inconsistency in the template settings
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let nyquist = self.sampling_rate_hz / 2.0;

        if self.sampling_rate_hz <= 0.0 || !self.sampling_rate_hz.is_finite() {
            errors.push(format!("Sampling rate must be positive, got {}", self.sampling_rate_hz));
        }
        if self.bandpass_order == 0 || self.bandpass_order > filters::MAX_FILTER_ORDER {
            errors.push(format!(
                "Bandpass order must be {}-{}, got {}",
                filters::MIN_FILTER_ORDER,
                filters::MAX_FILTER_ORDER,
                self.bandpass_order
            ));
        }

        let (low, high) = self.bandpass_edges_hz;
        if low <= 0.0 || low >= high || high >= nyquist {
            errors.push(format!(
                "Bandpass edges {}-{} Hz must be ordered and below Nyquist ({} Hz)",
                low, high, nyquist
            ));
        }

        if self.peak_refinement_tolerance_s < 0.0 {
            errors.push("Peak refinement tolerance cannot be negative".to_string());
        }

        let (hr_low, hr_high) = self.feasible_heart_rate_bpm;
        if hr_low <= 0.0 || hr_low >= hr_high {
            errors.push(format!(
                "Feasible heart-rate range {}-{} bpm must be positive and ordered",
                hr_low, hr_high
            ));
        }
        if self.max_rr_interval_s <= 0.0 {
            errors.push("Maximum RR interval must be positive".to_string());
        }
        if self.max_rr_ratio < 1.0 {
            errors.push(format!("Maximum RR ratio must be at least 1, got {}", self.max_rr_ratio));
        }
        if !(-1.0..=1.0).contains(&self.correlation_threshold) {
            errors.push(format!(
                "Correlation threshold must lie in [-1, 1], got {}",
                self.correlation_threshold
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl AssessmentConfig {
    /// Validate both pipelines, prefixing messages with the section name
    pub fn validate_consistency(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if let Err(errs) = self.rule_based.validate() {
            errors.extend(errs.into_iter().map(|e| format!("rule_based: {}", e)));
        }
        if let Err(errs) = self.template.validate() {
            errors.extend(errs.into_iter().map(|e| format!("template: {}", e)));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Get configuration summary
    pub fn get_summary(&self) -> ConfigSummary {
        ConfigSummary {
            rule_based_rate_hz: self.rule_based.sampling_rate_hz,
            template_rate_hz: self.template.sampling_rate_hz,
            snr_threshold: self.rule_based.snr_threshold,
            correlation_threshold: self.template.correlation_threshold,
            rule_based_detector: self.rule_based.detector,
            template_detector: self.template.detector,
        }
    }
}

/// Configuration summary for display/logging
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub rule_based_rate_hz: f64,
    pub template_rate_hz: f64,
    pub snr_threshold: f64,
    pub correlation_threshold: f64,
    pub rule_based_detector: DetectorKind,
    pub template_detector: DetectorKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AssessmentConfig::default();
        assert_eq!(config.rule_based.sampling_rate_hz, 500.0);
        assert_eq!(config.template.sampling_rate_hz, 200.0);
        assert!(config.validate_consistency().is_ok());
    }

    #[test]
    fn test_pipelines_keep_distinct_heart_rate_limits() {
        let config = AssessmentConfig::default();
        assert_eq!(config.rule_based.heart_rate_limits_bpm, (24.0, 300.0));
        assert_eq!(config.template.feasible_heart_rate_bpm, (40.0, 180.0));
    }

    #[test]
    fn test_beat_count_bounds() {
        let config = RuleBasedConfig::default();
        let (min_beats, max_beats) = config.beat_count_bounds();
        assert!((min_beats - 4.0).abs() < 1e-12);
        assert!((max_beats - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_config_serialization() {
        let config = AssessmentConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: AssessmentConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: AssessmentConfig = toml::from_str(
            "[rule_based]\nsnr_threshold = 0.8\n\n[template]\ncorrelation_threshold = 0.7\n",
        )
        .unwrap();

        assert_eq!(parsed.rule_based.snr_threshold, 0.8);
        assert_eq!(parsed.rule_based.stationarity_window_samples, 100);
        assert_eq!(parsed.template.correlation_threshold, 0.7);
        assert_eq!(parsed.template.bandpass_order, 3);
    }

    #[test]
    fn test_filter_edges_above_nyquist_rejected() {
        let mut config = AssessmentConfig::default();
        config.rule_based.sampling_rate_hz = 50.0;

        let errors = config.validate_consistency().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("Nyquist")));
        assert!(errors.iter().all(|e| e.starts_with("rule_based")));
    }

    #[test]
    fn test_invalid_template_config() {
        let mut config = TemplateConfig::default();
        config.correlation_threshold = 1.5;
        config.max_rr_ratio = 0.5;

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_zero_stride_rejected() {
        let mut config = RuleBasedConfig::default();
        config.stationarity_stride_samples = 0;
        assert!(config.validate().is_err());
    }
}
