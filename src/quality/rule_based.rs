// src/quality/rule_based.rs
//! Multi-lead rule-based checks: stationarity, heart-rate range and SNR

use super::matrix::QualityMatrix;
use crate::config::RuleBasedConfig;
use crate::detection::BeatDetector;
use crate::error::{SqaError, SqaResult};
use crate::processing::{strided_windows, FilterSpec, PowerSpectrum, SosFilter};
use crate::signal::{resample_recording, LinearResampler, MultiLeadRecording, Resampler};
use crate::utils::stats::dynamic_range;
use crate::utils::validation::validate_min_length;
use rayon::prelude::*;
use tracing::{debug, instrument};

/// Per-lead result of the three checks; `true` marks a failure
#[derive(Debug, Clone, PartialEq)]
pub struct LeadAssessment {
    pub stationarity_failed: bool,
    pub heart_rate_failed: bool,
    pub snr_failed: bool,
    pub beat_count: usize,
    /// `None` when the lead carries no spectral power
    pub snr: Option<f64>,
}

impl LeadAssessment {
    pub fn any_failed(&self) -> bool {
        self.stationarity_failed || self.heart_rate_failed || self.snr_failed
    }
}

/// Fails when any `window`-sample window starting at a multiple of `stride`
/// has zero dynamic range, or when no full window fits
pub fn stationarity_failed(samples: &[f64], window: usize, stride: usize) -> bool {
    if window == 0 || samples.len() < window {
        return true;
    }
    strided_windows(samples, window, stride.max(1)).any(|w| dynamic_range(w) == 0.0)
}

/// Fails when the beat count lies outside the open interval `bounds`
pub fn heart_rate_failed(beat_count: usize, bounds: (f64, f64)) -> bool {
    let count = beat_count as f64;
    count < bounds.0 || count > bounds.1
}

/// In-band over out-of-band power; `None` for a silent lead
pub fn signal_to_noise_ratio(samples: &[f64], sampling_rate_hz: f64, band_hz: (f64, f64)) -> Option<f64> {
    if dynamic_range(samples) == 0.0 {
        return None;
    }
    let spectrum = PowerSpectrum::periodogram(samples, sampling_rate_hz).ok()?;
    let total = spectrum.total_power();
    if total <= 0.0 {
        return None;
    }
    let in_band = spectrum.band_power(band_hz.0, band_hz.1);
    let out_of_band = spectrum.out_of_band_power(band_hz.0, band_hz.1);
    Some(in_band / out_of_band)
}

/// Rule-based assessor with filters designed once for its configuration
pub struct RuleBasedAssessor {
    config: RuleBasedConfig,
    noise_filter: SosFilter,
    baseline_filter: SosFilter,
    detector: Box<dyn BeatDetector>,
    resampler: Box<dyn Resampler>,
}

impl RuleBasedAssessor {
    pub fn new(config: RuleBasedConfig) -> SqaResult<Self> {
        config
            .validate()
            .map_err(|errors| SqaError::configuration("rule_based", errors.join("; ")))?;

        let noise_filter = FilterSpec::high_frequency_noise(&config).design()?;
        let baseline_filter = FilterSpec::baseline_wander(&config).design()?;
        debug!(
            noise_order = noise_filter.order(),
            baseline_order = baseline_filter.order(),
            "designed rule-based filters"
        );

        Ok(Self {
            detector: config.detector.build(),
            resampler: Box::new(LinearResampler),
            config,
            noise_filter,
            baseline_filter,
        })
    }

    pub fn with_detector(mut self, detector: Box<dyn BeatDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_resampler(mut self, resampler: Box<dyn Resampler>) -> Self {
        self.resampler = resampler;
        self
    }

    pub fn config(&self) -> &RuleBasedConfig {
        &self.config
    }

    /// Noise-lowpassed lead minus its baseline estimate
    pub fn filter_lead(&self, raw: &[f64]) -> SqaResult<Vec<f64>> {
        let smoothed = self.noise_filter.filtfilt(raw)?;
        let baseline = self.baseline_filter.filtfilt(raw)?;
        Ok(smoothed.iter().zip(&baseline).map(|(s, b)| s - b).collect())
    }

    /// Run all three checks on one lead sampled at the working rate
    pub fn assess_lead(&self, raw: &[f64]) -> SqaResult<LeadAssessment> {
        let config = &self.config;
        let stationarity_failed = stationarity_failed(
            raw,
            config.stationarity_window_samples,
            config.stationarity_stride_samples,
        );

        let filtered = self.filter_lead(raw)?;
        let beat_count = self.detector.detect(&filtered, config.sampling_rate_hz).len();
        let heart_rate_failed = heart_rate_failed(beat_count, config.beat_count_bounds());

        let snr = signal_to_noise_ratio(raw, config.sampling_rate_hz, config.signal_band_hz);
        let snr_failed = snr.map_or(true, |ratio| ratio < config.snr_threshold);

        Ok(LeadAssessment {
            stationarity_failed,
            heart_rate_failed,
            snr_failed,
            beat_count,
            snr,
        })
    }

    /// Assess leads `1..=total_leads` and combine them into a quality matrix
    #[instrument(skip(self, recording), fields(detector = self.detector.name()))]
    pub fn assess(
        &self,
        recording: &MultiLeadRecording,
        total_leads: usize,
        native_sample_rate_hz: f64,
    ) -> SqaResult<QualityMatrix> {
        if total_leads == 0 || total_leads > recording.lead_count() {
            return Err(SqaError::invalid_data(
                "recording",
                format!(
                    "requested {} leads, recording holds {}",
                    total_leads,
                    recording.lead_count()
                ),
            ));
        }
        if recording.sampling_rate_hz() != native_sample_rate_hz {
            return Err(SqaError::invalid_data(
                "recording",
                format!(
                    "declared rate {} Hz differs from recording rate {} Hz",
                    native_sample_rate_hz,
                    recording.sampling_rate_hz()
                ),
            ));
        }

        let working = if native_sample_rate_hz != self.config.sampling_rate_hz {
            resample_recording(recording, self.config.sampling_rate_hz, self.resampler.as_ref())?
        } else {
            recording.clone()
        };

        validate_min_length(&working.leads()[0], self.config.stationarity_window_samples)?;

        let leads: Vec<LeadAssessment> = working.leads()[..total_leads]
            .par_iter()
            .map(|lead| self.assess_lead(lead))
            .collect::<SqaResult<_>>()?;

        for (i, lead) in leads.iter().enumerate() {
            debug!(
                lead = i + 1,
                stationarity_failed = lead.stationarity_failed,
                heart_rate_failed = lead.heart_rate_failed,
                beats = lead.beat_count,
                snr = ?lead.snr,
                snr_failed = lead.snr_failed,
                "lead assessed"
            );
        }

        QualityMatrix::from_rows(
            leads.iter().map(|l| l.stationarity_failed).collect(),
            leads.iter().map(|l| l.heart_rate_failed).collect(),
            leads.iter().map(|l| l.snr_failed).collect(),
        )
    }
}
