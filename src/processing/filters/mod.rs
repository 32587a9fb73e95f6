// src/processing/filters/mod.rs
//! Digital filters for ECG quality assessment

pub mod design;
pub mod iir;

pub use design::{butterworth, estimate_order};
pub use iir::{Biquad, IirFilter, SosFilter};

use crate::config::{RuleBasedConfig, TemplateConfig};
use crate::error::{SqaError, SqaResult};
use serde::{Deserialize, Serialize};

/// Frequency band of a Butterworth design
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FilterBand {
    Lowpass { cutoff_hz: f64 },
    Highpass { cutoff_hz: f64 },
    Bandpass { low_hz: f64, high_hz: f64 },
}

/// Passband/stopband requirement for an order-estimated filter
///
/// Lowpass when the passband edge lies below the stopband edge, highpass
/// otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub passband_edge_hz: f64,
    pub stopband_edge_hz: f64,
    pub max_passband_loss_db: f64,
    pub min_stopband_attenuation_db: f64,
    pub sampling_rate_hz: f64,
}

/// Result of order estimation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderEstimate {
    pub order: usize,
    /// Natural (-3 dB) frequency
    pub cutoff_hz: f64,
    pub band: FilterBand,
}

impl FilterSpec {
    pub fn new(
        passband_edge_hz: f64,
        stopband_edge_hz: f64,
        max_passband_loss_db: f64,
        min_stopband_attenuation_db: f64,
        sampling_rate_hz: f64,
    ) -> Self {
        Self {
            passband_edge_hz,
            stopband_edge_hz,
            max_passband_loss_db,
            min_stopband_attenuation_db,
            sampling_rate_hz,
        }
    }

    /// Lowpass removing high-frequency noise above the ECG band
    pub fn high_frequency_noise(config: &RuleBasedConfig) -> Self {
        let (pass, stop) = config.noise_filter_edges_hz;
        Self::new(
            pass,
            stop,
            config.max_passband_loss_db,
            config.min_stopband_attenuation_db,
            config.sampling_rate_hz,
        )
    }

    /// Lowpass isolating baseline wander
    pub fn baseline_wander(config: &RuleBasedConfig) -> Self {
        let (pass, stop) = config.baseline_filter_edges_hz;
        Self::new(
            pass,
            stop,
            config.max_passband_loss_db,
            config.min_stopband_attenuation_db,
            config.sampling_rate_hz,
        )
    }

    pub fn validate(&self) -> SqaResult<()> {
        let nyquist = self.sampling_rate_hz / 2.0;
        if !self.sampling_rate_hz.is_finite() || self.sampling_rate_hz <= 0.0 {
            return Err(SqaError::filter_spec(format!(
                "sampling rate must be positive, got {}",
                self.sampling_rate_hz
            )));
        }
        for (name, edge) in [
            ("passband", self.passband_edge_hz),
            ("stopband", self.stopband_edge_hz),
        ] {
            if !(edge > 0.0 && edge < nyquist) {
                return Err(SqaError::filter_spec(format!(
                    "{} edge {} Hz must lie strictly between 0 and Nyquist ({} Hz)",
                    name, edge, nyquist
                )));
            }
        }
        if self.passband_edge_hz == self.stopband_edge_hz {
            return Err(SqaError::filter_spec("passband and stopband edges coincide"));
        }
        if !(self.max_passband_loss_db > 0.0) {
            return Err(SqaError::filter_spec("passband loss must be positive"));
        }
        if !(self.min_stopband_attenuation_db > self.max_passband_loss_db) {
            return Err(SqaError::filter_spec(format!(
                "stopband attenuation {} dB must exceed passband loss {} dB",
                self.min_stopband_attenuation_db, self.max_passband_loss_db
            )));
        }
        Ok(())
    }

    /// Estimate the minimum order, then synthesise the filter
    pub fn design(&self) -> SqaResult<SosFilter> {
        let estimate = estimate_order(self)?;
        butterworth(estimate.order, estimate.band, self.sampling_rate_hz)
    }
}

/// Fixed-order bandpass applied ahead of template matching
pub fn template_bandpass(config: &TemplateConfig) -> SqaResult<SosFilter> {
    let (low_hz, high_hz) = config.bandpass_edges_hz;
    butterworth(
        config.bandpass_order,
        FilterBand::Bandpass { low_hz, high_hz },
        config.sampling_rate_hz,
    )
}
