//! ECG-Quality: signal quality assessment for electrocardiogram recordings
//!
//! Two independent assessment pipelines:
//!
//! - Rule-based multi-lead checks (flat-segment stationarity, heart-rate
//!   range, in-band SNR) combined into a per-lead quality matrix
//! - Single-lead template correlation: bandpass, beat detection and
//!   feasibility gating, then the mean correlation of each beat with the
//!   averaged beat template
//!
//! Filters are Butterworth designs executed as zero-phase second-order
//! sections. Beat detection is pluggable through [`detection::BeatDetector`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ecg_quality::{assess_rule_based, assess_template, MultiLeadRecording};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let lead: Vec<f64> = (0..5000).map(|i| (i as f64 * 0.1).sin()).collect();
//!     let recording = MultiLeadRecording::new(vec![lead.clone(), lead.clone()], 500.0)?;
//!
//!     let matrix = assess_rule_based(&recording, 2, 500.0)?;
//!     println!("{}", matrix);
//!
//!     let acceptable = assess_template(&lead, 500.0, 0.66)?;
//!     println!("template acceptable: {}", acceptable);
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod detection;
pub mod error;
pub mod processing;
pub mod quality;
pub mod signal;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{AssessmentConfig, ConfigError, ConfigLoader, RuleBasedConfig, TemplateConfig};
pub use detection::{AnnotatedBeats, BeatDetector, DetectorKind};
pub use error::{ProcessingStage, SqaError, SqaResult};
pub use quality::{
    Infeasibility, LeadReport, QualityCheck, QualityMatrix, RuleBasedAssessor, TemplateAssessor,
    TemplateOutcome,
};
pub use signal::{LinearResampler, MultiLeadRecording, Resampler, Signal};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Run the rule-based checks with default settings
///
/// Leads `1..=total_leads` are assessed. A recording captured at a rate other
/// than the working rate (500 Hz) is resampled linearly first.
pub fn assess_rule_based(
    recording: &MultiLeadRecording,
    total_leads: usize,
    native_sample_rate_hz: f64,
) -> SqaResult<QualityMatrix> {
    RuleBasedAssessor::new(RuleBasedConfig::default())?.assess(
        recording,
        total_leads,
        native_sample_rate_hz,
    )
}

/// Template-correlation verdict for one lead
pub fn assess_template(samples: &[f64], sampling_rate_hz: f64, threshold: f64) -> SqaResult<bool> {
    assess_template_detailed(samples, sampling_rate_hz, threshold).map(|o| o.is_acceptable())
}

/// Template-correlation verdict for a [`Signal`]
///
/// The signal must have been captured at `sampling_rate_hz`; a mismatch is
/// `SqaError::InvalidData`.
pub fn assess_template_signal(
    signal: &Signal,
    sampling_rate_hz: f64,
    threshold: f64,
) -> SqaResult<bool> {
    let config = TemplateConfig {
        sampling_rate_hz,
        correlation_threshold: threshold,
        ..TemplateConfig::default()
    };
    TemplateAssessor::new(config)?
        .assess_signal(signal)
        .map(|o| o.is_acceptable())
}

/// Template-correlation outcome, keeping the reason for a rejection
pub fn assess_template_detailed(
    samples: &[f64],
    sampling_rate_hz: f64,
    threshold: f64,
) -> SqaResult<TemplateOutcome> {
    let config = TemplateConfig {
        sampling_rate_hz,
        correlation_threshold: threshold,
        ..TemplateConfig::default()
    };
    TemplateAssessor::new(config)?.assess(samples)
}

/// Get library information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: "ECG signal quality assessment library".to_string(),
        features: vec![
            "Rule-based multi-lead quality matrix".to_string(),
            "Template-correlation single-lead assessment".to_string(),
            "Zero-phase Butterworth filtering".to_string(),
            "Pluggable beat detection".to_string(),
            "Layered TOML configuration".to_string(),
        ],
    }
}

/// Library version information
#[derive(Debug, Clone)]
pub struct VersionInfo {
    /// Library name
    pub name: String,
    /// Version string
    pub version: String,
    /// Description
    pub description: String,
    /// List of features
    pub features: Vec<String>,
}
