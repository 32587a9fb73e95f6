// src/quality/mod.rs
//! Signal quality assessment pipelines
//!
//! - [`rule_based`]: stationarity, heart-rate range and SNR per lead
//! - [`matrix`]: combining per-lead checks into a composite verdict
//! - [`feasibility`]: plausibility gate for detected beats
//! - [`template`]: beat-template correlation on a single lead

pub mod feasibility;
pub mod matrix;
pub mod rule_based;
pub mod template;

pub use feasibility::{check_feasibility, span_heart_rate, FeasibilityLimits, Infeasibility};
pub use matrix::{LeadReport, QualityCheck, QualityMatrix};
pub use rule_based::{
    heart_rate_failed, signal_to_noise_ratio, stationarity_failed, LeadAssessment,
    RuleBasedAssessor,
};
pub use template::{
    build_template, refine_beats, template_correlation, template_half_width, BeatTemplate,
    TemplateAssessor, TemplateOutcome,
};
