// src/error.rs
//! Unified error handling for the quality assessment engine
//!
//! Only malformed configuration and malformed input surface as errors.
//! Numeric edge cases inside the checks (flat leads, silent spectra, too few
//! beats) are converted into fail verdicts by the assessors; the variants that
//! describe them exist so that internal stages can report *why* they stopped.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Unified error type for the assessment engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SqaError {
    /// Filter edges or attenuation cannot be realised at the sampling rate
    #[error("[FILTER] Invalid filter specification: {reason}")]
    InvalidFilterSpec { reason: String },

    /// Fewer than two beats detected, or none usable after windowing
    #[error("[BEATS] Insufficient beats during {stage}: {detected} detected, {usable} usable")]
    InsufficientBeats {
        stage: ProcessingStage,
        detected: usize,
        usable: usize,
    },

    /// Signal carries no information (zero dynamic range or zero power)
    #[error("[SIGNAL] Degenerate signal during {stage}: {reason}")]
    DegenerateSignal {
        stage: ProcessingStage,
        reason: String,
    },

    /// Signal shorter than an operation requires
    #[error("[SIGNAL] Signal too short: {required} samples required, got {actual}")]
    SignalTooShort { required: usize, actual: usize },

    /// Invalid input data
    #[error("[DATA] Invalid {data_type}: {reason}")]
    InvalidData { data_type: String, reason: String },

    /// Configuration value out of range or inconsistent
    #[error("[CONFIG] Configuration error in {component}: {reason}")]
    Configuration { component: String, reason: String },
}

/// Pipeline stages used to tag errors raised by the template assessor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessingStage {
    Filtering,
    Detecting,
    CheckingFeasibility,
    BuildingTemplate,
    Scoring,
    RuleBasedCheck,
}

impl fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessingStage::Filtering => "filtering",
            ProcessingStage::Detecting => "beat detection",
            ProcessingStage::CheckingFeasibility => "feasibility check",
            ProcessingStage::BuildingTemplate => "template construction",
            ProcessingStage::Scoring => "correlation scoring",
            ProcessingStage::RuleBasedCheck => "rule-based check",
        };
        f.write_str(name)
    }
}

/// Result type alias for assessment operations
pub type SqaResult<T> = Result<T, SqaError>;

impl SqaError {
    /// Shorthand for [`SqaError::InvalidFilterSpec`]
    pub fn filter_spec(reason: impl Into<String>) -> Self {
        SqaError::InvalidFilterSpec {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`SqaError::InvalidData`]
    pub fn invalid_data(data_type: &str, reason: impl Into<String>) -> Self {
        SqaError::InvalidData {
            data_type: data_type.to_string(),
            reason: reason.into(),
        }
    }

    /// Shorthand for [`SqaError::Configuration`]
    pub fn configuration(component: &str, reason: impl Into<String>) -> Self {
        SqaError::Configuration {
            component: component.to_string(),
            reason: reason.into(),
        }
    }

    /// True for the variants that describe the signal rather than the caller's
    /// input or configuration. These are turned into fail verdicts.
    pub fn is_signal_quality_failure(&self) -> bool {
        matches!(
            self,
            SqaError::InsufficientBeats { .. } | SqaError::DegenerateSignal { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SqaError::InsufficientBeats {
            stage: ProcessingStage::BuildingTemplate,
            detected: 4,
            usable: 0,
        };

        let display = format!("{}", err);
        assert!(display.contains("template construction"));
        assert!(display.contains("4 detected"));
        assert!(display.contains("0 usable"));
    }

    #[test]
    fn test_error_builders() {
        match SqaError::configuration("rule_based", "stride must be positive") {
            SqaError::Configuration { component, reason } => {
                assert_eq!(component, "rule_based");
                assert_eq!(reason, "stride must be positive");
            }
            other => panic!("Expected configuration error, got {:?}", other),
        }

        assert!(format!("{}", SqaError::filter_spec("edge above Nyquist")).contains("Nyquist"));
    }

    #[test]
    fn test_quality_failure_classification() {
        let degenerate = SqaError::DegenerateSignal {
            stage: ProcessingStage::Filtering,
            reason: "zero dynamic range".to_string(),
        };
        assert!(degenerate.is_signal_quality_failure());
        assert!(!SqaError::filter_spec("bad").is_signal_quality_failure());
        assert!(!SqaError::SignalTooShort { required: 10, actual: 2 }.is_signal_quality_failure());
    }

    #[test]
    fn test_error_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqaError>();
    }
}
