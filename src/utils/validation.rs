//! Input validation helpers shared by the signal types and assessors

use crate::error::{SqaError, SqaResult};

/// Sampling rate must be finite and positive
pub fn validate_sampling_rate(sampling_rate_hz: f64) -> SqaResult<()> {
    if !sampling_rate_hz.is_finite() || sampling_rate_hz <= 0.0 {
        return Err(SqaError::invalid_data(
            "sampling rate",
            format!("must be finite and positive, got {}", sampling_rate_hz),
        ));
    }
    Ok(())
}

/// Every sample must be finite
pub fn validate_samples(samples: &[f64], data_type: &str) -> SqaResult<()> {
    if let Some(index) = samples.iter().position(|v| !v.is_finite()) {
        return Err(SqaError::invalid_data(
            data_type,
            format!("non-finite sample at index {}", index),
        ));
    }
    Ok(())
}

/// Require at least `required` samples
pub fn validate_min_length(samples: &[f64], required: usize) -> SqaResult<()> {
    if samples.len() < required {
        return Err(SqaError::SignalTooShort {
            required,
            actual: samples.len(),
        });
    }
    Ok(())
}
