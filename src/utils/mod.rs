//! Common utility functions
//!
//! - Windowed statistics, median and normalisation helpers
//! - Input validation shared by the signal types and assessors

pub mod stats;
pub mod validation;

pub use stats::{
    argmax, dynamic_range, mean, median, min_max, normalize_min_max, pearson_correlation,
};
pub use validation::{validate_min_length, validate_samples, validate_sampling_rate};
