// src/quality/feasibility.rs
//! Physiological plausibility gate for detected beats

use crate::config::TemplateConfig;
use crate::signal::rr_intervals;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a beat sequence was rejected
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Infeasibility {
    /// Fewer than two distinct beats, so no rate can be measured
    TooFewBeats { count: usize },
    HeartRateOutOfRange { bpm: f64 },
    RrIntervalTooLong { max_rr_s: f64 },
    RrRatioTooLarge { ratio: f64 },
}

impl fmt::Display for Infeasibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Infeasibility::TooFewBeats { count } => write!(f, "Too few beats ({})", count),
            Infeasibility::HeartRateOutOfRange { bpm } => write!(f, "HR out of range ({:.1} bpm)", bpm),
            Infeasibility::RrIntervalTooLong { max_rr_s } => {
                write!(f, "Max RR interval too large ({:.2} s)", max_rr_s)
            }
            Infeasibility::RrRatioTooLarge { ratio } => {
                write!(f, "Max to min RR interval ratio too large ({:.2})", ratio)
            }
        }
    }
}

/// Limits applied by [`check_feasibility`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeasibilityLimits {
    pub heart_rate_bpm: (f64, f64),
    pub max_rr_interval_s: f64,
    pub max_rr_ratio: f64,
}

impl From<&TemplateConfig> for FeasibilityLimits {
    fn from(config: &TemplateConfig) -> Self {
        Self {
            heart_rate_bpm: config.feasible_heart_rate_bpm,
            max_rr_interval_s: config.max_rr_interval_s,
            max_rr_ratio: config.max_rr_ratio,
        }
    }
}

impl Default for FeasibilityLimits {
    fn default() -> Self {
        Self::from(&TemplateConfig::default())
    }
}

/// Heart rate from the span between first and last beat
///
/// `None` when the span is empty.
pub fn span_heart_rate(beats: &[usize], sampling_rate_hz: f64) -> Option<f64> {
    let (&first, &last) = (beats.first()?, beats.last()?);
    if last <= first {
        return None;
    }
    let span_s = (last - first) as f64 / sampling_rate_hz;
    Some(60.0 * beats.len() as f64 / span_s)
}

/// Check rate, longest RR interval and RR regularity, in that order
pub fn check_feasibility(
    beats: &[usize],
    sampling_rate_hz: f64,
    limits: &FeasibilityLimits,
) -> Result<(), Infeasibility> {
    let too_few = Infeasibility::TooFewBeats { count: beats.len() };
    if beats.len() < 2 {
        return Err(too_few);
    }
    let bpm = span_heart_rate(beats, sampling_rate_hz).ok_or(too_few)?;

    let (low, high) = limits.heart_rate_bpm;
    if bpm < low || bpm > high {
        return Err(Infeasibility::HeartRateOutOfRange { bpm });
    }

    let rr = rr_intervals(beats, sampling_rate_hz);
    let max_rr = rr.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_rr = rr.iter().copied().fold(f64::INFINITY, f64::min);

    if max_rr > limits.max_rr_interval_s {
        return Err(Infeasibility::RrIntervalTooLong { max_rr_s: max_rr });
    }

    if min_rr <= 0.0 {
        return Err(too_few);
    }
    let ratio = max_rr / min_rr;
    if ratio >= limits.max_rr_ratio {
        return Err(Infeasibility::RrRatioTooLarge { ratio });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FS: f64 = 200.0;

    #[test]
    fn test_irregular_rhythm_rejected() {
        // RR 0.8, 0.8, 0.8, 2.0 s
        let beats = [0, 160, 320, 480, 880];
        match check_feasibility(&beats, FS, &FeasibilityLimits::default()) {
            Err(Infeasibility::RrRatioTooLarge { ratio }) => assert!((ratio - 2.5).abs() < 1e-9),
            other => panic!("Expected RR ratio failure, got {:?}", other),
        }
    }

    #[test]
    fn test_regular_rhythm_accepted() {
        // RR 0.8, 0.9, 0.85, 1.0 s
        let beats = [0, 160, 340, 510, 710];
        assert_eq!(check_feasibility(&beats, FS, &FeasibilityLimits::default()), Ok(()));
    }

    #[test]
    fn test_too_few_beats() {
        let limits = FeasibilityLimits::default();
        assert_eq!(
            check_feasibility(&[], FS, &limits),
            Err(Infeasibility::TooFewBeats { count: 0 })
        );
        assert_eq!(
            check_feasibility(&[40], FS, &limits),
            Err(Infeasibility::TooFewBeats { count: 1 })
        );
    }

    #[test]
    fn test_heart_rate_limits() {
        let limits = FeasibilityLimits::default();
        // Two beats 2 s apart: 60 * 2 / 2 = 60 bpm
        assert_eq!(check_feasibility(&[0, 400], FS, &limits), Ok(()));
        // Two beats 4 s apart: 30 bpm
        assert!(matches!(
            check_feasibility(&[0, 800], FS, &limits),
            Err(Infeasibility::HeartRateOutOfRange { .. })
        ));
        // Beats every 0.2 s: 300 bpm and above
        let fast: Vec<usize> = (0..20).map(|k| k * 40).collect();
        assert!(matches!(
            check_feasibility(&fast, FS, &limits),
            Err(Infeasibility::HeartRateOutOfRange { .. })
        ));
    }

    #[test]
    fn test_long_pause_rejected() {
        // Rate is plausible overall but one interval exceeds 3 s
        let beats: Vec<usize> = (0..12).map(|k| k * 100).chain([1100 + 640]).collect();
        assert!(matches!(
            check_feasibility(&beats, FS, &FeasibilityLimits::default()),
            Err(Infeasibility::RrIntervalTooLong { .. })
        ));
    }

    #[test]
    fn test_messages() {
        assert!(Infeasibility::HeartRateOutOfRange { bpm: 30.0 }
            .to_string()
            .starts_with("HR out of range"));
        assert!(Infeasibility::RrIntervalTooLong { max_rr_s: 3.5 }
            .to_string()
            .starts_with("Max RR interval too large"));
    }
}
