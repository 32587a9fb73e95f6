// src/detection/matched_filter.rs
//! QRS detection by correlation with a Ricker (Mexican-hat) template

use super::{pick_peaks, strongest_near, BeatDetector};
use crate::config::constants::detection;
use crate::utils::stats::{dynamic_range, mean};
use tracing::debug;

/// Template width in standard deviations either side of the centre
const TEMPLATE_HALF_WIDTH_SIGMAS: f64 = 4.0;
/// Detection threshold relative to the high percentile of the response
const RESPONSE_FRACTION: f64 = 0.3;
const RESPONSE_PERCENTILE: f64 = 0.98;

#[derive(Debug, Clone)]
pub struct MatchedFilterDetector {
    /// Gaussian width of the QRS model
    qrs_sigma_s: f64,
    refractory_period_s: f64,
}

impl Default for MatchedFilterDetector {
    fn default() -> Self {
        Self {
            qrs_sigma_s: 0.025,
            refractory_period_s: detection::REFRACTORY_PERIOD_S,
        }
    }
}

impl MatchedFilterDetector {
    fn template(&self, fs: f64) -> Vec<f64> {
        let sigma = (self.qrs_sigma_s * fs).max(1.0);
        let half = (TEMPLATE_HALF_WIDTH_SIGMAS * sigma).ceil() as isize;
        (-half..=half)
            .map(|k| {
                let t = k as f64 / sigma;
                (1.0 - t * t) * (-0.5 * t * t).exp()
            })
            .collect()
    }
}

/// Centred cross-correlation, zero where the template overhangs the signal
fn correlate(samples: &[f64], template: &[f64]) -> Vec<f64> {
    let half = template.len() / 2;
    let mut response = vec![0.0; samples.len()];
    if samples.len() < template.len() {
        return response;
    }
    for (centre, out) in response
        .iter_mut()
        .enumerate()
        .skip(half)
        .take(samples.len() - template.len() + 1)
    {
        let start = centre - half;
        *out = samples[start..start + template.len()]
            .iter()
            .zip(template)
            .map(|(s, t)| s * t)
            .sum();
    }
    response
}

fn percentile(values: &[f64], fraction: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = ((sorted.len().saturating_sub(1)) as f64 * fraction).round() as usize;
    sorted.get(rank).copied().unwrap_or(0.0)
}

impl BeatDetector for MatchedFilterDetector {
    fn detect(&self, samples: &[f64], sampling_rate_hz: f64) -> Vec<usize> {
        if dynamic_range(samples) == 0.0 {
            return Vec::new();
        }

        let offset = mean(samples).unwrap_or(0.0);
        let centred: Vec<f64> = samples.iter().map(|s| s - offset).collect();
        let template = self.template(sampling_rate_hz);
        let response = correlate(&centred, &template);

        let threshold = RESPONSE_FRACTION * percentile(&response, RESPONSE_PERCENTILE);
        if threshold <= 0.0 {
            return Vec::new();
        }

        let refractory = (self.refractory_period_s * sampling_rate_hz).round() as usize;
        let peaks = pick_peaks(&response, threshold, refractory);

        let radius = template.len() / 4;
        let mut beats: Vec<usize> = peaks
            .iter()
            .map(|&p| strongest_near(&centred, p, radius))
            .collect();
        beats.sort_unstable();
        beats.dedup();

        debug!(threshold, beats = beats.len(), "matched-filter detection");
        beats
    }

    fn name(&self) -> &str {
        "matched-filter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_shape() {
        let template = MatchedFilterDetector::default().template(200.0);
        assert_eq!(template.len() % 2, 1);
        assert_eq!(template[template.len() / 2], 1.0);
        assert!(template.iter().sum::<f64>().abs() < 0.1 * template.len() as f64);
    }

    #[test]
    fn test_detects_spikes() {
        let fs = 200.0;
        let truth: Vec<usize> = (0..8).map(|k| 80 + k * 160).collect();
        let sigma = 0.02 * fs;
        let signal: Vec<f64> = (0..1400)
            .map(|i| {
                truth
                    .iter()
                    .map(|&b| {
                        let t = (i as f64 - b as f64) / sigma;
                        (-0.5 * t * t).exp()
                    })
                    .sum()
            })
            .collect();

        let beats = MatchedFilterDetector::default().detect(&signal, fs);
        assert_eq!(beats, truth);
    }

    #[test]
    fn test_flat_and_short_signals() {
        let detector = MatchedFilterDetector::default();
        assert!(detector.detect(&[2.0; 1000], 200.0).is_empty());
        assert!(detector.detect(&[0.0, 1.0, 0.0], 200.0).is_empty());
    }

    #[test]
    fn test_percentile() {
        let values: Vec<f64> = (0..101).map(|i| i as f64).collect();
        assert_eq!(percentile(&values, 0.98), 98.0);
        assert_eq!(percentile(&[], 0.98), 0.0);
    }
}
