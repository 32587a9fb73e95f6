// src/detection/pan_tompkins.rs
//! Pan-Tompkins style QRS detector
//!
//! Bandpass, five-point derivative, squaring and moving-window integration,
//! followed by an adaptive signal/noise peak threshold with search-back.

use super::{pick_peaks, strongest_near, BeatDetector};
use crate::config::constants::detection;
use crate::processing::filters::{butterworth, FilterBand};
use crate::utils::stats::dynamic_range;
use tracing::debug;

/// Missed-beat interval as a multiple of the running RR average
const SEARCH_BACK_RR_FACTOR: f64 = 1.66;
/// RR intervals averaged for search-back
const RR_HISTORY: usize = 8;

#[derive(Debug, Clone)]
pub struct PanTompkinsDetector {
    qrs_band_hz: (f64, f64),
    integration_window_s: f64,
    refractory_period_s: f64,
    learning_period_s: f64,
}

impl Default for PanTompkinsDetector {
    fn default() -> Self {
        Self {
            qrs_band_hz: detection::QRS_BAND_HZ,
            integration_window_s: detection::INTEGRATION_WINDOW_S,
            refractory_period_s: detection::REFRACTORY_PERIOD_S,
            learning_period_s: detection::LEARNING_PERIOD_S,
        }
    }
}

/// Running signal and noise peak estimates
#[derive(Debug, Clone, Copy)]
struct PeakLevels {
    signal: f64,
    noise: f64,
}

impl PeakLevels {
    fn threshold(&self) -> f64 {
        self.noise + detection::THRESHOLD_FRACTION * (self.signal - self.noise)
    }

    fn signal_peak(&mut self, value: f64, weight: f64) {
        self.signal = weight * value + (1.0 - weight) * self.signal;
    }

    fn noise_peak(&mut self, value: f64) {
        let w = detection::SIGNAL_PEAK_WEIGHT;
        self.noise = w * value + (1.0 - w) * self.noise;
    }
}

impl PanTompkinsDetector {
    fn bandpass(&self, samples: &[f64], fs: f64) -> Option<Vec<f64>> {
        let (low_hz, high_hz) = self.qrs_band_hz;
        let filter = butterworth(detection::QRS_BAND_ORDER, FilterBand::Bandpass { low_hz, high_hz }, fs).ok()?;
        filter.filtfilt(samples).ok()
    }

    /// Squared five-point derivative integrated over a centred window
    fn integrate(&self, bandpassed: &[f64], fs: f64) -> Vec<f64> {
        let n = bandpassed.len();
        let mut energy = vec![0.0; n];
        for i in 2..n.saturating_sub(2) {
            let d = (-bandpassed[i - 2] - 2.0 * bandpassed[i - 1]
                + 2.0 * bandpassed[i + 1]
                + bandpassed[i + 2])
                / 8.0;
            energy[i] = d * d;
        }

        let width = ((self.integration_window_s * fs).round() as usize).max(1);
        let half = width / 2;
        let mut prefix = Vec::with_capacity(n + 1);
        prefix.push(0.0);
        for (i, e) in energy.iter().enumerate() {
            prefix.push(prefix[i] + e);
        }

        (0..n)
            .map(|i| {
                let start = i.saturating_sub(half);
                let end = (i + width - half).min(n);
                (prefix[end] - prefix[start]) / width as f64
            })
            .collect()
    }

    fn classify(&self, integrated: &[f64], candidates: &[usize], fs: f64) -> Vec<usize> {
        let learning_end = ((self.learning_period_s * fs) as usize).clamp(1, integrated.len());
        let learning = &integrated[..learning_end];
        let learning_max = learning.iter().copied().fold(0.0, f64::max);
        let learning_mean = learning.iter().sum::<f64>() / learning.len() as f64;

        let mut levels = PeakLevels {
            signal: detection::THRESHOLD_FRACTION * learning_max,
            noise: 0.5 * learning_mean,
        };

        let mut beats: Vec<usize> = Vec::new();
        let mut skipped: Vec<usize> = Vec::new();
        let mut rr_history: Vec<f64> = Vec::new();

        for &candidate in candidates {
            if let (Some(&last), Some(rr_avg)) = (beats.last(), mean_rr(&rr_history)) {
                if (candidate - last) as f64 > SEARCH_BACK_RR_FACTOR * rr_avg {
                    let missed = skipped
                        .iter()
                        .copied()
                        .filter(|&s| s > last)
                        .max_by(|&a, &b| integrated[a].total_cmp(&integrated[b]));
                    if let Some(missed) = missed.filter(|&m| integrated[m] > 0.5 * levels.threshold()) {
                        levels.signal_peak(integrated[missed], 0.25);
                        record_beat(&mut beats, &mut rr_history, missed);
                        skipped.clear();
                    }
                }
            }

            let value = integrated[candidate];
            if value > levels.threshold() {
                levels.signal_peak(value, detection::SIGNAL_PEAK_WEIGHT);
                record_beat(&mut beats, &mut rr_history, candidate);
                skipped.clear();
            } else {
                levels.noise_peak(value);
                skipped.push(candidate);
            }
        }

        beats
    }
}

fn mean_rr(history: &[f64]) -> Option<f64> {
    (!history.is_empty()).then(|| history.iter().sum::<f64>() / history.len() as f64)
}

fn record_beat(beats: &mut Vec<usize>, rr_history: &mut Vec<f64>, beat: usize) {
    if let Some(&last) = beats.last() {
        rr_history.push((beat - last) as f64);
        if rr_history.len() > RR_HISTORY {
            rr_history.remove(0);
        }
    }
    beats.push(beat);
}

impl BeatDetector for PanTompkinsDetector {
    fn detect(&self, samples: &[f64], sampling_rate_hz: f64) -> Vec<usize> {
        if dynamic_range(samples) == 0.0 {
            return Vec::new();
        }
        let Some(bandpassed) = self.bandpass(samples, sampling_rate_hz) else {
            debug!(len = samples.len(), "signal too short or rate too low for QRS bandpass");
            return Vec::new();
        };

        let integrated = self.integrate(&bandpassed, sampling_rate_hz);
        let refractory = (self.refractory_period_s * sampling_rate_hz).round() as usize;
        let candidates = pick_peaks(&integrated, 0.0, refractory);
        let detections = self.classify(&integrated, &candidates, sampling_rate_hz);

        let radius = (self.integration_window_s * sampling_rate_hz / 2.0).round() as usize;
        let mut beats: Vec<usize> = detections
            .into_iter()
            .map(|d| strongest_near(&bandpassed, d, radius))
            .collect();
        beats.sort_unstable();
        beats.dedup();

        debug!(candidates = candidates.len(), beats = beats.len(), "pan-tompkins detection");
        beats
    }

    fn name(&self) -> &str {
        "pan-tompkins"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gaussian_train(beats: &[usize], fs: f64, len: usize) -> Vec<f64> {
        let sigma = 0.012 * fs;
        (0..len)
            .map(|i| {
                beats
                    .iter()
                    .map(|&b| {
                        let t = (i as f64 - b as f64) / sigma;
                        (-0.5 * t * t).exp()
                    })
                    .sum()
            })
            .collect()
    }

    #[test]
    fn test_detects_regular_beats() {
        let fs = 250.0;
        let truth: Vec<usize> = (0..10).map(|k| 100 + k * 220).collect();
        let signal = gaussian_train(&truth, fs, 2500);

        let beats = PanTompkinsDetector::default().detect(&signal, fs);
        assert_eq!(beats.len(), truth.len());
        for (found, expected) in beats.iter().zip(&truth) {
            assert!(found.abs_diff(*expected) <= 3, "{} vs {}", found, expected);
        }
    }

    #[test]
    fn test_flat_signal_has_no_beats() {
        assert!(PanTompkinsDetector::default().detect(&[0.0; 2000], 200.0).is_empty());
        assert!(PanTompkinsDetector::default().detect(&[1.5; 2000], 200.0).is_empty());
    }

    #[test]
    fn test_short_signal_has_no_beats() {
        assert!(PanTompkinsDetector::default().detect(&[0.0, 1.0, 0.0], 200.0).is_empty());
    }

    #[test]
    fn test_beats_sorted_and_in_range() {
        let fs = 500.0;
        let truth: Vec<usize> = (0..8).map(|k| 250 + k * 600).collect();
        let signal = gaussian_train(&truth, fs, 5000);

        let beats = PanTompkinsDetector::default().detect(&signal, fs);
        assert!(beats.windows(2).all(|w| w[0] < w[1]));
        assert!(beats.iter().all(|&b| b < signal.len()));
    }
}
