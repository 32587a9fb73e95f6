// src/detection/mod.rs
//! Heartbeat (R-peak) detection
//!
//! Both pipelines depend only on [`BeatDetector`]; concrete detectors are
//! chosen through [`DetectorKind`] in configuration.

pub mod matched_filter;
pub mod pan_tompkins;

pub use matched_filter::MatchedFilterDetector;
pub use pan_tompkins::PanTompkinsDetector;

use serde::{Deserialize, Serialize};

/// Locates heartbeats in a single-lead signal
///
/// Returned indices are sorted, unique and within `0..samples.len()`. A signal
/// with no detectable beats yields an empty vector, never an error.
pub trait BeatDetector: Send + Sync {
    fn detect(&self, samples: &[f64], sampling_rate_hz: f64) -> Vec<usize>;

    fn name(&self) -> &str;
}

/// Configurable detector selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    #[default]
    PanTompkins,
    MatchedFilter,
}

impl DetectorKind {
    pub fn build(self) -> Box<dyn BeatDetector> {
        match self {
            DetectorKind::PanTompkins => Box::new(PanTompkinsDetector::default()),
            DetectorKind::MatchedFilter => Box::new(MatchedFilterDetector::default()),
        }
    }
}

/// Replays a fixed beat list, e.g. reference annotations
#[derive(Debug, Clone, Default)]
pub struct AnnotatedBeats {
    beats: Vec<usize>,
}

impl AnnotatedBeats {
    pub fn new(mut beats: Vec<usize>) -> Self {
        beats.sort_unstable();
        beats.dedup();
        Self { beats }
    }
}

impl BeatDetector for AnnotatedBeats {
    fn detect(&self, samples: &[f64], _sampling_rate_hz: f64) -> Vec<usize> {
        self.beats
            .iter()
            .copied()
            .take_while(|&b| b < samples.len())
            .collect()
    }

    fn name(&self) -> &str {
        "annotated"
    }
}

/// Local maxima strictly above `threshold`, at least `min_distance` apart
///
/// Where two maxima are closer than `min_distance` the taller survives.
pub fn pick_peaks(values: &[f64], threshold: f64, min_distance: usize) -> Vec<usize> {
    if values.len() < 3 {
        return Vec::new();
    }

    let candidates: Vec<usize> = (1..values.len() - 1)
        .filter(|&i| values[i] > threshold && values[i] > values[i - 1] && values[i] >= values[i + 1])
        .collect();

    if min_distance <= 1 {
        return candidates;
    }

    let mut by_height: Vec<usize> = (0..candidates.len()).collect();
    by_height.sort_by(|&a, &b| values[candidates[b]].total_cmp(&values[candidates[a]]));

    let mut suppressed = vec![false; candidates.len()];
    for &rank in &by_height {
        if suppressed[rank] {
            continue;
        }
        let centre = candidates[rank];
        let mut left = rank;
        while left > 0 && centre - candidates[left - 1] < min_distance {
            left -= 1;
            suppressed[left] = true;
        }
        let mut right = rank + 1;
        while right < candidates.len() && candidates[right] - centre < min_distance {
            suppressed[right] = true;
            right += 1;
        }
    }

    candidates
        .into_iter()
        .zip(suppressed)
        .filter_map(|(idx, gone)| (!gone).then_some(idx))
        .collect()
}

/// Index of the largest `|value|` within `[centre - radius, centre + radius]`
pub(crate) fn strongest_near(values: &[f64], centre: usize, radius: usize) -> usize {
    let start = centre.saturating_sub(radius);
    let end = (centre + radius).min(values.len().saturating_sub(1));
    (start..=end)
        .fold((start, f64::NEG_INFINITY), |(best, best_val), i| {
            let v = values[i].abs();
            if v > best_val {
                (i, v)
            } else {
                (best, best_val)
            }
        })
        .0
}
