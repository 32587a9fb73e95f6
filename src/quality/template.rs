// src/quality/template.rs
//! Single-lead template-correlation assessment
//!
//! The pipeline is a small state machine:
//! Filtering -> Detecting -> CheckingFeasibility -> BuildingTemplate -> Scoring -> Done.
//! Every stage may jump straight to `Done` with a failing outcome.

use super::feasibility::{check_feasibility, FeasibilityLimits, Infeasibility};
use crate::config::TemplateConfig;
use crate::detection::BeatDetector;
use crate::error::{ProcessingStage, SqaError, SqaResult};
use crate::processing::{beat_windows, template_bandpass, SosFilter};
use crate::signal::Signal;
use crate::utils::stats::{argmax, dynamic_range, median, normalize_min_max, pearson_correlation};
use crate::utils::validation::validate_samples;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Final result of a template assessment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TemplateOutcome {
    Acceptable { correlation: f64 },
    PoorCorrelation { correlation: f64 },
    Infeasible(Infeasibility),
    InsufficientBeats { detected: usize, usable: usize },
    DegenerateSignal,
}

impl TemplateOutcome {
    pub fn is_acceptable(&self) -> bool {
        matches!(self, TemplateOutcome::Acceptable { .. })
    }

    /// Average correlation, when scoring was reached
    pub fn correlation(&self) -> Option<f64> {
        match self {
            TemplateOutcome::Acceptable { correlation }
            | TemplateOutcome::PoorCorrelation { correlation } => Some(*correlation),
            _ => None,
        }
    }
}

/// Averaged beat waveform
#[derive(Debug, Clone, PartialEq)]
pub struct BeatTemplate {
    pub waveform: Vec<f64>,
    /// Samples either side of the beat centre
    pub half_width: usize,
    pub beats_used: usize,
}

/// Snap every beat to the largest sample within `tolerance` of it
///
/// Beats outside the signal are dropped; coincident results are merged.
pub fn refine_beats(samples: &[f64], beats: &[usize], tolerance: usize) -> Vec<usize> {
    let Some(last_index) = samples.len().checked_sub(1) else {
        return Vec::new();
    };

    let mut refined: Vec<usize> = beats
        .iter()
        .filter(|&&beat| beat <= last_index)
        .filter_map(|&beat| {
            let start = beat.saturating_sub(tolerance);
            let end = (beat + tolerance).min(last_index);
            argmax(&samples[start..=end]).map(|offset| start + offset)
        })
        .collect();
    refined.sort_unstable();
    refined.dedup();
    refined
}

/// Half the median RR interval, in samples
pub fn template_half_width(beats: &[usize]) -> Option<usize> {
    let rr: Vec<f64> = beats
        .windows(2)
        .map(|pair| pair[1].saturating_sub(pair[0]) as f64)
        .collect();
    median(&rr).map(|m| (m / 2.0).floor() as usize)
}

/// Average of the usable beat windows of the unfiltered signal
pub fn build_template(samples: &[f64], beats: &[usize]) -> SqaResult<BeatTemplate> {
    let insufficient = |usable| SqaError::InsufficientBeats {
        stage: ProcessingStage::BuildingTemplate,
        detected: beats.len(),
        usable,
    };
    let half_width = template_half_width(beats).ok_or_else(|| insufficient(0))?;

    let windows = beat_windows(samples, beats, half_width);
    if windows.is_empty() {
        return Err(insufficient(0));
    }

    let mut waveform = vec![0.0; 2 * half_width + 1];
    for window in &windows {
        for (acc, &s) in waveform.iter_mut().zip(window.iter()) {
            *acc += s;
        }
    }
    let count = windows.len() as f64;
    waveform.iter_mut().for_each(|v| *v /= count);

    Ok(BeatTemplate {
        waveform,
        half_width,
        beats_used: windows.len(),
    })
}

/// Mean Pearson correlation of each usable beat window with the template
///
/// A window with zero variance contributes 0.
pub fn template_correlation(samples: &[f64], beats: &[usize], template: &BeatTemplate) -> SqaResult<f64> {
    let windows = beat_windows(samples, beats, template.half_width);
    if windows.is_empty() {
        return Err(SqaError::InsufficientBeats {
            stage: ProcessingStage::Scoring,
            detected: beats.len(),
            usable: 0,
        });
    }

    let total: f64 = windows
        .iter()
        .map(|w| pearson_correlation(w, &template.waveform).unwrap_or(0.0))
        .sum();
    Ok(total / windows.len() as f64)
}

enum Step {
    Filtering,
    Detecting { normalized: Vec<f64> },
    CheckingFeasibility { beats: Vec<usize> },
    BuildingTemplate { beats: Vec<usize> },
    Scoring { beats: Vec<usize>, template: BeatTemplate },
    Done(TemplateOutcome),
}

impl Step {
    fn stage(&self) -> Option<ProcessingStage> {
        match self {
            Step::Filtering => Some(ProcessingStage::Filtering),
            Step::Detecting { .. } => Some(ProcessingStage::Detecting),
            Step::CheckingFeasibility { .. } => Some(ProcessingStage::CheckingFeasibility),
            Step::BuildingTemplate { .. } => Some(ProcessingStage::BuildingTemplate),
            Step::Scoring { .. } => Some(ProcessingStage::Scoring),
            Step::Done(_) => None,
        }
    }
}

/// Template-correlation assessor with its bandpass designed once
pub struct TemplateAssessor {
    config: TemplateConfig,
    bandpass: SosFilter,
    detector: Box<dyn BeatDetector>,
}

impl TemplateAssessor {
    pub fn new(config: TemplateConfig) -> SqaResult<Self> {
        config
            .validate()
            .map_err(|errors| SqaError::configuration("template", errors.join("; ")))?;
        let bandpass = template_bandpass(&config)?;

        Ok(Self {
            detector: config.detector.build(),
            config,
            bandpass,
        })
    }

    pub fn with_detector(mut self, detector: Box<dyn BeatDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }

    /// Assess a signal sampled at the configured rate
    pub fn assess_signal(&self, signal: &Signal) -> SqaResult<TemplateOutcome> {
        if signal.sampling_rate_hz() != self.config.sampling_rate_hz {
            return Err(SqaError::invalid_data(
                "signal",
                format!(
                    "sampled at {} Hz, assessor configured for {} Hz",
                    signal.sampling_rate_hz(),
                    self.config.sampling_rate_hz
                ),
            ));
        }
        self.assess(signal.samples())
    }

    /// Assess many signals in parallel, preserving input order
    pub fn assess_many(&self, signals: &[Signal]) -> Vec<SqaResult<TemplateOutcome>> {
        signals.par_iter().map(|s| self.assess_signal(s)).collect()
    }

    /// Run the pipeline on raw samples
    ///
    /// Errors are reserved for malformed input; every quality failure is an
    /// outcome.
    #[instrument(skip(self, samples), fields(len = samples.len(), detector = self.detector.name()))]
    pub fn assess(&self, samples: &[f64]) -> SqaResult<TemplateOutcome> {
        let mut step = Step::Filtering;
        loop {
            let stage = step.stage();
            step = match step {
                Step::Filtering => self.filter_and_normalize(samples)?,
                Step::Detecting { normalized } => self.detect(&normalized),
                Step::CheckingFeasibility { beats } => {
                    let limits = FeasibilityLimits::from(&self.config);
                    match check_feasibility(&beats, self.config.sampling_rate_hz, &limits) {
                        Ok(()) => Step::BuildingTemplate { beats },
                        Err(Infeasibility::TooFewBeats { count }) => {
                            Step::Done(TemplateOutcome::InsufficientBeats { detected: count, usable: 0 })
                        }
                        Err(reason) => {
                            info!(%reason, "beats failed feasibility");
                            Step::Done(TemplateOutcome::Infeasible(reason))
                        }
                    }
                }
                Step::BuildingTemplate { beats } => match build_template(samples, &beats) {
                    Ok(template) => Step::Scoring { beats, template },
                    Err(err) => Step::Done(Self::outcome_from_error(err)?),
                },
                Step::Scoring { beats, template } => {
                    match template_correlation(samples, &beats, &template) {
                        Ok(correlation) => Step::Done(self.verdict(correlation)),
                        Err(err) => Step::Done(Self::outcome_from_error(err)?),
                    }
                }
                Step::Done(outcome) => {
                    debug!(?outcome, "template assessment finished");
                    return Ok(outcome);
                }
            };
            if let (Some(stage), Step::Done(outcome)) = (stage, &step) {
                debug!(%stage, ?outcome, "pipeline stopped");
            }
        }
    }

    fn filter_and_normalize(&self, samples: &[f64]) -> SqaResult<Step> {
        validate_samples(samples, "signal")?;
        if dynamic_range(samples) == 0.0 {
            return Ok(Step::Done(TemplateOutcome::DegenerateSignal));
        }
        let filtered = self
            .bandpass
            .filtfilt_padded(samples, self.config.bandpass_pad_samples)?;
        Ok(match normalize_min_max(&filtered) {
            Some(normalized) => Step::Detecting { normalized },
            None => Step::Done(TemplateOutcome::DegenerateSignal),
        })
    }

    fn detect(&self, normalized: &[f64]) -> Step {
        let fs = self.config.sampling_rate_hz;
        let detected = self.detector.detect(normalized, fs);
        let tolerance = (fs * self.config.peak_refinement_tolerance_s).floor() as usize;
        let beats = refine_beats(normalized, &detected, tolerance);
        debug!(detected = detected.len(), refined = beats.len(), "beats detected");
        Step::CheckingFeasibility { beats }
    }

    fn verdict(&self, correlation: f64) -> TemplateOutcome {
        if correlation >= self.config.correlation_threshold {
            TemplateOutcome::Acceptable { correlation }
        } else {
            TemplateOutcome::PoorCorrelation { correlation }
        }
    }

    fn outcome_from_error(err: SqaError) -> SqaResult<TemplateOutcome> {
        match err {
            SqaError::InsufficientBeats { detected, usable, .. } => {
                Ok(TemplateOutcome::InsufficientBeats { detected, usable })
            }
            SqaError::DegenerateSignal { .. } => Ok(TemplateOutcome::DegenerateSignal),
            other => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::AnnotatedBeats;

    #[test]
    fn test_boundary_beats_excluded_from_template() {
        let samples: Vec<f64> = (0..200).map(|i| (i as f64 * 0.3).sin()).collect();
        let beats = [5, 50, 95, 140];

        let template = build_template(&samples, &beats).unwrap();
        assert_eq!(template.half_width, 22);
        assert_eq!(template.beats_used, 2);
        assert_eq!(template.waveform.len(), 45);
        let expected = (samples[50 - 22] + samples[95 - 22]) / 2.0;
        assert!((template.waveform[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_no_usable_beats() {
        let samples = vec![0.0; 100];
        match build_template(&samples, &[5, 30]) {
            Err(SqaError::InsufficientBeats { detected: 2, usable: 0, .. }) => {}
            other => panic!("Expected insufficient beats, got {:?}", other),
        }
        assert!(build_template(&samples, &[10]).is_err());
    }

    #[test]
    fn test_identical_beats_correlate_perfectly() {
        let period = 40;
        let samples: Vec<f64> = (0..400)
            .map(|i| {
                let phase = (i % period) as f64 - 20.0;
                (-phase * phase / 8.0).exp()
            })
            .collect();
        let beats: Vec<usize> = (0..10).map(|k| 20 + k * period).collect();

        let template = build_template(&samples, &beats).unwrap();
        let cc = template_correlation(&samples, &beats, &template).unwrap();
        assert!((cc - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_windows_score_zero() {
        let samples = vec![1.0; 100];
        let beats = [10, 30, 50, 70];
        let template = build_template(&samples, &beats).unwrap();
        assert_eq!(template_correlation(&samples, &beats, &template).unwrap(), 0.0);
    }

    #[test]
    fn test_refine_snaps_to_local_maximum() {
        let mut samples = vec![0.0; 50];
        samples[12] = 1.0;
        samples[40] = 2.0;
        samples[49] = 0.5;

        assert_eq!(refine_beats(&samples, &[10, 38, 48], 3), vec![12, 40, 49]);
        // Both beats snap to the same peak and are merged
        assert_eq!(refine_beats(&samples, &[10, 14], 3), vec![12]);
        // Window clipped at the start keeps absolute indexing
        assert_eq!(refine_beats(&samples, &[1], 20), vec![12]);
        assert_eq!(refine_beats(&samples, &[60], 3), Vec::<usize>::new());
    }

    #[test]
    fn test_flat_signal_is_degenerate() {
        let assessor = TemplateAssessor::new(TemplateConfig::default()).unwrap();
        assert_eq!(assessor.assess(&[0.5; 2000]).unwrap(), TemplateOutcome::DegenerateSignal);
    }

    #[test]
    fn test_short_signal_is_error() {
        let assessor = TemplateAssessor::new(TemplateConfig::default()).unwrap();
        let samples: Vec<f64> = (0..150).map(|i| i as f64).collect();
        assert!(matches!(
            assessor.assess(&samples),
            Err(SqaError::SignalTooShort { required: 151, actual: 150 })
        ));
    }

    #[test]
    fn test_too_few_detections() {
        let assessor = TemplateAssessor::new(TemplateConfig::default())
            .unwrap()
            .with_detector(Box::new(AnnotatedBeats::new(vec![300])));
        let samples: Vec<f64> = (0..2000).map(|i| (i as f64 * 0.05).sin()).collect();

        assert_eq!(
            assessor.assess(&samples).unwrap(),
            TemplateOutcome::InsufficientBeats { detected: 1, usable: 0 }
        );
    }

    #[test]
    fn test_rate_mismatch_rejected() {
        let assessor = TemplateAssessor::new(TemplateConfig::default()).unwrap();
        let signal = Signal::new(vec![0.0; 1000], 250.0).unwrap();
        assert!(assessor.assess_signal(&signal).is_err());
    }

    #[test]
    fn test_outcome_accessors() {
        assert!(TemplateOutcome::Acceptable { correlation: 0.9 }.is_acceptable());
        assert_eq!(TemplateOutcome::PoorCorrelation { correlation: 0.1 }.correlation(), Some(0.1));
        assert_eq!(TemplateOutcome::DegenerateSignal.correlation(), None);
    }
}
