// src/signal/resample.rs
//! Sample-rate conversion collaborator

use super::types::MultiLeadRecording;
use crate::error::SqaResult;
use crate::utils::validation::validate_sampling_rate;
use tracing::debug;

/// Converts a sample sequence between rates while keeping its duration
pub trait Resampler: Send + Sync {
    fn resample(&self, samples: &[f64], from_hz: f64, to_hz: f64) -> Vec<f64>;

    fn name(&self) -> &str;
}

/// Linear interpolation on evenly spaced grids over `[0, 1)`
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearResampler;

impl Resampler for LinearResampler {
    fn resample(&self, samples: &[f64], from_hz: f64, to_hz: f64) -> Vec<f64> {
        if samples.is_empty() || from_hz == to_hz {
            return samples.to_vec();
        }

        let target_len = (samples.len() as f64 * to_hz / from_hz).round() as usize;
        let source_len = samples.len() as f64;

        (0..target_len)
            .map(|i| {
                // Position on the source grid, where source sample k sits at k.
                let position = i as f64 / target_len as f64 * source_len;
                let lower = position.floor() as usize;
                if lower + 1 >= samples.len() {
                    return samples[samples.len() - 1];
                }
                let frac = position - lower as f64;
                samples[lower] * (1.0 - frac) + samples[lower + 1] * frac
            })
            .collect()
    }

    fn name(&self) -> &str {
        "linear"
    }
}

/// Resample every channel of a recording (time axis included)
pub fn resample_recording(
    recording: &MultiLeadRecording,
    to_hz: f64,
    resampler: &dyn Resampler,
) -> SqaResult<MultiLeadRecording> {
    validate_sampling_rate(to_hz)?;
    let from_hz = recording.sampling_rate_hz();
    if from_hz == to_hz {
        return Ok(recording.clone());
    }

    debug!(from_hz, to_hz, resampler = resampler.name(), "resampling recording");
    Ok(recording.map_channels(to_hz, |channel| resampler.resample(channel, from_hz, to_hz)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_rate_is_identity() {
        let samples = vec![1.0, 2.0, 3.0];
        assert_eq!(LinearResampler.resample(&samples, 500.0, 500.0), samples);
    }

    #[test]
    fn test_duration_preserved() {
        let samples: Vec<f64> = (0..2500).map(|i| i as f64).collect();
        let up = LinearResampler.resample(&samples, 250.0, 500.0);
        assert_eq!(up.len(), 5000);

        let down = LinearResampler.resample(&samples, 250.0, 200.0);
        assert_eq!(down.len(), 2000);
    }

    #[test]
    fn test_linear_interpolation_of_ramp() {
        let samples: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let up = LinearResampler.resample(&samples, 100.0, 200.0);

        assert_eq!(up.len(), 20);
        assert!((up[1] - 0.5).abs() < 1e-12);
        assert!((up[10] - 5.0).abs() < 1e-12);
        // Beyond the last source sample the value is held
        assert_eq!(up[19], 9.0);
    }

    #[test]
    fn test_resample_recording_updates_rate() {
        let recording = MultiLeadRecording::new(vec![vec![0.0; 250], vec![1.0; 250]], 250.0)
            .unwrap()
            .with_time_axis((0..250).map(|i| i as f64 / 250.0).collect())
            .unwrap();

        let resampled = resample_recording(&recording, 500.0, &LinearResampler).unwrap();
        assert_eq!(resampled.sampling_rate_hz(), 500.0);
        assert_eq!(resampled.samples_per_lead(), 500);
        assert_eq!(resampled.time_axis().map(<[f64]>::len), Some(500));
        assert!(resampled.lead(2).unwrap().iter().all(|&v| v == 1.0));
    }
}
