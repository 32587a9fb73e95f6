// src/signal/types.rs
//! Core signal types

use crate::error::{SqaError, SqaResult};
use crate::utils::validation::{validate_sampling_rate, validate_samples};

/// One lead of evenly sampled, real-valued ECG
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    samples: Vec<f64>,
    sampling_rate_hz: f64,
}

impl Signal {
    /// Create a signal, rejecting non-finite samples and rates
    pub fn new(samples: Vec<f64>, sampling_rate_hz: f64) -> SqaResult<Self> {
        validate_sampling_rate(sampling_rate_hz)?;
        validate_samples(&samples, "signal")?;
        Ok(Self {
            samples,
            sampling_rate_hz,
        })
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn sampling_rate_hz(&self) -> f64 {
        self.sampling_rate_hz
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration_s(&self) -> f64 {
        self.samples.len() as f64 / self.sampling_rate_hz
    }

    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }
}

/// Multi-lead recording sharing one sampling rate
///
/// Leads are addressed 1..=N. Index 0 is reserved for the optional time axis
/// the recording was captured with.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiLeadRecording {
    time_axis: Option<Vec<f64>>,
    leads: Vec<Vec<f64>>,
    sampling_rate_hz: f64,
}

impl MultiLeadRecording {
    /// Build a recording; every lead must hold the same number of samples
    pub fn new(leads: Vec<Vec<f64>>, sampling_rate_hz: f64) -> SqaResult<Self> {
        validate_sampling_rate(sampling_rate_hz)?;
        if let Some(first) = leads.first() {
            for (i, lead) in leads.iter().enumerate() {
                if lead.len() != first.len() {
                    return Err(SqaError::InvalidData {
                        data_type: "recording".to_string(),
                        reason: format!(
                            "lead {} has {} samples, lead 1 has {}",
                            i + 1,
                            lead.len(),
                            first.len()
                        ),
                    });
                }
                validate_samples(lead, "lead")?;
            }
        }

        Ok(Self {
            time_axis: None,
            leads,
            sampling_rate_hz,
        })
    }

    /// Attach the time axis stored in slot 0
    pub fn with_time_axis(mut self, time_axis: Vec<f64>) -> SqaResult<Self> {
        if let Some(first) = self.leads.first() {
            if first.len() != time_axis.len() {
                return Err(SqaError::invalid_data(
                    "time axis",
                    format!("{} samples, leads have {}", time_axis.len(), first.len()),
                ));
            }
        }
        self.time_axis = Some(time_axis);
        Ok(self)
    }

    pub fn time_axis(&self) -> Option<&[f64]> {
        self.time_axis.as_deref()
    }

    /// Lead by 1-based index
    pub fn lead(&self, index: usize) -> Option<&[f64]> {
        index
            .checked_sub(1)
            .and_then(|i| self.leads.get(i))
            .map(Vec::as_slice)
    }

    /// Leads 1..=N in order
    pub fn leads(&self) -> &[Vec<f64>] {
        &self.leads
    }

    pub fn lead_count(&self) -> usize {
        self.leads.len()
    }

    pub fn samples_per_lead(&self) -> usize {
        self.leads.first().map_or(0, Vec::len)
    }

    pub fn sampling_rate_hz(&self) -> f64 {
        self.sampling_rate_hz
    }

    /// Apply `f` to every lead and the time axis, producing a new recording
    pub(crate) fn map_channels(
        &self,
        sampling_rate_hz: f64,
        mut f: impl FnMut(&[f64]) -> Vec<f64>,
    ) -> Self {
        Self {
            time_axis: self.time_axis.as_deref().map(&mut f),
            leads: self.leads.iter().map(|lead| f(lead)).collect(),
            sampling_rate_hz,
        }
    }
}

/// RR intervals in seconds between consecutive beats
///
/// Empty for fewer than two beats.
pub fn rr_intervals(beats: &[usize], sampling_rate_hz: f64) -> Vec<f64> {
    beats
        .windows(2)
        .map(|pair| (pair[1] as f64 - pair[0] as f64) / sampling_rate_hz)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_rejects_bad_input() {
        assert!(Signal::new(vec![0.0; 10], 0.0).is_err());
        assert!(Signal::new(vec![0.0, f64::NAN], 200.0).is_err());

        let signal = Signal::new(vec![0.0; 400], 200.0).unwrap();
        assert_eq!(signal.duration_s(), 2.0);
    }

    #[test]
    fn test_lead_indexing_is_one_based() {
        let recording =
            MultiLeadRecording::new(vec![vec![1.0, 1.0], vec![2.0, 2.0]], 500.0).unwrap();

        assert!(recording.lead(0).is_none());
        assert_eq!(recording.lead(1), Some(&[1.0, 1.0][..]));
        assert_eq!(recording.lead(2), Some(&[2.0, 2.0][..]));
        assert!(recording.lead(3).is_none());
    }

    #[test]
    fn test_mismatched_lead_lengths_rejected() {
        let result = MultiLeadRecording::new(vec![vec![0.0; 10], vec![0.0; 9]], 500.0);
        assert!(matches!(result, Err(SqaError::InvalidData { .. })));
    }

    #[test]
    fn test_time_axis_length_checked() {
        let recording = MultiLeadRecording::new(vec![vec![0.0; 4]], 500.0).unwrap();
        assert!(recording.clone().with_time_axis(vec![0.0; 3]).is_err());

        let with_axis = recording.with_time_axis(vec![0.0, 0.002, 0.004, 0.006]).unwrap();
        assert_eq!(with_axis.time_axis().map(<[f64]>::len), Some(4));
    }

    #[test]
    fn test_rr_intervals() {
        assert!(rr_intervals(&[], 200.0).is_empty());
        assert!(rr_intervals(&[10], 200.0).is_empty());
        assert_eq!(rr_intervals(&[0, 160, 340], 200.0), vec![0.8, 0.9]);
    }
}
