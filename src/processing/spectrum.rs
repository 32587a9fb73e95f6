// src/processing/spectrum.rs
//! One-sided power spectrum estimation

use crate::error::{SqaError, SqaResult};
use rustfft::{num_complex::Complex64, FftPlanner};

/// Periodogram of a mean-removed signal, scaled so bins sum to its variance
#[derive(Debug, Clone, PartialEq)]
pub struct PowerSpectrum {
    power: Vec<f64>,
    sample_count: usize,
    sampling_rate_hz: f64,
}

impl PowerSpectrum {
    /// Rectangular-window periodogram
    pub fn periodogram(samples: &[f64], sampling_rate_hz: f64) -> SqaResult<Self> {
        if samples.is_empty() {
            return Err(SqaError::invalid_data("spectrum input", "no samples"));
        }

        let n = samples.len();
        let mean = samples.iter().sum::<f64>() / n as f64;
        let mut buffer: Vec<Complex64> = samples
            .iter()
            .map(|&x| Complex64::new(x - mean, 0.0))
            .collect();

        let mut planner = FftPlanner::<f64>::new();
        planner.plan_fft_forward(n).process(&mut buffer);

        let scale = 1.0 / (n as f64 * n as f64);
        let bins = n / 2 + 1;
        let power = buffer
            .iter()
            .take(bins)
            .enumerate()
            .map(|(k, c)| {
                let p = c.norm_sqr() * scale;
                // Fold negative frequencies; DC and an even-length Nyquist bin have no mirror
                let unmirrored = k == 0 || (n % 2 == 0 && k == n / 2);
                if unmirrored {
                    p
                } else {
                    2.0 * p
                }
            })
            .collect();

        Ok(Self {
            power,
            sample_count: n,
            sampling_rate_hz,
        })
    }

    pub fn power(&self) -> &[f64] {
        &self.power
    }

    /// Spacing between bins
    pub fn resolution_hz(&self) -> f64 {
        self.sampling_rate_hz / self.sample_count as f64
    }

    /// Nearest bin to `freq_hz`, clamped to the spectrum
    pub fn bin_for(&self, freq_hz: f64) -> usize {
        let bin = (freq_hz / self.resolution_hz()).round().max(0.0) as usize;
        bin.min(self.power.len())
    }

    pub fn frequencies(&self) -> impl Iterator<Item = f64> + '_ {
        let resolution = self.resolution_hz();
        (0..self.power.len()).map(move |k| k as f64 * resolution)
    }

    pub fn total_power(&self) -> f64 {
        self.power.iter().sum()
    }

    /// Power in bins `[bin_for(low_hz), bin_for(high_hz))`
    pub fn band_power(&self, low_hz: f64, high_hz: f64) -> f64 {
        let low = self.bin_for(low_hz);
        let high = self.bin_for(high_hz);
        if low >= high {
            return 0.0;
        }
        self.power[low..high].iter().sum()
    }

    /// Power in every bin outside [`PowerSpectrum::band_power`]'s range
    pub fn out_of_band_power(&self, low_hz: f64, high_hz: f64) -> f64 {
        let low = self.bin_for(low_hz);
        let high = self.bin_for(high_hz).max(low);
        self.power[..low].iter().chain(&self.power[high..]).sum()
    }
}
