// src/processing/filters/iir.rs
//! IIR filters as cascaded second-order sections

use crate::error::{SqaError, SqaResult};
use rustfft::num_complex::Complex64;
use std::f64::consts::PI;

/// One second-order section, `a[0]` normalised to 1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b: [f64; 3],
    pub a: [f64; 3],
}

impl Biquad {
    pub fn new(b: [f64; 3], a: [f64; 3]) -> Self {
        let a0 = a[0];
        Self {
            b: [b[0] / a0, b[1] / a0, b[2] / a0],
            a: [1.0, a[1] / a0, a[2] / a0],
        }
    }

    pub(crate) fn scale_numerator(&mut self, gain: f64) {
        self.b.iter_mut().for_each(|c| *c *= gain);
    }

    /// Transposed Direct Form II step
    #[inline]
    fn step(&self, input: f64, state: &mut [f64; 2]) -> f64 {
        let output = self.b[0] * input + state[0];
        state[0] = self.b[1] * input - self.a[1] * output + state[1];
        state[1] = self.b[2] * input - self.a[2] * output;
        output
    }

    fn dc_gain(&self) -> f64 {
        self.b.iter().sum::<f64>() / self.a.iter().sum::<f64>()
    }

    /// Delay-line contents after an infinitely long unit step
    fn unit_step_state(&self) -> [f64; 2] {
        let gain = self.dc_gain();
        [gain - self.b[0], self.b[2] - self.a[2] * gain]
    }

    fn response(&self, z_inv: Complex64) -> Complex64 {
        let z_inv2 = z_inv * z_inv;
        (self.b[0] + z_inv * self.b[1] + z_inv2 * self.b[2])
            / (self.a[0] + z_inv * self.a[1] + z_inv2 * self.a[2])
    }
}

/// Cascade of second-order sections
#[derive(Debug, Clone, PartialEq)]
pub struct SosFilter {
    sections: Vec<Biquad>,
    order: usize,
}

impl SosFilter {
    pub fn new(sections: Vec<Biquad>, order: usize) -> Self {
        Self { sections, order }
    }

    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    /// Order of the prototype the cascade was designed from
    pub fn order(&self) -> usize {
        self.order
    }

    /// Edge padding used by [`SosFilter::filtfilt`] when none is given
    pub fn default_pad_len(&self) -> usize {
        let trailing_b = self.sections.iter().filter(|s| s.b[2] == 0.0).count();
        let trailing_a = self.sections.iter().filter(|s| s.a[2] == 0.0).count();
        3 * (2 * self.sections.len() + 1 - trailing_b.min(trailing_a))
    }

    /// Causal filtering from rest
    pub fn filter(&self, input: &[f64]) -> Vec<f64> {
        let mut filter = IirFilter::new(self.clone());
        input.iter().map(|&x| filter.process_sample(x)).collect()
    }

    /// Per-section state that makes a constant unit input pass unchanged
    pub fn steady_state(&self) -> Vec<[f64; 2]> {
        let mut scale = 1.0;
        self.sections
            .iter()
            .map(|section| {
                let state = section.unit_step_state();
                let scaled = [state[0] * scale, state[1] * scale];
                scale *= section.dc_gain();
                scaled
            })
            .collect()
    }

    /// Zero-phase forward-backward filtering with odd-extension padding
    pub fn filtfilt(&self, input: &[f64]) -> SqaResult<Vec<f64>> {
        self.filtfilt_padded(input, self.default_pad_len())
    }

    /// [`SosFilter::filtfilt`] with an explicit padding length
    pub fn filtfilt_padded(&self, input: &[f64], pad_len: usize) -> SqaResult<Vec<f64>> {
        if input.len() <= pad_len {
            return Err(SqaError::SignalTooShort {
                required: pad_len + 1,
                actual: input.len(),
            });
        }

        let extended = odd_extension(input, pad_len);
        let zi = self.steady_state();

        let mut filter = IirFilter::with_state(self.clone(), scaled_state(&zi, extended[0]));
        let mut forward: Vec<f64> = extended.iter().map(|&x| filter.process_sample(x)).collect();

        let last = forward[forward.len() - 1];
        let mut filter = IirFilter::with_state(self.clone(), scaled_state(&zi, last));
        for value in forward.iter_mut().rev() {
            *value = filter.process_sample(*value);
        }

        Ok(forward[pad_len..pad_len + input.len()].to_vec())
    }

    /// Magnitude of the frequency response at `freq_hz`
    pub fn magnitude_response(&self, freq_hz: f64, sampling_rate_hz: f64) -> f64 {
        let omega = 2.0 * PI * freq_hz / sampling_rate_hz;
        let z_inv = Complex64::from_polar(1.0, -omega);
        self.sections
            .iter()
            .map(|s| s.response(z_inv))
            .product::<Complex64>()
            .norm()
    }

    /// All poles strictly inside the unit circle
    pub fn is_stable(&self) -> bool {
        self.sections.iter().all(|s| {
            let (a1, a2) = (s.a[1], s.a[2]);
            // Jury conditions for z^2 + a1 z + a2
            a2.abs() < 1.0 && a1.abs() < 1.0 + a2
        })
    }
}

fn scaled_state(zi: &[[f64; 2]], x0: f64) -> Vec<[f64; 2]> {
    zi.iter().map(|s| [s[0] * x0, s[1] * x0]).collect()
}

/// Reflect `pad_len` samples about each end point
fn odd_extension(input: &[f64], pad_len: usize) -> Vec<f64> {
    let n = input.len();
    let (first, last) = (input[0], input[n - 1]);

    let mut extended = Vec::with_capacity(n + 2 * pad_len);
    extended.extend((1..=pad_len).rev().map(|i| 2.0 * first - input[i]));
    extended.extend_from_slice(input);
    extended.extend((1..=pad_len).map(|i| 2.0 * last - input[n - 1 - i]));
    extended
}

/// Streaming IIR filter over a second-order-section cascade
pub struct IirFilter {
    sos: SosFilter,
    state: Vec<[f64; 2]>,
}

impl IirFilter {
    /// Create a filter at rest
    pub fn new(sos: SosFilter) -> Self {
        let state = vec![[0.0; 2]; sos.sections.len()];
        Self { sos, state }
    }

    /// Create a filter with preloaded delay lines
    pub fn with_state(sos: SosFilter, state: Vec<[f64; 2]>) -> Self {
        let mut filter = Self::new(sos);
        for (slot, initial) in filter.state.iter_mut().zip(state) {
            *slot = initial;
        }
        filter
    }

    /// Process single sample through every section
    pub fn process_sample(&mut self, input: f64) -> f64 {
        self.sos
            .sections
            .iter()
            .zip(self.state.iter_mut())
            .fold(input, |x, (section, state)| section.step(x, state))
    }

    /// Reset filter state
    pub fn reset(&mut self) {
        self.state.iter_mut().for_each(|s| *s = [0.0; 2]);
    }

    /// Get filter order
    pub fn order(&self) -> usize {
        self.sos.order
    }
}
