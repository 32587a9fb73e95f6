// tests/common/mod.rs
//! Synthetic ECG fixtures shared by the integration tests

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

/// One Gaussian component of a beat: amplitude, centre offset and width (s)
struct Wave {
    amplitude: f64,
    offset_s: f64,
    width_s: f64,
}

const PQRST: [Wave; 5] = [
    Wave { amplitude: 0.12, offset_s: -0.20, width_s: 0.025 },
    Wave { amplitude: -0.10, offset_s: -0.03, width_s: 0.008 },
    Wave { amplitude: 1.00, offset_s: 0.00, width_s: 0.012 },
    Wave { amplitude: -0.20, offset_s: 0.03, width_s: 0.008 },
    Wave { amplitude: 0.30, offset_s: 0.25, width_s: 0.045 },
];

/// Synthetic ECG with an R peak at every time in `beat_times_s`
///
/// A slow 0.3 Hz baseline wander keeps the trace from ever being exactly flat.
pub fn synthetic_ecg(beat_times_s: &[f64], sampling_rate_hz: f64, duration_s: f64) -> Vec<f64> {
    let n = (duration_s * sampling_rate_hz).round() as usize;
    (0..n)
        .map(|i| {
            let t = i as f64 / sampling_rate_hz;
            let wander = 0.05 * (2.0 * PI * 0.3 * t).sin();
            let beats: f64 = beat_times_s
                .iter()
                .flat_map(|&beat| {
                    PQRST.iter().map(move |w| {
                        let x = (t - beat - w.offset_s) / w.width_s;
                        w.amplitude * (-0.5 * x * x).exp()
                    })
                })
                .sum();
            beats + wander
        })
        .collect()
}

/// Evenly spaced beat times starting at `first_s`
pub fn regular_beat_times(bpm: f64, first_s: f64, duration_s: f64) -> Vec<f64> {
    let rr = 60.0 / bpm;
    (0..)
        .map(|k| first_s + k as f64 * rr)
        .take_while(|&t| t < duration_s - 0.5)
        .collect()
}

/// Clean sinus rhythm at `bpm`
pub fn clean_ecg(bpm: f64, sampling_rate_hz: f64, duration_s: f64) -> Vec<f64> {
    synthetic_ecg(&regular_beat_times(bpm, 0.5, duration_s), sampling_rate_hz, duration_s)
}

/// Uniform white noise in `[-amplitude, amplitude)`, reproducible per seed
pub fn white_noise(len: usize, amplitude: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(-amplitude..amplitude)).collect()
}

pub fn sine(freq_hz: f64, amplitude: f64, sampling_rate_hz: f64, len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| amplitude * (2.0 * PI * freq_hz * i as f64 / sampling_rate_hz).sin())
        .collect()
}

/// Sample index of each beat time
pub fn beat_indices(beat_times_s: &[f64], sampling_rate_hz: f64) -> Vec<usize> {
    beat_times_s
        .iter()
        .map(|t| (t * sampling_rate_hz).round() as usize)
        .collect()
}
