// src/processing/filters/design.rs
//! Butterworth order estimation and synthesis
//!
//! Filters are synthesised in zero/pole/gain form (analog prototype, band
//! transform, bilinear transform with pre-warping) and returned as cascaded
//! second-order sections.

use super::iir::{Biquad, SosFilter};
use super::{FilterBand, FilterSpec, OrderEstimate};
use crate::config::constants::filters::{MAX_FILTER_ORDER, MIN_FILTER_ORDER, ROOT_REAL_TOLERANCE};
use crate::error::{SqaError, SqaResult};
use rustfft::num_complex::Complex64;
use std::f64::consts::PI;

/// Sampling rate the digital design is carried out at; edges are
/// normalised to Nyquist so the value only fixes the pre-warp scale.
const DESIGN_FS: f64 = 2.0;

/// Zero/pole/gain representation
#[derive(Debug, Clone)]
struct Zpk {
    zeros: Vec<Complex64>,
    poles: Vec<Complex64>,
    gain: f64,
}

impl Zpk {
    fn relative_degree(&self) -> usize {
        self.poles.len() - self.zeros.len()
    }
}

/// Minimum Butterworth order and cutoff meeting a lowpass/highpass spec
pub fn estimate_order(spec: &FilterSpec) -> SqaResult<OrderEstimate> {
    spec.validate()?;

    let nyquist = spec.sampling_rate_hz / 2.0;
    let wp = spec.passband_edge_hz / nyquist;
    let ws = spec.stopband_edge_hz / nyquist;
    let lowpass = wp < ws;

    let passb = (PI * wp / 2.0).tan();
    let stopb = (PI * ws / 2.0).tan();
    let nat = if lowpass { stopb / passb } else { passb / stopb };

    let g_stop = 10f64.powf(0.1 * spec.min_stopband_attenuation_db);
    let g_pass = 10f64.powf(0.1 * spec.max_passband_loss_db);

    let raw_order = ((g_stop - 1.0) / (g_pass - 1.0)).log10() / (2.0 * nat.log10());
    let order = raw_order.ceil();
    if !order.is_finite() || order < MIN_FILTER_ORDER as f64 {
        return Err(SqaError::filter_spec(format!(
            "order estimate {} is not realisable",
            raw_order
        )));
    }
    let order = order as usize;
    if order > MAX_FILTER_ORDER {
        return Err(SqaError::filter_spec(format!(
            "transition band needs order {}, above the supported maximum of {}",
            order, MAX_FILTER_ORDER
        )));
    }

    let w0 = (g_pass - 1.0).powf(-1.0 / (2.0 * order as f64));
    let wn_analog = if lowpass { w0 * passb } else { passb / w0 };
    let cutoff_hz = (2.0 / PI) * wn_analog.atan() * nyquist;

    Ok(OrderEstimate {
        order,
        cutoff_hz,
        band: if lowpass {
            FilterBand::Lowpass { cutoff_hz }
        } else {
            FilterBand::Highpass { cutoff_hz }
        },
    })
}

/// Digital Butterworth filter of fixed order
pub fn butterworth(order: usize, band: FilterBand, sampling_rate_hz: f64) -> SqaResult<SosFilter> {
    if !(MIN_FILTER_ORDER..=MAX_FILTER_ORDER).contains(&order) {
        return Err(SqaError::filter_spec(format!(
            "order must be {}-{}, got {}",
            MIN_FILTER_ORDER, MAX_FILTER_ORDER, order
        )));
    }
    if !sampling_rate_hz.is_finite() || sampling_rate_hz <= 0.0 {
        return Err(SqaError::filter_spec(format!(
            "sampling rate must be positive, got {}",
            sampling_rate_hz
        )));
    }

    let nyquist = sampling_rate_hz / 2.0;
    let normalise = |hz: f64| -> SqaResult<f64> {
        let wn = hz / nyquist;
        if !(wn > 0.0 && wn < 1.0) {
            return Err(SqaError::filter_spec(format!(
                "edge {} Hz must lie strictly between 0 and Nyquist ({} Hz)",
                hz, nyquist
            )));
        }
        Ok(wn)
    };
    let prewarp = |wn: f64| 2.0 * DESIGN_FS * (PI * wn / DESIGN_FS).tan();

    let prototype = butterworth_prototype(order);
    let analog = match band {
        FilterBand::Lowpass { cutoff_hz } => lowpass_transform(prototype, prewarp(normalise(cutoff_hz)?)),
        FilterBand::Highpass { cutoff_hz } => highpass_transform(prototype, prewarp(normalise(cutoff_hz)?)),
        FilterBand::Bandpass { low_hz, high_hz } => {
            if low_hz >= high_hz {
                return Err(SqaError::filter_spec(format!(
                    "bandpass edges must be ordered, got {}-{} Hz",
                    low_hz, high_hz
                )));
            }
            let low = prewarp(normalise(low_hz)?);
            let high = prewarp(normalise(high_hz)?);
            bandpass_transform(prototype, (low * high).sqrt(), high - low)
        }
    };

    let digital = bilinear(analog, DESIGN_FS);
    Ok(zpk_to_sos(&digital, order))
}

/// Analog lowpass prototype with unit cutoff
fn butterworth_prototype(order: usize) -> Zpk {
    let n = order as f64;
    let poles = (0..order)
        .map(|i| {
            let m = -(n - 1.0) + 2.0 * i as f64;
            -Complex64::from_polar(1.0, PI * m / (2.0 * n))
        })
        .collect();

    Zpk {
        zeros: Vec::new(),
        poles,
        gain: 1.0,
    }
}

fn lowpass_transform(zpk: Zpk, wo: f64) -> Zpk {
    let degree = zpk.relative_degree();
    Zpk {
        zeros: zpk.zeros.iter().map(|z| z * wo).collect(),
        poles: zpk.poles.iter().map(|p| p * wo).collect(),
        gain: zpk.gain * wo.powi(degree as i32),
    }
}

fn highpass_transform(zpk: Zpk, wo: f64) -> Zpk {
    let degree = zpk.relative_degree();
    let num: Complex64 = zpk.zeros.iter().map(|z| -z).product();
    let den: Complex64 = zpk.poles.iter().map(|p| -p).product();

    let mut zeros: Vec<Complex64> = zpk.zeros.iter().map(|z| wo / z).collect();
    zeros.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(degree));

    Zpk {
        zeros,
        poles: zpk.poles.iter().map(|p| wo / p).collect(),
        gain: zpk.gain * (num / den).re,
    }
}

fn bandpass_transform(zpk: Zpk, wo: f64, bw: f64) -> Zpk {
    let degree = zpk.relative_degree();
    let split = |roots: &[Complex64]| -> Vec<Complex64> {
        let scaled: Vec<Complex64> = roots.iter().map(|r| r * (bw / 2.0)).collect();
        let offsets: Vec<Complex64> = scaled.iter().map(|r| (r * r - wo * wo).sqrt()).collect();
        scaled
            .iter()
            .zip(&offsets)
            .map(|(r, d)| r + d)
            .chain(scaled.iter().zip(&offsets).map(|(r, d)| r - d))
            .collect()
    };

    let mut zeros = split(&zpk.zeros);
    zeros.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(degree));

    Zpk {
        zeros,
        poles: split(&zpk.poles),
        gain: zpk.gain * bw.powi(degree as i32),
    }
}

fn bilinear(zpk: Zpk, fs: f64) -> Zpk {
    let degree = zpk.relative_degree();
    let fs2 = Complex64::new(2.0 * fs, 0.0);

    let num: Complex64 = zpk.zeros.iter().map(|z| fs2 - z).product();
    let den: Complex64 = zpk.poles.iter().map(|p| fs2 - p).product();

    let mut zeros: Vec<Complex64> = zpk.zeros.iter().map(|z| (fs2 + z) / (fs2 - z)).collect();
    zeros.extend(std::iter::repeat(Complex64::new(-1.0, 0.0)).take(degree));

    Zpk {
        zeros,
        poles: zpk.poles.iter().map(|p| (fs2 + p) / (fs2 - p)).collect(),
        gain: zpk.gain * (num / den).re,
    }
}

/// Group roots into real polynomial factors `[1, c1, c2]`
///
/// Each upper-half-plane root stands for its conjugate pair. Real roots are
/// paired outermost-first so a zero at -1 and a zero at +1 share a section.
fn quadratic_factors(roots: &[Complex64]) -> Vec<[f64; 3]> {
    let mut factors: Vec<[f64; 3]> = roots
        .iter()
        .filter(|r| r.im > ROOT_REAL_TOLERANCE)
        .map(|r| [1.0, -2.0 * r.re, r.norm_sqr()])
        .collect();

    let mut reals: Vec<f64> = roots
        .iter()
        .filter(|r| r.im.abs() <= ROOT_REAL_TOLERANCE)
        .map(|r| r.re)
        .collect();
    reals.sort_by(f64::total_cmp);

    let (mut lo, mut hi) = (0, reals.len());
    while hi - lo >= 2 {
        let (a, b) = (reals[lo], reals[hi - 1]);
        factors.push([1.0, -(a + b), a * b]);
        lo += 1;
        hi -= 1;
    }
    if hi - lo == 1 {
        factors.push([1.0, -reals[lo], 0.0]);
    }

    factors
}

fn zpk_to_sos(zpk: &Zpk, order: usize) -> SosFilter {
    let mut numerators = quadratic_factors(&zpk.zeros);
    let denominators = quadratic_factors(&zpk.poles);
    numerators.resize(denominators.len().max(numerators.len()), [1.0, 0.0, 0.0]);

    let mut sections: Vec<Biquad> = numerators
        .into_iter()
        .zip(denominators.iter().chain(std::iter::repeat(&[1.0, 0.0, 0.0])))
        .map(|(b, a)| Biquad::new(b, *a))
        .collect();

    if let Some(first) = sections.first_mut() {
        first.scale_numerator(zpk.gain);
    }

    SosFilter::new(sections, order)
}
