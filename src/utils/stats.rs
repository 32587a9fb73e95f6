// src/utils/stats.rs
//! Numeric helpers: extrema, median, normalisation and correlation
//!
//! All functions are total over their input. Empty slices and zero-variance
//! data yield `None` (or a documented fallback) instead of NaN.

/// Minimum and maximum of a slice
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}

/// Max minus min; zero for a flat or empty slice
pub fn dynamic_range(values: &[f64]) -> f64 {
    min_max(values).map_or(0.0, |(lo, hi)| hi - lo)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median, averaging the two middle values for even lengths
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Index of the first maximum
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Scale to `[0, 1]`; `None` when the slice is empty or flat
pub fn normalize_min_max(values: &[f64]) -> Option<Vec<f64>> {
    let (lo, hi) = min_max(values)?;
    let range = hi - lo;
    if range == 0.0 {
        return None;
    }
    Some(values.iter().map(|&v| (v - lo) / range).collect())
}

/// Pearson correlation coefficient
///
/// `None` when lengths differ, fewer than two samples are given, or either
/// side has zero variance.
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    let mean_a = mean(a)?;
    let mean_b = mean(b)?;

    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (&x, &y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }
    Some((cov / (var_a * var_b).sqrt()).clamp(-1.0, 1.0))
}
