// src/processing/windowing.rs
//! Signal segmentation helpers

/// Fixed-length windows advancing by `stride`; a trailing partial window is dropped
pub fn strided_windows(
    samples: &[f64],
    window: usize,
    stride: usize,
) -> impl Iterator<Item = &[f64]> + '_ {
    let count = if window == 0 || stride == 0 || samples.len() < window {
        0
    } else {
        (samples.len() - window) / stride + 1
    };
    (0..count).map(move |i| &samples[i * stride..i * stride + window])
}

/// Beat-centred windows of `2 * half_width + 1` samples
///
/// Walks every beat but the last. A beat is skipped when its window would
/// start before sample 0 or end after the final beat.
pub fn beat_windows<'a>(
    samples: &'a [f64],
    beats: &[usize],
    half_width: usize,
) -> Vec<&'a [f64]> {
    let Some((&last_beat, leading)) = beats.split_last() else {
        return Vec::new();
    };

    leading
        .iter()
        .filter(|&&beat| beat >= half_width && beat + half_width <= last_beat)
        .filter_map(|&beat| samples.get(beat - half_width..=beat + half_width))
        .collect()
}
