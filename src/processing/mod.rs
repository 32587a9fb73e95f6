// src/processing/mod.rs
//! Signal processing primitives for ECG quality assessment

pub mod filters;
pub mod spectrum;
pub mod windowing;

pub use filters::{
    butterworth, estimate_order, template_bandpass, Biquad, FilterBand, FilterSpec, IirFilter,
    OrderEstimate, SosFilter,
};
pub use spectrum::PowerSpectrum;
pub use windowing::{beat_windows, strided_windows};
