// src/signal/mod.rs
//! Signal data model and sample-rate conversion

pub mod resample;
pub mod types;

pub use resample::{resample_recording, LinearResampler, Resampler};
pub use types::{rr_intervals, MultiLeadRecording, Signal};
