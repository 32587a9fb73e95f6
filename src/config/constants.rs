// src/config/constants.rs
//! Assessment-wide configuration constants

/// Rule-based (multi-lead) pipeline constants
pub mod rule_based {
    pub const DEFAULT_SAMPLING_RATE_HZ: f64 = 500.0;
    pub const MAX_PASSBAND_LOSS_DB: f64 = 0.1;
    pub const MIN_STOPBAND_ATTENUATION_DB: f64 = 20.0;

    /// High-frequency noise lowpass edges
    pub const NOISE_PASSBAND_EDGE_HZ: f64 = 20.0;
    pub const NOISE_STOPBAND_EDGE_HZ: f64 = 30.0;

    /// Baseline-wander lowpass edges
    pub const BASELINE_PASSBAND_EDGE_HZ: f64 = 0.5;
    pub const BASELINE_STOPBAND_EDGE_HZ: f64 = 8.0;

    pub const SIGNAL_BAND_HZ: (f64, f64) = (2.0, 40.0);
    pub const HEART_RATE_LIMITS_BPM: (f64, f64) = (24.0, 300.0);
    pub const SNR_THRESHOLD: f64 = 0.5;
    pub const ANALYSIS_DURATION_S: f64 = 10.0;

    pub const STATIONARITY_WINDOW_SAMPLES: usize = 100;
    pub const STATIONARITY_STRIDE_SAMPLES: usize = 10;
}

/// Template-correlation (single-lead) pipeline constants
pub mod template {
    pub const DEFAULT_SAMPLING_RATE_HZ: f64 = 200.0;

    pub const BANDPASS_ORDER: usize = 3;
    pub const BANDPASS_LOW_HZ: f64 = 1.0;
    pub const BANDPASS_HIGH_HZ: f64 = 15.0;
    pub const BANDPASS_PAD_SAMPLES: usize = 150;

    /// Half-width of the R-peak search window around each detection
    pub const PEAK_REFINEMENT_TOLERANCE_S: f64 = 0.15;

    /// Feasibility gate, distinct from the rule-based heart-rate limits
    pub const FEASIBLE_HEART_RATE_BPM: (f64, f64) = (40.0, 180.0);
    pub const MAX_RR_INTERVAL_S: f64 = 3.0;
    pub const MAX_RR_RATIO: f64 = 2.2;

    pub const CORRELATION_THRESHOLD: f64 = 0.66;
}

/// Beat detector constants
pub mod detection {
    pub const QRS_BAND_HZ: (f64, f64) = (5.0, 15.0);
    pub const QRS_BAND_ORDER: usize = 1;
    pub const INTEGRATION_WINDOW_S: f64 = 0.15;
    pub const REFRACTORY_PERIOD_S: f64 = 0.2;
    pub const LEARNING_PERIOD_S: f64 = 2.0;
    pub const SIGNAL_PEAK_WEIGHT: f64 = 0.125;
    pub const THRESHOLD_FRACTION: f64 = 0.25;
}

/// Filter synthesis limits
pub mod filters {
    pub const MIN_FILTER_ORDER: usize = 1;
    pub const MAX_FILTER_ORDER: usize = 32;
    /// Imaginary parts below this are treated as real roots
    pub const ROOT_REAL_TOLERANCE: f64 = 1e-10;
}

/// Configuration file locations and environment override prefix
pub mod paths {
    pub const SYSTEM_CONFIG_PATH: &str = "/etc/ecg-quality/config.toml";
    pub const USER_CONFIG_DIR: &str = ".config/ecg-quality";
    pub const DEFAULT_CONFIG_FILE: &str = "config/default.toml";
    pub const LOCAL_CONFIG_FILE: &str = "ecg-quality.toml";
    pub const ENV_PREFIX: &str = "ECGQ__";
    pub const ENV_SEPARATOR: &str = "__";
}
