// src/quality/matrix.rs
//! Per-lead check results and their composite

use crate::error::{SqaError, SqaResult};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rule-based check, one matrix row each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityCheck {
    Stationarity,
    HeartRate,
    Snr,
}

impl QualityCheck {
    pub const ALL: [QualityCheck; 3] = [
        QualityCheck::Stationarity,
        QualityCheck::HeartRate,
        QualityCheck::Snr,
    ];

    fn row(self) -> usize {
        match self {
            QualityCheck::Stationarity => 0,
            QualityCheck::HeartRate => 1,
            QualityCheck::Snr => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QualityCheck::Stationarity => "stationarity",
            QualityCheck::HeartRate => "heart rate",
            QualityCheck::Snr => "snr",
        }
    }
}

const PASS_GLYPH: char = '✔';
const FAIL_GLYPH: char = '✖';

/// Boolean failure table, rows = checks, columns = leads 1..=N
///
/// `true` marks a failed check. The composite row is the logical OR of the
/// three check rows for each lead.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityMatrix {
    failures: Array2<bool>,
    composite: Array1<bool>,
}

impl QualityMatrix {
    /// Combine the three per-lead failure rows
    pub fn from_rows(stationarity: Vec<bool>, heart_rate: Vec<bool>, snr: Vec<bool>) -> SqaResult<Self> {
        let leads = stationarity.len();
        if heart_rate.len() != leads || snr.len() != leads {
            return Err(SqaError::invalid_data(
                "quality rows",
                format!(
                    "row lengths differ: {}, {}, {}",
                    leads,
                    heart_rate.len(),
                    snr.len()
                ),
            ));
        }

        let data: Vec<bool> = stationarity.into_iter().chain(heart_rate).chain(snr).collect();
        let failures = Array2::from_shape_vec((QualityCheck::ALL.len(), leads), data)
            .map_err(|e| SqaError::invalid_data("quality rows", e.to_string()))?;
        let composite = failures.map_axis(Axis(0), |column| column.iter().any(|&failed| failed));

        Ok(Self { failures, composite })
    }

    pub fn lead_count(&self) -> usize {
        self.failures.ncols()
    }

    /// Raw failure table (3 x N)
    pub fn failures(&self) -> &Array2<bool> {
        &self.failures
    }

    pub fn row(&self, check: QualityCheck) -> ArrayView1<'_, bool> {
        self.failures.row(check.row())
    }

    pub fn composite(&self) -> ArrayView1<'_, bool> {
        self.composite.view()
    }

    /// Whether `check` failed for 1-based `lead`
    pub fn failed(&self, check: QualityCheck, lead: usize) -> Option<bool> {
        let col = lead.checked_sub(1).filter(|&c| c < self.lead_count())?;
        Some(self.failures[[check.row(), col]])
    }

    /// Composite verdict for 1-based `lead`; `true` when every check passed
    pub fn lead_passes(&self, lead: usize) -> Option<bool> {
        let col = lead.checked_sub(1)?;
        self.composite.get(col).map(|&failed| !failed)
    }

    /// 1-based indices of leads with at least one failed check
    pub fn failing_leads(&self) -> Vec<usize> {
        self.composite
            .iter()
            .enumerate()
            .filter_map(|(i, &failed)| failed.then_some(i + 1))
            .collect()
    }

    pub fn all_pass(&self) -> bool {
        !self.composite.iter().any(|&failed| failed)
    }

    /// One summary per lead, in lead order
    pub fn lead_reports(&self) -> Vec<LeadReport> {
        self.failures
            .columns()
            .into_iter()
            .zip(self.composite.iter())
            .enumerate()
            .map(|(i, (column, &failed))| LeadReport {
                lead: i + 1,
                stationarity_failed: column[QualityCheck::Stationarity.row()],
                heart_rate_failed: column[QualityCheck::HeartRate.row()],
                snr_failed: column[QualityCheck::Snr.row()],
                passes: !failed,
            })
            .collect()
    }

    /// Per-lead summaries as a JSON array
    pub fn to_json(&self) -> SqaResult<String> {
        serde_json::to_string_pretty(&self.lead_reports())
            .map_err(|e| SqaError::invalid_data("quality report", e.to_string()))
    }
}

/// Serializable view of one matrix column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadReport {
    /// 1-based lead index
    pub lead: usize,
    pub stationarity_failed: bool,
    pub heart_rate_failed: bool,
    pub snr_failed: bool,
    pub passes: bool,
}

fn glyph(failed: bool) -> char {
    if failed {
        FAIL_GLYPH
    } else {
        PASS_GLYPH
    }
}

impl fmt::Display for QualityMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<13}", "")?;
        for lead in 1..=self.lead_count() {
            write!(f, " {:>3}", format!("L{}", lead))?;
        }
        writeln!(f)?;

        for check in QualityCheck::ALL {
            write!(f, "{:<13}", check.label())?;
            for &failed in self.row(check) {
                write!(f, " {:>3}", glyph(failed))?;
            }
            writeln!(f)?;
        }

        write!(f, "{:<13}", "overall")?;
        for &failed in self.composite.iter() {
            write!(f, " {:>3}", glyph(failed))?;
        }
        Ok(())
    }
}
