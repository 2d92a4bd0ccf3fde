//! Initial and residual risk scoring.
//!
//! Both scores are pure folds over an already-loaded assessment. They never
//! fail and never reject odd input: negative or out-of-range ratings flow
//! through the arithmetic as given.
//!
//! The residual model is linear and additive. Every effectiveness point of a
//! matched control removes [`REDUCTION_PER_POINT`] of the aggregate initial
//! score, capped at [`MAX_REDUCTION`]. Controls are not scoped to individual
//! risks.

use serde::Serialize;

use crate::model::{ControlCatalog, RiskAssessment};

/// Fraction of the initial score removed per effectiveness point.
pub const REDUCTION_PER_POINT: f64 = 0.05;

/// Reduction can never exceed 100%.
pub const MAX_REDUCTION: f64 = 1.0;

/// Sum of `impact * likelihood` over every risk. Zero for an empty register.
/// Overflow wraps rather than panicking.
pub fn initial_risk_score(assessment: &RiskAssessment) -> i64 {
    assessment
        .risks
        .iter()
        .fold(0i64, |total, risk| total.wrapping_add(risk.score()))
}

/// Initial score reduced by the effectiveness of the applied controls.
pub fn residual_risk_score(assessment: &RiskAssessment, catalog: &ControlCatalog) -> i64 {
    residual_breakdown(assessment, catalog).residual
}

/// Where a control's effective value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectivenessSource {
    /// Non-zero override on the applied control.
    Assessment,
    /// The catalog entry's `default_effectiveness`.
    CatalogDefault,
}

/// An applied control that matched a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlContribution {
    pub id: String,
    pub effectiveness: i64,
    pub source: EffectivenessSource,
}

/// Every intermediate value of the residual computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResidualBreakdown {
    pub initial: i64,
    pub total_effectiveness: i64,
    /// `total_effectiveness * REDUCTION_PER_POINT`, capped at `MAX_REDUCTION`.
    pub reduction: f64,
    pub residual: i64,
    pub applied: Vec<ControlContribution>,
    /// Applied control ids with no catalog entry. They contribute nothing.
    pub unmatched: Vec<String>,
}

pub fn residual_breakdown(assessment: &RiskAssessment, catalog: &ControlCatalog) -> ResidualBreakdown {
    let initial = initial_risk_score(assessment);

    let mut applied = Vec::new();
    let mut unmatched = Vec::new();
    for control in &assessment.controls {
        let Some(entry) = catalog.find(&control.id) else {
            crate::log_debug!("Control '{}' not in catalog, skipping", control.id);
            unmatched.push(control.id.clone());
            continue;
        };
        let (effectiveness, source) = if control.effectiveness != 0 {
            (control.effectiveness, EffectivenessSource::Assessment)
        } else {
            (entry.default_effectiveness, EffectivenessSource::CatalogDefault)
        };
        applied.push(ControlContribution {
            id: control.id.clone(),
            effectiveness,
            source,
        });
    }

    let total_effectiveness = applied
        .iter()
        .fold(0i64, |total, c| total.wrapping_add(c.effectiveness));
    let reduction = reduction_for(total_effectiveness);
    let residual = if initial == 0 {
        0
    } else {
        apply_reduction(initial, reduction)
    };

    ResidualBreakdown {
        initial,
        total_effectiveness,
        reduction,
        residual,
        applied,
        unmatched,
    }
}

fn reduction_for(total_effectiveness: i64) -> f64 {
    (total_effectiveness as f64 * REDUCTION_PER_POINT).min(MAX_REDUCTION)
}

fn apply_reduction(initial: i64, reduction: f64) -> i64 {
    let residual = (initial as f64 * (1.0 - reduction)).floor() as i64;
    residual.max(0)
}
