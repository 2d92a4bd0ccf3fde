//! Advisory checks that can run ahead of scoring.
//!
//! Nothing here rejects a document. Scoring stays total over whatever the
//! loaders produce; these findings only tell the user where the numbers may
//! be misleading (duplicate ids resolve first-match-wins, ratings outside the
//! nominal scale are used as given).

use std::collections::HashSet;
use std::fmt;
use std::ops::RangeInclusive;

use serde::Serialize;

use crate::model::{ControlCatalog, RiskAssessment};

/// Nominal scale for impact and likelihood.
pub const RATING_SCALE: RangeInclusive<i64> = 1..=5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    DuplicateRiskId { id: String },
    DuplicateControlId { id: String },
    DuplicateCatalogId { id: String },
    ImpactOutOfRange { risk_id: String, value: i64 },
    LikelihoodOutOfRange { risk_id: String, value: i64 },
    NegativeEffectiveness { control_id: String, value: i64 },
    NegativeDefaultEffectiveness { control_id: String, value: i64 },
    UnknownControl { control_id: String },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (lo, hi) = (RATING_SCALE.start(), RATING_SCALE.end());
        match self {
            Finding::DuplicateRiskId { id } => write!(f, "risk id '{id}' appears more than once"),
            Finding::DuplicateControlId { id } => {
                write!(f, "applied control '{id}' appears more than once")
            }
            Finding::DuplicateCatalogId { id } => {
                write!(f, "catalog id '{id}' appears more than once; the first entry is used")
            }
            Finding::ImpactOutOfRange { risk_id, value } => {
                write!(f, "risk '{risk_id}' impact {value} is outside {lo}-{hi}")
            }
            Finding::LikelihoodOutOfRange { risk_id, value } => {
                write!(f, "risk '{risk_id}' likelihood {value} is outside {lo}-{hi}")
            }
            Finding::NegativeEffectiveness { control_id, value } => {
                write!(f, "applied control '{control_id}' has negative effectiveness {value}")
            }
            Finding::NegativeDefaultEffectiveness { control_id, value } => write!(
                f,
                "catalog control '{control_id}' has negative default effectiveness {value}"
            ),
            Finding::UnknownControl { control_id } => write!(
                f,
                "applied control '{control_id}' is not in the catalog and will not reduce risk"
            ),
        }
    }
}

/// Check an assessment, and its control references when a catalog is given.
pub fn validate_assessment(
    assessment: &RiskAssessment,
    catalog: Option<&ControlCatalog>,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    for id in duplicates(assessment.risks.iter().map(|r| r.id.as_str())) {
        findings.push(Finding::DuplicateRiskId { id });
    }

    for risk in &assessment.risks {
        if !RATING_SCALE.contains(&risk.impact) {
            findings.push(Finding::ImpactOutOfRange {
                risk_id: risk.id.clone(),
                value: risk.impact,
            });
        }
        if !RATING_SCALE.contains(&risk.likelihood) {
            findings.push(Finding::LikelihoodOutOfRange {
                risk_id: risk.id.clone(),
                value: risk.likelihood,
            });
        }
    }

    for id in duplicates(assessment.controls.iter().map(|c| c.id.as_str())) {
        findings.push(Finding::DuplicateControlId { id });
    }

    for control in &assessment.controls {
        if control.effectiveness < 0 {
            findings.push(Finding::NegativeEffectiveness {
                control_id: control.id.clone(),
                value: control.effectiveness,
            });
        }
    }

    if let Some(catalog) = catalog {
        for control in &assessment.controls {
            if catalog.find(&control.id).is_none() {
                findings.push(Finding::UnknownControl {
                    control_id: control.id.clone(),
                });
            }
        }
        findings.extend(validate_catalog(catalog));
    }

    findings
}

pub fn validate_catalog(catalog: &ControlCatalog) -> Vec<Finding> {
    let mut findings: Vec<Finding> = duplicates(catalog.controls.iter().map(|c| c.id.as_str()))
        .into_iter()
        .map(|id| Finding::DuplicateCatalogId { id })
        .collect();

    for item in &catalog.controls {
        if item.default_effectiveness < 0 {
            findings.push(Finding::NegativeDefaultEffectiveness {
                control_id: item.id.clone(),
                value: item.default_effectiveness,
            });
        }
    }

    findings
}

/// Ids seen more than once, each reported once, in order of first repeat.
fn duplicates<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut repeated = Vec::new();
    for id in ids {
        if !seen.insert(id) && reported.insert(id) {
            repeated.push(id.to_string());
        }
    }
    repeated
}
