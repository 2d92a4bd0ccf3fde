use std::path::Path;
use std::str::FromStr;

use serde::de::DeserializeOwned;

use crate::error::{DocumentKind, LoadError, Result};
use crate::model::{ControlCatalog, RiskAssessment};

/// Load a risk assessment definition file.
pub fn load_risk_assessment<P: AsRef<Path>>(path: P) -> Result<RiskAssessment> {
    let assessment: RiskAssessment = load_document(path.as_ref(), DocumentKind::RiskAssessment)?;
    crate::log_debug!(
        "Loaded assessment '{}' with {} risks and {} controls",
        assessment.name,
        assessment.risks.len(),
        assessment.controls.len()
    );
    Ok(assessment)
}

/// Load a control catalog file. Never touches any assessment.
pub fn load_control_catalog<P: AsRef<Path>>(path: P) -> Result<ControlCatalog> {
    let catalog: ControlCatalog = load_document(path.as_ref(), DocumentKind::ControlCatalog)?;
    crate::log_debug!("Loaded control catalog with {} entries", catalog.controls.len());
    Ok(catalog)
}

fn load_document<T: DeserializeOwned>(path: &Path, kind: DocumentKind) -> Result<T> {
    crate::log_debug!("Reading {} from {}", kind, path.display());
    let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        kind,
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&contents).map_err(|source| LoadError::Parse {
        kind,
        path: path.to_path_buf(),
        source,
    })
}

impl FromStr for RiskAssessment {
    type Err = serde_yaml::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        serde_yaml::from_str(s)
    }
}

impl FromStr for ControlCatalog {
    type Err = serde_yaml::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        serde_yaml::from_str(s)
    }
}
