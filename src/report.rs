//! Report rendering for scored assessments.

use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

use crate::model::{ControlCatalog, RiskAssessment};
use crate::scoring::{self, EffectivenessSource, ResidualBreakdown};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskRow {
    pub id: String,
    pub name: String,
    pub impact: i64,
    pub likelihood: i64,
    pub score: i64,
}

/// Everything a presentation layer needs from one scoring run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub name: String,
    pub description: String,
    pub risks: Vec<RiskRow>,
    pub initial_score: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residual: Option<ResidualBreakdown>,
}

impl Report {
    /// Score the assessment. The residual section is only filled in when a catalog is given.
    pub fn new(assessment: &RiskAssessment, catalog: Option<&ControlCatalog>) -> Self {
        let risks = assessment
            .risks
            .iter()
            .map(|risk| RiskRow {
                id: risk.id.clone(),
                name: risk.name.clone(),
                impact: risk.impact,
                likelihood: risk.likelihood,
                score: risk.score(),
            })
            .collect();

        Self {
            name: assessment.name.clone(),
            description: assessment.description.clone(),
            risks,
            initial_score: scoring::initial_risk_score(assessment),
            residual: catalog.map(|catalog| scoring::residual_breakdown(assessment, catalog)),
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Text => self.render_text().context("failed to render report as text"),
            OutputFormat::Json => {
                serde_json::to_string_pretty(self).context("failed to render report as JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(self).context("failed to render report as YAML")
            }
        }
    }

    fn render_text(&self) -> Result<String, fmt::Error> {
        let mut out = String::new();
        writeln!(out, "Assessment: {}", self.name)?;
        if !self.description.is_empty() {
            writeln!(out, "{}", self.description)?;
        }
        for row in &self.risks {
            writeln!(
                out,
                "  {:<12} {:>3} x {:<3} = {:>4}  {}",
                row.id, row.impact, row.likelihood, row.score, row.name
            )?;
        }
        writeln!(out, "Initial Risk Score: {}", self.initial_score)?;

        if let Some(residual) = &self.residual {
            for control in &residual.applied {
                let origin = match control.source {
                    EffectivenessSource::Assessment => "assessment",
                    EffectivenessSource::CatalogDefault => "catalog default",
                };
                writeln!(
                    out,
                    "  control {:<12} effectiveness {:>3} ({origin})",
                    control.id, control.effectiveness
                )?;
            }
            if !residual.unmatched.is_empty() {
                writeln!(
                    out,
                    "  not in catalog: {}",
                    residual.unmatched.join(", ")
                )?;
            }
            writeln!(
                out,
                "Total Effectiveness: {} (reduction {:.0}%)",
                residual.total_effectiveness,
                residual.reduction * 100.0
            )?;
            writeln!(out, "Residual Risk Score: {}", residual.residual)?;
        }
        Ok(out)
    }
}

/// Write the rendered report to `<dir>/<stem>.<ext>` and return that path.
pub fn write_report(report: &Report, format: OutputFormat, dir: &Path, stem: &str) -> Result<PathBuf> {
    let path = dir.join(format!("{stem}.{}", format.extension()));
    let rendered = report.render(format)?;
    std::fs::write(&path, rendered)
        .with_context(|| format!("failed to write report '{}'", path.display()))?;
    crate::log_info!("Report written to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ControlCatalogItem, ControlItem, RiskItem};

    fn sample() -> (RiskAssessment, ControlCatalog) {
        let assessment = RiskAssessment {
            name: "Gateway".to_string(),
            description: "Edge gateway firmware".to_string(),
            risks: vec![
                RiskItem {
                    id: "R1".to_string(),
                    name: "Default credentials".to_string(),
                    impact: 3,
                    likelihood: 2,
                    ..Default::default()
                },
                RiskItem {
                    id: "R2".to_string(),
                    name: "Unsigned updates".to_string(),
                    impact: 5,
                    likelihood: 4,
                    ..Default::default()
                },
            ],
            controls: vec![
                ControlItem {
                    id: "C1".to_string(),
                    ..Default::default()
                },
                ControlItem {
                    id: "C404".to_string(),
                    effectiveness: 3,
                    ..Default::default()
                },
            ],
        };
        let catalog = ControlCatalog {
            controls: vec![ControlCatalogItem {
                id: "C1".to_string(),
                default_effectiveness: 10,
                ..Default::default()
            }],
        };
        (assessment, catalog)
    }

    #[test]
    fn text_report_without_catalog_has_only_initial_score() {
        let (assessment, _) = sample();
        let text = Report::new(&assessment, None).render(OutputFormat::Text).unwrap();
        assert!(text.contains("Initial Risk Score: 26"), "{text}");
        assert!(!text.contains("Residual Risk Score"), "{text}");
    }

    #[test]
    fn text_report_with_catalog_lists_controls_and_residual() {
        let (assessment, catalog) = sample();
        let text = Report::new(&assessment, Some(&catalog))
            .render(OutputFormat::Text)
            .unwrap();
        assert!(text.contains("(catalog default)"), "{text}");
        assert!(text.contains("not in catalog: C404"), "{text}");
        assert!(text.contains("reduction 50%"), "{text}");
        assert!(text.contains("Residual Risk Score: 13"), "{text}");
    }

    #[test]
    fn json_report_carries_breakdown() {
        let (assessment, catalog) = sample();
        let json = Report::new(&assessment, Some(&catalog))
            .render(OutputFormat::Json)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["initial_score"], 26);
        assert_eq!(value["risks"][1]["score"], 20);
        assert_eq!(value["residual"]["residual"], 13);
        assert_eq!(value["residual"]["applied"][0]["source"], "catalog_default");
        assert_eq!(value["residual"]["unmatched"][0], "C404");
    }

    #[test]
    fn write_report_uses_format_extension() {
        let (assessment, _) = sample();
        let dir = tempfile::tempdir().unwrap();
        let report = Report::new(&assessment, None);

        let path = write_report(&report, OutputFormat::Yaml, dir.path(), "gateway").unwrap();
        assert_eq!(path, dir.path().join("gateway.yaml"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("initial_score: 26"), "{written}");
        assert!(!written.contains("residual"), "{written}");
    }
}
