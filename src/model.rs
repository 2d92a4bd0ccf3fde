use serde::{Deserialize, Deserializer, Serialize};

/// One assessment exercise: the risks identified and the controls applied against them.
///
/// Missing fields take their zero value and unknown fields are ignored, so a
/// document with only `risks` is still a valid assessment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RiskAssessment {
    pub name: String,
    pub description: String,
    /// Listed in report order; ordering has no effect on scoring.
    #[serde(deserialize_with = "null_as_default")]
    pub risks: Vec<RiskItem>,
    /// Controls applied in this assessment, referring to catalog entries by id.
    #[serde(
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub controls: Vec<ControlItem>,
}

/// A single identified risk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RiskItem {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Severity, nominally 1-5 with higher being worse.
    pub impact: i64,
    /// Probability, nominally 1-5 with higher being more likely.
    pub likelihood: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub affected_assets: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub threats: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub vulnerabilities: Vec<String>,
}

impl RiskItem {
    /// Impact times likelihood. Out-of-range ratings are used as given and
    /// overflow wraps.
    pub fn score(&self) -> i64 {
        self.impact.wrapping_mul(self.likelihood)
    }
}

/// A control as applied within one assessment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ControlItem {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Assessment-specific override. Zero means "use the catalog default".
    #[serde(skip_serializing_if = "is_zero")]
    pub effectiveness: i64,
}

/// Reference library of controls, loaded independently of any assessment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ControlCatalog {
    #[serde(deserialize_with = "null_as_default")]
    pub controls: Vec<ControlCatalogItem>,
}

impl ControlCatalog {
    /// First entry whose id matches. Later duplicates are never returned.
    pub fn find(&self, id: &str) -> Option<&ControlCatalogItem> {
        self.controls.iter().find(|item| item.id == id)
    }
}

/// Canonical definition of a control.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ControlCatalogItem {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Free-text classification such as "Access Control".
    pub category: String,
    pub default_effectiveness: i64,
    /// Provenance, e.g. "NIST SP 800-53" or "ISO 27002".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// An explicit null (`risks: ~`, or a key whose entries are all commented
/// out) reads the same as an omitted field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_item(id: &str, default_effectiveness: i64) -> ControlCatalogItem {
        ControlCatalogItem {
            id: id.to_string(),
            default_effectiveness,
            ..Default::default()
        }
    }

    #[test]
    fn risk_score_is_impact_times_likelihood() {
        let risk = RiskItem {
            impact: 4,
            likelihood: 3,
            ..Default::default()
        };
        assert_eq!(risk.score(), 12);
    }

    #[test]
    fn negative_ratings_propagate_into_score() {
        let risk = RiskItem {
            impact: -2,
            likelihood: 3,
            ..Default::default()
        };
        assert_eq!(risk.score(), -6);
    }

    #[test]
    fn extreme_ratings_wrap_instead_of_panicking() {
        let risk = RiskItem {
            impact: i64::MAX,
            likelihood: 2,
            ..Default::default()
        };
        assert_eq!(risk.score(), -2);
    }

    #[test]
    fn catalog_find_returns_first_match() {
        let catalog = ControlCatalog {
            controls: vec![
                catalog_item("C1", 4),
                catalog_item("C2", 7),
                catalog_item("C1", 9),
            ],
        };
        assert_eq!(catalog.find("C1").map(|c| c.default_effectiveness), Some(4));
        assert_eq!(catalog.find("C2").map(|c| c.default_effectiveness), Some(7));
        assert!(catalog.find("C3").is_none());
    }
}
