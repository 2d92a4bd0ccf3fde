//! Cybersecurity Risk Assessment Library
//!
//! Loads a risk register and a control catalog from YAML, then computes the
//! initial risk score and the residual score left after applied controls.
//!
//! ```
//! use cra_risk::{ControlCatalog, RiskAssessment, initial_risk_score, residual_risk_score};
//!
//! let assessment: RiskAssessment = "
//! risks:
//!   - { id: R1, impact: 3, likelihood: 2 }
//!   - { id: R2, impact: 5, likelihood: 4 }
//! controls:
//!   - { id: C1 }
//! ".parse().unwrap();
//! let catalog: ControlCatalog = "controls: [{ id: C1, default_effectiveness: 10 }]".parse().unwrap();
//!
//! assert_eq!(initial_risk_score(&assessment), 26);
//! assert_eq!(residual_risk_score(&assessment, &catalog), 13);
//! ```

pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod model;
pub mod report;
pub mod scoring;
pub mod validate;

pub use error::{DocumentKind, LoadError};
pub use loader::{load_control_catalog, load_risk_assessment};
pub use model::{ControlCatalog, ControlCatalogItem, ControlItem, RiskAssessment, RiskItem};
pub use report::{OutputFormat, Report};
pub use scoring::{ResidualBreakdown, initial_risk_score, residual_breakdown, residual_risk_score};
pub use validate::{Finding, validate_assessment, validate_catalog};
