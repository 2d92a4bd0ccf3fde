use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which document shape a load was targeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    RiskAssessment,
    ControlCatalog,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::RiskAssessment => f.write_str("risk assessment"),
            DocumentKind::ControlCatalog => f.write_str("control catalog"),
        }
    }
}

/// Failure to turn a file into an assessment or catalog.
///
/// Both variants keep the originating path so callers can report it without
/// extra bookkeeping. Nothing is partially loaded when either is returned.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {kind} file {}", .path.display())]
    Io {
        kind: DocumentKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {kind} from {}", .path.display())]
    Parse {
        kind: DocumentKind,
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl LoadError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            LoadError::Io { path, .. } | LoadError::Parse { path, .. } => path,
        }
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            LoadError::Io { kind, .. } | LoadError::Parse { kind, .. } => *kind,
        }
    }
}

pub type Result<T, E = LoadError> = std::result::Result<T, E>;
