use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variables with this prefix override file values,
/// e.g. `CRA_RISK_REPORT_DIR=out`.
pub const ENV_PREFIX: &str = "CRA_RISK";

/// Looked up in the home directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = ".cra_risk.yaml";

/// Settings for the CLI and report output. The scoring core never reads these.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppConfig {
    /// Where saved reports are written
    pub report_dir: PathBuf,
    /// Directory for custom risk/control schemas
    pub schema_dir: PathBuf,
    /// Catalog used by `assess` when `--catalog` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_catalog: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        default_config()
    }
}

/// Load configuration, layering defaults, a config file and the environment.
///
/// An explicit path must exist. Without one, `~/.cra_risk.yaml` is used when
/// present and silently skipped otherwise.
pub fn load_app_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let file = match explicit {
        Some(path) => {
            crate::log_info!("Loading config from: {}", path.display());
            Some(path.to_path_buf())
        }
        None => {
            let found = default_config_path().filter(|path| path.is_file());
            match &found {
                Some(path) => crate::log_info!("Loaded default config from: {}", path.display()),
                None => crate::log_debug!("No config file found, using defaults"),
            }
            found
        }
    };
    build_config(file.as_deref())
}

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DEFAULT_CONFIG_FILE))
}

fn build_config(file: Option<&Path>) -> Result<AppConfig> {
    use ::config::{Config, Environment, File};

    let defaults = default_config();
    let mut builder = Config::builder()
        .set_default("report_dir", defaults.report_dir.to_string_lossy().as_ref())?
        .set_default("schema_dir", defaults.schema_dir.to_string_lossy().as_ref())?;

    if let Some(path) = file {
        let name = path.to_string_lossy();
        builder = builder.add_source(File::new(name.as_ref(), file_format(path)).required(true));
    }

    let settings = builder
        .add_source(Environment::with_prefix(ENV_PREFIX))
        .build()
        .with_context(|| match file {
            Some(path) => format!("failed to read config file '{}'", path.display()),
            None => "failed to build configuration".to_string(),
        })?;

    settings
        .try_deserialize()
        .context("failed to unmarshal config")
}

fn file_format(path: &Path) -> ::config::FileFormat {
    if is_toml(path) {
        ::config::FileFormat::Toml
    } else {
        ::config::FileFormat::Yaml
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

/// Create the report directory if it does not exist yet.
pub fn ensure_report_dir(config: &AppConfig) -> Result<&Path> {
    let dir = config.report_dir.as_path();
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create report directory '{}'", dir.display()))?;
        crate::log_debug!("Created report directory {}", dir.display());
    }
    Ok(dir)
}

/// Save configuration to a file, as TOML for `.toml` paths and YAML otherwise
pub fn save_config<P: AsRef<Path>>(config: &AppConfig, path: P) -> Result<()> {
    let path = path.as_ref();
    let contents = if is_toml(path) {
        toml::to_string_pretty(config)?
    } else {
        serde_yaml::to_string(config)?
    };
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write config file '{}'", path.display()))?;
    Ok(())
}

/// Create a default configuration template
pub fn default_config() -> AppConfig {
    AppConfig {
        report_dir: PathBuf::from("reports"),
        schema_dir: PathBuf::from("static/schemas"),
        default_catalog: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_apply_without_file() {
        let config = build_config(None).unwrap();
        assert_eq!(config.schema_dir, PathBuf::from("static/schemas"));
        assert_eq!(config.default_catalog, None);
    }

    #[test]
    fn yaml_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::write(
            &path,
            "report_dir: out/reports\ndefault_catalog: static/controls/default_controls.yaml\n",
        )
        .unwrap();

        let config = load_app_config(Some(&path)).unwrap();
        assert_eq!(config.report_dir, PathBuf::from("out/reports"));
        assert_eq!(config.schema_dir, PathBuf::from("static/schemas"));
        assert_eq!(
            config.default_catalog,
            Some(PathBuf::from("static/controls/default_controls.yaml"))
        );
    }

    #[test]
    fn saved_toml_config_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cra_risk.toml");
        let config = AppConfig {
            schema_dir: PathBuf::from("schemas"),
            default_catalog: Some(PathBuf::from("catalog.yaml")),
            ..default_config()
        };

        save_config(&config, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("schema_dir = \"schemas\""), "{written}");

        let loaded = load_app_config(Some(&path)).unwrap();
        assert_eq!(loaded.schema_dir, config.schema_dir);
        assert_eq!(loaded.default_catalog, config.default_catalog);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = load_app_config(Some(&dir.path().join("nope.yaml"))).unwrap_err();
        assert!(format!("{err:#}").contains("nope.yaml"), "{err:#}");
    }

    #[test]
    fn ensure_report_dir_creates_nested_directory() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig {
            report_dir: dir.path().join("a").join("b"),
            ..default_config()
        };

        let created = ensure_report_dir(&config).unwrap();
        assert!(created.is_dir());
        // second call is a no-op
        ensure_report_dir(&config).unwrap();
    }
}
