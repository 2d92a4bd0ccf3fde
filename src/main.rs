use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use cra_risk::config::{self, AppConfig};
use cra_risk::report::{self, OutputFormat, Report};
use cra_risk::{ControlCatalog, load_control_catalog, load_risk_assessment, validate_assessment};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "cra_risk")]
#[command(about = "EU CRA cybersecurity risk assessment: initial and residual risk scoring")]
struct Cli {
    /// Config file (default is ~/.cra_risk.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a risk definition file
    Assess {
        /// Risk definition file (YAML)
        file: PathBuf,
        /// Control catalog used for residual scoring (falls back to default_catalog)
        #[arg(short, long)]
        catalog: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Also write the report into the configured report directory
        #[arg(long)]
        save: bool,
    },
    /// Check a risk definition file for duplicate ids and out-of-range values
    Validate {
        /// Risk definition file (YAML)
        file: PathBuf,
        /// Control catalog to check control references against
        #[arg(short, long)]
        catalog: Option<PathBuf>,
    },
    /// Initialize configuration file
    Init {
        /// Path to save the config file (.toml for TOML, YAML otherwise)
        #[arg(short, long, default_value = "cra_risk.yaml")]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    cra_risk::logging::init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Init { path, force } => {
            if path.exists() && !force {
                bail!(
                    "{} already exists; pass --force to overwrite it",
                    path.display()
                );
            }
            config::save_config(&config::default_config(), &path)?;
            println!("Configuration file created at: {}", path.display());
            Ok(ExitCode::SUCCESS)
        }

        Commands::Assess {
            file,
            catalog,
            format,
            save,
        } => {
            let app_config = config::load_app_config(cli.config.as_deref())
                .context("failed to load application configuration")?;
            assess(&app_config, &file, catalog, format, save)?;
            Ok(ExitCode::SUCCESS)
        }

        Commands::Validate { file, catalog } => {
            let app_config = config::load_app_config(cli.config.as_deref())
                .context("failed to load application configuration")?;
            let assessment = load_risk_assessment(&file)?;
            let catalog = load_catalog(&app_config, catalog)?;

            let findings = validate_assessment(&assessment, catalog.as_ref());
            if findings.is_empty() {
                println!("{}: no issues found", file.display());
                return Ok(ExitCode::SUCCESS);
            }
            for finding in &findings {
                println!("{}: {finding}", file.display());
            }
            println!("{} issue(s) found", findings.len());
            Ok(ExitCode::FAILURE)
        }
    }
}

fn assess(
    app_config: &AppConfig,
    file: &Path,
    catalog: Option<PathBuf>,
    format: OutputFormat,
    save: bool,
) -> Result<()> {
    cra_risk::log_info!("Processing risk definition file: {}", file.display());
    let assessment = load_risk_assessment(file)?;
    let catalog = load_catalog(app_config, catalog)?;

    for finding in validate_assessment(&assessment, catalog.as_ref()) {
        cra_risk::log_warn!("{}", finding);
    }

    let report = Report::new(&assessment, catalog.as_ref());
    let rendered = report.render(format)?;
    print!("{rendered}");
    if !rendered.ends_with('\n') {
        println!();
    }

    if save {
        let dir = config::ensure_report_dir(app_config)?;
        let stem = file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let path = report::write_report(&report, format, dir, &stem)?;
        println!("Report saved to: {}", path.display());
    }
    Ok(())
}

/// An explicit `--catalog` wins over the configured default.
fn load_catalog(app_config: &AppConfig, explicit: Option<PathBuf>) -> Result<Option<ControlCatalog>> {
    let Some(path) = explicit.or_else(|| app_config.default_catalog.clone()) else {
        cra_risk::log_debug!("No control catalog given, skipping residual scoring");
        return Ok(None);
    };
    Ok(Some(load_control_catalog(&path)?))
}
