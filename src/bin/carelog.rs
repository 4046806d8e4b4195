//! carelog CLI - Command-line interface for carelog analytics
//!
//! Commands:
//! - summary: Build the weekly summary payload for one child
//! - alerts: Compute pattern alerts for one child
//! - validate: Check a log dataset for records the engine will ignore
//! - doctor: Diagnose engine configuration

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use carelog_analytics::config::AnalyticsConfig;
use carelog_analytics::encoder::{SummaryEncoder, SCHEMA_VERSION};
use carelog_analytics::repository::{InMemoryRepository, LogDataset};
use carelog_analytics::{AnalyticsEngine, AnalyticsError, ENGINE_VERSION, PRODUCER_NAME};

/// carelog - Analytics over caregiver logs
#[derive(Parser)]
#[command(name = "carelog")]
#[command(author = "Aurtsy")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Weekly analytics over caregiver logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the weekly summary for a child
    Summary {
        /// Dataset file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Child to summarise
        #[arg(short, long)]
        child: String,

        /// End of the summary window (RFC 3339), defaults to the current time
        #[arg(long)]
        now: Option<String>,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Compute pattern alerts for a child
    Alerts {
        /// Dataset file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Child to check
        #[arg(short, long)]
        child: String,

        /// End of the analysis window (RFC 3339), defaults to the current time
        #[arg(long)]
        now: Option<String>,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Check a log dataset for records the engine will ignore
    Validate {
        /// Dataset file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose engine configuration
    Doctor {
        /// Check a configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CarelogCliError> {
    match cli.command {
        Commands::Summary {
            input,
            child,
            now,
            config,
            output,
            output_format,
        } => cmd_summary(
            &input,
            &child,
            now.as_deref(),
            config.as_deref(),
            &output,
            output_format,
        ),

        Commands::Alerts {
            input,
            child,
            now,
            config,
            output_format,
        } => cmd_alerts(&input, &child, now.as_deref(), config.as_deref(), output_format),

        Commands::Validate { input, json } => cmd_validate(&input, json),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

fn cmd_summary(
    input: &Path,
    child: &str,
    now: Option<&str>,
    config: Option<&Path>,
    output: &Path,
    output_format: OutputFormat,
) -> Result<(), CarelogCliError> {
    let now = resolve_now(now)?;
    let engine = load_engine(config)?;
    let repo = InMemoryRepository::new(read_dataset(input)?);

    log::info!(
        "summarising {child} over {} records ending {}",
        repo.dataset().record_count(),
        now.to_rfc3339()
    );

    let report = engine.weekly_summary(&repo, child, now)?;
    let payload = SummaryEncoder::new().encode(child, now, &report);
    let output_data = format_output(&payload, &output_format)?;

    if output.to_string_lossy() == "-" {
        println!("{output_data}");
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_alerts(
    input: &Path,
    child: &str,
    now: Option<&str>,
    config: Option<&Path>,
    output_format: OutputFormat,
) -> Result<(), CarelogCliError> {
    let now = resolve_now(now)?;
    let engine = load_engine(config)?;
    let repo = InMemoryRepository::new(read_dataset(input)?);

    let alerts = engine.pattern_alerts(&repo, child, now)?;
    println!("{}", format_output(&alerts, &output_format)?);
    Ok(())
}

fn cmd_validate(input: &Path, json: bool) -> Result<(), CarelogCliError> {
    let dataset = read_dataset(input)?;
    let results = dataset.validate();

    let report = ValidationReport {
        total_records: dataset.record_count(),
        issues: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                stream: r.stream.to_string(),
                index: r.index,
                record_id: r.record_id,
                error: r.issue.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records: {}", report.total_records);
        println!("Issues:        {}", report.issues);

        if !report.errors.is_empty() {
            println!("\nIssues:");
            for err in &report.errors {
                println!(
                    "  - {} #{} (index {}): {}",
                    err.stream, err.record_id, err.index, err.error
                );
            }
        }
    }

    if report.issues > 0 {
        Err(CarelogCliError::ValidationFailed(report.issues))
    } else {
        Ok(())
    }
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), CarelogCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("carelog analytics {ENGINE_VERSION}"),
    });

    checks.push(DoctorCheck {
        name: "schema_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Output schema: {SCHEMA_VERSION}"),
    });

    if let Some(config_path) = config {
        let check = if !config_path.exists() {
            DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Config file does not exist, defaults will be used".to_string(),
            }
        } else {
            match fs::read_to_string(config_path) {
                Ok(content) => match AnalyticsConfig::from_json(&content) {
                    Ok(config) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "Config valid ({}d summary, {}h regulation window)",
                            config.summary_window_days, config.regulation_window_hours
                        ),
                    },
                    Err(e) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Error,
                        message: e.to_string(),
                    },
                },
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot read config file: {e}"),
                },
            }
        };
        checks.push(check);
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass --input <file>)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (--input - ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("carelog Doctor Report");
        println!("=====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));

    if has_errors {
        Err(CarelogCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(input: &Path) -> Result<String, CarelogCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_dataset(input: &Path) -> Result<LogDataset, CarelogCliError> {
    Ok(LogDataset::from_json(&read_input(input)?)?)
}

fn load_engine(config: Option<&Path>) -> Result<AnalyticsEngine, CarelogCliError> {
    let config = match config {
        Some(path) => AnalyticsConfig::from_json(&fs::read_to_string(path)?)?,
        None => AnalyticsConfig::default(),
    };
    Ok(AnalyticsEngine::with_config(config)?)
}

fn resolve_now(now: Option<&str>) -> Result<DateTime<Utc>, CarelogCliError> {
    match now {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| CarelogCliError::ParseError(format!("Invalid --now '{raw}': {e}"))),
        None => Ok(Utc::now()),
    }
}

fn format_output<T: serde::Serialize>(
    value: &T,
    format: &OutputFormat,
) -> Result<String, CarelogCliError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(value)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
    }
}

// Error types

#[derive(Debug)]
enum CarelogCliError {
    Io(io::Error),
    Analytics(AnalyticsError),
    Json(serde_json::Error),
    ValidationFailed(usize),
    DoctorFailed,
    ParseError(String),
}

impl From<io::Error> for CarelogCliError {
    fn from(e: io::Error) -> Self {
        CarelogCliError::Io(e)
    }
}

impl From<AnalyticsError> for CarelogCliError {
    fn from(e: AnalyticsError) -> Self {
        CarelogCliError::Analytics(e)
    }
}

impl From<serde_json::Error> for CarelogCliError {
    fn from(e: serde_json::Error) -> Self {
        CarelogCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<CarelogCliError> for CliError {
    fn from(e: CarelogCliError) -> Self {
        match e {
            CarelogCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            CarelogCliError::Analytics(AnalyticsError::ConfigError(msg)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: msg,
                hint: Some("Run 'carelog doctor --config <file>' for details".to_string()),
            },
            CarelogCliError::Analytics(AnalyticsError::Repository(msg)) => CliError {
                code: "REPOSITORY_ERROR".to_string(),
                message: msg,
                hint: Some("Retry once the log store is reachable".to_string()),
            },
            CarelogCliError::Analytics(e) => CliError {
                code: "ANALYTICS_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure the dataset has meals, sleep_sessions, behavior_incidents, hydration_entries and activities arrays".to_string()),
            },
            CarelogCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            CarelogCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{count} record issues found"),
                hint: Some("Affected records are skipped or partly ignored by the summary".to_string()),
            },
            CarelogCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            CarelogCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Timestamps use RFC 3339, e.g. 2024-01-15T12:00:00Z".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_records: usize,
    issues: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    stream: String,
    index: usize,
    record_id: i64,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
