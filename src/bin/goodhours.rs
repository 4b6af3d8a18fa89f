//! goodhours CLI - Command-line interface for goodhours
//!
//! Commands:
//! - windows: Compute good-weather windows from a forecast payload
//! - days: Classify forecast days as good or not
//! - purge: Drop expired windows from a store file
//! - doctor: Diagnose settings and store health
//! - config: Print the default settings file

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use goodhours::adapters::{ForecastPayloadAdapter, OpenMeteoAdapter, SampleAdapter};
use goodhours::pipeline::{classify_payload, WindowProcessor};
use goodhours::{ForecastError, Settings, WindowStore, GOODHOURS_VERSION, PRODUCER_NAME};

/// goodhours - Good-weather windows from hourly forecasts
#[derive(Parser)]
#[command(name = "goodhours")]
#[command(version = GOODHOURS_VERSION)]
#[command(about = "Find the hours with weather you actually like", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute good-weather windows from a forecast payload
    Windows {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "open-meteo")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Settings file (TOML); defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the settings timezone (IANA name, e.g. "Europe/Berlin")
        #[arg(long)]
        timezone: Option<String>,

        /// Location identifier used as the store key
        #[arg(long, default_value = "default")]
        location: String,

        /// Window store to reconcile against and update (created if missing)
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Classify forecast days as good or not
    Days {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "open-meteo")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Settings file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Drop windows that have already ended from a store file
    Purge {
        /// Window store file
        #[arg(long)]
        store: PathBuf,

        /// Reference time (RFC 3339); defaults to now
        #[arg(long)]
        now: Option<String>,
    },

    /// Diagnose settings and store health
    Doctor {
        /// Settings file to check
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Store file to check
        #[arg(long)]
        store: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the default settings file
    Config,
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Open-Meteo forecast response
    OpenMeteo,
    /// Canonical hourly samples (JSON array or NDJSON)
    Samples,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    env_logger::init();
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

fn run(cli: Cli) -> Result<(), GoodhoursCliError> {
    match cli.command {
        Commands::Windows {
            input,
            output,
            input_format,
            output_format,
            config,
            timezone,
            location,
            store,
        } => cmd_windows(
            &input,
            &output,
            input_format,
            output_format,
            config.as_deref(),
            timezone,
            &location,
            store.as_deref(),
        ),

        Commands::Days {
            input,
            input_format,
            output_format,
            config,
        } => cmd_days(&input, input_format, output_format, config.as_deref()),

        Commands::Purge { store, now } => cmd_purge(&store, now.as_deref()),

        Commands::Doctor {
            config,
            store,
            json,
        } => cmd_doctor(config.as_deref(), store.as_deref(), json),

        Commands::Config => cmd_config(),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_windows(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    config: Option<&Path>,
    timezone: Option<String>,
    location: &str,
    store: Option<&Path>,
) -> Result<(), GoodhoursCliError> {
    let raw = read_input(input)?;

    let mut settings = load_settings(config)?;
    if let Some(tz) = timezone {
        settings.timezone = tz;
    }
    settings.validate()?;

    let mut processor = WindowProcessor::with_store(load_store(store)?);
    let windows =
        processor.process_payload(adapter_for(&input_format), location, &raw, &settings)?;

    log::info!("{} windows for {}", windows.len(), location);

    if let Some(store_path) = store {
        fs::write(store_path, processor.save_store()?)?;
    }

    write_output(output, &format_output(&windows, &output_format)?)
}

fn cmd_days(
    input: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    config: Option<&Path>,
) -> Result<(), GoodhoursCliError> {
    let raw = read_input(input)?;
    let settings = load_settings(config)?;
    settings.validate()?;

    let days = classify_payload(adapter_for(&input_format), &raw, &settings)?;
    if days.is_empty() {
        return Err(GoodhoursCliError::NoData);
    }

    print!("{}", format_output(&days, &output_format)?);
    Ok(())
}

fn cmd_purge(store: &Path, now: Option<&str>) -> Result<(), GoodhoursCliError> {
    let now = match now {
        Some(value) => DateTime::parse_from_rfc3339(value)
            .map_err(|e| GoodhoursCliError::InvalidArgument(format!("--now {value}: {e}")))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let mut processor = WindowProcessor::with_store(load_store(Some(store))?);
    let purged = processor.purge_expired(now);
    fs::write(store, processor.save_store()?)?;

    println!("Purged {} expired windows", purged);
    Ok(())
}

fn cmd_doctor(
    config: Option<&Path>,
    store: Option<&Path>,
    json: bool,
) -> Result<(), GoodhoursCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("goodhours version {}", GOODHOURS_VERSION),
    });

    if let Some(config_path) = config {
        let check = match Settings::load(config_path).and_then(|s| s.validate().map(|_| s)) {
            Ok(settings) => DoctorCheck {
                name: "settings".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "Settings valid (timezone {}, work hours {})",
                    settings.timezone,
                    settings
                        .work_hours
                        .map(|b| format!("{}-{}", b.start_hour, b.end_hour))
                        .unwrap_or_else(|| "off".to_string())
                ),
            },
            Err(e) => DoctorCheck {
                name: "settings".to_string(),
                status: CheckStatus::Error,
                message: e.to_string(),
            },
        };
        checks.push(check);
    }

    if let Some(store_path) = store {
        let check = if !store_path.exists() {
            DoctorCheck {
                name: "store".to_string(),
                status: CheckStatus::Warning,
                message: "Store file does not exist".to_string(),
            }
        } else {
            match fs::read_to_string(store_path)
                .map_err(ForecastError::from)
                .and_then(|raw| WindowStore::from_json(&raw).map_err(ForecastError::from))
            {
                Ok(loaded) => {
                    let expired = {
                        let mut copy = loaded.clone();
                        copy.purge_expired(Utc::now())
                    };
                    DoctorCheck {
                        name: "store".to_string(),
                        status: if expired > 0 {
                            CheckStatus::Warning
                        } else {
                            CheckStatus::Ok
                        },
                        message: format!(
                            "{} windows across {} locations ({} expired)",
                            loaded.window_count(),
                            loaded.locations().count(),
                            expired
                        ),
                    }
                }
                Err(e) => DoctorCheck {
                    name: "store".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Invalid store: {}", e),
                },
            }
        };
        checks.push(check);
    }

    // Check stdin is available (for piping payloads)
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (ready for --input -)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: GOODHOURS_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("goodhours Doctor Report");
        println!("=======================");
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
        Err(GoodhoursCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_config() -> Result<(), GoodhoursCliError> {
    print!("{}", Settings::default().to_toml_string()?);
    Ok(())
}

// Helper functions

fn adapter_for(format: &InputFormat) -> &'static dyn ForecastPayloadAdapter {
    match format {
        InputFormat::OpenMeteo => &OpenMeteoAdapter,
        InputFormat::Samples => &SampleAdapter,
    }
}

fn read_input(input: &Path) -> Result<String, GoodhoursCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), GoodhoursCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

fn load_settings(config: Option<&Path>) -> Result<Settings, GoodhoursCliError> {
    match config {
        Some(path) => Ok(Settings::load(path)?),
        None => Ok(Settings::default()),
    }
}

fn load_store(store: Option<&Path>) -> Result<WindowStore, GoodhoursCliError> {
    match store {
        Some(path) if path.exists() => Ok(WindowStore::from_json(&fs::read_to_string(path)?)?),
        Some(path) => {
            log::info!("store {} not found, starting empty", path.display());
            Ok(WindowStore::new())
        }
        None => Ok(WindowStore::new()),
    }
}

fn format_output<T: Serialize>(
    records: &[T],
    format: &OutputFormat,
) -> Result<String, GoodhoursCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for record in records {
                lines.push(serde_json::to_string(record)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(records)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(records)?),
    }
}

// Error types

#[derive(Debug)]
enum GoodhoursCliError {
    Io(io::Error),
    Forecast(ForecastError),
    Json(serde_json::Error),
    NoData,
    InvalidArgument(String),
    DoctorFailed,
}

impl From<io::Error> for GoodhoursCliError {
    fn from(e: io::Error) -> Self {
        GoodhoursCliError::Io(e)
    }
}

impl From<ForecastError> for GoodhoursCliError {
    fn from(e: ForecastError) -> Self {
        GoodhoursCliError::Forecast(e)
    }
}

impl From<serde_json::Error> for GoodhoursCliError {
    fn from(e: serde_json::Error) -> Self {
        GoodhoursCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<GoodhoursCliError> for CliError {
    fn from(e: GoodhoursCliError) -> Self {
        match e {
            GoodhoursCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            GoodhoursCliError::Forecast(e) => {
                let hint = match e {
                    ForecastError::InvalidTimezone(_) => "Use an IANA name such as Europe/Berlin",
                    ForecastError::InvalidPolicy(_) | ForecastError::InvalidWorkHours(_) => {
                        "Fix the settings file; 'goodhours config' prints a valid one"
                    }
                    _ => "Check that the input matches --input-format",
                };
                CliError {
                    code: "FORECAST_ERROR".to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            GoodhoursCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            GoodhoursCliError::NoData => CliError {
                code: "NO_DATA".to_string(),
                message: "No forecast days found in input".to_string(),
                hint: Some("Ensure the payload has hourly or daily data".to_string()),
            },
            GoodhoursCliError::InvalidArgument(msg) => CliError {
                code: "INVALID_ARGUMENT".to_string(),
                message: msg,
                hint: None,
            },
            GoodhoursCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
