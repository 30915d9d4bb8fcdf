//! treeflat CLI - Command-line interface for treeflat
//!
//! Commands:
//! - flatten: Flatten a session or markup document into a table
//! - validate: Report structural problems without producing a table
//! - schema: Print the output columns for a source kind
//! - doctor: Diagnose configuration and environment

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Utc;
use tracing_subscriber::EnvFilter;

use treeflat::pipeline::FlattenProcessor;
use treeflat::{FlattenConfig, FlattenError, Table, PRODUCER_NAME, TREEFLAT_VERSION};

/// treeflat - Flatten hierarchical assessment documents into tables
#[derive(Parser)]
#[command(name = "treeflat")]
#[command(version = TREEFLAT_VERSION)]
#[command(about = "Flatten session and customer markup documents into tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Flatten a document into a table
    Flatten {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Kind of input document
        #[arg(long, default_value = "sessions")]
        source: Source,

        /// Output format
        #[arg(long, default_value = "csv")]
        format: OutputFormat,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Report structural problems in a document
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Kind of input document
        #[arg(long, default_value = "sessions")]
        source: Source,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the output columns for a source kind
    Schema {
        #[arg(value_enum)]
        source: Source,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Configuration file to check
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Source {
    /// Session JSON with heartbeat collections
    Sessions,
    /// Customer markup with test session events
    Markup,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Comma-separated values with a header row
    Csv,
    /// Newline-delimited JSON (one row object per line)
    Ndjson,
    /// JSON table document
    Json,
    /// Pretty-printed JSON table document
    JsonPretty,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
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

fn run(cli: Cli) -> Result<(), TreeflatCliError> {
    match cli.command {
        Commands::Flatten {
            input,
            output,
            source,
            format,
            config,
        } => cmd_flatten(&input, &output, source, format, config.as_deref()),

        Commands::Validate {
            input,
            source,
            config,
            json,
        } => cmd_validate(&input, source, config.as_deref(), json),

        Commands::Schema {
            source,
            config,
            json,
        } => cmd_schema(source, config.as_deref(), json),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

fn cmd_flatten(
    input: &Path,
    output: &Path,
    source: Source,
    format: OutputFormat,
    config: Option<&Path>,
) -> Result<(), TreeflatCliError> {
    let processor = load_processor(config)?;
    let input_data = read_input(input)?;

    let table = match source {
        Source::Sessions => processor.process_sessions(&input_data)?,
        Source::Markup => processor.process_markup(&input_data)?,
    };
    tracing::info!(rows = table.len(), columns = table.schema().len(), "flattened document");

    let output_data = format_output(&table, format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_validate(
    input: &Path,
    source: Source,
    config: Option<&Path>,
    json: bool,
) -> Result<(), TreeflatCliError> {
    let processor = load_processor(config)?;
    let input_data = read_input(input)?;

    let errors: Vec<ValidationErrorDetail> = match source {
        Source::Sessions => processor
            .validate_sessions(&input_data)?
            .into_iter()
            .map(|r| ValidationErrorDetail {
                location: format!("session {}", r.index),
                error: r.error.to_string(),
            })
            .collect(),
        Source::Markup => processor
            .validate_markup(&input_data)?
            .into_iter()
            .map(|(path, error)| ValidationErrorDetail {
                location: path,
                error: error.to_string(),
            })
            .collect(),
    };

    let report = ValidationReport {
        source: source.name().to_string(),
        invalid_records: errors.len(),
        errors,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Source:          {}", report.source);
        println!("Invalid records: {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - {}: {}", err.location, err.error);
            }
        }
    }

    if report.invalid_records > 0 {
        Err(TreeflatCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_schema(source: Source, config: Option<&Path>, json: bool) -> Result<(), TreeflatCliError> {
    let processor = load_processor(config)?;
    let config = processor.config();

    let (columns, note) = match source {
        Source::Sessions => (
            processor.session_columns()?.columns().to_vec(),
            "Session metadata columns sit after the sequence column, in first-seen order",
        ),
        Source::Markup => (
            vec![
                config.markup.first_name_column.clone(),
                config.markup.last_name_column.clone(),
            ],
            "Event leaf fields follow the name columns, in first-seen order",
        ),
    };

    if json {
        let report = SchemaReport {
            source: source.name().to_string(),
            columns,
            note: note.to_string(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Output Schema: {}", source.name());
        println!();
        for column in &columns {
            println!("  - {}", column);
        }
        println!();
        println!("{}", note);
        if let Source::Markup = source {
            println!("Matched path: /{}", config.markup.event_pattern.join("/"));
        }
    }

    Ok(())
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), TreeflatCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "treeflat_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("treeflat version {}", TREEFLAT_VERSION),
    });

    if let Some(config_path) = config {
        let check = if !config_path.exists() {
            DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Configuration file does not exist".to_string(),
            }
        } else {
            match fs::read_to_string(config_path) {
                Ok(content) => match FlattenConfig::from_json(&content) {
                    Ok(c) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "Configuration valid (max depth {}, lookup policy {:?})",
                            c.max_depth, c.lookup_policy
                        ),
                    },
                    Err(e) => DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Invalid configuration: {}", e),
                    },
                },
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot read configuration file: {}", e),
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
        version: TREEFLAT_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("treeflat Doctor Report");
        println!("======================");
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
        Err(TreeflatCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

impl Source {
    fn name(self) -> &'static str {
        match self {
            Source::Sessions => "sessions",
            Source::Markup => "markup",
        }
    }
}

fn read_input(input: &Path) -> Result<String, TreeflatCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn load_processor(config: Option<&Path>) -> Result<FlattenProcessor, TreeflatCliError> {
    let config = match config {
        Some(path) => FlattenConfig::from_json(&fs::read_to_string(path)?)?,
        None => FlattenConfig::default(),
    };
    Ok(FlattenProcessor::with_config(config)?)
}

fn format_output(table: &Table, format: OutputFormat) -> Result<String, TreeflatCliError> {
    match format {
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            writer.write_record(table.schema().columns())?;
            for row in table.rows() {
                writer.write_record(row.cells().iter().map(|cell| cell.to_text()))?;
            }
            let bytes = writer
                .into_inner()
                .map_err(|e| TreeflatCliError::Encoding(e.to_string()))?;
            String::from_utf8(bytes).map_err(|e| TreeflatCliError::Encoding(e.to_string()))
        }
        OutputFormat::Ndjson => {
            let mut output = String::new();
            for record in table.to_records() {
                output.push_str(&serde_json::to_string(&record)?);
                output.push('\n');
            }
            Ok(output)
        }
        OutputFormat::Json => Ok(serde_json::to_string(&TableDocument::new(table))?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(&TableDocument::new(table))?),
    }
}

// Error types

#[derive(Debug)]
enum TreeflatCliError {
    Io(io::Error),
    Flatten(FlattenError),
    Json(serde_json::Error),
    Csv(csv::Error),
    Encoding(String),
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for TreeflatCliError {
    fn from(e: io::Error) -> Self {
        TreeflatCliError::Io(e)
    }
}

impl From<FlattenError> for TreeflatCliError {
    fn from(e: FlattenError) -> Self {
        TreeflatCliError::Flatten(e)
    }
}

impl From<serde_json::Error> for TreeflatCliError {
    fn from(e: serde_json::Error) -> Self {
        TreeflatCliError::Json(e)
    }
}

impl From<csv::Error> for TreeflatCliError {
    fn from(e: csv::Error) -> Self {
        TreeflatCliError::Csv(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<TreeflatCliError> for CliError {
    fn from(e: TreeflatCliError) -> Self {
        match e {
            TreeflatCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            TreeflatCliError::Flatten(e) => {
                let (code, hint) = match &e {
                    FlattenError::StructuralLookup { .. } => (
                        "STRUCTURAL_LOOKUP",
                        "Set \"lookup_policy\": \"skip\" to drop incomplete records",
                    ),
                    FlattenError::SchemaMismatch { .. } => {
                        ("SCHEMA_MISMATCH", "Run 'treeflat validate' for details")
                    }
                    FlattenError::DepthExceeded { .. } => {
                        ("DEPTH_EXCEEDED", "Raise \"max_depth\" in the configuration")
                    }
                    FlattenError::Markup(_) => ("MARKUP_ERROR", "Check markup syntax"),
                    FlattenError::Json(_) => ("JSON_ERROR", "Check JSON syntax"),
                    FlattenError::Config(_) => {
                        ("CONFIG_ERROR", "Run 'treeflat doctor --config <file>'")
                    }
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            TreeflatCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            TreeflatCliError::Csv(e) => CliError {
                code: "CSV_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            TreeflatCliError::Encoding(msg) => CliError {
                code: "ENCODING_ERROR".to_string(),
                message: msg,
                hint: None,
            },
            TreeflatCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            TreeflatCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct TableDocument<'a> {
    producer: &'static str,
    version: &'static str,
    generated_at: String,
    #[serde(flatten)]
    table: &'a Table,
}

impl<'a> TableDocument<'a> {
    fn new(table: &'a Table) -> Self {
        Self {
            producer: PRODUCER_NAME,
            version: TREEFLAT_VERSION,
            generated_at: Utc::now().to_rfc3339(),
            table,
        }
    }
}

#[derive(serde::Serialize)]
struct ValidationReport {
    source: String,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    location: String,
    error: String,
}

#[derive(serde::Serialize)]
struct SchemaReport {
    source: String,
    columns: Vec<String>,
    note: String,
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
