//! SmartSight CLI - Command-line interface for SmartSight Insights
//!
//! Commands:
//! - infer: Score a daily feature record and print the insight payload
//! - detect: Print the risk factors of a feature record (no model needed)
//! - train: Train the wellness model and print its training report
//! - doctor: Diagnose configuration and model health
//! - schema: Print input/output schema information

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use smartsight_insights::{
    CheckIn, FeatureRecord, InsightConfig, InsightEncoder, InsightError, Preset,
    RiskFactorDetector, WellnessInferenceService, INSIGHTS_VERSION, PRODUCER_NAME,
};

/// SmartSight - On-device wellness insights for student check-ins
#[derive(Parser)]
#[command(name = "smartsight")]
#[command(author = "SmartSight Team")]
#[command(version = INSIGHTS_VERSION)]
#[command(about = "Score daily wellness check-ins", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a feature record and print the insight payload
    Infer {
        #[command(flatten)]
        source: RecordSource,

        #[command(flatten)]
        model: ModelArgs,

        /// Output format
        #[arg(long, default_value = "json")]
        format: OutputFormat,

        /// Wrap the result in a daily check-in record
        #[arg(long)]
        check_in: bool,

        /// User ID for the check-in (defaults to "guest")
        #[arg(long, requires = "check_in")]
        user_id: Option<String>,
    },

    /// Print the risk factors of a feature record
    Detect {
        #[command(flatten)]
        source: RecordSource,

        /// Output format
        #[arg(long, default_value = "json")]
        format: OutputFormat,
    },

    /// Train the wellness model and print its training report
    Train {
        #[command(flatten)]
        model: ModelArgs,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        format: OutputFormat,
    },

    /// Diagnose configuration and model health
    Doctor {
        #[command(flatten)]
        model: ModelArgs,

        /// Skip the training smoke test
        #[arg(long)]
        skip_training: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Args)]
struct RecordSource {
    /// Feature record JSON file (use - for stdin)
    #[arg(short, long, conflicts_with = "preset", required_unless_present = "preset")]
    input: Option<PathBuf>,

    /// Use a built-in scenario instead of an input file
    #[arg(long, value_enum)]
    preset: Option<PresetArg>,
}

#[derive(Args)]
struct ModelArgs {
    /// Insight configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for corpus generation and weight initialization
    #[arg(long, env = "SMARTSIGHT_SEED")]
    seed: Option<u64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PresetArg {
    /// Strong focus, good sleep, regular exercise
    Good,
    /// Typical student day
    Average,
    /// Little focus or sleep, high stress
    Tough,
}

impl From<PresetArg> for Preset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Good => Preset::Good,
            PresetArg::Average => Preset::Average,
            PresetArg::Tough => Preset::Tough,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (daily feature record)
    Input,
    /// Output schema (insight payload)
    Output,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
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

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

async fn run(cli: Cli) -> Result<(), SmartsightCliError> {
    match cli.command {
        Commands::Infer {
            source,
            model,
            format,
            check_in,
            user_id,
        } => cmd_infer(&source, &model, &format, check_in, user_id.as_deref()).await,

        Commands::Detect { source, format } => cmd_detect(&source, &format),

        Commands::Train { model, format } => cmd_train(&model, &format).await,

        Commands::Doctor {
            model,
            skip_training,
            json,
        } => cmd_doctor(&model, skip_training, json).await,

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

async fn cmd_infer(
    source: &RecordSource,
    model: &ModelArgs,
    format: &OutputFormat,
    check_in: bool,
    user_id: Option<&str>,
) -> Result<(), SmartsightCliError> {
    let record = read_record(source)?;
    let service = WellnessInferenceService::new(load_config(model)?);

    let result = service.infer(&record).await?;
    info!(
        "Scored record: {} ({})",
        result.score,
        result.band().label()
    );

    let output = if check_in {
        format_output(&CheckIn::new(user_id, record, result), format)?
    } else {
        let payload = InsightEncoder::new().encode(&record, &result);
        format_output(&payload, format)?
    };

    println!("{}", output);
    Ok(())
}

fn cmd_detect(source: &RecordSource, format: &OutputFormat) -> Result<(), SmartsightCliError> {
    let record = read_record(source)?;
    let factors = RiskFactorDetector::detect_validated(&record)?;
    println!("{}", format_output(&factors, format)?);
    Ok(())
}

async fn cmd_train(model: &ModelArgs, format: &OutputFormat) -> Result<(), SmartsightCliError> {
    let service = WellnessInferenceService::new(load_config(model)?);
    service.ensure_trained().await?;

    match service.training_report() {
        Some(report) => {
            println!("{}", format_output(&report, format)?);
            Ok(())
        }
        None => Err(InsightError::ModelNotReady.into()),
    }
}

async fn cmd_doctor(
    model: &ModelArgs,
    skip_training: bool,
    json: bool,
) -> Result<(), SmartsightCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "insights_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("SmartSight Insights version {}", INSIGHTS_VERSION),
    });

    let config = match load_config(model) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Ok,
                message: match &model.config {
                    Some(path) => format!("Configuration {} is valid", path.display()),
                    None => "Using default configuration".to_string(),
                },
            });
            Some(config)
        }
        Err(e) => {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: CliError::from(e).message,
            });
            None
        }
    };

    if let Some(config) = config {
        checks.push(DoctorCheck {
            name: "seed".to_string(),
            status: if config.seed.is_some() {
                CheckStatus::Ok
            } else {
                CheckStatus::Warning
            },
            message: match config.seed {
                Some(seed) => format!("Seeded with {} (reproducible scores)", seed),
                None => "No seed set; scores vary between runs".to_string(),
            },
        });

        if !skip_training {
            checks.push(check_model(config).await);
        }
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (use --input FILE or --preset)".to_string(),
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
        version: INSIGHTS_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("SmartSight Doctor Report");
        println!("========================");
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
        Err(SmartsightCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

async fn check_model(config: InsightConfig) -> DoctorCheck {
    let service = WellnessInferenceService::new(config);

    match service.infer(&Preset::Average.record()).await {
        Ok(result) => DoctorCheck {
            name: "model".to_string(),
            status: CheckStatus::Ok,
            message: match service.training_report() {
                Some(report) => format!(
                    "Model trained in {} ms (final loss {:.5}); average day scores {}",
                    report.duration_ms, report.final_loss, result.score
                ),
                None => format!("Average day scores {}", result.score),
            },
        },
        Err(e) => DoctorCheck {
            name: "model".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), SmartsightCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input Schema: daily feature record");
                println!();
                println!("All six fields are required numbers:");
                println!();
                println!("- focusHours: Hours of focused study (0-12)");
                println!("- appSwitches: App switches during study (0-200)");
                println!("- sleepHours: Hours slept last night (0-12)");
                println!("- stressLevel: Self-reported stress (1-10)");
                println!("- exerciseMinutes: Minutes of exercise (0-180)");
                println!("- socialHours: Hours of social time (0-8)");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output Schema: insight payload");
                println!();
                println!("- insight_version: Schema version (1.0.0)");
                println!("- producer: {{ name, version, instance_id }}");
                println!("- computed_at_utc: RFC 3339 timestamp");
                println!("- input: The scored feature record");
                println!("- band: great | good | needs_attention");
                println!("- result: {{ score, riskFactors, recommendations }}");
                println!("  - score: Wellness score (0-100)");
                println!("  - riskFactors: Risk labels in detection order");
                println!("  - recommendations: Up to five {{ title, description, category, priority }}");
            }
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, SmartsightCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_record(source: &RecordSource) -> Result<FeatureRecord, SmartsightCliError> {
    match (&source.input, source.preset) {
        (_, Some(preset)) => Ok(Preset::from(preset).record()),
        (Some(path), None) => Ok(FeatureRecord::from_json(&read_input(path)?)?),
        (None, None) => Err(SmartsightCliError::NoInput),
    }
}

fn load_config(model: &ModelArgs) -> Result<InsightConfig, SmartsightCliError> {
    let mut config = match &model.config {
        Some(path) => InsightConfig::from_json(&fs::read_to_string(path)?)?,
        None => InsightConfig::default(),
    };

    if let Some(seed) = model.seed {
        config = config.with_seed(seed);
    }

    Ok(config)
}

fn format_output<T: Serialize + ?Sized>(
    value: &T,
    format: &OutputFormat,
) -> Result<String, SmartsightCliError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(value)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
    }
}

fn get_input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "smartsight.feature_record.v1",
        "description": "One day of student lifestyle features",
        "type": "object",
        "required": [
            "focusHours",
            "appSwitches",
            "sleepHours",
            "stressLevel",
            "exerciseMinutes",
            "socialHours"
        ],
        "properties": {
            "focusHours": { "type": "number", "minimum": 0, "maximum": 12 },
            "appSwitches": { "type": "number", "minimum": 0, "maximum": 200 },
            "sleepHours": { "type": "number", "minimum": 0, "maximum": 12 },
            "stressLevel": { "type": "number", "minimum": 1, "maximum": 10 },
            "exerciseMinutes": { "type": "number", "minimum": 0, "maximum": 180 },
            "socialHours": { "type": "number", "minimum": 0, "maximum": 8 }
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "smartsight.insight.v1",
        "description": "SmartSight wellness insight payload",
        "type": "object",
        "required": ["insight_version", "producer", "computed_at_utc", "input", "band", "result"],
        "properties": {
            "insight_version": { "type": "string" },
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instance_id": { "type": "string" }
                }
            },
            "computed_at_utc": { "type": "string", "format": "date-time" },
            "input": { "type": "object" },
            "band": { "type": "string", "enum": ["great", "good", "needs_attention"] },
            "result": {
                "type": "object",
                "required": ["score", "riskFactors", "recommendations"],
                "properties": {
                    "score": { "type": "integer", "minimum": 0, "maximum": 100 },
                    "riskFactors": { "type": "array", "items": { "type": "string" } },
                    "recommendations": {
                        "type": "array",
                        "maxItems": 5,
                        "items": {
                            "type": "object",
                            "properties": {
                                "title": { "type": "string" },
                                "description": { "type": "string" },
                                "category": { "type": "string" },
                                "priority": { "type": "string", "enum": ["high", "medium", "low"] }
                            }
                        }
                    }
                }
            }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum SmartsightCliError {
    Io(io::Error),
    Insight(InsightError),
    Json(serde_json::Error),
    NoInput,
    DoctorFailed,
}

impl From<io::Error> for SmartsightCliError {
    fn from(e: io::Error) -> Self {
        SmartsightCliError::Io(e)
    }
}

impl From<InsightError> for SmartsightCliError {
    fn from(e: InsightError) -> Self {
        SmartsightCliError::Insight(e)
    }
}

impl From<serde_json::Error> for SmartsightCliError {
    fn from(e: serde_json::Error) -> Self {
        SmartsightCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<SmartsightCliError> for CliError {
    fn from(e: SmartsightCliError) -> Self {
        match e {
            SmartsightCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            SmartsightCliError::Insight(e) => {
                let (code, hint) = match &e {
                    InsightError::InvalidInput { .. } => (
                        "INVALID_INPUT",
                        "Run 'smartsight schema input' for field names and ranges",
                    ),
                    InsightError::InvalidConfig(_) | InsightError::JsonError(_) => {
                        ("CONFIG_ERROR", "Check the configuration file")
                    }
                    InsightError::InitializationFailure(_) | InsightError::ModelNotReady => (
                        "MODEL_UNAVAILABLE",
                        "Run 'smartsight doctor' to diagnose training",
                    ),
                    _ => ("INFERENCE_ERROR", "Retry with -v for details"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            SmartsightCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            SmartsightCliError::NoInput => CliError {
                code: "NO_INPUT".to_string(),
                message: "No feature record given".to_string(),
                hint: Some("Pass --input FILE, --input - or --preset".to_string()),
            },
            SmartsightCliError::DoctorFailed => CliError {
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
