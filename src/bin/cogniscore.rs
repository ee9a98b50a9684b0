//! Cogniscore CLI - Command-line interface for the Cogniscore engine
//!
//! Commands:
//! - score: Score finalized telemetry sessions (batch mode)
//! - validate: Check sessions without scoring them
//! - doctor: Diagnose configuration and history files
//! - schema: Print input, output or configuration schema

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use cogniscore::history::DEFAULT_HISTORY_WINDOW;
use cogniscore::{
    parse_session, Locale, ProgressTracker, ScoreError, ScoringConfig, ScoringEngine,
    ScoringProcessor, TelemetrySession, ENGINE_VERSION, PRODUCER_NAME,
};

/// Cogniscore - Deterministic scoring for assessment telemetry
#[derive(Parser)]
#[command(name = "cogniscore")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Score assessment telemetry sessions", long_about = None)]
struct Cli {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score finalized sessions (batch mode)
    Score {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Scoring configuration JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Feedback language (en, hi)
        #[arg(long)]
        locale: Option<String>,

        /// Attach progress context from a rolling history
        #[arg(long)]
        progress: bool,

        /// History window in attempts
        #[arg(long, default_value_t = DEFAULT_HISTORY_WINDOW)]
        history_window: usize,

        /// Load history from file
        #[arg(long)]
        load_history: Option<PathBuf>,

        /// Save history to file after scoring
        #[arg(long)]
        save_history: Option<PathBuf>,
    },

    /// Validate sessions without scoring them
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and history files
    Doctor {
        /// Check a scoring configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Check a history file
        #[arg(long)]
        history: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema (default configuration for `config`)
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one session per line)
    Ndjson,
    /// JSON array of sessions
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one result per line)
    Ndjson,
    /// JSON array of results
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Telemetry session
    Input,
    /// Score breakdown
    Output,
    /// Scoring configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

fn init_logging(level: LogLevel) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(level).into())
        .from_env_lossy();

    // Logs go to stderr so stdout stays machine-readable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), CogniscoreCliError> {
    match command {
        Commands::Score {
            input,
            output,
            input_format,
            output_format,
            config,
            locale,
            progress,
            history_window,
            load_history,
            save_history,
        } => cmd_score(ScoreArgs {
            input,
            output,
            input_format,
            output_format,
            config,
            locale,
            progress,
            history_window,
            load_history,
            save_history,
        }),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor {
            config,
            history,
            json,
        } => cmd_doctor(config.as_deref(), history.as_deref(), json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

struct ScoreArgs {
    input: PathBuf,
    output: PathBuf,
    input_format: InputFormat,
    output_format: OutputFormat,
    config: Option<PathBuf>,
    locale: Option<String>,
    progress: bool,
    history_window: usize,
    load_history: Option<PathBuf>,
    save_history: Option<PathBuf>,
}

fn cmd_score(args: ScoreArgs) -> Result<(), CogniscoreCliError> {
    let mut config = match &args.config {
        Some(path) => ScoringConfig::from_json(&fs::read_to_string(path)?)?,
        None => ScoringConfig::default(),
    };
    if let Some(locale) = &args.locale {
        config.locale = locale.parse::<Locale>()?;
    }

    let input_data = read_input(&args.input)?;
    let sessions = parse_sessions(&input_data, &args.input_format)?;
    if sessions.is_empty() {
        return Err(CogniscoreCliError::NoSessions);
    }

    let use_history = args.progress || args.load_history.is_some() || args.save_history.is_some();
    let mut results: Vec<serde_json::Value> = Vec::with_capacity(sessions.len());

    if use_history {
        let mut processor = ScoringProcessor::with_config_and_window(config, args.history_window)?;
        if let Some(path) = &args.load_history {
            processor.load_history(&fs::read_to_string(path)?)?;
        }

        for session in &sessions {
            let attempt = processor.process_session(session)?;
            results.push(serde_json::to_value(&attempt)?);
        }

        if let Some(path) = &args.save_history {
            fs::write(path, processor.save_history()?)?;
        }
    } else {
        let engine = ScoringEngine::new(config)?;
        for session in &sessions {
            let breakdown = engine.score(session)?;
            results.push(serde_json::to_value(&breakdown)?);
        }
    }

    let output_data = format_output(&results, &args.output_format)?;
    if args.output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(&args.output, output_data)?;
    }

    Ok(())
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), CogniscoreCliError> {
    let input_data = read_input(input)?;
    let documents = split_documents(&input_data, &input_format)?;

    let mut errors = Vec::new();
    for (index, document) in documents.iter().enumerate() {
        let session_id = document
            .get("sessionId")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        let checked = parse_session(&document.to_string())
            .and_then(|session| session.validate().map_err(ScoreError::from));
        if let Err(e) = checked {
            errors.push(ValidationErrorDetail {
                index,
                session_id,
                error: e.to_string(),
            });
        }
    }

    let report = ValidationReport {
        total_sessions: documents.len(),
        valid_sessions: documents.len() - errors.len(),
        invalid_sessions: errors.len(),
        errors,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total sessions:   {}", report.total_sessions);
        println!("Valid sessions:   {}", report.valid_sessions);
        println!("Invalid sessions: {}", report.invalid_sessions);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Session {} (index {}): {}",
                    err.session_id.as_deref().unwrap_or("unknown"),
                    err.index,
                    err.error
                );
            }
        }
    }

    if report.invalid_sessions > 0 {
        Err(CogniscoreCliError::ValidationFailed(report.invalid_sessions))
    } else {
        Ok(())
    }
}

fn cmd_doctor(
    config: Option<&Path>,
    history: Option<&Path>,
    json: bool,
) -> Result<(), CogniscoreCliError> {
    let mut checks: Vec<DoctorCheck> = vec![DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Cogniscore version {}", ENGINE_VERSION),
    }];

    checks.push(match ScoringConfig::default().validate() {
        Ok(()) => DoctorCheck {
            name: "default_config".to_string(),
            status: CheckStatus::Ok,
            message: "Built-in weight tables and thresholds are valid".to_string(),
        },
        Err(e) => DoctorCheck {
            name: "default_config".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    });

    if let Some(path) = config {
        checks.push(check_file(path, "config", |content| {
            ScoringConfig::from_json(content)
                .map(|c| format!("Configuration valid (locale {:?})", c.locale))
                .map_err(|e| e.to_string())
        }));
    }

    if let Some(path) = history {
        checks.push(check_file(path, "history", |content| {
            ProgressTracker::from_json(content)
                .map(|t| {
                    format!(
                        "History valid ({} sessions, window {})",
                        t.session_count(),
                        t.window_size()
                    )
                })
                .map_err(|e| format!("Invalid history JSON: {}", e))
        }));
    }

    let stdin_message = if atty::is(atty::Stream::Stdin) {
        "stdin is a TTY (interactive mode)"
    } else {
        "stdin is a pipe (ready for `score -i -`)"
    };
    checks.push(DoctorCheck {
        name: "stdin".to_string(),
        status: CheckStatus::Ok,
        message: stdin_message.to_string(),
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Cogniscore Doctor Report");
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

    if report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error))
    {
        Err(CogniscoreCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

/// Read and check one file; a missing file is a warning
fn check_file(
    path: &Path,
    name: &str,
    check: impl Fn(&str) -> Result<String, String>,
) -> DoctorCheck {
    if !path.exists() {
        return DoctorCheck {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: format!("{} file does not exist", name),
        };
    }

    let (status, message) = match fs::read_to_string(path) {
        Ok(content) => match check(&content) {
            Ok(message) => (CheckStatus::Ok, message),
            Err(message) => (CheckStatus::Error, message),
        },
        Err(e) => (CheckStatus::Error, format!("Cannot read {} file: {}", name, e)),
    };

    DoctorCheck {
        name: name.to_string(),
        status,
        message,
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), CogniscoreCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", input_json_schema());
            } else {
                println!("Input: TelemetrySession (camelCase JSON)");
                println!();
                println!("- sessionId, subjectId: non-empty strings");
                println!("- assessmentType: memory_match | match_pieces | aptitude_test");
                println!("- startedAt, endedAt: RFC 3339 timestamps");
                println!("- endReason: Completed | ExitedEarly | TimedOut (COMPLETED, EXITED, TIME_UP accepted)");
                println!("- rawCounters.memoryMatch: totalPairs, correctPairs, totalClicks,");
                println!("  incorrectClicks, nearbyClicks, timeTakenSeconds");
                println!("- rawCounters.matchPieces: totalImages, imagesCompleted, perImage[],");
                println!("  totalMoves, timeTakenSeconds");
                println!("- items[] (aptitude): itemIndex, selectedAnswer (null or -1 = unanswered)");
                println!("  and isCorrect are required; difficulty, timeSpentSeconds, visitCount,");
                println!("  hintUsed, answerChangeCount, correctAnswer, timeLimitSeconds optional");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", output_json_schema());
            } else {
                println!("Output: ScoreBreakdown (camelCase JSON)");
                println!();
                println!("- dimensionScores: name -> value in [0,1]");
                println!("- rawScore, appliedPenalty, finalScore: values in [0,1]");
                println!("- compositeScore: integer in [0,100]");
                println!("- band, classification, feedback");
                println!("- recommendations[] (aptitude only)");
                println!("- aptitude: tally, difficultyBreakdown, speed, learningBehavior,");
                println!("  strengthAreas, weaknessAreas, recommendationKinds");
                println!("- flags: degenerate inputs absorbed by defaults");
            }
        }
        SchemaType::Config => {
            println!("{}", ScoringConfig::default().to_json()?);
        }
    }
    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, CogniscoreCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

/// Split input into one JSON document per session
fn split_documents(
    input: &str,
    format: &InputFormat,
) -> Result<Vec<serde_json::Value>, CogniscoreCliError> {
    match format {
        InputFormat::Ndjson => input
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| serde_json::from_str(line).map_err(CogniscoreCliError::from))
            .collect(),
        InputFormat::Json => Ok(serde_json::from_str(input)?),
    }
}

fn parse_sessions(
    input: &str,
    format: &InputFormat,
) -> Result<Vec<TelemetrySession>, CogniscoreCliError> {
    split_documents(input, format)?
        .into_iter()
        .map(|doc| parse_session(&doc.to_string()).map_err(CogniscoreCliError::from))
        .collect()
}

fn format_output(
    results: &[serde_json::Value],
    format: &OutputFormat,
) -> Result<String, CogniscoreCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::with_capacity(results.len());
            for result in results {
                lines.push(serde_json::to_string(result)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(results)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(results)?),
    }
}

fn input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "TelemetrySession",
        "type": "object",
        "required": ["sessionId", "subjectId", "assessmentType", "startedAt", "endReason"],
        "properties": {
            "sessionId": { "type": "string", "minLength": 1 },
            "subjectId": { "type": "string", "minLength": 1 },
            "assessmentType": { "enum": ["memory_match", "match_pieces", "aptitude_test"] },
            "startedAt": { "type": "string", "format": "date-time" },
            "endedAt": { "type": "string", "format": "date-time" },
            "endReason": {
                "enum": ["Completed", "ExitedEarly", "TimedOut", "COMPLETED", "EXITED", "TIME_UP"]
            },
            "rawCounters": {
                "type": "object",
                "properties": {
                    "memoryMatch": {
                        "type": "object",
                        "required": ["totalPairs", "correctPairs", "totalClicks", "incorrectClicks"],
                        "properties": {
                            "totalPairs": { "type": "integer", "minimum": 0 },
                            "correctPairs": { "type": "integer", "minimum": 0 },
                            "totalClicks": { "type": "integer", "minimum": 0 },
                            "incorrectClicks": { "type": "integer", "minimum": 0 },
                            "nearbyClicks": { "type": "integer", "minimum": 0 },
                            "timeTakenSeconds": { "type": "number", "minimum": 0 }
                        }
                    },
                    "matchPieces": {
                        "type": "object",
                        "required": ["totalImages", "imagesCompleted"],
                        "properties": {
                            "totalImages": { "type": "integer", "minimum": 0 },
                            "imagesCompleted": { "type": "integer", "minimum": 0 },
                            "perImage": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "required": ["correctPlacements"],
                                    "properties": {
                                        "imageIndex": { "type": "integer" },
                                        "correctPlacements": { "type": "integer", "minimum": 0 },
                                        "swapCount": { "type": "integer", "minimum": 0 },
                                        "moveCount": { "type": "integer", "minimum": 0 }
                                    }
                                }
                            },
                            "totalMoves": { "type": "integer", "minimum": 0 },
                            "timeTakenSeconds": { "type": "number", "minimum": 0 }
                        }
                    }
                }
            },
            "items": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["itemIndex", "selectedAnswer", "isCorrect"],
                    "properties": {
                        "itemIndex": { "type": "integer", "minimum": 0 },
                        "questionId": { "type": "string" },
                        "difficulty": { "enum": ["easy", "medium", "hard"] },
                        "timeSpentSeconds": { "type": "number", "minimum": 0 },
                        "visitCount": { "type": "integer", "minimum": 0 },
                        "hintUsed": { "type": "boolean" },
                        "answerChangeCount": { "type": "integer", "minimum": 0 },
                        "selectedAnswer": { "type": ["integer", "null"] },
                        "correctAnswer": { "type": ["integer", "null"] },
                        "isCorrect": { "type": "boolean" },
                        "timeLimitSeconds": { "type": "number", "minimum": 0 }
                    }
                }
            }
        }
    })
    .to_string()
}

fn output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "ScoreBreakdown",
        "type": "object",
        "required": [
            "sessionId", "subjectId", "assessmentType", "endReason", "dimensionScores",
            "rawScore", "appliedPenalty", "finalScore", "compositeScore", "band",
            "classification", "feedback", "recommendations", "flags", "locale", "engineVersion"
        ],
        "properties": {
            "dimensionScores": {
                "type": "object",
                "additionalProperties": { "type": "number", "minimum": 0, "maximum": 1 }
            },
            "rawScore": { "type": "number", "minimum": 0, "maximum": 1 },
            "appliedPenalty": { "type": "number", "minimum": 0, "maximum": 1 },
            "finalScore": { "type": "number", "minimum": 0, "maximum": 1 },
            "compositeScore": { "type": "integer", "minimum": 0, "maximum": 100 },
            "band": { "enum": ["low", "below_average", "average", "high", "exceptional"] },
            "classification": { "type": "string" },
            "feedback": { "type": "string" },
            "recommendations": { "type": "array", "items": { "type": "string" } },
            "aptitude": { "type": "object" },
            "flags": {
                "type": "array",
                "items": {
                    "enum": ["degenerate_totals", "no_meaningful_interaction", "no_items", "no_attempted_items"]
                }
            },
            "locale": { "enum": ["en", "hi"] },
            "engineVersion": { "type": "string" }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum CogniscoreCliError {
    Io(io::Error),
    Score(ScoreError),
    Json(serde_json::Error),
    NoSessions,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for CogniscoreCliError {
    fn from(e: io::Error) -> Self {
        CogniscoreCliError::Io(e)
    }
}

impl From<ScoreError> for CogniscoreCliError {
    fn from(e: ScoreError) -> Self {
        CogniscoreCliError::Score(e)
    }
}

impl From<serde_json::Error> for CogniscoreCliError {
    fn from(e: serde_json::Error) -> Self {
        CogniscoreCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<CogniscoreCliError> for CliError {
    fn from(e: CogniscoreCliError) -> Self {
        let (code, message, hint) = match e {
            CogniscoreCliError::Io(e) => ("IO_ERROR", e.to_string(), "Check file paths and permissions"),
            CogniscoreCliError::Score(ScoreError::Validation(e)) => (
                "VALIDATION_ERROR",
                e.to_string(),
                "Run 'cogniscore validate' for details",
            ),
            CogniscoreCliError::Score(ScoreError::ConfigError(msg)) => (
                "CONFIG_ERROR",
                msg,
                "Run 'cogniscore doctor --config <file>' to check the configuration",
            ),
            CogniscoreCliError::Score(e) => ("SCORE_ERROR", e.to_string(), "Check the session contents"),
            CogniscoreCliError::Json(e) => ("JSON_ERROR", e.to_string(), "Check JSON syntax"),
            CogniscoreCliError::NoSessions => (
                "NO_SESSIONS",
                "No sessions found in input".to_string(),
                "Ensure input file is not empty",
            ),
            CogniscoreCliError::ValidationFailed(count) => (
                "VALIDATION_FAILED",
                format!("{} sessions failed validation", count),
                "Fix validation errors and retry",
            ),
            CogniscoreCliError::DoctorFailed => (
                "DOCTOR_FAILED",
                "One or more health checks failed".to_string(),
                "Review the doctor report for details",
            ),
        };
        CliError {
            code: code.to_string(),
            message,
            hint: Some(hint.to_string()),
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_sessions: usize,
    valid_sessions: usize,
    invalid_sessions: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    session_id: Option<String>,
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
