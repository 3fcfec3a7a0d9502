use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use batthealth_core::{
    Error as DecodeFailure, InputEvent, JsonEventSource, Response, ValidationError,
    ValidationPolicy, handle_events, parse_battery_health,
};
use clap::{ArgAction, Args, Parser, Subcommand};
use glob::glob;
use serde::Serialize;

const MAX_TIME: u64 = (1 << 36) - 1;

#[derive(Parser, Debug)]
#[command(name = "batthealth")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BATTHEALTH_BUILD_COMMIT"), ")"))]
#[command(
    about = "Decode battery pack status payloads into validated health records.",
    long_about = None,
    after_help = "Examples:\n  batthealth payload decode F1E6E63676C75000 --device device_1\n  batthealth event handle events.jsonl -o responses.json\n  batthealth event process 'captures/*.json' --stdout --pretty"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on a single hex payload.
    Payload {
        #[command(subcommand)]
        command: PayloadCommands,
    },
    /// Operations on JSON request events (direct or HTTP-gateway envelopes).
    Event {
        #[command(subcommand)]
        command: EventCommands,
    },
}

#[derive(Subcommand, Debug)]
enum PayloadCommands {
    /// Decode one 16-digit hex payload and print the health record as JSON.
    #[command(
        after_help = "Examples:\n  batthealth payload decode F1E6E63676C75000 --device device_1\n  batthealth payload decode 9164293726C85400 -d device_2 --pretty"
    )]
    Decode {
        /// Payload as 16 hex digits
        payload: String,

        /// Device identifier copied into the record
        #[arg(short, long, default_value = "")]
        device: String,

        #[command(flatten)]
        format: FormatArgs,

        #[command(flatten)]
        policy: PolicyArgs,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,
    },
}

#[derive(Subcommand, Debug)]
enum EventCommands {
    /// Handle every event in a JSON file and write the responses as a JSON array.
    #[command(alias = "process")]
    #[command(
        after_help = "Examples:\n  batthealth event handle events.jsonl -o responses.json\n  batthealth event process request.json --stdout --pretty"
    )]
    Handle {
        /// Path (or glob matching one file) to .json/.jsonl/.ndjson events
        input: PathBuf,

        /// Output path for the responses (JSON)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        output: Option<PathBuf>,

        /// Write responses to stdout
        #[arg(long, conflicts_with = "output")]
        stdout: bool,

        #[command(flatten)]
        format: FormatArgs,

        #[command(flatten)]
        policy: PolicyArgs,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,

        /// Exit with a non-zero code if any event was rejected
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Args, Debug)]
struct FormatArgs {
    /// Pretty-print JSON output
    #[arg(long, conflicts_with = "compact")]
    pretty: bool,

    /// Compact JSON output (default)
    #[arg(long)]
    compact: bool,
}

#[derive(Args, Debug)]
struct PolicyArgs {
    /// Reject events with an empty device identifier
    #[arg(long)]
    require_device: bool,

    /// Reject records whose time is before this Unix timestamp
    #[arg(long, value_name = "SECONDS")]
    min_time: Option<u64>,

    /// Reject records whose time is after this Unix timestamp
    #[arg(long, value_name = "SECONDS")]
    max_time: Option<u64>,
}

impl PolicyArgs {
    fn to_policy(&self) -> Result<ValidationPolicy, CliError> {
        let mut policy = ValidationPolicy::default();
        if self.require_device {
            policy = policy.strict_device();
        }
        if self.min_time.is_some() || self.max_time.is_some() {
            let min = self.min_time.unwrap_or(0);
            let max = self.max_time.unwrap_or(MAX_TIME);
            if min > max {
                return Err(CliError::new(
                    format!("invalid time range: {min} > {max}"),
                    Some("--min-time must not exceed --max-time".to_string()),
                ));
            }
            policy = policy.with_time_range(min..=max);
        }
        Ok(policy)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Payload { command } => match command {
            PayloadCommands::Decode {
                payload,
                device,
                format,
                policy,
                quiet,
            } => cmd_payload_decode(device, payload, &format, &policy, quiet),
        },
        Commands::Event { command } => match command {
            EventCommands::Handle {
                input,
                output,
                stdout,
                format,
                policy,
                quiet,
                strict,
            } => cmd_event_handle(input, output, stdout, &format, &policy, quiet, strict),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{:#}", err), None)
    }
}

fn cmd_payload_decode(
    device: String,
    payload: String,
    format: &FormatArgs,
    policy: &PolicyArgs,
    quiet: bool,
) -> Result<(), CliError> {
    let policy = policy.to_policy()?;
    let event = InputEvent { device, payload };
    log::info!("decoding payload {} for device {:?}", event.payload, event.device);

    let record = parse_battery_health(&event, &policy).map_err(|err| {
        CliError::new(
            format!("failed to decode payload: {}", err),
            Some(decode_hint(&err).to_string()),
        )
    })?;
    let json = serialize_json(&record, format)?;
    println!("{}", json);

    if !quiet {
        let at = record
            .time_rfc3339()
            .unwrap_or_else(|| record.time.to_string());
        eprintln!("OK: {} state={} at {}", record.device, record.state, at);
    }
    Ok(())
}

fn decode_hint(err: &DecodeFailure) -> &'static str {
    match err {
        DecodeFailure::Validation(ValidationError::EmptyDevice) => {
            "pass --device with a non-empty id, or drop --require-device"
        }
        DecodeFailure::Validation(ValidationError::InvalidStateCode { .. }) => {
            "the state nibble (high half of byte 4) must be between 0 and 8"
        }
        DecodeFailure::Validation(
            ValidationError::OutOfRange { .. } | ValidationError::TimeOutOfRange { .. },
        ) => "the payload decodes, but a field is outside its allowed range",
        _ => "expected exactly 16 hex digits (0-9, A-F) encoding an 8-byte status record",
    }
}

fn cmd_event_handle(
    input: PathBuf,
    output: Option<PathBuf>,
    stdout: bool,
    format: &FormatArgs,
    policy: &PolicyArgs,
    quiet: bool,
    strict: bool,
) -> Result<(), CliError> {
    let policy = policy.to_policy()?;
    let resolved_input = resolve_input_path(&input)?;
    validate_input_file(&resolved_input)?;
    let input_abs = fs::canonicalize(&resolved_input)
        .with_context(|| format!("Failed to resolve input path: {}", resolved_input.display()))?;
    let output = if stdout {
        None
    } else {
        Some(output.ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--output or --stdout".to_string()),
            )
        })?)
    };

    if let Some(output_path) = output.as_ref() {
        let output_dir = output_path
            .parent()
            .map(|parent| {
                if parent.as_os_str().is_empty() {
                    fs::canonicalize(".")
                } else {
                    fs::canonicalize(parent)
                }
            })
            .transpose()
            .with_context(|| format!("Failed to resolve output path: {}", output_path.display()))?;
        if let Some(output_dir) = output_dir {
            let output_target = output_dir.join(
                output_path
                    .file_name()
                    .ok_or_else(|| anyhow::anyhow!("Invalid output path"))?,
            );
            if output_target == input_abs {
                return Err(CliError::new(
                    format!(
                        "output path must differ from input: {}",
                        output_path.display()
                    ),
                    Some("choose a different output path".to_string()),
                ));
            }
        }
    }

    let source = JsonEventSource::open(&resolved_input)
        .with_context(|| format!("Failed to open events: {}", resolved_input.display()))?;
    let responses = handle_events(source, &policy).map_err(|err| {
        CliError::new(
            format!("failed to read events: {}", err),
            Some(
                "each event must be a JSON object; separate events by whitespace or newlines"
                    .to_string(),
            ),
        )
    })?;
    let json = serialize_json(&responses, format)?;

    match output {
        None => println!("{}", json),
        Some(output) => {
            if let Some(parent) = output.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create output directory: {}", parent.display())
                    })?;
                }
            }
            fs::write(&output, json)
                .with_context(|| format!("Failed to write responses: {}", output.display()))?;
            if !quiet {
                eprintln!(
                    "OK: {} responses written -> {}",
                    responses.len(),
                    output.display()
                );
            }
        }
    }

    let rejected = count_rejected(&responses);
    if strict && rejected > 0 {
        return Err(CliError::new(
            format!("{} of {} events rejected", rejected, responses.len()),
            Some("inspect the statusCode and details of each response".to_string()),
        ));
    }
    Ok(())
}

fn serialize_json<T: Serialize + ?Sized>(
    value: &T,
    format: &FormatArgs,
) -> Result<String, CliError> {
    if format.pretty && format.compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if format.pretty {
        serde_json::to_string_pretty(value)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(value)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn count_rejected(responses: &[Response]) -> usize {
    responses.iter().filter(|r| !r.is_success()).count()
}

fn validate_input_file(input: &PathBuf) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .json, .jsonl or .ndjson file".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .json, .jsonl or .ndjson file".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if !matches!(ext.as_str(), "json" | "jsonl" | "ndjson") {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .json, .jsonl or .ndjson file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &PathBuf) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.clone());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    if matches.is_empty() {
        return Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected .json or .jsonl".to_string()),
        ));
    }
    if matches.len() > 1 {
        let listed = matches
            .iter()
            .take(3)
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let more = if matches.len() > 3 { ", ..." } else { "" };
        return Err(CliError::new(
            format!(
                "multiple files match pattern '{}' ({} matches); matches: {}{}",
                pattern,
                matches.len(),
                listed,
                more
            ),
            Some("pass a single events file, or run once per file".to_string()),
        ));
    }

    Ok(matches.remove(0))
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
