use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use glob::glob;
use log::{LevelFilter, debug};
use protolens_core::decode::{DEFAULT_MAX_DEPTH, DecodeErrorKind, DecodeFailure, DecodeOptions};
use protolens_core::{
    ByteRegion, InspectReport, Schema, find_region_by_byte, find_regions_by_path, inspect_bytes,
    load_schema_file, regions_containing,
};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("PROTOLENS_BUILD_COMMIT"),
    ", built ",
    env!("PROTOLENS_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "protolens")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Decode protobuf wire data against a schema and map every byte to the field that produced it.",
    long_about = None,
    after_help = "Examples:\n  protolens decode person.bin --schema person.json -o report.json\n  protolens lookup person.bin --schema person.json --byte 14\n  protolens types --schema person.json"
)]
struct Cli {
    /// Log decoder progress (debug level) to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Path to the encoded message (glob patterns must match one file)
    input: PathBuf,

    /// JSON schema descriptor
    #[arg(short, long)]
    schema: PathBuf,

    /// Root message type (defaults to the descriptor's "root")
    #[arg(short = 't', long = "type")]
    root_type: Option<String>,

    /// Input is hexadecimal text instead of raw bytes
    #[arg(long)]
    hex: bool,

    /// Deepest nested message accepted
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode an input buffer and write a versioned JSON report.
    #[command(alias = "inspect")]
    #[command(
        after_help = "Examples:\n  protolens decode person.bin --schema person.json -o report.json\n  protolens inspect person.hex --hex --schema person.json --stdout --pretty"
    )]
    Decode {
        #[command(flatten)]
        input: InputArgs,

        /// Output report path (JSON)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        report: Option<PathBuf>,

        /// Write JSON report to stdout
        #[arg(long, conflicts_with = "report")]
        stdout: bool,

        /// Pretty-print JSON output
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Compact JSON output (default)
        #[arg(long)]
        compact: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,
    },
    /// Find the field behind a byte offset, or the bytes behind a field path.
    #[command(
        after_help = "Examples:\n  protolens lookup person.bin --schema person.json --byte 14\n  protolens lookup person.bin --schema person.json --path 'addresses[0].city'"
    )]
    Lookup {
        #[command(flatten)]
        input: InputArgs,

        /// Absolute byte offset to resolve
        #[arg(long, required_unless_present = "path", conflicts_with = "path")]
        byte: Option<usize>,

        /// Exact field path to resolve
        #[arg(long)]
        path: Option<String>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// List the message types of a schema.
    Types {
        /// JSON schema descriptor
        #[arg(short, long)]
        schema: PathBuf,

        /// Only list types reachable from this message
        #[arg(long)]
        root: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Decode {
            input,
            report,
            stdout,
            pretty,
            compact,
            quiet,
        } => cmd_decode(input, report, stdout, pretty, compact, quiet),
        Commands::Lookup {
            input,
            byte,
            path,
            pretty,
        } => cmd_lookup(input, byte, path, pretty),
        Commands::Types { schema, root } => cmd_types(&schema, root.as_deref()),
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

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
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

impl From<DecodeFailure> for CliError {
    fn from(err: DecodeFailure) -> Self {
        let hint = match &err.kind {
            DecodeErrorKind::DepthLimitExceeded { .. } => {
                Some("raise --max-depth if the nesting is expected".to_string())
            }
            DecodeErrorKind::UnknownRootType { .. } => {
                Some("run `protolens types --schema <file>` to list message types".to_string())
            }
            DecodeErrorKind::OutOfBounds { .. } | DecodeErrorKind::BoundaryMismatch { .. } => {
                Some("check that the input is a single message of the chosen type".to_string())
            }
            DecodeErrorKind::Wire(_) => None,
        };
        CliError::new(err.to_string(), hint)
    }
}

/// Schema, root type and bytes shared by `decode` and `lookup`.
struct Loaded {
    schema: Schema,
    root_type: String,
    input: PathBuf,
    buffer: Vec<u8>,
    options: DecodeOptions,
}

impl Loaded {
    fn inspect(&self) -> Result<InspectReport, CliError> {
        let mut report = inspect_bytes(
            &self.schema,
            &self.root_type,
            &self.input.display().to_string(),
            &self.buffer,
            self.options,
        )?;
        report.generated_at = now_rfc3339();
        Ok(report)
    }
}

fn load(args: InputArgs) -> Result<Loaded, CliError> {
    let input = resolve_input_path(&args.input)?;
    validate_input_file(&input)?;
    let schema = load_schema(&args.schema)?;
    let root_type = match args.root_type.or_else(|| schema.default_root().map(str::to_string)) {
        Some(root_type) => root_type,
        None => {
            return Err(CliError::new(
                "no root message type",
                Some("pass --type or set \"root\" in the schema descriptor".to_string()),
            ));
        }
    };
    let buffer = read_input(&input, args.hex)?;
    debug!(
        "loaded {} ({} bytes), root type {}",
        input.display(),
        buffer.len(),
        root_type
    );
    Ok(Loaded {
        schema,
        root_type,
        input,
        buffer,
        options: DecodeOptions {
            max_depth: args.max_depth,
        },
    })
}

fn cmd_decode(
    input: InputArgs,
    report: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    compact: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let report_path = if stdout {
        None
    } else {
        Some(report.ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            )
        })?)
    };

    let loaded = load(input)?;
    if let Some(report_path) = report_path.as_ref() {
        ensure_distinct_output(&loaded.input, report_path)?;
    }

    let rep = loaded.inspect()?;
    let json = serialize_json(&rep, pretty, compact)?;

    let Some(report_path) = report_path else {
        print!("{}", json);
        return Ok(());
    };

    if let Some(parent) = report_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    fs::write(&report_path, json)
        .with_context(|| format!("Failed to write report: {}", report_path.display()))?;

    if !quiet {
        eprintln!(
            "OK: {} regions -> {}",
            rep.regions.len(),
            report_path.display()
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct ByteLookup<'r> {
    byte: usize,
    region: &'r ByteRegion,
    /// Containing regions, outermost first, including `region`.
    enclosing: Vec<&'r ByteRegion>,
}

fn cmd_lookup(
    input: InputArgs,
    byte: Option<usize>,
    path: Option<String>,
    pretty: bool,
) -> Result<(), CliError> {
    let loaded = load(input)?;
    let rep = loaded.inspect()?;

    let json = match (byte, path) {
        (Some(byte), _) => {
            let region = find_region_by_byte(&rep.regions, byte).ok_or_else(|| {
                CliError::new(
                    format!("no region contains byte {}", byte),
                    Some(format!(
                        "the input is {} bytes; offsets start at 0",
                        loaded.buffer.len()
                    )),
                )
            })?;
            let lookup = ByteLookup {
                byte,
                region,
                enclosing: regions_containing(&rep.regions, byte),
            };
            serialize_json(&lookup, pretty, !pretty)?
        }
        (None, Some(path)) => {
            let matches = find_regions_by_path(&rep.regions, &path);
            if matches.is_empty() {
                return Err(CliError::new(
                    format!("no region has path '{}'", path),
                    Some("paths look like name, home.city or addresses[0].city".to_string()),
                ));
            }
            serialize_json(&matches, pretty, !pretty)?
        }
        (None, None) => {
            return Err(CliError::new(
                "nothing to look up",
                Some("use --byte or --path".to_string()),
            ));
        }
    };
    println!("{}", json);
    Ok(())
}

fn cmd_types(schema_path: &Path, root: Option<&str>) -> Result<(), CliError> {
    let schema = load_schema(schema_path)?;
    let names: Vec<&str> = match root.or(schema.default_root()) {
        Some(root) => schema.reachable_messages(root).map_err(|err| {
            CliError::new(
                err.to_string(),
                Some("omit --root to list every message type".to_string()),
            )
        })?,
        None => schema.message_names().collect(),
    };
    for name in names {
        println!("{}", name);
    }
    Ok(())
}

fn load_schema(path: &Path) -> Result<Schema, CliError> {
    if !path.is_file() {
        return Err(CliError::new(
            format!("schema file not found: {}", path.display()),
            Some("pass a JSON descriptor with --schema".to_string()),
        ));
    }
    load_schema_file(path).map_err(|err| {
        CliError::new(
            format!("invalid schema {}: {}", path.display(), err),
            Some("expected {\"messages\": [...], \"enums\": [...]}".to_string()),
        )
    })
}

fn read_input(path: &Path, hex_text: bool) -> Result<Vec<u8>, CliError> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read input file: {}", path.display()))?;
    if !hex_text {
        return Ok(bytes);
    }
    let digits: String = String::from_utf8_lossy(&bytes)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    hex::decode(&digits).map_err(|err| {
        CliError::new(
            format!("input is not valid hex: {}", err),
            Some("drop --hex for raw binary input".to_string()),
        )
    })
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| protolens_core::DEFAULT_GENERATED_AT.to_string())
}

fn serialize_json<T: Serialize + ?Sized>(
    value: &T,
    pretty: bool,
    compact: bool,
) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(value)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(value)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn ensure_distinct_output(input: &Path, report_path: &Path) -> Result<(), CliError> {
    let input_abs = fs::canonicalize(input)
        .with_context(|| format!("Failed to resolve input path: {}", input.display()))?;
    let report_dir = match report_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::canonicalize(parent),
        _ => fs::canonicalize("."),
    };
    // A missing output directory is created later and cannot alias the input.
    let Ok(report_dir) = report_dir else {
        return Ok(());
    };
    let file_name = report_path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid report path"))?;
    if report_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!(
                "report path must differ from input: {}",
                report_path.display()
            ),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("pass a file holding one encoded message".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("pass a file holding one encoded message".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
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
            Some("check the path or quote the pattern".to_string()),
        ));
    }
    if matches.len() > 1 {
        let mut message = format!(
            "multiple files match pattern '{}' ({} matches)",
            pattern,
            matches.len()
        );
        let listed: Vec<_> = matches
            .iter()
            .take(3)
            .map(|p| p.display().to_string())
            .collect();
        message.push_str("; matches: ");
        message.push_str(&listed.join(", "));
        if matches.len() > 3 {
            message.push_str(", ...");
        }
        return Err(CliError::new(
            message,
            Some("pass a single input file, or run once per file".to_string()),
        ));
    }

    Ok(matches.remove(0))
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
