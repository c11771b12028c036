use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use glob::glob;
use log::LevelFilter;

use seqshark_core::{
    AnalysisOptions, BucketStatus, Engine, EngineConfig, GroupSelection, RecordSource, Report,
    TsharkDecoder, analyze_capture_file, available_groups, filter_malformed, open_capture,
};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("SEQSHARK_BUILD_COMMIT"),
    ", ",
    env!("SEQSHARK_BUILD_DATE"),
    ")"
);

const EXAMPLES: &str = "Examples:\n  seqshark capture analyse export.csv -o report.json\n  seqshark capture analyze capture.pcapng --group 239.50.1.1 --stdout\n  seqshark capture analyse 'day1/*.csv' --out-dir reports\n  seqshark capture groups capture.pcapng";

#[derive(Parser, Debug)]
#[command(name = "seqshark")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Offline sequence-integrity analyzer for multicast UDP captures.",
    long_about = None,
    after_help = EXAMPLES
)]
struct Cli {
    /// Log verbosity (overrides RUST_LOG)
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on captures and decoder exports.
    Capture {
        #[command(subcommand)]
        command: CaptureCommands,
    },
}

#[derive(Subcommand, Debug)]
enum CaptureCommands {
    /// Check payload sequence numbers per group and source and write a JSON report.
    #[command(alias = "analyze")]
    #[command(after_help = EXAMPLES)]
    Analyse(AnalyseArgs),
    /// List the multicast groups present after malformed-packet filtering.
    Groups(GroupsArgs),
}

#[derive(Args, Debug)]
struct AnalyseArgs {
    /// Capture (.pcap/.pcapng) or decoder export (.csv); glob patterns allowed
    #[arg(required = true, value_name = "INPUT")]
    inputs: Vec<PathBuf>,

    /// Output report path (JSON)
    #[arg(short = 'o', long, conflicts_with_all = ["stdout", "out_dir"])]
    report: Option<PathBuf>,

    /// Write JSON report to stdout
    #[arg(long, conflicts_with = "out_dir")]
    stdout: bool,

    /// Write one `<stem>.json` report per input into this directory
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Restrict analysis to this destination group (repeatable)
    #[arg(long = "group", value_name = "GROUP")]
    groups: Vec<String>,

    #[command(flatten)]
    engine: EngineArgs,

    /// Include the malformed-packet audit table in the report
    #[arg(long)]
    keep_malformed: bool,

    /// Pretty-print JSON output
    #[arg(long, conflicts_with = "compact")]
    pretty: bool,

    /// Compact JSON output (default)
    #[arg(long)]
    compact: bool,

    /// Suppress non-error output
    #[arg(long)]
    quiet: bool,

    /// Exit with a non-zero code if any bucket has sequence anomalies
    #[arg(long)]
    strict: bool,

    /// List every gap and duplicate after analysis
    #[arg(long)]
    list_gaps: bool,
}

#[derive(Args, Debug)]
struct GroupsArgs {
    /// Capture (.pcap/.pcapng) or decoder export (.csv)
    input: PathBuf,

    #[command(flatten)]
    engine: EngineArgs,
}

/// Engine configuration file, per-flag overrides and the external decoder.
#[derive(Args, Debug)]
struct EngineArgs {
    /// JSON engine configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Destination prefix of the groups of interest
    #[arg(long, value_name = "PREFIX")]
    multicast_prefix: Option<String>,

    /// Hex marker of the known short malformed frame
    #[arg(long, value_name = "HEX")]
    malformed_marker: Option<String>,

    /// Marked frames up to this length are malformed
    #[arg(long, value_name = "BYTES")]
    malformed_max_length: Option<u64>,

    /// Byte offset of the 4-byte sequence number in the payload
    #[arg(long, value_name = "BYTES")]
    sequence_offset: Option<usize>,

    /// tshark binary used to decode .pcap/.pcapng inputs
    #[arg(long, value_name = "PATH", default_value = "tshark")]
    tshark: PathBuf,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Capture { command } => match command {
            CaptureCommands::Analyse(args) => {
                init_logging(cli.log_level, args.quiet);
                cmd_capture_analyse(args)
            }
            CaptureCommands::Groups(args) => {
                init_logging(cli.log_level, false);
                cmd_capture_groups(args)
            }
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

fn init_logging(level: Option<LogLevel>, quiet: bool) {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("warn"));
    if quiet {
        builder.filter_level(LevelFilter::Error);
    } else if let Some(level) = level {
        builder.filter_level(level.into());
    }
    builder.format_timestamp(None);
    let _ = builder.try_init();
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

/// Where one report goes.
enum ReportSink {
    Stdout,
    File(PathBuf),
}

fn cmd_capture_analyse(args: AnalyseArgs) -> Result<(), CliError> {
    let inputs = resolve_inputs(&args.inputs)?;
    for input in &inputs {
        validate_input_file(input)?;
    }
    let sinks = plan_outputs(&args, &inputs)?;
    let engine = build_engine(&args.engine)?;
    let options = AnalysisOptions {
        selection: if args.groups.is_empty() {
            GroupSelection::All
        } else {
            GroupSelection::only(args.groups.iter().cloned())
        },
        keep_malformed: args.keep_malformed,
        decoder: TsharkDecoder::new(&args.engine.tshark),
    };

    let mut anomalies = false;
    for (input, sink) in inputs.iter().zip(sinks) {
        let rep = analyze_capture_file(input, &engine, &options)
            .with_context(|| format!("analysis failed for {}", input.display()))?;
        let json = serialize_report(&rep, args.pretty, args.compact)?;

        match &sink {
            ReportSink::Stdout => print!("{}", json),
            ReportSink::File(path) => write_report(path, &json)?,
        }
        if args.list_gaps && !args.quiet {
            print_gaps(input, &rep);
        }
        if let ReportSink::File(path) = &sink {
            if !args.quiet {
                eprintln!("OK: report written -> {}", path.display());
            }
        }
        anomalies |= has_anomalies(&rep);
    }

    if args.strict && anomalies {
        return Err(CliError::new(
            "sequence anomalies detected",
            Some("use --list-gaps to inspect".to_string()),
        ));
    }
    Ok(())
}

fn cmd_capture_groups(args: GroupsArgs) -> Result<(), CliError> {
    let mut inputs = resolve_inputs(std::slice::from_ref(&args.input))?;
    if inputs.len() > 1 {
        return Err(CliError::new(
            format!(
                "multiple files match '{}' ({} matches)",
                args.input.display(),
                inputs.len()
            ),
            Some("pass a single capture file".to_string()),
        ));
    }
    let input = inputs.remove(0);
    validate_input_file(&input)?;
    let engine = build_engine(&args.engine)?;

    let mut source = open_capture(&input, &TsharkDecoder::new(&args.engine.tshark))
        .with_context(|| format!("failed to open {}", input.display()))?;
    let mut records = Vec::new();
    while let Some(record) = source
        .next_record()
        .with_context(|| format!("failed to read {}", input.display()))?
    {
        records.push(record);
    }

    let outcome = filter_malformed(&engine, records);
    for group in available_groups(&outcome.accepted) {
        println!("{}", group);
    }
    Ok(())
}

/// Pick a sink per input and reject output paths that would clobber an input.
fn plan_outputs(args: &AnalyseArgs, inputs: &[PathBuf]) -> Result<Vec<ReportSink>, CliError> {
    if let Some(dir) = &args.out_dir {
        let mut seen = BTreeSet::new();
        let mut sinks = Vec::with_capacity(inputs.len());
        for input in inputs {
            let stem = input.file_stem().ok_or_else(|| {
                CliError::new(format!("invalid input path: {}", input.display()), None)
            })?;
            let target = dir.join(format!("{}.json", stem.to_string_lossy()));
            if !seen.insert(target.clone()) {
                return Err(CliError::new(
                    format!("two inputs map to the same report: {}", target.display()),
                    Some("rename the inputs or run once per directory".to_string()),
                ));
            }
            ensure_distinct(&target, inputs)?;
            sinks.push(ReportSink::File(target));
        }
        return Ok(sinks);
    }

    if inputs.len() > 1 {
        return Err(CliError::new(
            format!("{} inputs given but only one report path", inputs.len()),
            Some("use --out-dir to write one report per input".to_string()),
        ));
    }
    if args.stdout {
        return Ok(vec![ReportSink::Stdout]);
    }
    let report = args.report.clone().ok_or_else(|| {
        CliError::new(
            "missing output path",
            Some("use -o/--report, --stdout or --out-dir".to_string()),
        )
    })?;
    ensure_distinct(&report, inputs)?;
    Ok(vec![ReportSink::File(report)])
}

fn ensure_distinct(report_path: &Path, inputs: &[PathBuf]) -> Result<(), CliError> {
    let Some(file_name) = report_path.file_name() else {
        return Err(CliError::new(
            format!("invalid report path: {}", report_path.display()),
            None,
        ));
    };
    let parent = match report_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    // a directory that does not exist yet cannot hold an input
    let Ok(report_dir) = fs::canonicalize(parent) else {
        return Ok(());
    };
    let report_target = report_dir.join(file_name);

    for input in inputs {
        let input_abs = fs::canonicalize(input)
            .with_context(|| format!("Failed to resolve input path: {}", input.display()))?;
        if report_target == input_abs {
            return Err(CliError::new(
                format!(
                    "report path must differ from input: {}",
                    report_path.display()
                ),
                Some("choose a different output path".to_string()),
            ));
        }
    }
    Ok(())
}

fn build_engine(args: &EngineArgs) -> Result<Engine, CliError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    if let Some(prefix) = &args.multicast_prefix {
        config.multicast_prefix = prefix.clone();
    }
    if let Some(marker) = &args.malformed_marker {
        config.malformed_marker_hex = marker.clone();
    }
    if let Some(length) = args.malformed_max_length {
        config.malformed_max_length = length;
    }
    if let Some(offset) = args.sequence_offset {
        config.sequence_byte_offset = offset;
    }
    log::debug!("engine configuration: {:?}", config);

    Engine::new(config).map_err(|err| {
        CliError::new(
            format!("invalid configuration: {}", err),
            Some("check --config and the override flags".to_string()),
        )
    })
}

fn load_config(path: &Path) -> Result<EngineConfig, CliError> {
    let json = fs::read_to_string(path).map_err(|err| {
        CliError::new(
            format!("failed to read config {}: {}", path.display(), err),
            Some("pass an existing JSON file to --config".to_string()),
        )
    })?;
    serde_json::from_str(&json).map_err(|err| {
        CliError::new(
            format!("invalid config {}: {}", path.display(), err),
            Some("expected a JSON object with engine settings".to_string()),
        )
    })
}

fn write_report(report: &Path, json: &str) -> Result<(), CliError> {
    if let Some(parent) = report.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    fs::write(report, json)
        .with_context(|| format!("Failed to write report: {}", report.display()))?;
    Ok(())
}

fn serialize_report(rep: &Report, pretty: bool, compact: bool) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn has_anomalies(rep: &Report) -> bool {
    rep.summary
        .iter()
        .any(|row| row.status == BucketStatus::AnomaliesDetected)
}

fn print_gaps(input: &Path, rep: &Report) {
    eprintln!("Sequence anomalies in {}:", input.display());
    let mut any = false;
    for row in rep.summary.iter().filter(|row| !row.gaps.is_empty()) {
        let source = row.source.as_deref().unwrap_or("-");
        for gap in &row.gaps {
            any = true;
            eprintln!(
                "  {} from {} No. {}: expected {}, got {} ({}, missing {})",
                row.destination,
                source,
                gap.frame_number,
                gap.expected,
                gap.actual,
                gap.kind,
                gap.missing
            );
        }
    }
    if !any {
        eprintln!("  none");
    }
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .pcap/.pcapng capture or a .csv decoder export".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .pcap/.pcapng capture or a .csv decoder export".to_string()),
        ));
    }
    Ok(())
}

/// Expand glob patterns; plain paths pass through for later validation.
fn resolve_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, CliError> {
    let mut resolved = Vec::new();
    for input in inputs {
        let pattern = input.to_string_lossy();
        if !is_glob_pattern(&pattern) {
            resolved.push(input.clone());
            continue;
        }

        let paths = glob(&pattern).map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err.msg)),
            )
        })?;
        let mut matches = Vec::new();
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
        resolved.extend(matches);
    }
    Ok(resolved)
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
