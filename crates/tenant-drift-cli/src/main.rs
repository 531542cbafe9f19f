// crates/tenant-drift-cli/src/main.rs
// ============================================================================
// Module: Tenant Drift CLI Entry Point
// Description: Command dispatcher for drift comparison, export, and snapshots.
// Purpose: Drive comparison runs against two Okta tenants from the terminal.
// Dependencies: clap, tenant-drift-config, tenant-drift-core,
// tenant-drift-entities, tenant-drift-okta
// ============================================================================

//! ## Overview
//! `tenant-drift` loads `tenant-drift.toml`, builds one HTTP source per
//! environment, and runs the adapter registry. A comparison report can be
//! printed as text or canonical JSON, saved for later export, and written as
//! CSV. Snapshots inventory a single environment.
//!
//! Exit codes: `0` on success, `1` on failure, `2` when `compare
//! --fail-on-drift` finds at least one difference.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use tenant_drift_cli::i18n::Locale;
use tenant_drift_cli::i18n::set_locale;
use tenant_drift_cli::t;
use tenant_drift_config::AuditConfig;
use tenant_drift_config::AuditSinkKind;
use tenant_drift_config::EnvironmentConfig;
use tenant_drift_config::TenantDriftConfig;
use tenant_drift_core::ComparisonReport;
use tenant_drift_core::DriftAuditSink;
use tenant_drift_core::Environment;
use tenant_drift_core::ExportKind;
use tenant_drift_core::FileAuditSink;
use tenant_drift_core::NoopAuditSink;
use tenant_drift_core::SnapshotReport;
use tenant_drift_core::StderrAuditSink;
use tenant_drift_core::runtime::export::load_report;
use tenant_drift_core::runtime::export::render_text;
use tenant_drift_core::runtime::export::save_report;
use tenant_drift_core::runtime::export::write_text;
use tenant_drift_entities::AdapterRegistry;
use tenant_drift_okta::OktaHttpSource;
use thiserror::Error;

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable selecting the output language.
const LANG_ENV: &str = "TENANT_DRIFT_LANG";

/// Exit code for `compare --fail-on-drift` when differences exist.
const DRIFT_EXIT_CODE: u8 = 2;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "tenant-drift", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Preferred output language (overrides `TENANT_DRIFT_LANG`).
    #[arg(long, value_enum, value_name = "LANG", global = true)]
    lang: Option<LangArg>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Compare Env A against Env B.
    Compare(CompareCommand),
    /// Export CSV from a saved comparison report.
    Export(ExportCommand),
    /// Inventory one environment.
    Snapshot(SnapshotCommand),
    /// List section ids in run order.
    Sections,
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for `compare`.
#[derive(Args, Debug)]
struct CompareCommand {
    /// Config file path (defaults to `TENANT_DRIFT_CONFIG` or `tenant-drift.toml`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Output format for stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Include per-attribute matches in text output.
    #[arg(long, action = ArgAction::SetTrue)]
    show_matches: bool,
    /// Restrict the run to these section ids (repeatable; overrides config).
    #[arg(long = "section", value_name = "ID")]
    sections: Vec<String>,
    /// Save the report as JSON for later export.
    #[arg(long, value_name = "PATH")]
    save: Option<PathBuf>,
    /// Write the differences CSV.
    #[arg(long, value_name = "PATH")]
    differences_csv: Option<PathBuf>,
    /// Write the matches CSV.
    #[arg(long, value_name = "PATH")]
    matches_csv: Option<PathBuf>,
    /// Write the full report CSV.
    #[arg(long, value_name = "PATH")]
    report_csv: Option<PathBuf>,
    /// Exit with status 2 when any difference exists.
    #[arg(long, action = ArgAction::SetTrue)]
    fail_on_drift: bool,
}

/// Arguments for `export`.
#[derive(Args, Debug)]
struct ExportCommand {
    /// Saved report produced by `compare --save`.
    #[arg(long, value_name = "PATH")]
    report: PathBuf,
    /// Which CSV to write.
    #[arg(long, value_enum)]
    kind: ExportKindArg,
    /// Output path (defaults to the conventional file name).
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
}

/// Arguments for `snapshot`.
#[derive(Args, Debug)]
struct SnapshotCommand {
    /// Config file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Environment to inventory.
    #[arg(long, value_enum)]
    env: EnvArg,
    /// Restrict the run to these section ids (repeatable; overrides config).
    #[arg(long = "section", value_name = "ID")]
    sections: Vec<String>,
    /// Write the flattened CSV.
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,
    /// Write the Markdown document.
    #[arg(long, value_name = "PATH")]
    markdown: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a tenant-drift configuration file.
    Validate(ConfigValidateCommand),
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Config file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Supported CLI language selections.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum LangArg {
    /// English.
    En,
    /// Catalan.
    Ca,
}

/// Comparison output formats.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Human-readable sections.
    Text,
    /// Canonical JSON report.
    Json,
}

/// CSV export selections.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum ExportKindArg {
    /// Differences only.
    Differences,
    /// Matches only.
    Matches,
    /// Differences then matches.
    Report,
}

/// Environment selections.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum EnvArg {
    /// Env A.
    A,
    /// Env B.
    B,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for localized error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a localized message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }

    /// Wraps a failure in the run path with the generic message.
    fn unexpected(detail: &Self) -> Self {
        Self::new(format!("{}\n{}", t!("compare.failed"), t!("compare.failed.detail", error = detail)))
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let env_lang = std::env::var(LANG_ENV).ok();
    let locale = resolve_locale(cli.lang, env_lang.as_deref())?;
    set_locale(locale);
    if locale != Locale::En {
        write_stderr_line(&t!("i18n.disclaimer.machine_translated"))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Compare(command) => command_compare(&command),
        Commands::Export(command) => command_export(&command),
        Commands::Snapshot(command) => command_snapshot(&command),
        Commands::Sections => command_sections(),
        Commands::Config {
            command: ConfigCommand::Validate(command),
        } => command_config_validate(&command),
    }
}

/// Prints top-level help.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Compare
// ============================================================================

/// Runs a comparison and writes the requested outputs.
fn command_compare(command: &CompareCommand) -> CliResult<ExitCode> {
    let report = run_compare(command.config.as_deref(), &command.sections)
        .map_err(|err| CliError::unexpected(&err))?;
    if report.timed_out() {
        return Err(CliError::new(t!("compare.timed_out")));
    }
    let rendered = render_report(&report, command.format, command.show_matches)
        .map_err(|err| CliError::unexpected(&err))?;
    write_stdout(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_compare_outputs(command, &report).map_err(|err| CliError::unexpected(&err))?;

    if command.fail_on_drift && report.has_drift() {
        write_stderr_line(&t!("compare.drift", count = report.total_diffs()))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
        return Ok(ExitCode::from(DRIFT_EXIT_CODE));
    }
    Ok(ExitCode::SUCCESS)
}

/// Loads config, builds both sources, and runs the registry.
fn run_compare(config_path: Option<&Path>, sections: &[String]) -> CliResult<ComparisonReport> {
    let config = load_config(config_path)?;
    let source_a = build_source(Environment::A, &config.env_a, &config)?;
    let source_b = build_source(Environment::B, &config.env_b, &config)?;
    let audit = open_audit_sink(&config.audit)?;
    let requested =
        if sections.is_empty() { config.comparison.sections.as_slice() } else { sections };
    AdapterRegistry::builtin()
        .run_comparison(
            &source_a,
            &source_b,
            config.comparison.options(),
            requested,
            audit.as_ref(),
        )
        .map_err(|err| CliError::new(err.to_string()))
}

/// Renders the report for stdout.
fn render_report(
    report: &ComparisonReport,
    format: OutputFormat,
    show_matches: bool,
) -> CliResult<String> {
    match format {
        OutputFormat::Text => Ok(render_text(report, show_matches)),
        OutputFormat::Json => report
            .to_canonical_json()
            .map(|json| format!("{json}\n"))
            .map_err(|err| CliError::new(err.to_string())),
    }
}

/// Writes the saved report and any requested CSV files.
fn write_compare_outputs(command: &CompareCommand, report: &ComparisonReport) -> CliResult<()> {
    if let Some(path) = &command.save {
        save_report(path, report).map_err(|err| write_failed(path, &err))?;
        write_stderr_line(&t!("compare.saved", path = path.display()))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }
    let exports = [
        (ExportKind::Differences, &command.differences_csv),
        (ExportKind::Matches, &command.matches_csv),
        (ExportKind::Report, &command.report_csv),
    ];
    for (kind, path) in exports {
        if let Some(path) = path {
            write_export(kind, report, path)?;
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Export
// ============================================================================

/// Writes a CSV export from a saved report.
fn command_export(command: &ExportCommand) -> CliResult<ExitCode> {
    let report = load_report(&command.report).map_err(|err| {
        CliError::new(t!("export.load_failed", path = command.report.display(), error = err))
    })?;
    let kind = ExportKind::from(command.kind);
    let out = command.out.clone().unwrap_or_else(|| PathBuf::from(kind.default_file_name()));
    write_export(kind, &report, &out)?;
    Ok(ExitCode::SUCCESS)
}

/// Renders one export kind to `path` and reports it on stderr.
fn write_export(kind: ExportKind, report: &ComparisonReport, path: &Path) -> CliResult<()> {
    write_text(path, &kind.render(report)).map_err(|err| write_failed(path, &err))?;
    write_stderr_line(&t!("export.written", kind = export_label(kind), path = path.display()))
        .map_err(|err| CliError::new(output_error("stderr", &err)))
}

/// Returns the localized label for an export kind.
fn export_label(kind: ExportKind) -> String {
    match kind {
        ExportKind::Differences => t!("export.kind.differences"),
        ExportKind::Matches => t!("export.kind.matches"),
        ExportKind::Report => t!("export.kind.report"),
    }
}

// ============================================================================
// SECTION: Snapshot
// ============================================================================

/// Inventories one environment and writes CSV and/or Markdown.
fn command_snapshot(command: &SnapshotCommand) -> CliResult<ExitCode> {
    let snapshot = run_snapshot(command).map_err(|err| CliError::unexpected(&err))?;
    if command.csv.is_none() && command.markdown.is_none() {
        write_stdout(&snapshot.to_markdown())
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }
    if let Some(path) = &command.csv {
        write_snapshot_file(path, &snapshot.to_csv(), &t!("snapshot.csv"))?;
    }
    if let Some(path) = &command.markdown {
        write_snapshot_file(path, &snapshot.to_markdown(), &t!("snapshot.markdown"))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Loads config and runs the registry against the selected environment.
fn run_snapshot(command: &SnapshotCommand) -> CliResult<SnapshotReport> {
    let config = load_config(command.config.as_deref())?;
    let environment = Environment::from(command.env);
    let env_config = match environment {
        Environment::A => &config.env_a,
        Environment::B => &config.env_b,
    };
    let source = build_source(environment, env_config, &config)?;
    let audit = open_audit_sink(&config.audit)?;
    let requested =
        if command.sections.is_empty() { &config.comparison.sections } else { &command.sections };
    AdapterRegistry::builtin()
        .run_snapshot(environment, &source, requested, audit.as_ref())
        .map_err(|err| CliError::new(err.to_string()))
}

/// Writes one snapshot document.
fn write_snapshot_file(path: &Path, contents: &str, label: &str) -> CliResult<()> {
    write_text(path, contents).map_err(|err| write_failed(path, &err))?;
    write_stderr_line(&t!("export.written", kind = label, path = path.display()))
        .map_err(|err| CliError::new(output_error("stderr", &err)))
}

// ============================================================================
// SECTION: Sections and Config
// ============================================================================

/// Lists section ids and titles in run order.
fn command_sections() -> CliResult<ExitCode> {
    for (id, title) in AdapterRegistry::builtin().sections() {
        write_stdout_line(&t!("sections.row", id = id, title = title))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Validates the configuration file without contacting Okta.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let sections = if config.comparison.sections.is_empty() {
        AdapterRegistry::builtin().section_ids().len()
    } else {
        config.comparison.sections.len()
    };
    write_stdout_line(&t!(
        "config.validate.ok",
        env_a = config.env_a.domain,
        env_b = config.env_b.domain,
        sections = sections
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Run Helpers
// ============================================================================

/// Loads and validates configuration.
fn load_config(path: Option<&Path>) -> CliResult<TenantDriftConfig> {
    TenantDriftConfig::load(path).map_err(|err| CliError::new(t!("config.load_failed", error = err)))
}

/// Builds the HTTP source for one environment.
fn build_source(
    environment: Environment,
    env_config: &EnvironmentConfig,
    config: &TenantDriftConfig,
) -> CliResult<OktaHttpSource> {
    let init_failed = |error: String| {
        CliError::new(t!("client.init_failed", env = environment.label(), error = error))
    };
    let credentials = env_config.credentials().map_err(|err| init_failed(err.to_string()))?;
    OktaHttpSource::new(&credentials, config.http.client_config())
        .map_err(|err| init_failed(err.to_string()))
}

/// Opens the configured audit sink.
fn open_audit_sink(config: &AuditConfig) -> CliResult<Box<dyn DriftAuditSink>> {
    match (config.sink, &config.path) {
        (AuditSinkKind::Stderr, _) => Ok(Box::new(StderrAuditSink)),
        (AuditSinkKind::None, _) => Ok(Box::new(NoopAuditSink)),
        (AuditSinkKind::File, Some(path)) => FileAuditSink::new(Path::new(path))
            .map(|sink| Box::new(sink) as Box<dyn DriftAuditSink>)
            .map_err(|err| CliError::new(t!("audit.open_failed", path = path, error = err))),
        (AuditSinkKind::File, None) => Err(CliError::new(t!(
            "audit.open_failed",
            path = "-",
            error = "audit.path is required for the file sink"
        ))),
    }
}

/// Resolves the output locale from the flag or environment.
fn resolve_locale(lang: Option<LangArg>, env_lang: Option<&str>) -> CliResult<Locale> {
    if let Some(lang) = lang {
        return Ok(lang.into());
    }
    if let Some(value) = env_lang {
        return Locale::parse(value).ok_or_else(|| {
            CliError::new(t!("i18n.lang.invalid_env", env = LANG_ENV, value = value))
        });
    }
    Ok(Locale::En)
}

/// Formats a file write failure.
fn write_failed(path: &Path, error: &dyn std::fmt::Display) -> CliError {
    CliError::new(t!("export.write_failed", path = path.display(), error = error))
}

// ============================================================================
// SECTION: Conversions
// ============================================================================

impl From<LangArg> for Locale {
    fn from(value: LangArg) -> Self {
        match value {
            LangArg::En => Self::En,
            LangArg::Ca => Self::Ca,
        }
    }
}

impl From<ExportKindArg> for ExportKind {
    fn from(value: ExportKindArg) -> Self {
        match value {
            ExportKindArg::Differences => Self::Differences,
            ExportKindArg::Matches => Self::Matches,
            ExportKindArg::Report => Self::Report,
        }
    }
}

impl From<EnvArg> for Environment {
    fn from(value: EnvArg) -> Self {
        match value {
            EnvArg::A => Self::A,
            EnvArg::B => Self::B,
        }
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes text to stdout, adding a newline only when missing.
fn write_stdout(text: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a localized output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
