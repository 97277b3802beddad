// crates/sdm-cli/src/main.rs
// ============================================================================
// Module: SDM CLI Entry Point
// Description: Command dispatcher for the SDM repository generator.
// Purpose: Generate, check, and serve SDM artifacts from descriptor JSON.
// Dependencies: clap, sdm-cli, sdm-codegen, sdm-config, tracing
// ============================================================================

//! ## Overview
//! `sdm` reads descriptor JSON, derives the sensitive table, audit table, and
//! view for every message, and writes the selected backend output:
//! - `sdm config` writes a commented `sdm.toml`.
//! - `sdm generate` writes generated files atomically.
//! - `sdm check` fails when files on disk differ from generated output.
//! - `sdm plugin` speaks the JSON request/response protocol on stdio.
//!
//! Logs go to stderr; stdout carries only plugin responses.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use sdm_cli::CliError;
use sdm_cli::CliResult;
use sdm_cli::inputs::load_extra_files;
use sdm_cli::inputs::load_schema_files;
use sdm_cli::logging::init_logging;
use sdm_cli::output::check_outputs;
use sdm_cli::output::write_output;
use sdm_cli::output::write_outputs;
use sdm_codegen::BackendKind;
use sdm_codegen::GeneratedFile;
use sdm_codegen::Generator;
use sdm_codegen::merge_extra_files;
use sdm_codegen::protocol::run_plugin;
use sdm_config::DEFAULT_CONFIG_NAME;
use sdm_config::SdmConfig;
use sdm_config::config_template;
use tracing::error;
use tracing::info;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "sdm", version, about = "Sensitive data model repository generator")]
struct Cli {
    /// Raise SDM log output to debug (ignored when `SDM_LOG` or `RUST_LOG` is set).
    #[arg(long, short, global = true)]
    verbose: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a commented `sdm.toml` template.
    Config(ConfigCommand),
    /// Generate files from descriptor JSON.
    Generate(GenerateArgs),
    /// Verify generated files on disk are up to date.
    Check(GenerateArgs),
    /// Run as a plugin: JSON request on stdin, JSON response on stdout.
    Plugin(PluginCommand),
}

/// Arguments for `sdm config`.
#[derive(Args, Debug)]
struct ConfigCommand {
    /// Destination path.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_NAME)]
    path: PathBuf,
    /// Overwrite an existing file.
    #[arg(long)]
    force: bool,
}

/// Arguments shared by `sdm generate` and `sdm check`.
#[derive(Args, Debug, Clone, Default)]
struct GenerateArgs {
    /// Config file (defaults to `SDM_CONFIG`, then `sdm.toml`).
    #[arg(long = "cfg", value_name = "PATH")]
    config: Option<PathBuf>,
    /// Descriptor JSON file; repeatable. Overrides `schema_files`.
    #[arg(long = "schema", value_name = "FILE")]
    schemas: Vec<PathBuf>,
    /// Output directory. Overrides `output`.
    #[arg(long = "out", value_name = "DIR")]
    out: Option<PathBuf>,
    /// Extra-file JSON list; repeatable. Overrides `extra_files`.
    #[arg(long = "extra", value_name = "FILE")]
    extras: Vec<PathBuf>,
    /// Comma-separated backends (`sql,rust`). Overrides `backends`.
    #[arg(long, value_name = "LIST")]
    backends: Option<String>,
}

/// Arguments for `sdm plugin`.
#[derive(Args, Debug)]
struct PluginCommand {
    /// Config file supplying naming and default backends.
    #[arg(long = "cfg", value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_logging(cli.verbose) {
        return report_error(&err);
    }
    match run(cli.command) {
        Ok(code) => code,
        Err(err) => report_error(&err),
    }
}

/// Executes the selected subcommand.
fn run(command: Commands) -> CliResult<ExitCode> {
    match command {
        Commands::Config(command) => command_config(&command),
        Commands::Generate(args) => command_generate(&args),
        Commands::Check(args) => command_check(&args),
        Commands::Plugin(command) => command_plugin(&command),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Writes the config template.
fn command_config(command: &ConfigCommand) -> CliResult<ExitCode> {
    if command.path.exists() && !command.force {
        return Err(CliError::Exists(command.path.display().to_string()));
    }
    write_output(&command.path, &config_template())?;
    info!(path = %command.path.display(), "wrote config template");
    Ok(ExitCode::SUCCESS)
}

/// Generates and writes every output file.
fn command_generate(args: &GenerateArgs) -> CliResult<ExitCode> {
    let plan = plan_generation(args)?;
    let written = write_outputs(&plan.out_dir, &plan.files)?;
    info!(files = written.len(), out = %plan.out_dir.display(), "generation complete");
    Ok(ExitCode::SUCCESS)
}

/// Fails when generated output differs from the files on disk.
fn command_check(args: &GenerateArgs) -> CliResult<ExitCode> {
    let plan = plan_generation(args)?;
    check_outputs(&plan.out_dir, &plan.files)?;
    info!(
        files = plan.files.len(),
        out = %plan.out_dir.display(),
        "generated output is up to date"
    );
    Ok(ExitCode::SUCCESS)
}

/// Serves one plugin request over stdio.
fn command_plugin(command: &PluginCommand) -> CliResult<ExitCode> {
    let config = SdmConfig::load_optional(command.config.as_deref())?.unwrap_or_default();
    let generator = config.generator()?;
    let response = run_plugin(&generator, io::stdin().lock(), io::stdout().lock())?;
    if let Some(message) = response.error {
        error!(error = %message, "plugin request failed");
        return Ok(ExitCode::FAILURE);
    }
    info!(files = response.files.len(), "plugin request complete");
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Planning
// ============================================================================

/// Resolved output directory and file set for one invocation.
struct GenerationPlan {
    /// Directory generated names are relative to.
    out_dir: PathBuf,
    /// Generated files followed by extra files.
    files: Vec<GeneratedFile>,
}

/// Loads inputs and generates the complete file set in memory.
///
/// A missing implicit config file is tolerated when `--schema` is given.
fn plan_generation(args: &GenerateArgs) -> CliResult<GenerationPlan> {
    let config = if args.schemas.is_empty() {
        SdmConfig::load(args.config.as_deref())?
    } else {
        SdmConfig::load_optional(args.config.as_deref())?.unwrap_or_default()
    };
    let schema_paths =
        if args.schemas.is_empty() { config.resolved_schema_files() } else { args.schemas.clone() };
    if schema_paths.is_empty() {
        return Err(CliError::NoSchemas);
    }
    let extra_paths =
        if args.extras.is_empty() { config.resolved_extra_files() } else { args.extras.clone() };

    let generator = select_backends(config.generator()?, args.backends.as_deref())?;
    let schemas = load_schema_files(&schema_paths)?;
    let own = generator.generate_files(&schemas).into_result()?;
    let files = merge_extra_files(own, load_extra_files(&extra_paths)?)?;
    Ok(GenerationPlan {
        out_dir: args.out.clone().unwrap_or_else(|| config.resolved_output()),
        files,
    })
}

/// Applies a `--backends` override.
fn select_backends(generator: Generator, list: Option<&str>) -> CliResult<Generator> {
    match list {
        Some(list) => Ok(generator.with_backends(BackendKind::parse_list(list)?)),
        None => Ok(generator),
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Reports a CLI error to stderr.
fn report_error(err: &CliError) -> ExitCode {
    let mut stderr = io::stderr();
    let _ = writeln!(stderr, "sdm: {err}");
    ExitCode::FAILURE
}
