//! geostack-check CLI - Pelias stack smoke validation
//!
//! Runs the validation pipeline against a live stack and exits 0 when every
//! stage passes, 1 on the first failure.

use anyhow::{bail, Context, Result};
use geostack_check::prelude::*;
use std::path::PathBuf;
use std::process::ExitCode;

/// Prefix of every operator-facing line.
const TAG: &str = "[integration]";

enum Command {
    Run,
    Stages,
    Config(Option<PathBuf>),
    Help,
    Version,
}

struct Cli {
    settings_file: Option<PathBuf>,
    command: Command,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or(geostack_check::NAME);

    let cli = match parse_args(args.get(1..).unwrap_or(&[])) {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("Error: {err}");
            eprintln!("{}", usage(program));
            return ExitCode::from(2);
        }
    };

    match execute(cli, program) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{TAG} ERROR: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn parse_args(args: &[String]) -> Result<Cli> {
    let mut settings_file = None;
    let mut positional = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--settings" => {
                let Some(path) = args.get(i + 1) else {
                    bail!("--settings requires a file path");
                };
                settings_file = Some(PathBuf::from(path));
                i += 2;
            }
            "help" | "--help" | "-h" => return Ok(Cli { settings_file, command: Command::Help }),
            "--version" | "-V" => return Ok(Cli { settings_file, command: Command::Version }),
            other if other.starts_with('-') => bail!("unknown option: {other}"),
            other => {
                positional.push(other.to_string());
                i += 1;
            }
        }
    }

    let command = match positional.as_slice() {
        [] => Command::Run,
        [cmd] if cmd == "run" => Command::Run,
        [cmd] if cmd == "stages" => Command::Stages,
        [cmd] if cmd == "config" => Command::Config(None),
        [cmd, path] if cmd == "config" => Command::Config(Some(PathBuf::from(path))),
        [cmd, ..] => bail!("unknown command or extra arguments after '{cmd}'"),
    };
    Ok(Cli { settings_file, command })
}

fn execute(cli: Cli, program: &str) -> Result<ExitCode> {
    match cli.command {
        Command::Help => {
            println!("{}", usage(program));
            Ok(ExitCode::SUCCESS)
        }
        Command::Version => {
            println!("{} {}", geostack_check::NAME, geostack_check::VERSION);
            Ok(ExitCode::SUCCESS)
        }
        Command::Stages => {
            for (index, (id, name)) in ValidationPipeline::default().stages().enumerate() {
                println!("{}. {:<12} {}", index + 1, id, name);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Run => {
            let settings = load_settings(&cli.settings_file)?;
            Ok(run_pipeline(
                &ValidationPipeline::default(),
                &settings,
                "Integration tests completed successfully",
            ))
        }
        Command::Config(path) => {
            let mut settings = load_settings(&cli.settings_file)?;
            if let Some(path) = path {
                settings = settings.with_config_path(path);
            }
            Ok(run_pipeline(
                &ValidationPipeline::config_only(),
                &settings,
                "Configuration check completed successfully",
            ))
        }
    }
}

fn load_settings(settings_file: &Option<PathBuf>) -> Result<HarnessSettings> {
    let settings = HarnessSettings::load(settings_file.as_deref()).context("loading settings")?;
    log::debug!("settings: {:?}", settings);
    Ok(settings)
}

fn run_pipeline(pipeline: &ValidationPipeline, settings: &HarnessSettings, done: &str) -> ExitCode {
    let http = UreqClient::new(settings.http_timeout);
    log::debug!("HTTP timeout: {:?}", http.timeout());
    let done = done.to_string();
    let progress = ProgressReporter::with_callback(move |update| match update {
        ProgressUpdate::Info { message } => println!("{TAG} {message}"),
        ProgressUpdate::Completed { .. } => println!("{TAG} {done}"),
        _ => {}
    });
    let ctx = StageContext::new(settings, &SystemCommandRunner, &http, &progress);

    let report = pipeline.run(&ctx);
    log::info!("{}", report.summary());

    if let Some(error) = report.error() {
        eprintln!("{TAG} ERROR: {error}");
        if let Some(fix) = error.suggested_fix() {
            log::warn!("{fix}");
        }
    }
    ExitCode::from(report.exit_code())
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {program} [--settings <file>] [command]

Commands:
  run             Run every validation stage (default)
  stages          List the validation stages in run order
  config [PATH]   Only validate the stack configuration file
  help            Show this help message

Environment:
  PELIAS_URL                   Search API base URL (default: http://localhost:4000)
  DOCKER_COMPOSE               Compose command prefix (default: docker compose)
  GEOSTACK_PROJECT_ROOT        Compose project directory (default: .)
  GEOSTACK_CONFIG              Configuration file (default: <root>/config/pelias.json)
  GEOSTACK_HTTP_TIMEOUT_SECS   HTTP timeout in seconds (default: 30)
  GEOSTACK_SETTINGS            TOML settings file
  RUST_LOG                     Diagnostic log filter (default: warn)"
    )
}
