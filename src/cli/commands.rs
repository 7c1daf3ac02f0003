//! Command dispatch

use std::io;
use std::path::PathBuf;

use chrono::Utc;
use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::render::ForestConvert;
use crate::application::services::{ExportReport, Written};
use crate::application::ApplicationResult;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings, LOCAL_CONFIG_FILE};
use crate::domain::BuildReport;
use crate::infrastructure::{InfraError, ServiceContainer};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Export {
            data_dir,
            output_dir,
        }) => _export(cli, data_dir.clone(), output_dir.clone()),
        Some(Commands::Tree { data_dir }) => _tree(cli, data_dir.clone()),
        Some(Commands::Json { data_dir }) => _json(cli, data_dir.clone()),
        Some(Commands::Config { command }) => _config(cli, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, see `cattree --help`".to_string(),
        )),
    }
}

fn global_config(cli: &Cli) -> Option<PathBuf> {
    if cli.no_global {
        return None;
    }
    global_config_path()
}

/// Layered settings with command-line overrides on top.
fn load_settings(
    cli: &Cli,
    data_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
) -> CliResult<Settings> {
    let global = global_config(cli);
    let mut settings =
        Settings::load_from(global.as_deref(), cli.config.as_deref()).map_err(InfraError::from)?;
    if let Some(dir) = data_dir {
        settings.data_dir = dir;
    }
    if let Some(dir) = output_dir {
        settings.output_dir = dir;
    }
    debug!(data_dir = %settings.data_dir.display(), output_dir = %settings.output_dir.display(), "settings loaded");
    Ok(settings)
}

#[instrument(skip(cli))]
fn _export(cli: &Cli, data_dir: Option<PathBuf>, output_dir: Option<PathBuf>) -> CliResult<()> {
    let settings = load_settings(cli, data_dir, output_dir)?;
    let container = ServiceContainer::new(settings);
    let service = container.export_service()?;

    let report = service
        .export(Utc::now())
        .map_err(InfraError::from)?;

    print_diagnostics(&report.diagnostics);
    output::header(&format!(
        "{} categories, {} roots, depth {}",
        report.categories, report.roots, report.depth
    ));
    print_artifact("JSON", &report.json);
    print_artifact("HTML", &report.html);

    finish(report)
}

fn finish(report: ExportReport) -> CliResult<()> {
    if report.is_success() {
        return Ok(());
    }
    // Surface the first failure; both were already printed
    match (report.json, report.html) {
        (Err(e), _) | (_, Err(e)) => Err(InfraError::from(e).into()),
        _ => Ok(()),
    }
}

fn print_artifact(label: &str, result: &ApplicationResult<Written>) {
    match result {
        Ok(written) => output::success_detail(&format!(
            "{label}: {} ({} bytes)",
            written.location, written.bytes
        )),
        Err(e) => output::failure(&format!("{label}: {e}")),
    }
}

fn print_diagnostics(report: &BuildReport) {
    for d in &report.dangling {
        output::warning(&format!(
            "{} includes unknown category '{}'",
            d.category, d.target
        ));
    }
    for u in &report.unreadable {
        output::warning(&format!("cannot read {}: {}", u.category, u.message));
    }
    for r in &report.reassigned {
        output::warning(&format!(
            "{} included by {} and {}, kept under {}",
            r.child, r.from, r.to, r.to
        ));
    }
    for c in &report.cycles {
        output::warning(&format!(
            "include cycle: {} -> {} skipped",
            c.from, c.to
        ));
    }
}

#[instrument(skip(cli))]
fn _tree(cli: &Cli, data_dir: Option<PathBuf>) -> CliResult<()> {
    let settings = load_settings(cli, data_dir, None)?;
    let container = ServiceContainer::new(settings);
    let service = container.export_service()?;

    let forest = service.build_forest().map_err(InfraError::from)?;
    print_diagnostics(forest.report());
    output::info(&forest.to_tree_string());
    Ok(())
}

#[instrument(skip(cli))]
fn _json(cli: &Cli, data_dir: Option<PathBuf>) -> CliResult<()> {
    let settings = load_settings(cli, data_dir, None)?;
    let container = ServiceContainer::new(settings);
    let service = container.export_service()?;

    let forest = service.build_forest().map_err(InfraError::from)?;
    print_diagnostics(forest.report());
    let bytes = service.render_json(&forest).map_err(InfraError::from)?;
    output::info(&String::from_utf8_lossy(&bytes));
    Ok(())
}

fn _config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli, None, None)?;
            let text = settings.to_toml().map_err(InfraError::from)?;
            output::info(&text);
        }
        ConfigCommands::Path => {
            match global_config(cli) {
                Some(path) => {
                    let state = if path.exists() { "" } else { " (not found)" };
                    output::action("Global", &format!("{}{state}", path.display()));
                }
                None if cli.no_global => output::action("Global", &"skipped (--no-global)"),
                None => output::action("Global", &"unavailable (no home directory)"),
            }
            let local = cli
                .config
                .clone()
                .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE));
            let state = if local.exists() { "" } else { " (not found)" };
            output::action("Local", &format!("{}{state}", local.display()));
        }
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}
