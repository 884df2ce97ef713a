//! Diagnostic CLI for `researchflow_core`.
//!
//! # Responsibility
//! - Verify core crate linkage (`ping`).
//! - Inspect and maintain on-disk projects without the GUI:
//!   `list`, `check`, `clean` and `history`.
//!
//! Set `RESEARCHFLOW_LOG_DIR` to an absolute path to enable file logging;
//! `RESEARCHFLOW_LOG_LEVEL` overrides the default level.

use log::info;
use researchflow_core::{CoreConfig, ProjectSession, SessionError};
use std::process::ExitCode;

const USAGE: &str = "usage:
  researchflow_cli [ping]
  researchflow_cli list <projects_root>
  researchflow_cli check <projects_root> <project>
  researchflow_cli clean <projects_root> <project>
  researchflow_cli history <projects_root> <project>";

/// Config for `root`, with the log level taken from `level_override` when set.
fn core_config(root: &str, level_override: Option<String>) -> CoreConfig {
    let config = CoreConfig::new(root);
    match level_override {
        Some(level) if !level.trim().is_empty() => config.with_log_level(level),
        _ => config,
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let root = args.get(1).map(String::as_str).unwrap_or(".");
    let config = core_config(root, std::env::var("RESEARCHFLOW_LOG_LEVEL").ok());
    if let Ok(log_dir) = std::env::var("RESEARCHFLOW_LOG_DIR") {
        if let Err(err) = researchflow_core::init_logging(&config.log_level, &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let result = match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        [] | ["ping"] => {
            println!("researchflow_core ping={}", researchflow_core::ping());
            println!("researchflow_core version={}", researchflow_core::core_version());
            Ok(())
        }
        ["list", _] => list(&config),
        ["check", _, project] => check(&config, project),
        ["clean", _, project] => clean(&config, project),
        ["history", _, project] => history(&config, project),
        _ => {
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn open_session(config: &CoreConfig, project: &str) -> Result<ProjectSession, SessionError> {
    let mut session = ProjectSession::new(config);
    let report = session.open_project(project)?;
    info!(
        "event=cli_open module=cli status=ok project={project} edges_removed={}",
        report.edges_removed
    );
    Ok(session)
}

fn list(config: &CoreConfig) -> Result<(), SessionError> {
    let session = ProjectSession::new(config);
    for name in session.store().list_projects()? {
        println!("{name}");
    }
    Ok(())
}

/// Reports what opening would repair; writes nothing.
fn check(config: &CoreConfig, project: &str) -> Result<(), SessionError> {
    let mut session = ProjectSession::new(config);
    let report = session.open_project(project)?;
    let data = session
        .project()
        .map(|open| &open.data)
        .ok_or(SessionError::NoProjectOpen)?;
    println!(
        "nodes={} edges={} groups={} tags={} todos={}",
        data.nodes.len(),
        data.edges.len(),
        data.groups.len(),
        data.global_tags.len(),
        data.todos.len()
    );
    println!("dangling_edges={}", report.edges_removed);
    println!(
        "history undo={} redo={} dropped={}",
        report.history.undo_loaded, report.history.redo_loaded, report.history.dropped
    );
    Ok(())
}

/// Repairs edges, removes orphaned assets and saves the project.
fn clean(config: &CoreConfig, project: &str) -> Result<(), SessionError> {
    let mut session = open_session(config, project)?;
    let report = session.validate_and_clean()?;
    session.save_project()?;
    println!(
        "edges_removed={} papers_removed={} images_removed={}",
        report.edges_removed, report.papers_removed, report.images_removed
    );
    Ok(())
}

fn history(config: &CoreConfig, project: &str) -> Result<(), SessionError> {
    let session = open_session(config, project)?;
    let history = session.history();
    println!("undo ({}):", history.undo_len());
    for command in history.undo_commands().rev() {
        println!("  {}", command.description());
    }
    println!("redo ({}):", history.redo_len());
    for command in history.redo_commands().rev() {
        println!("  {}", command.description());
    }
    Ok(())
}
