//! `macrorec` - CLI for recording and replaying input macros

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;

use macrorec::cli::{Cli, Command, ConfigCommand, ListCommand, PlayCommand, RecordCommand, ShowCommand};
use macrorec::{init_logging, load_log, save_log, Config, Controller, MacroStore, PlaybackResult};

#[cfg(feature = "native")]
mod devices {
    use std::sync::Arc;

    use macrorec::native::{EnigoBackend, RdevSource};

    pub fn source() -> macrorec::Result<Arc<RdevSource>> {
        RdevSource::global()
    }

    pub fn backend() -> macrorec::Result<EnigoBackend> {
        EnigoBackend::new()
    }
}

#[cfg(not(feature = "native"))]
mod devices {
    use std::sync::Arc;

    use macrorec::device::{RecordingBackend, ScriptedSource};
    use macrorec::DeviceError;

    pub fn source() -> macrorec::Result<Arc<ScriptedSource>> {
        Err(DeviceError::Unsupported.into())
    }

    pub fn backend() -> macrorec::Result<RecordingBackend> {
        Err(DeviceError::Unsupported.into())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity());

    // Validation reports problems itself instead of failing to start.
    if let Command::Config(ConfigCommand::Validate { file }) = &cli.command {
        validate_config(file.clone().or_else(|| cli.config.clone()));
        return Ok(());
    }

    let config = Config::load_from(cli.config.clone()).context("could not load configuration")?;

    match cli.command {
        Command::Record(cmd) => handle_record(&config, cmd),
        Command::Play(cmd) => handle_play(&config, &cmd),
        Command::List(cmd) => handle_list(&config, &cmd),
        Command::Show(cmd) => handle_show(&config, &cmd),
        Command::Config(cmd) => handle_config(&config, &cmd),
    }
}

fn handle_record(config: &Config, cmd: RecordCommand) -> Result<()> {
    let hotkeys = config.hotkeys()?;
    let controller = Controller::with_shared_source(devices::source()?, hotkeys);

    let session = controller.begin_recording()?;
    println!(
        "Recording. Press {} to stop.",
        controller.hotkeys().stop_recording
    );
    session.wait();
    let log = controller.end_recording(session);

    if log.is_empty() {
        warn!("Recording stopped with no input");
        println!("Nothing was recorded; no file saved.");
        return Ok(());
    }

    let path = match cmd.output {
        Some(path) => {
            save_log(&path, &log).with_context(|| format!("could not save {}", path.display()))?;
            path
        }
        None => MacroStore::open(config.macros_dir())?.save(&log)?,
    };
    println!("Saved {} actions to {}", log.len(), path.display());
    Ok(())
}

fn handle_play(config: &Config, cmd: &PlayCommand) -> Result<()> {
    let loops = cmd.loops.unwrap_or_else(|| config.default_loops());
    let path = resolve_macro(config, &cmd.file)?;
    let log = load_log(&path).with_context(|| format!("could not load {}", path.display()))?;

    if log.is_empty() {
        println!("Nothing to play: {} is empty.", path.display());
        return Ok(());
    }

    let hotkeys = config.hotkeys()?;
    let controller = Controller::with_shared_source(devices::source()?, hotkeys);
    let actions = log.len();
    let handle = controller.play(Arc::new(log), loops, devices::backend()?)?;
    println!(
        "Playing {} ({actions} actions, loops: {loops}). Press {} to abort.",
        path.display(),
        controller.hotkeys().abort_playback
    );

    while !handle.is_finished() {
        thread::sleep(config.poll_interval());
    }
    let report = handle.join()?;

    match report.result {
        PlaybackResult::Completed => println!(
            "Playback completed: {} pass(es), {} actions.",
            report.passes, report.actions_applied
        ),
        PlaybackResult::Aborted => println!(
            "Playback aborted after {} full pass(es), {} actions.",
            report.passes, report.actions_applied
        ),
    }
    Ok(())
}

fn handle_list(config: &Config, cmd: &ListCommand) -> Result<()> {
    let store = MacroStore::open(config.macros_dir())?;
    let macros = store.list()?;

    if cmd.json {
        let entries: Vec<_> = macros
            .iter()
            .map(|path| {
                serde_json::json!({
                    "path": path,
                    "actions": load_log(path).ok().map(|log| log.len()),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if macros.is_empty() {
        println!("No macros in {}", store.dir().display());
        return Ok(());
    }
    for path in &macros {
        let name = path.file_name().unwrap_or(path.as_os_str()).to_string_lossy();
        match load_log(path) {
            Ok(log) => println!("{name:<40} {:>6} actions", log.len()),
            Err(e) => println!("{name:<40} unreadable ({e})"),
        }
    }
    Ok(())
}

fn handle_show(config: &Config, cmd: &ShowCommand) -> Result<()> {
    let path = resolve_macro(config, &cmd.file)?;
    let log = load_log(&path).with_context(|| format!("could not load {}", path.display()))?;
    let summary = log.summary();

    if cmd.json {
        let report = serde_json::json!({ "path": path, "summary": summary });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", path.display());
        println!("  Actions:       {}", summary.total);
        println!("  Moves:         {}", summary.moves);
        println!("  Clicks:        {}", summary.clicks);
        println!("  Scrolls:       {}", summary.scrolls);
        println!("  Key presses:   {}", summary.key_presses);
        println!("  Key releases:  {}", summary.key_releases);
        println!("  Duration:      {:.3}s", summary.span_secs);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: &ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json: true } => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        ConfigCommand::Show { json: false } => {
            println!("Current Configuration");
            println!("=====================");
            println!();
            println!("[Hotkeys]");
            println!("  Stop recording:  {}", config.hotkeys.stop_recording);
            println!("  Abort playback:  {}", config.hotkeys.abort_playback);
            println!();
            println!("[Storage]");
            println!("  Macros dir:      {}", config.macros_dir().display());
            println!();
            println!("[Playback]");
            println!("  Default loops:   {}", config.default_loops());
            println!("  Poll interval:   {}ms", config.playback.poll_interval_ms);
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            validate_config(file.clone());
        }
    }
    Ok(())
}

fn validate_config(file: Option<PathBuf>) {
    let path = file.unwrap_or_else(Config::default_config_path);
    println!("Validating configuration: {}", path.display());
    match Config::load_from(Some(path)) {
        Ok(_) => println!("Configuration is valid."),
        Err(e) => println!("Configuration error: {e}"),
    }
}

fn resolve_macro(config: &Config, file: &std::path::Path) -> Result<PathBuf> {
    if file.exists() {
        return Ok(file.to_path_buf());
    }
    Ok(MacroStore::open(config.macros_dir())?.resolve(file))
}
