//! Command-line interface for macrorec.
//!
//! This module provides the CLI structure for the `macrorec` binary. The
//! handlers live in the binary itself.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, ListCommand, PlayCommand, RecordCommand, ShowCommand};

use crate::logging::Verbosity;

/// macrorec - Record mouse and keyboard input and play it back
///
/// Recording captures global pointer and key events until the stop hotkey
/// (F8 by default). Playback replays a macro with its original timing and can
/// be aborted at any time with the abort hotkey (F9 by default).
#[derive(Debug, Parser)]
#[command(name = "macrorec")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record a macro until the stop hotkey is pressed
    Record(RecordCommand),

    /// Play a macro
    Play(PlayCommand),

    /// List saved macros
    List(ListCommand),

    /// Summarise a macro
    Show(ShowCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::LoopCount;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
        assert_eq!(Cli::command().get_name(), "macrorec");
    }

    #[test]
    fn test_verbosity_flags() {
        assert_eq!(parse(&["macrorec", "list"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["macrorec", "-v", "list"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["macrorec", "list", "-vv"]).verbosity(), Verbosity::Trace);
        assert_eq!(parse(&["macrorec", "-q", "list"]).verbosity(), Verbosity::Quiet);
    }

    #[test]
    fn test_parse_record() {
        let cli = parse(&["macrorec", "record"]);
        assert!(matches!(cli.command, Command::Record(RecordCommand { output: None })));

        let cli = parse(&["macrorec", "record", "-o", "out.json"]);
        match cli.command {
            Command::Record(cmd) => assert_eq!(cmd.output, Some(PathBuf::from("out.json"))),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_play_loops() {
        let cli = parse(&["macrorec", "play", "m.json", "--loops", "0"]);
        match cli.command {
            Command::Play(cmd) => {
                assert_eq!(cmd.file, PathBuf::from("m.json"));
                assert_eq!(cmd.loops, Some(LoopCount::INFINITE));
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = parse(&["macrorec", "play", "m.json"]);
        assert!(matches!(cli.command, Command::Play(PlayCommand { loops: None, .. })));
    }

    #[test]
    fn test_parse_play_rejects_bad_loops() {
        for bad in ["-1", "two", "1.5"] {
            let result = Cli::try_parse_from(["macrorec", "play", "m.json", "-l", bad]);
            assert!(result.is_err(), "accepted loop count {bad}");
        }
    }

    #[test]
    fn test_parse_show_and_list() {
        let cli = parse(&["macrorec", "show", "m.json", "--json"]);
        assert!(matches!(cli.command, Command::Show(ShowCommand { json: true, .. })));

        let cli = parse(&["macrorec", "list"]);
        assert!(matches!(cli.command, Command::List(ListCommand { json: false })));
    }

    #[test]
    fn test_parse_config() {
        let cli = parse(&["macrorec", "config", "validate", "-f", "x.toml"]);
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Validate { file: Some(_) })
        ));
        let cli = parse(&["macrorec", "-c", "/custom/config.toml", "config", "path"]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }
}
