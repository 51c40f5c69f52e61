//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::playback::LoopCount;

/// Record command arguments.
#[derive(Debug, Args)]
pub struct RecordCommand {
    /// Where to save the macro (default: a timestamped file in the macros
    /// directory)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Play command arguments.
#[derive(Debug, Args)]
pub struct PlayCommand {
    /// Macro file, or the name of a macro in the macros directory
    pub file: PathBuf,

    /// Number of passes; 0 repeats until the abort hotkey is pressed
    #[arg(short, long, value_name = "LOOPS", value_parser = parse_loops)]
    pub loops: Option<LoopCount>,
}

fn parse_loops(input: &str) -> Result<LoopCount, String> {
    LoopCount::parse(input).map_err(|e| e.to_string())
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Macro file, or the name of a macro in the macros directory
    pub file: PathBuf,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_command_debug() {
        let cmd = PlayCommand {
            file: PathBuf::from("m.json"),
            loops: Some(LoopCount::INFINITE),
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("m.json"));
        assert!(debug_str.contains("loops"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Validate { file: None };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Validate"));
    }
}
