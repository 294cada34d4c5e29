//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Kennel - keeps monitors, dashboards and SLOs in sync with their definitions.
#[derive(Parser, Debug)]
#[command(name = "kennel")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Workspace root holding `kennel.yaml`, `projects/` and `templates/`.
    #[arg(short = 'C', long, global = true, env = "KENNEL_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Only consider these projects (comma separated kennel ids).
    #[arg(short, long, global = true, env = "PROJECT")]
    pub project: Option<String>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write snapshots of every definition.
    Generate,

    /// Show what `update` would change, without changing anything.
    Plan,

    /// Apply the plan to the monitoring service.
    Update {
        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_update_with_projects() {
        let cli = Cli::try_parse_from(["kennel", "update", "--yes", "--project", "a,b"])
            .expect("parse");
        assert!(matches!(cli.command, Commands::Update { yes: true }));
        assert_eq!(cli.project.as_deref(), Some("a,b"));
        assert_eq!(cli.output, OutputFormat::Text);
    }

    #[test]
    fn test_parse_plan_json() {
        let cli = Cli::try_parse_from(["kennel", "--output", "json", "plan"]).expect("parse");
        assert!(matches!(cli.command, Commands::Plan));
        assert_eq!(cli.output, OutputFormat::Json);
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["kennel"]).is_err());
    }
}
