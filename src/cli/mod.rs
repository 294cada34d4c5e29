//! CLI module for kennel.
//!
//! This module provides the command-line interface for generating
//! snapshots, planning and applying changes.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::OutputFormatter;
