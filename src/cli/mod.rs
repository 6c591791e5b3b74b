//! CLI argument parsing for segtext.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Segtext: render prompt segment templates.
///
/// Templates reference the local context with plain dot notation
/// (`{{ .Branch }}`), environment variables with `{{ .Env.HOME }}`, other
/// segments with `{{ .Segments.Git.Branch }}`, and shared values such as
/// `{{ .OS }}` or `{{ .UserName }}`.
#[derive(Parser, Debug)]
#[command(name = "segtext")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a YAML configuration file.
    #[arg(short, long, global = true, env = "SEGTEXT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr (repeat for trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for segtext.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a template and print the result.
    ///
    /// The local context is a JSON value given inline or read from a file.
    /// Segments and environment overrides are layered over the config file.
    Render(RenderArgs),

    /// Print the patched form of a template without executing it.
    Patch(PatchArgs),

    /// List the helper functions available in templates.
    Funcs,

    /// Format a branch name through the configured mapped branches and
    /// branch template.
    Branch(BranchArgs),
}

/// Arguments for the `render` command.
#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// Template text, e.g. '{{ .Env.USER }}@{{ .HostName }}'.
    pub template: String,

    /// Local context as inline JSON.
    #[arg(long, conflicts_with = "context_file")]
    pub context: Option<String>,

    /// Read the local context from a JSON file.
    #[arg(long)]
    pub context_file: Option<PathBuf>,

    /// Set a segment value (NAME=JSON; non-JSON values are taken as text).
    #[arg(short, long = "segment", value_name = "NAME=VALUE")]
    pub segments: Vec<String>,

    /// Override an environment variable (KEY=VALUE).
    #[arg(short, long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,
}

/// Arguments for the `patch` command.
#[derive(Parser, Debug)]
pub struct PatchArgs {
    /// Template text to patch.
    pub template: String,

    /// Local context as inline JSON; only its field names matter.
    #[arg(long)]
    pub context: Option<String>,
}

/// Arguments for the `branch` command.
#[derive(Parser, Debug)]
pub struct BranchArgs {
    /// Branch name to format.
    pub name: String,

    /// Branch template, overriding the configured one.
    #[arg(long)]
    pub template: Option<String>,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
