//! Command implementations for segtext.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations, plus the argument parsing they share.

mod branch;
mod funcs;
mod patch;
mod render;

#[cfg(test)]
mod tests;

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::error::{Result, SegtextError};
use serde_json::Value as JsonValue;
use std::path::Path;
use tracing::debug;

/// Dispatch a command to its implementation.
///
/// The config file named by `--config` is loaded once here; without one
/// every setting takes its default.
pub fn dispatch(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    let output = match cli.command {
        Command::Render(args) => render::cmd_render(&config, args)?,
        Command::Patch(args) => patch::cmd_patch(args)?,
        Command::Funcs => funcs::cmd_funcs(),
        Command::Branch(args) => branch::cmd_branch(&config, args),
    };

    println!("{}", output);
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => {
            debug!("no config file given; using defaults");
            Ok(Config::default())
        }
    }
}

/// Split a `NAME=VALUE` argument at the first `=`.
fn parse_assignment(arg: &str, flag: &str) -> Result<(String, String)> {
    match arg.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(SegtextError::UserError(format!(
            "invalid {} '{}': expected NAME=VALUE",
            flag, arg
        ))),
    }
}

/// Parse a JSON context argument. No argument means an empty object.
fn parse_context(json: Option<&str>, source: &str) -> Result<JsonValue> {
    match json {
        Some(json) => serde_json::from_str(json).map_err(|e| {
            SegtextError::UserError(format!("invalid context JSON in {}: {}", source, e))
        }),
        None => Ok(JsonValue::Object(Default::default())),
    }
}
