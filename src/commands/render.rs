//! Implementation of the `segtext render` command.
//!
//! Builds an engine from the config, layers the command-line segments and
//! environment overrides on top, and renders one template.

use super::{parse_assignment, parse_context};
use crate::cli::RenderArgs;
use crate::config::{Config, validate_segment_name};
use crate::error::{Result, SegtextError};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Execute the `segtext render` command and return the rendered text.
pub fn cmd_render(config: &Config, args: RenderArgs) -> Result<String> {
    let context = read_context(&args)?;

    let mut overrides = BTreeMap::new();
    for arg in &args.env {
        let (key, value) = parse_assignment(arg, "--env")?;
        overrides.insert(key, value);
    }

    let engine = config.engine(Arc::new(config.environment(&overrides)));

    for arg in &args.segments {
        let (name, value) = parse_assignment(arg, "--segment")?;
        validate_segment_name(&name)?;
        engine.state().segments.set(name, segment_value(&value));
    }

    debug!(
        segments = engine.state().segments.len(),
        "rendering template"
    );
    Ok(engine.render_json(&args.template, &context)?)
}

fn read_context(args: &RenderArgs) -> Result<JsonValue> {
    match &args.context_file {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|e| {
                SegtextError::UserError(format!(
                    "failed to read context file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            parse_context(Some(&content), &path.display().to_string())
        }
        None => parse_context(args.context.as_deref(), "--context"),
    }
}

/// A segment value given on the command line: JSON when it parses, text
/// otherwise.
fn segment_value(raw: &str) -> JsonValue {
    serde_json::from_str(raw).unwrap_or_else(|_| JsonValue::String(raw.to_string()))
}
