//! Implementation of the `segtext patch` command.

use super::parse_context;
use crate::cli::PatchArgs;
use crate::error::Result;
use crate::template;

/// Execute the `segtext patch` command and return the patched template.
pub fn cmd_patch(args: PatchArgs) -> Result<String> {
    let context = parse_context(args.context.as_deref(), "--context")?;
    Ok(template::patch(&args.template, &context))
}
