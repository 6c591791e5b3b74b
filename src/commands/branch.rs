//! Implementation of the `segtext branch` command.

use crate::cli::BranchArgs;
use crate::config::Config;
use crate::segments::format_branch;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Format a branch name with the configured mapping and template. A
/// `--template` argument replaces the configured template.
pub fn cmd_branch(config: &Config, args: BranchArgs) -> String {
    let engine = config.engine(Arc::new(config.environment(&BTreeMap::new())));
    let template = args.template.as_deref().or(config.branch_template.as_deref());
    format_branch(&engine, &args.name, &config.mapped_branches, template)
}
