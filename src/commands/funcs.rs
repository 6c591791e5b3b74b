//! Implementation of the `segtext funcs` command.

use crate::template::{BUILTINS, HelperLibrary};

/// List every function a template can call, builtins first.
pub fn cmd_funcs() -> String {
    let helpers = HelperLibrary::standard();

    let mut lines = vec!["builtins:".to_string()];
    lines.extend(BUILTINS.iter().map(|name| format!("  {}", name)));
    lines.push("helpers:".to_string());
    lines.extend(helpers.names().map(|name| format!("  {}", name)));
    lines.join("\n")
}
