//! Segtext: a rewrite-then-execute template engine for prompt segments.
//!
//! Templates written against a segment's own context (`{{ .Branch }}`) can
//! also reach process-wide values (`{{ .OS }}`), environment variables
//! (`{{ .Env.HOME }}`) and other segments (`{{ .Segments.Git.Branch }}`).
//! The [`template`] module rewrites each template so those references
//! resolve unambiguously, then executes it.
//!
//! - [`state`]: shared state and the environment accessor
//! - [`registry`]: the concurrent segment registry
//! - [`template`]: patcher, renderer, helper library and engine
//! - [`segments`]: value shapes segment producers publish
//! - [`config`], [`cli`], [`commands`]: the `segtext` binary

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod registry;
pub mod segments;
pub mod state;
pub mod template;

