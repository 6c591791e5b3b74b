//! Configuration model for segtext.
//!
//! This module defines the Config struct that represents the YAML file given
//! with `--config`. It supports forward-compatible YAML parsing (unknown
//! fields are ignored), defaults for every field, and validation of segment
//! names. A config turns into the [`SharedState`](crate::state::SharedState)
//! and [`Environment`](crate::state::Environment) an engine renders against.

mod model;
mod operations;

#[cfg(test)]
mod tests;

// Re-export public API
pub use model::Config;
pub(crate) use operations::validate_segment_name;
