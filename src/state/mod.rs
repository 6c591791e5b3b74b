//! Process-wide shared state read by the template engine.
//!
//! This module provides:
//!
//! - **SharedState**: scalar globals (`OS`, `Shell`, ...), user variables, and
//!   the segment registry
//! - **Environment**: the environment-variable accessor capability
//!
//! Neither is a singleton. Callers construct a `SharedState`, hand it to
//! [`crate::template::init`] or [`crate::template::Engine::new`], and build a
//! fresh one whenever an isolated run is needed.

mod environment;
mod shared;


pub use environment::{Environment, MapEnvironment, OsEnvironment};
pub use shared::{SharedState, platform_os};
