//! Segment value shapes shared between producers and templates.
//!
//! Producers compute these values and store them in the registry with
//! [`SharedState::set_segment`](crate::state::SharedState::set_segment);
//! templates read them back through `.Segments.<Name>`. Field names
//! serialize in PascalCase so templates address them as `.Working.Changed`.

mod scm;


pub use scm::{ScmStatus, format_branch};
