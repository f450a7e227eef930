//! # sift-contracts
//!
//! Shared types for the sift schema inspection workspace.
//!
//! All crates in the workspace import from here. No traversal logic
//! lives in this crate — only the schema model, report and path types,
//! hook definitions, and error types.

pub mod error;
pub mod hook;
pub mod path;
pub mod report;
pub mod schema;

pub use error::{SiftError, SiftResult};
pub use hook::{Hook, HookArgs, HookOutcome, HookReport};
pub use path::{PathSegment, PropertyPath};
pub use report::{ReportEntry, SanitizationOutcome, ValidationOutcome};
pub use schema::{value_kind_name, Items, Kind, Pattern, SchemaNode, StringRule};
