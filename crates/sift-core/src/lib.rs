//! # sift-core
//!
//! Traversal engine and entry points for schema inspection.
//!
//! Two modes share one engine: validation walks a candidate against a
//! schema tree and reports every violation without touching the value;
//! sanitization consumes the candidate and returns a coerced, defaulted,
//! rewritten copy along with one report per applied change.
//!
//! ```rust,ignore
//! use serde_json::json;
//! use sift_core::{validate, SchemaNode};
//!
//! let schema = SchemaNode::object()
//!     .property("name", SchemaNode::string().min_length(2))
//!     .property("age", SchemaNode::integer().gte(0.0));
//!
//! let outcome = validate(&schema, &json!({ "name": "Ada", "age": 36 }))?;
//! assert!(outcome.valid);
//! ```
//!
//! The async entry points drive sibling hooks concurrently; reports
//! still come back in depth-first declaration order. The blocking
//! entry points wrap the same engine in an executor and are the
//! intended path for schemas whose hooks are all synchronous (an async
//! hook that needs a timer or I/O reactor belongs on the async entry
//! points).

mod coercion;
mod constraints;
mod engine;
mod registry;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use engine::{Engine, Mode};
use registry::Which;

pub use registry::{sanitization, validation};
pub use sift_contracts::{
    Hook, HookArgs, HookOutcome, HookReport, Items, Kind, Pattern, PathSegment, PropertyPath,
    ReportEntry, SanitizationOutcome, SchemaNode, SiftError, SiftResult, StringRule,
    ValidationOutcome,
};

// ── Validation ────────────────────────────────────────────────────────────────

/// Validate `candidate` against `schema`, blocking on any async hooks.
pub fn validate(schema: &SchemaNode, candidate: &Value) -> SiftResult<ValidationOutcome> {
    futures::executor::block_on(validate_async(schema, candidate))
}

/// Like [`validate`], with a per-call custom directive map shadowing
/// the process-wide registry.
pub fn validate_with(
    schema: &SchemaNode,
    candidate: &Value,
    overrides: HashMap<String, Hook>,
) -> SiftResult<ValidationOutcome> {
    futures::executor::block_on(validate_async_with(schema, candidate, overrides))
}

/// Validate `candidate` against `schema`.
pub async fn validate_async(
    schema: &SchemaNode,
    candidate: &Value,
) -> SiftResult<ValidationOutcome> {
    validate_async_with(schema, candidate, HashMap::new()).await
}

/// Like [`validate_async`], with a per-call custom directive map.
pub async fn validate_async_with(
    schema: &SchemaNode,
    candidate: &Value,
    overrides: HashMap<String, Hook>,
) -> SiftResult<ValidationOutcome> {
    let origin = Arc::new(candidate.clone());
    let directives = registry::resolve(Which::Validation, overrides);
    let engine = Engine::new(Mode::Validate, origin, directives);
    let outcome = engine.run(schema, candidate.clone()).await?;
    Ok(ValidationOutcome::from_entries(outcome.reports))
}

// ── Sanitization ──────────────────────────────────────────────────────────────

/// Sanitize `candidate` against `schema`, blocking on any async hooks.
///
/// The candidate is consumed; the transformed value comes back in the
/// outcome's `data` field.
pub fn sanitize(schema: &SchemaNode, candidate: Value) -> SiftResult<SanitizationOutcome> {
    futures::executor::block_on(sanitize_async(schema, candidate))
}

/// Like [`sanitize`], with a per-call custom directive map.
pub fn sanitize_with(
    schema: &SchemaNode,
    candidate: Value,
    overrides: HashMap<String, Hook>,
) -> SiftResult<SanitizationOutcome> {
    futures::executor::block_on(sanitize_async_with(schema, candidate, overrides))
}

/// Sanitize `candidate` against `schema`.
pub async fn sanitize_async(
    schema: &SchemaNode,
    candidate: Value,
) -> SiftResult<SanitizationOutcome> {
    sanitize_async_with(schema, candidate, HashMap::new()).await
}

/// Like [`sanitize_async`], with a per-call custom directive map.
pub async fn sanitize_async_with(
    schema: &SchemaNode,
    candidate: Value,
    overrides: HashMap<String, Hook>,
) -> SiftResult<SanitizationOutcome> {
    let origin = Arc::new(candidate.clone());
    let directives = registry::resolve(Which::Sanitization, overrides);
    let engine = Engine::new(Mode::Sanitize, origin, directives);
    let outcome = engine.run(schema, candidate).await?;
    Ok(SanitizationOutcome::new(outcome.value, outcome.reports))
}
