//! Report entries and inspection outcomes.
//!
//! Both modes share `ReportEntry`. Validation collects entries into a
//! `ValidationOutcome` (valid iff the list is empty); sanitization pairs
//! its entries with the transformed value in a `SanitizationOutcome`.

use std::fmt::Write as _;

use serde::Serialize;
use serde_json::Value;

/// One soft violation (validation) or one applied change (sanitization).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    /// Rendered property path, e.g. `@.user.tags[2]`. When the schema
    /// node declares an alias this reads `Alias (@.user.tags[2])`.
    pub property: String,

    /// Human-readable description of what was wrong or what changed.
    pub message: String,

    /// Machine-readable code, when the schema or a hook supplied one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ReportEntry {
    pub fn new(property: impl Into<String>, message: impl Into<String>) -> Self {
        ReportEntry {
            property: property.into(),
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Result of a validation run. Never carries a transformed value —
/// validation does not touch the candidate.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub errors: Vec<ReportEntry>,
}

impl ValidationOutcome {
    pub fn from_entries(errors: Vec<ReportEntry>) -> Self {
        ValidationOutcome {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Multi-line rendering grouped by property path.
    pub fn format(&self) -> String {
        if self.valid {
            return "valid".to_string();
        }
        format_entries(&self.errors)
    }
}

/// Result of a sanitization run: the transformed value plus one entry
/// per change the engine applied.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizationOutcome {
    pub data: Value,
    pub reporting: Vec<ReportEntry>,
}

impl SanitizationOutcome {
    pub fn new(data: Value, reporting: Vec<ReportEntry>) -> Self {
        SanitizationOutcome { data, reporting }
    }

    /// Multi-line rendering grouped by property path.
    pub fn format(&self) -> String {
        if self.reporting.is_empty() {
            return "nothing to sanitize".to_string();
        }
        format_entries(&self.reporting)
    }
}

/// Render entries as `Property <path>: <message>[, <message>...]` lines,
/// grouping consecutive entries that share a property path.
fn format_entries(entries: &[ReportEntry]) -> String {
    let mut out = String::new();
    let mut i = 0;
    while i < entries.len() {
        let property = &entries[i].property;
        let mut messages = vec![entries[i].message.as_str()];
        let mut j = i + 1;
        while j < entries.len() && &entries[j].property == property {
            messages.push(entries[j].message.as_str());
            j += 1;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = write!(out, "Property {}: {}", property, messages.join(", "));
        i = j;
    }
    out
}
