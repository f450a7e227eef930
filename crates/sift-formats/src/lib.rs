//! # sift-formats
//!
//! Named string formats referenced by `pattern` constraints.
//!
//! Lookup order: process-wide registered formats shadow the built-ins,
//! so `register("email", ...)` replaces the stock email matcher until
//! `reset()` is called. Unknown names are reported as `None` by
//! [`matches`]; the caller decides whether that fails the constraint.

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use regex::Regex;
use tracing::debug;

/// How a format decides whether a string conforms.
#[derive(Debug, Clone)]
pub enum FormatMatcher {
    Regex(Regex),
    Predicate(fn(&str) -> bool),
}

impl FormatMatcher {
    pub fn accepts(&self, s: &str) -> bool {
        match self {
            FormatMatcher::Regex(re) => re.is_match(s),
            FormatMatcher::Predicate(f) => f(s),
        }
    }
}

// ── Built-ins ─────────────────────────────────────────────────────────────────

/// `date-time` is RFC 3339 with optional exactly-three-digit millis and
/// a `Z` or `±hh:mm` offset. `decimal` tolerates a bare leading dot.
const BUILTIN_PATTERNS: &[(&str, &str)] = &[
    ("void", r"^$"),
    ("url", r"^(https?|ftp)://[^\s/$.?#][^\s]*$"),
    (
        "date-time",
        r"^\d{4}-\d{2}-\d{2}[Tt]\d{2}:\d{2}:\d{2}(\.\d{3})?([Zz]|[+-]\d{2}:\d{2})$",
    ),
    ("date", r"^\d{4}-\d{2}-\d{2}$"),
    ("time", r"^\d{2}:\d{2}(:\d{2})?$"),
    ("color", r"^#[0-9a-fA-F]+$"),
    ("email", r"^[^\s@]+@[^\s@]+\.[a-zA-Z]+$"),
    ("numeric", r"^[0-9]+$"),
    ("integer", r"^-?[0-9]+$"),
    ("decimal", r"^-?[0-9]*\.?[0-9]+$"),
    ("alpha", r"^[a-zA-Z]+$"),
    ("alphaNumeric", r"^[a-zA-Z0-9]+$"),
    ("alphaDash", r"^[a-zA-Z0-9_-]+$"),
    (
        "v4uuid",
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-4[0-9a-fA-F]{3}-[89abAB][0-9a-fA-F]{3}-[0-9a-fA-F]{12}$",
    ),
    ("upperString", r"^[A-Z\s]+$"),
    ("lowerString", r"^[a-z\s]+$"),
];

fn builtins() -> &'static HashMap<&'static str, FormatMatcher> {
    static BUILTINS: OnceLock<HashMap<&'static str, FormatMatcher>> = OnceLock::new();
    BUILTINS.get_or_init(|| {
        BUILTIN_PATTERNS
            .iter()
            .map(|(name, pattern)| {
                // The table above is fixed at compile time; a pattern that
                // does not compile is a bug in this crate, not user input.
                let re = Regex::new(pattern).expect("built-in format pattern compiles");
                (*name, FormatMatcher::Regex(re))
            })
            .collect()
    })
}

// ── Process-wide registrations ────────────────────────────────────────────────

fn registered() -> &'static RwLock<HashMap<String, FormatMatcher>> {
    static REGISTERED: OnceLock<RwLock<HashMap<String, FormatMatcher>>> = OnceLock::new();
    REGISTERED.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Register (or shadow) a format for the rest of the process.
pub fn register(name: impl Into<String>, matcher: FormatMatcher) {
    let name = name.into();
    debug!(format = %name, "registering string format");
    registered()
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .insert(name, matcher);
}

/// Drop every process-wide registration, restoring the built-ins.
pub fn reset() {
    debug!("resetting string format registrations");
    registered()
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .clear();
}

/// Check `s` against the format `name`.
///
/// Returns `None` when no such format exists (neither registered nor
/// built-in).
pub fn matches(name: &str, s: &str) -> Option<bool> {
    {
        let reg = registered().read().unwrap_or_else(|e| e.into_inner());
        if let Some(matcher) = reg.get(name) {
            return Some(matcher.accepts(s));
        }
    }
    builtins().get(name).map(|m| m.accepts(s))
}

/// Is `name` a known format?
pub fn known(name: &str) -> bool {
    let reg = registered().read().unwrap_or_else(|e| e.into_inner());
    reg.contains_key(name) || builtins().contains_key(name)
}
