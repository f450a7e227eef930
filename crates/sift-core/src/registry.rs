//! Process-wide custom directive registries.
//!
//! Validation and sanitization each own a registry mapping directive
//! names (the `$name` keys of schema documents, without the `$`) to
//! hooks. Both start empty. `extend` installs defaults for the rest of
//! the process, `reset` clears them, and every entry call may pass a
//! per-call override map that shadows the process-wide entries.

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use tracing::debug;

use sift_contracts::Hook;

struct Registry {
    name: &'static str,
    store: OnceLock<RwLock<HashMap<String, Hook>>>,
}

impl Registry {
    const fn new(name: &'static str) -> Self {
        Registry {
            name,
            store: OnceLock::new(),
        }
    }

    fn store(&self) -> &RwLock<HashMap<String, Hook>> {
        self.store.get_or_init(|| RwLock::new(HashMap::new()))
    }

    fn extend(&self, entries: impl IntoIterator<Item = (String, Hook)>) {
        let mut map = self.store().write().unwrap_or_else(|e| e.into_inner());
        for (name, hook) in entries {
            debug!(registry = self.name, directive = %name, "installing custom directive");
            map.insert(name, hook);
        }
    }

    fn reset(&self) {
        debug!(registry = self.name, "resetting custom directives");
        self.store()
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    fn snapshot(&self) -> HashMap<String, Hook> {
        self.store()
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

static VALIDATION: Registry = Registry::new("validation");
static SANITIZATION: Registry = Registry::new("sanitization");

/// Which registry an entry call resolves against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Which {
    Validation,
    Sanitization,
}

/// Snapshot the process-wide registry and overlay the per-call map.
/// Overrides win over process-wide entries.
pub(crate) fn resolve(which: Which, overrides: HashMap<String, Hook>) -> HashMap<String, Hook> {
    let registry = match which {
        Which::Validation => &VALIDATION,
        Which::Sanitization => &SANITIZATION,
    };
    let mut resolved = registry.snapshot();
    resolved.extend(overrides);
    resolved
}

/// Process-wide custom directives for validation runs.
pub mod validation {
    use super::*;

    /// Install directives for every later validation call.
    pub fn extend(entries: impl IntoIterator<Item = (impl Into<String>, Hook)>) {
        VALIDATION.extend(entries.into_iter().map(|(n, h)| (n.into(), h)));
    }

    /// Remove every process-wide validation directive.
    pub fn reset() {
        VALIDATION.reset();
    }
}

/// Process-wide custom directives for sanitization runs.
pub mod sanitization {
    use super::*;

    /// Install directives for every later sanitization call.
    pub fn extend(entries: impl IntoIterator<Item = (impl Into<String>, Hook)>) {
        SANITIZATION.extend(entries.into_iter().map(|(n, h)| (n.into(), h)));
    }

    /// Remove every process-wide sanitization directive.
    pub fn reset() {
        SANITIZATION.reset();
    }
}

/// Serializes tests that touch the process-wide registries. `reset`
/// clears a whole registry, so such tests cannot run interleaved.
#[cfg(test)]
pub(crate) fn test_mutex() -> &'static std::sync::Mutex<()> {
    static LOCK: OnceLock<std::sync::Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| std::sync::Mutex::new(()))
}
