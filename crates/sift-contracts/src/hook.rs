//! User-supplied hooks: `exec` entries and custom directives.
//!
//! A hook inspects (and in sanitization may replace) the value at one
//! node. The engine tells sync and async hooks apart by the enum tag, so
//! a schema's callers know up front whether the blocking entry points
//! are safe for it.
//!
//! Returning `Ok` with reports records soft violations; returning `Err`
//! (usually via `SiftError::fault`) aborts the whole inspection.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::SiftResult;
use crate::path::PropertyPath;

/// Everything a hook gets to look at.
#[derive(Debug, Clone)]
pub struct HookArgs {
    /// The value currently at this node. Sanitization hooks see the
    /// value after coercion, transforms, and child traversal.
    pub candidate: Value,

    /// Snapshot of the whole candidate taken when inspection started.
    pub origin: Arc<Value>,

    /// Where in the candidate this hook is running.
    pub path: PropertyPath,

    /// The directive argument (the value of the `$name` schema key) when
    /// the hook runs as a custom directive. `None` for `exec` hooks.
    pub directive: Option<Value>,
}

/// A report raised by a hook. Message and code fall back to the schema
/// node's `error`/`code` overrides, then to a generic default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookReport {
    pub message: Option<String>,
    pub code: Option<String>,
}

/// What a hook decided.
#[derive(Debug, Clone, Default)]
pub struct HookOutcome {
    /// Replacement value. Applied in sanitization, ignored in validation.
    pub replacement: Option<Value>,

    /// Soft violations to append at this node's path.
    pub reports: Vec<HookReport>,
}

impl HookOutcome {
    /// No change, no reports.
    pub fn pass() -> Self {
        HookOutcome::default()
    }

    /// Replace the node's value (sanitization only).
    pub fn replace(value: impl Into<Value>) -> Self {
        HookOutcome {
            replacement: Some(value.into()),
            reports: Vec::new(),
        }
    }

    /// Raise one report with the default message for this node.
    pub fn flag(mut self) -> Self {
        self.reports.push(HookReport::default());
        self
    }

    /// Raise one report with an explicit message.
    pub fn report(mut self, message: impl Into<String>) -> Self {
        self.reports.push(HookReport {
            message: Some(message.into()),
            code: None,
        });
        self
    }

    /// Raise one report with an explicit message and code.
    pub fn report_code(mut self, message: impl Into<String>, code: impl Into<String>) -> Self {
        self.reports.push(HookReport {
            message: Some(message.into()),
            code: Some(code.into()),
        });
        self
    }
}

pub type SyncHookFn = dyn Fn(&HookArgs) -> SiftResult<HookOutcome> + Send + Sync;
pub type AsyncHookFn = dyn Fn(HookArgs) -> BoxFuture<'static, SiftResult<HookOutcome>> + Send + Sync;

/// A sync or async hook. The variant is explicit so the engine never has
/// to guess how a callback wants to be driven.
#[derive(Clone)]
pub enum Hook {
    Sync(Arc<SyncHookFn>),
    Async(Arc<AsyncHookFn>),
}

impl Hook {
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&HookArgs) -> SiftResult<HookOutcome> + Send + Sync + 'static,
    {
        Hook::Sync(Arc::new(f))
    }

    /// Wrap a function returning a boxed future. The future must be
    /// `'static`; `HookArgs` is passed by value for exactly that reason.
    pub fn async_fn<F>(f: F) -> Self
    where
        F: Fn(HookArgs) -> BoxFuture<'static, SiftResult<HookOutcome>> + Send + Sync + 'static,
    {
        Hook::Async(Arc::new(f))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Hook::Async(_))
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::Sync(_) => f.write_str("Hook::Sync(..)"),
            Hook::Async(_) => f.write_str("Hook::Async(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SiftError;
    use serde_json::json;

    fn args(value: Value) -> HookArgs {
        HookArgs {
            candidate: value,
            origin: Arc::new(Value::Null),
            path: PropertyPath::root(),
            directive: None,
        }
    }

    #[test]
    fn sync_hook_runs_and_reports() {
        let hook = Hook::sync(|args| {
            if args.candidate.as_i64() == Some(13) {
                Ok(HookOutcome::pass().report("must not be thirteen"))
            } else {
                Ok(HookOutcome::pass())
            }
        });
        assert!(!hook.is_async());

        let Hook::Sync(f) = &hook else { unreachable!() };
        let outcome = f(&args(json!(13))).unwrap();
        assert_eq!(outcome.reports.len(), 1);
        assert_eq!(
            outcome.reports[0].message.as_deref(),
            Some("must not be thirteen")
        );
    }

    #[test]
    fn hook_fault_uses_the_error_channel() {
        let hook = Hook::sync(|_| Err(SiftError::fault("divisor must not equal 0")));
        let Hook::Sync(f) = &hook else { unreachable!() };
        let err = f(&args(json!(1))).unwrap_err();
        assert!(err.to_string().contains("divisor must not equal 0"));
    }

    #[test]
    fn outcome_builders_compose() {
        let outcome = HookOutcome::replace(json!("fixed"))
            .report_code("rewrote it", "R1")
            .flag();
        assert_eq!(outcome.replacement, Some(json!("fixed")));
        assert_eq!(outcome.reports.len(), 2);
        assert_eq!(outcome.reports[0].code.as_deref(), Some("R1"));
        assert!(outcome.reports[1].message.is_none());
    }
}
