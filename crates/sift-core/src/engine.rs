//! The shared traversal engine.
//!
//! One recursive walk serves both modes:
//!
//! 1. Type check (validation) or coercion toward the first declared
//!    kind (sanitization).
//! 2. The node's own constraints (validation) or adjustments
//!    (sanitization: string rules, padding/truncation, clamping).
//! 3. Structural recursion, driven by the value's actual shape: object
//!    properties in declaration order, then glob matches; array
//!    elements (uniform or positional); hash traversal for objects
//!    declaring `items`.
//! 4. Post checks: `someKeys`, `strict`, `uniqueness` (validation) or
//!    silent removal of undeclared keys (sanitization).
//! 5. Custom directives in declaration order, then exec hooks.
//!
//! Children are awaited through `join_all`, so sibling hooks may run
//! concurrently while their reports land in declared order. A hook
//! `Err` propagates out of the whole walk and discards every report.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{join_all, BoxFuture};
use serde_json::{Map, Value};
use tracing::debug;

use sift_contracts::{
    value_kind_name, Hook, HookArgs, HookOutcome, Items, Kind, PropertyPath, ReportEntry,
    SchemaNode, SiftResult,
};

use crate::{coercion, constraints};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Validate,
    Sanitize,
}

/// What one subtree produced: its (possibly rewritten) value and its
/// reports in walk order.
pub(crate) struct NodeOutcome {
    pub value: Value,
    pub reports: Vec<ReportEntry>,
}

pub(crate) struct Engine {
    mode: Mode,
    origin: Arc<Value>,
    directives: HashMap<String, Hook>,
}

impl Engine {
    pub fn new(mode: Mode, origin: Arc<Value>, directives: HashMap<String, Hook>) -> Self {
        Engine {
            mode,
            origin,
            directives,
        }
    }

    pub fn run<'a>(
        &'a self,
        schema: &'a SchemaNode,
        value: Value,
    ) -> BoxFuture<'a, SiftResult<NodeOutcome>> {
        self.walk(schema, value, PropertyPath::root())
    }

    fn walk<'a>(
        &'a self,
        schema: &'a SchemaNode,
        value: Value,
        path: PropertyPath,
    ) -> BoxFuture<'a, SiftResult<NodeOutcome>> {
        Box::pin(async move {
            let mut reports = Vec::new();
            let mut value = value;

            // Step 1: type check or coercion.
            if let Some(kinds) = &schema.kinds {
                if !kinds.iter().any(|k| k.matches(&value)) {
                    match self.mode {
                        Mode::Validate => {
                            let expected: Vec<&str> = kinds.iter().map(Kind::name).collect();
                            push(
                                &mut reports,
                                schema,
                                &path,
                                format!(
                                    "must be {}, but is {}",
                                    expected.join(" or "),
                                    value_kind_name(&value)
                                ),
                            );
                        }
                        Mode::Sanitize => {
                            let target = kinds[0];
                            match coercion::coerce(target, &value, schema) {
                                Some(coerced) => {
                                    debug!(path = %path, target = target.name(), "coerced value");
                                    value = coerced;
                                    push(
                                        &mut reports,
                                        schema,
                                        &path,
                                        format!("type coerced to {}", target.name()),
                                    );
                                }
                                None => match &schema.def {
                                    Some(def) => {
                                        value = def.clone();
                                        push(
                                            &mut reports,
                                            schema,
                                            &path,
                                            format!(
                                                "could not be coerced to {}, default value substituted",
                                                target.name()
                                            ),
                                        );
                                    }
                                    None => {
                                        push(
                                            &mut reports,
                                            schema,
                                            &path,
                                            format!("could not be coerced to {}", target.name()),
                                        );
                                    }
                                },
                            }
                        }
                    }
                }
            }

            // Step 2: the node's own constraints or adjustments.
            match self.mode {
                Mode::Validate => {
                    for message in constraints::check(schema, &value) {
                        push(&mut reports, schema, &path, message);
                    }
                }
                Mode::Sanitize => {
                    if let Some(adjusted) = coercion::adjust(&value, schema) {
                        value = adjusted;
                        push(
                            &mut reports,
                            schema,
                            &path,
                            "adjusted to match the schema constraints".to_string(),
                        );
                    }
                }
            }

            // Step 3: structural recursion.
            value = match value {
                Value::Object(map) => self.walk_object(schema, map, &path, &mut reports).await?,
                Value::Array(items) => self.walk_array(schema, items, &path, &mut reports).await?,
                other => other,
            };

            // Step 4: post checks over the reassembled value.
            if self.mode == Mode::Validate {
                self.post_checks(schema, &value, &path, &mut reports);
            }

            // Step 5: custom directives, then exec hooks.
            for (name, arg) in &schema.custom {
                let Some(hook) = self.directives.get(name) else {
                    debug!(directive = %name, path = %path, "unknown custom directive; skipping");
                    continue;
                };
                let outcome = self.run_hook(hook, &value, &path, Some(arg.clone())).await?;
                self.apply_hook_outcome(outcome, schema, &path, &mut value, &mut reports);
            }
            for hook in &schema.exec {
                let outcome = self.run_hook(hook, &value, &path, None).await?;
                self.apply_hook_outcome(outcome, schema, &path, &mut value, &mut reports);
            }

            Ok(NodeOutcome { value, reports })
        })
    }

    /// Walk an object value: declared properties in order, then glob
    /// matches, or hash traversal when the schema declares `items`
    /// instead of `properties`.
    async fn walk_object(
        &self,
        schema: &SchemaNode,
        mut map: Map<String, Value>,
        path: &PropertyPath,
        reports: &mut Vec<ReportEntry>,
    ) -> SiftResult<Value> {
        enum Slot<'s> {
            /// A missing key that only produces a report.
            Missing(ReportEntry),
            /// A child traversal, with an optional synthesis report
            /// preceding the subtree's own reports.
            Job {
                key: String,
                hash: bool,
                schema: &'s SchemaNode,
                value: Value,
                lead: Option<ReportEntry>,
            },
        }

        let mut slots: Vec<Slot> = Vec::new();

        if !schema.properties.is_empty() {
            for (key, child) in &schema.properties {
                if key == "*" {
                    continue;
                }
                match map.get(key) {
                    Some(v) => slots.push(Slot::Job {
                        key: key.clone(),
                        hash: false,
                        schema: child,
                        value: v.clone(),
                        lead: None,
                    }),
                    None => match self.mode {
                        Mode::Validate => {
                            if !child.optional {
                                slots.push(Slot::Missing(report_for(
                                    child,
                                    &path.key(key),
                                    "is missing and not optional".to_string(),
                                )));
                            }
                        }
                        Mode::Sanitize => {
                            // Default synthesis requires a declared type;
                            // optional does not suppress it.
                            if let (Some(def), Some(_)) = (&child.def, &child.kinds) {
                                slots.push(Slot::Job {
                                    key: key.clone(),
                                    hash: false,
                                    schema: child,
                                    value: def.clone(),
                                    lead: Some(report_for(
                                        child,
                                        &path.key(key),
                                        "was missing and default value inserted".to_string(),
                                    )),
                                });
                            }
                        }
                    },
                }
            }
            if let Some(glob) = schema.glob_schema() {
                for (key, v) in map.iter() {
                    if schema.declares_key(key) {
                        continue;
                    }
                    slots.push(Slot::Job {
                        key: key.clone(),
                        hash: false,
                        schema: glob,
                        value: v.clone(),
                        lead: None,
                    });
                }
            }
        } else if let Some(Items::Uniform(item)) = &schema.items {
            for (key, v) in map.iter() {
                slots.push(Slot::Job {
                    key: key.clone(),
                    hash: true,
                    schema: item,
                    value: v.clone(),
                    lead: None,
                });
            }
        }

        let children = slots.into_iter().map(|slot| {
            let path = &*path;
            async move {
                match slot {
                    Slot::Missing(entry) => Ok((None, vec![entry])),
                    Slot::Job {
                        key,
                        hash,
                        schema,
                        value,
                        lead,
                    } => {
                        let child_path = if hash { path.hash_key(&key) } else { path.key(&key) };
                        let outcome = self.walk(schema, value, child_path).await?;
                        let mut entries = Vec::with_capacity(outcome.reports.len() + 1);
                        entries.extend(lead);
                        entries.extend(outcome.reports);
                        Ok((Some((key, outcome.value)), entries))
                    }
                }
            }
        });

        for result in join_all(children).await {
            let (rewritten, entries): (Option<(String, Value)>, Vec<ReportEntry>) = result?;
            reports.extend(entries);
            if let Some((key, value)) = rewritten {
                map.insert(key, value);
            }
        }

        if self.mode == Mode::Sanitize
            && schema.strict
            && !schema.properties.is_empty()
            && schema.glob_schema().is_none()
        {
            let before = map.len();
            map.retain(|key, _| schema.declares_key(key));
            if map.len() != before {
                debug!(path = %path, removed = before - map.len(), "removed undeclared keys");
            }
        }

        Ok(Value::Object(map))
    }

    /// Walk an array value against its `items` schemas.
    async fn walk_array(
        &self,
        schema: &SchemaNode,
        items: Vec<Value>,
        path: &PropertyPath,
        reports: &mut Vec<ReportEntry>,
    ) -> SiftResult<Value> {
        enum Slot<'s> {
            Missing(ReportEntry),
            Job {
                schema: &'s SchemaNode,
                index: usize,
                value: Value,
                lead: Option<ReportEntry>,
            },
        }

        let Some(items_schema) = &schema.items else {
            return Ok(Value::Array(items));
        };

        let mut slots: Vec<Slot> = Vec::new();
        let mut tail: Vec<Value> = Vec::new();

        match items_schema {
            Items::Uniform(item) => {
                for (index, value) in items.into_iter().enumerate() {
                    slots.push(Slot::Job {
                        schema: item,
                        index,
                        value,
                        lead: None,
                    });
                }
            }
            Items::Tuple(tuple) => {
                let mut rest = items;
                if rest.len() > tuple.len() {
                    // Elements past the declared positions pass through.
                    tail = rest.split_off(tuple.len());
                }
                let mut present = rest.into_iter();
                for (index, child) in tuple.iter().enumerate() {
                    match present.next() {
                        Some(value) => slots.push(Slot::Job {
                            schema: child,
                            index,
                            value,
                            lead: None,
                        }),
                        None => match self.mode {
                            Mode::Validate => {
                                if !child.optional {
                                    slots.push(Slot::Missing(report_for(
                                        child,
                                        &path.index(index),
                                        "is missing and not optional".to_string(),
                                    )));
                                }
                            }
                            Mode::Sanitize => {
                                if let (Some(def), Some(_)) = (&child.def, &child.kinds) {
                                    slots.push(Slot::Job {
                                        schema: child,
                                        index,
                                        value: def.clone(),
                                        lead: Some(report_for(
                                            child,
                                            &path.index(index),
                                            "was missing and default value inserted".to_string(),
                                        )),
                                    });
                                }
                            }
                        },
                    }
                }
            }
        }

        let children = slots.into_iter().map(|slot| {
            let path = &*path;
            async move {
                match slot {
                    Slot::Missing(entry) => Ok((None, vec![entry])),
                    Slot::Job {
                        schema,
                        index,
                        value,
                        lead,
                    } => {
                        let outcome = self.walk(schema, value, path.index(index)).await?;
                        let mut entries = Vec::with_capacity(outcome.reports.len() + 1);
                        entries.extend(lead);
                        entries.extend(outcome.reports);
                        Ok((Some(outcome.value), entries))
                    }
                }
            }
        });

        let mut rebuilt: Vec<Value> = Vec::new();
        for result in join_all(children).await {
            let (value, entries): (Option<Value>, Vec<ReportEntry>) = result?;
            reports.extend(entries);
            rebuilt.extend(value);
        }
        rebuilt.extend(tail);

        Ok(Value::Array(rebuilt))
    }

    /// Validation-only checks that need the fully traversed value:
    /// `someKeys`, `strict`, and `uniqueness`.
    fn post_checks(
        &self,
        schema: &SchemaNode,
        value: &Value,
        path: &PropertyPath,
        reports: &mut Vec<ReportEntry>,
    ) {
        if !schema.some_keys.is_empty() {
            if let Some(obj) = value.as_object() {
                if !schema.some_keys.iter().any(|key| obj.contains_key(key)) {
                    push(
                        reports,
                        schema,
                        path,
                        format!("must have at least key {}", or_join(&schema.some_keys)),
                    );
                }
            }
        }

        if schema.strict && !schema.properties.is_empty() && schema.glob_schema().is_none() {
            if let Some(obj) = value.as_object() {
                let extra: Vec<String> = obj
                    .keys()
                    .filter(|key| !schema.declares_key(key))
                    .cloned()
                    .collect();
                if !extra.is_empty() {
                    let listed: Vec<String> =
                        extra.iter().map(|key| format!("\"{}\"", key)).collect();
                    push(
                        reports,
                        schema,
                        path,
                        format!("must not contain undeclared keys {}", listed.join(", ")),
                    );
                }
            }
        }

        if schema.uniqueness {
            if let Some(items) = value.as_array() {
                for i in 0..items.len() {
                    for j in (i + 1)..items.len() {
                        if items[i] == items[j] {
                            push(
                                reports,
                                schema,
                                path,
                                format!("has duplicate items at indexes {} and {}", i, j),
                            );
                        }
                    }
                }
            }
        }
    }

    async fn run_hook(
        &self,
        hook: &Hook,
        value: &Value,
        path: &PropertyPath,
        directive: Option<Value>,
    ) -> SiftResult<HookOutcome> {
        let args = HookArgs {
            candidate: value.clone(),
            origin: Arc::clone(&self.origin),
            path: path.clone(),
            directive,
        };
        match hook {
            Hook::Sync(f) => f(&args),
            Hook::Async(f) => f(args).await,
        }
    }

    /// Fold a hook's decision into the node. Replacements only apply in
    /// sanitization; report messages and codes fall back to the node's
    /// overrides, then to a generic default.
    fn apply_hook_outcome(
        &self,
        outcome: HookOutcome,
        schema: &SchemaNode,
        path: &PropertyPath,
        value: &mut Value,
        reports: &mut Vec<ReportEntry>,
    ) {
        if self.mode == Mode::Sanitize {
            if let Some(replacement) = outcome.replacement {
                *value = replacement;
            }
        }
        for report in outcome.reports {
            let message = report
                .message
                .or_else(|| schema.error.clone())
                .unwrap_or_else(|| "is not valid".to_string());
            let code = report.code.or_else(|| schema.code.clone());
            let mut entry = ReportEntry::new(render_property(schema, path), message);
            if let Some(code) = code {
                entry = entry.with_code(code);
            }
            reports.push(entry);
        }
    }
}

// ── Report helpers ────────────────────────────────────────────────────────────

fn render_property(schema: &SchemaNode, path: &PropertyPath) -> String {
    match &schema.alias {
        Some(alias) => format!("{} ({})", alias, path),
        None => path.to_string(),
    }
}

/// Build a report honoring the node's `alias`, `error`, and `code`.
fn report_for(schema: &SchemaNode, path: &PropertyPath, default_message: String) -> ReportEntry {
    let message = schema.error.clone().unwrap_or(default_message);
    let mut entry = ReportEntry::new(render_property(schema, path), message);
    if let Some(code) = &schema.code {
        entry = entry.with_code(code.clone());
    }
    entry
}

fn push(reports: &mut Vec<ReportEntry>, schema: &SchemaNode, path: &PropertyPath, message: String) {
    reports.push(report_for(schema, path, message));
}

/// `"a", "b" or "c"` — the rendering used by `someKeys` reports.
fn or_join(keys: &[String]) -> String {
    let quoted: Vec<String> = keys.iter().map(|key| format!("\"{}\"", key)).collect();
    match quoted.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} or {}", rest.join(", "), last),
    }
}
