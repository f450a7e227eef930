//! The schema node model.
//!
//! A schema is a tree of `SchemaNode`s mirroring the candidate's shape.
//! Nodes are built through the consuming builder methods, or loaded from
//! a JSON document via [`SchemaNode::from_json`] (hooks excluded — JSON
//! cannot carry closures).
//!
//! Property declaration order is significant: missing-key reports and
//! child traversal follow the order in which `property` was called.

use serde_json::Value;

use crate::error::{SiftError, SiftResult};
use crate::hook::Hook;

// ── Type vocabulary ───────────────────────────────────────────────────────────

/// A type alternative a value can be checked against.
///
/// `Integer` is a number with zero fractional part. `Date` is a string
/// that parses under RFC 3339. `Any` matches every value, including null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Date,
    Null,
    Any,
}

impl Kind {
    /// Does `value` satisfy this type alternative?
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Kind::String => value.is_string(),
            Kind::Number => value.is_number(),
            Kind::Integer => match value {
                Value::Number(n) => {
                    n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
                }
                _ => false,
            },
            Kind::Boolean => value.is_boolean(),
            Kind::Object => value.is_object(),
            Kind::Array => value.is_array(),
            Kind::Date => value
                .as_str()
                .is_some_and(|s| chrono::DateTime::parse_from_rfc3339(s).is_ok()),
            Kind::Null => value.is_null(),
            Kind::Any => true,
        }
    }

    /// The name used in schema documents and report messages.
    pub fn name(&self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Number => "number",
            Kind::Integer => "integer",
            Kind::Boolean => "boolean",
            Kind::Object => "object",
            Kind::Array => "array",
            Kind::Date => "date",
            Kind::Null => "null",
            Kind::Any => "any",
        }
    }

    /// Parse a type name as it appears in a schema document.
    pub fn parse(name: &str) -> SiftResult<Self> {
        match name {
            "string" => Ok(Kind::String),
            "number" => Ok(Kind::Number),
            "integer" => Ok(Kind::Integer),
            "boolean" => Ok(Kind::Boolean),
            "object" => Ok(Kind::Object),
            "array" => Ok(Kind::Array),
            "date" => Ok(Kind::Date),
            "null" => Ok(Kind::Null),
            "any" => Ok(Kind::Any),
            other => Err(SiftError::InvalidSchema {
                reason: format!("unknown type name '{}'", other),
            }),
        }
    }
}

/// The basic JSON shape of a value, for "but is ..." report messages.
pub fn value_kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ── Auxiliary schema pieces ───────────────────────────────────────────────────

/// String rewriting rules applied during sanitization, in declaration
/// order, before any length padding or truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringRule {
    /// Strip leading and trailing whitespace.
    Trim,
    /// Lowercase the whole string.
    Lower,
    /// Uppercase the whole string.
    Upper,
    /// Uppercase the first letter of every word, lowercase the rest.
    Capitalize,
    /// Uppercase the first character, lowercase the rest.
    Ucfirst,
}

impl StringRule {
    pub fn parse(name: &str) -> SiftResult<Self> {
        match name {
            "trim" => Ok(StringRule::Trim),
            "lower" => Ok(StringRule::Lower),
            "upper" => Ok(StringRule::Upper),
            "capitalize" => Ok(StringRule::Capitalize),
            "ucfirst" => Ok(StringRule::Ucfirst),
            other => Err(SiftError::InvalidSchema {
                reason: format!("unknown string rule '{}'", other),
            }),
        }
    }
}

/// One `pattern` alternative. A string passes the constraint if ANY
/// alternative accepts it.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// A named entry in the format registry, e.g. `"email"`.
    Named(String),
    /// An inline regular expression.
    Regex(regex::Regex),
}

/// Element schemas for arrays, and value schemas for hash traversal of
/// objects that declare `items` instead of `properties`.
#[derive(Debug, Clone)]
pub enum Items {
    /// Every element is checked against the same schema.
    Uniform(Box<SchemaNode>),
    /// Position i is checked against schema i; extra elements are left
    /// alone, missing positions are treated like missing properties.
    Tuple(Vec<SchemaNode>),
}

// ── SchemaNode ────────────────────────────────────────────────────────────────

/// One node of a schema tree.
///
/// All fields are optional; an empty node matches everything and does
/// nothing. Constraints are only applied when the candidate value has a
/// shape they make sense for (numeric bounds on numbers, length checks
/// on strings and arrays, and so on).
#[derive(Debug, Clone, Default)]
pub struct SchemaNode {
    /// Type alternatives. A value matches if ANY alternative matches.
    pub kinds: Option<Vec<Kind>>,

    /// A missing key with `optional: true` is skipped silently.
    pub optional: bool,

    /// Default inserted by sanitization for a missing key, or used as a
    /// fallback when a coercion fails. Requires a declared type to fire
    /// for missing keys.
    pub def: Option<Value>,

    /// Child property schemas in declaration order. The key `"*"` is the
    /// glob entry matching every not-literally-declared key.
    pub properties: Vec<(String, SchemaNode)>,

    /// Element schemas (arrays) or hash-value schema (objects without
    /// `properties`).
    pub items: Option<Items>,

    /// Validation: report undeclared keys. Sanitization: remove them
    /// silently. A declared glob disarms strict entirely.
    pub strict: bool,

    /// At least one of these keys must be present on an object value.
    pub some_keys: Vec<String>,

    /// Report duplicate element pairs (strict `Value` equality).
    pub uniqueness: bool,

    // Numeric bounds (validation).
    pub gt: Option<f64>,
    pub gte: Option<f64>,
    pub lt: Option<f64>,
    pub lte: Option<f64>,
    pub multiple_of: Option<f64>,

    /// Value must equal one of these (strict `Value` equality).
    pub eq: Option<Vec<Value>>,

    /// Value must differ from every one of these.
    pub ne: Vec<Value>,

    // Length constraints, on strings and arrays.
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub exact_length: Option<usize>,

    /// Pattern alternatives for string values.
    pub pattern: Vec<Pattern>,

    // Sanitization-only knobs.
    /// Clamp floor; falls back to `gte` when absent.
    pub min: Option<f64>,
    /// Clamp ceiling; falls back to `lte` when absent.
    pub max: Option<f64>,
    pub rules: Vec<StringRule>,
    /// Separator for string-to-array splitting. Default `","`.
    pub split_with: Option<String>,
    /// Separator for array-to-string joining. Default `","`.
    pub join_with: Option<String>,

    // Reporting overrides.
    /// Rendered as `alias (@.path)` in report properties.
    pub alias: Option<String>,
    /// Replaces the default message of every report raised at this node.
    pub error: Option<String>,
    /// Attached to every report raised at this node.
    pub code: Option<String>,

    /// Exec hooks, run in order after everything else at the node.
    pub exec: Vec<Hook>,

    /// Custom directives: `(name, argument)` pairs, run in declaration
    /// order before exec hooks. Names are stored without the `$` prefix
    /// used in JSON schema documents.
    pub custom: Vec<(String, Value)>,
}

impl SchemaNode {
    // ── Constructors ─────────────────────────────────────────────────────────

    /// A node with no type constraint.
    pub fn untyped() -> Self {
        SchemaNode::default()
    }

    pub fn of(kind: Kind) -> Self {
        SchemaNode {
            kinds: Some(vec![kind]),
            ..SchemaNode::default()
        }
    }

    /// A node accepting any of the given type alternatives.
    pub fn one_of(kinds: impl IntoIterator<Item = Kind>) -> Self {
        SchemaNode {
            kinds: Some(kinds.into_iter().collect()),
            ..SchemaNode::default()
        }
    }

    pub fn string() -> Self {
        Self::of(Kind::String)
    }

    pub fn number() -> Self {
        Self::of(Kind::Number)
    }

    pub fn integer() -> Self {
        Self::of(Kind::Integer)
    }

    pub fn boolean() -> Self {
        Self::of(Kind::Boolean)
    }

    pub fn object() -> Self {
        Self::of(Kind::Object)
    }

    pub fn array() -> Self {
        Self::of(Kind::Array)
    }

    pub fn date() -> Self {
        Self::of(Kind::Date)
    }

    pub fn any() -> Self {
        Self::of(Kind::Any)
    }

    // ── Structure ────────────────────────────────────────────────────────────

    pub fn property(mut self, name: impl Into<String>, child: SchemaNode) -> Self {
        self.properties.push((name.into(), child));
        self
    }

    /// Declare the glob entry, matching every not-literally-declared key.
    pub fn glob(self, child: SchemaNode) -> Self {
        self.property("*", child)
    }

    /// Uniform element schema.
    pub fn items(mut self, child: SchemaNode) -> Self {
        self.items = Some(Items::Uniform(Box::new(child)));
        self
    }

    /// Positional element schemas.
    pub fn tuple(mut self, children: impl IntoIterator<Item = SchemaNode>) -> Self {
        self.items = Some(Items::Tuple(children.into_iter().collect()));
        self
    }

    // ── Presence and defaults ────────────────────────────────────────────────

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn def(mut self, value: impl Into<Value>) -> Self {
        self.def = Some(value.into());
        self
    }

    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn some_keys(mut self, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.some_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Duplicate elements compare with strict `Value` equality; `1` and
    /// `1.0` are distinct, as are `1` and `"1"`.
    pub fn unique(mut self) -> Self {
        self.uniqueness = true;
        self
    }

    // ── Scalar constraints ───────────────────────────────────────────────────

    pub fn gt(mut self, bound: f64) -> Self {
        self.gt = Some(bound);
        self
    }

    pub fn gte(mut self, bound: f64) -> Self {
        self.gte = Some(bound);
        self
    }

    pub fn lt(mut self, bound: f64) -> Self {
        self.lt = Some(bound);
        self
    }

    pub fn lte(mut self, bound: f64) -> Self {
        self.lte = Some(bound);
        self
    }

    pub fn multiple_of(mut self, divisor: f64) -> Self {
        self.multiple_of = Some(divisor);
        self
    }

    /// Value must equal one of `values` (strict `Value` equality).
    pub fn eq(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.eq = Some(values.into_iter().collect());
        self
    }

    /// Value must differ from `value`. May be called repeatedly.
    pub fn ne(mut self, value: impl Into<Value>) -> Self {
        self.ne.push(value.into());
        self
    }

    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = Some(len);
        self
    }

    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    pub fn exact_length(mut self, len: usize) -> Self {
        self.exact_length = Some(len);
        self
    }

    /// Add a named-format pattern alternative.
    pub fn pattern_format(mut self, name: impl Into<String>) -> Self {
        self.pattern.push(Pattern::Named(name.into()));
        self
    }

    /// Add an inline regex pattern alternative.
    pub fn pattern_regex(mut self, re: regex::Regex) -> Self {
        self.pattern.push(Pattern::Regex(re));
        self
    }

    // ── Sanitization knobs ───────────────────────────────────────────────────

    pub fn min(mut self, bound: f64) -> Self {
        self.min = Some(bound);
        self
    }

    pub fn max(mut self, bound: f64) -> Self {
        self.max = Some(bound);
        self
    }

    pub fn rule(mut self, rule: StringRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = StringRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn split_with(mut self, sep: impl Into<String>) -> Self {
        self.split_with = Some(sep.into());
        self
    }

    pub fn join_with(mut self, sep: impl Into<String>) -> Self {
        self.join_with = Some(sep.into());
        self
    }

    // ── Reporting overrides ──────────────────────────────────────────────────

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    // ── Hooks ────────────────────────────────────────────────────────────────

    pub fn exec(mut self, hook: Hook) -> Self {
        self.exec.push(hook);
        self
    }

    /// Attach a custom directive invocation (`$name` in JSON documents).
    pub fn directive(mut self, name: impl Into<String>, arg: impl Into<Value>) -> Self {
        self.custom.push((name.into(), arg.into()));
        self
    }

    // ── Introspection used by the engine ─────────────────────────────────────

    /// The glob child schema, when `"*"` is declared.
    pub fn glob_schema(&self) -> Option<&SchemaNode> {
        self.properties
            .iter()
            .find(|(k, _)| k == "*")
            .map(|(_, s)| s)
    }

    /// Is `key` literally declared (glob excluded)?
    pub fn declares_key(&self, key: &str) -> bool {
        self.properties.iter().any(|(k, _)| k != "*" && k == key)
    }
}

// ── JSON loader ───────────────────────────────────────────────────────────────

impl SchemaNode {
    /// Build a schema tree from a JSON document.
    ///
    /// Accepted keys: `type` (string or array of type names), `optional`
    /// (bool, or the strings `"true"`/`"false"`), `def`, `strict`,
    /// `someKeys`, `uniqueness`, `properties`, `items` (object for
    /// uniform, array for tuple), `gt`/`gte`/`lt`/`lte`/`min`/`max`/
    /// `multipleOf`, `eq`/`ne` (scalar or array), `minLength`/
    /// `maxLength`/`exactLength`, `pattern` (string or array; a string
    /// made only of letters, digits, and dashes is a format name,
    /// anything else compiles as a regex), `rules`, `splitWith`,
    /// `joinWith`, `alias`, `error`, `code`. Keys starting with `$`
    /// become custom directives. Unknown keys are ignored. Hooks cannot
    /// be expressed in JSON; attach them through the builder.
    pub fn from_json(value: &Value) -> SiftResult<Self> {
        let obj = value.as_object().ok_or_else(|| SiftError::InvalidSchema {
            reason: format!("schema node must be an object, got {}", value_kind_name(value)),
        })?;

        let mut node = SchemaNode::default();
        for (key, v) in obj {
            if let Some(name) = key.strip_prefix('$') {
                node.custom.push((name.to_string(), v.clone()));
                continue;
            }
            match key.as_str() {
                "type" => node.kinds = Some(parse_kinds(v)?),
                "optional" => node.optional = parse_flag(v, "optional")?,
                "def" => node.def = Some(v.clone()),
                "strict" => node.strict = parse_flag(v, "strict")?,
                "someKeys" => node.some_keys = parse_string_list(v, "someKeys")?,
                "uniqueness" => node.uniqueness = parse_flag(v, "uniqueness")?,
                "properties" => {
                    let props = v.as_object().ok_or_else(|| SiftError::InvalidSchema {
                        reason: "properties must be an object".to_string(),
                    })?;
                    for (name, child) in props {
                        node.properties.push((name.clone(), Self::from_json(child)?));
                    }
                }
                "items" => {
                    node.items = Some(match v {
                        Value::Array(list) => Items::Tuple(
                            list.iter().map(Self::from_json).collect::<SiftResult<_>>()?,
                        ),
                        other => Items::Uniform(Box::new(Self::from_json(other)?)),
                    })
                }
                "gt" => node.gt = Some(parse_number(v, "gt")?),
                "gte" => node.gte = Some(parse_number(v, "gte")?),
                "lt" => node.lt = Some(parse_number(v, "lt")?),
                "lte" => node.lte = Some(parse_number(v, "lte")?),
                "min" => node.min = Some(parse_number(v, "min")?),
                "max" => node.max = Some(parse_number(v, "max")?),
                "multipleOf" => node.multiple_of = Some(parse_number(v, "multipleOf")?),
                "eq" => {
                    node.eq = Some(match v {
                        Value::Array(list) => list.clone(),
                        other => vec![other.clone()],
                    })
                }
                "ne" => {
                    node.ne = match v {
                        Value::Array(list) => list.clone(),
                        other => vec![other.clone()],
                    }
                }
                "minLength" => node.min_length = Some(parse_length(v, "minLength")?),
                "maxLength" => node.max_length = Some(parse_length(v, "maxLength")?),
                "exactLength" => node.exact_length = Some(parse_length(v, "exactLength")?),
                "pattern" => node.pattern = parse_patterns(v)?,
                "rules" => {
                    for name in parse_string_list(v, "rules")? {
                        node.rules.push(StringRule::parse(&name)?);
                    }
                }
                "splitWith" => node.split_with = Some(parse_string(v, "splitWith")?),
                "joinWith" => node.join_with = Some(parse_string(v, "joinWith")?),
                "alias" => node.alias = Some(parse_string(v, "alias")?),
                "error" => node.error = Some(parse_string(v, "error")?),
                "code" => node.code = Some(parse_string(v, "code")?),
                "exec" => {
                    return Err(SiftError::InvalidSchema {
                        reason: "exec hooks cannot be expressed in a JSON schema document"
                            .to_string(),
                    })
                }
                _ => {}
            }
        }
        Ok(node)
    }
}

fn parse_kinds(v: &Value) -> SiftResult<Vec<Kind>> {
    match v {
        Value::String(name) => Ok(vec![Kind::parse(name)?]),
        Value::Array(names) => names
            .iter()
            .map(|n| {
                n.as_str()
                    .ok_or_else(|| SiftError::InvalidSchema {
                        reason: "type array entries must be strings".to_string(),
                    })
                    .and_then(Kind::parse)
            })
            .collect(),
        other => Err(SiftError::InvalidSchema {
            reason: format!("type must be a string or array, got {}", value_kind_name(other)),
        }),
    }
}

fn parse_flag(v: &Value, key: &str) -> SiftResult<bool> {
    match v {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s == "true" => Ok(true),
        Value::String(s) if s == "false" => Ok(false),
        other => Err(SiftError::InvalidSchema {
            reason: format!("{} must be a boolean, got {}", key, value_kind_name(other)),
        }),
    }
}

fn parse_number(v: &Value, key: &str) -> SiftResult<f64> {
    v.as_f64().ok_or_else(|| SiftError::InvalidSchema {
        reason: format!("{} must be a number, got {}", key, value_kind_name(v)),
    })
}

fn parse_length(v: &Value, key: &str) -> SiftResult<usize> {
    v.as_u64()
        .map(|n| n as usize)
        .ok_or_else(|| SiftError::InvalidSchema {
            reason: format!(
                "{} must be a non-negative integer, got {}",
                key,
                value_kind_name(v)
            ),
        })
}

fn parse_string(v: &Value, key: &str) -> SiftResult<String> {
    v.as_str()
        .map(str::to_string)
        .ok_or_else(|| SiftError::InvalidSchema {
            reason: format!("{} must be a string, got {}", key, value_kind_name(v)),
        })
}

fn parse_string_list(v: &Value, key: &str) -> SiftResult<Vec<String>> {
    match v {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Array(list) => list
            .iter()
            .map(|e| {
                e.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| SiftError::InvalidSchema {
                        reason: format!("{} entries must be strings", key),
                    })
            })
            .collect(),
        other => Err(SiftError::InvalidSchema {
            reason: format!(
                "{} must be a string or array of strings, got {}",
                key,
                value_kind_name(other)
            ),
        }),
    }
}

fn parse_patterns(v: &Value) -> SiftResult<Vec<Pattern>> {
    let one = |s: &str| -> SiftResult<Pattern> {
        let named_like = !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');
        if named_like {
            Ok(Pattern::Named(s.to_string()))
        } else {
            regex::Regex::new(s)
                .map(Pattern::Regex)
                .map_err(|e| SiftError::InvalidSchema {
                    reason: format!("invalid pattern regex '{}': {}", s, e),
                })
        }
    };
    match v {
        Value::String(s) => Ok(vec![one(s)?]),
        Value::Array(list) => list
            .iter()
            .map(|e| {
                e.as_str()
                    .ok_or_else(|| SiftError::InvalidSchema {
                        reason: "pattern array entries must be strings".to_string(),
                    })
                    .and_then(one)
            })
            .collect(),
        other => Err(SiftError::InvalidSchema {
            reason: format!(
                "pattern must be a string or array of strings, got {}",
                value_kind_name(other)
            ),
        }),
    }
}
