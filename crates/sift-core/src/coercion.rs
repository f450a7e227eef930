//! Sanitization-side value rewriting: type casts and in-place
//! adjustments (string rules, length padding and truncation, numeric
//! clamping).
//!
//! Casts are total functions from the source value; a cast that cannot
//! produce the target kind returns `None` and the engine falls back to
//! the node's `def` (or leaves the value and reports the failed cast).

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde_json::{Number, Value};

use sift_contracts::{Kind, SchemaNode, StringRule};

const DEFAULT_SEPARATOR: &str = ",";

// ── Casts ─────────────────────────────────────────────────────────────────────

/// Cast `value` toward `kind`. `None` means the cast is impossible.
pub(crate) fn coerce(kind: Kind, value: &Value, node: &SchemaNode) -> Option<Value> {
    match kind {
        Kind::String => to_string(value, node),
        Kind::Number => to_f64(value).map(number_value),
        Kind::Integer => to_f64(value).map(|f| number_value(f.trunc())),
        Kind::Boolean => Some(Value::Bool(truthy(value))),
        Kind::Object => to_object(value),
        Kind::Array => Some(to_array(value, node)),
        Kind::Date => to_date(value),
        // A declared `any` or `null` alternative always matches, so the
        // engine never asks to coerce toward these.
        Kind::Any | Kind::Null => None,
    }
}

fn to_string(value: &Value, node: &SchemaNode) -> Option<Value> {
    let s = match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        Value::Array(items) => {
            let sep = node.join_with.as_deref().unwrap_or(DEFAULT_SEPARATOR);
            let parts: Vec<String> = items.iter().map(element_string).collect();
            parts.join(sep)
        }
        Value::Object(_) => serde_json::to_string(value).ok()?,
    };
    Some(Value::String(s))
}

/// How one array element renders inside a joined string.
fn element_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => {
            // Spaces act as thousands separators, a comma as the
            // decimal mark: "1 500" → 1500, "14,45" → 14.45.
            let cleaned = s.replace(' ', "").replace(',', ".");
            if cleaned.is_empty() {
                return None;
            }
            if let Ok(f) = cleaned.parse::<f64>() {
                if f.is_finite() {
                    return Some(f);
                }
            }
            // A date string becomes its epoch-millisecond timestamp.
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.timestamp_millis() as f64)
        }
        _ => None,
    }
}

/// Keep integral results as JSON integers so `16.0` comes out as `16`.
fn number_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < 9.0e15 {
        if f < 0.0 {
            return Value::Number(Number::from(f as i64));
        }
        return Value::Number(Number::from(f as u64));
    }
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

/// Only `0`, `""`, and `null` are falsy.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn to_object(value: &Value) -> Option<Value> {
    match value {
        Value::Object(_) => Some(value.clone()),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(parsed) if parsed.is_object() => Some(parsed),
            _ => None,
        },
        _ => None,
    }
}

fn to_array(value: &Value, node: &SchemaNode) -> Value {
    match value {
        Value::Array(_) => value.clone(),
        Value::Null => Value::Array(vec![Value::Null]),
        Value::String(s) => {
            if s.trim_start().starts_with('[') {
                if let Ok(parsed) = serde_json::from_str::<Value>(s) {
                    if parsed.is_array() {
                        return parsed;
                    }
                }
            }
            let sep = match node.split_with.as_deref() {
                Some(sep) if !sep.is_empty() => sep,
                _ => DEFAULT_SEPARATOR,
            };
            Value::Array(
                s.split(sep)
                    .map(|piece| Value::String(piece.to_string()))
                    .collect(),
            )
        }
        other => Value::Array(vec![other.clone()]),
    }
}

fn to_date(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true))),
        Value::Number(n) => {
            let millis = n.as_i64()?;
            Utc.timestamp_millis_opt(millis)
                .single()
                .map(|dt| Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)))
        }
        _ => None,
    }
}

// ── Adjustments ───────────────────────────────────────────────────────────────

/// Apply string rules, length padding/truncation, and numeric clamping.
///
/// Returns `Some(new_value)` only when something actually changed, so
/// the engine can report exactly once per adjusted node.
pub(crate) fn adjust(value: &Value, node: &SchemaNode) -> Option<Value> {
    match value {
        Value::String(s) => {
            let mut out = s.clone();
            for rule in &node.rules {
                out = apply_rule(*rule, &out);
            }
            out = apply_length(out, node);
            (&out != s).then(|| Value::String(out))
        }
        Value::Number(n) => {
            let f = n.as_f64()?;
            let mut clamped = f;
            if let Some(floor) = node.min.or(node.gte) {
                clamped = clamped.max(floor);
            }
            if let Some(ceiling) = node.max.or(node.lte) {
                clamped = clamped.min(ceiling);
            }
            (clamped != f).then(|| number_value(clamped))
        }
        _ => None,
    }
}

fn apply_rule(rule: StringRule, s: &str) -> String {
    match rule {
        StringRule::Trim => s.trim().to_string(),
        StringRule::Lower => s.to_lowercase(),
        StringRule::Upper => s.to_uppercase(),
        StringRule::Capitalize => capitalize_words(s),
        StringRule::Ucfirst => ucfirst(s),
    }
}

fn capitalize_words(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphanumeric() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

fn ucfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => {
            let mut out: String = first.to_uppercase().collect();
            out.push_str(&chars.as_str().to_lowercase());
            out
        }
        None => String::new(),
    }
}

/// Pad (with `-`) or truncate to satisfy the length constraints.
/// `exact_length` wins over the min/max pair.
fn apply_length(s: String, node: &SchemaNode) -> String {
    let len = s.chars().count();
    if let Some(exact) = node.exact_length {
        if len > exact {
            return s.chars().take(exact).collect();
        }
        if len < exact {
            return pad_to(s, exact);
        }
        return s;
    }
    if let Some(max) = node.max_length {
        if len > max {
            return s.chars().take(max).collect();
        }
    }
    if let Some(min) = node.min_length {
        if len < min {
            return pad_to(s, min);
        }
    }
    s
}

fn pad_to(mut s: String, target: usize) -> String {
    let mut len = s.chars().count();
    while len < target {
        s.push('-');
        len += 1;
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plain() -> SchemaNode {
        SchemaNode::untyped()
    }

    // ── Casts toward string ──────────────────────────────────────────────────

    #[test]
    fn scalars_cast_to_their_display_form() {
        assert_eq!(coerce(Kind::String, &json!(true), &plain()), Some(json!("true")));
        assert_eq!(
            coerce(Kind::String, &json!(3.1459), &plain()),
            Some(json!("3.1459"))
        );
        assert_eq!(coerce(Kind::String, &json!(null), &plain()), Some(json!("")));
    }

    #[test]
    fn arrays_join_with_the_declared_separator() {
        let list = json!([1, "two", null, true]);
        assert_eq!(
            coerce(Kind::String, &list, &plain()),
            Some(json!("1,two,null,true"))
        );
        let node = plain().join_with(" | ");
        assert_eq!(
            coerce(Kind::String, &list, &node),
            Some(json!("1 | two | null | true"))
        );
    }

    #[test]
    fn objects_cast_to_compact_json() {
        assert_eq!(
            coerce(Kind::String, &json!({ "a": 1 }), &plain()),
            Some(json!("{\"a\":1}"))
        );
    }

    // ── Casts toward numbers ─────────────────────────────────────────────────

    #[test]
    fn numeric_strings_parse_with_comma_and_spaces() {
        assert_eq!(coerce(Kind::Number, &json!("14,45"), &plain()), Some(json!(14.45)));
        assert_eq!(coerce(Kind::Number, &json!("1 500"), &plain()), Some(json!(1500)));
        assert_eq!(coerce(Kind::Integer, &json!("16,2"), &plain()), Some(json!(16)));
        assert_eq!(coerce(Kind::Integer, &json!(-12.75), &plain()), Some(json!(-12)));
        assert_eq!(coerce(Kind::Integer, &json!(""), &plain()), None);
        assert_eq!(coerce(Kind::Number, &json!("wat"), &plain()), None);
    }

    #[test]
    fn date_strings_become_epoch_milliseconds() {
        assert_eq!(
            coerce(Kind::Integer, &json!("1970-01-01T00:00:00.300Z"), &plain()),
            Some(json!(300))
        );
    }

    // ── Casts toward boolean ─────────────────────────────────────────────────

    #[test]
    fn only_zero_empty_and_null_are_falsy() {
        for v in [json!(0), json!(""), json!(null)] {
            assert_eq!(coerce(Kind::Boolean, &v, &plain()), Some(json!(false)));
        }
        for v in [json!(12), json!(-12), json!("false"), json!([0]), json!({})] {
            assert_eq!(coerce(Kind::Boolean, &v, &plain()), Some(json!(true)));
        }
    }

    // ── Casts toward object and array ────────────────────────────────────────

    #[test]
    fn json_strings_parse_into_objects() {
        assert_eq!(
            coerce(Kind::Object, &json!("{\"a\":[1,2]}"), &plain()),
            Some(json!({ "a": [1, 2] }))
        );
        assert_eq!(coerce(Kind::Object, &json!("[1,2]"), &plain()), None);
        assert_eq!(coerce(Kind::Object, &json!("not json"), &plain()), None);
    }

    #[test]
    fn strings_split_into_arrays_unless_they_are_json() {
        assert_eq!(
            coerce(Kind::Array, &json!("one,two,three"), &plain()),
            Some(json!(["one", "two", "three"]))
        );
        let node = plain().split_with(";");
        assert_eq!(
            coerce(Kind::Array, &json!("a;b"), &node),
            Some(json!(["a", "b"]))
        );
        assert_eq!(
            coerce(Kind::Array, &json!("[1,\"two\",{\"three\":true}]"), &plain()),
            Some(json!([1, "two", { "three": true }]))
        );
        assert_eq!(coerce(Kind::Array, &json!(null), &plain()), Some(json!([null])));
        assert_eq!(coerce(Kind::Array, &json!(42), &plain()), Some(json!([42])));
    }

    // ── Casts toward date ────────────────────────────────────────────────────

    #[test]
    fn dates_normalize_to_rfc3339_millis() {
        assert_eq!(
            coerce(Kind::Date, &json!(300), &plain()),
            Some(json!("1970-01-01T00:00:00.300Z"))
        );
        assert_eq!(
            coerce(Kind::Date, &json!("2012-01-26T17:00:00+01:00"), &plain()),
            Some(json!("2012-01-26T17:00:00.000+01:00"))
        );
        assert_eq!(coerce(Kind::Date, &json!("yesterday"), &plain()), None);
    }

    // ── Adjustments ──────────────────────────────────────────────────────────

    #[test]
    fn rules_apply_in_declaration_order() {
        let node = plain().rules([StringRule::Trim, StringRule::Upper]);
        assert_eq!(
            adjust(&json!("  tired  "), &node),
            Some(json!("TIRED"))
        );
        // Order matters: lower then upper ends upper.
        let node = plain().rules([StringRule::Lower, StringRule::Upper]);
        assert_eq!(adjust(&json!("MiXeD"), &node), Some(json!("MIXED")));
    }

    #[test]
    fn capitalize_and_ucfirst_differ_per_word() {
        let node = plain().rule(StringRule::Capitalize);
        assert_eq!(
            adjust(&json!("lorem ipsum DOLOR"), &node),
            Some(json!("Lorem Ipsum Dolor"))
        );
        let node = plain().rule(StringRule::Ucfirst);
        assert_eq!(
            adjust(&json!("lorem ipsum DOLOR"), &node),
            Some(json!("Lorem ipsum dolor"))
        );
    }

    #[test]
    fn length_pads_with_dashes_and_truncates() {
        let node = plain().min_length(4);
        assert_eq!(adjust(&json!("am"), &node), Some(json!("am--")));
        let node = plain().max_length(5);
        assert_eq!(adjust(&json!("consectetur"), &node), Some(json!("conse")));
        let node = plain().exact_length(3);
        assert_eq!(adjust(&json!("a"), &node), Some(json!("a--")));
        assert_eq!(adjust(&json!("abcd"), &node), Some(json!("abc")));
    }

    #[test]
    fn numbers_clamp_to_min_and_max_with_gte_lte_fallbacks() {
        let node = plain().min(10.0);
        assert_eq!(adjust(&json!(5), &node), Some(json!(10)));
        let node = plain().gte(10.0);
        assert_eq!(adjust(&json!(5), &node), Some(json!(10)));
        let node = plain().max(100.0);
        assert_eq!(adjust(&json!(250), &node), Some(json!(100)));
        let node = plain().min(10.0).max(100.0);
        assert_eq!(adjust(&json!(50), &node), None);
    }

    #[test]
    fn unchanged_values_produce_no_adjustment() {
        let node = plain().rules([StringRule::Trim, StringRule::Upper]).min_length(2);
        assert_eq!(adjust(&json!("OK"), &node), None);
        assert_eq!(adjust(&json!(true), &node), None);
    }
}
