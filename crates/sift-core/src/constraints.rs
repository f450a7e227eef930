//! Validation-side constraint evaluators.
//!
//! Every function here is pure: it looks at one node's schema and the
//! value actually present, and returns default violation messages. The
//! engine wraps them into report entries, applying the node's
//! `error`/`code` overrides.
//!
//! Constraints are guarded by the value's actual shape. Numeric bounds
//! only fire on numbers, length checks on strings and arrays, patterns
//! on strings; a type mismatch is reported separately and does not
//! silence the checks that still apply.

use serde_json::Value;
use tracing::warn;

use sift_contracts::{Pattern, SchemaNode};

/// Evaluate every scalar constraint of `node` against `value`.
pub(crate) fn check(node: &SchemaNode, value: &Value) -> Vec<String> {
    let mut messages = Vec::new();
    check_numeric(node, value, &mut messages);
    check_equality(node, value, &mut messages);
    check_length(node, value, &mut messages);
    check_pattern(node, value, &mut messages);
    messages
}

fn check_numeric(node: &SchemaNode, value: &Value, messages: &mut Vec<String>) {
    let Some(f) = value.as_f64() else {
        return;
    };
    if let Some(bound) = node.gt {
        if f <= bound {
            messages.push(format!("must be greater than {}", bound));
        }
    }
    if let Some(bound) = node.gte {
        if f < bound {
            messages.push(format!("must be greater than or equal to {}", bound));
        }
    }
    if let Some(bound) = node.lt {
        if f >= bound {
            messages.push(format!("must be less than {}", bound));
        }
    }
    if let Some(bound) = node.lte {
        if f > bound {
            messages.push(format!("must be less than or equal to {}", bound));
        }
    }
    if let Some(divisor) = node.multiple_of {
        if divisor != 0.0 && (f % divisor).abs() > f64::EPSILON {
            messages.push(format!("must be a multiple of {}", divisor));
        }
    }
}

/// `eq`/`ne` use strict `Value` equality and apply to any scalar.
fn check_equality(node: &SchemaNode, value: &Value, messages: &mut Vec<String>) {
    if matches!(value, Value::Object(_) | Value::Array(_)) {
        return;
    }
    if let Some(allowed) = &node.eq {
        if !allowed.contains(value) {
            let listed: Vec<String> = allowed.iter().map(render).collect();
            messages.push(format!("must equal {}", listed.join(" or ")));
        }
    }
    for forbidden in &node.ne {
        if value == forbidden {
            messages.push(format!("must not equal {}", render(forbidden)));
        }
    }
}

fn check_length(node: &SchemaNode, value: &Value, messages: &mut Vec<String>) {
    let len = match value {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        _ => return,
    };
    if let Some(min) = node.min_length {
        if len < min {
            messages.push(format!("must have a length of at least {}", min));
        }
    }
    if let Some(max) = node.max_length {
        if len > max {
            messages.push(format!("must have a length of at most {}", max));
        }
    }
    if let Some(exact) = node.exact_length {
        if len != exact {
            messages.push(format!("must have a length of exactly {}", exact));
        }
    }
}

/// A string passes if ANY pattern alternative accepts it. An unknown
/// format name never accepts and is logged once per check.
fn check_pattern(node: &SchemaNode, value: &Value, messages: &mut Vec<String>) {
    if node.pattern.is_empty() {
        return;
    }
    let Some(s) = value.as_str() else {
        return;
    };
    let accepted = node.pattern.iter().any(|pattern| match pattern {
        Pattern::Named(name) => match sift_formats::matches(name, s) {
            Some(result) => result,
            None => {
                warn!(format = %name, "unknown format name in pattern; treating as non-match");
                false
            }
        },
        Pattern::Regex(re) => re.is_match(s),
    });
    if !accepted {
        let listed: Vec<String> = node
            .pattern
            .iter()
            .map(|pattern| match pattern {
                Pattern::Named(name) => name.clone(),
                Pattern::Regex(re) => re.as_str().to_string(),
            })
            .collect();
        messages.push(format!("must match {}", listed.join(" or ")));
    }
}

fn render(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sift_contracts::SchemaNode;

    #[test]
    fn numeric_bounds_fire_only_on_numbers() {
        let node = SchemaNode::number().gt(100.0).lt(200.0);
        assert_eq!(check(&node, &json!(100)), vec!["must be greater than 100"]);
        assert_eq!(check(&node, &json!(200)), vec!["must be less than 200"]);
        assert!(check(&node, &json!(150)).is_empty());
        // Not a number: the bound is silent; the type check reports.
        assert!(check(&node, &json!("150")).is_empty());
    }

    #[test]
    fn multiple_of_uses_the_declared_divisor() {
        let node = SchemaNode::number().multiple_of(10.0);
        assert!(check(&node, &json!(140)).is_empty());
        assert_eq!(check(&node, &json!(142)), vec!["must be a multiple of 10"]);
    }

    #[test]
    fn eq_lists_every_allowed_value() {
        let node = SchemaNode::number().eq([json!(100), json!(125)]);
        assert!(check(&node, &json!(125)).is_empty());
        assert_eq!(check(&node, &json!(101)), vec!["must equal 100 or 125"]);
    }

    #[test]
    fn ne_rejects_each_forbidden_value() {
        let node = SchemaNode::untyped().ne(150).ne("one fifty");
        assert_eq!(check(&node, &json!(150)), vec!["must not equal 150"]);
        assert_eq!(
            check(&node, &json!("one fifty")),
            vec!["must not equal \"one fifty\""]
        );
        assert!(check(&node, &json!(151)).is_empty());
    }

    #[test]
    fn equality_is_strict_across_representations() {
        let node = SchemaNode::untyped().eq([json!(1)]);
        assert!(check(&node, &json!(1)).is_empty());
        assert!(!check(&node, &json!("1")).is_empty());
        assert!(!check(&node, &json!(1.5)).is_empty());
    }

    #[test]
    fn length_checks_cover_strings_and_arrays() {
        let node = SchemaNode::untyped().min_length(2).max_length(4);
        assert_eq!(
            check(&node, &json!("a")),
            vec!["must have a length of at least 2"]
        );
        assert_eq!(
            check(&node, &json!([1, 2, 3, 4, 5])),
            vec!["must have a length of at most 4"]
        );
        assert!(check(&node, &json!("abc")).is_empty());
        assert!(check(&node, &json!(12345)).is_empty());
    }

    #[test]
    fn exact_length_reports_both_directions() {
        let node = SchemaNode::untyped().exact_length(8);
        assert_eq!(
            check(&node, &json!("short")),
            vec!["must have a length of exactly 8"]
        );
        assert_eq!(
            check(&node, &json!("much too long")),
            vec!["must have a length of exactly 8"]
        );
        assert!(check(&node, &json!("12345678")).is_empty());
    }

    #[test]
    fn pattern_alternatives_pass_when_any_matches() {
        let node = SchemaNode::string()
            .pattern_format("email")
            .pattern_regex(regex::Regex::new(r"^\d{4}$").unwrap());
        assert!(check(&node, &json!("a@b.c")).is_empty());
        assert!(check(&node, &json!("1234")).is_empty());
        let messages = check(&node, &json!("neither"));
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("must match email or "));
    }

    #[test]
    fn unknown_format_names_never_accept() {
        let node = SchemaNode::string().pattern_format("definitely-not-registered");
        assert_eq!(check(&node, &json!("anything")).len(), 1);
    }

    #[test]
    fn type_mismatch_does_not_silence_shape_matching_checks() {
        // An array where a string was expected still gets its length
        // checked; the type report comes from the engine.
        let node = SchemaNode::string().min_length(1);
        assert_eq!(
            check(&node, &json!([])),
            vec!["must have a length of at least 1"]
        );
    }
}
