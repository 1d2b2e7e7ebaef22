//! Comparison operators shared by the gateway processors

use std::cmp::Ordering;
use std::str::FromStr;

use flowdrop_engine::processor::value_as_f64;
use flowdrop_engine::EngineError;
use serde_json::Value;

use crate::fields::text_of;
use crate::processing::build_regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    StartsWith,
    EndsWith,
    Regex,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    IsEmpty,
    IsNotEmpty,
}

impl FromStr for Operator {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equals" | "==" | "eq" => Ok(Self::Equals),
            "not_equals" | "!=" | "ne" => Ok(Self::NotEquals),
            "contains" => Ok(Self::Contains),
            "starts_with" => Ok(Self::StartsWith),
            "ends_with" => Ok(Self::EndsWith),
            "regex" | "matches" => Ok(Self::Regex),
            ">" | "gt" | "greater_than" => Ok(Self::GreaterThan),
            ">=" | "gte" => Ok(Self::GreaterOrEqual),
            "<" | "lt" | "less_than" => Ok(Self::LessThan),
            "<=" | "lte" => Ok(Self::LessOrEqual),
            "is_empty" => Ok(Self::IsEmpty),
            "is_not_empty" => Ok(Self::IsNotEmpty),
            other => Err(EngineError::failed(format!("Unknown operator '{}'", other))),
        }
    }
}

impl Operator {
    /// Operators accepted by the `if_else` node
    pub fn is_text_operator(&self) -> bool {
        matches!(
            self,
            Self::Equals
                | Self::NotEquals
                | Self::Contains
                | Self::StartsWith
                | Self::EndsWith
                | Self::Regex
        )
    }

    /// Evaluate `left <op> right`.
    ///
    /// Equality and ordering compare numerically when both sides parse as
    /// numbers, otherwise as text. Text comparisons honour `case_sensitive`.
    pub fn evaluate(&self, left: &Value, right: &Value, case_sensitive: bool) -> flowdrop_engine::Result<bool> {
        let text = |value: &Value| {
            let s = text_of(value);
            if case_sensitive {
                s
            } else {
                s.to_lowercase()
            }
        };

        let order = || Self::order(left, right, case_sensitive);
        let result = match self {
            Self::Equals => order() == Some(Ordering::Equal),
            Self::NotEquals => order() != Some(Ordering::Equal),
            Self::Contains => match left {
                Value::Array(items) => items.iter().any(|item| text(item) == text(right)),
                _ => text(left).contains(&text(right)),
            },
            Self::StartsWith => text(left).starts_with(&text(right)),
            Self::EndsWith => text(left).ends_with(&text(right)),
            Self::Regex => {
                let flags = if case_sensitive { "" } else { "i" };
                build_regex(&text_of(right), flags)?.is_match(&text_of(left))
            }
            Self::GreaterThan => order() == Some(Ordering::Greater),
            Self::GreaterOrEqual => matches!(order(), Some(Ordering::Greater | Ordering::Equal)),
            Self::LessThan => order() == Some(Ordering::Less),
            Self::LessOrEqual => matches!(order(), Some(Ordering::Less | Ordering::Equal)),
            Self::IsEmpty => is_empty(left),
            Self::IsNotEmpty => !is_empty(left),
        };
        Ok(result)
    }

    /// Evaluate a text operator on two strings without numeric coercion.
    ///
    /// `"1.0" equals "1"` is false here, unlike [`Operator::evaluate`].
    pub fn evaluate_text(&self, left: &str, right: &str, case_sensitive: bool) -> flowdrop_engine::Result<bool> {
        match self {
            Self::Equals | Self::NotEquals => {
                let equal = compare_text(left, right, case_sensitive) == Ordering::Equal;
                Ok(equal == (*self == Self::Equals))
            }
            _ => self.evaluate(
                &Value::String(left.to_string()),
                &Value::String(right.to_string()),
                case_sensitive,
            ),
        }
    }

    /// `None` when the sides are unordered, such as a NaN operand
    fn order(left: &Value, right: &Value, case_sensitive: bool) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (numeric(left), numeric(right)) {
            return a.partial_cmp(&b);
        }
        if let (Value::Bool(a), Value::Bool(b)) = (left, right) {
            return Some(a.cmp(b));
        }
        Some(compare_text(&text_of(left), &text_of(right), case_sensitive))
    }
}

fn compare_text(a: &str, b: &str, case_sensitive: bool) -> Ordering {
    if case_sensitive {
        a.cmp(b)
    } else {
        a.to_lowercase().cmp(&b.to_lowercase())
    }
}

/// Finite numbers and numeric strings; booleans stay booleans here
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Bool(_) => None,
        other => value_as_f64(other).filter(|n| n.is_finite()),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eval(op: &str, left: Value, right: Value) -> bool {
        op.parse::<Operator>()
            .unwrap()
            .evaluate(&left, &right, false)
            .unwrap()
    }

    #[test]
    fn test_text_operators() {
        assert!(eval("equals", json!("Hello"), json!("hello")));
        assert!(eval("not_equals", json!("hello"), json!("goodbye")));
        assert!(eval("contains", json!("say hello"), json!("HELLO")));
        assert!(eval("starts_with", json!("hello world"), json!("hello")));
        assert!(eval("ends_with", json!("hello world"), json!("world")));
        assert!(eval("regex", json!("order 42"), json!(r"\d+")));
    }

    #[test]
    fn test_case_sensitive_equality() {
        let equals = Operator::Equals;
        assert!(!equals.evaluate(&json!("Hello"), &json!("hello"), true).unwrap());
        assert!(equals.evaluate(&json!("hello"), &json!("hello"), true).unwrap());
    }

    #[test]
    fn test_numeric_comparisons() {
        assert!(eval(">", json!(10), json!("9")));
        assert!(eval(">=", json!(3), json!(3)));
        assert!(eval("<", json!("2"), json!(10)));
        assert!(eval("<=", json!(1.5), json!(2)));
        assert!(eval("==", json!("3.0"), json!(3)));
        assert!(!eval("!=", json!(3), json!(3)));
    }

    #[test]
    fn test_non_finite_strings_compare_as_text() {
        assert!(!Operator::Equals.evaluate(&json!("NaN"), &json!("5"), true).unwrap());
        assert!(!Operator::Equals.evaluate(&json!("inf"), &json!("1e400"), true).unwrap());
        assert!(Operator::NotEquals.evaluate(&json!("NaN"), &json!("5"), true).unwrap());
        assert!(Operator::Equals.evaluate(&json!("NaN"), &json!("NaN"), true).unwrap());
    }

    #[test]
    fn test_text_evaluation_is_exact() {
        let equals = Operator::Equals;
        assert!(!equals.evaluate_text("1.0", "1", true).unwrap());
        assert!(!equals.evaluate_text("NaN", "5", true).unwrap());
        assert!(!equals.evaluate_text(" 7", "7", true).unwrap());
        assert!(!equals.evaluate_text("1e3", "1000", true).unwrap());
        assert!(equals.evaluate_text("Hello", "hello", false).unwrap());
        assert!(Operator::NotEquals.evaluate_text("1.0", "1", true).unwrap());
        assert!(Operator::Contains.evaluate_text("say HELLO", "hello", false).unwrap());
    }

    #[test]
    fn test_emptiness() {
        assert!(eval("is_empty", json!("  "), Value::Null));
        assert!(eval("is_empty", json!([]), Value::Null));
        assert!(eval("is_not_empty", json!({"a": 1}), Value::Null));
        assert!(!eval("is_empty", json!(0), Value::Null));
    }

    #[test]
    fn test_contains_in_array() {
        assert!(eval("contains", json!(["a", "B"]), json!("b")));
    }

    #[test]
    fn test_unknown_operator() {
        assert!("approximately".parse::<Operator>().is_err());
        assert!(!Operator::GreaterThan.is_text_operator());
    }
}
