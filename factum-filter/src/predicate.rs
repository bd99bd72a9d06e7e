use serde_json::Value;

/// A scalar value an [`AttributePredicate`] compares a payload field
/// against. Mirrors the subset of `serde_json::Value` that JSON-path
/// equality predicates care about.
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateValue {
    /// String equality.
    Str(String),
    /// Integer equality (JSON numbers without a fractional part).
    Int(i64),
    /// Float equality.
    Float(f64),
    /// Boolean equality.
    Bool(bool),
}

impl PredicateValue {
    pub(crate) fn to_json(&self) -> Value {
        match self {
            PredicateValue::Str(s) => Value::String(s.clone()),
            PredicateValue::Int(i) => Value::from(*i),
            PredicateValue::Float(f) => Value::from(*f),
            PredicateValue::Bool(b) => Value::Bool(*b),
        }
    }

    fn matches_json(&self, value: &Value) -> bool {
        match self {
            PredicateValue::Str(s) => value.as_str() == Some(s.as_str()),
            PredicateValue::Int(i) => value.as_i64() == Some(*i),
            PredicateValue::Float(f) => value.as_f64() == Some(*f),
            PredicateValue::Bool(b) => value.as_bool() == Some(*b),
        }
    }
}

/// One `field == value` constraint on an event payload. Multiple
/// predicates attached to the same [`crate::Clause`] are conjoined.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributePredicate {
    /// Dot-separated path into the payload object, e.g. `"order.id"`.
    pub field: String,
    /// The value the field must equal.
    pub value: PredicateValue,
}

impl AttributePredicate {
    /// Does `payload` satisfy this predicate?
    ///
    /// Traverses `field` as a dotted path of object keys; a missing key or
    /// a non-object intermediate is simply a non-match, not an error —
    /// filters are allowed to describe shapes an event doesn't have.
    pub fn matches(&self, payload: &Value) -> bool {
        let mut cur = payload;
        for segment in self.field.split('.') {
            match cur.get(segment) {
                Some(next) => cur = next,
                None => return false,
            }
        }
        self.value.matches_json(cur)
    }
}

/// Build a string-equality predicate on `field`.
pub fn attr_string(field: impl Into<String>, value: impl Into<String>) -> AttributePredicate {
    AttributePredicate { field: field.into(), value: PredicateValue::Str(value.into()) }
}

/// Build an integer-equality predicate on `field`.
pub fn attr_int(field: impl Into<String>, value: i64) -> AttributePredicate {
    AttributePredicate { field: field.into(), value: PredicateValue::Int(value) }
}

/// Build a float-equality predicate on `field`.
pub fn attr_float(field: impl Into<String>, value: f64) -> AttributePredicate {
    AttributePredicate { field: field.into(), value: PredicateValue::Float(value) }
}

/// Build a boolean-equality predicate on `field`.
pub fn attr_bool(field: impl Into<String>, value: bool) -> AttributePredicate {
    AttributePredicate { field: field.into(), value: PredicateValue::Bool(value) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_predicate_matches_top_level_field() {
        let p = attr_string("status", "open");
        assert!(p.matches(&json!({"status": "open"})));
        assert!(!p.matches(&json!({"status": "closed"})));
    }

    #[test]
    fn int_predicate_rejects_wrong_type() {
        let p = attr_int("qty", 5);
        assert!(!p.matches(&json!({"qty": "5"})));
    }

    #[test]
    fn dotted_path_traverses_nested_objects() {
        let p = attr_string("order.id", "x1");
        assert!(p.matches(&json!({"order": {"id": "x1"}})));
        assert!(!p.matches(&json!({"order": {"id": "x2"}})));
    }

    #[test]
    fn missing_field_is_non_match_not_error() {
        let p = attr_int("missing", 1);
        assert!(!p.matches(&json!({"other": 1})));
    }
}
