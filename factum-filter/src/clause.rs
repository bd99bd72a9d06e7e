use serde_json::{Map, Value};

use crate::fact_id::FactId;
use crate::predicate::AttributePredicate;
use crate::wire::WireClause;

/// One `(event_type, payload_predicate)` pair. An event matches a clause
/// iff its `event_type` equals the clause's type and its payload satisfies
/// every predicate in the clause (conjunction).
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    event_type: String,
    predicates: Vec<AttributePredicate>,
}

impl Clause {
    pub(crate) fn new(event_type: impl Into<String>, predicates: Vec<AttributePredicate>) -> Self {
        Self { event_type: event_type.into(), predicates }
    }

    /// The event type this clause restricts to.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Does `event_type`/`payload` satisfy this clause?
    pub fn matches(&self, event_type: &str, payload: &Value) -> bool {
        event_type == self.event_type && self.predicates.iter().all(|p| p.matches(payload))
    }

    /// Compile to the wire shape, tagging with `fact_id` if given.
    ///
    /// `params` are named positionally (`p0`, `p1`, ...) and the JSON-path
    /// expression references them the way Postgres's `jsonb_path_match`
    /// does: `@.field == $p0`. A clause with no predicates compiles to the
    /// trivial path `$` (every payload of the matching type satisfies it).
    pub fn to_wire(&self, fact_id: Option<FactId>) -> WireClause {
        if self.predicates.is_empty() {
            return WireClause {
                event_type: self.event_type.clone(),
                filter: "$".to_string(),
                params: Map::new(),
                fact_id,
            };
        }

        let mut params = Map::new();
        let mut conditions = Vec::with_capacity(self.predicates.len());
        for (i, predicate) in self.predicates.iter().enumerate() {
            let key = format!("p{i}");
            conditions.push(format!("@.{} == ${}", predicate.field, key));
            params.insert(key, predicate.value.to_json());
        }

        WireClause {
            event_type: self.event_type.clone(),
            filter: format!("$ ? ({})", conditions.join(" && ")),
            params,
            fact_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::{attr_int, attr_string};
    use serde_json::json;

    #[test]
    fn clause_matches_type_and_all_predicates() {
        let c = Clause::new("Order", vec![attr_string("status", "open"), attr_int("qty", 5)]);
        assert!(c.matches("Order", &json!({"status": "open", "qty": 5})));
        assert!(!c.matches("Order", &json!({"status": "open", "qty": 6})));
        assert!(!c.matches("Other", &json!({"status": "open", "qty": 5})));
    }

    #[test]
    fn no_predicate_clause_matches_any_payload_of_its_type() {
        let c = Clause::new("Pinged", vec![]);
        assert!(c.matches("Pinged", &json!({})));
        assert!(c.matches("Pinged", &json!({"anything": 1})));
    }

    #[test]
    fn to_wire_compiles_jsonpath_and_params() {
        let c = Clause::new("Order", vec![attr_string("status", "open"), attr_int("qty", 5)]);
        let wire = c.to_wire(None);

        assert_eq!(wire.event_type, "Order");
        assert_eq!(wire.filter, "$ ? (@.status == $p0 && @.qty == $p1)");
        assert_eq!(wire.params["p0"], json!("open"));
        assert_eq!(wire.params["p1"], json!(5));
        assert!(wire.fact_id.is_none());
    }

    #[test]
    fn to_wire_tags_fact_id() {
        let c = Clause::new("A", vec![]);
        let wire = c.to_wire(Some(FactId::from_raw(3)));
        assert_eq!(wire.fact_id.unwrap().to_string(), "fact-3");
    }

    #[test]
    fn to_wire_empty_predicates_is_trivial_path() {
        let c = Clause::new("A", vec![]);
        let wire = c.to_wire(None);
        assert_eq!(wire.filter, "$");
        assert!(wire.params.is_empty());
    }
}
