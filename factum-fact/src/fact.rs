use factum_filter::{EventFilter, FactId};

/// A `(id, filter, apply)` triple: `apply` sees only the events matching
/// `filter`, in ascending sequence order. Owned by the command handler
/// that created it; its lifetime spans one command attempt.
pub struct Fact<Ctx, Evt> {
    id: FactId,
    filter: EventFilter,
    apply: Box<dyn Fn(Ctx, &[Evt]) -> Ctx + Send + Sync>,
}

impl<Ctx, Evt> Fact<Ctx, Evt> {
    pub fn id(&self) -> FactId {
        self.id
    }

    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Apply this Fact's reducer to the subsequence of events that matched
    /// its filter, in ascending sequence order.
    pub fn apply(&self, context: Ctx, events: &[Evt]) -> Ctx {
        (self.apply)(context, events)
    }
}

/// Create a Fact, assigning it a fresh process-unique [`FactId`].
pub fn new_fact<Ctx, Evt>(
    filter: EventFilter,
    apply: impl Fn(Ctx, &[Evt]) -> Ctx + Send + Sync + 'static,
) -> Fact<Ctx, Evt> {
    Fact { id: FactId::new(), filter, apply: Box::new(apply) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use factum_filter::attr_int;

    #[test]
    fn fact_carries_its_own_distinct_id() {
        let a: Fact<i32, ()> = new_fact(EventFilter::empty(), |ctx, _| ctx);
        let b: Fact<i32, ()> = new_fact(EventFilter::empty(), |ctx, _| ctx);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn apply_runs_the_reducer_over_given_events() {
        let fact: Fact<i32, i32> = new_fact(
            EventFilter::empty().for_type("Counted", vec![attr_int("n", 1)]),
            |ctx, events| ctx + events.iter().sum::<i32>(),
        );
        assert_eq!(fact.apply(10, &[1, 2, 3]), 16);
    }
}
