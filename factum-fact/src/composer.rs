use thiserror::Error;
use tracing::debug;

use factum_eventlog::{EventLog, EventLogError, TaggedClause};
use factum_filter::FactId;

use crate::decode::DecodeError;
use crate::fact::Fact;

/// Errors the Composer can surface; both fold into `SystemError` at the
/// command handler boundary — neither is retried here.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("event log error: {0}")]
    EventLog(#[from] EventLogError),
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Merges many [`Fact`]s into one tagged query and routes each returned
/// event back only to the Facts it satisfies.
pub struct Composer<Ctx, Evt> {
    facts: Vec<Fact<Ctx, Evt>>,
    decode: Box<dyn Fn(&str, &serde_json::Value) -> Result<Evt, DecodeError> + Send + Sync>,
}

impl<Ctx, Evt> Composer<Ctx, Evt>
where
    Evt: Clone,
{
    pub fn new(
        facts: Vec<Fact<Ctx, Evt>>,
        decode: impl Fn(&str, &serde_json::Value) -> Result<Evt, DecodeError> + Send + Sync + 'static,
    ) -> Self {
        Self { facts, decode: Box::new(decode) }
    }

    pub fn facts(&self) -> &[Fact<Ctx, Evt>] {
        &self.facts
    }

    /// Run one composition attempt: query, decode, route, reduce.
    ///
    /// Returns the final context, the maximum sequence number observed
    /// (0 if no event matched any Fact's filter), and the tagged union
    /// filter clauses used for the query — the runtime reuses the latter
    /// unchanged as the conflict filter for its append.
    pub async fn compose(
        &self,
        log: &(impl EventLog + ?Sized),
        initial_context: Ctx,
    ) -> Result<(Ctx, i64, Vec<TaggedClause>), ComposeError> {
        let union_clauses: Vec<TaggedClause> = factum_filter::union(
            self.facts.iter().map(|f| (f.id(), f.filter().clone())),
        );

        let (tagged_events, max_sequence) = log.query_with_tags(&union_clauses).await?;
        debug!(matched = tagged_events.len(), max_sequence, "composer queried event log");

        let mut decoded: Vec<(Evt, Vec<FactId>)> = Vec::with_capacity(tagged_events.len());
        for tagged in tagged_events {
            let event = (self.decode)(&tagged.event.event_type, &tagged.event.payload)
                .map_err(|e| e.at_sequence(tagged.event.sequence_number))?;
            decoded.push((event, tagged.fact_ids));
        }

        let mut context = initial_context;
        for fact in &self.facts {
            let fact_events: Vec<&Evt> = decoded
                .iter()
                .filter(|(_, ids)| ids.contains(&fact.id()))
                .map(|(e, _)| e)
                .collect();

            // `apply` takes owned events by value through the caller's
            // reducer signature `Fn(Ctx, &[Evt])`; we hand it references
            // collected in arrival order, which is ascending sequence
            // order because `query_with_tags` returns events that way.
            context = apply_refs(fact, context, &fact_events);
        }

        Ok((context, max_sequence, union_clauses))
    }
}

fn apply_refs<Ctx, Evt>(fact: &Fact<Ctx, Evt>, context: Ctx, events: &[&Evt]) -> Ctx
where
    Evt: Clone,
{
    let owned: Vec<Evt> = events.iter().map(|e| (*e).clone()).collect();
    fact.apply(context, &owned)
}
