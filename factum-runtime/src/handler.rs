use std::collections::{BTreeMap, HashMap};

use serde_json::Value;
use tracing::{debug, error, info, warn};

use factum_eventlog::{AppendOutcome, EventLog, StoredEventInput};
use factum_fact::{Composer, Fact};

use crate::error::RuntimeError;
use crate::retry::RetryConfig;

/// Outcome of a command handler invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult<Evt, Err> {
    /// The command's events were appended; `Evt` in the order `execute`
    /// returned them.
    Accepted(Vec<Evt>),
    /// `execute` rejected the command; the log is unchanged.
    Rejected(Err),
    /// A non-conflict failure, or the retry budget was exhausted. The
    /// string is safe to log but not necessarily safe to surface to end
    /// users.
    SystemError(String),
}

/// Binds everything a command needs at construction time: the initial
/// context, the Facts that compose it, the business logic, the event
/// codec, and the retry budget. `handle` runs the full state machine for
/// one command invocation against a given [`EventLog`].
pub struct CommandHandler<Ctx, Evt, Cmd, Err> {
    initial_context: Ctx,
    composer: Composer<Ctx, Evt>,
    execute: Box<dyn Fn(Cmd, Ctx) -> Result<Vec<Evt>, Err> + Send + Sync>,
    encode: Box<dyn Fn(&Evt) -> (String, Value) + Send + Sync>,
    retry_config: RetryConfig,
}

impl<Ctx, Evt, Cmd, Err> CommandHandler<Ctx, Evt, Cmd, Err>
where
    Ctx: Clone,
    Cmd: Clone,
    Evt: Clone,
{
    pub fn new(
        initial_context: Ctx,
        facts: Vec<Fact<Ctx, Evt>>,
        execute: impl Fn(Cmd, Ctx) -> Result<Vec<Evt>, Err> + Send + Sync + 'static,
        decode: impl Fn(&str, &Value) -> Result<Evt, factum_fact::DecodeError> + Send + Sync + 'static,
        encode: impl Fn(&Evt) -> (String, Value) + Send + Sync + 'static,
        retry_config: RetryConfig,
    ) -> Self {
        Self {
            initial_context,
            composer: Composer::new(facts, decode),
            execute: Box::new(execute),
            encode: Box::new(encode),
            retry_config,
        }
    }

    /// Load a context, decide, and append — retrying on conflict up to the
    /// configured budget — against `log`.
    pub async fn handle(
        &self,
        log: &(impl EventLog + ?Sized),
        command: Cmd,
        metadata: HashMap<String, String>,
    ) -> CommandResult<Evt, Err> {
        let mut attempt = 1u32;

        loop {
            debug!(attempt, "loading context");
            let (context, max_seq, union_filter) =
                match self.composer.compose(log, self.initial_context.clone()).await {
                    Ok(v) => v,
                    Err(e) => {
                        let err = RuntimeError::from(e);
                        error!(attempt, error = %err, "failed to load context");
                        return CommandResult::SystemError(err.to_string());
                    },
                };

            debug!(attempt, "deciding");
            let events = match (self.execute)(command.clone(), context) {
                Ok(events) => events,
                Err(business_error) => {
                    info!(attempt, "command rejected");
                    return CommandResult::Rejected(business_error);
                },
            };

            let inputs: Vec<StoredEventInput> = events
                .iter()
                .map(|e| {
                    let (event_type, payload) = (self.encode)(e);
                    StoredEventInput { event_type, payload, metadata: to_btree(&metadata) }
                })
                .collect();

            debug!(attempt, batch_size = inputs.len(), "appending");
            match log.append_with_conflict_check(&inputs, &union_filter, max_seq).await {
                Ok(AppendOutcome::Success(_)) => {
                    info!(attempt, "command accepted");
                    return CommandResult::Accepted(events);
                },
                Ok(AppendOutcome::Conflict(conflict_count)) => {
                    if attempt < self.retry_config.max_attempts {
                        warn!(attempt, conflict_count, "conflict detected, retrying");
                        attempt += 1;
                        continue;
                    }
                    error!(attempt, "retry budget exhausted");
                    let err = RuntimeError::RetriesExhausted { attempts: attempt };
                    return CommandResult::SystemError(err.to_string());
                },
                Err(e) => {
                    let err = RuntimeError::from(e);
                    error!(attempt, error = %err, "failed to append events");
                    return CommandResult::SystemError(err.to_string());
                },
            }
        }
    }
}

fn to_btree(metadata: &HashMap<String, String>) -> BTreeMap<String, String> {
    metadata.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}
