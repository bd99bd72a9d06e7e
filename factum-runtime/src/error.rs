use thiserror::Error;

use factum_eventlog::EventLogError;
use factum_fact::ComposeError;

/// Internal runtime plumbing. Every variant is folded into
/// `CommandResult::SystemError(String)` at [`crate::CommandHandler::handle`]'s
/// boundary via its `thiserror` `Display` — never a debug dump of internal
/// state.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to compose context: {0}")]
    Compose(#[from] ComposeError),

    #[error("failed to append events: {0}")]
    Append(#[from] EventLogError),

    #[error("maximum retries exceeded due to conflicts")]
    RetriesExhausted { attempts: u32 },
}
