use thiserror::Error;

use crate::{
    naming::ReminderName,
    table::{EntryState, ReminderEvent},
};

/// A caller or host integration broke the reminder protocol. Never retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolViolation {
    #[error("{event:?} is not permitted for reminder {name} in state {state:?}")]
    InvalidTransition {
        name: ReminderName,
        state: Option<EntryState>,
        event: ReminderEvent,
    },

    #[error("planned step for reminder {name} expected state {expected:?}, found {found:?}")]
    StaleStep {
        name: ReminderName,
        expected: EntryState,
        found: Option<EntryState>,
    },
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Protocol(#[from] ProtocolViolation),

    #[error(transparent)]
    Service(#[from] anyhow::Error),
}
