use std::time::Duration;

use async_trait::async_trait;

use crate::reactivation::RunState;

/// Durable reminder service of the hosting instance. Names are scoped to the instance.
#[async_trait]
pub trait ReminderService: Send + Sync {
    /// Registers `name`, replacing any existing registration with the same name.
    async fn register_reminder(&self, name: &str, due_in: Duration) -> anyhow::Result<()>;
    async fn unregister_reminder(&self, name: &str) -> anyhow::Result<()>;
    async fn list_reminder_names(&self) -> anyhow::Result<Vec<String>>;
}

pub trait RunStateSource: Send + Sync {
    fn current_run_state(&self) -> RunState;
}
