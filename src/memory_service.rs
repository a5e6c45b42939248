use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use tokio::{
    sync::{RwLock, mpsc},
    task::{self, JoinHandle},
};
use tokio_util::sync::CancellationToken;

use crate::service::ReminderService;

struct ScheduledTimer {
    task: JoinHandle<()>,
    cancellation_token: CancellationToken,
}

impl ScheduledTimer {
    /// Never waits on the task, which may be blocked on a full firing channel.
    fn cancel(&self) {
        self.cancellation_token.cancel();
        self.task.abort();
    }
}

/// Process-local reminder service. Each registration runs a timer task that sends the reminder
/// name on the firing channel when due. A fired reminder stays registered until unregistered.
pub struct InMemoryReminderService {
    timers: RwLock<HashMap<String, ScheduledTimer>>,
    fired_tx: mpsc::Sender<String>,
}

impl InMemoryReminderService {
    pub fn new() -> (Self, mpsc::Receiver<String>) {
        let (fired_tx, fired_rx) = mpsc::channel(64);
        let service = Self {
            timers: RwLock::new(HashMap::new()),
            fired_tx,
        };

        (service, fired_rx)
    }

    fn spawn_timer(&self, name: String, due_in: Duration) -> ScheduledTimer {
        let cancellation_token = CancellationToken::new();
        let task_cancellation_token = cancellation_token.child_token();
        let fired_tx = self.fired_tx.clone();

        let task = task::spawn(async move {
            tokio::select! {
                _ = task_cancellation_token.cancelled() => {
                    log::debug!("Timer for reminder {name} was cancelled");
                },
                _ = tokio::time::sleep(due_in) => {
                    log::info!("Reminder {name} fired");
                    let _ = fired_tx.send(name).await;
                }
            }
        });

        ScheduledTimer {
            task,
            cancellation_token,
        }
    }
}

impl Drop for InMemoryReminderService {
    fn drop(&mut self) {
        for timer in self.timers.get_mut().values() {
            timer.cancel();
        }
    }
}

#[async_trait]
impl ReminderService for InMemoryReminderService {
    async fn register_reminder(&self, name: &str, due_in: Duration) -> anyhow::Result<()> {
        let timer = self.spawn_timer(name.to_owned(), due_in);
        let previous = self.timers.write().await.insert(name.to_owned(), timer);
        if let Some(previous) = previous {
            log::debug!("Replacing timer for reminder {name}");
            previous.cancel();
        }

        Ok(())
    }

    async fn unregister_reminder(&self, name: &str) -> anyhow::Result<()> {
        let timer = self.timers.write().await.remove(name);
        match timer {
            Some(timer) => timer.cancel(),
            None => log::debug!("Reminder {name} was not registered"),
        }

        Ok(())
    }

    async fn list_reminder_names(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.timers.read().await.keys().cloned().collect())
    }
}
