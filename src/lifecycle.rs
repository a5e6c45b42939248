use std::{sync::Arc, time::Duration};

use anyhow::Context;
use chrono::{DateTime, Utc};

use crate::{
    bookmark::Bookmark,
    error::{LifecycleError, ProtocolViolation},
    naming::{self, ParsedName, ReminderName},
    persistence::PersistedReminders,
    reactivation,
    service::{ReminderService, RunStateSource},
    table::{EntryState, LifecycleEvent, ReminderCall, ReminderTable},
};

/// What an incoming reminder firing refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FiredReminder {
    Bookmark(Bookmark),
    Reactivation,
    /// Left over from an interrupted cycle or created by someone else.
    Stray(String),
}

/// Drives a [`ReminderTable`] through the persistence cycle of one loaded instance.
///
/// External calls are always made before the matching table transition is committed, so a
/// failing call leaves its entry where it was and the error is returned to the host.
pub struct ReminderLifecycle {
    table: ReminderTable,
    service: Arc<dyn ReminderService>,
    run_state: Arc<dyn RunStateSource>,
    reactivation_period: Duration,
}

impl ReminderLifecycle {
    pub fn new(
        service: Arc<dyn ReminderService>,
        run_state: Arc<dyn RunStateSource>,
        reactivation_period: Duration,
    ) -> Self {
        Self {
            table: ReminderTable::new(),
            service,
            run_state,
            reactivation_period,
        }
    }

    pub fn table(&self) -> &ReminderTable {
        &self.table
    }

    pub fn register(
        &mut self,
        bookmark: &Bookmark,
        due_time: DateTime<Utc>,
    ) -> Result<(), LifecycleError> {
        self.table.register(bookmark, due_time).map_err(fatal)
    }

    pub fn cancel(&mut self, bookmark: &Bookmark) -> Result<(), LifecycleError> {
        self.table.cancel(bookmark).map_err(fatal)
    }

    pub fn cancel_by_name(&mut self, name: &str) -> Result<(), LifecycleError> {
        self.table
            .cancel_by_name(&ReminderName::from_raw(name))
            .map_err(fatal)
    }

    pub async fn on_paused(&mut self) -> Result<(), LifecycleError> {
        self.on_paused_at(Utc::now()).await
    }

    pub async fn on_paused_at(&mut self, now: DateTime<Utc>) -> Result<(), LifecycleError> {
        self.flush(LifecycleEvent::Paused, now).await
    }

    pub async fn on_saving(&mut self) -> Result<(), LifecycleError> {
        self.flush(LifecycleEvent::Saving, Utc::now()).await?;

        if reactivation::should_register(self.run_state.current_run_state(), &self.table) {
            let name = ReminderName::reactivation();
            log::info!(
                "Registering reactivation reminder, period {:?}",
                self.reactivation_period
            );
            self.service
                .register_reminder(name.as_str(), self.reactivation_period)
                .await
                .with_context(|| format!("registering reactivation reminder {name}"))?;
            self.table.set_reactivation_reminder(true);
        }

        Ok(())
    }

    pub async fn on_saved(&mut self) -> Result<(), LifecycleError> {
        self.flush(LifecycleEvent::Saved, Utc::now()).await?;
        self.drop_redundant_reactivation().await
    }

    pub fn collect_persistable_bookmarks(&self) -> PersistedReminders {
        self.table.collect_persistable_bookmarks().into()
    }

    pub async fn load_from_persisted_bookmarks(
        &mut self,
        persisted: PersistedReminders,
    ) -> Result<(), LifecycleError> {
        self.table.load_from_persisted_bookmarks(persisted);
        log::info!("Loaded {} persisted reminders", self.table.len());

        let names = self
            .service
            .list_reminder_names()
            .await
            .context("listing registered reminders")?;

        for name in names {
            match naming::parse(&name) {
                ParsedName::Reactivation => self.table.set_reactivation_reminder(true),
                ParsedName::Bookmark(_)
                    if self.table.get(&ReminderName::from_raw(name.as_str())).is_none() =>
                {
                    log::warn!("Unregistering stray reminder {name}");
                    self.service
                        .unregister_reminder(&name)
                        .await
                        .with_context(|| format!("unregistering stray reminder {name}"))?;
                }
                _ => {}
            }
        }

        self.drop_redundant_reactivation().await
    }

    pub fn resolve_fired(&self, name: &str) -> FiredReminder {
        match naming::parse(name) {
            ParsedName::Reactivation => FiredReminder::Reactivation,
            ParsedName::Bookmark(bookmark) if self.is_awaited(name) => {
                FiredReminder::Bookmark(bookmark)
            }
            _ => {
                log::warn!("Reminder {name} fired but no bookmark is waiting for it");
                FiredReminder::Stray(name.to_owned())
            }
        }
    }

    fn is_awaited(&self, name: &str) -> bool {
        self.table
            .get(&ReminderName::from_raw(name))
            .is_some_and(|entry| {
                !matches!(
                    entry.state,
                    EntryState::SaveAndUnregister | EntryState::Unregister
                )
            })
    }

    /// Runs one pause, save, saved round. `save` must durably write the payload it is given;
    /// when it fails nothing is unregistered.
    pub async fn save_cycle<F, Fut>(&mut self, save: F) -> Result<(), LifecycleError>
    where
        F: FnOnce(PersistedReminders) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        self.on_paused().await?;
        self.on_saving().await?;
        save(self.collect_persistable_bookmarks())
            .await
            .context("writing instance snapshot")?;
        self.on_saved().await
    }

    async fn flush(
        &mut self,
        event: LifecycleEvent,
        now: DateTime<Utc>,
    ) -> Result<(), LifecycleError> {
        let steps = self.table.plan(event, now).map_err(fatal)?;
        log::debug!("{event:?}: {} reminders to update", steps.len());

        for step in steps {
            if let Some(call) = &step.call {
                self.execute(call).await?;
            }
            self.table.commit(&step).map_err(fatal)?;
        }

        Ok(())
    }

    async fn execute(&self, call: &ReminderCall) -> anyhow::Result<()> {
        match call {
            ReminderCall::Register { name, due_in } => {
                log::info!("Registering reminder {name}, due in {due_in:?}");
                self.service
                    .register_reminder(name.as_str(), *due_in)
                    .await
                    .with_context(|| format!("registering reminder {name}"))
            }
            ReminderCall::Unregister { name } => {
                log::info!("Unregistering reminder {name}");
                self.service
                    .unregister_reminder(name.as_str())
                    .await
                    .with_context(|| format!("unregistering reminder {name}"))
            }
        }
    }

    async fn drop_redundant_reactivation(&mut self) -> Result<(), LifecycleError> {
        if reactivation::is_redundant(self.run_state.current_run_state(), &self.table) {
            let name = ReminderName::reactivation();
            log::info!("Unregistering reactivation reminder");
            self.service
                .unregister_reminder(name.as_str())
                .await
                .with_context(|| format!("unregistering reactivation reminder {name}"))?;
            self.table.set_reactivation_reminder(false);
        }

        Ok(())
    }
}

fn fatal(violation: ProtocolViolation) -> LifecycleError {
    log::error!("Reminder protocol violation: {violation}");
    LifecycleError::Protocol(violation)
}
