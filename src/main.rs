use std::sync::{Arc, Mutex};

use bookmark_reminders::{
    Bookmark, FiredReminder, InMemoryReminderService, PersistedReminders, REMINDER_TABLE_KEY,
    ReminderLifecycle, RunState, RunStateSource, settings::AppSettings,
};
use chrono::{TimeDelta, Utc};

/// Stand-in for the hosted computation: one bookmark waiting on a timer.
struct DemoComputation {
    run_state: Mutex<RunState>,
}

impl DemoComputation {
    fn set_run_state(&self, run_state: RunState) {
        *self.run_state.lock().unwrap() = run_state;
    }
}

impl RunStateSource for DemoComputation {
    fn current_run_state(&self) -> RunState {
        *self.run_state.lock().unwrap()
    }
}

type SnapshotStore = Arc<Mutex<Option<PersistedReminders>>>;

async fn save(
    lifecycle: &mut ReminderLifecycle,
    store: &SnapshotStore,
) -> anyhow::Result<()> {
    let store = Arc::clone(store);
    lifecycle
        .save_cycle(|payload| async move {
            log::info!(
                "Writing {} bookmarks under {REMINDER_TABLE_KEY}",
                payload.bookmarks.len()
            );
            *store.lock().unwrap() = Some(payload);
            Ok(())
        })
        .await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let settings = AppSettings::load()?;
    log::info!(
        "Starting reminder host, reactivation period {:?}",
        settings.reminders.reactivation_period()
    );

    let (service, mut fired) = InMemoryReminderService::new();
    let service = Arc::new(service);
    let computation = Arc::new(DemoComputation {
        run_state: Mutex::new(RunState::Runnable),
    });
    let store: SnapshotStore = Arc::new(Mutex::new(None));

    let mut lifecycle = ReminderLifecycle::new(
        service.clone(),
        computation.clone(),
        settings.reminders.reactivation_period(),
    );
    lifecycle
        .load_from_persisted_bookmarks(PersistedReminders::default())
        .await?;

    let bookmark = Bookmark::new("wait-for-approval");
    lifecycle.register(&bookmark, Utc::now() + TimeDelta::seconds(2))?;
    save(&mut lifecycle, &store).await?;

    while let Some(name) = fired.recv().await {
        match lifecycle.resolve_fired(&name) {
            FiredReminder::Bookmark(resumed) => {
                log::info!("Resuming bookmark {resumed}");
                lifecycle.cancel(&resumed)?;
                computation.set_run_state(RunState::Idle);
                save(&mut lifecycle, &store).await?;
                break;
            }
            FiredReminder::Reactivation => log::info!("Reactivation reminder fired"),
            FiredReminder::Stray(name) => log::warn!("Ignoring stray reminder {name}"),
        }
    }

    let persisted = store.lock().unwrap().take().unwrap_or_default();
    let mut reloaded = ReminderLifecycle::new(
        service,
        computation,
        settings.reminders.reactivation_period(),
    );
    reloaded.load_from_persisted_bookmarks(persisted).await?;
    log::info!(
        "Reloaded instance with {} outstanding reminders",
        reloaded.table().len()
    );

    Ok(())
}
