pub mod bookmark;
pub mod error;
pub mod lifecycle;
pub mod memory_service;
pub mod naming;
pub mod persistence;
pub mod reactivation;
pub mod service;
pub mod settings;
pub mod table;

pub use bookmark::Bookmark;
pub use error::{LifecycleError, ProtocolViolation};
pub use lifecycle::{FiredReminder, ReminderLifecycle};
pub use memory_service::InMemoryReminderService;
pub use naming::{ReminderName, get_bookmark, is_reactivation_reminder};
pub use persistence::{PersistedReminders, REMINDER_TABLE_KEY};
pub use reactivation::RunState;
pub use service::{ReminderService, RunStateSource};
pub use table::{EntryState, ReminderTable};
