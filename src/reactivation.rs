//! Policy for the fallback reminder that forces a reload of a runnable instance.

use crate::table::ReminderTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// The hosted computation still has work to resume.
    Runnable,
    Idle,
}

/// Checked right before a snapshot is written. Registration is refreshed every time this holds.
pub fn should_register(run_state: RunState, table: &ReminderTable) -> bool {
    run_state == RunState::Runnable && !table.has_registered_and_saved()
}

/// Checked after a snapshot commits and after load.
pub fn is_redundant(run_state: RunState, table: &ReminderTable) -> bool {
    table.has_reactivation_reminder()
        && (run_state != RunState::Runnable || table.has_registered_and_saved())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmark::Bookmark;

    #[test]
    fn runnable_instance_without_saved_reminders_needs_fallback() {
        let table = ReminderTable::new();

        assert!(should_register(RunState::Runnable, &table));
        assert!(!should_register(RunState::Idle, &table));
    }

    #[test]
    fn saved_reminder_covers_reactivation() {
        let mut table = ReminderTable::new();
        table.load_from_persisted_bookmarks([Bookmark::new("timer")]);

        assert!(!should_register(RunState::Runnable, &table));
    }

    #[test]
    fn fallback_is_redundant_only_when_registered() {
        let mut table = ReminderTable::new();
        assert!(!is_redundant(RunState::Idle, &table));

        table.set_reactivation_reminder(true);
        assert!(is_redundant(RunState::Idle, &table));
        assert!(!is_redundant(RunState::Runnable, &table));

        table.load_from_persisted_bookmarks([Bookmark::new("timer")]);
        table.set_reactivation_reminder(true);
        assert!(is_redundant(RunState::Runnable, &table));
    }
}
