//! The reminder-to-bookmark association table and its lifecycle state machine.
//!
//! Nothing here talks to the reminder service. Register and cancel mutate entries directly,
//! lifecycle notifications are split into [`ReminderTable::plan`], which yields the external
//! calls to make, and [`ReminderTable::commit`], which advances an entry once its call is done.

use std::{
    collections::{BTreeSet, HashMap},
    time::Duration,
};

use chrono::{DateTime, Utc};

use crate::{bookmark::Bookmark, error::ProtocolViolation, naming::ReminderName};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// New reminder, not yet sent to the service.
    RegisterAndSave { due_time: DateTime<Utc> },
    /// Registered and persisted before, cancelled, then registered again.
    ReregisterAndResave { due_time: DateTime<Utc> },
    RegisteredButNotSaved,
    RegisteredButNotResaved,
    RegisteredAndSaved,
    /// Persisted association that must be dropped from the next snapshot before unregistering.
    SaveAndUnregister,
    /// Registered but never persisted, so it can be unregistered right away.
    Unregister,
}

impl EntryState {
    /// Entries the reminder service is known to honour.
    pub fn is_registered(&self) -> bool {
        matches!(
            self,
            EntryState::RegisteredButNotSaved
                | EntryState::RegisteredButNotResaved
                | EntryState::RegisteredAndSaved
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderEvent {
    Register { due_time: DateTime<Utc> },
    Cancel,
    Paused,
    Saving,
    Saved,
}

/// Notifications from the persistence cycle, applied to every entry at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Paused,
    Saving,
    Saved,
}

impl From<LifecycleEvent> for ReminderEvent {
    fn from(value: LifecycleEvent) -> Self {
        match value {
            LifecycleEvent::Paused => ReminderEvent::Paused,
            LifecycleEvent::Saving => ReminderEvent::Saving,
            LifecycleEvent::Saved => ReminderEvent::Saved,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalCall {
    Register { due_time: DateTime<Utc> },
    Unregister,
}

/// Outcome of one event on one entry. `next == None` removes the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub call: Option<ExternalCall>,
    pub next: Option<EntryState>,
}

impl Transition {
    fn to(next: EntryState) -> Self {
        Self {
            call: None,
            next: Some(next),
        }
    }

    fn stay(current: Option<EntryState>) -> Self {
        Self {
            call: None,
            next: current,
        }
    }

    fn delete() -> Self {
        Self {
            call: None,
            next: None,
        }
    }

    fn with_call(self, call: ExternalCall) -> Self {
        Self {
            call: Some(call),
            ..self
        }
    }
}

/// The complete state machine. `current == None` is an entry that does not exist.
/// Returns `None` when the event is a protocol violation in `current`.
pub fn transition(current: Option<EntryState>, event: &ReminderEvent) -> Option<Transition> {
    use EntryState::*;

    let transition = match (current, *event) {
        (None, ReminderEvent::Register { due_time }) => {
            Transition::to(RegisterAndSave { due_time })
        }
        (None, _) => Transition::stay(None),

        (Some(RegisterAndSave { .. }), ReminderEvent::Register { due_time }) => {
            Transition::to(RegisterAndSave { due_time })
        }
        (Some(RegisterAndSave { .. }), ReminderEvent::Cancel) => Transition::delete(),
        (Some(RegisterAndSave { due_time }), ReminderEvent::Paused) => {
            Transition::to(RegisteredButNotSaved).with_call(ExternalCall::Register { due_time })
        }

        (Some(ReregisterAndResave { .. }), ReminderEvent::Register { due_time }) => {
            Transition::to(ReregisterAndResave { due_time })
        }
        (Some(ReregisterAndResave { .. }), ReminderEvent::Cancel) => {
            Transition::to(SaveAndUnregister)
        }
        (Some(ReregisterAndResave { due_time }), ReminderEvent::Paused) => {
            Transition::to(RegisteredButNotResaved).with_call(ExternalCall::Register { due_time })
        }

        (Some(RegisteredButNotSaved), ReminderEvent::Cancel) => Transition::to(Unregister),
        (Some(RegisteredButNotResaved), ReminderEvent::Cancel) => Transition::to(SaveAndUnregister),
        (
            Some(state @ (RegisteredButNotSaved | RegisteredButNotResaved)),
            ReminderEvent::Paused,
        ) => Transition::stay(Some(state)),
        (Some(RegisteredButNotSaved | RegisteredButNotResaved), ReminderEvent::Saving) => {
            Transition::to(RegisteredAndSaved)
        }

        (Some(RegisteredAndSaved), ReminderEvent::Cancel) => Transition::to(SaveAndUnregister),
        (
            Some(RegisteredAndSaved),
            ReminderEvent::Paused | ReminderEvent::Saving | ReminderEvent::Saved,
        ) => Transition::stay(current),

        (Some(SaveAndUnregister), ReminderEvent::Register { due_time }) => {
            Transition::to(ReregisterAndResave { due_time })
        }
        (
            Some(SaveAndUnregister),
            ReminderEvent::Cancel | ReminderEvent::Paused | ReminderEvent::Saving,
        ) => Transition::stay(current),
        (Some(SaveAndUnregister), ReminderEvent::Saved) => {
            Transition::delete().with_call(ExternalCall::Unregister)
        }

        (Some(Unregister), ReminderEvent::Register { due_time }) => {
            Transition::to(RegisterAndSave { due_time })
        }
        (Some(Unregister), ReminderEvent::Cancel) => Transition::stay(current),
        (Some(Unregister), ReminderEvent::Paused) => {
            Transition::delete().with_call(ExternalCall::Unregister)
        }

        (Some(_), _) => return None,
    };

    Some(transition)
}

/// A call the reminder service has to make before the matching step is committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderCall {
    Register { name: ReminderName, due_in: Duration },
    Unregister { name: ReminderName },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    pub name: ReminderName,
    pub from: EntryState,
    pub next: Option<EntryState>,
    pub call: Option<ReminderCall>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderEntry {
    pub bookmark: Bookmark,
    pub state: EntryState,
}

#[derive(Debug, Default)]
pub struct ReminderTable {
    entries: HashMap<ReminderName, ReminderEntry>,
    has_reactivation_reminder: bool,
}

impl ReminderTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        bookmark: &Bookmark,
        due_time: DateTime<Utc>,
    ) -> Result<(), ProtocolViolation> {
        let name = ReminderName::for_bookmark(bookmark);
        self.apply_event(name, ReminderEvent::Register { due_time }, || bookmark.clone())
    }

    pub fn cancel(&mut self, bookmark: &Bookmark) -> Result<(), ProtocolViolation> {
        self.cancel_by_name(&ReminderName::for_bookmark(bookmark))
    }

    pub fn cancel_by_name(&mut self, name: &ReminderName) -> Result<(), ProtocolViolation> {
        match self.entries.get(name) {
            Some(entry) => {
                let bookmark = entry.bookmark.clone();
                self.apply_event(name.clone(), ReminderEvent::Cancel, || bookmark)
            }
            None => Ok(()),
        }
    }

    fn apply_event(
        &mut self,
        name: ReminderName,
        event: ReminderEvent,
        bookmark: impl FnOnce() -> Bookmark,
    ) -> Result<(), ProtocolViolation> {
        let current = self.entries.get(&name).map(|entry| entry.state);
        let Some(transition) = transition(current, &event) else {
            return Err(ProtocolViolation::InvalidTransition {
                name,
                state: current,
                event,
            });
        };
        debug_assert!(transition.call.is_none());

        log::debug!("Reminder {name}: {current:?} -> {:?} on {event:?}", transition.next);
        let Some(state) = transition.next else {
            self.entries.remove(&name);
            return Ok(());
        };

        match self.entries.get_mut(&name) {
            Some(entry) => entry.state = state,
            None => {
                let bookmark = bookmark();
                self.entries.insert(name, ReminderEntry { bookmark, state });
            }
        }

        Ok(())
    }

    /// Works out what `event` does to every entry without touching the table.
    /// Fails on the first entry that does not permit `event`; no-op steps are left out.
    pub fn plan(
        &self,
        event: LifecycleEvent,
        now: DateTime<Utc>,
    ) -> Result<Vec<PlannedStep>, ProtocolViolation> {
        let event = ReminderEvent::from(event);
        let mut steps = Vec::new();

        for (name, entry) in &self.entries {
            let Some(transition) = transition(Some(entry.state), &event) else {
                return Err(ProtocolViolation::InvalidTransition {
                    name: name.clone(),
                    state: Some(entry.state),
                    event,
                });
            };

            if transition.call.is_none() && transition.next == Some(entry.state) {
                continue;
            }

            let call = transition.call.map(|call| match call {
                ExternalCall::Register { due_time } => ReminderCall::Register {
                    name: name.clone(),
                    due_in: due_delay(due_time, now),
                },
                ExternalCall::Unregister => ReminderCall::Unregister { name: name.clone() },
            });

            steps.push(PlannedStep {
                name: name.clone(),
                from: entry.state,
                next: transition.next,
                call,
            });
        }

        steps.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(steps)
    }

    /// Applies a planned step. The entry must still be in the state it was planned from.
    pub fn commit(&mut self, step: &PlannedStep) -> Result<(), ProtocolViolation> {
        let found = self.entries.get(&step.name).map(|entry| entry.state);
        if found != Some(step.from) {
            return Err(ProtocolViolation::StaleStep {
                name: step.name.clone(),
                expected: step.from,
                found,
            });
        }

        log::debug!("Reminder {}: {:?} -> {:?}", step.name, step.from, step.next);
        match step.next {
            Some(state) => {
                if let Some(entry) = self.entries.get_mut(&step.name) {
                    entry.state = state;
                }
            }
            None => {
                self.entries.remove(&step.name);
            }
        }

        Ok(())
    }

    pub fn collect_persistable_bookmarks(&self) -> BTreeSet<Bookmark> {
        self.entries
            .values()
            .filter(|entry| entry.state.is_registered())
            .map(|entry| entry.bookmark.clone())
            .collect()
    }

    /// Replaces the table with persisted bookmarks, all trusted as registered and saved.
    pub fn load_from_persisted_bookmarks(&mut self, bookmarks: impl IntoIterator<Item = Bookmark>) {
        self.entries.clear();
        self.has_reactivation_reminder = false;

        for bookmark in bookmarks {
            self.entries.insert(
                ReminderName::for_bookmark(&bookmark),
                ReminderEntry {
                    bookmark,
                    state: EntryState::RegisteredAndSaved,
                },
            );
        }
    }

    pub fn has_registered_and_saved(&self) -> bool {
        self.entries
            .values()
            .any(|entry| entry.state == EntryState::RegisteredAndSaved)
    }

    pub fn has_reactivation_reminder(&self) -> bool {
        self.has_reactivation_reminder
    }

    pub(crate) fn set_reactivation_reminder(&mut self, registered: bool) {
        self.has_reactivation_reminder = registered;
    }

    pub fn get(&self, name: &ReminderName) -> Option<&ReminderEntry> {
        self.entries.get(name)
    }

    pub fn state_of(&self, bookmark: &Bookmark) -> Option<EntryState> {
        self.entries
            .get(&ReminderName::for_bookmark(bookmark))
            .map(|entry| entry.state)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Delay until `due_time`; overdue reminders fire immediately.
pub fn due_delay(due_time: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (due_time - now).to_std().unwrap_or(Duration::ZERO)
}
