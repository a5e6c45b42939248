use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::bookmark::Bookmark;

/// Key under which the reminder table is stored alongside the rest of the instance state.
pub const REMINDER_TABLE_KEY: &str = "reminder_table";

/// Bookmarks whose reminders the service is honouring at the time of the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedReminders {
    pub bookmarks: BTreeSet<Bookmark>,
}

impl PersistedReminders {
    pub fn new(bookmarks: BTreeSet<Bookmark>) -> Self {
        Self { bookmarks }
    }

    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }
}

impl From<BTreeSet<Bookmark>> for PersistedReminders {
    fn from(value: BTreeSet<Bookmark>) -> Self {
        Self::new(value)
    }
}

impl IntoIterator for PersistedReminders {
    type Item = Bookmark;
    type IntoIter = std::collections::btree_set::IntoIter<Bookmark>;

    fn into_iter(self) -> Self::IntoIter {
        self.bookmarks.into_iter()
    }
}
