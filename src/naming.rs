//! Reminder names understood by the external reminder service.
//!
//! A bookmark's reminder name is `bookmark/v<version>/<bookmark text>`. The fallback reactivation
//! reminder lives outside that namespace, so it can never be decoded as a bookmark, and names
//! created by anyone else are reported as [`ParsedName::Foreign`].

use std::fmt;

use crate::bookmark::Bookmark;

const BOOKMARK_NAMESPACE: &str = "bookmark";
const NAME_VERSION: &str = "1";
const REACTIVATION_NAME: &str = "reactivation/v1";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReminderName(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedName {
    Bookmark(Bookmark),
    Reactivation,
    Foreign,
}

impl ReminderName {
    pub fn for_bookmark(bookmark: &Bookmark) -> Self {
        Self(format!(
            "{BOOKMARK_NAMESPACE}/v{NAME_VERSION}/{}",
            bookmark.as_str()
        ))
    }

    pub fn reactivation() -> Self {
        Self(REACTIVATION_NAME.to_owned())
    }

    /// Wraps a name as reported by the reminder service.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn parse(&self) -> ParsedName {
        parse(&self.0)
    }
}

impl fmt::Display for ReminderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn parse(name: &str) -> ParsedName {
    if name == REACTIVATION_NAME {
        return ParsedName::Reactivation;
    }

    let Some(text) = name
        .strip_prefix(BOOKMARK_NAMESPACE)
        .and_then(|rest| rest.strip_prefix("/v"))
        .and_then(|rest| rest.strip_prefix(NAME_VERSION))
        .and_then(|rest| rest.strip_prefix('/'))
    else {
        return ParsedName::Foreign;
    };

    ParsedName::Bookmark(Bookmark::new(text))
}

pub fn get_bookmark(name: &str) -> Option<Bookmark> {
    match parse(name) {
        ParsedName::Bookmark(bookmark) => Some(bookmark),
        _ => None,
    }
}

pub fn is_reactivation_reminder(name: &str) -> bool {
    name == REACTIVATION_NAME
}
