use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque token identifying a suspended point of the hosted computation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bookmark(String);

impl Bookmark {
    pub fn new(inner: impl Into<String>) -> Self {
        Self(inner.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Bookmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Bookmark {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Bookmark {
    fn from(value: String) -> Self {
        Self(value)
    }
}
