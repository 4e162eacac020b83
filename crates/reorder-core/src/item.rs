#![forbid(unsafe_code)]

//! Stable item identifiers and handle-id parsing.
//!
//! Rows are addressed by an [`ItemId`] that never changes while the row
//! moves. Hosts that render rows as DOM-like nodes expose the id on the
//! row's handle element with a fixed prefix; [`HandlePrefix`] converts
//! between the two forms.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix carried by handle element ids in the default markup.
pub const DEFAULT_HANDLE_PREFIX: &str = "folder-contents-item-";

/// Stable identifier of a reorderable row, independent of its position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create an id from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the id, returning the owned string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for ItemId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors produced while resolving a handle element id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The raw id was empty, or nothing followed the prefix.
    Empty,
    /// The raw id does not start with the expected prefix.
    MissingPrefix {
        /// The id as found on the element.
        raw: String,
        /// The prefix that was expected.
        prefix: String,
    },
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty item id"),
            Self::MissingPrefix { raw, prefix } => {
                write!(f, "handle id {raw:?} does not start with {prefix:?}")
            }
        }
    }
}

impl std::error::Error for IdError {}

/// Id prefix shared by every handle element in a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlePrefix(String);

impl Default for HandlePrefix {
    fn default() -> Self {
        Self(DEFAULT_HANDLE_PREFIX.to_string())
    }
}

impl HandlePrefix {
    /// Create a prefix. An empty prefix accepts any non-empty id verbatim.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }

    /// The prefix text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Strip the prefix from a handle element id, yielding the item id.
    pub fn strip(&self, raw: &str) -> Result<ItemId, IdError> {
        if raw.is_empty() {
            return Err(IdError::Empty);
        }
        let rest = raw
            .strip_prefix(self.0.as_str())
            .ok_or_else(|| IdError::MissingPrefix {
                raw: raw.to_string(),
                prefix: self.0.clone(),
            })?;
        if rest.is_empty() {
            return Err(IdError::Empty);
        }
        Ok(ItemId::new(rest))
    }

    /// Build the handle element id for an item.
    #[must_use]
    pub fn handle_id(&self, item: &ItemId) -> String {
        format!("{}{}", self.0, item.as_str())
    }
}
