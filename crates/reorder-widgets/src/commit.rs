#![forbid(unsafe_code)]

//! Commit protocol wire types.
//!
//! A release with a net displacement produces exactly one [`CommitRequest`].
//! The request carries a relative `delta` plus the order the delta was
//! computed against, never an absolute target index, so the authority can
//! interpret the move even if it reordered the collection in the meantime.
//!
//! # Wire format
//!
//! JSON field names follow the authority's form vocabulary:
//!
//! ```text
//! {"item_id": "news", "delta": 1, "subset_ids": ["home", "news", "events"]}
//! {"status_code": 200, "status_message": "Action moved"}
//! ```

use reorder_core::ItemId;
use serde::{Deserialize, Serialize};

/// HTTP-style status that marks a successful commit.
pub const STATUS_OK: u16 = 200;

/// Signed displacement between two positions.
#[must_use]
pub fn compute_delta(start: usize, now: usize) -> i64 {
    now as i64 - start as i64
}

/// A single position commit sent to the authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRequest {
    /// The moved item.
    pub item_id: ItemId,
    /// Net displacement; positive means toward the end of the list.
    pub delta: i64,
    /// Every id in display order as captured when the drag started.
    #[serde(rename = "subset_ids")]
    pub order_snapshot: Vec<ItemId>,
}

impl CommitRequest {
    #[must_use]
    pub fn new(item_id: ItemId, delta: i64, order_snapshot: Vec<ItemId>) -> Self {
        Self {
            item_id,
            delta,
            order_snapshot,
        }
    }

    /// Form-encoded field pairs in the authority's typed-field convention.
    ///
    /// `delta` is tagged `:int` and the snapshot is sent as a repeated
    /// `subset_ids:list` field.
    #[must_use]
    pub fn to_form_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.order_snapshot.len() + 2);
        pairs.push(("item_id".to_string(), self.item_id.to_string()));
        pairs.push(("delta:int".to_string(), self.delta.to_string()));
        pairs.extend(
            self.order_snapshot
                .iter()
                .map(|id| ("subset_ids:list".to_string(), id.to_string())),
        );
        pairs
    }
}

/// The authority's answer to a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitResponse {
    pub status_code: u16,
    #[serde(default)]
    pub status_message: String,
}

impl CommitResponse {
    #[must_use]
    pub fn new(status_code: u16, status_message: impl Into<String>) -> Self {
        Self {
            status_code,
            status_message: status_message.into(),
        }
    }

    /// A `200` response.
    #[must_use]
    pub fn ok(status_message: impl Into<String>) -> Self {
        Self::new(STATUS_OK, status_message)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status_code == STATUS_OK
    }
}

/// How an outstanding commit ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The authority answered.
    Response(CommitResponse),
    /// The request never produced a response.
    TransportFailed(String),
}

impl CommitOutcome {
    /// Only a `200` response counts as success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Response(r) if r.is_success())
    }
}

impl From<CommitResponse> for CommitOutcome {
    fn from(response: CommitResponse) -> Self {
        Self::Response(response)
    }
}
