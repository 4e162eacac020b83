#![forbid(unsafe_code)]

//! Recovery policy for cancelled drags and commit outcomes.
//!
//! Recovery is always external: the engine never retries a commit and
//! never clears an error marker on its own, since the authoritative order
//! lives with the authority and a blind retry could apply a move twice.
//!
//! | Situation | Verdict |
//! |-----------|---------|
//! | Cancel, item back at its start | [`CancelVerdict::Unwind`] |
//! | Cancel, item displaced | [`CancelVerdict::LockWithError`] |
//! | `200` response | [`ResponseVerdict::Unlock`] |
//! | Other status or transport failure | [`ResponseVerdict::HoldWithError`] |

use reorder_core::ItemId;
use serde::Serialize;

use crate::commit::CommitOutcome;

/// What to do when a drag is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelVerdict {
    /// No net move: clear markers, no lock, no error.
    Unwind,
    /// The displayed order no longer matches any order the authority knows.
    LockWithError,
}

/// What to do when a commit finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseVerdict {
    Unlock,
    HoldWithError,
}

/// Decide a cancellation from the session's start and current position.
///
/// A row that has left the container counts as displaced.
#[must_use]
pub fn on_cancel(start: usize, now: Option<usize>) -> CancelVerdict {
    if now == Some(start) {
        CancelVerdict::Unwind
    } else {
        CancelVerdict::LockWithError
    }
}

/// Decide a commit outcome.
#[must_use]
pub fn on_response(outcome: &CommitOutcome) -> ResponseVerdict {
    if outcome.is_success() {
        ResponseVerdict::Unlock
    } else {
        ResponseVerdict::HoldWithError
    }
}

/// Something the cancellation/error sink should hear about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// A drag ended with no net move.
    Cancelled { item: ItemId },
    /// A drag was abandoned away from its start position.
    Abandoned {
        item: ItemId,
        start: usize,
        now: Option<usize>,
    },
    /// A pointer-down arrived while a drag was still open on another row.
    LostRelease { item: ItemId, interrupted_by: ItemId },
    /// A commit was dispatched.
    Dispatched { item: ItemId, delta: i64 },
    /// The authority accepted the move.
    Committed {
        item: ItemId,
        delta: i64,
        message: String,
    },
    /// The authority answered with a non-success status.
    Rejected {
        item: ItemId,
        status_code: u16,
        message: String,
    },
    /// The commit never produced a response.
    TransportFailed { item: ItemId, reason: String },
    /// A drag was refused because the list is locked.
    LockedOut { item: ItemId },
    /// A resync arrived while a commit for `item` was outstanding; the
    /// offered order was not adopted.
    ResyncDeferred { item: ItemId },
    /// An operator reset the controller.
    Reset,
}

impl Notice {
    /// Whether this notice reports an error condition.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::Abandoned { .. }
                | Self::LostRelease { .. }
                | Self::Rejected { .. }
                | Self::TransportFailed { .. }
                | Self::LockedOut { .. }
        )
    }

    /// The row this notice is about, if any.
    #[must_use]
    pub fn item(&self) -> Option<&ItemId> {
        match self {
            Self::Cancelled { item }
            | Self::Abandoned { item, .. }
            | Self::LostRelease { item, .. }
            | Self::Dispatched { item, .. }
            | Self::Committed { item, .. }
            | Self::Rejected { item, .. }
            | Self::TransportFailed { item, .. }
            | Self::LockedOut { item }
            | Self::ResyncDeferred { item } => Some(item),
            Self::Reset => None,
        }
    }
}
