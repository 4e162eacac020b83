#![forbid(unsafe_code)]

//! In-memory position authority.
//!
//! [`MemoryAuthority`] holds the authoritative order and applies commits the
//! way a folder-ordering server does: the item is moved by `delta` within
//! the submitted subset, and the reordered subset is written back into the
//! slots its members occupy in the full order. Items outside the subset
//! never move.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, PoisonError};

use reorder_core::ItemId;
use reorder_widgets::commit::STATUS_OK;
use reorder_widgets::{CommitRequest, CommitResponse};
use tracing::{debug, warn};

use crate::service::{PositionCommitService, ServiceError};

const STATUS_BAD_REQUEST: u16 = 400;

#[derive(Debug, Default)]
struct AuthorityState {
    order: Vec<ItemId>,
    scripted: VecDeque<Scripted>,
    requests: Vec<CommitRequest>,
}

#[derive(Debug)]
enum Scripted {
    Respond(CommitResponse),
    Transport(String),
}

/// Thread-safe in-memory implementation of [`PositionCommitService`].
#[derive(Debug, Default)]
pub struct MemoryAuthority {
    state: Mutex<AuthorityState>,
}

impl MemoryAuthority {
    /// Create an authority holding `order`.
    pub fn new<I, T>(order: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ItemId>,
    {
        Self {
            state: Mutex::new(AuthorityState {
                order: order.into_iter().map(Into::into).collect(),
                ..AuthorityState::default()
            }),
        }
    }

    /// The current authoritative order.
    #[must_use]
    pub fn order(&self) -> Vec<ItemId> {
        self.lock().order.clone()
    }

    /// Every request received so far, including refused ones.
    #[must_use]
    pub fn requests(&self) -> Vec<CommitRequest> {
        self.lock().requests.clone()
    }

    /// Answer the next commit with `status_code` without applying it.
    pub fn fail_next(&self, status_code: u16, message: impl Into<String>) {
        self.lock()
            .scripted
            .push_back(Scripted::Respond(CommitResponse::new(status_code, message)));
    }

    /// Fail the next commit at the transport level.
    pub fn drop_next(&self, reason: impl Into<String>) {
        self.lock()
            .scripted
            .push_back(Scripted::Transport(reason.into()));
    }

    /// Apply a request to the order, returning the response the server sends.
    pub fn apply(&self, request: &CommitRequest) -> CommitResponse {
        let mut state = self.lock();
        state.requests.push(request.clone());
        match move_within_subset(&state.order, request) {
            Ok(order) => {
                debug!(item = %request.item_id, delta = request.delta, "authority moved item");
                state.order = order;
                CommitResponse::new(STATUS_OK, "Item moved")
            }
            Err(reason) => {
                warn!(item = %request.item_id, reason = %reason, "authority refused move");
                CommitResponse::new(STATUS_BAD_REQUEST, reason)
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AuthorityState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PositionCommitService for MemoryAuthority {
    fn commit(&self, request: &CommitRequest) -> Result<CommitResponse, ServiceError> {
        let scripted = self.lock().scripted.pop_front();
        match scripted {
            Some(Scripted::Respond(response)) => {
                self.lock().requests.push(request.clone());
                Ok(response)
            }
            Some(Scripted::Transport(reason)) => {
                self.lock().requests.push(request.clone());
                Err(ServiceError::Transport(reason))
            }
            None => Ok(self.apply(request)),
        }
    }
}

fn move_within_subset(order: &[ItemId], request: &CommitRequest) -> Result<Vec<ItemId>, String> {
    let subset = &request.order_snapshot;
    let mut seen = HashSet::with_capacity(subset.len());
    let mut slots = Vec::with_capacity(subset.len());
    for id in subset {
        if !seen.insert(id) {
            return Err(format!("duplicate id {id} in subset"));
        }
        let slot = order
            .iter()
            .position(|o| o == id)
            .ok_or_else(|| format!("unknown id {id} in subset"))?;
        slots.push(slot);
    }
    let from = subset
        .iter()
        .position(|id| *id == request.item_id)
        .ok_or_else(|| format!("{} is not in the subset", request.item_id))?;
    let to = i64::try_from(from)
        .ok()
        .and_then(|from| from.checked_add(request.delta))
        .and_then(|to| usize::try_from(to).ok())
        .filter(|to| *to < subset.len())
        .ok_or_else(|| format!("delta {} out of range", request.delta))?;

    let mut moved = subset.clone();
    let item = moved.remove(from);
    moved.insert(to, item);

    slots.sort_unstable();
    let mut result = order.to_vec();
    for (slot, id) in slots.into_iter().zip(moved) {
        result[slot] = id;
    }
    Ok(result)
}
