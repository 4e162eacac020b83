#![forbid(unsafe_code)]

//! Drag controller: the reorder state machine.
//!
//! [`DragController`] owns the [`ListContainer`] and a [`ControllerState`]
//! value (`Idle | Dragging | Locked`). Every input is a typed call that
//! returns a [`Transition`] describing the side effects the host must
//! perform. The controller itself performs no IO, so it can be driven
//! entirely from tests.
//!
//! # Lifecycle
//!
//! ```text
//! Idle --down(handle)--> Dragging --up, delta != 0--> Locked(pending commit)
//!                           |  \--up, delta == 0--> cancel path
//!                           \--leave--> cancel path --> Idle | Locked(error)
//! Locked(pending) --outcome ok--> Idle
//! Locked(pending) --outcome failed--> Locked(error)
//! Locked(error) --reset--> Idle
//! ```
//!
//! # Invariants
//!
//! 1. At most one [`DragSession`] exists, and none while locked.
//! 2. At most one commit is outstanding; it is only dispatched from
//!    `Dragging`, which cannot be re-entered until the lock clears.
//! 3. The `error` marker is only removed by [`DragController::reset`].
//!
//! # Failure Modes
//!
//! | Failure | Cause | Fallback |
//! |---------|-------|----------|
//! | Handle-down while locked | Commit in flight or error unacknowledged | Target marked `error`, lock kept |
//! | Handle-down on another row mid-drag | Release event was lost | Dragged row marked `error`, locked |
//! | Pointer leaves with net move | Drag abandoned | Row marked `error`, locked |
//! | Commit rejected / transport failure | Authority refused | Row marked `error`, lock kept |

use reorder_core::{ItemId, PointerEvent, PointerEventKind, PointerTarget};

use crate::commit::{CommitOutcome, CommitRequest, compute_delta};
use crate::list_model::{ListContainer, OrderError};
use crate::markers::Markers;
use crate::recovery::{self, CancelVerdict, Notice, ResponseVerdict};

/// An active drag, created at pointer-down and consumed at release or cancel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    item: ItemId,
    start_position: usize,
    order_snapshot: Vec<ItemId>,
}

impl DragSession {
    /// The row being dragged.
    #[must_use]
    pub fn item(&self) -> &ItemId {
        &self.item
    }

    /// Position of the row when the drag started.
    #[must_use]
    pub fn start_position(&self) -> usize {
        self.start_position
    }

    /// Display order captured when the drag started.
    #[must_use]
    pub fn order_snapshot(&self) -> &[ItemId] {
        &self.order_snapshot
    }
}

/// The global lock: held while a commit is in flight or an error is unacknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockState {
    item: ItemId,
    error: bool,
    pending: Option<DragSession>,
}

impl LockState {
    /// The row whose drag caused the lock.
    #[must_use]
    pub fn item(&self) -> &ItemId {
        &self.item
    }

    /// Whether an error requires operator acknowledgement.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error
    }

    /// The session whose commit is outstanding, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&DragSession> {
        self.pending.as_ref()
    }
}

/// Full controller state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ControllerState {
    #[default]
    Idle,
    Dragging(DragSession),
    Locked(LockState),
}

/// Coarse phase of the controller, for hosts and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    Dragging,
    Locked { error: bool },
}

/// A side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send this request to the position-commit service.
    DispatchCommit(CommitRequest),
    /// Forward this notice to the cancellation/error sink.
    Notify(Notice),
}

/// Result of feeding one input to the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    effects: Vec<Effect>,
    changed: bool,
}

impl Transition {
    fn noop() -> Self {
        Self::default()
    }

    fn changed() -> Self {
        Self {
            effects: Vec::new(),
            changed: true,
        }
    }

    fn notify(mut self, notice: Notice) -> Self {
        self.effects.push(Effect::Notify(notice));
        self
    }

    fn dispatch(mut self, request: CommitRequest) -> Self {
        self.effects.push(Effect::DispatchCommit(request));
        self
    }

    /// `true` when neither state nor markers changed and nothing must be done.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        !self.changed && self.effects.is_empty()
    }

    /// Effects in the order they should be performed.
    #[must_use]
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Consume the transition, returning its effects.
    #[must_use]
    pub fn into_effects(self) -> Vec<Effect> {
        self.effects
    }

    /// The commit to dispatch, if this transition released a drag.
    #[must_use]
    pub fn commit_request(&self) -> Option<&CommitRequest> {
        self.effects.iter().find_map(|e| match e {
            Effect::DispatchCommit(req) => Some(req),
            Effect::Notify(_) => None,
        })
    }

    /// Notices raised by this transition.
    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.effects.iter().filter_map(|e| match e {
            Effect::Notify(n) => Some(n),
            Effect::DispatchCommit(_) => None,
        })
    }
}

/// The reorder state machine.
#[derive(Debug, Clone)]
pub struct DragController {
    list: ListContainer,
    state: ControllerState,
}

impl DragController {
    /// Create an idle controller over `list`.
    #[must_use]
    pub fn new(list: ListContainer) -> Self {
        Self {
            list,
            state: ControllerState::Idle,
        }
    }

    /// The container, in current display order.
    #[must_use]
    pub fn list(&self) -> &ListContainer {
        &self.list
    }

    #[must_use]
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        match &self.state {
            ControllerState::Idle => Phase::Idle,
            ControllerState::Dragging(_) => Phase::Dragging,
            ControllerState::Locked(lock) => Phase::Locked { error: lock.error },
        }
    }

    /// Whether the global lock is held.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        matches!(self.state, ControllerState::Locked(_))
    }

    /// The active drag session, if any.
    #[must_use]
    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            ControllerState::Dragging(session) => Some(session),
            _ => None,
        }
    }

    /// Whether a commit is outstanding.
    #[must_use]
    pub fn commit_pending(&self) -> bool {
        matches!(&self.state, ControllerState::Locked(lock) if lock.pending.is_some())
    }

    fn pending_item(&self) -> Option<ItemId> {
        match &self.state {
            ControllerState::Locked(LockState {
                pending: Some(session),
                ..
            }) => Some(session.item.clone()),
            _ => None,
        }
    }

    /// Route a typed pointer event to its handler.
    pub fn ingest(&mut self, event: &PointerEvent) -> Transition {
        match event.kind {
            PointerEventKind::Down => self.on_pointer_down(&event.target),
            PointerEventKind::Move => self.on_pointer_move(&event.target),
            PointerEventKind::Up => self.on_pointer_up(),
            PointerEventKind::Leave => self.on_pointer_cancel(),
        }
    }

    /// Pointer pressed. Only handle hits on member rows are considered.
    pub fn on_pointer_down(&mut self, target: &PointerTarget) -> Transition {
        let Some(id) = target.handle() else {
            return Transition::noop();
        };
        if !self.list.contains(id) {
            return Transition::noop();
        }

        match std::mem::take(&mut self.state) {
            ControllerState::Idle => self.start_session(id.clone()),
            ControllerState::Dragging(session) if session.item == *id => {
                self.state = ControllerState::Dragging(session);
                Transition::noop()
            }
            ControllerState::Dragging(session) => {
                // The release for `session` never arrived.
                reorder_core::warn!(item = %session.item, interrupted_by = %id, "drag release lost");
                self.clear_transient(&session.item);
                self.list.mark(&session.item, Markers::ERROR);
                let notice = Notice::LostRelease {
                    item: session.item.clone(),
                    interrupted_by: id.clone(),
                };
                self.state = ControllerState::Locked(LockState {
                    item: session.item,
                    error: true,
                    pending: None,
                });
                Transition::changed().notify(notice)
            }
            ControllerState::Locked(lock) if lock.item == *id => {
                self.state = ControllerState::Locked(lock);
                Transition::noop()
            }
            ControllerState::Locked(mut lock) => {
                reorder_core::debug!(item = %id, locked_by = %lock.item, "drag refused while locked");
                self.list.mark(id, Markers::ERROR);
                lock.error = true;
                self.state = ControllerState::Locked(lock);
                Transition::changed().notify(Notice::LockedOut { item: id.clone() })
            }
        }
    }

    /// Pointer moved over `target` while possibly dragging.
    pub fn on_pointer_move(&mut self, target: &PointerTarget) -> Transition {
        let ControllerState::Dragging(session) = &self.state else {
            return Transition::noop();
        };
        let Some(over) = target.row() else {
            return Transition::noop();
        };
        if *over == session.item {
            return Transition::noop();
        }
        if self.list.swap_adjacent(over, &session.item).is_swapped() {
            reorder_core::trace!(item = %session.item, over = %over, "rows swapped");
            Transition::changed()
        } else {
            Transition::noop()
        }
    }

    /// Pointer released: commit a net move, or cancel a zero-delta drag.
    pub fn on_pointer_up(&mut self) -> Transition {
        let Some(session) = self.take_session() else {
            return Transition::noop();
        };
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("drag_release", item = %session.item).entered();
        let now = self.list.position_of(&session.item);
        let delta = now.map(|now| compute_delta(session.start_position, now));
        match delta {
            Some(delta) if delta != 0 => {
                let request = CommitRequest::new(
                    session.item.clone(),
                    delta,
                    session.order_snapshot.clone(),
                );
                reorder_core::info!(item = %session.item, delta, "dispatching position commit");
                let notice = Notice::Dispatched {
                    item: session.item.clone(),
                    delta,
                };
                self.state = ControllerState::Locked(LockState {
                    item: session.item.clone(),
                    error: false,
                    pending: Some(session),
                });
                Transition::changed().dispatch(request).notify(notice)
            }
            _ => self.cancel_session(session),
        }
    }

    /// Pointer left the interactive surface.
    pub fn on_pointer_cancel(&mut self) -> Transition {
        let Some(session) = self.take_session() else {
            return Transition::noop();
        };
        self.cancel_session(session)
    }

    /// The outstanding commit finished.
    pub fn on_commit_outcome(&mut self, outcome: CommitOutcome) -> Transition {
        let (mut lock, session) = match std::mem::take(&mut self.state) {
            ControllerState::Locked(LockState {
                item,
                error,
                pending: Some(session),
            }) => (
                LockState {
                    item,
                    error,
                    pending: None,
                },
                session,
            ),
            other => {
                reorder_core::warn!(phase = ?other, "commit outcome with nothing pending");
                self.state = other;
                return Transition::noop();
            }
        };

        self.clear_transient(&session.item);
        let delta = self
            .list
            .position_of(&session.item)
            .map_or(0, |now| compute_delta(session.start_position, now));

        let notice = match recovery::on_response(&outcome) {
            ResponseVerdict::Unlock => {
                let message = match outcome {
                    CommitOutcome::Response(resp) => resp.status_message,
                    CommitOutcome::TransportFailed(reason) => reason,
                };
                // Rows refused while the commit was out keep their error
                // marker until reset; the lock itself is released.
                self.state = ControllerState::Idle;
                reorder_core::info!(item = %session.item, delta, "position commit accepted");
                Notice::Committed {
                    item: session.item,
                    delta,
                    message,
                }
            }
            ResponseVerdict::HoldWithError => {
                self.list.mark(&session.item, Markers::ERROR);
                lock.error = true;
                self.state = ControllerState::Locked(lock);
                match outcome {
                    CommitOutcome::Response(resp) => {
                        reorder_core::warn!(
                            item = %session.item,
                            status = resp.status_code,
                            "position commit rejected"
                        );
                        Notice::Rejected {
                            item: session.item,
                            status_code: resp.status_code,
                            message: resp.status_message,
                        }
                    }
                    CommitOutcome::TransportFailed(reason) => {
                        reorder_core::warn!(item = %session.item, reason = %reason, "position commit failed");
                        Notice::TransportFailed {
                            item: session.item,
                            reason,
                        }
                    }
                }
            }
        };
        Transition::changed().notify(notice)
    }

    /// Operator acknowledgement: clear every error and return to idle.
    ///
    /// An outstanding commit keeps the lock; only its error flag is cleared.
    pub fn reset(&mut self) -> Transition {
        self.list
            .clear_marker_everywhere(Markers::ERROR | Markers::TRANSIENT);
        self.state = match std::mem::take(&mut self.state) {
            ControllerState::Locked(LockState {
                item,
                pending: Some(session),
                ..
            }) => {
                self.list.mark(&session.item, Markers::DRAGGING);
                self.list.mark_all(Markers::INDICATOR);
                ControllerState::Locked(LockState {
                    item,
                    error: false,
                    pending: Some(session),
                })
            }
            _ => ControllerState::Idle,
        };
        reorder_core::info!(phase = ?self.phase(), "reorder controller reset");
        Transition::changed().notify(Notice::Reset)
    }

    /// Reset and adopt the authority's order.
    ///
    /// While a commit is outstanding the order is not adopted: the
    /// transition carries [`Notice::ResyncDeferred`] ahead of
    /// [`Notice::Reset`] and the host should resync once the commit settles.
    pub fn reset_with_order(&mut self, order: &[ItemId]) -> Result<Transition, OrderError> {
        if let Some(item) = self.pending_item() {
            // The pending commit was computed against the displayed order.
            reorder_core::debug!(
                item = %item,
                offered = order.len(),
                "resync deferred until commit settles"
            );
            let mut effects = vec![Effect::Notify(Notice::ResyncDeferred { item })];
            effects.extend(self.reset().into_effects());
            return Ok(Transition {
                effects,
                changed: true,
            });
        }
        self.list.apply_order(order)?;
        Ok(self.reset())
    }

    fn start_session(&mut self, item: ItemId) -> Transition {
        let Some(start_position) = self.list.position_of(&item) else {
            return Transition::noop();
        };
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("drag_start", item = %item, start_position).entered();
        let order_snapshot = self.list.ids();
        self.list.mark_all(Markers::INDICATOR);
        self.list.mark(&item, Markers::DRAGGING);
        reorder_core::debug!(item = %item, start_position, "drag started");
        self.state = ControllerState::Dragging(DragSession {
            item,
            start_position,
            order_snapshot,
        });
        Transition::changed()
    }

    fn cancel_session(&mut self, session: DragSession) -> Transition {
        self.clear_transient(&session.item);
        let now = self.list.position_of(&session.item);
        match recovery::on_cancel(session.start_position, now) {
            CancelVerdict::Unwind => {
                reorder_core::debug!(item = %session.item, "drag cancelled without net move");
                self.state = ControllerState::Idle;
                Transition::changed().notify(Notice::Cancelled { item: session.item })
            }
            CancelVerdict::LockWithError => {
                reorder_core::warn!(
                    item = %session.item,
                    start = session.start_position,
                    "drag abandoned away from its start"
                );
                self.list.mark(&session.item, Markers::ERROR);
                let notice = Notice::Abandoned {
                    item: session.item.clone(),
                    start: session.start_position,
                    now,
                };
                self.state = ControllerState::Locked(LockState {
                    item: session.item,
                    error: true,
                    pending: None,
                });
                Transition::changed().notify(notice)
            }
        }
    }

    fn clear_transient(&mut self, item: &ItemId) {
        self.list.unmark(item, Markers::DRAGGING);
        self.list.clear_marker_everywhere(Markers::INDICATOR);
    }

    fn take_session(&mut self) -> Option<DragSession> {
        match std::mem::take(&mut self.state) {
            ControllerState::Dragging(session) => Some(session),
            other => {
                self.state = other;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::CommitResponse;
    use pretty_assertions::assert_eq;

    fn controller(ids: &[&str]) -> DragController {
        DragController::new(ListContainer::new(ids.iter().copied()).unwrap())
    }

    fn id(s: &str) -> ItemId {
        ItemId::from(s)
    }

    fn order(c: &DragController) -> Vec<String> {
        c.list().ids().into_iter().map(ItemId::into_string).collect()
    }

    fn down(c: &mut DragController, s: &str) -> Transition {
        c.ingest(&PointerEvent::down(s))
    }

    fn over(c: &mut DragController, s: &str) -> Transition {
        c.ingest(&PointerEvent::move_over(s))
    }

    #[test]
    fn pointer_down_starts_session() {
        let mut c = controller(&["a", "b", "c"]);
        let t = down(&mut c, "b");
        assert!(!t.is_noop());
        assert_eq!(c.phase(), Phase::Dragging);
        let session = c.session().unwrap();
        assert_eq!(session.item(), &id("b"));
        assert_eq!(session.start_position(), 1);
        assert_eq!(session.order_snapshot(), &[id("a"), id("b"), id("c")]);
        assert!(c.list().markers_of(&id("b")).unwrap().contains(Markers::DRAGGING));
        assert_eq!(c.list().ids_marked(Markers::INDICATOR).len(), 3);
    }

    #[test]
    fn pointer_down_off_handle_or_unknown_is_noop() {
        let mut c = controller(&["a", "b"]);
        let body = PointerEvent::new(PointerEventKind::Down, PointerTarget::Row(id("a")));
        assert!(c.ingest(&body).is_noop());
        assert!(c.ingest(&PointerEvent::new(PointerEventKind::Down, PointerTarget::Outside)).is_noop());
        assert!(down(&mut c, "ghost").is_noop());
        assert_eq!(c.phase(), Phase::Idle);
    }

    #[test]
    fn move_without_session_is_noop() {
        let mut c = controller(&["a", "b"]);
        assert!(over(&mut c, "b").is_noop());
        assert_eq!(order(&c), vec!["a", "b"]);
    }

    #[test]
    fn round_trip_commit_success() {
        let mut c = controller(&["A", "B", "C", "D"]);
        down(&mut c, "B");
        over(&mut c, "C");
        assert_eq!(order(&c), vec!["A", "C", "B", "D"]);

        let t = c.on_pointer_up();
        let req = t.commit_request().unwrap().clone();
        assert_eq!(req.item_id, id("B"));
        assert_eq!(req.delta, 1);
        assert_eq!(req.order_snapshot, vec![id("A"), id("B"), id("C"), id("D")]);
        assert!(c.is_locked());
        assert!(c.commit_pending());

        let t = c.on_commit_outcome(CommitResponse::ok("moved").into());
        assert_eq!(c.phase(), Phase::Idle);
        assert!(c.list().ids_marked(Markers::ERROR).is_empty());
        assert!(c.list().ids_marked(Markers::DRAGGING).is_empty());
        assert!(c.list().ids_marked(Markers::INDICATOR).is_empty());
        assert_eq!(
            t.notices().cloned().collect::<Vec<_>>(),
            vec![Notice::Committed {
                item: id("B"),
                delta: 1,
                message: "moved".into()
            }]
        );
    }

    #[test]
    fn markers_persist_until_response() {
        let mut c = controller(&["a", "b", "c"]);
        down(&mut c, "a");
        over(&mut c, "b");
        c.on_pointer_up();
        assert!(c.list().markers_of(&id("a")).unwrap().contains(Markers::DRAGGING));
        c.on_commit_outcome(CommitResponse::ok("").into());
        assert!(!c.list().markers_of(&id("a")).unwrap().contains(Markers::DRAGGING));
    }

    #[test]
    fn zero_delta_release_unwinds() {
        let mut c = controller(&["a", "b", "c"]);
        down(&mut c, "b");
        over(&mut c, "c");
        assert_eq!(order(&c), vec!["a", "c", "b"]);
        // Moving back over "c" swaps it down again.
        over(&mut c, "c");
        assert_eq!(order(&c), vec!["a", "b", "c"]);
        let t = c.on_pointer_up();
        assert!(t.commit_request().is_none());
        assert_eq!(c.phase(), Phase::Idle);
        assert!(c.list().ids_marked(Markers::ERROR).is_empty());
        assert!(c.list().ids_marked(Markers::INDICATOR).is_empty());
        assert_eq!(
            t.notices().cloned().collect::<Vec<_>>(),
            vec![Notice::Cancelled { item: id("b") }]
        );
    }

    #[test]
    fn cancellation_with_residual_move_locks_with_error() {
        let mut c = controller(&["A", "B", "C"]);
        down(&mut c, "B");
        over(&mut c, "C");
        assert_eq!(order(&c), vec!["A", "C", "B"]);
        let t = c.ingest(&PointerEvent::leave());
        assert!(t.commit_request().is_none());
        assert_eq!(c.phase(), Phase::Locked { error: true });
        assert!(c.list().markers_of(&id("B")).unwrap().contains(Markers::ERROR));
        assert!(!c.list().markers_of(&id("B")).unwrap().contains(Markers::DRAGGING));
    }

    #[test]
    fn cancellation_at_start_is_noop_unwind() {
        let mut c = controller(&["a", "b"]);
        down(&mut c, "a");
        c.on_pointer_cancel();
        assert_eq!(c.phase(), Phase::Idle);
        assert!(down(&mut c, "b").effects().is_empty());
        assert_eq!(c.phase(), Phase::Dragging);
    }

    #[test]
    fn failure_response_holds_lock() {
        let mut c = controller(&["a", "b", "c"]);
        down(&mut c, "b");
        over(&mut c, "a");
        let t = c.on_pointer_up();
        assert_eq!(t.commit_request().unwrap().delta, -1);

        let t = c.on_commit_outcome(CommitResponse::new(500, "server error").into());
        assert_eq!(c.phase(), Phase::Locked { error: true });
        assert!(c.list().markers_of(&id("b")).unwrap().contains(Markers::ERROR));
        assert!(t.notices().all(Notice::is_error));

        // No new session opens anywhere in the list.
        down(&mut c, "c");
        assert!(c.session().is_none());
        assert!(c.is_locked());
        assert!(c.list().markers_of(&id("c")).unwrap().contains(Markers::ERROR));
    }

    #[test]
    fn transport_failure_is_rejection() {
        let mut c = controller(&["a", "b"]);
        down(&mut c, "a");
        over(&mut c, "b");
        c.on_pointer_up();
        let t = c.on_commit_outcome(CommitOutcome::TransportFailed("timeout".into()));
        assert_eq!(
            t.notices().cloned().collect::<Vec<_>>(),
            vec![Notice::TransportFailed {
                item: id("a"),
                reason: "timeout".into()
            }]
        );
        assert_eq!(c.phase(), Phase::Locked { error: true });
    }

    #[test]
    fn down_while_commit_in_flight() {
        let mut c = controller(&["a", "b", "c"]);
        down(&mut c, "a");
        over(&mut c, "b");
        c.on_pointer_up();

        // Same item: catching up on the registered drag.
        assert!(down(&mut c, "a").is_noop());
        assert_eq!(c.phase(), Phase::Locked { error: false });

        // Different item: refused and marked.
        let t = down(&mut c, "c");
        assert_eq!(
            t.notices().cloned().collect::<Vec<_>>(),
            vec![Notice::LockedOut { item: id("c") }]
        );
        assert_eq!(c.phase(), Phase::Locked { error: true });
        assert!(c.commit_pending());

        // Success releases the lock; the refused row keeps its marker.
        c.on_commit_outcome(CommitResponse::ok("moved").into());
        assert_eq!(c.phase(), Phase::Idle);
        assert!(!c.commit_pending());
        assert_eq!(c.list().ids_marked(Markers::ERROR), vec![id("c")]);

        c.reset();
        assert!(c.list().ids_marked(Markers::ERROR).is_empty());
    }

    #[test]
    fn down_on_other_row_mid_drag_means_lost_release() {
        let mut c = controller(&["a", "b", "c"]);
        down(&mut c, "a");
        assert!(down(&mut c, "a").is_noop());
        let t = down(&mut c, "c");
        assert_eq!(
            t.notices().cloned().collect::<Vec<_>>(),
            vec![Notice::LostRelease {
                item: id("a"),
                interrupted_by: id("c")
            }]
        );
        assert_eq!(c.phase(), Phase::Locked { error: true });
        assert_eq!(
            c.list().markers_of(&id("a")).unwrap() & !Markers::PARITY,
            Markers::ERROR
        );
    }

    #[test]
    fn non_adjacent_move_is_ignored() {
        let mut c = controller(&["a", "b", "c", "d"]);
        down(&mut c, "a");
        assert!(over(&mut c, "c").is_noop());
        assert_eq!(order(&c), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn release_and_stray_outcomes_when_idle_are_noops() {
        let mut c = controller(&["a"]);
        assert!(c.on_pointer_up().is_noop());
        assert!(c.on_pointer_cancel().is_noop());
        assert!(c.on_commit_outcome(CommitResponse::ok("").into()).is_noop());
        assert_eq!(c.phase(), Phase::Idle);
    }

    #[test]
    fn stray_outcome_while_error_locked_keeps_state() {
        let mut c = controller(&["a", "b"]);
        down(&mut c, "a");
        over(&mut c, "b");
        c.on_pointer_cancel();
        let before = c.state().clone();
        assert!(c.on_commit_outcome(CommitResponse::ok("").into()).is_noop());
        assert_eq!(c.state(), &before);
    }

    #[test]
    fn reset_keeps_pending_commit_locked() {
        let mut c = controller(&["a", "b", "c"]);
        down(&mut c, "a");
        over(&mut c, "b");
        c.on_pointer_up();
        down(&mut c, "c");
        c.reset();
        assert_eq!(c.phase(), Phase::Locked { error: false });
        assert!(c.commit_pending());
        assert!(c.list().ids_marked(Markers::ERROR).is_empty());
        assert!(c.list().markers_of(&id("a")).unwrap().contains(Markers::DRAGGING));
        c.on_commit_outcome(CommitResponse::ok("").into());
        assert_eq!(c.phase(), Phase::Idle);
    }

    #[test]
    fn reset_with_order_adopts_authority() {
        let mut c = controller(&["a", "b", "c"]);
        down(&mut c, "a");
        over(&mut c, "b");
        c.on_pointer_cancel();
        assert!(c.is_locked());
        c.reset_with_order(&[id("a"), id("b"), id("c")]).unwrap();
        assert_eq!(order(&c), vec!["a", "b", "c"]);
        assert_eq!(c.phase(), Phase::Idle);

        let err = c.reset_with_order(&[id("a")]).unwrap_err();
        assert_eq!(err, OrderError::NotAPermutation { expected: 3, got: 1 });
    }

    #[test]
    fn reset_with_order_while_pending_reports_deferral() {
        let mut c = controller(&["a", "b", "c"]);
        down(&mut c, "a");
        over(&mut c, "b");
        c.on_pointer_up();
        assert!(c.commit_pending());

        let t = c
            .reset_with_order(&[id("c"), id("b"), id("a")])
            .unwrap();
        let notices: Vec<_> = t.notices().cloned().collect();
        assert_eq!(
            notices,
            vec![Notice::ResyncDeferred { item: id("a") }, Notice::Reset]
        );
        assert_eq!(order(&c), vec!["b", "a", "c"]);
        assert!(c.commit_pending());

        c.on_commit_outcome(CommitResponse::ok("").into());
        let settled = c.reset_with_order(&[id("c"), id("b"), id("a")]).unwrap();
        assert_eq!(settled.notices().cloned().collect::<Vec<_>>(), vec![Notice::Reset]);
        assert_eq!(order(&c), vec!["c", "b", "a"]);
    }
}
