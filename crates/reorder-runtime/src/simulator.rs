#![forbid(unsafe_code)]

//! Deterministic session simulator for testing.
//!
//! `SessionSimulator` drives a [`DragController`] without a worker thread.
//! Dispatched commits are queued and only reach the service when
//! [`flush`](SessionSimulator::flush) is called, so tests can assert on the
//! pre-response and post-response states separately.
//!
//! # Example
//!
//! ```ignore
//! use reorder_runtime::{MemoryAuthority, SessionSimulator};
//!
//! let mut sim = SessionSimulator::new(list, MemoryAuthority::new(["a", "b"]));
//! sim.inject(&[PointerEvent::down("a"), PointerEvent::move_over("b"), PointerEvent::up()]);
//! assert!(sim.controller().commit_pending());
//! sim.flush();
//! assert_eq!(sim.service().order(), ...);
//! ```

use std::collections::VecDeque;

use reorder_core::PointerEvent;
use reorder_widgets::recovery::Notice;
use reorder_widgets::{CommitOutcome, CommitRequest, DragController, Effect, ListContainer, Transition};

use crate::service::PositionCommitService;

/// Deterministic simulator over a [`PositionCommitService`].
#[derive(Debug)]
pub struct SessionSimulator<S: PositionCommitService> {
    controller: DragController,
    service: S,
    /// Commits dispatched but not yet flushed.
    queue: VecDeque<CommitRequest>,
    /// Every commit ever dispatched.
    dispatched: Vec<CommitRequest>,
    notices: Vec<Notice>,
}

impl<S: PositionCommitService> SessionSimulator<S> {
    pub fn new(list: ListContainer, service: S) -> Self {
        Self {
            controller: DragController::new(list),
            service,
            queue: VecDeque::new(),
            dispatched: Vec::new(),
            notices: Vec::new(),
        }
    }

    /// Feed one event.
    pub fn inject_event(&mut self, event: &PointerEvent) -> Transition {
        let transition = self.controller.ingest(event);
        self.record(&transition);
        transition
    }

    /// Feed several events in order.
    pub fn inject(&mut self, events: &[PointerEvent]) {
        for event in events {
            self.inject_event(event);
        }
    }

    /// Deliver every queued commit to the service, in order, and feed each
    /// outcome back. Returns how many commits were delivered.
    pub fn flush(&mut self) -> usize {
        let mut delivered = 0;
        while let Some(request) = self.queue.pop_front() {
            let outcome = match self.service.commit(&request) {
                Ok(response) => CommitOutcome::Response(response),
                Err(err) => CommitOutcome::TransportFailed(err.to_string()),
            };
            let transition = self.controller.on_commit_outcome(outcome);
            self.record(&transition);
            delivered += 1;
        }
        delivered
    }

    /// Feed an outcome directly, bypassing the service.
    ///
    /// The oldest queued commit is considered answered.
    pub fn respond(&mut self, outcome: CommitOutcome) -> Transition {
        self.queue.pop_front();
        let transition = self.controller.on_commit_outcome(outcome);
        self.record(&transition);
        transition
    }

    pub fn reset(&mut self) -> Transition {
        let transition = self.controller.reset();
        self.record(&transition);
        transition
    }

    #[must_use]
    pub fn controller(&self) -> &DragController {
        &self.controller
    }

    #[must_use]
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Commits waiting for [`flush`](Self::flush).
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn dispatched(&self) -> &[CommitRequest] {
        &self.dispatched
    }

    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn clear_notices(&mut self) {
        self.notices.clear();
    }

    fn record(&mut self, transition: &Transition) {
        for effect in transition.effects() {
            match effect {
                Effect::DispatchCommit(request) => {
                    self.queue.push_back(request.clone());
                    self.dispatched.push(request.clone());
                }
                Effect::Notify(notice) => self.notices.push(notice.clone()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::MemoryAuthority;
    use reorder_core::ItemId;
    use reorder_widgets::{CommitResponse, Markers, Phase};

    fn ids(names: &[&str]) -> Vec<ItemId> {
        names.iter().copied().map(ItemId::from).collect()
    }

    fn sim() -> SessionSimulator<MemoryAuthority> {
        let names = ["home", "news", "events"];
        SessionSimulator::new(
            ListContainer::new(names).unwrap(),
            MemoryAuthority::new(names),
        )
    }

    #[test]
    fn commit_waits_for_flush() {
        let mut sim = sim();
        sim.inject(&[
            PointerEvent::down("home"),
            PointerEvent::move_over("news"),
            PointerEvent::up(),
        ]);
        assert_eq!(sim.queued(), 1);
        assert_eq!(sim.controller().phase(), Phase::Locked { error: false });
        assert_eq!(sim.service().order(), ids(&["home", "news", "events"]));

        assert_eq!(sim.flush(), 1);
        assert_eq!(sim.controller().phase(), Phase::Idle);
        assert_eq!(sim.service().order(), ids(&["news", "home", "events"]));
        assert_eq!(sim.controller().list().ids(), sim.service().order());
        assert_eq!(sim.dispatched().len(), 1);
        assert!(matches!(sim.notices().last(), Some(Notice::Committed { delta: 1, .. })));
    }

    #[test]
    fn scripted_rejection_locks_with_error() {
        let mut sim = sim();
        sim.service().fail_next(409, "conflict");
        sim.inject(&[
            PointerEvent::down("events"),
            PointerEvent::move_over("news"),
            PointerEvent::up(),
        ]);
        sim.flush();
        assert_eq!(sim.controller().phase(), Phase::Locked { error: true });
        assert_eq!(sim.controller().list().ids_marked(Markers::ERROR), ids(&["events"]));
        assert_eq!(sim.service().order(), ids(&["home", "news", "events"]));

        sim.inject_event(&PointerEvent::down("home"));
        assert!(sim.controller().session().is_none());
        assert_eq!(sim.dispatched().len(), 1);
    }

    #[test]
    fn respond_bypasses_service() {
        let mut sim = sim();
        sim.inject(&[
            PointerEvent::down("home"),
            PointerEvent::move_over("news"),
            PointerEvent::up(),
        ]);
        sim.respond(CommitResponse::ok("done").into());
        assert_eq!(sim.queued(), 0);
        assert_eq!(sim.controller().phase(), Phase::Idle);
        assert!(sim.service().requests().is_empty());
    }
}
