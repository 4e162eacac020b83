#![forbid(unsafe_code)]

//! Session driver: a [`DragController`] wired to a live commit worker.
//!
//! The session performs every [`Effect`] a transition returns. Commits go
//! to the [`CommitDispatcher`]; notices go to the [`NoticeSink`]. Hosts call
//! [`ReorderSession::poll`] from their event loop (or
//! [`ReorderSession::wait_for_commit`] when they can block) to feed
//! finished commits back into the controller.
//!
//! # Commit timeout
//!
//! With [`ReorderConfig::commit_timeout`] set, a commit that has not
//! finished in time is reported to the controller as a transport failure.
//! The worker is not interrupted; its late completion is discarded when it
//! eventually arrives. Without a timeout the lock is held until the service
//! answers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reorder_core::{ItemId, PointerEvent, PointerTarget};
use reorder_widgets::projection::{self, RowView};
use reorder_widgets::{CommitOutcome, DragController, Effect, ListContainer, Phase, Transition};
use tracing::{debug, warn};

use crate::config::ReorderConfig;
use crate::dispatcher::{CommitCompletion, CommitDispatcher};
use crate::error::{Result, RuntimeError};
use crate::service::{NoticeSink, PositionCommitService};

/// Reason reported when a commit exceeds the configured timeout.
pub const TIMEOUT_REASON: &str = "commit timed out";

/// A controller, its commit worker and its notice sink.
pub struct ReorderSession {
    controller: DragController,
    dispatcher: CommitDispatcher,
    sink: Arc<dyn NoticeSink>,
    config: ReorderConfig,
    /// When the outstanding commit was handed to the worker.
    dispatched_at: Option<Instant>,
    /// Completions still owed by the worker for commits already timed out.
    stale: usize,
}

impl std::fmt::Debug for ReorderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReorderSession")
            .field("phase", &self.controller.phase())
            .field("dispatcher", &self.dispatcher)
            .field("config", &self.config)
            .field("stale", &self.stale)
            .finish()
    }
}

impl ReorderSession {
    /// Start a session over `list`, spawning the commit worker.
    pub fn new(
        list: ListContainer,
        service: Arc<dyn PositionCommitService>,
        sink: Arc<dyn NoticeSink>,
        config: ReorderConfig,
    ) -> Result<Self> {
        let dispatcher =
            CommitDispatcher::start(service, &config.worker_name).map_err(RuntimeError::Spawn)?;
        Ok(Self {
            controller: DragController::new(list),
            dispatcher,
            sink,
            config,
            dispatched_at: None,
            stale: 0,
        })
    }

    /// Feed one pointer event and perform its effects.
    ///
    /// A commit that cannot reach the worker is reported to the controller
    /// as a transport failure before the error is returned.
    pub fn handle(&mut self, event: &PointerEvent) -> Result<Transition> {
        let transition = self.controller.ingest(event);
        self.perform(&transition)?;
        Ok(transition)
    }

    /// Resolve a handle element id into a pointer target.
    pub fn target_from_handle_id(&self, raw: &str) -> Result<PointerTarget> {
        Ok(PointerTarget::Handle(self.config.handle_prefix.strip(raw)?))
    }

    /// Apply a finished commit, if one is ready, and enforce the timeout.
    pub fn poll(&mut self) -> Option<Transition> {
        while let Some(completion) = self.dispatcher.try_recv() {
            if let Some(transition) = self.complete(completion) {
                return Some(transition);
            }
        }
        self.check_timeout()
    }

    /// Block until the outstanding commit finishes, the configured timeout
    /// fires, or `limit` elapses. Returns `None` when nothing was pending or
    /// `limit` ran out first.
    pub fn wait_for_commit(&mut self, limit: Duration) -> Option<Transition> {
        let deadline = Instant::now() + limit;
        while self.controller.commit_pending() {
            let now = Instant::now();
            let mut until = deadline;
            if let Some(expiry) = self.commit_deadline() {
                until = until.min(expiry);
            }
            match self.dispatcher.recv_timeout(until.saturating_duration_since(now)) {
                Some(completion) => {
                    if let Some(transition) = self.complete(completion) {
                        return Some(transition);
                    }
                }
                None => {
                    if let Some(transition) = self.check_timeout() {
                        return Some(transition);
                    }
                    if Instant::now() >= deadline {
                        return None;
                    }
                }
            }
        }
        None
    }

    /// Operator acknowledgement: clear errors and unlock.
    pub fn reset(&mut self) -> Transition {
        let transition = self.controller.reset();
        self.notify(&transition);
        transition
    }

    /// Reset and adopt the authority's order.
    pub fn reset_with_order(&mut self, order: &[ItemId]) -> Result<Transition> {
        let transition = self.controller.reset_with_order(order)?;
        self.notify(&transition);
        Ok(transition)
    }

    /// Row projection for renderers.
    #[must_use]
    pub fn rows(&self) -> Vec<RowView> {
        projection::project(self.controller.list())
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    #[must_use]
    pub fn controller(&self) -> &DragController {
        &self.controller
    }

    #[must_use]
    pub fn list(&self) -> &ListContainer {
        self.controller.list()
    }

    #[must_use]
    pub fn config(&self) -> &ReorderConfig {
        &self.config
    }

    /// Commits handed to the worker whose completion has not been read,
    /// including timed-out ones.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.dispatcher.in_flight()
    }

    fn perform(&mut self, transition: &Transition) -> Result<()> {
        let mut failed = None;
        for effect in transition.effects() {
            match effect {
                Effect::DispatchCommit(request) => {
                    match self.dispatcher.dispatch(request.clone()) {
                        Ok(()) => self.dispatched_at = Some(Instant::now()),
                        Err(err) => failed = Some(err),
                    }
                }
                Effect::Notify(notice) => self.sink.notice(notice),
            }
        }
        if let Some(err) = failed {
            warn!(error = %err, "commit could not be dispatched");
            let outcome = CommitOutcome::TransportFailed(err.to_string());
            let recovered = self.controller.on_commit_outcome(outcome);
            self.notify(&recovered);
            return Err(err.into());
        }
        Ok(())
    }

    fn notify(&self, transition: &Transition) {
        for notice in transition.notices() {
            self.sink.notice(notice);
        }
    }

    fn complete(&mut self, completion: CommitCompletion) -> Option<Transition> {
        if self.stale > 0 {
            self.stale -= 1;
            debug!(
                item = %completion.request.item_id,
                elapsed_ms = completion.elapsed.as_millis() as u64,
                "discarding late commit completion"
            );
            return None;
        }
        self.dispatched_at = None;
        let transition = self.controller.on_commit_outcome(completion.outcome);
        self.notify(&transition);
        Some(transition)
    }

    fn commit_deadline(&self) -> Option<Instant> {
        let timeout = self.config.commit_timeout()?;
        Some(self.dispatched_at? + timeout)
    }

    fn check_timeout(&mut self) -> Option<Transition> {
        let deadline = self.commit_deadline()?;
        if !self.controller.commit_pending() || Instant::now() < deadline {
            return None;
        }
        warn!(
            timeout_ms = ?self.config.commit_timeout_ms,
            "position commit timed out"
        );
        self.stale += 1;
        self.dispatched_at = None;
        let outcome = CommitOutcome::TransportFailed(TIMEOUT_REASON.to_string());
        let transition = self.controller.on_commit_outcome(outcome);
        self.notify(&transition);
        Some(transition)
    }
}
