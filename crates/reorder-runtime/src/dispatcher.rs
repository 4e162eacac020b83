#![forbid(unsafe_code)]

//! Background commit dispatcher.
//!
//! Commits run on one dedicated worker thread so the event thread never
//! blocks on the authority. Requests are served in submission order and
//! each produces exactly one [`CommitCompletion`]; service errors become
//! [`CommitOutcome::TransportFailed`]. There is no retry.

use std::fmt;
use std::io;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use reorder_widgets::{CommitOutcome, CommitRequest};
use tracing::{debug, debug_span, warn};

use crate::service::PositionCommitService;

/// A finished commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitCompletion {
    pub request: CommitRequest,
    pub outcome: CommitOutcome,
    pub elapsed: Duration,
}

/// The worker thread is gone and can no longer accept commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchError {
    pub request: CommitRequest,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "commit worker stopped; request for {} was not sent",
            self.request.item_id
        )
    }
}

impl std::error::Error for DispatchError {}

/// Runs position commits on a worker thread.
pub struct CommitDispatcher {
    sender: Option<mpsc::Sender<CommitRequest>>,
    results: mpsc::Receiver<CommitCompletion>,
    handle: Option<JoinHandle<()>>,
    in_flight: usize,
}

impl fmt::Debug for CommitDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitDispatcher")
            .field("in_flight", &self.in_flight)
            .field("running", &self.handle.is_some())
            .finish()
    }
}

impl CommitDispatcher {
    /// Spawn the worker thread.
    pub fn start(service: Arc<dyn PositionCommitService>, worker_name: &str) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel::<CommitRequest>();
        let (result_tx, result_rx) = mpsc::channel::<CommitCompletion>();
        let handle = thread::Builder::new()
            .name(worker_name.to_string())
            .spawn(move || dispatch_loop(service, rx, result_tx))?;

        Ok(Self {
            sender: Some(tx),
            results: result_rx,
            handle: Some(handle),
            in_flight: 0,
        })
    }

    /// Queue one commit.
    pub fn dispatch(&mut self, request: CommitRequest) -> Result<(), DispatchError> {
        let Some(sender) = &self.sender else {
            return Err(DispatchError { request });
        };
        sender
            .send(request)
            .map_err(|mpsc::SendError(request)| DispatchError { request })?;
        self.in_flight += 1;
        Ok(())
    }

    /// Number of commits sent but not yet received back.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Take a finished commit without blocking.
    pub fn try_recv(&mut self) -> Option<CommitCompletion> {
        let completion = self.results.try_recv().ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(completion)
    }

    /// Wait up to `timeout` for a finished commit.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<CommitCompletion> {
        let completion = self.results.recv_timeout(timeout).ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(completion)
    }

    fn shutdown(&mut self) {
        // Closing the channel ends the worker loop.
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if self.in_flight == 0 || handle.is_finished() {
                if let Err(panic) = handle.join() {
                    warn!(panic = %panic_message(panic.as_ref()), "commit worker panicked");
                }
            } else {
                // A hung commit would block the join forever; let the worker
                // finish on its own.
                debug!(in_flight = self.in_flight, "detaching commit worker");
            }
        }
    }
}

impl Drop for CommitDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

fn dispatch_loop(
    service: Arc<dyn PositionCommitService>,
    rx: mpsc::Receiver<CommitRequest>,
    result_tx: mpsc::Sender<CommitCompletion>,
) {
    while let Ok(request) = rx.recv() {
        let span = debug_span!("commit", item = %request.item_id, delta = request.delta);
        let _guard = span.enter();
        let started = Instant::now();
        let outcome = match service.commit(&request) {
            Ok(response) => CommitOutcome::Response(response),
            Err(err) => CommitOutcome::TransportFailed(err.to_string()),
        };
        let elapsed = started.elapsed();
        debug!(elapsed_us = elapsed.as_micros() as u64, "commit finished");
        if result_tx
            .send(CommitCompletion {
                request,
                outcome,
                elapsed,
            })
            .is_err()
        {
            return;
        }
    }
}
