//! Session end-to-end tests.
//!
//! Drives a [`ReorderSession`] with a live commit worker against a
//! [`MemoryAuthority`] and checks that the displayed order, the lock and the
//! authority agree after each gesture.
//!
//! ```sh
//! cargo test -p reorder-runtime --test session_e2e
//! ```

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use reorder_core::{ItemId, PointerEvent, PointerTarget};
use reorder_runtime::session::TIMEOUT_REASON;
use reorder_runtime::{
    MemoryAuthority, PositionCommitService, RecordingSink, ReorderConfig, ReorderSession,
    RuntimeError, ServiceError,
};
use reorder_widgets::recovery::Notice;
use reorder_widgets::{CommitRequest, CommitResponse, InteractionState, ListContainer, Markers, Phase};

const WAIT: Duration = Duration::from_secs(5);

// ============================================================================
// Test Utilities
// ============================================================================

fn ids(names: &[&str]) -> Vec<ItemId> {
    names.iter().copied().map(ItemId::from).collect()
}

struct Fixture {
    session: ReorderSession,
    authority: Arc<MemoryAuthority>,
    sink: Arc<RecordingSink>,
}

fn fixture(names: &[&str], config: ReorderConfig) -> Fixture {
    let authority = Arc::new(MemoryAuthority::new(names.iter().copied()));
    let sink = Arc::new(RecordingSink::new());
    let session = ReorderSession::new(
        ListContainer::new(names.iter().copied()).unwrap(),
        authority.clone(),
        sink.clone(),
        config,
    )
    .unwrap();
    Fixture {
        session,
        authority,
        sink,
    }
}

fn drag(session: &mut ReorderSession, item: &str, over: &[&str]) {
    session.handle(&PointerEvent::down(item)).unwrap();
    for name in over {
        session.handle(&PointerEvent::move_over(*name)).unwrap();
    }
    session.handle(&PointerEvent::up()).unwrap();
}

// ============================================================================
// Commit round trip
// ============================================================================

#[test]
fn accepted_commit_unlocks_and_matches_authority() {
    let mut fx = fixture(&["home", "news", "events", "about"], ReorderConfig::default());
    drag(&mut fx.session, "home", &["news", "events"]);
    assert_eq!(fx.session.phase(), Phase::Locked { error: false });
    assert_eq!(fx.session.list().ids(), ids(&["news", "events", "home", "about"]));

    let done = fx.session.wait_for_commit(WAIT).expect("commit finished");
    assert!(!done.is_noop());
    assert_eq!(fx.session.phase(), Phase::Idle);
    assert_eq!(fx.authority.order(), fx.session.list().ids());
    assert!(
        fx.session
            .rows()
            .iter()
            .all(|row| row.state == InteractionState::Normal)
    );

    let notices = fx.sink.notices();
    assert_eq!(notices.len(), 2);
    assert_eq!(
        notices[0],
        Notice::Dispatched {
            item: ItemId::from("home"),
            delta: 2
        }
    );
    assert!(matches!(&notices[1], Notice::Committed { delta: 2, message, .. } if message == "Item moved"));
}

#[test]
fn zero_delta_release_dispatches_nothing() {
    let mut fx = fixture(&["a", "b", "c"], ReorderConfig::default());
    drag(&mut fx.session, "b", &["c", "c"]);
    assert_eq!(fx.session.phase(), Phase::Idle);
    assert_eq!(fx.session.in_flight(), 0);
    assert!(fx.authority.requests().is_empty());
    assert!(fx.session.wait_for_commit(Duration::from_millis(10)).is_none());
    assert_eq!(fx.sink.notices(), vec![Notice::Cancelled { item: ItemId::from("b") }]);
}

#[test]
fn abandoned_drag_locks_without_commit() {
    let mut fx = fixture(&["a", "b", "c"], ReorderConfig::default());
    fx.session.handle(&PointerEvent::down("a")).unwrap();
    fx.session.handle(&PointerEvent::move_over("b")).unwrap();
    fx.session.handle(&PointerEvent::leave()).unwrap();

    assert_eq!(fx.session.phase(), Phase::Locked { error: true });
    assert_eq!(fx.session.list().ids_marked(Markers::ERROR), ids(&["a"]));
    assert!(fx.authority.requests().is_empty());
    assert!(fx.sink.notices().iter().any(Notice::is_error));
}

// ============================================================================
// Failure and recovery
// ============================================================================

#[test]
fn rejection_holds_lock_until_reset_with_authority_order() {
    let mut fx = fixture(&["a", "b", "c"], ReorderConfig::default());
    fx.authority.fail_next(500, "conflict");
    drag(&mut fx.session, "b", &["c"]);
    fx.session.wait_for_commit(WAIT).expect("commit finished");

    assert_eq!(fx.session.phase(), Phase::Locked { error: true });
    assert_eq!(fx.session.list().ids(), ids(&["a", "c", "b"]));
    assert_eq!(fx.authority.order(), ids(&["a", "b", "c"]));

    // Locked out: no new drag, the touched row is flagged.
    fx.session.handle(&PointerEvent::down("a")).unwrap();
    assert!(fx.session.controller().session().is_none());
    assert_eq!(fx.session.list().ids_marked(Markers::ERROR), ids(&["a", "b"]));

    let order = fx.authority.order();
    fx.session.reset_with_order(&order).unwrap();
    assert_eq!(fx.session.phase(), Phase::Idle);
    assert_eq!(fx.session.list().ids(), order);
    assert!(fx.session.list().ids_marked(Markers::ERROR).is_empty());
    assert_eq!(fx.sink.notices().last(), Some(&Notice::Reset));

    // Dragging works again after the reset.
    drag(&mut fx.session, "c", &["b"]);
    fx.session.wait_for_commit(WAIT).expect("commit finished");
    assert_eq!(fx.session.phase(), Phase::Idle);
    assert_eq!(fx.authority.order(), ids(&["a", "c", "b"]));
}

#[test]
fn transport_failure_is_reported_as_error() {
    let mut fx = fixture(&["a", "b"], ReorderConfig::default());
    fx.authority.drop_next("connection reset");
    drag(&mut fx.session, "a", &["b"]);
    fx.session.wait_for_commit(WAIT).expect("commit finished");

    assert_eq!(fx.session.phase(), Phase::Locked { error: true });
    assert!(fx.sink.notices().iter().any(|n| matches!(
        n,
        Notice::TransportFailed { reason, .. } if reason.contains("connection reset")
    )));
}

#[test]
fn bad_authority_order_is_rejected() {
    let mut fx = fixture(&["a", "b"], ReorderConfig::default());
    let err = fx.session.reset_with_order(&ids(&["a", "z"])).unwrap_err();
    assert!(matches!(err, RuntimeError::Order(_)));
    assert_eq!(fx.session.list().ids(), ids(&["a", "b"]));
}

// ============================================================================
// Commit timeout
// ============================================================================

#[test]
fn timeout_converts_hang_into_transport_failure() {
    let (release, gate) = mpsc::channel::<()>();
    let gate = Mutex::new(gate);
    let service = Arc::new(
        move |_: &CommitRequest| -> Result<CommitResponse, ServiceError> {
            let _ = gate.lock().unwrap().recv();
            Ok(CommitResponse::ok("late"))
        },
    );
    let sink = Arc::new(RecordingSink::new());
    let config = ReorderConfig::default().with_commit_timeout(Duration::from_millis(30));
    let mut session = ReorderSession::new(
        ListContainer::new(["a", "b"]).unwrap(),
        service as Arc<dyn PositionCommitService>,
        sink.clone(),
        config,
    )
    .unwrap();

    drag(&mut session, "a", &["b"]);
    let started = Instant::now();
    session.wait_for_commit(WAIT).expect("timeout fired");
    assert!(started.elapsed() < WAIT);
    assert_eq!(session.phase(), Phase::Locked { error: true });

    // Let the hung commit finish; its late success must not unlock.
    drop(release);
    let deadline = Instant::now() + WAIT;
    while session.in_flight() > 0 && Instant::now() < deadline {
        assert!(session.poll().is_none());
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(session.in_flight(), 0);
    assert_eq!(session.phase(), Phase::Locked { error: true });

    let failures: Vec<_> = sink
        .notices()
        .into_iter()
        .filter(|n| matches!(n, Notice::TransportFailed { .. }))
        .collect();
    assert_eq!(
        failures,
        vec![Notice::TransportFailed {
            item: ItemId::from("a"),
            reason: TIMEOUT_REASON.to_string(),
        }]
    );
}

#[test]
fn wait_without_pending_commit_returns_immediately() {
    let mut fx = fixture(&["a"], ReorderConfig::default());
    let started = Instant::now();
    assert!(fx.session.wait_for_commit(WAIT).is_none());
    assert!(started.elapsed() < WAIT);
    assert!(fx.session.poll().is_none());
}

// ============================================================================
// Handle ids
// ============================================================================

#[test]
fn handle_ids_resolve_through_configured_prefix() {
    let fx = fixture(&["home"], ReorderConfig::default());
    assert_eq!(
        fx.session
            .target_from_handle_id("folder-contents-item-home")
            .unwrap(),
        PointerTarget::Handle(ItemId::from("home"))
    );
    assert!(matches!(
        fx.session.target_from_handle_id("tab-home"),
        Err(RuntimeError::Id(_))
    ));

    let custom = fixture(&["home"], ReorderConfig::default().with_handle_prefix("row-"));
    assert_eq!(
        custom.session.target_from_handle_id("row-home").unwrap(),
        PointerTarget::Handle(ItemId::from("home"))
    );
}
