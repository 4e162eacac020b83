#![forbid(unsafe_code)]

//! Gesture replay harness.
//!
//! A [`Script`] lists the rows, optional configuration and a sequence of
//! [`Step`]s. [`replay`] runs it through a live [`ReorderSession`] backed by
//! a [`MemoryAuthority`] and returns a [`Report`] describing where the
//! displayed list, the lock and the authority ended up.
//!
//! # Script format
//!
//! ```json
//! {
//!   "items": ["home", "news", "events"],
//!   "steps": [
//!     {"fail_next": 500},
//!     {"down": "home"}, {"move": "news"}, {"up": null},
//!     {"reset": null}
//!   ]
//! }
//! ```
//!
//! Any commit a step dispatches is awaited before the next step runs, so a
//! replay is deterministic.

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reorder_core::{ItemId, PointerEvent, PointerEventKind};
use reorder_runtime::{MemoryAuthority, RecordingSink, ReorderConfig, ReorderSession, RuntimeError};
use reorder_widgets::projection::RowView;
use reorder_widgets::recovery::Notice;
use reorder_widgets::{CommitRequest, ListContainer, Markers, OrderError, Phase};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Filter directives for the harness log, in `EnvFilter` syntax.
pub const ENV_LOG: &str = "REORDER_LOG";
/// Set to `1` for JSON log lines.
pub const ENV_LOG_JSON: &str = "REORDER_LOG_JSON";

/// Upper bound on waiting for a commit when no timeout is configured.
const SETTLE_LIMIT: Duration = Duration::from_secs(10);

/// Errors raised while loading or replaying a script.
#[derive(Debug)]
pub enum HarnessError {
    Io(std::io::Error),
    /// The script or report is not valid JSON.
    Json(String),
    Runtime(RuntimeError),
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Json(msg) => write!(f, "invalid script: {msg}"),
            Self::Runtime(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(_) => None,
            Self::Runtime(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for HarnessError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for HarnessError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}

impl From<RuntimeError> for HarnessError {
    fn from(e: RuntimeError) -> Self {
        Self::Runtime(e)
    }
}

impl From<OrderError> for HarnessError {
    fn from(e: OrderError) -> Self {
        Self::Runtime(RuntimeError::Order(e))
    }
}

/// A replayable gesture script.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Script {
    /// Rows in their initial display order.
    pub items: Vec<String>,
    /// Initial authority order. Defaults to `items`.
    #[serde(default)]
    pub authority: Option<Vec<String>>,
    #[serde(default)]
    pub config: ReorderConfig,
    pub steps: Vec<Step>,
}

/// One scripted input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Press on the handle of a row, by item id.
    Down(String),
    /// Press on a handle, by its element id (prefix included).
    Handle(String),
    /// Move over the body of a row.
    Move(String),
    Up,
    /// Pointer leaves the list.
    Leave,
    /// Operator reset.
    Reset,
    /// Operator reset adopting the authority's current order.
    Resync,
    /// The next commit is answered with this status and not applied.
    FailNext(u16),
    /// The next commit fails at the transport level.
    DropNext(String),
}

/// Where a replay ended up.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub displayed: Vec<ItemId>,
    pub authority: Vec<ItemId>,
    /// Displayed order equals the authority's.
    pub in_sync: bool,
    pub locked: bool,
    pub error: bool,
    pub error_items: Vec<ItemId>,
    pub rows: Vec<RowView>,
    pub requests: Vec<CommitRequest>,
    pub notices: Vec<Notice>,
}

/// Install the global log subscriber. Later calls are ignored.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var(ENV_LOG_JSON).is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// Read a script from `path`, or from stdin when `path` is `None`.
pub fn read_script(path: Option<&Path>) -> Result<Script, HarnessError> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    parse_script(&text)
}

pub fn parse_script(text: &str) -> Result<Script, HarnessError> {
    Ok(serde_json::from_str(text)?)
}

/// Run `script` against a fresh session and authority.
pub fn replay(script: &Script) -> Result<Report, HarnessError> {
    let initial = script.authority.as_ref().unwrap_or(&script.items);
    let authority = Arc::new(MemoryAuthority::new(initial.iter().cloned()));
    let sink = Arc::new(RecordingSink::new());
    let list = ListContainer::new(script.items.iter().cloned())?;
    let mut session = ReorderSession::new(
        list,
        authority.clone(),
        sink.clone(),
        script.config.clone(),
    )?;
    let settle = script.config.commit_timeout().map_or(SETTLE_LIMIT, |t| t + SETTLE_LIMIT);

    for (index, step) in script.steps.iter().enumerate() {
        debug!(index, ?step, "replaying step");
        run_step(&mut session, &authority, step)?;
        if session.controller().commit_pending() {
            session.wait_for_commit(settle);
        }
    }

    let displayed = session.list().ids();
    let authority_order = authority.order();
    let error = matches!(session.phase(), Phase::Locked { error: true });
    let report = Report {
        in_sync: displayed == authority_order,
        displayed,
        authority: authority_order,
        locked: session.controller().is_locked(),
        error,
        error_items: session.list().ids_marked(Markers::ERROR),
        rows: session.rows(),
        requests: authority.requests(),
        notices: sink.notices(),
    };
    info!(
        steps = script.steps.len(),
        in_sync = report.in_sync,
        locked = report.locked,
        "replay finished"
    );
    Ok(report)
}

fn run_step(
    session: &mut ReorderSession,
    authority: &MemoryAuthority,
    step: &Step,
) -> Result<(), HarnessError> {
    match step {
        Step::Down(id) => {
            session.handle(&PointerEvent::down(id.as_str()))?;
        }
        Step::Handle(raw) => {
            let target = session.target_from_handle_id(raw)?;
            session.handle(&PointerEvent::new(PointerEventKind::Down, target))?;
        }
        Step::Move(id) => {
            session.handle(&PointerEvent::move_over(id.as_str()))?;
        }
        Step::Up => {
            session.handle(&PointerEvent::up())?;
        }
        Step::Leave => {
            session.handle(&PointerEvent::leave())?;
        }
        Step::Reset => {
            session.reset();
        }
        Step::Resync => {
            session.reset_with_order(&authority.order())?;
        }
        Step::FailNext(status) => authority.fail_next(*status, "scripted failure"),
        Step::DropNext(reason) => authority.drop_next(reason.clone()),
    }
    Ok(())
}
