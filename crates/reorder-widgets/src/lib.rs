#![forbid(unsafe_code)]

//! Drag-and-drop list reordering: list model, drag controller, commit
//! protocol types, and recovery policy.
//!
//! The crate is platform-agnostic. Hosts feed [`reorder_core::PointerEvent`]s
//! into a [`drag::DragController`], perform the [`drag::Effect`]s it returns,
//! and report commit outcomes back. Rendering is a pure projection of the
//! [`list_model::ListContainer`] (see [`projection`]).

pub mod commit;
pub mod drag;
pub mod list_model;
pub mod markers;
pub mod projection;
pub mod recovery;

pub use commit::{CommitOutcome, CommitRequest, CommitResponse};
pub use drag::{ControllerState, DragController, DragSession, Effect, Phase, Transition};
pub use list_model::{ListContainer, OrderError, Row, SwapOutcome};
pub use markers::{InteractionState, Markers};
pub use recovery::Notice;
