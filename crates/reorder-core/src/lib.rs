#![forbid(unsafe_code)]

//! Core: pointer events, item identifiers, and logging for list reordering.

pub mod event;
pub mod item;
pub mod logging;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, error, info, trace, warn};

pub use event::{PointerEvent, PointerEventKind, PointerTarget};
pub use item::{HandlePrefix, IdError, ItemId};
