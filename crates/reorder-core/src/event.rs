#![forbid(unsafe_code)]

//! Pointer events consumed by the reorder engine.
//!
//! The engine is platform-agnostic: hosts translate their native input
//! (DOM mouse events, terminal mouse reports) into [`PointerEvent`]s whose
//! target has already been resolved to a row. Hit-testing stays on the
//! host side; the engine only sees which row, if any, the pointer is over.
//!
//! # Design Notes
//!
//! - Leaving the interactive surface is a distinct [`PointerEventKind::Leave`],
//!   never folded into `Up`.
//! - Only pointer-downs on a row's handle may start a drag, so the target
//!   distinguishes handle hits from hits on the row body.

#[cfg(not(target_arch = "wasm32"))]
use crossterm::event as cte;

use crate::item::ItemId;

/// What the pointer was over when the event fired.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PointerTarget {
    /// The drag handle of a row.
    Handle(ItemId),
    /// The body of a row, outside its handle.
    Row(ItemId),
    /// Nothing that resolves to a row.
    Outside,
}

impl PointerTarget {
    /// The row this target resolves to, regardless of handle or body.
    #[must_use]
    pub fn row(&self) -> Option<&ItemId> {
        match self {
            Self::Handle(id) | Self::Row(id) => Some(id),
            Self::Outside => None,
        }
    }

    /// The row id when the target is a handle.
    #[must_use]
    pub fn handle(&self) -> Option<&ItemId> {
        match self {
            Self::Handle(id) => Some(id),
            _ => None,
        }
    }
}

/// The gesture phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerEventKind {
    /// Primary button pressed.
    Down,
    /// Pointer moved over a target.
    Move,
    /// Primary button released.
    Up,
    /// Pointer left the interactive surface.
    Leave,
}

/// A pointer event with its resolved target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerEvent {
    /// The gesture phase.
    pub kind: PointerEventKind,
    /// The resolved target.
    pub target: PointerTarget,
}

impl PointerEvent {
    /// Create a new pointer event.
    #[must_use]
    pub const fn new(kind: PointerEventKind, target: PointerTarget) -> Self {
        Self { kind, target }
    }

    /// Pointer-down on the handle of `item`.
    #[must_use]
    pub fn down(item: impl Into<ItemId>) -> Self {
        Self::new(PointerEventKind::Down, PointerTarget::Handle(item.into()))
    }

    /// Pointer moved over the row `item`.
    #[must_use]
    pub fn move_over(item: impl Into<ItemId>) -> Self {
        Self::new(PointerEventKind::Move, PointerTarget::Row(item.into()))
    }

    /// Pointer released.
    #[must_use]
    pub const fn up() -> Self {
        Self::new(PointerEventKind::Up, PointerTarget::Outside)
    }

    /// Pointer left the document.
    #[must_use]
    pub const fn leave() -> Self {
        Self::new(PointerEventKind::Leave, PointerTarget::Outside)
    }

    /// Convert a crossterm mouse event, resolving its cell through `hit`.
    ///
    /// Only the left button drives gestures; wheel and other buttons are
    /// ignored and yield `None`.
    #[cfg(not(target_arch = "wasm32"))]
    #[must_use]
    pub fn from_crossterm<F>(event: cte::MouseEvent, hit: F) -> Option<Self>
    where
        F: FnOnce(u16, u16) -> PointerTarget,
    {
        let kind = match event.kind {
            cte::MouseEventKind::Down(cte::MouseButton::Left) => PointerEventKind::Down,
            cte::MouseEventKind::Up(cte::MouseButton::Left) => PointerEventKind::Up,
            cte::MouseEventKind::Drag(cte::MouseButton::Left) | cte::MouseEventKind::Moved => {
                PointerEventKind::Move
            }
            _ => return None,
        };
        Some(Self::new(kind, hit(event.column, event.row)))
    }
}
