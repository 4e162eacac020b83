#![forbid(unsafe_code)]

//! Row state markers.
//!
//! The engine never decides how a row looks. It toggles a fixed vocabulary
//! of markers that an external stylesheet or renderer maps to appearance.

use bitflags::bitflags;

bitflags! {
    /// Markers toggled on a row by the reorder engine.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Markers: u8 {
        /// The row is being dragged.
        const DRAGGING  = 0b0_0001;
        /// The row is part of the active drop-target group.
        const INDICATOR = 0b0_0010;
        /// The row is in an unacknowledged error state.
        const ERROR     = 0b0_0100;
        /// Alternating-row parity (odd stripe).
        const ODD       = 0b0_1000;
        /// Alternating-row parity (even stripe).
        const EVEN      = 0b1_0000;
    }
}

impl Markers {
    /// Both parity markers.
    pub const PARITY: Self = Self::ODD.union(Self::EVEN);
    /// Markers that only live for the duration of a drag.
    pub const TRANSIENT: Self = Self::DRAGGING.union(Self::INDICATOR);

    /// Class names for the set markers, in a stable order.
    #[must_use]
    pub fn class_names(self) -> Vec<&'static str> {
        let mut names = Vec::with_capacity(3);
        if self.contains(Self::DRAGGING) {
            names.push("dragging");
        }
        if self.contains(Self::INDICATOR) {
            names.push("dragindicator");
        }
        if self.contains(Self::ERROR) {
            names.push("error");
        }
        if self.contains(Self::ODD) {
            names.push("odd");
        }
        if self.contains(Self::EVEN) {
            names.push("even");
        }
        names
    }

    /// Parity marker for a 0-based index.
    ///
    /// Stripes are named 1-based, so index 0 is the `ODD` row.
    #[must_use]
    pub const fn parity_for(index: usize) -> Self {
        if index % 2 == 0 { Self::ODD } else { Self::EVEN }
    }
}

/// Interaction state of a row, derived from its markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionState {
    Normal,
    Dragging,
    Indicator,
    Error,
}

impl From<Markers> for InteractionState {
    fn from(markers: Markers) -> Self {
        if markers.contains(Markers::ERROR) {
            Self::Error
        } else if markers.contains(Markers::DRAGGING) {
            Self::Dragging
        } else if markers.contains(Markers::INDICATOR) {
            Self::Indicator
        } else {
            Self::Normal
        }
    }
}
