#![forbid(unsafe_code)]

//! Ordered row container with position queries and adjacent swaps.
//!
//! [`ListContainer`] is the single source of truth for display order. The
//! drag controller is its only writer while a drag is active; renderers
//! read it through [`crate::projection`].
//!
//! # Invariants
//!
//! 1. Ids are unique; `position_of` is exact for every member.
//! 2. The only reordering primitive during a drag is [`ListContainer::swap_adjacent`],
//!    so the displayed order is always reachable from the initial order by
//!    single transpositions.
//! 3. Parity markers always reflect the current order.

use std::collections::HashMap;
use std::fmt;

use reorder_core::ItemId;

use crate::markers::Markers;

/// One reorderable row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    id: ItemId,
    label: String,
    markers: Markers,
}

impl Row {
    /// Create a row whose label is its id.
    #[must_use]
    pub fn new(id: impl Into<ItemId>) -> Self {
        let id = id.into();
        let label = id.as_str().to_string();
        Self {
            id,
            label,
            markers: Markers::empty(),
        }
    }

    /// Set a display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn id(&self) -> &ItemId {
        &self.id
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn markers(&self) -> Markers {
        self.markers
    }
}

/// Errors raised when building or re-ordering a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// The same id appears twice.
    Duplicate(ItemId),
    /// An id is not a member of the container.
    Unknown(ItemId),
    /// The proposed order does not cover every member exactly once.
    NotAPermutation {
        /// Number of members in the container.
        expected: usize,
        /// Number of ids supplied.
        got: usize,
    },
}

impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate(id) => write!(f, "duplicate item id {id}"),
            Self::Unknown(id) => write!(f, "unknown item id {id}"),
            Self::NotAPermutation { expected, got } => {
                write!(f, "order lists {got} items, container holds {expected}")
            }
        }
    }
}

impl std::error::Error for OrderError {}

/// Result of a swap request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    /// The rows at `upper` and `upper + 1` were exchanged.
    Swapped {
        /// The lower of the two exchanged positions.
        upper: usize,
    },
    /// The rows are not neighbours; nothing moved.
    NotAdjacent,
    /// Both arguments name the same row.
    SameItem,
    /// One of the ids is not a member.
    Unknown,
}

impl SwapOutcome {
    #[must_use]
    pub fn is_swapped(self) -> bool {
        matches!(self, Self::Swapped { .. })
    }
}

/// The ordered collection of rows being reordered.
#[derive(Debug, Clone, Default)]
pub struct ListContainer {
    rows: Vec<Row>,
    index: HashMap<ItemId, usize>,
}

impl ListContainer {
    /// Build a container from ids, labelled by id.
    pub fn new<I, T>(ids: I) -> Result<Self, OrderError>
    where
        I: IntoIterator<Item = T>,
        T: Into<ItemId>,
    {
        Self::from_rows(ids.into_iter().map(Row::new))
    }

    /// Build a container from prepared rows.
    pub fn from_rows<I>(rows: I) -> Result<Self, OrderError>
    where
        I: IntoIterator<Item = Row>,
    {
        let rows: Vec<Row> = rows.into_iter().collect();
        let mut index = HashMap::with_capacity(rows.len());
        for (pos, row) in rows.iter().enumerate() {
            if index.insert(row.id.clone(), pos).is_some() {
                return Err(OrderError::Duplicate(row.id.clone()));
            }
        }
        let mut container = Self { rows, index };
        container.restripe();
        Ok(container)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &ItemId) -> bool {
        self.index.contains_key(id)
    }

    /// Rows in display order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &Row> {
        self.rows.iter()
    }

    /// Ids in display order.
    #[must_use]
    pub fn ids(&self) -> Vec<ItemId> {
        self.rows.iter().map(|r| r.id.clone()).collect()
    }

    /// 0-based position of `id`, or `None` if it is not a member.
    #[must_use]
    pub fn position_of(&self, id: &ItemId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Exchange two neighbouring rows.
    ///
    /// Rows more than one position apart are left alone: a fast pointer can
    /// skip rows between events, and only a single-step exchange per event
    /// is an unambiguous edit.
    pub fn swap_adjacent(&mut self, a: &ItemId, b: &ItemId) -> SwapOutcome {
        let (Some(pa), Some(pb)) = (self.position_of(a), self.position_of(b)) else {
            return SwapOutcome::Unknown;
        };
        if pa == pb {
            return SwapOutcome::SameItem;
        }
        if pa.abs_diff(pb) != 1 {
            reorder_core::trace!(a = %a, b = %b, pa, pb, "non-adjacent swap ignored");
            return SwapOutcome::NotAdjacent;
        }
        self.rows.swap(pa, pb);
        self.index.insert(a.clone(), pb);
        self.index.insert(b.clone(), pa);
        self.restripe();
        SwapOutcome::Swapped {
            upper: pa.min(pb),
        }
    }

    /// Reassign alternating-row parity across the whole set.
    pub fn restripe(&mut self) {
        for (pos, row) in self.rows.iter_mut().enumerate() {
            row.markers.remove(Markers::PARITY);
            row.markers.insert(Markers::parity_for(pos));
        }
    }

    /// Adopt an authoritative order, keeping each row's markers.
    pub fn apply_order(&mut self, order: &[ItemId]) -> Result<(), OrderError> {
        if order.len() != self.rows.len() {
            return Err(OrderError::NotAPermutation {
                expected: self.rows.len(),
                got: order.len(),
            });
        }
        let mut seen = vec![false; self.rows.len()];
        for id in order {
            let pos = *self
                .index
                .get(id)
                .ok_or_else(|| OrderError::Unknown(id.clone()))?;
            if std::mem::replace(&mut seen[pos], true) {
                return Err(OrderError::Duplicate(id.clone()));
            }
        }
        let mut taken: Vec<Option<Row>> = self.rows.drain(..).map(Some).collect();
        let next: Vec<Row> = order
            .iter()
            .filter_map(|id| taken[self.index[id]].take())
            .collect();
        self.rows = next;
        for (pos, row) in self.rows.iter().enumerate() {
            self.index.insert(row.id.clone(), pos);
        }
        self.restripe();
        Ok(())
    }

    /// Markers currently set on `id`.
    #[must_use]
    pub fn markers_of(&self, id: &ItemId) -> Option<Markers> {
        self.position_of(id).map(|pos| self.rows[pos].markers)
    }

    /// Set markers on one row. Returns `false` if `id` is not a member.
    pub fn mark(&mut self, id: &ItemId, markers: Markers) -> bool {
        match self.position_of(id) {
            Some(pos) => {
                self.rows[pos].markers.insert(markers);
                true
            }
            None => false,
        }
    }

    /// Clear markers on one row. Returns `false` if `id` is not a member.
    pub fn unmark(&mut self, id: &ItemId, markers: Markers) -> bool {
        match self.position_of(id) {
            Some(pos) => {
                self.rows[pos].markers.remove(markers);
                true
            }
            None => false,
        }
    }

    /// Set markers on every row.
    pub fn mark_all(&mut self, markers: Markers) {
        for row in &mut self.rows {
            row.markers.insert(markers);
        }
    }

    /// Clear markers on every row.
    pub fn clear_marker_everywhere(&mut self, markers: Markers) {
        for row in &mut self.rows {
            row.markers.remove(markers);
        }
    }

    /// Ids of rows carrying every bit of `markers`.
    #[must_use]
    pub fn ids_marked(&self, markers: Markers) -> Vec<ItemId> {
        self.rows
            .iter()
            .filter(|r| r.markers.contains(markers))
            .map(|r| r.id.clone())
            .collect()
    }
}
