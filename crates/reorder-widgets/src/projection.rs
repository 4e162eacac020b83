#![forbid(unsafe_code)]

//! Read-only projection of the container for renderers.
//!
//! Renderers never mutate order; they redraw from [`project`] after each
//! transition and resolve pointer coordinates back to rows with
//! [`hit_test_row`].

use reorder_core::ItemId;
use serde::Serialize;

use crate::list_model::ListContainer;
use crate::markers::InteractionState;

/// What a renderer needs to draw one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowView {
    pub id: ItemId,
    pub label: String,
    pub position: usize,
    pub state: InteractionState,
    pub classes: Vec<&'static str>,
}

/// Project every row in display order.
#[must_use]
pub fn project(list: &ListContainer) -> Vec<RowView> {
    list.rows()
        .enumerate()
        .map(|(position, row)| RowView {
            id: row.id().clone(),
            label: row.label().to_string(),
            position,
            state: InteractionState::from(row.markers()),
            classes: row.markers().class_names(),
        })
        .collect()
}

/// Map a vertical coordinate to a row index.
///
/// `top` is the coordinate of the first row; rows are `row_height` tall.
/// Returns `None` above the list, below the last row, or when `row_height`
/// is zero.
#[must_use]
pub fn hit_test_row(y: u16, top: u16, row_height: u16, len: usize) -> Option<usize> {
    if row_height == 0 || y < top {
        return None;
    }
    let index = usize::from((y - top) / row_height);
    (index < len).then_some(index)
}
