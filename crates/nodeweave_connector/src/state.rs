// SPDX-License-Identifier: MIT OR Apache-2.0
//! Drag state of the connector.

use nodeweave_graph::{Point, SlotDirection};
use serde::Serialize;

/// What the current gesture is doing.
///
/// `connecting_to` is the kind of slot the dragged links are looking for; it
/// is `None` whenever no gesture is in progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ConnectorState {
    /// Slot direction the dragged links will connect to
    pub connecting_to: Option<SlotDirection>,
    /// Several links are dragged together
    pub multi: bool,
    /// The links being dragged already exist in the network
    pub dragging_existing_links: bool,
    /// Pointer position the renderer snaps the loose ends to
    pub snap_links_pos: Option<Point>,
}

impl ConnectorState {
    /// Whether a gesture is in progress
    pub fn is_connecting(&self) -> bool {
        self.connecting_to.is_some()
    }

    pub(crate) fn begin(&mut self, connecting_to: SlotDirection, existing: bool, multi: bool) {
        self.connecting_to = Some(connecting_to);
        self.dragging_existing_links = existing;
        self.multi = multi;
    }
}
