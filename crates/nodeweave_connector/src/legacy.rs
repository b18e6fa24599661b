// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flat description of dragged links for older consumers.

use nodeweave_graph::{NodeRef, Point, RerouteId, SlotDirection, SlotType};
use serde::Serialize;

/// One dragged link, described by its fixed end
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectingLink {
    /// Owner of the fixed end
    pub node: NodeRef,
    /// Slot index of the fixed end
    pub slot: usize,
    /// Direction of the fixed end
    pub direction: SlotDirection,
    /// Type at the fixed end
    pub slot_type: SlotType,
    /// Where the loose end is drawn from
    pub pos: Point,
    /// Reroute the link leaves from, if any
    pub after_reroute_id: Option<RerouteId>,
}

/// Receives the legacy list each time a gesture starts or resets
pub type LegacySink = Box<dyn FnMut(Vec<ConnectingLink>)>;
