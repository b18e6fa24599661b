// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reroutes: user-placed waypoints that links pass through.
//!
//! Reroutes form chains through their `parent_id`, pointing toward the output
//! end. Every link passing through a reroute also passes through all of its
//! ancestors, so a reroute's link sets are a superset of its children's.

use crate::link::LinkId;
use crate::slot::SlotDirection;
use crate::Point;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a reroute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RerouteId(pub u32);

impl fmt::Display for RerouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reroute {}", self.0)
    }
}

/// A waypoint on one or more links
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reroute {
    /// Reroute ID
    pub id: RerouteId,
    /// Canvas position
    pub pos: Point,
    /// Next reroute toward the output end
    pub parent_id: Option<RerouteId>,
    /// Resolved links passing through
    pub link_ids: IndexSet<LinkId>,
    /// Floating links passing through
    #[serde(default)]
    pub floating_link_ids: IndexSet<LinkId>,
    /// Set when the reroute belongs to a floating chain: the side that is
    /// still attached to a slot
    #[serde(default)]
    pub floating: Option<SlotDirection>,
    /// Hidden while a drag gesture renders a replacement
    #[serde(skip)]
    pub dragging: bool,
}

impl Reroute {
    /// Create a new reroute
    pub fn new(id: RerouteId, pos: Point, parent_id: Option<RerouteId>) -> Self {
        Self {
            id,
            pos,
            parent_id,
            link_ids: IndexSet::new(),
            floating_link_ids: IndexSet::new(),
            floating: None,
            dragging: false,
        }
    }

    /// Resolved plus floating links passing through
    pub fn total_links(&self) -> usize {
        self.link_ids.len() + self.floating_link_ids.len()
    }

    /// First resolved link, in insertion order
    pub fn first_link_id(&self) -> Option<LinkId> {
        self.link_ids.first().copied()
    }

    /// First floating link, in insertion order
    pub fn first_floating_link_id(&self) -> Option<LinkId> {
        self.floating_link_ids.first().copied()
    }
}
