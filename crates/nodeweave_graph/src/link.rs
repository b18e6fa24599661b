// SPDX-License-Identifier: MIT OR Apache-2.0
//! Link (edge) definitions for the network.

use crate::node::NodeId;
use crate::reroute::RerouteId;
use crate::slot::{SlotDirection, SlotType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a link.
///
/// Resolved and floating links are numbered from separate counters, so an id
/// is only meaningful together with the collection it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkId(pub u32);

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owner of a slot a link can attach to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeRef {
    /// A regular node
    Node(NodeId),
    /// The subgraph input boundary node (acts as a source)
    SubgraphInput,
    /// The subgraph output boundary node (acts as a target)
    SubgraphOutput,
}

impl NodeRef {
    /// The regular node id, if this is one
    pub fn node_id(self) -> Option<NodeId> {
        match self {
            Self::Node(id) => Some(id),
            Self::SubgraphInput | Self::SubgraphOutput => None,
        }
    }

    /// Whether this refers to a subgraph boundary node
    pub fn is_io_node(self) -> bool {
        !matches!(self, Self::Node(_))
    }
}

impl From<NodeId> for NodeRef {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

/// One end of a link: a node (or boundary node) and a slot index on it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotAddress {
    /// Slot owner
    pub node: NodeRef,
    /// Slot index on the owner
    pub slot: usize,
}

impl SlotAddress {
    /// Address of a slot on a regular node
    pub fn node(node: NodeId, slot: usize) -> Self {
        Self { node: NodeRef::Node(node), slot }
    }

    /// Address of a subgraph input port
    pub fn subgraph_input(port: usize) -> Self {
        Self { node: NodeRef::SubgraphInput, slot: port }
    }

    /// Address of a subgraph output port
    pub fn subgraph_output(port: usize) -> Self {
        Self { node: NodeRef::SubgraphOutput, slot: port }
    }
}

/// A stretch of a link path that a new reroute can be inserted on.
///
/// Each variant names the segment ending at the input side of the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkSegment {
    /// Segment between a resolved link's nearest reroute (or origin) and its target
    Link(LinkId),
    /// Same for a floating link
    FloatingLink(LinkId),
    /// Segment between a reroute and its parent (or origin)
    Reroute(RerouteId),
}

/// A directed link from an output to an input.
///
/// A resolved link has both ends set. A floating link is missing exactly one
/// end and hangs off a reroute chain instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Link ID
    pub id: LinkId,
    /// Data type carried
    pub slot_type: SlotType,
    /// Output end
    pub origin: Option<SlotAddress>,
    /// Input end
    pub target: Option<SlotAddress>,
    /// Reroute nearest the input end
    pub parent_id: Option<RerouteId>,
    /// Set while the link is being moved by a drag gesture
    #[serde(skip)]
    pub dragging: bool,
}

impl Link {
    /// Create a new link
    pub fn new(
        id: LinkId,
        slot_type: SlotType,
        origin: Option<SlotAddress>,
        target: Option<SlotAddress>,
        parent_id: Option<RerouteId>,
    ) -> Self {
        Self {
            id,
            slot_type,
            origin,
            target,
            parent_id,
            dragging: false,
        }
    }

    /// Whether the output end is missing
    pub fn is_floating_output(&self) -> bool {
        self.origin.is_none()
    }

    /// Whether the input end is missing
    pub fn is_floating_input(&self) -> bool {
        self.target.is_none()
    }

    /// Whether either end is missing
    pub fn is_floating(&self) -> bool {
        self.origin.is_none() || self.target.is_none()
    }

    /// The end that is still attached to a slot, for a floating link
    pub fn attached_side(&self) -> Option<SlotDirection> {
        match (self.origin, self.target) {
            (Some(_), None) => Some(SlotDirection::Output),
            (None, Some(_)) => Some(SlotDirection::Input),
            _ => None,
        }
    }

    /// Check if the link starts at `node` slot `slot`
    pub fn has_origin(&self, node: NodeRef, slot: usize) -> bool {
        self.origin == Some(SlotAddress { node, slot })
    }

    /// Check if the link ends at `node` slot `slot`
    pub fn has_target(&self, node: NodeRef, slot: usize) -> bool {
        self.target == Some(SlotAddress { node, slot })
    }

    /// Regular node at the output end
    pub fn origin_node(&self) -> Option<NodeId> {
        self.origin.and_then(|a| a.node.node_id())
    }

    /// Regular node at the input end
    pub fn target_node(&self) -> Option<NodeId> {
        self.target.and_then(|a| a.node.node_id())
    }

    /// Check if this link involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.origin_node() == Some(node_id) || self.target_node() == Some(node_id)
    }

    /// Floating copy of this link that keeps only `keep`'s end
    pub fn to_floating(&self, keep: SlotDirection, parent_id: Option<RerouteId>) -> Self {
        let mut floating = self.clone();
        floating.parent_id = parent_id;
        floating.dragging = false;
        match keep {
            SlotDirection::Output => floating.target = None,
            SlotDirection::Input => floating.origin = None,
        }
        floating
    }
}
