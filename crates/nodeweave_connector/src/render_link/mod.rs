// SPDX-License-Identifier: MIT OR Apache-2.0
//! Render links: the in-flight links of a drag gesture.
//!
//! Every variant has a fixed end (its [`LinkSource`]) and a loose end that
//! follows the pointer. A variant knows which drop targets are legal for its
//! loose end and how to commit a drop on each of them. Predicates never touch
//! the network; commits mutate it and publish their events on the bus they
//! are given.

mod floating;
mod io_node;
mod moving_input;
mod moving_output;
mod to_input;
mod to_output;

pub use floating::FloatingRenderLink;
pub use io_node::{ToInputFromIoNodeLink, ToOutputFromIoNodeLink};
pub use moving_input::MovingInputLink;
pub use moving_output::MovingOutputLink;
pub use to_input::ToInputRenderLink;
pub use to_output::ToOutputRenderLink;

use crate::error::Result;
use crate::events::{ConnectorEvent, EventBus};
use nodeweave_graph::{
    ConnectionError, IoNodeKind, LinkId, LinkNetwork, NodeId, NodeRef, Point, PortTarget, RerouteId, RerouteTarget,
    SlotAddress, SlotDirection, SlotType,
};
use serde::Serialize;

/// Variant tag of a render link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RenderLinkKind {
    /// Existing link, input end picked up
    MovingInput,
    /// Existing link, output end picked up
    MovingOutput,
    /// Floating link, attached end picked up
    Floating,
    /// New link from an output
    ToInput,
    /// New link from an input
    ToOutput,
    /// New link from a subgraph input port
    ToInputFromIoNode,
    /// New link from a subgraph output port
    ToOutputFromIoNode,
}

/// The fixed end of a render link
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkSource {
    /// Slot the link is anchored to
    pub address: SlotAddress,
    /// Type of that slot
    pub slot_type: SlotType,
    /// Name of that slot
    pub name: String,
    /// Where the loose end is drawn from
    pub pos: Point,
    /// Reroute the link leaves from, if any
    pub from_reroute: Option<RerouteId>,
}

impl LinkSource {
    /// Look up a slot in the network.
    ///
    /// `direction` is the direction of the anchoring slot. When the link
    /// leaves from a reroute, the loose end is drawn from the reroute.
    pub fn resolve(
        network: &LinkNetwork,
        address: SlotAddress,
        direction: SlotDirection,
        from_reroute: Option<RerouteId>,
    ) -> std::result::Result<Self, ConnectionError> {
        let slot_type = match direction {
            SlotDirection::Output => network.origin_type(address)?,
            SlotDirection::Input => network.target_type(address)?,
        }
        .clone();
        let pos = match from_reroute {
            Some(id) => network.reroute(id).ok_or(ConnectionError::RerouteNotFound(id))?.pos,
            None => network.slot_pos(address, direction).unwrap_or_default(),
        };
        Ok(Self {
            address,
            slot_type,
            name: slot_name(network, address, direction),
            pos,
            from_reroute,
        })
    }

    pub(crate) fn info(&self, kind: RenderLinkKind, to_type: SlotDirection, link: Option<LinkId>) -> RenderLinkInfo {
        RenderLinkInfo {
            kind,
            to_type,
            from: self.address,
            from_type: self.slot_type.clone(),
            from_pos: self.pos,
            from_reroute: self.from_reroute,
            link,
        }
    }
}

/// Plain snapshot of a render link, carried by events
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderLinkInfo {
    /// Variant
    pub kind: RenderLinkKind,
    /// Direction of the slot the loose end can connect to
    pub to_type: SlotDirection,
    /// Fixed end
    pub from: SlotAddress,
    /// Type at the fixed end
    pub from_type: SlotType,
    /// Where the loose end is drawn from
    pub from_pos: Point,
    /// Reroute the link leaves from
    pub from_reroute: Option<RerouteId>,
    /// Existing link being moved
    pub link: Option<LinkId>,
}

/// A link being dragged
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RenderLink {
    /// Existing link, input end picked up
    MovingInput(MovingInputLink),
    /// Existing link, output end picked up
    MovingOutput(MovingOutputLink),
    /// Floating link, attached end picked up
    Floating(FloatingRenderLink),
    /// New link from an output
    ToInput(ToInputRenderLink),
    /// New link from an input
    ToOutput(ToOutputRenderLink),
    /// New link from a subgraph input port
    ToInputFromIoNode(ToInputFromIoNodeLink),
    /// New link from a subgraph output port
    ToOutputFromIoNode(ToOutputFromIoNodeLink),
}

impl RenderLink {
    /// Variant tag
    pub fn kind(&self) -> RenderLinkKind {
        match self {
            Self::MovingInput(_) => RenderLinkKind::MovingInput,
            Self::MovingOutput(_) => RenderLinkKind::MovingOutput,
            Self::Floating(_) => RenderLinkKind::Floating,
            Self::ToInput(_) => RenderLinkKind::ToInput,
            Self::ToOutput(_) => RenderLinkKind::ToOutput,
            Self::ToInputFromIoNode(_) => RenderLinkKind::ToInputFromIoNode,
            Self::ToOutputFromIoNode(_) => RenderLinkKind::ToOutputFromIoNode,
        }
    }

    /// The fixed end
    pub fn source(&self) -> &LinkSource {
        match self {
            Self::MovingInput(link) => &link.source,
            Self::MovingOutput(link) => &link.source,
            Self::Floating(link) => &link.source,
            Self::ToInput(link) => &link.source,
            Self::ToOutput(link) => &link.source,
            Self::ToInputFromIoNode(link) => &link.source,
            Self::ToOutputFromIoNode(link) => &link.source,
        }
    }

    /// Direction of the slot the loose end can connect to
    pub fn to_type(&self) -> SlotDirection {
        match self {
            Self::MovingInput(_) | Self::ToInput(_) | Self::ToInputFromIoNode(_) => SlotDirection::Input,
            Self::MovingOutput(_) | Self::ToOutput(_) | Self::ToOutputFromIoNode(_) => SlotDirection::Output,
            Self::Floating(link) => link.to_type,
        }
    }

    /// Fixed end address
    pub fn from(&self) -> SlotAddress {
        self.source().address
    }

    /// Type at the fixed end
    pub fn from_type(&self) -> &SlotType {
        &self.source().slot_type
    }

    /// Where the loose end is drawn from
    pub fn from_pos(&self) -> Point {
        self.source().pos
    }

    /// Reroute the link leaves from
    pub fn from_reroute(&self) -> Option<RerouteId> {
        self.source().from_reroute
    }

    /// Existing link wrapped by this render link
    pub fn link(&self) -> Option<LinkId> {
        match self {
            Self::MovingInput(link) => Some(link.link),
            Self::MovingOutput(link) => Some(link.link),
            Self::Floating(link) => Some(link.link),
            Self::ToInputFromIoNode(link) => link.existing,
            Self::ToInput(_) | Self::ToOutput(_) | Self::ToOutputFromIoNode(_) => None,
        }
    }

    /// Regular node the gesture started from, used to ignore drops back
    /// onto it
    pub fn anchor_node(&self) -> Option<NodeId> {
        match self {
            Self::Floating(_) => None,
            _ => self.from().node.node_id(),
        }
    }

    /// Reroute reported to legacy consumers
    pub fn after_reroute(&self) -> Option<RerouteId> {
        match self {
            Self::MovingOutput(link) => link.parent_id,
            _ => self.from_reroute(),
        }
    }

    /// Snapshot for events
    pub fn info(&self) -> RenderLinkInfo {
        self.source().info(self.kind(), self.to_type(), self.link())
    }

    /// Whether the loose end may connect to a node input
    pub fn can_connect_to_input(&self, network: &LinkNetwork, node: NodeId, input: usize) -> bool {
        match self {
            Self::MovingInput(link) => link.can_connect_to_input(network, node, input),
            Self::Floating(link) => link.can_connect_to_input(network, node, input),
            Self::ToInput(link) => link.can_connect_to_input(network, node, input),
            Self::ToInputFromIoNode(link) => link.can_connect_to_input(network, node, input),
            Self::MovingOutput(_) | Self::ToOutput(_) | Self::ToOutputFromIoNode(_) => false,
        }
    }

    /// Whether the loose end may connect to a node output
    pub fn can_connect_to_output(&self, network: &LinkNetwork, node: NodeId, output: usize) -> bool {
        match self {
            Self::MovingOutput(link) => link.can_connect_to_output(network, node, output),
            Self::Floating(link) => link.can_connect_to_output(network, node, output),
            Self::ToOutput(link) => link.can_connect_to_output(network, node, output),
            Self::ToOutputFromIoNode(link) => link.can_connect_to_output(network, node, output),
            Self::MovingInput(_) | Self::ToInput(_) | Self::ToInputFromIoNode(_) => false,
        }
    }

    /// Whether the link may be routed through a reroute
    pub fn can_connect_to_reroute(&self, network: &LinkNetwork, reroute: RerouteId) -> bool {
        match self {
            Self::MovingInput(link) => link.can_connect_to_reroute(network, reroute),
            Self::MovingOutput(link) => link.can_connect_to_reroute(network, reroute),
            Self::Floating(_) => false,
            Self::ToInput(link) => link.can_connect_to_reroute(network, reroute),
            Self::ToOutput(link) => link.can_connect_to_reroute(network, reroute),
            Self::ToInputFromIoNode(link) => link.can_connect_to_reroute(network, reroute),
            Self::ToOutputFromIoNode(link) => link.can_connect_to_reroute(network, reroute),
        }
    }

    /// Whether the loose end may connect to a subgraph input port
    pub fn can_connect_to_subgraph_input(&self, network: &LinkNetwork, target: PortTarget) -> bool {
        match self {
            Self::MovingOutput(link) => link.can_connect_to_subgraph_input(network, target),
            Self::ToOutput(link) => link.can_connect_to_subgraph_input(network, target),
            _ => false,
        }
    }

    /// Whether the loose end may connect to a subgraph output port
    pub fn can_connect_to_subgraph_output(&self, network: &LinkNetwork, target: PortTarget) -> bool {
        match self {
            Self::MovingInput(link) => link.can_connect_to_subgraph_output(network, target),
            Self::ToInput(link) => link.can_connect_to_subgraph_output(network, target),
            _ => false,
        }
    }

    /// Whether the loose end may connect to `source`, the output feeding a
    /// reroute
    pub fn can_connect_to_source(&self, network: &LinkNetwork, source: SlotAddress) -> bool {
        match source.node {
            NodeRef::Node(node) => self.can_connect_to_output(network, node, source.slot),
            NodeRef::SubgraphInput => match self {
                // Straight from a subgraph input to a subgraph output is not a link
                Self::ToOutputFromIoNode(_) => false,
                _ => self.can_connect_to_subgraph_input(network, PortTarget::Port(source.slot)),
            },
            NodeRef::SubgraphOutput => false,
        }
    }

    /// Commit a drop on a node input
    pub fn connect_to_input(
        &self,
        network: &mut LinkNetwork,
        events: &mut EventBus,
        node: NodeId,
        input: usize,
    ) -> Result<Option<LinkId>> {
        match self {
            Self::MovingInput(link) => link.connect_to_input(network, events, node, input),
            Self::Floating(link) => link.connect_to_input(network, events, node, input),
            Self::ToInput(link) => link.connect_to_input(network, events, node, input),
            Self::ToInputFromIoNode(link) => link.connect_to_input(network, events, node, input),
            Self::MovingOutput(_) | Self::ToOutput(_) | Self::ToOutputFromIoNode(_) => Ok(self.not_applicable("input")),
        }
    }

    /// Commit a drop on a node output
    pub fn connect_to_output(
        &self,
        network: &mut LinkNetwork,
        events: &mut EventBus,
        node: NodeId,
        output: usize,
    ) -> Result<Option<LinkId>> {
        match self {
            Self::MovingOutput(link) => link.connect_to_output(network, events, node, output),
            Self::Floating(link) => link.connect_to_output(network, events, node, output),
            Self::ToOutput(link) => link.connect_to_output(network, events, node, output),
            Self::ToOutputFromIoNode(link) => link.connect_to_output(network, events, node, output),
            Self::MovingInput(_) | Self::ToInput(_) | Self::ToInputFromIoNode(_) => Ok(self.not_applicable("output")),
        }
    }

    /// Commit a drop on a subgraph input port
    pub fn connect_to_subgraph_input(
        &self,
        network: &mut LinkNetwork,
        events: &mut EventBus,
        target: PortTarget,
    ) -> Result<Option<LinkId>> {
        match self {
            Self::MovingOutput(link) => link.connect_to_subgraph_input(network, events, target),
            Self::ToOutput(link) => link.connect_to_subgraph_input(network, events, target),
            _ => Ok(self.not_applicable("subgraph input")),
        }
    }

    /// Commit a drop on a subgraph output port
    pub fn connect_to_subgraph_output(
        &self,
        network: &mut LinkNetwork,
        events: &mut EventBus,
        target: PortTarget,
    ) -> Result<Option<LinkId>> {
        match self {
            Self::MovingInput(link) => link.connect_to_subgraph_output(network, events, target),
            Self::ToInput(link) => link.connect_to_subgraph_output(network, events, target),
            _ => Ok(self.not_applicable("subgraph output")),
        }
    }

    /// Re-source one input reached through `reroute` from this link's fixed
    /// end, routing it through `reroute`
    pub fn connect_to_reroute_input(
        &self,
        network: &mut LinkNetwork,
        events: &mut EventBus,
        reroute: RerouteId,
        target: &RerouteTarget,
    ) -> Result<Option<LinkId>> {
        match self {
            Self::MovingInput(link) => link.connect_to_reroute_input(network, events, reroute, target),
            Self::ToInput(link) => link.connect_to_reroute_input(network, events, reroute, target),
            Self::ToInputFromIoNode(link) => link.connect_to_reroute_input(network, events, reroute, target),
            _ => Ok(self.not_applicable("reroute input")),
        }
    }

    /// Connect this link's fixed end to `source` through `reroute`
    pub fn connect_to_reroute_output(
        &self,
        network: &mut LinkNetwork,
        events: &mut EventBus,
        reroute: RerouteId,
        source: SlotAddress,
    ) -> Result<Option<LinkId>> {
        match self {
            Self::MovingOutput(link) => link.connect_to_reroute_output(network, events, reroute, source),
            Self::ToOutput(link) => link.connect_to_reroute_output(network, events, reroute, source),
            Self::ToOutputFromIoNode(link) => link.connect_to_reroute_output(network, events, reroute, source),
            _ => Ok(self.not_applicable("reroute output")),
        }
    }

    /// Disconnect the wrapped link after a drop on empty canvas.
    ///
    /// Returns whether anything was removed. New links wrap nothing.
    pub fn disconnect(&self, network: &mut LinkNetwork, keep_reroutes: bool) -> Result<bool> {
        match self {
            Self::MovingInput(link) => link.disconnect(network, keep_reroutes),
            Self::MovingOutput(link) => link.disconnect(network, keep_reroutes),
            Self::Floating(link) => Ok(link.disconnect(network)),
            Self::ToInputFromIoNode(link) => link.disconnect(network, keep_reroutes),
            Self::ToInput(_) | Self::ToOutput(_) | Self::ToOutputFromIoNode(_) => Ok(false),
        }
    }

    fn not_applicable(&self, target: &str) -> Option<LinkId> {
        tracing::debug!(kind = ?self.kind(), target, "Render link cannot connect to this target");
        None
    }
}

pub(crate) fn input_type(network: &LinkNetwork, node: NodeId, input: usize) -> Option<&SlotType> {
    network.target_type(SlotAddress::node(node, input)).ok()
}

pub(crate) fn output_type(network: &LinkNetwork, node: NodeId, output: usize) -> Option<&SlotType> {
    network.origin_type(SlotAddress::node(node, output)).ok()
}

/// Whether a boundary port (or the placeholder) takes a link of `slot_type`
pub(crate) fn port_accepts(network: &LinkNetwork, kind: IoNodeKind, target: PortTarget, slot_type: &SlotType) -> bool {
    let Some(io) = network.io() else {
        return false;
    };
    match target {
        PortTarget::Empty => true,
        PortTarget::Port(index) => io
            .port(kind, index)
            .is_some_and(|port| slot_type.is_compatible(&port.slot_type)),
    }
}

/// Index of an existing port, or of a port created for the placeholder
pub(crate) fn materialize_port(
    network: &mut LinkNetwork,
    kind: IoNodeKind,
    target: PortTarget,
    name: &str,
    slot_type: &SlotType,
) -> Result<usize> {
    match target {
        PortTarget::Port(index) => Ok(index),
        PortTarget::Empty => {
            let index = network.add_subgraph_port(kind, name, slot_type.clone())?;
            tracing::debug!(?kind, port = index, %slot_type, "Created subgraph port");
            Ok(index)
        }
    }
}

/// Whether a link leaving `from_reroute` can be routed through `reroute`
/// without closing a loop
pub(crate) fn reroute_accepts(network: &LinkNetwork, from_reroute: Option<RerouteId>, reroute: RerouteId) -> bool {
    if network.reroute(reroute).is_none() || from_reroute == Some(reroute) {
        return false;
    }
    !network.link_chain(from_reroute).contains(&reroute)
}

/// Nearest reroute of the link currently reaching a reroute target
pub(crate) fn target_parent(network: &LinkNetwork, target: &RerouteTarget) -> Option<RerouteId> {
    let link = if target.floating {
        network.floating_link(target.link)
    } else {
        network.link(target.link)
    };
    link.and_then(|l| l.parent_id)
}

pub(crate) fn emit_created(network: &LinkNetwork, events: &mut EventBus, link_id: LinkId) {
    if let Some(link) = network.link(link_id) {
        tracing::debug!(link = %link_id, "Link created");
        events.dispatch(&ConnectorEvent::LinkCreated(link.clone()));
    }
}

fn slot_name(network: &LinkNetwork, address: SlotAddress, direction: SlotDirection) -> String {
    let name = match (address.node, direction) {
        (NodeRef::Node(id), SlotDirection::Input) => network
            .node(id)
            .and_then(|n| n.input(address.slot))
            .map(|s| s.name.as_str()),
        (NodeRef::Node(id), SlotDirection::Output) => network
            .node(id)
            .and_then(|n| n.output(address.slot))
            .map(|s| s.name.as_str()),
        (NodeRef::SubgraphInput, _) => network
            .io()
            .and_then(|io| io.port(IoNodeKind::Input, address.slot))
            .map(|p| p.name.as_str()),
        (NodeRef::SubgraphOutput, _) => network
            .io()
            .and_then(|io| io.port(IoNodeKind::Output, address.slot))
            .map(|p| p.name.as_str()),
    };
    name.unwrap_or_default().to_owned()
}
