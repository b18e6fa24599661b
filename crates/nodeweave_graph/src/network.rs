// SPDX-License-Identifier: MIT OR Apache-2.0
//! Link network containing nodes, links, floating links and reroutes.

use crate::link::{Link, LinkId, NodeRef, SlotAddress};
use crate::node::{Node, NodeId};
use crate::reroute::{Reroute, RerouteId};
use crate::slot::{SlotDirection, SlotType};
use crate::subgraph::{IoNodeKind, SubgraphIo};
use crate::Point;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Result type for network mutations
pub type Result<T> = std::result::Result<T, ConnectionError>;

/// A graph of nodes joined by links, with reroutes and floating links.
///
/// All cross references are ids into the maps owned here. Mutations keep both
/// sides of every reference in step: a link is registered on its slots and on
/// every reroute of its chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkNetwork {
    pub(crate) nodes: IndexMap<NodeId, Node>,
    pub(crate) links: IndexMap<LinkId, Link>,
    pub(crate) floating_links: IndexMap<LinkId, Link>,
    pub(crate) reroutes: IndexMap<RerouteId, Reroute>,
    pub(crate) io: Option<SubgraphIo>,
    pub(crate) last_link_id: u32,
    pub(crate) last_floating_link_id: u32,
    pub(crate) last_reroute_id: u32,
}

impl LinkNetwork {
    /// Create a new empty network
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the inside of a subgraph with the given boundary
    pub fn subgraph(io: SubgraphIo) -> Self {
        Self {
            io: Some(io),
            ..Self::default()
        }
    }

    /// Subgraph boundary, if this network is a subgraph
    pub fn io(&self) -> Option<&SubgraphIo> {
        self.io.as_ref()
    }

    /// Mutable subgraph boundary
    pub fn io_mut(&mut self) -> Option<&mut SubgraphIo> {
        self.io.as_mut()
    }

    /// Add a node to the network
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node, dropping every link and floating link attached to it
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        let node = self.nodes.get(&node_id)?;
        let inputs = node.inputs.len();
        let outputs: Vec<(Vec<LinkId>, Vec<LinkId>)> = node
            .outputs
            .iter()
            .map(|o| (o.links.clone(), o.floating_links.iter().copied().collect()))
            .collect();

        for index in 0..inputs {
            if let Err(err) = self.disconnect_input(node_id, index, false) {
                tracing::warn!(%err, "Failed to disconnect input while removing node");
            }
        }
        for (links, floating) in outputs {
            for id in floating {
                self.remove_floating_link(id);
            }
            for id in links {
                if let Err(err) = self.disconnect_link(id, None) {
                    tracing::warn!(%err, "Failed to disconnect output while removing node");
                }
            }
        }

        self.nodes.shift_remove(&node_id)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get a resolved link by ID
    pub fn link(&self, link_id: LinkId) -> Option<&Link> {
        self.links.get(&link_id)
    }

    /// Get a mutable resolved link by ID
    pub fn link_mut(&mut self, link_id: LinkId) -> Option<&mut Link> {
        self.links.get_mut(&link_id)
    }

    /// Get all resolved links
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Get the number of resolved links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Get a floating link by ID
    pub fn floating_link(&self, link_id: LinkId) -> Option<&Link> {
        self.floating_links.get(&link_id)
    }

    /// Get a mutable floating link by ID
    pub fn floating_link_mut(&mut self, link_id: LinkId) -> Option<&mut Link> {
        self.floating_links.get_mut(&link_id)
    }

    /// Get all floating links
    pub fn floating_links(&self) -> impl Iterator<Item = &Link> {
        self.floating_links.values()
    }

    /// Type produced at a link origin
    pub fn origin_type(&self, origin: SlotAddress) -> Result<&SlotType> {
        let missing = ConnectionError::SlotNotFound {
            node: origin.node,
            slot: origin.slot,
            direction: SlotDirection::Output,
        };
        match origin.node {
            NodeRef::Node(id) => {
                let node = self.nodes.get(&id).ok_or(ConnectionError::NodeNotFound(id))?;
                node.output(origin.slot).map(|o| &o.slot_type).ok_or(missing)
            }
            NodeRef::SubgraphInput => {
                let io = self.io.as_ref().ok_or(ConnectionError::NotASubgraph)?;
                io.port(IoNodeKind::Input, origin.slot)
                    .map(|p| &p.slot_type)
                    .ok_or(missing)
            }
            NodeRef::SubgraphOutput => Err(missing),
        }
    }

    /// Type accepted at a link target
    pub fn target_type(&self, target: SlotAddress) -> Result<&SlotType> {
        let missing = ConnectionError::SlotNotFound {
            node: target.node,
            slot: target.slot,
            direction: SlotDirection::Input,
        };
        match target.node {
            NodeRef::Node(id) => {
                let node = self.nodes.get(&id).ok_or(ConnectionError::NodeNotFound(id))?;
                node.input(target.slot).map(|i| &i.slot_type).ok_or(missing)
            }
            NodeRef::SubgraphOutput => {
                let io = self.io.as_ref().ok_or(ConnectionError::NotASubgraph)?;
                io.port(IoNodeKind::Output, target.slot)
                    .map(|p| &p.slot_type)
                    .ok_or(missing)
            }
            NodeRef::SubgraphInput => Err(missing),
        }
    }

    /// Canvas position of a slot's connection point
    pub fn slot_pos(&self, address: SlotAddress, direction: SlotDirection) -> Option<Point> {
        match address.node {
            NodeRef::Node(id) => {
                let node = self.nodes.get(&id)?;
                Some(match direction {
                    SlotDirection::Input => node.input_pos(address.slot),
                    SlotDirection::Output => node.output_pos(address.slot),
                })
            }
            NodeRef::SubgraphInput => Some(self.io.as_ref()?.port_pos(IoNodeKind::Input, address.slot)),
            NodeRef::SubgraphOutput => Some(self.io.as_ref()?.port_pos(IoNodeKind::Output, address.slot)),
        }
    }

    /// Resolved link currently held by a target slot
    pub fn target_link(&self, target: SlotAddress) -> Option<LinkId> {
        match target.node {
            NodeRef::Node(id) => self.nodes.get(&id)?.input(target.slot)?.link,
            NodeRef::SubgraphOutput => self
                .io
                .as_ref()?
                .port(IoNodeKind::Output, target.slot)?
                .link_ids
                .first()
                .copied(),
            NodeRef::SubgraphInput => None,
        }
    }

    /// Connect a node output to a node input, through the chain ending at
    /// `after_reroute`
    pub fn connect_slots(
        &mut self,
        origin_node: NodeId,
        output: usize,
        target_node: NodeId,
        input: usize,
        after_reroute: Option<RerouteId>,
    ) -> Result<LinkId> {
        self.connect(
            SlotAddress::node(origin_node, output),
            SlotAddress::node(target_node, input),
            after_reroute,
        )
    }

    /// Connect a subgraph input port to a node input
    pub fn connect_subgraph_input(
        &mut self,
        port: usize,
        target_node: NodeId,
        input: usize,
        after_reroute: Option<RerouteId>,
    ) -> Result<LinkId> {
        self.connect(
            SlotAddress::subgraph_input(port),
            SlotAddress::node(target_node, input),
            after_reroute,
        )
    }

    /// Connect a node output to a subgraph output port
    pub fn connect_to_subgraph_output(
        &mut self,
        origin_node: NodeId,
        output: usize,
        port: usize,
        after_reroute: Option<RerouteId>,
    ) -> Result<LinkId> {
        self.connect(
            SlotAddress::node(origin_node, output),
            SlotAddress::subgraph_output(port),
            after_reroute,
        )
    }

    /// Create a resolved link between two slots.
    ///
    /// An occupied target is disconnected first, keeping its reroutes. The new
    /// link is registered on every reroute of the chain ending at
    /// `after_reroute`, and floating links that ended at that reroute are
    /// removed.
    pub fn connect(
        &mut self,
        origin: SlotAddress,
        target: SlotAddress,
        after_reroute: Option<RerouteId>,
    ) -> Result<LinkId> {
        let origin_type = self.origin_type(origin)?.clone();
        let target_type = self.target_type(target)?.clone();
        if !origin_type.is_compatible(&target_type) {
            return Err(ConnectionError::IncompatibleTypes {
                from: origin_type,
                to: target_type,
            });
        }

        let chain = match after_reroute {
            Some(id) => self.reroute_chain(id)?,
            None => Vec::new(),
        };

        if let Some(existing) = self.target_link(target) {
            if self.links.contains_key(&existing) {
                self.disconnect_link(existing, Some(SlotDirection::Output))?;
            } else {
                tracing::warn!(link = %existing, "Clearing stale link reference on input");
                self.detach_target(target, existing);
            }
        }

        self.last_link_id += 1;
        let id = LinkId(self.last_link_id);
        let slot_type = if target_type.is_wildcard() {
            origin_type
        } else {
            target_type
        };
        self.attach_origin(origin, id)?;
        self.attach_target(target, id)?;
        self.links
            .insert(id, Link::new(id, slot_type, Some(origin), Some(target), after_reroute));

        for reroute_id in &chain {
            if let Some(reroute) = self.reroutes.get_mut(reroute_id) {
                reroute.link_ids.insert(id);
                reroute.floating = None;
                reroute.dragging = false;
            }
        }

        // Dangling chains toward this input are superseded
        let anchored: Vec<LinkId> = match target.node {
            NodeRef::Node(node) => self
                .nodes
                .get(&node)
                .and_then(|n| n.input(target.slot))
                .map(|i| i.floating_links.iter().copied().collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        for floating_id in anchored {
            self.remove_floating_link(floating_id);
        }

        if let Some(&last) = chain.last() {
            let terminating: Vec<LinkId> = self
                .reroutes
                .get(&last)
                .map(|r| {
                    r.floating_link_ids
                        .iter()
                        .copied()
                        .filter(|fid| {
                            self.floating_links
                                .get(fid)
                                .is_some_and(|l| l.parent_id == Some(last))
                        })
                        .collect()
                })
                .unwrap_or_default();
            for floating_id in terminating {
                self.remove_floating_link(floating_id);
            }
        }

        Ok(id)
    }

    /// Disconnect a node input.
    ///
    /// Floating links anchored at the input are removed. With `keep_reroutes`
    /// the link's reroutes survive, possibly as a floating chain.
    pub fn disconnect_input(&mut self, node_id: NodeId, input: usize, keep_reroutes: bool) -> Result<bool> {
        let slot = self
            .nodes
            .get(&node_id)
            .ok_or(ConnectionError::NodeNotFound(node_id))?
            .input(input)
            .ok_or(ConnectionError::SlotNotFound {
                node: NodeRef::Node(node_id),
                slot: input,
                direction: SlotDirection::Input,
            })?;
        let floating: Vec<LinkId> = slot.floating_links.iter().copied().collect();
        let link = slot.link;

        for id in floating {
            self.remove_floating_link(id);
        }

        let Some(link_id) = link else {
            return Ok(false);
        };
        if !self.links.contains_key(&link_id) {
            tracing::warn!(link = %link_id, "Input referenced a missing link");
            self.detach_target(SlotAddress::node(node_id, input), link_id);
            return Ok(false);
        }
        self.disconnect_link(link_id, keep_reroutes.then_some(SlotDirection::Output))?;
        Ok(true)
    }

    /// Disconnect every link leaving a node output.
    ///
    /// Reroutes are kept as floating chains attached to the former targets.
    pub fn disconnect_output(&mut self, node_id: NodeId, output: usize) -> Result<usize> {
        let slot = self
            .nodes
            .get(&node_id)
            .ok_or(ConnectionError::NodeNotFound(node_id))?
            .output(output)
            .ok_or(ConnectionError::SlotNotFound {
                node: NodeRef::Node(node_id),
                slot: output,
                direction: SlotDirection::Output,
            })?;
        let floating: Vec<LinkId> = slot.floating_links.iter().copied().collect();
        let links = slot.links.clone();

        for id in floating {
            self.remove_floating_link(id);
        }

        let mut count = 0;
        for id in links {
            match self.disconnect_link(id, Some(SlotDirection::Input)) {
                Ok(_) => count += 1,
                Err(err) => tracing::warn!(%err, "Output referenced a missing link"),
            }
        }
        Ok(count)
    }

    /// Remove a resolved link.
    ///
    /// `keep` selects what happens to the link's reroutes:
    /// - `None`: reroutes left without links are removed.
    /// - `Some(Output)`: if the last reroute carried only this link, a
    ///   floating link attached to the origin takes its place.
    /// - `Some(Input)`: a floating link attached to the target takes its
    ///   place whenever the link had reroutes.
    pub fn disconnect_link(&mut self, link_id: LinkId, keep: Option<SlotDirection>) -> Result<Link> {
        let link = self
            .links
            .get(&link_id)
            .cloned()
            .ok_or(ConnectionError::LinkNotFound(link_id))?;

        if let Some(target) = link.target {
            self.detach_target(target, link_id);
        }
        if let Some(origin) = link.origin {
            self.detach_origin(origin, link_id);
        }

        let chain = self.link_chain(link.parent_id);
        if let (Some(&last), Some(side)) = (chain.last(), keep) {
            let make_floating = match side {
                SlotDirection::Output => self
                    .reroutes
                    .get(&last)
                    .is_some_and(|r| r.link_ids.len() == 1 && r.floating_link_ids.is_empty()),
                SlotDirection::Input => true,
            };
            if make_floating {
                if let Some(reroute) = self.reroutes.get_mut(&last) {
                    reroute.floating = Some(side);
                }
                self.add_floating_link(link.to_floating(side, link.parent_id));
            }
        }

        for reroute_id in chain {
            let emptied = match self.reroutes.get_mut(&reroute_id) {
                Some(reroute) => {
                    reroute.link_ids.shift_remove(&link_id);
                    reroute.total_links() == 0
                }
                None => false,
            };
            if emptied && keep.is_none() {
                self.remove_reroute(reroute_id);
            }
        }

        self.links.shift_remove(&link_id);
        Ok(link)
    }

    /// Disconnect the link feeding a subgraph output port, keeping reroutes
    pub fn disconnect_subgraph_output(&mut self, port: usize) -> Result<bool> {
        let target = SlotAddress::subgraph_output(port);
        self.target_type(target)?;
        match self.target_link(target) {
            Some(id) => {
                self.disconnect_link(id, Some(SlotDirection::Output))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Materialise a new boundary port, returning its index
    pub fn add_subgraph_port(&mut self, kind: IoNodeKind, name: &str, slot_type: SlotType) -> Result<usize> {
        let io = self.io.as_mut().ok_or(ConnectionError::NotASubgraph)?;
        Ok(io.add_port(kind, name, slot_type))
    }

    /// Register a floating link, returning its new ID.
    ///
    /// The link is recorded on its attached slot and on every reroute of its
    /// chain.
    pub fn add_floating_link(&mut self, mut link: Link) -> LinkId {
        self.last_floating_link_id += 1;
        let id = LinkId(self.last_floating_link_id);
        link.id = id;
        link.dragging = false;

        if let Some(target) = link.target {
            self.register_floating(target, SlotDirection::Input, id);
        } else if let Some(origin) = link.origin {
            self.register_floating(origin, SlotDirection::Output, id);
        }

        for reroute_id in self.link_chain(link.parent_id) {
            if let Some(reroute) = self.reroutes.get_mut(&reroute_id) {
                reroute.floating_link_ids.insert(id);
            }
        }

        self.floating_links.insert(id, link);
        id
    }

    /// Remove a floating link.
    ///
    /// Reroutes of its chain that are left without any link are removed.
    pub fn remove_floating_link(&mut self, link_id: LinkId) -> Option<Link> {
        self.remove_floating_link_except(link_id, None)
    }

    pub(crate) fn remove_floating_link_except(
        &mut self,
        link_id: LinkId,
        keep_reroute: Option<RerouteId>,
    ) -> Option<Link> {
        let link = self.floating_links.shift_remove(&link_id)?;

        if let Some(target) = link.target {
            self.unregister_floating(target, SlotDirection::Input, link_id);
        } else if let Some(origin) = link.origin {
            self.unregister_floating(origin, SlotDirection::Output, link_id);
        }

        for reroute_id in self.link_chain(link.parent_id) {
            let emptied = match self.reroutes.get_mut(&reroute_id) {
                Some(reroute) => {
                    reroute.floating_link_ids.shift_remove(&link_id);
                    if reroute.floating_link_ids.is_empty() {
                        reroute.floating = None;
                    }
                    reroute.total_links() == 0
                }
                None => false,
            };
            if emptied && keep_reroute != Some(reroute_id) {
                self.remove_reroute(reroute_id);
            }
        }

        Some(link)
    }

    /// Move the attached end of a floating link to another slot of the same
    /// direction. The slot's type is not checked.
    pub fn relocate_floating_link(&mut self, link_id: LinkId, address: SlotAddress) -> Result<()> {
        let link = self
            .floating_links
            .get(&link_id)
            .ok_or(ConnectionError::LinkNotFound(link_id))?;
        let (side, previous) = match (link.origin, link.target) {
            (None, Some(target)) => (SlotDirection::Input, target),
            (Some(origin), None) => (SlotDirection::Output, origin),
            _ => return Err(ConnectionError::LinkNotFound(link_id)),
        };
        match side {
            SlotDirection::Input => self.target_type(address)?,
            SlotDirection::Output => self.origin_type(address)?,
        };

        self.unregister_floating(previous, side, link_id);
        if let Some(link) = self.floating_links.get_mut(&link_id) {
            match side {
                SlotDirection::Input => link.target = Some(address),
                SlotDirection::Output => link.origin = Some(address),
            }
        }
        self.register_floating(address, side, link_id);
        Ok(())
    }

    fn attach_origin(&mut self, origin: SlotAddress, link_id: LinkId) -> Result<()> {
        let missing = ConnectionError::SlotNotFound {
            node: origin.node,
            slot: origin.slot,
            direction: SlotDirection::Output,
        };
        match origin.node {
            NodeRef::Node(id) => {
                let node = self.nodes.get_mut(&id).ok_or(ConnectionError::NodeNotFound(id))?;
                node.output_mut(origin.slot).ok_or(missing)?.links.push(link_id);
            }
            NodeRef::SubgraphInput => {
                let io = self.io.as_mut().ok_or(ConnectionError::NotASubgraph)?;
                io.inputs.get_mut(origin.slot).ok_or(missing)?.link_ids.push(link_id);
            }
            NodeRef::SubgraphOutput => return Err(missing),
        }
        Ok(())
    }

    fn attach_target(&mut self, target: SlotAddress, link_id: LinkId) -> Result<()> {
        let missing = ConnectionError::SlotNotFound {
            node: target.node,
            slot: target.slot,
            direction: SlotDirection::Input,
        };
        match target.node {
            NodeRef::Node(id) => {
                let node = self.nodes.get_mut(&id).ok_or(ConnectionError::NodeNotFound(id))?;
                node.input_mut(target.slot).ok_or(missing)?.link = Some(link_id);
            }
            NodeRef::SubgraphOutput => {
                let io = self.io.as_mut().ok_or(ConnectionError::NotASubgraph)?;
                io.outputs.get_mut(target.slot).ok_or(missing)?.link_ids = vec![link_id];
            }
            NodeRef::SubgraphInput => return Err(missing),
        }
        Ok(())
    }

    fn detach_origin(&mut self, origin: SlotAddress, link_id: LinkId) {
        match origin.node {
            NodeRef::Node(id) => {
                if let Some(output) = self.nodes.get_mut(&id).and_then(|n| n.output_mut(origin.slot)) {
                    output.links.retain(|l| *l != link_id);
                }
            }
            NodeRef::SubgraphInput => {
                if let Some(port) = self.io.as_mut().and_then(|io| io.inputs.get_mut(origin.slot)) {
                    port.link_ids.retain(|l| *l != link_id);
                }
            }
            NodeRef::SubgraphOutput => {}
        }
    }

    fn detach_target(&mut self, target: SlotAddress, link_id: LinkId) {
        match target.node {
            NodeRef::Node(id) => {
                if let Some(input) = self.nodes.get_mut(&id).and_then(|n| n.input_mut(target.slot)) {
                    if input.link == Some(link_id) {
                        input.link = None;
                    }
                }
            }
            NodeRef::SubgraphOutput => {
                if let Some(port) = self.io.as_mut().and_then(|io| io.outputs.get_mut(target.slot)) {
                    port.link_ids.retain(|l| *l != link_id);
                }
            }
            NodeRef::SubgraphInput => {}
        }
    }

    pub(crate) fn register_floating(&mut self, address: SlotAddress, direction: SlotDirection, link_id: LinkId) {
        let Some(node) = address.node.node_id().and_then(|id| self.nodes.get_mut(&id)) else {
            return;
        };
        match direction {
            SlotDirection::Input => {
                if let Some(input) = node.input_mut(address.slot) {
                    input.floating_links.insert(link_id);
                }
            }
            SlotDirection::Output => {
                if let Some(output) = node.output_mut(address.slot) {
                    output.floating_links.insert(link_id);
                }
            }
        }
    }

    pub(crate) fn unregister_floating(&mut self, address: SlotAddress, direction: SlotDirection, link_id: LinkId) {
        let Some(node) = address.node.node_id().and_then(|id| self.nodes.get_mut(&id)) else {
            return;
        };
        match direction {
            SlotDirection::Input => {
                if let Some(input) = node.input_mut(address.slot) {
                    input.floating_links.shift_remove(&link_id);
                }
            }
            SlotDirection::Output => {
                if let Some(output) = node.output_mut(address.slot) {
                    output.floating_links.shift_remove(&link_id);
                }
            }
        }
    }
}

/// Error when mutating the network
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConnectionError {
    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Slot not found on a node or boundary
    #[error("No {direction} slot {slot} on {node:?}")]
    SlotNotFound {
        /// Slot owner
        node: NodeRef,
        /// Slot index
        slot: usize,
        /// Slot direction
        direction: SlotDirection,
    },

    /// Link not found
    #[error("Link not found: {0}")]
    LinkNotFound(LinkId),

    /// Reroute not found
    #[error("Reroute not found: {0}")]
    RerouteNotFound(RerouteId),

    /// Incompatible slot types
    #[error("Incompatible slot types: {from} -> {to}")]
    IncompatibleTypes {
        /// Type at the output end
        from: SlotType,
        /// Type at the input end
        to: SlotType,
    },

    /// A reroute chain loops back on itself
    #[error("Reroute loop detected at {0}")]
    RerouteLoop(RerouteId),

    /// Boundary ports requested on a network that is not a subgraph
    #[error("Network is not a subgraph")]
    NotASubgraph,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::LinkSegment;

    fn two_nodes() -> (LinkNetwork, NodeId, NodeId) {
        let mut network = LinkNetwork::new();
        let a = network.add_node(Node::new("A").with_output("out", "INT").with_output("text", "STRING"));
        let b = network.add_node(Node::new("B").with_input("in", "INT").with_input("any", "*"));
        (network, a, b)
    }

    #[test]
    fn test_connect_slots() {
        let (mut network, a, b) = two_nodes();
        let id = network.connect_slots(a, 0, b, 0, None).unwrap();

        let link = network.link(id).unwrap();
        assert!(link.has_origin(NodeRef::Node(a), 0));
        assert!(link.has_target(NodeRef::Node(b), 0));
        assert_eq!(network.node(a).unwrap().outputs[0].links, vec![id]);
        assert_eq!(network.node(b).unwrap().inputs[0].link, Some(id));
        assert!(network.integrity_issues().is_empty());
    }

    #[test]
    fn test_connect_rejects_incompatible_types() {
        let (mut network, a, b) = two_nodes();
        let result = network.connect_slots(a, 1, b, 0, None);
        assert!(matches!(result, Err(ConnectionError::IncompatibleTypes { .. })));
        assert_eq!(network.link_count(), 0);
    }

    #[test]
    fn test_wildcard_input_takes_output_type() {
        let (mut network, a, b) = two_nodes();
        let id = network.connect_slots(a, 1, b, 1, None).unwrap();
        assert_eq!(network.link(id).unwrap().slot_type.as_str(), "STRING");
    }

    #[test]
    fn test_connect_replaces_existing_input_link() {
        let (mut network, a, b) = two_nodes();
        let first = network.connect_slots(a, 0, b, 1, None).unwrap();
        let second = network.connect_slots(a, 1, b, 1, None).unwrap();

        assert!(network.link(first).is_none());
        assert_eq!(network.node(b).unwrap().inputs[1].link, Some(second));
        assert_eq!(network.node(a).unwrap().outputs[0].links, Vec::<LinkId>::new());
        assert!(network.integrity_issues().is_empty());
    }

    #[test]
    fn test_disconnect_without_keep_removes_reroutes() {
        let (mut network, a, b) = two_nodes();
        let id = network.connect_slots(a, 0, b, 0, None).unwrap();
        let reroute = network.insert_reroute([10.0, 10.0], LinkSegment::Link(id)).unwrap();
        assert_eq!(network.link(id).unwrap().parent_id, Some(reroute));

        network.disconnect_input(b, 0, false).unwrap();
        assert!(network.reroute(reroute).is_none());
        assert_eq!(network.floating_links().count(), 0);
        assert!(network.integrity_issues().is_empty());
    }

    #[test]
    fn test_disconnect_input_keeping_reroutes_leaves_floating_chain() {
        let (mut network, a, b) = two_nodes();
        let id = network.connect_slots(a, 0, b, 0, None).unwrap();
        let reroute = network.insert_reroute([10.0, 10.0], LinkSegment::Link(id)).unwrap();

        network.disconnect_input(b, 0, true).unwrap();

        let reroute = network.reroute(reroute).unwrap();
        assert_eq!(reroute.floating, Some(SlotDirection::Output));
        assert_eq!(reroute.floating_link_ids.len(), 1);
        let floating = network.floating_links().next().unwrap();
        assert!(floating.is_floating_input());
        assert!(network.node(a).unwrap().outputs[0].floating_links.contains(&floating.id));
        assert!(network.integrity_issues().is_empty());
    }

    #[test]
    fn test_disconnect_output_floats_toward_inputs() {
        let (mut network, a, b) = two_nodes();
        let id = network.connect_slots(a, 0, b, 0, None).unwrap();
        let reroute = network.insert_reroute([10.0, 10.0], LinkSegment::Link(id)).unwrap();

        assert_eq!(network.disconnect_output(a, 0).unwrap(), 1);

        assert_eq!(network.reroute(reroute).unwrap().floating, Some(SlotDirection::Input));
        let floating = network.floating_links().next().unwrap();
        assert!(floating.is_floating_output());
        assert!(network.node(b).unwrap().inputs[0].floating_links.contains(&floating.id));
        assert!(network.integrity_issues().is_empty());
    }

    #[test]
    fn test_connecting_from_floating_reroute_consumes_floating_link() {
        let (mut network, a, b) = two_nodes();
        let id = network.connect_slots(a, 0, b, 0, None).unwrap();
        let reroute = network.insert_reroute([10.0, 10.0], LinkSegment::Link(id)).unwrap();
        network.disconnect_input(b, 0, true).unwrap();
        assert_eq!(network.floating_links().count(), 1);

        network.connect_slots(a, 0, b, 1, Some(reroute)).unwrap();

        assert_eq!(network.floating_links().count(), 0);
        let reroute = network.reroute(reroute).unwrap();
        assert_eq!(reroute.floating, None);
        assert_eq!(reroute.link_ids.len(), 1);
        assert!(network.integrity_issues().is_empty());
    }

    #[test]
    fn test_remove_node_drops_links() {
        let (mut network, a, b) = two_nodes();
        network.connect_slots(a, 0, b, 0, None).unwrap();
        network.remove_node(a).unwrap();

        assert_eq!(network.link_count(), 0);
        assert_eq!(network.node(b).unwrap().inputs[0].link, None);
        assert!(network.integrity_issues().is_empty());
    }

    #[test]
    fn test_subgraph_ports() {
        let mut network = LinkNetwork::subgraph(SubgraphIo::new().with_input("seed", "INT"));
        let b = network.add_node(Node::new("B").with_input("in", "INT").with_output("out", "INT"));

        let incoming = network.connect_subgraph_input(0, b, 0, None).unwrap();
        let port = network.add_subgraph_port(IoNodeKind::Output, "out", SlotType::new("INT")).unwrap();
        let outgoing = network.connect_to_subgraph_output(b, 0, port, None).unwrap();

        let io = network.io().unwrap();
        assert_eq!(io.inputs[0].link_ids, vec![incoming]);
        assert_eq!(io.outputs[0].link_ids, vec![outgoing]);
        assert!(network.link(incoming).unwrap().origin.unwrap().node.is_io_node());
        assert!(network.integrity_issues().is_empty());

        assert!(network.disconnect_subgraph_output(0).unwrap());
        assert!(network.io().unwrap().outputs[0].link_ids.is_empty());
    }

    #[test]
    fn test_serialization() {
        let (mut network, a, b) = two_nodes();
        let id = network.connect_slots(a, 0, b, 0, None).unwrap();
        network.insert_reroute([4.0, 2.0], LinkSegment::Link(id)).unwrap();

        let text = ron::ser::to_string_pretty(&network, ron::ser::PrettyConfig::default()).unwrap();
        let restored: LinkNetwork = ron::from_str(&text).unwrap();

        assert_eq!(restored.link(id), network.link(id));
        assert_eq!(restored.reroute_count(), 1);
        assert!(restored.integrity_issues().is_empty());
    }

    #[test]
    fn test_ports_require_subgraph() {
        let mut network = LinkNetwork::new();
        let result = network.add_subgraph_port(IoNodeKind::Input, "x", SlotType::any());
        assert_eq!(result, Err(ConnectionError::NotASubgraph));
    }

    #[test]
    fn test_relocate_floating_link() {
        let (mut network, a, b) = two_nodes();
        let id = network.connect_slots(a, 0, b, 0, None).unwrap();
        network.insert_reroute([4.0, 2.0], LinkSegment::Link(id)).unwrap();
        network.disconnect_output(a, 0).unwrap();
        let floating = network.floating_links().next().unwrap().id;

        network.relocate_floating_link(floating, SlotAddress::node(b, 1)).unwrap();

        assert!(network.node(b).unwrap().inputs[0].floating_links.is_empty());
        assert!(network.node(b).unwrap().inputs[1].floating_links.contains(&floating));
        assert!(network.integrity_issues().is_empty());
    }
}
