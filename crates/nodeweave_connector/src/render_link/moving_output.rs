// SPDX-License-Identifier: MIT OR Apache-2.0
//! Existing link with its output end picked up.

use super::{materialize_port, output_type, port_accepts, LinkSource, RenderLinkInfo, RenderLinkKind};
use crate::error::Result;
use crate::events::{ConnectorEvent, EventBus};
use crate::repair;
use nodeweave_graph::{
    ConnectionError, IoNodeKind, LinkId, LinkNetwork, NodeId, NodeRef, PortTarget, RerouteId, SlotAddress,
    SlotDirection,
};
use serde::Serialize;

/// An existing link being moved to a different output.
///
/// The target and the whole reroute chain stay; the reroute nearest the old
/// output is hidden while dragging and the loose end is drawn from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovingOutputLink {
    /// Link being moved
    pub link: LinkId,
    /// The link's target, drawn from the first reroute of its chain
    pub source: LinkSource,
    /// Current origin
    pub origin: SlotAddress,
    /// The link's nearest reroute
    pub parent_id: Option<RerouteId>,
}

impl MovingOutputLink {
    /// Pick up the output end of `link_id`
    pub fn new(network: &LinkNetwork, link_id: LinkId) -> std::result::Result<Self, ConnectionError> {
        let link = network.link(link_id).ok_or(ConnectionError::LinkNotFound(link_id))?;
        let (Some(origin), Some(target)) = (link.origin, link.target) else {
            return Err(ConnectionError::LinkNotFound(link_id));
        };
        let first_reroute = network.link_chain(link.parent_id).first().copied();
        let source = LinkSource::resolve(network, target, SlotDirection::Input, first_reroute)?;
        Ok(Self {
            link: link_id,
            source,
            origin,
            parent_id: link.parent_id,
        })
    }

    /// Event snapshot
    pub fn info(&self) -> RenderLinkInfo {
        self.source
            .info(RenderLinkKind::MovingOutput, SlotDirection::Output, Some(self.link))
    }

    /// Whether `node`'s output `output` is where the link starts now
    pub fn is_origin(&self, node: NodeId, output: usize) -> bool {
        self.origin == SlotAddress::node(node, output)
    }

    /// A compatible output that is neither on the target node nor the one the
    /// link already starts at
    pub fn can_connect_to_output(&self, network: &LinkNetwork, node: NodeId, output: usize) -> bool {
        if Some(node) == self.source.address.node.node_id() || self.is_origin(node, output) {
            return false;
        }
        output_type(network, node, output).is_some_and(|t| t.is_compatible(&self.source.slot_type))
    }

    /// A compatible subgraph input other than the current origin
    pub fn can_connect_to_subgraph_input(&self, network: &LinkNetwork, target: PortTarget) -> bool {
        if self.source.address.node == NodeRef::SubgraphOutput {
            return false;
        }
        if let PortTarget::Port(index) = target {
            if self.origin == SlotAddress::subgraph_input(index) {
                return false;
            }
        }
        port_accepts(network, IoNodeKind::Input, target, &self.source.slot_type)
    }

    /// Any reroute outside the link's own chain
    pub fn can_connect_to_reroute(&self, network: &LinkNetwork, reroute: RerouteId) -> bool {
        network.reroute(reroute).is_some() && !network.link_chain(self.parent_id).contains(&reroute)
    }

    /// Start the link at another output, keeping its reroutes
    pub fn connect_to_output(
        &self,
        network: &mut LinkNetwork,
        events: &mut EventBus,
        node: NodeId,
        output: usize,
    ) -> Result<Option<LinkId>> {
        let id = network.connect(SlotAddress::node(node, output), self.source.address, self.parent_id)?;
        events.dispatch(&ConnectorEvent::OutputMoved(self.info()));
        Ok(Some(id))
    }

    /// Start the link at a subgraph input, keeping its reroutes
    pub fn connect_to_subgraph_input(
        &self,
        network: &mut LinkNetwork,
        events: &mut EventBus,
        target: PortTarget,
    ) -> Result<Option<LinkId>> {
        let port = materialize_port(
            network,
            IoNodeKind::Input,
            target,
            &self.source.name,
            &self.source.slot_type,
        )?;
        let id = network.connect(SlotAddress::subgraph_input(port), self.source.address, self.parent_id)?;
        events.dispatch(&ConnectorEvent::OutputMoved(self.info()));
        Ok(Some(id))
    }

    /// Feed the target from `source` through `reroute`, releasing the old
    /// chain
    pub fn connect_to_reroute_output(
        &self,
        network: &mut LinkNetwork,
        events: &mut EventBus,
        reroute: RerouteId,
        source: SlotAddress,
    ) -> Result<Option<LinkId>> {
        let old_chain = repair::released_walk(network, network.link_chain(self.parent_id).into_iter().rev());
        let template = network.link(self.link).cloned();

        let id = network.connect(source, self.source.address, Some(reroute))?;

        for (reroute_id, _) in &old_chain {
            network.prune_reroute_links(*reroute_id);
        }
        if let Some(template) = template {
            repair::release_reroutes(network, &old_chain, Some(reroute), &template, SlotDirection::Output);
        }
        events.dispatch(&ConnectorEvent::OutputMoved(self.info()));
        Ok(Some(id))
    }

    /// Put the link back on its original output with no reroutes
    pub fn reconnect_without_reroutes(&self, network: &mut LinkNetwork) -> Result<Option<LinkId>> {
        let id = network.connect(self.origin, self.source.address, None)?;
        tracing::debug!(old = %self.link, new = %id, "Reconnected rejected output move without reroutes");
        Ok(Some(id))
    }

    /// Remove the link, optionally leaving its reroutes attached to the
    /// target as a floating chain
    pub fn disconnect(&self, network: &mut LinkNetwork, keep_reroutes: bool) -> Result<bool> {
        if network.link(self.link).is_none() {
            return Ok(false);
        }
        network.disconnect_link(self.link, keep_reroutes.then_some(SlotDirection::Input))?;
        Ok(true)
    }
}
