// SPDX-License-Identifier: MIT OR Apache-2.0
//! Existing link with its input end picked up.

use super::{
    input_type, materialize_port, port_accepts, reroute_accepts, target_parent, LinkSource, RenderLinkInfo,
    RenderLinkKind,
};
use crate::error::Result;
use crate::events::{ConnectorEvent, EventBus};
use nodeweave_graph::{
    ConnectionError, IoNodeKind, LinkId, LinkNetwork, NodeId, NodeRef, PortTarget, RerouteId, RerouteTarget,
    SlotAddress, SlotDirection,
};
use serde::Serialize;

/// An existing link being moved to a different input.
///
/// The origin and the reroutes up to the link's nearest reroute stay; only
/// the input end changes. The old link is replaced, not edited.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovingInputLink {
    /// Link being moved
    pub link: LinkId,
    /// The link's origin and nearest reroute
    pub source: LinkSource,
    /// Node the link ends at
    pub target_node: NodeId,
    /// Input the link ends at
    pub target_input: usize,
}

impl MovingInputLink {
    /// Pick up the input end of `link_id`
    pub fn new(network: &LinkNetwork, link_id: LinkId) -> std::result::Result<Self, ConnectionError> {
        let link = network.link(link_id).ok_or(ConnectionError::LinkNotFound(link_id))?;
        let (Some(origin), Some(target)) = (link.origin, link.target) else {
            return Err(ConnectionError::LinkNotFound(link_id));
        };
        let NodeRef::Node(target_node) = target.node else {
            return Err(ConnectionError::SlotNotFound {
                node: target.node,
                slot: target.slot,
                direction: SlotDirection::Input,
            });
        };
        let source = LinkSource::resolve(network, origin, SlotDirection::Output, link.parent_id)?;
        Ok(Self {
            link: link_id,
            source,
            target_node,
            target_input: target.slot,
        })
    }

    /// Event snapshot
    pub fn info(&self) -> RenderLinkInfo {
        self.source
            .info(RenderLinkKind::MovingInput, SlotDirection::Input, Some(self.link))
    }

    /// A compatible input that is neither on the origin node nor the one the
    /// link already ends at
    pub fn can_connect_to_input(&self, network: &LinkNetwork, node: NodeId, input: usize) -> bool {
        if Some(node) == self.source.address.node.node_id() {
            return false;
        }
        if node == self.target_node && input == self.target_input {
            return false;
        }
        input_type(network, node, input).is_some_and(|t| self.source.slot_type.is_compatible(t))
    }

    /// A compatible subgraph output, or the placeholder
    pub fn can_connect_to_subgraph_output(&self, network: &LinkNetwork, target: PortTarget) -> bool {
        port_accepts(network, IoNodeKind::Output, target, &self.source.slot_type)
    }

    /// Any reroute not upstream of the link's nearest reroute
    pub fn can_connect_to_reroute(&self, network: &LinkNetwork, reroute: RerouteId) -> bool {
        reroute_accepts(network, self.source.from_reroute, reroute)
    }

    /// Reconnect the link to another input
    pub fn connect_to_input(
        &self,
        network: &mut LinkNetwork,
        events: &mut EventBus,
        node: NodeId,
        input: usize,
    ) -> Result<Option<LinkId>> {
        let id = network.connect(
            self.source.address,
            SlotAddress::node(node, input),
            self.source.from_reroute,
        )?;
        self.finish(network, events)?;
        Ok(Some(id))
    }

    /// Reconnect the link to a subgraph output
    pub fn connect_to_subgraph_output(
        &self,
        network: &mut LinkNetwork,
        events: &mut EventBus,
        target: PortTarget,
    ) -> Result<Option<LinkId>> {
        let port = materialize_port(
            network,
            IoNodeKind::Output,
            target,
            &self.source.name,
            &self.source.slot_type,
        )?;
        let id = network.connect(
            self.source.address,
            SlotAddress::subgraph_output(port),
            self.source.from_reroute,
        )?;
        self.finish(network, events)?;
        Ok(Some(id))
    }

    /// Feed `target` from the link's origin, with `reroute` hung below the
    /// link's nearest reroute
    pub fn connect_to_reroute_input(
        &self,
        network: &mut LinkNetwork,
        events: &mut EventBus,
        reroute: RerouteId,
        target: &RerouteTarget,
    ) -> Result<Option<LinkId>> {
        let after = target_parent(network, target);
        network.set_reroute_parent(reroute, self.source.from_reroute)?;
        let id = network.connect(
            self.source.address,
            SlotAddress::node(target.node, target.input),
            after,
        )?;
        self.finish(network, events)?;
        Ok(Some(id))
    }

    /// Remove the link, optionally leaving its reroutes as a floating chain
    pub fn disconnect(&self, network: &mut LinkNetwork, keep_reroutes: bool) -> Result<bool> {
        if network.link(self.link).is_none() {
            return Ok(false);
        }
        network.disconnect_link(self.link, keep_reroutes.then_some(SlotDirection::Output))?;
        Ok(true)
    }

    fn finish(&self, network: &mut LinkNetwork, events: &mut EventBus) -> Result<()> {
        // Already gone when the new link replaced it at the same target
        if network.link(self.link).is_some() {
            network.disconnect_link(self.link, Some(SlotDirection::Output))?;
        }
        events.dispatch(&ConnectorEvent::InputMoved(self.info()));
        Ok(())
    }
}
