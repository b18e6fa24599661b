// SPDX-License-Identifier: MIT OR Apache-2.0
//! Links dragged from subgraph boundary ports.

use super::{
    emit_created, input_type, output_type, reroute_accepts, target_parent, LinkSource, RenderLinkInfo,
    RenderLinkKind,
};
use crate::error::Result;
use crate::events::{ConnectorEvent, EventBus};
use nodeweave_graph::{
    ConnectionError, LinkId, LinkNetwork, NodeId, NodeRef, RerouteId, RerouteTarget, SlotAddress, SlotDirection,
};
use serde::Serialize;

/// A link from a subgraph input port looking for a node input.
///
/// Also used when the input end of a link that starts at a subgraph input is
/// picked up; `existing` then names that link, which is replaced on a
/// successful drop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToInputFromIoNodeLink {
    /// Subgraph input port
    pub port: usize,
    /// The port, and the reroute the link leaves from
    pub source: LinkSource,
    /// Existing link being moved
    pub existing: Option<LinkId>,
    /// Where the existing link ends
    pub existing_target: Option<SlotAddress>,
}

impl ToInputFromIoNodeLink {
    /// Start a new link from subgraph input `port`
    pub fn new(
        network: &LinkNetwork,
        port: usize,
        from_reroute: Option<RerouteId>,
    ) -> std::result::Result<Self, ConnectionError> {
        let source = LinkSource::resolve(
            network,
            SlotAddress::subgraph_input(port),
            SlotDirection::Output,
            from_reroute,
        )?;
        Ok(Self {
            port,
            source,
            existing: None,
            existing_target: None,
        })
    }

    /// Pick up the input end of `link_id`, which starts at a subgraph input
    pub fn moving(network: &LinkNetwork, link_id: LinkId) -> std::result::Result<Self, ConnectionError> {
        let link = network.link(link_id).ok_or(ConnectionError::LinkNotFound(link_id))?;
        let Some(origin) = link.origin.filter(|o| o.node == NodeRef::SubgraphInput) else {
            return Err(ConnectionError::LinkNotFound(link_id));
        };
        let mut moving = Self::new(network, origin.slot, link.parent_id)?;
        moving.existing = Some(link_id);
        moving.existing_target = link.target;
        Ok(moving)
    }

    /// Event snapshot
    pub fn info(&self) -> RenderLinkInfo {
        self.source
            .info(RenderLinkKind::ToInputFromIoNode, SlotDirection::Input, self.existing)
    }

    /// Any compatible node input other than where the moved link ends
    pub fn can_connect_to_input(&self, network: &LinkNetwork, node: NodeId, input: usize) -> bool {
        self.existing_target != Some(SlotAddress::node(node, input))
            && input_type(network, node, input).is_some_and(|t| self.source.slot_type.is_compatible(t))
    }

    /// Any reroute not upstream of where the link leaves from
    pub fn can_connect_to_reroute(&self, network: &LinkNetwork, reroute: RerouteId) -> bool {
        reroute_accepts(network, self.source.from_reroute, reroute)
    }

    /// Create the link
    pub fn connect_to_input(
        &self,
        network: &mut LinkNetwork,
        events: &mut EventBus,
        node: NodeId,
        input: usize,
    ) -> Result<Option<LinkId>> {
        let id = network.connect_subgraph_input(self.port, node, input, self.source.from_reroute)?;
        self.finish(network, events, id)?;
        Ok(Some(id))
    }

    /// Feed `target` from the port through `reroute`
    pub fn connect_to_reroute_input(
        &self,
        network: &mut LinkNetwork,
        events: &mut EventBus,
        reroute: RerouteId,
        target: &RerouteTarget,
    ) -> Result<Option<LinkId>> {
        let after = target_parent(network, target);
        network.set_reroute_parent(reroute, self.source.from_reroute)?;
        let id = network.connect_subgraph_input(self.port, target.node, target.input, after)?;
        self.finish(network, events, id)?;
        Ok(Some(id))
    }

    /// Remove the moved link, if any
    pub fn disconnect(&self, network: &mut LinkNetwork, keep_reroutes: bool) -> Result<bool> {
        let Some(existing) = self.existing.filter(|id| network.link(*id).is_some()) else {
            return Ok(false);
        };
        network.disconnect_link(existing, keep_reroutes.then_some(SlotDirection::Output))?;
        Ok(true)
    }

    fn finish(&self, network: &mut LinkNetwork, events: &mut EventBus, id: LinkId) -> Result<()> {
        match self.existing {
            Some(existing) => {
                if network.link(existing).is_some() {
                    network.disconnect_link(existing, Some(SlotDirection::Output))?;
                }
                events.dispatch(&ConnectorEvent::InputMoved(self.info()));
            }
            None => emit_created(network, events, id),
        }
        Ok(())
    }
}

/// A new link from a subgraph output port looking for a node output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToOutputFromIoNodeLink {
    /// Subgraph output port
    pub port: usize,
    /// The port, and the reroute the link arrives through
    pub source: LinkSource,
}

impl ToOutputFromIoNodeLink {
    /// Start a new link from subgraph output `port`
    pub fn new(
        network: &LinkNetwork,
        port: usize,
        from_reroute: Option<RerouteId>,
    ) -> std::result::Result<Self, ConnectionError> {
        let source = LinkSource::resolve(
            network,
            SlotAddress::subgraph_output(port),
            SlotDirection::Input,
            from_reroute,
        )?;
        Ok(Self { port, source })
    }

    /// Event snapshot
    pub fn info(&self) -> RenderLinkInfo {
        self.source
            .info(RenderLinkKind::ToOutputFromIoNode, SlotDirection::Output, None)
    }

    /// Any compatible node output
    pub fn can_connect_to_output(&self, network: &LinkNetwork, node: NodeId, output: usize) -> bool {
        output_type(network, node, output).is_some_and(|t| t.is_compatible(&self.source.slot_type))
    }

    /// Any other reroute
    pub fn can_connect_to_reroute(&self, network: &LinkNetwork, reroute: RerouteId) -> bool {
        network.reroute(reroute).is_some() && self.source.from_reroute != Some(reroute)
    }

    /// Create the link
    pub fn connect_to_output(
        &self,
        network: &mut LinkNetwork,
        events: &mut EventBus,
        node: NodeId,
        output: usize,
    ) -> Result<Option<LinkId>> {
        let id = network.connect_to_subgraph_output(node, output, self.port, self.source.from_reroute)?;
        emit_created(network, events, id);
        Ok(Some(id))
    }

    /// Feed the port from `source` through `reroute`
    pub fn connect_to_reroute_output(
        &self,
        network: &mut LinkNetwork,
        events: &mut EventBus,
        reroute: RerouteId,
        source: SlotAddress,
    ) -> Result<Option<LinkId>> {
        let id = network.connect(source, self.source.address, Some(reroute))?;
        emit_created(network, events, id);
        Ok(Some(id))
    }
}
