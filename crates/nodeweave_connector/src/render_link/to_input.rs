// SPDX-License-Identifier: MIT OR Apache-2.0
//! New link dragged from a node output.

use super::{
    emit_created, input_type, materialize_port, port_accepts, reroute_accepts, target_parent, LinkSource,
    RenderLinkInfo, RenderLinkKind,
};
use crate::error::Result;
use crate::events::EventBus;
use nodeweave_graph::{
    ConnectionError, IoNodeKind, LinkId, LinkNetwork, NodeId, PortTarget, RerouteId, RerouteTarget, SlotAddress,
    SlotDirection,
};
use serde::Serialize;

/// A new link whose loose end looks for an input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToInputRenderLink {
    /// Node owning the output
    pub node: NodeId,
    /// Output index
    pub output: usize,
    /// The output, and the reroute the link leaves from
    pub source: LinkSource,
}

impl ToInputRenderLink {
    /// Start a link from `node`'s output `output`, optionally leaving from
    /// `from_reroute`
    pub fn new(
        network: &LinkNetwork,
        node: NodeId,
        output: usize,
        from_reroute: Option<RerouteId>,
    ) -> std::result::Result<Self, ConnectionError> {
        let source = LinkSource::resolve(
            network,
            SlotAddress::node(node, output),
            SlotDirection::Output,
            from_reroute,
        )?;
        Ok(Self { node, output, source })
    }

    /// Event snapshot
    pub fn info(&self) -> RenderLinkInfo {
        self.source.info(RenderLinkKind::ToInput, SlotDirection::Input, None)
    }

    /// A node input of a compatible type on another node
    pub fn can_connect_to_input(&self, network: &LinkNetwork, node: NodeId, input: usize) -> bool {
        node != self.node && input_type(network, node, input).is_some_and(|t| self.source.slot_type.is_compatible(t))
    }

    /// A compatible subgraph output, or the placeholder
    pub fn can_connect_to_subgraph_output(&self, network: &LinkNetwork, target: PortTarget) -> bool {
        port_accepts(network, IoNodeKind::Output, target, &self.source.slot_type)
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
        let id = network.connect_slots(self.node, self.output, node, input, self.source.from_reroute)?;
        emit_created(network, events, id);
        Ok(Some(id))
    }

    /// Create the link to a subgraph output, creating the port first when
    /// dropped on the placeholder
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
        let id = network.connect_to_subgraph_output(self.node, self.output, port, self.source.from_reroute)?;
        emit_created(network, events, id);
        Ok(Some(id))
    }

    /// Feed `target` from this output through `reroute`
    pub fn connect_to_reroute_input(
        &self,
        network: &mut LinkNetwork,
        events: &mut EventBus,
        reroute: RerouteId,
        target: &RerouteTarget,
    ) -> Result<Option<LinkId>> {
        let from_reroute = self.source.from_reroute;
        let floating_terminus = from_reroute
            .and_then(|id| network.reroute(id))
            .is_some_and(|r| r.floating == Some(SlotDirection::Output));
        let after = target_parent(network, target);

        network.set_reroute_parent(reroute, from_reroute)?;
        let id = network.connect_slots(self.node, self.output, target.node, target.input, after)?;

        if floating_terminus {
            let leftovers: Vec<LinkId> = from_reroute
                .and_then(|id| network.reroute(id))
                .map(|r| r.floating_link_ids.iter().copied().collect())
                .unwrap_or_default();
            for floating in leftovers {
                network.remove_floating_link(floating);
            }
        }

        emit_created(network, events, id);
        Ok(Some(id))
    }
}
