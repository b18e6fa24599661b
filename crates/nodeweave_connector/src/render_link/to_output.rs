// SPDX-License-Identifier: MIT OR Apache-2.0
//! New link dragged from a node input.

use super::{
    emit_created, materialize_port, output_type, port_accepts, LinkSource, RenderLink, RenderLinkInfo,
    RenderLinkKind, ToInputFromIoNodeLink, ToInputRenderLink,
};
use crate::error::Result;
use crate::events::EventBus;
use crate::repair;
use nodeweave_graph::{
    ConnectionError, IoNodeKind, LinkId, LinkNetwork, NodeId, PortTarget, RerouteId, SlotAddress, SlotDirection,
};
use serde::Serialize;

/// A new link whose loose end looks for an output.
///
/// With `resources_reroute` set the gesture started on a reroute, and a drop
/// on an output feeds every input downstream of that reroute from the new
/// output instead of creating a single link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToOutputRenderLink {
    /// Node owning the input
    pub node: NodeId,
    /// Input index
    pub input: usize,
    /// The input, and the reroute the link arrives through
    pub source: LinkSource,
    /// Drop re-sources everything downstream of `source.from_reroute`
    pub resources_reroute: bool,
}

impl ToOutputRenderLink {
    /// Start a link from `node`'s input `input`
    pub fn new(
        network: &LinkNetwork,
        node: NodeId,
        input: usize,
        from_reroute: Option<RerouteId>,
    ) -> std::result::Result<Self, ConnectionError> {
        let source = LinkSource::resolve(
            network,
            SlotAddress::node(node, input),
            SlotDirection::Input,
            from_reroute,
        )?;
        Ok(Self {
            node,
            input,
            source,
            resources_reroute: false,
        })
    }

    /// Start a gesture that re-sources `reroute`. `node` and `input` name one
    /// of the inputs it feeds and set the type the new output must produce.
    pub fn from_reroute(
        network: &LinkNetwork,
        node: NodeId,
        input: usize,
        reroute: RerouteId,
    ) -> std::result::Result<Self, ConnectionError> {
        let mut link = Self::new(network, node, input, Some(reroute))?;
        link.resources_reroute = true;
        Ok(link)
    }

    fn resourced_reroute(&self) -> Option<RerouteId> {
        self.source.from_reroute.filter(|_| self.resources_reroute)
    }

    /// Event snapshot
    pub fn info(&self) -> RenderLinkInfo {
        self.source.info(RenderLinkKind::ToOutput, SlotDirection::Output, None)
    }

    /// A node output of a compatible type on another node
    pub fn can_connect_to_output(&self, network: &LinkNetwork, node: NodeId, output: usize) -> bool {
        node != self.node
            && output_type(network, node, output).is_some_and(|t| t.is_compatible(&self.source.slot_type))
    }

    /// A compatible subgraph input, or the placeholder
    pub fn can_connect_to_subgraph_input(&self, network: &LinkNetwork, target: PortTarget) -> bool {
        port_accepts(network, IoNodeKind::Input, target, &self.source.slot_type)
    }

    /// Any other reroute, unless this gesture re-sources a reroute
    pub fn can_connect_to_reroute(&self, network: &LinkNetwork, reroute: RerouteId) -> bool {
        !self.resources_reroute && network.reroute(reroute).is_some() && self.source.from_reroute != Some(reroute)
    }

    /// Create the link, or re-source the reroute
    pub fn connect_to_output(
        &self,
        network: &mut LinkNetwork,
        events: &mut EventBus,
        node: NodeId,
        output: usize,
    ) -> Result<Option<LinkId>> {
        if let Some(reroute) = self.resourced_reroute() {
            let link = RenderLink::ToInput(ToInputRenderLink::new(network, node, output, None)?);
            repair::connect_output_to_reroute(network, events, reroute, &link)?;
            return Ok(None);
        }

        let id = network.connect_slots(node, output, self.node, self.input, self.source.from_reroute)?;
        emit_created(network, events, id);
        Ok(Some(id))
    }

    /// Create the link from a subgraph input, creating the port first when
    /// dropped on the placeholder
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

        if let Some(reroute) = self.resourced_reroute() {
            let link = RenderLink::ToInputFromIoNode(ToInputFromIoNodeLink::new(network, port, None)?);
            repair::connect_output_to_reroute(network, events, reroute, &link)?;
            return Ok(None);
        }

        let id = network.connect_subgraph_input(port, self.node, self.input, self.source.from_reroute)?;
        emit_created(network, events, id);
        Ok(Some(id))
    }

    /// Feed this input from `source` through `reroute`
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
