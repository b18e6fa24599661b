// SPDX-License-Identifier: MIT OR Apache-2.0
//! Floating link with its attached end picked up.

use super::{input_type, output_type, LinkSource, RenderLinkInfo, RenderLinkKind};
use crate::error::Result;
use crate::events::{ConnectorEvent, EventBus};
use nodeweave_graph::{ConnectionError, LinkId, LinkNetwork, NodeId, SlotAddress, SlotDirection};
use serde::Serialize;

/// A floating link whose attached end is moved to another slot.
///
/// The loose end is drawn from the link's nearest reroute. Only a slot of
/// the same direction as the attached end is a legal target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloatingRenderLink {
    /// Floating link being moved
    pub link: LinkId,
    /// Direction of the attached end
    pub to_type: SlotDirection,
    /// The attached end, drawn from the nearest reroute
    pub source: LinkSource,
}

impl FloatingRenderLink {
    /// Pick up the attached end of floating link `link_id`
    pub fn new(network: &LinkNetwork, link_id: LinkId) -> std::result::Result<Self, ConnectionError> {
        let link = network
            .floating_link(link_id)
            .ok_or(ConnectionError::LinkNotFound(link_id))?;
        let (to_type, attached) = match (link.origin, link.target) {
            (None, Some(target)) => (SlotDirection::Input, target),
            (Some(origin), None) => (SlotDirection::Output, origin),
            _ => return Err(ConnectionError::LinkNotFound(link_id)),
        };
        let reroute = link.parent_id.ok_or(ConnectionError::LinkNotFound(link_id))?;
        let source = LinkSource::resolve(network, attached, to_type, Some(reroute))?;
        Ok(Self {
            link: link_id,
            to_type,
            source,
        })
    }

    /// Event snapshot
    pub fn info(&self) -> RenderLinkInfo {
        self.source.info(RenderLinkKind::Floating, self.to_type, Some(self.link))
    }

    /// Another compatible input, when the attached end is an input
    pub fn can_connect_to_input(&self, network: &LinkNetwork, node: NodeId, input: usize) -> bool {
        self.to_type == SlotDirection::Input
            && self.source.address != SlotAddress::node(node, input)
            && input_type(network, node, input).is_some_and(|t| t.is_compatible(&self.source.slot_type))
    }

    /// Another compatible output, when the attached end is an output
    pub fn can_connect_to_output(&self, network: &LinkNetwork, node: NodeId, output: usize) -> bool {
        self.to_type == SlotDirection::Output
            && self.source.address != SlotAddress::node(node, output)
            && output_type(network, node, output).is_some_and(|t| t.is_compatible(&self.source.slot_type))
    }

    /// Move the attached end to an input, clearing whatever the input held
    pub fn connect_to_input(
        &self,
        network: &mut LinkNetwork,
        events: &mut EventBus,
        node: NodeId,
        input: usize,
    ) -> Result<Option<LinkId>> {
        network.disconnect_input(node, input, false)?;
        network.relocate_floating_link(self.link, SlotAddress::node(node, input))?;
        events.dispatch(&ConnectorEvent::InputMoved(self.info()));
        Ok(Some(self.link))
    }

    /// Move the attached end to an output
    pub fn connect_to_output(
        &self,
        network: &mut LinkNetwork,
        events: &mut EventBus,
        node: NodeId,
        output: usize,
    ) -> Result<Option<LinkId>> {
        network.relocate_floating_link(self.link, SlotAddress::node(node, output))?;
        events.dispatch(&ConnectorEvent::OutputMoved(self.info()));
        Ok(Some(self.link))
    }

    /// Remove the floating link
    pub fn disconnect(&self, network: &mut LinkNetwork) -> bool {
        network.remove_floating_link(self.link).is_some()
    }
}
