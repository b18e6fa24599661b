// SPDX-License-Identifier: MIT OR Apache-2.0
//! The link connector.
//!
//! A [`LinkConnector`] runs one drag gesture at a time. An entry point picks
//! up links and turns them into [`RenderLink`]s; a drop resolves the item
//! under the pointer and commits each render link to it; [`LinkConnector::reset`]
//! returns to idle.
//!
//! ```text
//! idle --move_*/drag_*--> connecting --drop_links--> connecting --reset--> idle
//! ```

use crate::error::{ConnectorError, Result};
use crate::events::{ConnectorEvent, EventBus, EventKind, ListenerId};
use crate::legacy::{ConnectingLink, LegacySink};
use crate::locator::ItemLocator;
use crate::render_link::{
    FloatingRenderLink, MovingInputLink, MovingOutputLink, RenderLink, RenderLinkInfo, ToInputFromIoNodeLink,
    ToInputRenderLink, ToOutputFromIoNodeLink, ToOutputRenderLink,
};
use crate::repair;
use crate::settings::ConnectorSettings;
use crate::state::ConnectorState;
use indexmap::IndexSet;
use nodeweave_graph::{
    ConnectionError, IoNodeKind, LinkId, LinkNetwork, LinkSegment, NodeId, NodeRef, Point, PortTarget, RerouteId,
    SlotDirection,
};
use serde::Serialize;
use std::fmt;
use std::ops::ControlFlow;

/// Copy of the connector's in-flight state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectorExport {
    /// Links being dragged
    pub render_links: Vec<RenderLink>,
    /// Existing links picked up by their input end
    pub input_links: Vec<LinkId>,
    /// Existing links picked up by their output end
    pub output_links: Vec<LinkId>,
    /// Floating links picked up
    pub floating_links: Vec<LinkId>,
    /// Reroutes hidden while dragging
    pub hidden_reroutes: Vec<RerouteId>,
    /// Drag state
    pub state: ConnectorState,
}

/// Drag-to-connect engine
pub struct LinkConnector {
    state: ConnectorState,
    events: EventBus,
    settings: ConnectorSettings,
    render_links: Vec<RenderLink>,
    input_links: Vec<LinkId>,
    output_links: Vec<LinkId>,
    floating_links: Vec<LinkId>,
    hidden_reroutes: IndexSet<RerouteId>,
    legacy_sink: Option<LegacySink>,
}

impl fmt::Debug for LinkConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkConnector")
            .field("state", &self.state)
            .field("render_links", &self.render_links)
            .field("events", &self.events)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Default for LinkConnector {
    fn default() -> Self {
        Self::new(ConnectorSettings::default())
    }
}

impl LinkConnector {
    /// Create an idle connector
    pub fn new(settings: ConnectorSettings) -> Self {
        Self {
            state: ConnectorState::default(),
            events: EventBus::new(),
            settings,
            render_links: Vec::new(),
            input_links: Vec::new(),
            output_links: Vec::new(),
            floating_links: Vec::new(),
            hidden_reroutes: IndexSet::new(),
            legacy_sink: None,
        }
    }

    /// Publish the flat link list to `sink` whenever a gesture starts or the
    /// connector resets
    pub fn with_legacy_sink(mut self, sink: impl FnMut(Vec<ConnectingLink>) + 'static) -> Self {
        self.legacy_sink = Some(Box::new(sink));
        self
    }

    /// Drag state
    pub fn state(&self) -> &ConnectorState {
        &self.state
    }

    /// Whether a gesture is in progress
    pub fn is_connecting(&self) -> bool {
        self.state.is_connecting()
    }

    /// Settings in use
    pub fn settings(&self) -> &ConnectorSettings {
        &self.settings
    }

    /// Replace the settings
    pub fn set_settings(&mut self, settings: ConnectorSettings) {
        self.settings = settings;
    }

    /// Links being dragged
    pub fn render_links(&self) -> &[RenderLink] {
        &self.render_links
    }

    /// Reroutes hidden while dragging
    pub fn hidden_reroutes(&self) -> impl Iterator<Item = RerouteId> + '_ {
        self.hidden_reroutes.iter().copied()
    }

    /// Event bus
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Mutable event bus, for subscribing
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Listen for `kind` until the next reset
    pub fn listen_until_reset(
        &mut self,
        kind: EventKind,
        callback: impl FnMut(&ConnectorEvent) -> ControlFlow<()> + 'static,
    ) -> ListenerId {
        self.events.listen_until_reset(kind, callback)
    }

    /// Set the position the loose ends snap to
    pub fn set_snap_links_pos(&mut self, pos: Option<Point>) {
        self.state.snap_links_pos = pos;
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.is_connecting() {
            return Err(ConnectorError::AlreadyDragging);
        }
        Ok(())
    }

    /// Pick up the link (or floating link) on a node input
    pub fn move_input_link(&mut self, network: &mut LinkNetwork, node: NodeId, input: usize) -> Result<()> {
        self.ensure_idle()?;
        let slot = network
            .node(node)
            .ok_or(ConnectionError::NodeNotFound(node))?
            .input(input)
            .ok_or(ConnectionError::SlotNotFound {
                node: NodeRef::Node(node),
                slot: input,
                direction: SlotDirection::Input,
            })?;
        let link_id = slot.link;
        let floating_id = slot.floating_links.first().copied();

        match (link_id, floating_id) {
            (Some(link_id), _) => {
                let from_io_node = network
                    .link(link_id)
                    .and_then(|l| l.origin)
                    .is_some_and(|o| o.node == NodeRef::SubgraphInput);
                let built = if from_io_node {
                    ToInputFromIoNodeLink::moving(network, link_id).map(RenderLink::ToInputFromIoNode)
                } else {
                    MovingInputLink::new(network, link_id).map(RenderLink::MovingInput)
                };
                let render_link = match built {
                    Ok(render_link) => render_link,
                    Err(err) => {
                        tracing::warn!(%err, "Cannot move input link");
                        return Ok(());
                    }
                };
                if !self.events.dispatch(&ConnectorEvent::BeforeMoveInput(render_link.info())) {
                    return Ok(());
                }
                if let Some(link) = network.link_mut(link_id) {
                    link.dragging = true;
                }
                self.input_links.push(link_id);
                self.render_links.push(render_link);
            }
            (None, Some(floating_id)) => {
                let render_link = match FloatingRenderLink::new(network, floating_id) {
                    Ok(render_link) => RenderLink::Floating(render_link),
                    Err(err) => {
                        tracing::warn!(%err, "Cannot move floating link");
                        return Ok(());
                    }
                };
                if !self.events.dispatch(&ConnectorEvent::BeforeMoveInput(render_link.info())) {
                    return Ok(());
                }
                if let Some(link) = network.floating_link_mut(floating_id) {
                    link.dragging = true;
                }
                self.floating_links.push(floating_id);
                self.render_links.push(render_link);
            }
            (None, None) => {
                tracing::debug!(?node, input, "Input has no link to move");
                return Ok(());
            }
        }

        self.state.begin(SlotDirection::Input, true, false);
        self.publish_legacy();
        Ok(())
    }

    /// Pick up every link (and floating link) leaving a node output
    pub fn move_output_link(&mut self, network: &mut LinkNetwork, node: NodeId, output: usize) -> Result<()> {
        self.ensure_idle()?;
        let slot = network
            .node(node)
            .ok_or(ConnectionError::NodeNotFound(node))?
            .output(output)
            .ok_or(ConnectionError::SlotNotFound {
                node: NodeRef::Node(node),
                slot: output,
                direction: SlotDirection::Output,
            })?;
        let floating_ids: Vec<LinkId> = slot.floating_links.iter().copied().collect();
        let link_ids = slot.links.clone();

        for floating_id in floating_ids {
            let render_link = match FloatingRenderLink::new(network, floating_id) {
                Ok(render_link) => RenderLink::Floating(render_link),
                Err(err) => {
                    tracing::warn!(%err, "Skipping unusable floating link");
                    continue;
                }
            };
            if !self.events.dispatch(&ConnectorEvent::BeforeMoveOutput(render_link.info())) {
                continue;
            }
            if let Some(link) = network.floating_link_mut(floating_id) {
                link.dragging = true;
            }
            self.floating_links.push(floating_id);
            self.render_links.push(render_link);
        }

        for link_id in link_ids {
            let render_link = match MovingOutputLink::new(network, link_id) {
                Ok(render_link) => render_link,
                Err(err) => {
                    tracing::warn!(%err, "Skipping unusable output link");
                    continue;
                }
            };
            let info = render_link.info();
            if !self.events.dispatch(&ConnectorEvent::BeforeMoveOutput(info)) {
                continue;
            }

            match render_link.source.from_reroute {
                Some(first) => {
                    if let Some(reroute) = network.reroute_mut(first) {
                        reroute.dragging = true;
                    }
                    self.hidden_reroutes.insert(first);
                }
                None => {
                    if let Some(link) = network.link_mut(link_id) {
                        link.dragging = true;
                    }
                }
            }
            self.output_links.push(link_id);
            self.render_links.push(RenderLink::MovingOutput(render_link));
        }

        if self.render_links.is_empty() {
            tracing::debug!(?node, output, "Output has no link to move");
            return Ok(());
        }

        self.state.begin(SlotDirection::Output, true, true);
        self.publish_legacy();
        Ok(())
    }

    /// Start a new link from a node output
    pub fn drag_new_from_output(
        &mut self,
        network: &LinkNetwork,
        node: NodeId,
        output: usize,
        from_reroute: Option<RerouteId>,
    ) -> Result<()> {
        self.ensure_idle()?;
        let render_link = ToInputRenderLink::new(network, node, output, from_reroute)?;
        self.start(RenderLink::ToInput(render_link));
        Ok(())
    }

    /// Start a new link from a node input
    pub fn drag_new_from_input(
        &mut self,
        network: &LinkNetwork,
        node: NodeId,
        input: usize,
        from_reroute: Option<RerouteId>,
    ) -> Result<()> {
        self.ensure_idle()?;
        let render_link = ToOutputRenderLink::new(network, node, input, from_reroute)?;
        self.start(RenderLink::ToOutput(render_link));
        Ok(())
    }

    /// Start a new link from a subgraph input port
    pub fn drag_new_from_subgraph_input(
        &mut self,
        network: &LinkNetwork,
        port: usize,
        from_reroute: Option<RerouteId>,
    ) -> Result<()> {
        self.ensure_idle()?;
        let render_link = ToInputFromIoNodeLink::new(network, port, from_reroute)?;
        self.start(RenderLink::ToInputFromIoNode(render_link));
        Ok(())
    }

    /// Start a new link from a subgraph output port
    pub fn drag_new_from_subgraph_output(
        &mut self,
        network: &LinkNetwork,
        port: usize,
        from_reroute: Option<RerouteId>,
    ) -> Result<()> {
        self.ensure_idle()?;
        let render_link = ToOutputFromIoNodeLink::new(network, port, from_reroute)?;
        self.start(RenderLink::ToOutputFromIoNode(render_link));
        Ok(())
    }

    /// Start a new input-seeking link that leaves from a reroute, fed by the
    /// reroute's source output
    pub fn drag_from_reroute(&mut self, network: &LinkNetwork, reroute: RerouteId) -> Result<()> {
        self.ensure_idle()?;
        let current = network.reroute(reroute).ok_or(ConnectionError::RerouteNotFound(reroute))?;
        let link = current
            .first_link_id()
            .and_then(|id| network.link(id))
            .or_else(|| current.first_floating_link_id().and_then(|id| network.floating_link(id)));
        let Some(link) = link else {
            tracing::warn!(%reroute, "No link found for reroute");
            return Ok(());
        };
        let Some(origin) = link.origin else {
            tracing::warn!(%reroute, "No output found for reroute");
            return Ok(());
        };

        let built = match origin.node {
            NodeRef::Node(node) => {
                ToInputRenderLink::new(network, node, origin.slot, Some(reroute)).map(RenderLink::ToInput)
            }
            NodeRef::SubgraphInput => {
                ToInputFromIoNodeLink::new(network, origin.slot, Some(reroute)).map(RenderLink::ToInputFromIoNode)
            }
            NodeRef::SubgraphOutput => Err(ConnectionError::SlotNotFound {
                node: origin.node,
                slot: origin.slot,
                direction: SlotDirection::Output,
            }),
        };
        match built {
            Ok(render_link) => self.start(render_link),
            Err(err) => tracing::warn!(%err, %reroute, "Cannot drag from reroute"),
        }
        Ok(())
    }

    /// Start an output-seeking gesture from a reroute. Dropping it on an
    /// output re-sources everything downstream of the reroute.
    pub fn drag_from_reroute_to_output(&mut self, network: &LinkNetwork, reroute: RerouteId) -> Result<()> {
        self.ensure_idle()?;
        let current = network.reroute(reroute).ok_or(ConnectionError::RerouteNotFound(reroute))?;
        let link = current
            .first_link_id()
            .and_then(|id| network.link(id))
            .or_else(|| current.first_floating_link_id().and_then(|id| network.floating_link(id)));
        let Some(target) = link.and_then(|l| l.target) else {
            tracing::warn!(%reroute, "No input found for reroute");
            return Ok(());
        };

        let built = match target.node {
            NodeRef::Node(node) => {
                ToOutputRenderLink::from_reroute(network, node, target.slot, reroute).map(RenderLink::ToOutput)
            }
            NodeRef::SubgraphOutput => ToOutputFromIoNodeLink::new(network, target.slot, Some(reroute))
                .map(RenderLink::ToOutputFromIoNode),
            NodeRef::SubgraphInput => Err(ConnectionError::SlotNotFound {
                node: target.node,
                slot: target.slot,
                direction: SlotDirection::Input,
            }),
        };
        match built {
            Ok(render_link) => self.start(render_link),
            Err(err) => tracing::warn!(%err, %reroute, "Cannot drag from reroute"),
        }
        Ok(())
    }

    /// Start a new input-seeking link from the output feeding a link
    /// segment, leaving from the segment's reroute
    pub fn drag_from_link_segment(&mut self, network: &LinkNetwork, segment: LinkSegment) -> Result<()> {
        self.ensure_idle()?;
        let (origin, parent) = match segment {
            LinkSegment::Link(id) => {
                let link = network.link(id).ok_or(ConnectionError::LinkNotFound(id))?;
                (link.origin, link.parent_id)
            }
            LinkSegment::FloatingLink(id) => {
                let link = network.floating_link(id).ok_or(ConnectionError::LinkNotFound(id))?;
                (link.origin, link.parent_id)
            }
            LinkSegment::Reroute(id) => {
                let reroute = network.reroute(id).ok_or(ConnectionError::RerouteNotFound(id))?;
                (network.find_source_output(id), reroute.parent_id)
            }
        };
        let Some(origin) = origin else {
            tracing::debug!(?segment, "Segment has no output to drag from");
            return Ok(());
        };

        let render_link = match origin.node {
            NodeRef::Node(node) => RenderLink::ToInput(ToInputRenderLink::new(network, node, origin.slot, parent)?),
            NodeRef::SubgraphInput => {
                RenderLink::ToInputFromIoNode(ToInputFromIoNodeLink::new(network, origin.slot, parent)?)
            }
            NodeRef::SubgraphOutput => return Ok(()),
        };
        self.start(render_link);
        Ok(())
    }

    fn start(&mut self, render_link: RenderLink) {
        let to_type = render_link.to_type();
        tracing::debug!(kind = ?render_link.kind(), %to_type, "Started dragging a new link");
        self.render_links.push(render_link);
        self.state.begin(to_type, false, false);
        self.publish_legacy();
    }

    /// Resolve a drop at `pos` and commit the dragged links to it.
    ///
    /// The connector stays in its connecting state; call
    /// [`LinkConnector::reset`] afterwards, or use [`LinkConnector::release`].
    pub fn drop_links(&mut self, network: &mut LinkNetwork, locator: &dyn ItemLocator, pos: Point) -> Result<()> {
        let render_links = self.render_link_infos();
        let proceed = self.events.dispatch(&ConnectorEvent::BeforeDropLinks {
            render_links: render_links.clone(),
            pos,
        });
        if !proceed {
            tracing::debug!("Drop cancelled");
            return Ok(());
        }

        let result = self.resolve_drop(network, locator, pos);
        self.events
            .dispatch(&ConnectorEvent::AfterDropLinks { render_links, pos });
        self.publish_legacy();
        result
    }

    /// Drop and then reset
    pub fn release(&mut self, network: &mut LinkNetwork, locator: &dyn ItemLocator, pos: Point) -> Result<()> {
        let result = self.drop_links(network, locator, pos);
        self.reset(network, false);
        result
    }

    fn resolve_drop(&mut self, network: &mut LinkNetwork, locator: &dyn ItemLocator, pos: Point) -> Result<()> {
        if let Some(kind) = locator.io_node_at(pos) {
            self.drop_on_io_node(network, locator, kind, pos);
            return Ok(());
        }
        if let Some(node) = locator.node_at(pos) {
            self.drop_on_node(network, locator, node, pos);
            return Ok(());
        }
        if let Some(reroute) = locator.reroute_at(pos) {
            if self.is_reroute_valid_drop(network, reroute) {
                return self.drop_on_reroute(network, reroute, pos);
            }
        }
        self.drop_on_nothing(network, pos);
        Ok(())
    }

    /// Commit the dragged links to a subgraph boundary node.
    ///
    /// Dropping several links on the placeholder creates one port and keeps
    /// using it while consecutive links share the same type.
    pub fn drop_on_io_node(&mut self, network: &mut LinkNetwork, locator: &dyn ItemLocator, kind: IoNodeKind, pos: Point) {
        let expected = match kind {
            IoNodeKind::Input => SlotDirection::Output,
            IoNodeKind::Output => SlotDirection::Input,
        };
        if self.state.connecting_to != Some(expected) {
            tracing::error!(?kind, connecting_to = ?self.state.connecting_to, "Invalid drop on subgraph boundary");
            return;
        }
        let Some(target) = locator.io_port_at(kind, pos) else {
            tracing::debug!(?kind, "No port under the pointer");
            self.drop_on_nothing(network, pos);
            return;
        };

        let Self {
            render_links, events, ..
        } = self;
        let mut current = target;
        for (index, link) in render_links.iter().enumerate() {
            let legal = match kind {
                IoNodeKind::Input => link.can_connect_to_subgraph_input(network, current),
                IoNodeKind::Output => link.can_connect_to_subgraph_output(network, current),
            };
            if !legal {
                tracing::warn!(from_type = %link.from_type(), ?current, "Invalid connection type");
                continue;
            }
            let result = match kind {
                IoNodeKind::Input => link.connect_to_subgraph_input(network, events, current),
                IoNodeKind::Output => link.connect_to_subgraph_output(network, events, current),
            };
            if let Err(err) = result {
                tracing::warn!(%err, "Failed to connect to subgraph port");
                continue;
            }

            if target == PortTarget::Empty {
                let created = network.io().and_then(|io| io.ports(kind).len().checked_sub(1));
                let next_same_type = render_links
                    .get(index + 1)
                    .is_some_and(|next| next.from_type() == link.from_type());
                current = match created {
                    Some(port) if next_same_type => PortTarget::Port(port),
                    _ => PortTarget::Empty,
                };
            }
        }
    }

    /// Commit the dragged links to a node, using the slot under the pointer
    /// or, failing that, the first slot of a matching type
    pub fn drop_on_node(&mut self, network: &mut LinkNetwork, locator: &dyn ItemLocator, node: NodeId, pos: Point) {
        if self.render_links.iter().all(|l| l.anchor_node() == Some(node)) {
            tracing::debug!(?node, "Ignoring drop back onto the starting node");
            return;
        }

        match self.state.connecting_to {
            Some(SlotDirection::Output) => match locator.output_at(node, pos) {
                Some(output) => self.drop_on_output(network, node, output),
                None => self.connect_to_node(network, node, pos),
            },
            Some(SlotDirection::Input) => match locator.input_at(node, pos) {
                Some(input) => self.drop_on_input(network, node, input),
                None => self.connect_to_node(network, node, pos),
            },
            None => {}
        }
    }

    /// Commit a drop on a node's body
    pub fn connect_to_node(&mut self, network: &mut LinkNetwork, node: NodeId, pos: Point) {
        if !self.settings.allow_drop_on_node_body {
            tracing::debug!(?node, "Dropping on node bodies is disabled");
            return;
        }
        if !self.events.dispatch(&ConnectorEvent::DroppedOnNode { node, pos }) {
            return;
        }
        let Some(first) = self.render_links.first() else {
            return;
        };
        let Some(target) = network.node(node) else {
            tracing::warn!(?node, "Dropped on a missing node");
            return;
        };

        let slot_type = first.from_type();
        match self.state.connecting_to {
            Some(SlotDirection::Output) => match target.find_output_by_type(slot_type) {
                Some(output) => self.drop_on_output(network, node, output),
                None => tracing::warn!(%slot_type, "Could not find slot for link type"),
            },
            Some(SlotDirection::Input) => match target.find_input_by_type(slot_type) {
                Some(input) => self.drop_on_input(network, node, input),
                None => tracing::warn!(%slot_type, "Could not find slot for link type"),
            },
            None => {}
        }
    }

    fn drop_on_input(&mut self, network: &mut LinkNetwork, node: NodeId, input: usize) {
        let Self {
            render_links, events, ..
        } = self;
        for link in render_links.iter() {
            if !link.can_connect_to_input(network, node, input) {
                continue;
            }
            if let Err(err) = link.connect_to_input(network, events, node, input) {
                tracing::warn!(%err, "Failed to connect link to input");
            }
        }
    }

    fn drop_on_output(&mut self, network: &mut LinkNetwork, node: NodeId, output: usize) {
        let Self {
            render_links,
            events,
            settings,
            ..
        } = self;
        for link in render_links.iter() {
            if !link.can_connect_to_output(network, node, output) {
                if let RenderLink::MovingOutput(moving) = link {
                    let fallback = settings.reconnect_rejected_output_moves
                        && moving.parent_id.is_some()
                        && !moving.is_origin(node, output);
                    if fallback {
                        if let Err(err) = moving.reconnect_without_reroutes(network) {
                            tracing::warn!(%err, "Failed to reconnect rejected link");
                        }
                    }
                }
                continue;
            }
            if let Err(err) = link.connect_to_output(network, events, node, output) {
                tracing::warn!(%err, "Failed to connect link to output");
            }
        }
    }

    /// Commit the dragged links to a reroute
    pub fn drop_on_reroute(&mut self, network: &mut LinkNetwork, reroute: RerouteId, pos: Point) -> Result<()> {
        if !self.events.dispatch(&ConnectorEvent::DroppedOnReroute { reroute, pos }) {
            return Ok(());
        }

        match self.state.connecting_to {
            Some(SlotDirection::Input) => {
                let [link] = self.render_links.as_slice() else {
                    return Err(ConnectorError::TooManyLinksForReroute(self.render_links.len()));
                };
                repair::connect_output_to_reroute(network, &mut self.events, reroute, link)
            }
            Some(SlotDirection::Output) => {
                let Some(source) = network.find_source_output(reroute) else {
                    tracing::warn!(%reroute, "No output found for reroute");
                    return Ok(());
                };
                let Self {
                    render_links, events, ..
                } = self;
                for link in render_links.iter() {
                    if link.to_type() != SlotDirection::Output {
                        continue;
                    }
                    if !link.can_connect_to_reroute(network, reroute) || !link.can_connect_to_source(network, source) {
                        continue;
                    }
                    if let Err(err) = link.connect_to_reroute_output(network, events, reroute, source) {
                        tracing::warn!(%err, %reroute, "Failed to connect link through reroute");
                    }
                }
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Handle a drop on empty canvas: existing links being moved are
    /// disconnected
    pub fn drop_on_nothing(&mut self, network: &mut LinkNetwork, pos: Point) {
        if !self.events.dispatch(&ConnectorEvent::DroppedOnCanvas { pos }) {
            return;
        }
        self.disconnect_links(network);
    }

    /// Disconnect every existing link being dragged
    pub fn disconnect_links(&mut self, network: &mut LinkNetwork) {
        let keep_reroutes = self.settings.keep_reroutes_on_disconnect;
        for link in &self.render_links {
            match link.disconnect(network, keep_reroutes) {
                Ok(true) => tracing::debug!(link = ?link.link(), "Disconnected dragged link"),
                Ok(false) => {}
                Err(err) => tracing::warn!(%err, "Failed to disconnect dragged link"),
            }
        }
    }

    /// Whether any dragged link can connect to a node input
    pub fn is_input_valid_drop(&self, network: &LinkNetwork, node: NodeId, input: usize) -> bool {
        self.render_links
            .iter()
            .any(|l| l.can_connect_to_input(network, node, input))
    }

    /// Whether any dragged link can connect to some slot of a node
    pub fn is_node_valid_drop(&self, network: &LinkNetwork, node: NodeId) -> bool {
        let Some(target) = network.node(node) else {
            return false;
        };
        match self.state.connecting_to {
            Some(SlotDirection::Output) => (0..target.outputs.len()).any(|output| {
                self.render_links
                    .iter()
                    .any(|l| l.can_connect_to_output(network, node, output))
            }),
            Some(SlotDirection::Input) => {
                (0..target.inputs.len()).any(|input| self.is_input_valid_drop(network, node, input))
            }
            None => false,
        }
    }

    /// Whether dropping on a reroute would change anything
    pub fn is_reroute_valid_drop(&self, network: &LinkNetwork, reroute: RerouteId) -> bool {
        match self.state.connecting_to {
            Some(SlotDirection::Input) => {
                let targets = network.find_target_inputs(reroute);
                self.render_links.iter().any(|link| {
                    link.can_connect_to_reroute(network, reroute)
                        && targets
                            .iter()
                            .any(|t| repair::can_connect_input_link_to_reroute(link, network, t, reroute))
                })
            }
            Some(SlotDirection::Output) => {
                let Some(source) = network.find_source_output(reroute) else {
                    return false;
                };
                self.render_links.iter().any(|link| {
                    link.to_type() == SlotDirection::Output
                        && link.can_connect_to_reroute(network, reroute)
                        && link.can_connect_to_source(network, source)
                })
            }
            None => false,
        }
    }

    /// Whether any dragged link can connect to a subgraph input port
    pub fn is_subgraph_input_valid_drop(&self, network: &LinkNetwork, target: PortTarget) -> bool {
        self.state.connecting_to == Some(SlotDirection::Output)
            && self
                .render_links
                .iter()
                .any(|l| l.can_connect_to_subgraph_input(network, target))
    }

    /// Whether any dragged link can connect to a subgraph output port
    pub fn is_subgraph_output_valid_drop(&self, network: &LinkNetwork, target: PortTarget) -> bool {
        self.state.connecting_to == Some(SlotDirection::Input)
            && self
                .render_links
                .iter()
                .any(|l| l.can_connect_to_subgraph_output(network, target))
    }

    /// Copy of the in-flight state
    pub fn export(&self) -> ConnectorExport {
        ConnectorExport {
            render_links: self.render_links.clone(),
            input_links: self.input_links.clone(),
            output_links: self.output_links.clone(),
            floating_links: self.floating_links.clone(),
            hidden_reroutes: self.hidden_reroutes.iter().copied().collect(),
            state: self.state,
        }
    }

    /// Return to idle, clearing every drag flag set by the gesture.
    ///
    /// Does nothing when already idle unless `force` is set. Reset listeners
    /// cannot keep a gesture alive.
    pub fn reset(&mut self, network: &mut LinkNetwork, force: bool) {
        self.events.dispatch(&ConnectorEvent::Reset { force });
        if !force && !self.is_connecting() {
            return;
        }

        for id in self.input_links.drain(..).chain(self.output_links.drain(..)) {
            if let Some(link) = network.link_mut(id) {
                link.dragging = false;
            }
        }
        for id in self.floating_links.drain(..) {
            if let Some(link) = network.floating_link_mut(id) {
                link.dragging = false;
            }
        }
        for id in self.hidden_reroutes.drain(..) {
            if let Some(reroute) = network.reroute_mut(id) {
                reroute.dragging = false;
            }
        }

        self.render_links.clear();
        self.state = ConnectorState::default();
        if let Some(sink) = self.legacy_sink.as_mut() {
            sink(Vec::new());
        }
        tracing::debug!(force, "Connector reset");
    }

    fn render_link_infos(&self) -> Vec<RenderLinkInfo> {
        self.render_links.iter().map(RenderLink::info).collect()
    }

    fn publish_legacy(&mut self) {
        let Some(sink) = self.legacy_sink.as_mut() else {
            return;
        };
        let links = self
            .render_links
            .iter()
            .map(|link| ConnectingLink {
                node: link.from().node,
                slot: link.from().slot,
                direction: match link {
                    RenderLink::Floating(floating) => floating.to_type,
                    _ => link.to_type().opposite(),
                },
                slot_type: link.from_type().clone(),
                pos: link.from_pos(),
                after_reroute_id: link.after_reroute(),
            })
            .collect();
        sink(links);
    }
}
