// SPDX-License-Identifier: MIT OR Apache-2.0
//! Subgraph boundary ports.
//!
//! Inside a subgraph, the input boundary node exposes the subgraph's inputs
//! as link sources, and the output boundary node exposes its outputs as link
//! targets. Each boundary node also shows an empty placeholder port which
//! materialises a new port when a link is dropped on it.

use crate::link::LinkId;
use crate::node::{NODE_SLOT_HEIGHT, NODE_TITLE_HEIGHT};
use crate::slot::SlotType;
use crate::Point;
use serde::{Deserialize, Serialize};

/// Which boundary node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IoNodeKind {
    /// Hosts the subgraph inputs (link sources)
    Input,
    /// Hosts the subgraph outputs (link targets)
    Output,
}

/// Port on a boundary node that a drop can land on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortTarget {
    /// An existing port
    Port(usize),
    /// The auto-expanding placeholder
    Empty,
}

/// A subgraph input or output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryPort {
    /// Port name
    pub name: String,
    /// Port type
    pub slot_type: SlotType,
    /// Links attached inside the subgraph. Output ports hold at most one.
    pub link_ids: Vec<LinkId>,
}

impl BoundaryPort {
    /// Create a new port
    pub fn new(name: impl Into<String>, slot_type: impl Into<SlotType>) -> Self {
        Self {
            name: name.into(),
            slot_type: slot_type.into(),
            link_ids: Vec::new(),
        }
    }
}

/// The boundary of a subgraph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubgraphIo {
    /// Position of the input boundary node
    pub input_node_pos: Point,
    /// Position of the output boundary node
    pub output_node_pos: Point,
    /// Subgraph inputs
    pub inputs: Vec<BoundaryPort>,
    /// Subgraph outputs
    pub outputs: Vec<BoundaryPort>,
}

impl SubgraphIo {
    /// Create an empty boundary
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a subgraph input
    pub fn with_input(mut self, name: impl Into<String>, slot_type: impl Into<SlotType>) -> Self {
        self.inputs.push(BoundaryPort::new(name, slot_type));
        self
    }

    /// Append a subgraph output
    pub fn with_output(mut self, name: impl Into<String>, slot_type: impl Into<SlotType>) -> Self {
        self.outputs.push(BoundaryPort::new(name, slot_type));
        self
    }

    /// Ports of one boundary node
    pub fn ports(&self, kind: IoNodeKind) -> &[BoundaryPort] {
        match kind {
            IoNodeKind::Input => &self.inputs,
            IoNodeKind::Output => &self.outputs,
        }
    }

    /// Mutable ports of one boundary node
    pub fn ports_mut(&mut self, kind: IoNodeKind) -> &mut Vec<BoundaryPort> {
        match kind {
            IoNodeKind::Input => &mut self.inputs,
            IoNodeKind::Output => &mut self.outputs,
        }
    }

    /// A single port
    pub fn port(&self, kind: IoNodeKind, index: usize) -> Option<&BoundaryPort> {
        self.ports(kind).get(index)
    }

    /// Canvas position of a port's connection point
    pub fn port_pos(&self, kind: IoNodeKind, index: usize) -> Point {
        let origin = match kind {
            IoNodeKind::Input => self.input_node_pos,
            IoNodeKind::Output => self.output_node_pos,
        };
        [
            origin[0],
            origin[1] + NODE_TITLE_HEIGHT + (index as f32 + 0.5) * NODE_SLOT_HEIGHT,
        ]
    }

    /// Materialise a new port, returning its index.
    ///
    /// The name is made unique among the node's ports.
    pub fn add_port(&mut self, kind: IoNodeKind, name: &str, slot_type: SlotType) -> usize {
        let ports = self.ports_mut(kind);
        let mut unique = name.to_owned();
        let mut suffix = 1;
        while ports.iter().any(|p| p.name == unique) {
            unique = format!("{name}_{suffix}");
            suffix += 1;
        }
        ports.push(BoundaryPort::new(unique, slot_type));
        ports.len() - 1
    }
}
