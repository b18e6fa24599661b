// SPDX-License-Identifier: MIT OR Apache-2.0
//! Link network model for node-graph editors.
//!
//! This crate holds the passive data model that the link connector edits:
//! - Nodes with typed input/output slots
//! - Links, including floating links missing one end
//! - Reroutes chaining links through waypoints
//! - Subgraph boundary ports
//!
//! ## Architecture
//!
//! [`LinkNetwork`] is an arena keyed by ids. Every reference is stored on both
//! sides (slot and link, link and reroute), and every mutation goes through
//! the network so both sides stay in step. [`LinkNetwork::integrity_issues`]
//! verifies that they do.

pub mod node;
pub mod slot;
pub mod link;
pub mod reroute;
pub mod subgraph;
pub mod network;
pub mod chain;
pub mod integrity;

/// Canvas-space position
pub type Point = [f32; 2];

pub use node::{Node, NodeId};
pub use slot::{InputSlot, OutputSlot, Slot, SlotDirection, SlotType};
pub use link::{Link, LinkId, LinkSegment, NodeRef, SlotAddress};
pub use reroute::{Reroute, RerouteId};
pub use subgraph::{BoundaryPort, IoNodeKind, PortTarget, SubgraphIo};
pub use network::{ConnectionError, LinkNetwork, Result};
pub use chain::RerouteTarget;
pub use integrity::IntegrityIssue;
