// SPDX-License-Identifier: MIT OR Apache-2.0
//! Hit-testing seam used when links are dropped.

use nodeweave_graph::{IoNodeKind, NodeId, Point, PortTarget, RerouteId};

/// Resolves canvas positions to items in the network.
///
/// The connector never does geometry itself; the host answers these queries
/// from whatever layout it renders.
pub trait ItemLocator {
    /// Node under the position
    fn node_at(&self, pos: Point) -> Option<NodeId>;

    /// Input slot of `node` under the position
    fn input_at(&self, node: NodeId, pos: Point) -> Option<usize>;

    /// Output slot of `node` under the position
    fn output_at(&self, node: NodeId, pos: Point) -> Option<usize>;

    /// Reroute under the position
    fn reroute_at(&self, pos: Point) -> Option<RerouteId>;

    /// Subgraph boundary node under the position
    fn io_node_at(&self, _pos: Point) -> Option<IoNodeKind> {
        None
    }

    /// Port of a boundary node under the position
    fn io_port_at(&self, _kind: IoNodeKind, _pos: Point) -> Option<PortTarget> {
        None
    }
}
