// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared fixtures for connector integration tests.

#![allow(dead_code)]

use nodeweave_connector::{ConnectorEvent, EventKind, ItemLocator, LinkConnector};
use nodeweave_graph::{IoNodeKind, LinkNetwork, Node, NodeId, Point, PortTarget, RerouteId};
use std::cell::RefCell;
use std::ops::ControlFlow;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

/// Route connector logs to the test output. Set `RUST_LOG=debug` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// What the pointer is over
#[derive(Debug, Clone, Copy)]
pub enum Hit {
    /// A node body
    Node(NodeId),
    /// A node input
    Input(NodeId, usize),
    /// A node output
    Output(NodeId, usize),
    /// A reroute
    Reroute(RerouteId),
    /// A subgraph boundary node, optionally over one of its ports
    IoNode(IoNodeKind, Option<PortTarget>),
}

/// Scripted hit-testing: each position maps to at most one item
#[derive(Debug, Default)]
pub struct MockLocator {
    hits: Vec<(Point, Hit)>,
}

impl MockLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, pos: Point, hit: Hit) -> Self {
        self.hits.push((pos, hit));
        self
    }

    fn hit(&self, pos: Point) -> Option<Hit> {
        self.hits.iter().find(|(p, _)| *p == pos).map(|(_, hit)| *hit)
    }
}

impl ItemLocator for MockLocator {
    fn node_at(&self, pos: Point) -> Option<NodeId> {
        match self.hit(pos)? {
            Hit::Node(node) | Hit::Input(node, _) | Hit::Output(node, _) => Some(node),
            Hit::Reroute(_) | Hit::IoNode(..) => None,
        }
    }

    fn input_at(&self, node: NodeId, pos: Point) -> Option<usize> {
        match self.hit(pos)? {
            Hit::Input(n, input) if n == node => Some(input),
            _ => None,
        }
    }

    fn output_at(&self, node: NodeId, pos: Point) -> Option<usize> {
        match self.hit(pos)? {
            Hit::Output(n, output) if n == node => Some(output),
            _ => None,
        }
    }

    fn reroute_at(&self, pos: Point) -> Option<RerouteId> {
        match self.hit(pos)? {
            Hit::Reroute(reroute) => Some(reroute),
            _ => None,
        }
    }

    fn io_node_at(&self, pos: Point) -> Option<IoNodeKind> {
        match self.hit(pos)? {
            Hit::IoNode(kind, _) => Some(kind),
            _ => None,
        }
    }

    fn io_port_at(&self, kind: IoNodeKind, pos: Point) -> Option<PortTarget> {
        match self.hit(pos)? {
            Hit::IoNode(k, port) if k == kind => port,
            _ => None,
        }
    }
}

/// Every event kind, in declaration order
pub const ALL_EVENTS: [EventKind; 11] = [
    EventKind::BeforeMoveInput,
    EventKind::BeforeMoveOutput,
    EventKind::LinkCreated,
    EventKind::InputMoved,
    EventKind::OutputMoved,
    EventKind::DroppedOnNode,
    EventKind::DroppedOnReroute,
    EventKind::DroppedOnCanvas,
    EventKind::BeforeDropLinks,
    EventKind::AfterDropLinks,
    EventKind::Reset,
];

/// Record the kind of every event the connector dispatches
pub fn record_events(connector: &mut LinkConnector) -> Rc<RefCell<Vec<EventKind>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    for kind in ALL_EVENTS {
        let log = log.clone();
        connector.events_mut().subscribe(kind, move |event: &ConnectorEvent| {
            log.borrow_mut().push(event.kind());
            ControlFlow::Continue(())
        });
    }
    log
}

/// Number of recorded events of `kind`
pub fn count(log: &Rc<RefCell<Vec<EventKind>>>, kind: EventKind) -> usize {
    log.borrow().iter().filter(|k| **k == kind).count()
}

/// `A` with an INT output, `B` and `C` with an INT input each, `D` with an
/// INT output and a STRING output
pub struct Fixture {
    pub network: LinkNetwork,
    pub a: NodeId,
    pub b: NodeId,
    pub c: NodeId,
    pub d: NodeId,
}

impl Fixture {
    pub fn new() -> Self {
        Self::in_network(LinkNetwork::new())
    }

    pub fn in_network(mut network: LinkNetwork) -> Self {
        let a = network.add_node(
            Node::new("A")
                .with_position(0.0, 0.0)
                .with_input("in", "INT")
                .with_output("out", "INT"),
        );
        let b = network.add_node(Node::new("B").with_position(300.0, 0.0).with_input("value", "INT"));
        let c = network.add_node(Node::new("C").with_position(300.0, 200.0).with_input("value", "INT"));
        let d = network.add_node(
            Node::new("D")
                .with_position(0.0, 200.0)
                .with_output("out", "INT")
                .with_output("text", "STRING"),
        );
        Self { network, a, b, c, d }
    }

    pub fn assert_consistent(&self) {
        let issues = self.network.integrity_issues();
        assert!(issues.is_empty(), "integrity issues: {issues:?}");
    }
}
