// SPDX-License-Identifier: MIT OR Apache-2.0
//! Drags across subgraph boundary nodes.

mod common;

use common::{count, record_events, Fixture, Hit, MockLocator};
use nodeweave_connector::{EventKind, LinkConnector, RenderLinkKind};
use nodeweave_graph::{IoNodeKind, LinkNetwork, Node, NodeRef, PortTarget, SlotAddress, SubgraphIo};

const BOUNDARY: [f32; 2] = [-200.0, 40.0];
const DROP: [f32; 2] = [320.0, 240.0];

fn subgraph(io: SubgraphIo) -> Fixture {
    Fixture::in_network(LinkNetwork::subgraph(io))
}

#[test]
fn test_drag_from_subgraph_input() {
    let mut fx = subgraph(SubgraphIo::new().with_input("x", "INT"));
    let mut connector = LinkConnector::default();
    let log = record_events(&mut connector);

    connector.drag_new_from_subgraph_input(&fx.network, 0, None).unwrap();
    assert_eq!(connector.render_links()[0].kind(), RenderLinkKind::ToInputFromIoNode);

    let locator = MockLocator::new().with(DROP, Hit::Input(fx.c, 0));
    connector.release(&mut fx.network, &locator, DROP).unwrap();

    let id = fx.network.node(fx.c).unwrap().inputs[0].link.unwrap();
    assert_eq!(fx.network.link(id).unwrap().origin, Some(SlotAddress::subgraph_input(0)));
    assert_eq!(fx.network.io().unwrap().inputs[0].link_ids, vec![id]);
    assert_eq!(count(&log, EventKind::LinkCreated), 1);
    fx.assert_consistent();
}

#[test]
fn test_moving_input_fed_by_subgraph_input() {
    let mut fx = subgraph(SubgraphIo::new().with_input("x", "INT"));
    let old = fx.network.connect_subgraph_input(0, fx.b, 0, None).unwrap();
    let mut connector = LinkConnector::default();
    let log = record_events(&mut connector);

    connector.move_input_link(&mut fx.network, fx.b, 0).unwrap();
    assert_eq!(connector.render_links()[0].link(), Some(old));

    let locator = MockLocator::new().with(DROP, Hit::Input(fx.c, 0));
    connector.release(&mut fx.network, &locator, DROP).unwrap();

    assert!(fx.network.link(old).is_none());
    assert_eq!(fx.network.node(fx.b).unwrap().inputs[0].link, None);
    let id = fx.network.node(fx.c).unwrap().inputs[0].link.unwrap();
    assert_eq!(fx.network.io().unwrap().inputs[0].link_ids, vec![id]);
    assert_eq!(count(&log, EventKind::InputMoved), 1);
    fx.assert_consistent();
}

#[test]
fn test_new_link_onto_output_placeholder_creates_port() {
    let mut fx = subgraph(SubgraphIo::new());
    let mut connector = LinkConnector::default();

    connector.drag_new_from_output(&fx.network, fx.a, 0, None).unwrap();
    assert!(connector.is_subgraph_output_valid_drop(&fx.network, PortTarget::Empty));
    assert!(!connector.is_subgraph_input_valid_drop(&fx.network, PortTarget::Empty));

    let locator = MockLocator::new().with(BOUNDARY, Hit::IoNode(IoNodeKind::Output, Some(PortTarget::Empty)));
    connector.release(&mut fx.network, &locator, BOUNDARY).unwrap();

    let io = fx.network.io().unwrap();
    assert_eq!(io.outputs.len(), 1);
    assert_eq!(io.outputs[0].name, "out");
    assert_eq!(io.outputs[0].slot_type.as_str(), "INT");
    let id = io.outputs[0].link_ids[0];
    assert!(fx.network.link(id).unwrap().has_origin(NodeRef::Node(fx.a), 0));
    fx.assert_consistent();
}

#[test]
fn test_drop_on_wrong_boundary_node_is_ignored() {
    let mut fx = subgraph(SubgraphIo::new());
    let mut connector = LinkConnector::default();

    connector.drag_new_from_output(&fx.network, fx.a, 0, None).unwrap();
    let locator = MockLocator::new().with(BOUNDARY, Hit::IoNode(IoNodeKind::Input, Some(PortTarget::Empty)));
    connector.release(&mut fx.network, &locator, BOUNDARY).unwrap();

    assert!(fx.network.io().unwrap().inputs.is_empty());
    assert_eq!(fx.network.link_count(), 0);
}

#[test]
fn test_output_move_onto_placeholder_shares_port_per_type() {
    let mut fx = subgraph(SubgraphIo::new());
    fx.network.connect_slots(fx.a, 0, fx.b, 0, None).unwrap();
    fx.network.connect_slots(fx.a, 0, fx.c, 0, None).unwrap();
    let mut connector = LinkConnector::default();
    let log = record_events(&mut connector);

    connector.move_output_link(&mut fx.network, fx.a, 0).unwrap();
    let locator = MockLocator::new().with(BOUNDARY, Hit::IoNode(IoNodeKind::Input, Some(PortTarget::Empty)));
    connector.release(&mut fx.network, &locator, BOUNDARY).unwrap();

    let io = fx.network.io().unwrap();
    assert_eq!(io.inputs.len(), 1);
    assert_eq!(io.inputs[0].link_ids.len(), 2);
    assert!(fx.network.node(fx.a).unwrap().outputs[0].links.is_empty());
    assert_eq!(count(&log, EventKind::OutputMoved), 2);
    fx.assert_consistent();
}

#[test]
fn test_output_move_onto_placeholder_splits_types() {
    let mut fx = subgraph(SubgraphIo::new());
    let any = fx.network.add_node(Node::new("Any").with_output("out", "*"));
    let float = fx.network.add_node(Node::new("F").with_input("value", "FLOAT"));
    fx.network.connect_slots(any, 0, fx.b, 0, None).unwrap();
    fx.network.connect_slots(any, 0, float, 0, None).unwrap();
    let mut connector = LinkConnector::default();

    connector.move_output_link(&mut fx.network, any, 0).unwrap();
    let locator = MockLocator::new().with(BOUNDARY, Hit::IoNode(IoNodeKind::Input, Some(PortTarget::Empty)));
    connector.release(&mut fx.network, &locator, BOUNDARY).unwrap();

    let io = fx.network.io().unwrap();
    let types: Vec<&str> = io.inputs.iter().map(|p| p.slot_type.as_str()).collect();
    assert_eq!(types, vec!["INT", "FLOAT"]);
    assert_eq!(io.inputs[1].name, "value_1");
    assert!(fx.network.node(any).unwrap().outputs[0].links.is_empty());
    fx.assert_consistent();
}

#[test]
fn test_drop_on_boundary_off_port_disconnects_moved_link() {
    let mut fx = subgraph(SubgraphIo::new().with_output("result", "INT"));
    let old = fx.network.connect_slots(fx.a, 0, fx.b, 0, None).unwrap();
    let mut connector = LinkConnector::default();
    let log = record_events(&mut connector);

    connector.move_input_link(&mut fx.network, fx.b, 0).unwrap();
    let locator = MockLocator::new().with(BOUNDARY, Hit::IoNode(IoNodeKind::Output, None));
    connector.release(&mut fx.network, &locator, BOUNDARY).unwrap();

    assert!(fx.network.link(old).is_none());
    assert_eq!(fx.network.node(fx.b).unwrap().inputs[0].link, None);
    assert!(fx.network.io().unwrap().outputs[0].link_ids.is_empty());
    assert_eq!(count(&log, EventKind::DroppedOnCanvas), 1);
    assert!(!connector.is_connecting());
    fx.assert_consistent();
}
