// SPDX-License-Identifier: MIT OR Apache-2.0
//! Drops on reroutes and drags starting from reroutes.

mod common;

use common::{count, init_tracing, record_events, Fixture, Hit, MockLocator};
use nodeweave_connector::{ConnectorSettings, EventKind, LinkConnector, RenderLinkKind};
use nodeweave_graph::{LinkSegment, NodeRef, SlotDirection};
use std::ops::ControlFlow;

const REROUTE_POS: [f32; 2] = [200.0, 40.0];
const DROP: [f32; 2] = [20.0, 240.0];

#[test]
fn test_new_link_dropped_on_reroute_resources_downstream_input() {
    init_tracing();
    let mut fx = Fixture::new();
    // A -> X -> R -> B
    let link = fx.network.connect_slots(fx.a, 0, fx.b, 0, None).unwrap();
    let x = fx.network.insert_reroute([100.0, 40.0], LinkSegment::Link(link)).unwrap();
    let r = fx.network.insert_reroute(REROUTE_POS, LinkSegment::Link(link)).unwrap();
    assert_eq!(fx.network.reroute(r).unwrap().parent_id, Some(x));

    let mut connector = LinkConnector::default();
    let log = record_events(&mut connector);
    connector.drag_new_from_output(&fx.network, fx.d, 0, None).unwrap();
    assert!(connector.is_reroute_valid_drop(&fx.network, r));

    let locator = MockLocator::new().with(REROUTE_POS, Hit::Reroute(r));
    connector.release(&mut fx.network, &locator, REROUTE_POS).unwrap();

    let resourced = fx.network.node(fx.b).unwrap().inputs[0].link.unwrap();
    let resourced = fx.network.link(resourced).unwrap();
    assert!(resourced.has_origin(NodeRef::Node(fx.d), 0));
    assert_eq!(resourced.parent_id, Some(r));
    assert_eq!(fx.network.reroute(r).unwrap().parent_id, None);

    // X is left hanging off A as a floating chain
    let x = fx.network.reroute(x).unwrap();
    assert_eq!(x.floating, Some(SlotDirection::Output));
    let floating = fx.network.floating_link(x.first_floating_link_id().unwrap()).unwrap();
    assert!(floating.has_origin(NodeRef::Node(fx.a), 0));
    assert_eq!(floating.parent_id, Some(x.id));

    assert_eq!(count(&log, EventKind::DroppedOnReroute), 1);
    assert_eq!(count(&log, EventKind::LinkCreated), 1);
    fx.assert_consistent();
}

#[test]
fn test_link_from_input_dropped_on_reroute_joins_chain() {
    let mut fx = Fixture::new();
    let link = fx.network.connect_slots(fx.a, 0, fx.b, 0, None).unwrap();
    let r = fx.network.insert_reroute(REROUTE_POS, LinkSegment::Link(link)).unwrap();
    let mut connector = LinkConnector::default();

    connector.drag_new_from_input(&fx.network, fx.c, 0, None).unwrap();
    assert!(connector.is_reroute_valid_drop(&fx.network, r));
    let locator = MockLocator::new().with(REROUTE_POS, Hit::Reroute(r));
    connector.release(&mut fx.network, &locator, REROUTE_POS).unwrap();

    let joined = fx.network.node(fx.c).unwrap().inputs[0].link.unwrap();
    let joined = fx.network.link(joined).unwrap();
    assert!(joined.has_origin(NodeRef::Node(fx.a), 0));
    assert_eq!(joined.parent_id, Some(r));
    assert_eq!(fx.network.reroute(r).unwrap().link_ids.len(), 2);
    fx.assert_consistent();
}

#[test]
fn test_drop_on_upstream_reroute_is_rejected() {
    let mut fx = Fixture::new();
    // A -> R1 -> R2 -> B
    let link = fx.network.connect_slots(fx.a, 0, fx.b, 0, None).unwrap();
    let r1 = fx.network.insert_reroute(REROUTE_POS, LinkSegment::Link(link)).unwrap();
    let r2 = fx.network.insert_reroute([250.0, 40.0], LinkSegment::Link(link)).unwrap();
    let mut connector = LinkConnector::default();

    connector.drag_from_reroute(&fx.network, r2).unwrap();
    assert_eq!(connector.render_links()[0].from_reroute(), Some(r2));
    assert!(!connector.is_reroute_valid_drop(&fx.network, r1));

    let locator = MockLocator::new().with(REROUTE_POS, Hit::Reroute(r1));
    connector.release(&mut fx.network, &locator, REROUTE_POS).unwrap();

    assert_eq!(fx.network.reroute(r1).unwrap().parent_id, None);
    assert_eq!(fx.network.reroute(r2).unwrap().parent_id, Some(r1));
    assert_eq!(fx.network.link_count(), 1);
    fx.assert_consistent();
}

#[test]
fn test_drag_from_floating_reroute_consumes_floating_link() {
    let mut fx = Fixture::new();
    let link = fx.network.connect_slots(fx.a, 0, fx.b, 0, None).unwrap();
    let r = fx.network.insert_reroute(REROUTE_POS, LinkSegment::Link(link)).unwrap();
    fx.network.disconnect_input(fx.b, 0, true).unwrap();
    assert_eq!(fx.network.reroute(r).unwrap().floating, Some(SlotDirection::Output));
    let mut connector = LinkConnector::default();

    connector.drag_from_reroute(&fx.network, r).unwrap();
    assert_eq!(connector.render_links()[0].kind(), RenderLinkKind::ToInput);

    let locator = MockLocator::new().with(DROP, Hit::Input(fx.c, 0));
    connector.release(&mut fx.network, &locator, DROP).unwrap();

    let link = fx.network.node(fx.c).unwrap().inputs[0].link.unwrap();
    assert_eq!(fx.network.link(link).unwrap().parent_id, Some(r));
    assert_eq!(fx.network.floating_links().count(), 0);
    assert_eq!(fx.network.reroute(r).unwrap().floating, None);
    fx.assert_consistent();
}

#[test]
fn test_drag_from_reroute_to_output_resources_every_input() {
    let mut fx = Fixture::new();
    let link = fx.network.connect_slots(fx.a, 0, fx.b, 0, None).unwrap();
    let r = fx.network.insert_reroute(REROUTE_POS, LinkSegment::Link(link)).unwrap();
    fx.network.connect_slots(fx.a, 0, fx.c, 0, Some(r)).unwrap();
    let mut connector = LinkConnector::default();
    let log = record_events(&mut connector);

    connector.drag_from_reroute_to_output(&fx.network, r).unwrap();
    assert_eq!(connector.state().connecting_to, Some(SlotDirection::Output));

    let locator = MockLocator::new().with(DROP, Hit::Output(fx.d, 0));
    connector.release(&mut fx.network, &locator, DROP).unwrap();

    for node in [fx.b, fx.c] {
        let id = fx.network.node(node).unwrap().inputs[0].link.unwrap();
        let link = fx.network.link(id).unwrap();
        assert!(link.has_origin(NodeRef::Node(fx.d), 0));
        assert_eq!(link.parent_id, Some(r));
    }
    assert!(fx.network.node(fx.a).unwrap().outputs[0].links.is_empty());
    assert_eq!(fx.network.floating_links().count(), 0);
    assert_eq!(count(&log, EventKind::LinkCreated), 2);
    fx.assert_consistent();
}

#[test]
fn test_rejected_output_move_drops_reroutes() {
    let mut fx = Fixture::new();
    let link = fx.network.connect_slots(fx.a, 0, fx.b, 0, None).unwrap();
    let r = fx.network.insert_reroute(REROUTE_POS, LinkSegment::Link(link)).unwrap();
    let mut connector = LinkConnector::default();

    connector.move_output_link(&mut fx.network, fx.a, 0).unwrap();
    assert!(fx.network.reroute(r).unwrap().dragging);
    assert_eq!(connector.hidden_reroutes().collect::<Vec<_>>(), vec![r]);

    // STRING cannot feed an INT input
    let locator = MockLocator::new().with(DROP, Hit::Output(fx.d, 1));
    connector.release(&mut fx.network, &locator, DROP).unwrap();

    let id = fx.network.node(fx.b).unwrap().inputs[0].link.unwrap();
    let relinked = fx.network.link(id).unwrap();
    assert!(relinked.has_origin(NodeRef::Node(fx.a), 0));
    assert_eq!(relinked.parent_id, None);
    let r = fx.network.reroute(r).unwrap();
    assert_eq!(r.floating, Some(SlotDirection::Output));
    assert!(!r.dragging);
    fx.assert_consistent();
}

#[test]
fn test_rejected_output_move_left_alone_when_disabled() {
    let mut fx = Fixture::new();
    let link = fx.network.connect_slots(fx.a, 0, fx.b, 0, None).unwrap();
    let r = fx.network.insert_reroute(REROUTE_POS, LinkSegment::Link(link)).unwrap();
    let settings = ConnectorSettings {
        reconnect_rejected_output_moves: false,
        ..ConnectorSettings::default()
    };
    let mut connector = LinkConnector::new(settings);

    connector.move_output_link(&mut fx.network, fx.a, 0).unwrap();
    let locator = MockLocator::new().with(DROP, Hit::Output(fx.d, 1));
    connector.release(&mut fx.network, &locator, DROP).unwrap();

    assert_eq!(fx.network.link(link).unwrap().parent_id, Some(r));
    assert!(!fx.network.reroute(r).unwrap().dragging);
    fx.assert_consistent();
}

#[test]
fn test_moved_output_dropped_on_reroute_takes_its_source() {
    let mut fx = Fixture::new();
    let moved = fx.network.connect_slots(fx.a, 0, fx.b, 0, None).unwrap();
    fx.network.insert_reroute([100.0, 40.0], LinkSegment::Link(moved)).unwrap();
    let other = fx.network.connect_slots(fx.d, 0, fx.c, 0, None).unwrap();
    let r = fx.network.insert_reroute(REROUTE_POS, LinkSegment::Link(other)).unwrap();
    let mut connector = LinkConnector::default();
    let log = record_events(&mut connector);

    connector.move_output_link(&mut fx.network, fx.a, 0).unwrap();
    assert!(connector.is_reroute_valid_drop(&fx.network, r));
    let locator = MockLocator::new().with(REROUTE_POS, Hit::Reroute(r));
    connector.release(&mut fx.network, &locator, REROUTE_POS).unwrap();

    let id = fx.network.node(fx.b).unwrap().inputs[0].link.unwrap();
    let link = fx.network.link(id).unwrap();
    assert!(link.has_origin(NodeRef::Node(fx.d), 0));
    assert_eq!(link.parent_id, Some(r));
    assert_eq!(fx.network.reroute(r).unwrap().link_ids.len(), 2);
    assert_eq!(count(&log, EventKind::OutputMoved), 1);
    fx.assert_consistent();
}

#[test]
fn test_drag_from_link_segment_leaves_from_reroute() {
    let mut fx = Fixture::new();
    let link = fx.network.connect_slots(fx.a, 0, fx.b, 0, None).unwrap();
    let r = fx.network.insert_reroute(REROUTE_POS, LinkSegment::Link(link)).unwrap();
    let mut connector = LinkConnector::default();

    connector.drag_from_link_segment(&fx.network, LinkSegment::Link(link)).unwrap();
    let render_link = &connector.render_links()[0];
    assert_eq!(render_link.from().node, NodeRef::Node(fx.a));
    assert_eq!(render_link.from_reroute(), Some(r));

    let locator = MockLocator::new().with(DROP, Hit::Input(fx.c, 0));
    connector.release(&mut fx.network, &locator, DROP).unwrap();

    let id = fx.network.node(fx.c).unwrap().inputs[0].link.unwrap();
    assert_eq!(fx.network.link(id).unwrap().parent_id, Some(r));
    assert_eq!(fx.network.reroute(r).unwrap().link_ids.len(), 2);
    fx.assert_consistent();
}

#[test]
fn test_before_move_output_can_skip_floating_link() {
    let mut fx = Fixture::new();
    let link = fx.network.connect_slots(fx.a, 0, fx.b, 0, None).unwrap();
    let r = fx.network.insert_reroute(REROUTE_POS, LinkSegment::Link(link)).unwrap();
    fx.network.disconnect_input(fx.b, 0, true).unwrap();
    let floating = fx.network.reroute(r).unwrap().first_floating_link_id().unwrap();
    let mut connector = LinkConnector::default();
    connector
        .events_mut()
        .once(EventKind::BeforeMoveOutput, |_| ControlFlow::Break(()));

    connector.move_output_link(&mut fx.network, fx.a, 0).unwrap();
    assert!(connector.render_links().is_empty());
    assert!(!connector.is_connecting());
    assert!(!fx.network.floating_link(floating).unwrap().dragging);

    connector.move_output_link(&mut fx.network, fx.a, 0).unwrap();
    assert_eq!(connector.render_links()[0].kind(), RenderLinkKind::Floating);
    assert!(fx.network.floating_link(floating).unwrap().dragging);
    connector.reset(&mut fx.network, false);
    fx.assert_consistent();
}
