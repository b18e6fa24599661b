// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cross-reference checks for a link network.

use crate::link::{LinkId, NodeRef, SlotAddress};
use crate::network::{ConnectionError, LinkNetwork};
use crate::reroute::RerouteId;
use crate::slot::SlotDirection;
use crate::subgraph::IoNodeKind;

/// A broken cross reference found by [`LinkNetwork::integrity_issues`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntegrityIssue {
    /// A slot lists a link that does not exist or points elsewhere
    #[error("Slot {slot:?} lists link {link} which does not point back")]
    DanglingSlotLink {
        /// The slot
        slot: SlotAddress,
        /// The listed link
        link: LinkId,
    },

    /// A resolved link is missing from one of its slots
    #[error("Link {link} is not registered on its {direction} slot")]
    UnregisteredLink {
        /// The link
        link: LinkId,
        /// Which end
        direction: SlotDirection,
    },

    /// A link in the resolved map is missing an end
    #[error("Link {0} is stored as resolved but is missing an end")]
    UnresolvedLink(LinkId),

    /// A floating link has neither or both ends attached
    #[error("Floating link {0} must have exactly one attached end")]
    MalformedFloatingLink(LinkId),

    /// A floating link is missing from its attached slot
    #[error("Floating link {0} is not registered on its attached slot")]
    UnregisteredFloatingLink(LinkId),

    /// A reroute lists a link whose path does not go through it
    #[error("{reroute} lists link {link} which does not pass through it")]
    StrayRerouteLink {
        /// The reroute
        reroute: RerouteId,
        /// The listed link
        link: LinkId,
        /// Whether the link is floating
        floating: bool,
    },

    /// A link passes through a reroute that does not list it
    #[error("Link {link} passes through {reroute} which does not list it")]
    MissingRerouteLink {
        /// The reroute
        reroute: RerouteId,
        /// The link
        link: LinkId,
        /// Whether the link is floating
        floating: bool,
    },

    /// A link's nearest reroute does not exist
    #[error("Link {link} references missing {reroute}")]
    MissingReroute {
        /// The link
        link: LinkId,
        /// The missing reroute
        reroute: RerouteId,
    },

    /// A reroute with no links left
    #[error("{0} carries no links")]
    EmptyReroute(RerouteId),

    /// A reroute chain that loops
    #[error("{0} is part of a reroute loop")]
    RerouteLoop(RerouteId),
}

impl LinkNetwork {
    /// Check every cross reference, returning all problems found
    pub fn integrity_issues(&self) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();
        self.check_slots(&mut issues);
        self.check_links(&mut issues);
        self.check_reroutes(&mut issues);
        issues
    }

    fn check_slots(&self, issues: &mut Vec<IntegrityIssue>) {
        for node in self.nodes.values() {
            let node_ref = NodeRef::Node(node.id);
            for (index, input) in node.inputs.iter().enumerate() {
                let slot = SlotAddress { node: node_ref, slot: index };
                if let Some(link) = input.link {
                    if !self.links.get(&link).is_some_and(|l| l.target == Some(slot)) {
                        issues.push(IntegrityIssue::DanglingSlotLink { slot, link });
                    }
                }
                for &link in &input.floating_links {
                    if !self.floating_links.get(&link).is_some_and(|l| l.target == Some(slot)) {
                        issues.push(IntegrityIssue::DanglingSlotLink { slot, link });
                    }
                }
            }
            for (index, output) in node.outputs.iter().enumerate() {
                let slot = SlotAddress { node: node_ref, slot: index };
                for &link in &output.links {
                    if !self.links.get(&link).is_some_and(|l| l.origin == Some(slot)) {
                        issues.push(IntegrityIssue::DanglingSlotLink { slot, link });
                    }
                }
                for &link in &output.floating_links {
                    if !self.floating_links.get(&link).is_some_and(|l| l.origin == Some(slot)) {
                        issues.push(IntegrityIssue::DanglingSlotLink { slot, link });
                    }
                }
            }
        }

        let Some(io) = &self.io else {
            return;
        };
        for (kind, node) in [
            (IoNodeKind::Input, NodeRef::SubgraphInput),
            (IoNodeKind::Output, NodeRef::SubgraphOutput),
        ] {
            for (index, port) in io.ports(kind).iter().enumerate() {
                let slot = SlotAddress { node, slot: index };
                for &link in &port.link_ids {
                    let points_back = self.links.get(&link).is_some_and(|l| match kind {
                        IoNodeKind::Input => l.origin == Some(slot),
                        IoNodeKind::Output => l.target == Some(slot),
                    });
                    if !points_back {
                        issues.push(IntegrityIssue::DanglingSlotLink { slot, link });
                    }
                }
            }
        }
    }

    fn check_links(&self, issues: &mut Vec<IntegrityIssue>) {
        for link in self.links.values() {
            let (Some(origin), Some(target)) = (link.origin, link.target) else {
                issues.push(IntegrityIssue::UnresolvedLink(link.id));
                continue;
            };
            if !self.slot_lists_link(origin, SlotDirection::Output, link.id) {
                issues.push(IntegrityIssue::UnregisteredLink {
                    link: link.id,
                    direction: SlotDirection::Output,
                });
            }
            if !self.slot_lists_link(target, SlotDirection::Input, link.id) {
                issues.push(IntegrityIssue::UnregisteredLink {
                    link: link.id,
                    direction: SlotDirection::Input,
                });
            }
            self.check_chain_membership(link.id, link.parent_id, false, issues);
        }

        for link in self.floating_links.values() {
            match link.attached_side() {
                Some(SlotDirection::Input) => {
                    let registered = link.target.is_some_and(|t| self.slot_lists_floating(t, SlotDirection::Input, link.id));
                    if !registered {
                        issues.push(IntegrityIssue::UnregisteredFloatingLink(link.id));
                    }
                }
                Some(SlotDirection::Output) => {
                    let registered = link.origin.is_some_and(|o| self.slot_lists_floating(o, SlotDirection::Output, link.id));
                    if !registered {
                        issues.push(IntegrityIssue::UnregisteredFloatingLink(link.id));
                    }
                }
                None => issues.push(IntegrityIssue::MalformedFloatingLink(link.id)),
            }
            self.check_chain_membership(link.id, link.parent_id, true, issues);
        }
    }

    fn check_chain_membership(
        &self,
        link: LinkId,
        parent: Option<RerouteId>,
        floating: bool,
        issues: &mut Vec<IntegrityIssue>,
    ) {
        let Some(parent) = parent else {
            return;
        };
        let chain = match self.reroute_chain(parent) {
            Ok(chain) => chain,
            Err(ConnectionError::RerouteNotFound(reroute)) => {
                issues.push(IntegrityIssue::MissingReroute { link, reroute });
                return;
            }
            // Reported per reroute
            Err(_) => return,
        };
        for reroute in chain {
            let listed = self.reroutes.get(&reroute).is_some_and(|r| {
                if floating {
                    r.floating_link_ids.contains(&link)
                } else {
                    r.link_ids.contains(&link)
                }
            });
            if !listed {
                issues.push(IntegrityIssue::MissingRerouteLink { reroute, link, floating });
            }
        }
    }

    fn check_reroutes(&self, issues: &mut Vec<IntegrityIssue>) {
        for reroute in self.reroutes.values() {
            if matches!(self.reroute_chain(reroute.id), Err(ConnectionError::RerouteLoop(_))) {
                issues.push(IntegrityIssue::RerouteLoop(reroute.id));
                continue;
            }
            if reroute.total_links() == 0 {
                issues.push(IntegrityIssue::EmptyReroute(reroute.id));
            }

            let listed = reroute
                .link_ids
                .iter()
                .map(|id| (*id, false))
                .chain(reroute.floating_link_ids.iter().map(|id| (*id, true)));
            for (link, floating) in listed {
                let links = if floating { &self.floating_links } else { &self.links };
                let passes = links
                    .get(&link)
                    .is_some_and(|l| self.link_chain(l.parent_id).contains(&reroute.id));
                if !passes {
                    issues.push(IntegrityIssue::StrayRerouteLink {
                        reroute: reroute.id,
                        link,
                        floating,
                    });
                }
            }
        }
    }

    fn slot_lists_link(&self, address: SlotAddress, direction: SlotDirection, link: LinkId) -> bool {
        match (address.node, direction) {
            (NodeRef::Node(id), SlotDirection::Input) => self
                .node(id)
                .and_then(|n| n.input(address.slot))
                .is_some_and(|i| i.link == Some(link)),
            (NodeRef::Node(id), SlotDirection::Output) => self
                .node(id)
                .and_then(|n| n.output(address.slot))
                .is_some_and(|o| o.links.contains(&link)),
            (NodeRef::SubgraphInput, SlotDirection::Output) => self
                .io()
                .and_then(|io| io.port(IoNodeKind::Input, address.slot))
                .is_some_and(|p| p.link_ids.contains(&link)),
            (NodeRef::SubgraphOutput, SlotDirection::Input) => self
                .io()
                .and_then(|io| io.port(IoNodeKind::Output, address.slot))
                .is_some_and(|p| p.link_ids.contains(&link)),
            _ => false,
        }
    }

    fn slot_lists_floating(&self, address: SlotAddress, direction: SlotDirection, link: LinkId) -> bool {
        let NodeRef::Node(id) = address.node else {
            // Boundary ports keep no floating registry
            return true;
        };
        let Some(node) = self.node(id) else {
            return false;
        };
        match direction {
            SlotDirection::Input => node.input(address.slot).is_some_and(|i| i.floating_links.contains(&link)),
            SlotDirection::Output => node.output(address.slot).is_some_and(|o| o.floating_links.contains(&link)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    #[test]
    fn test_detects_one_sided_reference() {
        let mut network = LinkNetwork::new();
        let a = network.add_node(Node::new("A").with_output("out", "INT"));
        let b = network.add_node(Node::new("B").with_input("in", "INT"));
        let link = network.connect_slots(a, 0, b, 0, None).unwrap();
        assert!(network.integrity_issues().is_empty());

        network.node_mut(b).unwrap().inputs[0].link = None;
        assert_eq!(
            network.integrity_issues(),
            vec![IntegrityIssue::UnregisteredLink {
                link,
                direction: SlotDirection::Input
            }]
        );
    }

    #[test]
    fn test_detects_empty_reroute() {
        let mut network = LinkNetwork::new();
        let reroute = network.add_reroute([0.0, 0.0], None).unwrap();
        assert_eq!(network.integrity_issues(), vec![IntegrityIssue::EmptyReroute(reroute)]);
    }
}
