// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reroute chain operations on the link network.

use crate::link::{Link, LinkId, LinkSegment, NodeRef, SlotAddress};
use crate::network::{ConnectionError, LinkNetwork, Result};
use crate::node::NodeId;
use crate::reroute::{Reroute, RerouteId};
use crate::slot::SlotDirection;
use crate::Point;
use indexmap::IndexSet;
use std::collections::HashSet;

/// A node input reached by following links forward through a reroute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RerouteTarget {
    /// Target node
    pub node: NodeId,
    /// Input index on the target node
    pub input: usize,
    /// Link reaching the input
    pub link: LinkId,
    /// Whether `link` is a floating link
    pub floating: bool,
}

impl LinkNetwork {
    /// Get a reroute by ID
    pub fn reroute(&self, reroute_id: RerouteId) -> Option<&Reroute> {
        self.reroutes.get(&reroute_id)
    }

    /// Get a mutable reroute by ID
    pub fn reroute_mut(&mut self, reroute_id: RerouteId) -> Option<&mut Reroute> {
        self.reroutes.get_mut(&reroute_id)
    }

    /// Get all reroutes
    pub fn reroutes(&self) -> impl Iterator<Item = &Reroute> {
        self.reroutes.values()
    }

    /// Get the number of reroutes
    pub fn reroute_count(&self) -> usize {
        self.reroutes.len()
    }

    /// Place an empty reroute.
    ///
    /// The reroute carries no links until one is connected through it, e.g.
    /// with [`LinkNetwork::connect_slots`].
    pub fn add_reroute(&mut self, pos: Point, parent_id: Option<RerouteId>) -> Result<RerouteId> {
        if let Some(parent) = parent_id {
            if !self.reroutes.contains_key(&parent) {
                return Err(ConnectionError::RerouteNotFound(parent));
            }
        }
        self.last_reroute_id += 1;
        let id = RerouteId(self.last_reroute_id);
        self.reroutes.insert(id, Reroute::new(id, pos, parent_id));
        Ok(id)
    }

    /// Insert a new reroute on an existing segment.
    ///
    /// Every link using the segment now passes through the new reroute.
    pub fn insert_reroute(&mut self, pos: Point, segment: LinkSegment) -> Result<RerouteId> {
        let (parent, link_ids, floating_link_ids) = match segment {
            LinkSegment::Link(id) => {
                let link = self.links.get(&id).ok_or(ConnectionError::LinkNotFound(id))?;
                (link.parent_id, IndexSet::from([id]), IndexSet::new())
            }
            LinkSegment::FloatingLink(id) => {
                let link = self
                    .floating_links
                    .get(&id)
                    .ok_or(ConnectionError::LinkNotFound(id))?;
                (link.parent_id, IndexSet::new(), IndexSet::from([id]))
            }
            LinkSegment::Reroute(id) => {
                let reroute = self.reroutes.get(&id).ok_or(ConnectionError::RerouteNotFound(id))?;
                (
                    reroute.parent_id,
                    reroute.link_ids.clone(),
                    reroute.floating_link_ids.clone(),
                )
            }
        };

        self.last_reroute_id += 1;
        let id = RerouteId(self.last_reroute_id);
        let mut reroute = Reroute::new(id, pos, parent);
        reroute.link_ids = link_ids.clone();
        reroute.floating_link_ids = floating_link_ids.clone();
        self.reroutes.insert(id, reroute);

        for link_id in link_ids {
            self.splice_reroute(link_id, false, parent, id);
        }
        for link_id in floating_link_ids {
            self.splice_reroute(link_id, true, parent, id);
        }
        Ok(id)
    }

    fn splice_reroute(&mut self, link_id: LinkId, floating: bool, parent: Option<RerouteId>, new_id: RerouteId) {
        let links = if floating {
            &mut self.floating_links
        } else {
            &mut self.links
        };
        let Some(link) = links.get_mut(&link_id) else {
            return;
        };
        if link.parent_id == parent {
            link.parent_id = Some(new_id);
        }
        let link_parent = link.parent_id;

        for reroute_id in self.link_chain(link_parent) {
            if reroute_id == new_id {
                continue;
            }
            if let Some(reroute) = self.reroutes.get_mut(&reroute_id) {
                if reroute.parent_id == parent {
                    reroute.parent_id = Some(new_id);
                }
            }
        }
    }

    /// Remove a reroute, splicing its children and links onto its parent.
    ///
    /// A floating link ending at the removed reroute moves to the parent when
    /// that parent carries nothing else, and is removed otherwise.
    pub fn remove_reroute(&mut self, reroute_id: RerouteId) -> Option<Reroute> {
        let reroute = self.reroutes.get(&reroute_id)?.clone();
        let parent = reroute.parent_id;

        for other in self.reroutes.values_mut() {
            if other.parent_id == Some(reroute_id) {
                other.parent_id = parent;
            }
        }
        for link_id in &reroute.link_ids {
            if let Some(link) = self.links.get_mut(link_id) {
                if link.parent_id == Some(reroute_id) {
                    link.parent_id = parent;
                }
            }
        }

        let mut doomed = Vec::new();
        for link_id in &reroute.floating_link_ids {
            let ends_here = self
                .floating_links
                .get(link_id)
                .is_some_and(|l| l.parent_id == Some(reroute_id));
            if !ends_here {
                continue;
            }
            let parent_carries_only_this = parent
                .and_then(|p| self.reroutes.get(&p))
                .is_some_and(|p| p.total_links() == 1);
            if parent_carries_only_this {
                if let Some(link) = self.floating_links.get_mut(link_id) {
                    link.parent_id = parent;
                }
                if let Some(parent) = parent.and_then(|p| self.reroutes.get_mut(&p)) {
                    parent.floating = reroute.floating;
                }
            } else {
                doomed.push(*link_id);
            }
        }
        for link_id in doomed {
            self.remove_floating_link_except(link_id, Some(reroute_id));
        }

        self.reroutes.shift_remove(&reroute_id)
    }

    /// Re-parent a reroute.
    ///
    /// Parenting a reroute to itself is ignored. Parenting it to one of its
    /// own descendants would close a loop and is rejected.
    pub fn set_reroute_parent(&mut self, reroute_id: RerouteId, parent_id: Option<RerouteId>) -> Result<()> {
        if !self.reroutes.contains_key(&reroute_id) {
            return Err(ConnectionError::RerouteNotFound(reroute_id));
        }
        if parent_id == Some(reroute_id) {
            tracing::debug!(reroute = %reroute_id, "Ignoring reroute parented to itself");
            return Ok(());
        }
        if let Some(parent) = parent_id {
            if self.reroute_chain(parent)?.contains(&reroute_id) {
                return Err(ConnectionError::RerouteLoop(reroute_id));
            }
        }
        if let Some(reroute) = self.reroutes.get_mut(&reroute_id) {
            reroute.parent_id = parent_id;
        }
        Ok(())
    }

    /// Reroutes from the output end of the chain up to and including
    /// `reroute_id`.
    ///
    /// A parent that no longer exists ends the chain early.
    pub fn reroute_chain(&self, reroute_id: RerouteId) -> Result<Vec<RerouteId>> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(reroute_id);

        while let Some(id) = current {
            if !visited.insert(id) {
                return Err(ConnectionError::RerouteLoop(id));
            }
            let Some(reroute) = self.reroutes.get(&id) else {
                if id == reroute_id {
                    return Err(ConnectionError::RerouteNotFound(id));
                }
                tracing::warn!(reroute = %id, "Reroute chain references a missing parent");
                break;
            };
            chain.push(id);
            current = reroute.parent_id;
        }

        chain.reverse();
        Ok(chain)
    }

    /// Chain of a link whose nearest reroute is `parent_id`, empty when the
    /// chain cannot be walked
    pub fn link_chain(&self, parent_id: Option<RerouteId>) -> Vec<RerouteId> {
        let Some(parent) = parent_id else {
            return Vec::new();
        };
        self.reroute_chain(parent).unwrap_or_else(|err| {
            tracing::warn!(%err, "Ignoring unusable reroute chain");
            Vec::new()
        })
    }

    /// The output feeding a reroute, taken from its first link
    pub fn find_source_output(&self, reroute_id: RerouteId) -> Option<SlotAddress> {
        let reroute = self.reroutes.get(&reroute_id)?;
        let link = reroute
            .first_link_id()
            .and_then(|id| self.links.get(&id))
            .or_else(|| {
                reroute
                    .first_floating_link_id()
                    .and_then(|id| self.floating_links.get(&id))
            })?;
        link.origin.filter(|origin| self.origin_type(*origin).is_ok())
    }

    /// Every node input reached through a reroute, resolved links first
    pub fn find_target_inputs(&self, reroute_id: RerouteId) -> Vec<RerouteTarget> {
        let Some(reroute) = self.reroutes.get(&reroute_id) else {
            return Vec::new();
        };

        let resolved = reroute.link_ids.iter().map(|id| (*id, false));
        let floating = reroute.floating_link_ids.iter().map(|id| (*id, true));
        resolved
            .chain(floating)
            .filter_map(|(id, floating)| {
                let links = if floating { &self.floating_links } else { &self.links };
                let target = links.get(&id)?.target?;
                let NodeRef::Node(node) = target.node else {
                    return None;
                };
                self.target_type(target).ok()?;
                Some(RerouteTarget {
                    node,
                    input: target.slot,
                    link: id,
                    floating,
                })
            })
            .collect()
    }

    /// Re-source the floating links that hang from a reroute toward the
    /// output side, attaching them to `origin`
    pub fn set_floating_link_origin(&mut self, reroute_id: RerouteId, origin: SlotAddress) -> Result<()> {
        self.origin_type(origin)?;
        let reroute = self
            .reroutes
            .get(&reroute_id)
            .ok_or(ConnectionError::RerouteNotFound(reroute_id))?;

        let ids: Vec<LinkId> = reroute
            .floating_link_ids
            .iter()
            .copied()
            .filter(|id| self.floating_links.get(id).is_some_and(Link::is_floating_input))
            .collect();

        for id in ids {
            let previous = self.floating_links.get(&id).and_then(|l| l.origin);
            if let Some(previous) = previous {
                self.unregister_floating(previous, SlotDirection::Output, id);
            }
            if let Some(link) = self.floating_links.get_mut(&id) {
                link.origin = Some(origin);
            }
            self.register_floating(origin, SlotDirection::Output, id);
        }
        Ok(())
    }

    /// Drop ids a reroute lists for links that no longer pass through it,
    /// returning how many were dropped
    pub fn prune_reroute_links(&mut self, reroute_id: RerouteId) -> usize {
        let Some(reroute) = self.reroutes.get(&reroute_id) else {
            return 0;
        };
        let passes = |link: Option<&Link>| link.is_some_and(|l| self.link_chain(l.parent_id).contains(&reroute_id));
        let stale: Vec<LinkId> = reroute
            .link_ids
            .iter()
            .copied()
            .filter(|id| !passes(self.links.get(id)))
            .collect();
        let stale_floating: Vec<LinkId> = reroute
            .floating_link_ids
            .iter()
            .copied()
            .filter(|id| !passes(self.floating_links.get(id)))
            .collect();

        let Some(reroute) = self.reroutes.get_mut(&reroute_id) else {
            return 0;
        };
        for id in &stale {
            reroute.link_ids.shift_remove(id);
        }
        for id in &stale_floating {
            reroute.floating_link_ids.shift_remove(id);
        }
        if reroute.floating_link_ids.is_empty() {
            reroute.floating = None;
        }
        stale.len() + stale_floating.len()
    }

    /// Make the reroute link sets agree with a link's current chain
    pub fn sync_reroute_membership(&mut self, link_id: LinkId, floating: bool) {
        let links = if floating { &self.floating_links } else { &self.links };
        let Some(link) = links.get(&link_id) else {
            return;
        };
        let chain: HashSet<RerouteId> = self.link_chain(link.parent_id).into_iter().collect();

        for reroute in self.reroutes.values_mut() {
            let ids = if floating {
                &mut reroute.floating_link_ids
            } else {
                &mut reroute.link_ids
            };
            if chain.contains(&reroute.id) {
                ids.insert(link_id);
            } else {
                ids.shift_remove(&link_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::link::LinkSegment;
    use crate::network::{ConnectionError, LinkNetwork};
    use crate::node::{Node, NodeId};
    use crate::slot::SlotDirection;

    fn chained() -> (LinkNetwork, NodeId, NodeId, crate::LinkId) {
        let mut network = LinkNetwork::new();
        let a = network.add_node(Node::new("A").with_output("out", "INT"));
        let b = network.add_node(Node::new("B").with_input("in", "INT").with_input("other", "INT"));
        let link = network.connect_slots(a, 0, b, 0, None).unwrap();
        (network, a, b, link)
    }

    #[test]
    fn test_insert_reroute_builds_chain() {
        let (mut network, _, _, link) = chained();
        let first = network.insert_reroute([10.0, 0.0], LinkSegment::Link(link)).unwrap();
        let second = network.insert_reroute([20.0, 0.0], LinkSegment::Link(link)).unwrap();
        let middle = network.insert_reroute([15.0, 0.0], LinkSegment::Reroute(second)).unwrap();

        assert_eq!(network.link(link).unwrap().parent_id, Some(second));
        assert_eq!(network.reroute_chain(second).unwrap(), vec![first, middle, second]);
        assert!(network.integrity_issues().is_empty());
    }

    #[test]
    fn test_remove_reroute_splices_chain() {
        let (mut network, _, _, link) = chained();
        let first = network.insert_reroute([10.0, 0.0], LinkSegment::Link(link)).unwrap();
        let second = network.insert_reroute([20.0, 0.0], LinkSegment::Link(link)).unwrap();

        network.remove_reroute(second).unwrap();
        assert_eq!(network.link(link).unwrap().parent_id, Some(first));
        network.remove_reroute(first).unwrap();
        assert_eq!(network.link(link).unwrap().parent_id, None);
        assert!(network.integrity_issues().is_empty());
    }

    #[test]
    fn test_remove_floating_terminus_moves_floating_link_to_parent() {
        let (mut network, _, b, link) = chained();
        let first = network.insert_reroute([10.0, 0.0], LinkSegment::Link(link)).unwrap();
        let second = network.insert_reroute([20.0, 0.0], LinkSegment::Link(link)).unwrap();
        network.disconnect_input(b, 0, true).unwrap();
        assert_eq!(network.reroute(second).unwrap().floating, Some(SlotDirection::Output));

        network.remove_reroute(second).unwrap();

        let floating = network.floating_links().next().unwrap();
        assert_eq!(floating.parent_id, Some(first));
        assert_eq!(network.reroute(first).unwrap().floating, Some(SlotDirection::Output));
        assert!(network.integrity_issues().is_empty());
    }

    #[test]
    fn test_set_parent_rejects_loops() {
        let (mut network, _, _, link) = chained();
        let first = network.insert_reroute([10.0, 0.0], LinkSegment::Link(link)).unwrap();
        let second = network.insert_reroute([20.0, 0.0], LinkSegment::Link(link)).unwrap();

        assert_eq!(
            network.set_reroute_parent(first, Some(second)),
            Err(ConnectionError::RerouteLoop(first))
        );
        network.set_reroute_parent(second, Some(second)).unwrap();
        assert_eq!(network.reroute(second).unwrap().parent_id, Some(first));
    }

    #[test]
    fn test_chain_walk_detects_loop() {
        let mut network = LinkNetwork::new();
        let first = network.add_reroute([0.0, 0.0], None).unwrap();
        let second = network.add_reroute([0.0, 0.0], Some(first)).unwrap();
        network.reroute_mut(first).unwrap().parent_id = Some(second);

        assert!(matches!(network.reroute_chain(second), Err(ConnectionError::RerouteLoop(_))));
        assert!(network.link_chain(Some(second)).is_empty());
    }

    #[test]
    fn test_find_targets_and_source() {
        let (mut network, a, b, link) = chained();
        let reroute = network.insert_reroute([10.0, 0.0], LinkSegment::Link(link)).unwrap();
        let second = network.connect_slots(a, 0, b, 1, Some(reroute)).unwrap();

        let targets = network.find_target_inputs(reroute);
        assert_eq!(targets.len(), 2);
        assert_eq!((targets[0].input, targets[0].link), (0, link));
        assert_eq!((targets[1].input, targets[1].link), (1, second));
        assert_eq!(network.find_source_output(reroute), Some(crate::SlotAddress::node(a, 0)));
    }

    #[test]
    fn test_set_floating_link_origin() {
        let (mut network, a, b, link) = chained();
        let c = network.add_node(Node::new("C").with_output("out", "INT"));
        let reroute = network.insert_reroute([10.0, 0.0], LinkSegment::Link(link)).unwrap();
        network.disconnect_input(b, 0, true).unwrap();
        let floating = network.floating_links().next().unwrap().id;

        network
            .set_floating_link_origin(reroute, crate::SlotAddress::node(c, 0))
            .unwrap();

        assert!(network.node(a).unwrap().outputs[0].floating_links.is_empty());
        assert!(network.node(c).unwrap().outputs[0].floating_links.contains(&floating));
        assert!(network.integrity_issues().is_empty());
    }

    #[test]
    fn test_prune_drops_links_that_moved_away() {
        let (mut network, _, _, link) = chained();
        let first = network.insert_reroute([10.0, 0.0], LinkSegment::Link(link)).unwrap();
        let second = network.insert_reroute([20.0, 0.0], LinkSegment::Link(link)).unwrap();
        network.set_reroute_parent(second, None).unwrap();

        assert_eq!(network.prune_reroute_links(first), 1);
        assert_eq!(network.prune_reroute_links(second), 0);
        assert_eq!(network.reroute(first).unwrap().total_links(), 0);
    }
}
