// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reroute chain repair.
//!
//! Dropping an input-seeking link on a reroute re-sources every input the
//! reroute feeds from the link's fixed end. The reroute is re-parented onto
//! the new path, and the reroutes it used to hang from are released: a
//! reroute left carrying nothing becomes the tip of a floating chain, unless
//! it was already floating toward the side that was vacated, in which case
//! it is removed.

use crate::error::Result;
use crate::events::EventBus;
use crate::render_link::RenderLink;
use nodeweave_graph::{Link, LinkId, LinkNetwork, RerouteId, RerouteTarget, SlotDirection};

/// Whether `link` may take over `target`, which is reached through `reroute`
pub fn can_connect_input_link_to_reroute(
    link: &RenderLink,
    network: &LinkNetwork,
    target: &RerouteTarget,
    reroute: RerouteId,
) -> bool {
    if !link.can_connect_to_input(network, target.node, target.input) {
        return false;
    }

    let from_reroute = link.from_reroute();
    if from_reroute == Some(reroute) || network.link_chain(from_reroute).contains(&reroute) {
        return false;
    }

    if matches!(link, RenderLink::ToInput(_) | RenderLink::ToInputFromIoNode(_)) {
        let Some(current) = network.reroute(reroute) else {
            return false;
        };
        match current.parent_id {
            // Already fed straight from this output
            None => {
                let from = link.from();
                let same_origin = current
                    .first_link_id()
                    .and_then(|id| network.link(id))
                    .is_some_and(|l| l.has_origin(from.node, from.slot));
                if same_origin {
                    return false;
                }
            }
            // Already hanging from this reroute
            Some(parent) => {
                if from_reroute == Some(parent) {
                    return false;
                }
            }
        }
    }
    true
}

/// Re-source everything downstream of `reroute` from `link`'s fixed end.
///
/// Inputs the link cannot feed keep their current links. Nothing is changed
/// when no input can be re-sourced.
pub fn connect_output_to_reroute(
    network: &mut LinkNetwork,
    events: &mut EventBus,
    reroute: RerouteId,
    link: &RenderLink,
) -> Result<()> {
    if link.to_type() != SlotDirection::Input || !link.can_connect_to_reroute(network, reroute) {
        tracing::debug!(%reroute, kind = ?link.kind(), "Link cannot be routed through reroute");
        return Ok(());
    }

    let chain = network.reroute_chain(reroute)?;
    let original = released_walk(network, chain.iter().rev().skip(1).copied());

    let targets: Vec<RerouteTarget> = network
        .find_target_inputs(reroute)
        .into_iter()
        .filter(|target| can_connect_input_link_to_reroute(link, network, target, reroute))
        .collect();
    if targets.is_empty() {
        tracing::debug!(%reroute, "No input downstream of reroute accepts the link");
        return Ok(());
    }

    let through: Vec<(LinkId, bool)> = network
        .reroute(reroute)
        .map(|r| {
            let resolved = r.link_ids.iter().map(|id| (*id, false));
            let floating = r.floating_link_ids.iter().map(|id| (*id, true));
            resolved.chain(floating).collect()
        })
        .unwrap_or_default();
    let template = targets
        .iter()
        .filter_map(|t| {
            if t.floating {
                network.floating_link(t.link)
            } else {
                network.link(t.link)
            }
        })
        .find(|l| l.origin.is_some())
        .cloned();

    if !matches!(link, RenderLink::Floating(_)) {
        network.set_floating_link_origin(reroute, link.from())?;
    }

    for target in &targets {
        if let Err(err) = link.connect_to_reroute_input(network, events, reroute, target) {
            tracing::warn!(%err, node = ?target.node, input = target.input, "Failed to re-source input through reroute");
        }
    }

    for (id, floating) in through {
        network.sync_reroute_membership(id, floating);
    }
    for (id, _) in &original {
        network.prune_reroute_links(*id);
    }
    if let Some(template) = template {
        release_reroutes(
            network,
            &original,
            link.from_reroute(),
            &template,
            SlotDirection::Output,
        );
    }

    tracing::debug!(%reroute, count = targets.len(), "Re-sourced inputs through reroute");
    Ok(())
}

/// Snapshot of reroutes about to be released, with the side each one was
/// floating toward before any change
pub fn released_walk(
    network: &LinkNetwork,
    ids: impl IntoIterator<Item = RerouteId>,
) -> Vec<(RerouteId, Option<SlotDirection>)> {
    ids.into_iter()
        .filter_map(|id| network.reroute(id).map(|r| (id, r.floating)))
        .collect()
}

/// Walk a released chain from its downstream end, stopping at `stop_at`.
///
/// Reroutes still carrying links are left alone. An empty reroute becomes a
/// floating terminus attached on the `remaining` side, built from
/// `template`; one that was already floating toward the other side has
/// nothing left to attach to and is removed.
pub fn release_reroutes(
    network: &mut LinkNetwork,
    walk: &[(RerouteId, Option<SlotDirection>)],
    stop_at: Option<RerouteId>,
    template: &Link,
    remaining: SlotDirection,
) {
    let vacated = remaining.opposite();
    for &(id, was_floating) in walk {
        if Some(id) == stop_at {
            break;
        }
        let Some(reroute) = network.reroute(id) else {
            continue;
        };
        if reroute.total_links() > 0 {
            continue;
        }
        if was_floating == Some(vacated) {
            network.remove_reroute(id);
            tracing::debug!(reroute = %id, "Removed released reroute");
            continue;
        }

        let floating = template.to_floating(remaining, Some(id));
        if floating.attached_side() != Some(remaining) {
            network.remove_reroute(id);
            continue;
        }
        network.add_floating_link(floating);
        if let Some(reroute) = network.reroute_mut(id) {
            reroute.floating = Some(remaining);
        }
        tracing::debug!(reroute = %id, side = %remaining, "Released reroute left floating");
    }
}
