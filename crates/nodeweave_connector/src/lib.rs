// SPDX-License-Identifier: MIT OR Apache-2.0
//! Drag-to-connect engine for node-graph editors.
//!
//! This crate turns pointer gestures into edits of a [`LinkNetwork`]:
//! - Picking up existing links by either end, or dragging new ones
//! - Resolving a drop onto a node, slot, reroute, subgraph port or canvas
//! - Re-sourcing reroute chains and leaving floating links behind
//! - Notifying listeners through a cancelable event bus
//!
//! ## Architecture
//!
//! [`LinkConnector`] owns the gesture state and a list of [`RenderLink`]s,
//! one per dragged link. Each render link knows which targets it may
//! connect to and how to commit itself. The network is borrowed per call;
//! the connector never holds on to it.
//!
//! [`LinkNetwork`]: nodeweave_graph::LinkNetwork

pub mod connector;
pub mod error;
pub mod events;
pub mod legacy;
pub mod locator;
pub mod render_link;
pub mod repair;
pub mod settings;
pub mod state;

pub use connector::{ConnectorExport, LinkConnector};
pub use error::{ConnectorError, Result};
pub use events::{ConnectorEvent, EventBus, EventKind, ListenerId};
pub use legacy::{ConnectingLink, LegacySink};
pub use locator::ItemLocator;
pub use render_link::{RenderLink, RenderLinkInfo, RenderLinkKind};
pub use settings::ConnectorSettings;
pub use state::ConnectorState;
