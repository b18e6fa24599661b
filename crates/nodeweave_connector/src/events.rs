// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed events published by the connector.
//!
//! Listeners subscribe per [`EventKind`]. For cancelable kinds a listener can
//! return [`ControlFlow::Break`] to stop the operation that raised the event;
//! every listener still runs.

use crate::render_link::RenderLinkInfo;
use nodeweave_graph::{Link, NodeId, Point, RerouteId};
use std::fmt;
use std::ops::ControlFlow;

/// Event discriminant used for subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// An input link is about to be picked up
    BeforeMoveInput,
    /// An output link is about to be picked up
    BeforeMoveOutput,
    /// A new link was created
    LinkCreated,
    /// A picked-up input link was reconnected
    InputMoved,
    /// A picked-up output link was reconnected
    OutputMoved,
    /// Links were dropped on a node body
    DroppedOnNode,
    /// Links were dropped on a reroute
    DroppedOnReroute,
    /// Links were dropped on empty canvas
    DroppedOnCanvas,
    /// A drop is about to be resolved
    BeforeDropLinks,
    /// A drop was resolved
    AfterDropLinks,
    /// The connector is resetting
    Reset,
}

impl EventKind {
    /// Stable name of the event
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BeforeMoveInput => "before-move-input",
            Self::BeforeMoveOutput => "before-move-output",
            Self::LinkCreated => "link-created",
            Self::InputMoved => "input-moved",
            Self::OutputMoved => "output-moved",
            Self::DroppedOnNode => "dropped-on-node",
            Self::DroppedOnReroute => "dropped-on-reroute",
            Self::DroppedOnCanvas => "dropped-on-canvas",
            Self::BeforeDropLinks => "before-drop-links",
            Self::AfterDropLinks => "after-drop-links",
            Self::Reset => "reset",
        }
    }

    /// Whether a listener can stop the operation raising this event
    pub fn is_cancelable(self) -> bool {
        matches!(
            self,
            Self::BeforeMoveInput
                | Self::BeforeMoveOutput
                | Self::DroppedOnNode
                | Self::DroppedOnReroute
                | Self::DroppedOnCanvas
                | Self::BeforeDropLinks
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event with its payload
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectorEvent {
    /// An input link is about to be picked up
    BeforeMoveInput(RenderLinkInfo),
    /// An output link is about to be picked up
    BeforeMoveOutput(RenderLinkInfo),
    /// A new link was created
    LinkCreated(Link),
    /// A picked-up input link was reconnected
    InputMoved(RenderLinkInfo),
    /// A picked-up output link was reconnected
    OutputMoved(RenderLinkInfo),
    /// Links were dropped on a node body
    DroppedOnNode {
        /// Node dropped on
        node: NodeId,
        /// Drop position
        pos: Point,
    },
    /// Links were dropped on a reroute
    DroppedOnReroute {
        /// Reroute dropped on
        reroute: RerouteId,
        /// Drop position
        pos: Point,
    },
    /// Links were dropped on empty canvas
    DroppedOnCanvas {
        /// Drop position
        pos: Point,
    },
    /// A drop is about to be resolved
    BeforeDropLinks {
        /// Links being dropped
        render_links: Vec<RenderLinkInfo>,
        /// Drop position
        pos: Point,
    },
    /// A drop was resolved
    AfterDropLinks {
        /// Links that were dropped
        render_links: Vec<RenderLinkInfo>,
        /// Drop position
        pos: Point,
    },
    /// The connector is resetting
    Reset {
        /// Reset requested even when idle
        force: bool,
    },
}

impl ConnectorEvent {
    /// Kind of this event
    pub fn kind(&self) -> EventKind {
        match self {
            Self::BeforeMoveInput(_) => EventKind::BeforeMoveInput,
            Self::BeforeMoveOutput(_) => EventKind::BeforeMoveOutput,
            Self::LinkCreated(_) => EventKind::LinkCreated,
            Self::InputMoved(_) => EventKind::InputMoved,
            Self::OutputMoved(_) => EventKind::OutputMoved,
            Self::DroppedOnNode { .. } => EventKind::DroppedOnNode,
            Self::DroppedOnReroute { .. } => EventKind::DroppedOnReroute,
            Self::DroppedOnCanvas { .. } => EventKind::DroppedOnCanvas,
            Self::BeforeDropLinks { .. } => EventKind::BeforeDropLinks,
            Self::AfterDropLinks { .. } => EventKind::AfterDropLinks,
            Self::Reset { .. } => EventKind::Reset,
        }
    }
}

/// Handle returned by a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback = Box<dyn FnMut(&ConnectorEvent) -> ControlFlow<()>>;

struct Listener {
    id: ListenerId,
    kind: EventKind,
    once: bool,
    until_reset: bool,
    callback: Callback,
}

/// Subscription registry and dispatcher
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Listener>,
    next_id: u64,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen for every event of `kind`
    pub fn subscribe(
        &mut self,
        kind: EventKind,
        callback: impl FnMut(&ConnectorEvent) -> ControlFlow<()> + 'static,
    ) -> ListenerId {
        self.add(kind, false, false, Box::new(callback))
    }

    /// Listen for the next event of `kind` only
    pub fn once(
        &mut self,
        kind: EventKind,
        callback: impl FnMut(&ConnectorEvent) -> ControlFlow<()> + 'static,
    ) -> ListenerId {
        self.add(kind, true, false, Box::new(callback))
    }

    /// Listen for `kind` until the next reset is dispatched
    pub fn listen_until_reset(
        &mut self,
        kind: EventKind,
        callback: impl FnMut(&ConnectorEvent) -> ControlFlow<()> + 'static,
    ) -> ListenerId {
        self.add(kind, false, true, Box::new(callback))
    }

    fn add(&mut self, kind: EventKind, once: bool, until_reset: bool, callback: Callback) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.push(Listener {
            id,
            kind,
            once,
            until_reset,
            callback,
        });
        id
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        self.listeners.len() != before
    }

    /// Number of listeners for `kind`
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.iter().filter(|l| l.kind == kind).count()
    }

    /// Deliver an event to its listeners.
    ///
    /// Returns `false` when the event is cancelable and a listener asked to
    /// stop. Dispatching a reset also drops the until-reset listeners.
    pub fn dispatch(&mut self, event: &ConnectorEvent) -> bool {
        let kind = event.kind();
        let mut proceed = true;
        for listener in self.listeners.iter_mut().filter(|l| l.kind == kind) {
            if (listener.callback)(event).is_break() {
                proceed = false;
            }
        }

        self.listeners.retain(|l| !(l.once && l.kind == kind));
        if kind == EventKind::Reset {
            self.listeners.retain(|l| !l.until_reset);
        }

        if !proceed && !kind.is_cancelable() {
            tracing::warn!(event = %kind, "Ignoring cancellation of a non-cancelable event");
            return true;
        }
        tracing::trace!(event = %kind, proceed, "Dispatched connector event");
        proceed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_cancelable_dispatch() {
        let mut bus = EventBus::new();
        let seen = Rc::new(Cell::new(0));
        let counter = seen.clone();
        bus.subscribe(EventKind::DroppedOnCanvas, move |_| {
            counter.set(counter.get() + 1);
            ControlFlow::Continue(())
        });
        bus.subscribe(EventKind::DroppedOnCanvas, |_| ControlFlow::Break(()));

        assert!(!bus.dispatch(&ConnectorEvent::DroppedOnCanvas { pos: [0.0, 0.0] }));
        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn test_non_cancelable_ignores_break() {
        let mut bus = EventBus::new();
        bus.subscribe(EventKind::AfterDropLinks, |_| ControlFlow::Break(()));

        let event = ConnectorEvent::AfterDropLinks {
            render_links: Vec::new(),
            pos: [0.0, 0.0],
        };
        assert!(bus.dispatch(&event));
    }

    #[test]
    fn test_once_and_until_reset() {
        let mut bus = EventBus::new();
        bus.once(EventKind::Reset, |_| ControlFlow::Continue(()));
        bus.listen_until_reset(EventKind::InputMoved, |_| ControlFlow::Continue(()));
        let kept = bus.subscribe(EventKind::InputMoved, |_| ControlFlow::Continue(()));
        assert_eq!(bus.listener_count(EventKind::InputMoved), 2);

        bus.dispatch(&ConnectorEvent::Reset { force: false });

        assert_eq!(bus.listener_count(EventKind::Reset), 0);
        assert_eq!(bus.listener_count(EventKind::InputMoved), 1);
        assert!(bus.unsubscribe(kept));
        assert!(!bus.unsubscribe(kept));
    }

    #[test]
    fn test_event_names() {
        assert_eq!(EventKind::BeforeDropLinks.as_str(), "before-drop-links");
        assert_eq!(ConnectorEvent::Reset { force: true }.kind().to_string(), "reset");
    }
}
