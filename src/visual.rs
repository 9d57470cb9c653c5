//! Hooks for watching a search unfold.

use derive_more::Display;

use crate::grid::Coord;
use crate::grid::Node;

/// Receives node-set transitions from [`crate::algorithms::astar::AStarStepper`].
///
/// `animate` is set when the caller paces the search with a non-zero delay.
pub trait VisualSink {
    /// `node` entered the open set or got a cheaper path.
    fn notify_opened(&mut self, node: &Node, animate: bool);
    /// `node` was expanded.
    fn notify_closed(&mut self, node: &Node, animate: bool);
}

impl<V: VisualSink + ?Sized> VisualSink for &mut V {
    fn notify_opened(&mut self, node: &Node, animate: bool) {
        (**self).notify_opened(node, animate)
    }
    fn notify_closed(&mut self, node: &Node, animate: bool) {
        (**self).notify_closed(node, animate)
    }
}

/// Ignores everything.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoVisuals;

impl VisualSink for NoVisuals {
    fn notify_opened(&mut self, _node: &Node, _animate: bool) {}
    fn notify_closed(&mut self, _node: &Node, _animate: bool) {}
}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum VisualEvent {
    #[display("open {_0}")]
    Opened(Coord, bool),
    #[display("close {_0}")]
    Closed(Coord, bool),
}

impl VisualEvent {
    pub fn coord(&self) -> Coord {
        match self {
            VisualEvent::Opened(c, _) | VisualEvent::Closed(c, _) => *c,
        }
    }
}

/// Keeps every notification in order.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<VisualEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands over the events recorded so far.
    pub fn drain(&mut self) -> std::vec::Drain<'_, VisualEvent> {
        self.events.drain(..)
    }
}

impl VisualSink for RecordingSink {
    fn notify_opened(&mut self, node: &Node, animate: bool) {
        self.events.push(VisualEvent::Opened(node.coord(), animate));
    }
    fn notify_closed(&mut self, node: &Node, animate: bool) {
        self.events.push(VisualEvent::Closed(node.coord(), animate));
    }
}
