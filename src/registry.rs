//! Handles shared between the field, the input widget and the pulse engine.
//!
//! Everything here lives on the single frame-loop thread, so plain `Rc`
//! cells are enough. Each handle is cheap to clone; clones see the same slot.

use crate::geometry::Point;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// A particle as published by the field: position plus neighbour positions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Node {
    pub x: f32,
    pub y: f32,
    pub links: Vec<Point>,
}

impl Node {
    pub fn pos(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn degree(&self) -> usize {
        self.links.len()
    }
}

/// Single-writer snapshot slot. Readers must tolerate empty or replaced snapshots.
#[derive(Clone, Default)]
pub struct NodeRegistry {
    nodes: Rc<RefCell<Vec<Node>>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole snapshot
    pub fn publish(&self, nodes: Vec<Node>) {
        *self.nodes.borrow_mut() = nodes;
    }

    pub fn with_nodes<R>(&self, f: impl FnOnce(&[Node]) -> R) -> R {
        f(&self.nodes.borrow())
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Current search text length, written by the input widget.
#[derive(Clone, Default)]
pub struct TypingSignal {
    intensity: Rc<Cell<usize>>,
}

impl TypingSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, intensity: usize) {
        self.intensity.set(intensity);
    }

    pub fn get(&self) -> usize {
        self.intensity.get()
    }
}

#[derive(Default)]
struct TriggerState {
    major: bool,
    minor: u32,
}

/// Latched major/minor pulse requests, drained by the engine on its next frame.
#[derive(Clone, Default)]
pub struct PulseTriggers {
    state: Rc<RefCell<TriggerState>>,
}

impl PulseTriggers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Search submitted
    pub fn major(&self) {
        self.state.borrow_mut().major = true;
    }

    pub fn minor(&self) {
        self.state.borrow_mut().minor += 1;
    }

    /// Drain pending requests: (major requested, minor count)
    pub fn take(&self) -> (bool, u32) {
        let mut state = self.state.borrow_mut();
        let pending = (state.major, state.minor);
        *state = TriggerState::default();
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_snapshot() {
        let writer = NodeRegistry::new();
        let reader = writer.clone();
        assert!(reader.is_empty());

        writer.publish(vec![Node { x: 1.0, y: 2.0, links: vec![Point::new(3.0, 4.0)] }]);
        assert_eq!(reader.len(), 1);
        assert_eq!(reader.with_nodes(|n| n[0].degree()), 1);
    }

    #[test]
    fn triggers_latch_until_taken() {
        let triggers = PulseTriggers::new();
        let handle = triggers.clone();
        handle.major();
        handle.major();
        handle.minor();
        handle.minor();

        assert_eq!(triggers.take(), (true, 2));
        assert_eq!(triggers.take(), (false, 0));
    }

    #[test]
    fn typing_signal_round_trips() {
        let signal = TypingSignal::new();
        signal.clone().set(7);
        assert_eq!(signal.get(), 7);
    }
}
