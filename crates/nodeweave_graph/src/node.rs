// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the link network.

use crate::slot::{InputSlot, OutputSlot, Slot, SlotType};
use crate::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default node width, used to place output slots
pub const NODE_WIDTH: f32 = 160.0;
/// Height of the node title bar
pub const NODE_TITLE_HEIGHT: f32 = 30.0;
/// Vertical spacing between slots
pub const NODE_SLOT_HEIGHT: f32 = 20.0;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// A node instance in the network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Display title
    pub title: String,
    /// Top-left corner in canvas space
    pub position: Point,
    /// Input slots
    pub inputs: Vec<InputSlot>,
    /// Output slots
    pub outputs: Vec<OutputSlot>,
}

impl Node {
    /// Create a new node without slots
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            title: title.into(),
            position: [0.0, 0.0],
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Append an input slot
    pub fn with_input(mut self, name: impl Into<String>, slot_type: impl Into<SlotType>) -> Self {
        self.inputs.push(InputSlot::new(name, slot_type));
        self
    }

    /// Append an output slot
    pub fn with_output(mut self, name: impl Into<String>, slot_type: impl Into<SlotType>) -> Self {
        self.outputs.push(OutputSlot::new(name, slot_type));
        self
    }

    /// Get an input slot by index
    pub fn input(&self, index: usize) -> Option<&InputSlot> {
        self.inputs.get(index)
    }

    /// Get a mutable input slot by index
    pub fn input_mut(&mut self, index: usize) -> Option<&mut InputSlot> {
        self.inputs.get_mut(index)
    }

    /// Get an output slot by index
    pub fn output(&self, index: usize) -> Option<&OutputSlot> {
        self.outputs.get(index)
    }

    /// Get a mutable output slot by index
    pub fn output_mut(&mut self, index: usize) -> Option<&mut OutputSlot> {
        self.outputs.get_mut(index)
    }

    /// Canvas position of an input slot's connection point
    pub fn input_pos(&self, index: usize) -> Point {
        [self.position[0], self.slot_y(index)]
    }

    /// Canvas position of an output slot's connection point
    pub fn output_pos(&self, index: usize) -> Point {
        [self.position[0] + NODE_WIDTH, self.slot_y(index)]
    }

    fn slot_y(&self, index: usize) -> f32 {
        self.position[1] + NODE_TITLE_HEIGHT + (index as f32 + 0.5) * NODE_SLOT_HEIGHT
    }

    /// First input able to accept `slot_type`.
    ///
    /// Free typed inputs win over free wildcard inputs, which win over
    /// occupied ones.
    pub fn find_input_by_type(&self, slot_type: &SlotType) -> Option<usize> {
        find_slot_by_type(&self.inputs, slot_type)
    }

    /// First output able to provide `slot_type`, same preference as inputs
    pub fn find_output_by_type(&self, slot_type: &SlotType) -> Option<usize> {
        find_slot_by_type(&self.outputs, slot_type)
    }
}

fn find_slot_by_type<S: Slot>(slots: &[S], slot_type: &SlotType) -> Option<usize> {
    let typed = |slot: &S| !slot.slot_type().is_wildcard() && slot.slot_type().is_compatible(slot_type);
    let wildcard = |slot: &S| slot.slot_type().is_wildcard();

    let find = |matches: &dyn Fn(&S) -> bool, occupied: bool| {
        slots
            .iter()
            .position(|slot| slot.is_connected() == occupied && matches(slot))
    };

    find(&typed, false)
        .or_else(|| find(&wildcard, false))
        .or_else(|| find(&typed, true))
        .or_else(|| find(&wildcard, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::LinkId;

    #[test]
    fn test_find_input_prefers_free_typed_slot() {
        let mut node = Node::new("Blend")
            .with_input("any", "*")
            .with_input("a", "IMAGE")
            .with_input("b", "IMAGE");
        node.inputs[1].link = Some(LinkId(1));

        assert_eq!(node.find_input_by_type(&SlotType::new("IMAGE")), Some(2));
    }

    #[test]
    fn test_find_input_falls_back_to_wildcard_then_occupied() {
        let mut node = Node::new("Preview")
            .with_input("image", "IMAGE")
            .with_input("any", "*");
        node.inputs[0].link = Some(LinkId(1));
        assert_eq!(node.find_input_by_type(&SlotType::new("IMAGE")), Some(1));

        node.inputs[1].link = Some(LinkId(2));
        assert_eq!(node.find_input_by_type(&SlotType::new("IMAGE")), Some(0));
        assert_eq!(node.find_input_by_type(&SlotType::new("MASK")), Some(1));
    }

    #[test]
    fn test_slot_positions() {
        let node = Node::new("Math").with_position(100.0, 50.0);
        assert_eq!(node.input_pos(0), [100.0, 90.0]);
        assert_eq!(node.output_pos(1), [260.0, 110.0]);
    }
}
