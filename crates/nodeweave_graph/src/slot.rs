// SPDX-License-Identifier: MIT OR Apache-2.0
//! Slot definitions for node inputs/outputs.

use crate::link::LinkId;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Slot direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotDirection {
    /// Input slot (link target)
    Input,
    /// Output slot (link origin)
    Output,
}

impl SlotDirection {
    /// The other direction
    pub fn opposite(self) -> Self {
        match self {
            Self::Input => Self::Output,
            Self::Output => Self::Input,
        }
    }
}

impl fmt::Display for SlotDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Output => f.write_str("output"),
        }
    }
}

/// Data type carried by a slot.
///
/// Types are free-form names. `*` and the empty string are wildcards, and a
/// comma-separated name (`"FLOAT,INT"`) accepts any of its members. Matching
/// ignores case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotType(String);

impl SlotType {
    /// Wildcard type name
    pub const ANY: &'static str = "*";

    /// Create a slot type from its name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The wildcard type
    pub fn any() -> Self {
        Self(Self::ANY.to_owned())
    }

    /// Type name as written
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this type accepts anything
    pub fn is_wildcard(&self) -> bool {
        is_wildcard(&self.0)
    }

    /// Check if a link carrying `self` may attach to a slot of type `other`
    pub fn is_compatible(&self, other: &SlotType) -> bool {
        types_match(&self.0, &other.0)
    }
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SlotType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

fn is_wildcard(name: &str) -> bool {
    matches!(name.trim(), "" | SlotType::ANY)
}

fn types_match(a: &str, b: &str) -> bool {
    if is_wildcard(a) || is_wildcard(b) || a == b {
        return true;
    }

    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if !a.contains(',') && !b.contains(',') {
        return a.trim() == b.trim();
    }

    a.split(',')
        .any(|left| b.split(',').any(|right| types_match(left, right)))
}

/// Common view over input and output slots
pub trait Slot {
    /// Direction of this slot kind
    const DIRECTION: SlotDirection;

    /// Display name
    fn name(&self) -> &str;

    /// Declared type
    fn slot_type(&self) -> &SlotType;

    /// Whether at least one resolved link uses this slot
    fn is_connected(&self) -> bool;
}

/// An input slot on a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSlot {
    /// Slot name
    pub name: String,
    /// Accepted type
    pub slot_type: SlotType,
    /// The single resolved link feeding this input
    pub link: Option<LinkId>,
    /// Floating links whose dangling end is anchored here
    #[serde(default)]
    pub floating_links: IndexSet<LinkId>,
}

impl InputSlot {
    /// Create a new unconnected input
    pub fn new(name: impl Into<String>, slot_type: impl Into<SlotType>) -> Self {
        Self {
            name: name.into(),
            slot_type: slot_type.into(),
            link: None,
            floating_links: IndexSet::new(),
        }
    }
}

impl Slot for InputSlot {
    const DIRECTION: SlotDirection = SlotDirection::Input;

    fn name(&self) -> &str {
        &self.name
    }

    fn slot_type(&self) -> &SlotType {
        &self.slot_type
    }

    fn is_connected(&self) -> bool {
        self.link.is_some()
    }
}

/// An output slot on a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSlot {
    /// Slot name
    pub name: String,
    /// Produced type
    pub slot_type: SlotType,
    /// Resolved links leaving this output, in connection order
    pub links: Vec<LinkId>,
    /// Floating links whose dangling end is anchored here
    #[serde(default)]
    pub floating_links: IndexSet<LinkId>,
}

impl OutputSlot {
    /// Create a new unconnected output
    pub fn new(name: impl Into<String>, slot_type: impl Into<SlotType>) -> Self {
        Self {
            name: name.into(),
            slot_type: slot_type.into(),
            links: Vec::new(),
            floating_links: IndexSet::new(),
        }
    }
}

impl Slot for OutputSlot {
    const DIRECTION: SlotDirection = SlotDirection::Output;

    fn name(&self) -> &str {
        &self.name
    }

    fn slot_type(&self) -> &SlotType {
        &self.slot_type
    }

    fn is_connected(&self) -> bool {
        !self.links.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcards_match_everything() {
        let any = SlotType::any();
        assert!(any.is_compatible(&SlotType::new("IMAGE")));
        assert!(SlotType::new("IMAGE").is_compatible(&SlotType::new("")));
    }

    #[test]
    fn test_union_types() {
        let union = SlotType::new("FLOAT,INT");
        assert!(union.is_compatible(&SlotType::new("int")));
        assert!(SlotType::new("Float").is_compatible(&union));
        assert!(!union.is_compatible(&SlotType::new("STRING")));
    }

    #[test]
    fn test_distinct_types_rejected() {
        assert!(!SlotType::new("IMAGE").is_compatible(&SlotType::new("LATENT")));
        assert!(SlotType::new("image").is_compatible(&SlotType::new("IMAGE")));
    }
}
