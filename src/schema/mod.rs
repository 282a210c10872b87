//! The persistent, authored state of a create-or-show node.
//!
//! A [`NodeSchema`] holds the fixed locator pins, the ordered table of user-defined
//! parameter slots, and the wiring of every input pin. It is the only state that is
//! saved with a [`GraphDocument`]; plans are always regenerated from it.

use crate::error::SchemaError;
use crate::value::{SlotType, Value};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

mod document;
pub mod pins;
pub mod surface;

pub use document::*;
pub use pins::RESERVED_NAMES;
pub use surface::*;

/// Stable identity of a parameter slot. Names are renamable, ids are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(pub u32);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot#{}", self.0)
    }
}

/// A user-defined, named and typed parameter on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSlot {
    pub id: SlotId,
    pub name: String,
    pub slot_type: SlotType,
    pub default: Option<Value>,
}

/// Ordered mapping from slot id to slot record.
///
/// Order is insertion order and is authoritative for lowering. The table is only
/// changed through the migrations in [`pins`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SlotTable {
    entries: Vec<ParameterSlot>,
    next_id: u32,
}

impl SlotTable {
    pub fn get(&self, id: SlotId) -> Option<&ParameterSlot> {
        self.entries.iter().find(|s| s.id == id)
    }

    pub fn position(&self, id: SlotId) -> Option<usize> {
        self.entries.iter().position(|s| s.id == id)
    }

    pub fn by_name(&self, name: &str) -> Option<&ParameterSlot> {
        self.entries.iter().find(|s| s.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParameterSlot> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get_mut(&mut self, id: SlotId) -> Option<&mut ParameterSlot> {
        self.entries.iter_mut().find(|s| s.id == id)
    }

    /// Allocates the next id. Once the allocator is exhausted, the lowest id not held
    /// by a live slot is handed out instead.
    fn push(&mut self, name: String, slot_type: SlotType, default: Option<Value>) -> SlotId {
        let id = match self.next_id.checked_add(1) {
            Some(next) => SlotId(std::mem::replace(&mut self.next_id, next)),
            None => (0..u32::MAX)
                .map(SlotId)
                .find(|id| self.get(*id).is_none())
                .unwrap_or(SlotId(u32::MAX)),
        };
        self.entries.push(ParameterSlot {
            id,
            name,
            slot_type,
            default,
        });
        id
    }

    fn remove(&mut self, id: SlotId) -> Option<ParameterSlot> {
        let index = self.position(id)?;
        Some(self.entries.remove(index))
    }
}

/// The non-dynamic input pins every create-or-show node carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FixedSlot {
    Context,
    Path,
    ItemId,
    Priority,
}

impl FixedSlot {
    pub const ALL: [FixedSlot; 4] = [
        FixedSlot::Context,
        FixedSlot::Path,
        FixedSlot::ItemId,
        FixedSlot::Priority,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FixedSlot::Context => "Context",
            FixedSlot::Path => "Path",
            FixedSlot::ItemId => "ItemId",
            FixedSlot::Priority => "Priority",
        }
    }

    pub fn slot_type(self) -> SlotType {
        match self {
            FixedSlot::Context => SlotType::Object,
            FixedSlot::Path | FixedSlot::ItemId => SlotType::String,
            FixedSlot::Priority => SlotType::Integer,
        }
    }

    /// The context pin falls back to the executing graph's own context when unwired.
    pub fn is_implicit(self) -> bool {
        self == FixedSlot::Context
    }
}

/// Name of the node's single output pin.
pub const OUTPUT_PIN: &str = "Handle";

/// Addresses an input pin on a node. Wiring is keyed by this, never by slot name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PinKey {
    Fixed(FixedSlot),
    Slot(SlotId),
}

impl fmt::Display for PinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinKey::Fixed(slot) => f.write_str(slot.name()),
            PinKey::Slot(id) => write!(f, "{}", id),
        }
    }
}

/// An output pin of some upstream producer in the host graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PinRef {
    pub node: String,
    pub pin: String,
}

impl PinRef {
    pub fn new(node: impl Into<String>, pin: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            pin: pin.into(),
        }
    }
}

impl fmt::Display for PinRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.pin)
    }
}

/// How the host graph lets a link be redirected during expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LinkMode {
    /// May fan out: the link is copied to every consuming step.
    #[default]
    Shared,
    /// Single consumer only: the link is moved to exactly one step.
    Exclusive,
}

/// A data connection from an upstream producer into one of this node's input pins.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub pin: PinKey,
    pub source: PinRef,
    pub source_type: SlotType,
    pub mode: LinkMode,
}

/// Literal defaults of the fixed locator pins.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FixedDefaults {
    pub path: Option<String>,
    pub item_id: Option<String>,
    pub priority: Option<i64>,
}

impl FixedDefaults {
    pub fn literal(&self, slot: FixedSlot) -> Option<Value> {
        match slot {
            FixedSlot::Context => None,
            FixedSlot::Path => self.path.clone().map(Value::String),
            FixedSlot::ItemId => self.item_id.clone().map(Value::String),
            FixedSlot::Priority => self.priority.map(Value::Integer),
        }
    }
}

/// One create-or-show node as authored in a graph document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSchema {
    id: String,
    fixed: FixedDefaults,
    slots: SlotTable,
    links: Vec<Connection>,
}

impl NodeSchema {
    /// Creates a node with no dynamic slots. `Priority` defaults to 0.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fixed: FixedDefaults {
                priority: Some(0),
                ..FixedDefaults::default()
            },
            slots: SlotTable::default(),
            links: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fixed(&self) -> &FixedDefaults {
        &self.fixed
    }

    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }

    pub fn slot(&self, id: SlotId) -> Option<&ParameterSlot> {
        self.slots.get(id)
    }

    pub fn links(&self) -> &[Connection] {
        &self.links
    }

    pub fn connection(&self, pin: PinKey) -> Option<&Connection> {
        self.links.iter().find(|c| c.pin == pin)
    }

    /// Display name of an input pin, used in diagnostics.
    pub fn pin_name(&self, pin: PinKey) -> String {
        match pin {
            PinKey::Fixed(slot) => slot.name().to_string(),
            PinKey::Slot(id) => self
                .slots
                .get(id)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| id.to_string()),
        }
    }

    /// Declared type of an input pin, if the pin exists.
    pub fn pin_type(&self, pin: PinKey) -> Option<SlotType> {
        match pin {
            PinKey::Fixed(slot) => Some(slot.slot_type()),
            PinKey::Slot(id) => self.slots.get(id).map(|s| s.slot_type),
        }
    }

    /// Re-checks the schema invariants. Used after loading a document.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let corrupt = |message: String| SchemaError::Corrupt {
            node_id: self.id.clone(),
            message,
        };

        if self.slots.next_id == u32::MAX {
            return Err(corrupt("slot id allocator is exhausted".to_string()));
        }
        if let Some(id) = self.slots.iter().map(|s| s.id).duplicates().next() {
            return Err(corrupt(format!("{} is declared twice", id)));
        }
        if let Some(name) = self.slots.iter().map(|s| s.name.as_str()).duplicates().next() {
            return Err(corrupt(format!("slot name '{}' is declared twice", name)));
        }
        for slot in self.slots.iter() {
            if slot.id.0 >= self.slots.next_id {
                return Err(corrupt(format!(
                    "{} is beyond the id allocator ({})",
                    slot.id, self.slots.next_id
                )));
            }
            if !pins::is_valid_name(&slot.name) || pins::is_reserved(&slot.name) {
                return Err(corrupt(format!("slot name '{}' is not allowed", slot.name)));
            }
            if let Some(default) = &slot.default {
                if default.slot_type() != slot.slot_type {
                    return Err(SchemaError::DefaultTypeMismatch {
                        slot: slot.name.clone(),
                        expected: slot.slot_type,
                        found: default.slot_type(),
                    });
                }
            }
        }
        if let Some(pin) = self.links.iter().map(|c| c.pin).duplicates().next() {
            return Err(corrupt(format!("pin {} has more than one connection", pin)));
        }
        for link in &self.links {
            if self.pin_type(link.pin).is_none() {
                return Err(corrupt(format!(
                    "link from {} targets missing pin {}",
                    link.source, link.pin
                )));
            }
        }
        Ok(())
    }
}
