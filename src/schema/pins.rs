//! Slot-set migrations: the only ways a node's parameter schema can change.

use super::{Connection, FixedSlot, LinkMode, NodeSchema, OUTPUT_PIN, ParameterSlot, PinKey, PinRef, SlotId};
use crate::error::{SchemaError, SchemaWarning};
use crate::value::{SlotType, Value};
use log::{debug, warn};

/// Pin names owned by the node itself. A parameter slot can never take one of these.
pub const RESERVED_NAMES: [&str; 5] = ["Context", "Path", "ItemId", "Priority", OUTPUT_PIN];

const AUTO_NAME_BASE: &str = "Param";

pub(crate) fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.trim() == name && !name.chars().any(char::is_control)
}

impl NodeSchema {
    fn name_taken(&self, name: &str, except: Option<SlotId>) -> bool {
        is_reserved(name)
            || self
                .slots
                .iter()
                .any(|s| s.name == name && Some(s.id) != except)
    }

    /// Returns `proposed` if it is free, otherwise the first free `proposed_N`.
    ///
    /// `renaming` names a slot whose current name does not count as taken.
    pub fn unique_name(&self, proposed: Option<&str>, renaming: Option<SlotId>) -> String {
        let base = proposed
            .map(str::trim)
            .filter(|n| is_valid_name(n))
            .unwrap_or(AUTO_NAME_BASE);
        if !self.name_taken(base, renaming) {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{}_{}", base, n))
            .find(|candidate| !self.name_taken(candidate, renaming))
            .unwrap_or_else(|| base.to_string())
    }

    /// Appends a new slot. A missing or colliding name is disambiguated.
    pub fn add_slot(&mut self, proposed: Option<&str>, slot_type: SlotType) -> SlotId {
        let name = self.unique_name(proposed, None);
        let id = self.slots.push(name, slot_type, None);
        debug!(
            "Node '{}': added {} '{}' ({})",
            self.id,
            id,
            self.pin_name(PinKey::Slot(id)),
            slot_type
        );
        id
    }

    /// Appends a new slot whose type is taken from its literal default.
    pub fn add_slot_with_default(&mut self, proposed: Option<&str>, default: Value) -> SlotId {
        let name = self.unique_name(proposed, None);
        let slot_type = default.slot_type();
        let id = self.slots.push(name, slot_type, Some(default));
        debug!(
            "Node '{}': added {} '{}' ({}) with a default",
            self.id,
            id,
            self.pin_name(PinKey::Slot(id)),
            slot_type
        );
        id
    }

    /// Removes a slot and any wiring attached to it. Remaining slots keep their order.
    pub fn remove_slot(&mut self, id: SlotId) -> Result<ParameterSlot, SchemaError> {
        let removed = self.slots.remove(id).ok_or(SchemaError::SlotNotFound(id))?;
        self.links.retain(|c| c.pin != PinKey::Slot(id));
        debug!("Node '{}': removed {} '{}'", self.id, id, removed.name);
        Ok(removed)
    }

    /// Renames a slot. Connections are keyed by id and are not touched.
    pub fn rename_slot(&mut self, id: SlotId, new_name: &str) -> Result<(), SchemaError> {
        let new_name = new_name.trim();
        if !is_valid_name(new_name) {
            return Err(SchemaError::InvalidName(new_name.to_string()));
        }
        if self.slots.get(id).is_none() {
            return Err(SchemaError::SlotNotFound(id));
        }
        if self.name_taken(new_name, Some(id)) {
            let existing = self
                .slots
                .by_name(new_name)
                .map(|s| s.id.to_string())
                .unwrap_or_else(|| "fixed pin".to_string());
            return Err(SchemaError::DuplicateName {
                name: new_name.to_string(),
                existing,
            });
        }
        let slot = self.slots.get_mut(id).ok_or(SchemaError::SlotNotFound(id))?;
        debug!("Node '{}': renamed {} '{}' to '{}'", self.id, id, slot.name, new_name);
        slot.name = new_name.to_string();
        Ok(())
    }

    /// Renames a slot, suffixing the name instead of failing on a collision.
    pub fn rename_slot_disambiguated(
        &mut self,
        id: SlotId,
        new_name: &str,
    ) -> Result<String, SchemaError> {
        if !is_valid_name(new_name.trim()) {
            return Err(SchemaError::InvalidName(new_name.to_string()));
        }
        let name = self.unique_name(Some(new_name), Some(id));
        self.rename_slot(id, &name)?;
        Ok(name)
    }

    /// Replaces a slot's declared type in place.
    ///
    /// Connections whose source type no longer fits are dropped and reported; so is a
    /// default that cannot be converted. Compatible links and defaults survive.
    pub fn change_slot_type(
        &mut self,
        id: SlotId,
        new_type: SlotType,
    ) -> Result<Vec<SchemaWarning>, SchemaError> {
        let node_id = self.id.clone();
        let slot = self.slots.get_mut(id).ok_or(SchemaError::SlotNotFound(id))?;
        if slot.slot_type == new_type {
            return Ok(Vec::new());
        }

        let mut warnings = Vec::new();
        slot.slot_type = new_type;
        if let Some(default) = slot.default.take() {
            slot.default = default.coerce_to(new_type);
            if slot.default.is_none() {
                warnings.push(SchemaWarning::DefaultDiscarded {
                    slot: slot.name.clone(),
                    new_type,
                });
            }
        }
        let slot_name = slot.name.clone();

        self.links.retain(|link| {
            if link.pin != PinKey::Slot(id) || new_type.accepts(link.source_type) {
                return true;
            }
            warnings.push(SchemaWarning::LinkDropped {
                slot: slot_name.clone(),
                source: link.source.clone(),
                source_type: link.source_type,
                new_type,
            });
            false
        });

        for warning in &warnings {
            warn!("Node '{}': {}", node_id, warning);
        }
        Ok(warnings)
    }

    /// Sets or clears a slot's literal default. The literal must match the slot type.
    pub fn set_slot_default(
        &mut self,
        id: SlotId,
        default: Option<Value>,
    ) -> Result<(), SchemaError> {
        let slot = self.slots.get_mut(id).ok_or(SchemaError::SlotNotFound(id))?;
        if let Some(value) = &default {
            if value.slot_type() != slot.slot_type {
                return Err(SchemaError::DefaultTypeMismatch {
                    slot: slot.name.clone(),
                    expected: slot.slot_type,
                    found: value.slot_type(),
                });
            }
        }
        debug!("Node '{}': default of '{}' set to {:?}", self.id, slot.name, default);
        slot.default = default;
        Ok(())
    }

    pub fn set_path(&mut self, path: Option<&str>) {
        self.fixed.path = path.map(str::to_string);
    }

    pub fn set_item_id(&mut self, item_id: Option<&str>) {
        self.fixed.item_id = item_id.map(str::to_string);
    }

    pub fn set_priority(&mut self, priority: Option<i64>) {
        self.fixed.priority = priority;
    }

    /// Wires an upstream output into an input pin, replacing any previous connection.
    pub fn connect(
        &mut self,
        pin: PinKey,
        source: PinRef,
        source_type: SlotType,
        mode: LinkMode,
    ) -> Result<Option<Connection>, SchemaError> {
        let expected = match pin {
            PinKey::Fixed(slot) => slot.slot_type(),
            PinKey::Slot(id) => {
                self.slots
                    .get(id)
                    .ok_or(SchemaError::SlotNotFound(id))?
                    .slot_type
            }
        };
        if !expected.accepts(source_type) {
            return Err(SchemaError::IncompatibleLink {
                pin: self.pin_name(pin),
                expected,
                found: source_type,
            });
        }
        let previous = self.disconnect(pin);
        self.links.push(Connection {
            pin,
            source,
            source_type,
            mode,
        });
        Ok(previous)
    }

    /// Shorthand for wiring a fixed pin.
    pub fn connect_fixed(
        &mut self,
        slot: FixedSlot,
        source: PinRef,
        mode: LinkMode,
    ) -> Result<Option<Connection>, SchemaError> {
        self.connect(PinKey::Fixed(slot), source, slot.slot_type(), mode)
    }

    pub fn disconnect(&mut self, pin: PinKey) -> Option<Connection> {
        let index = self.links.iter().position(|c| c.pin == pin)?;
        Some(self.links.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(schema: &NodeSchema) -> Vec<&str> {
        schema.slots().iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn colliding_and_missing_names_are_suffixed() {
        let mut node = NodeSchema::new("n");
        node.add_slot(Some("Title"), SlotType::String);
        node.add_slot(Some("Title"), SlotType::String);
        node.add_slot(None, SlotType::Integer);
        node.add_slot(Some("  "), SlotType::Integer);
        node.add_slot(Some("Path"), SlotType::String);
        assert_eq!(names(&node), ["Title", "Title_1", "Param", "Param_1", "Path_1"]);
    }

    #[test]
    fn remove_keeps_relative_order_and_drops_wiring() {
        let mut node = NodeSchema::new("n");
        let a = node.add_slot(Some("A"), SlotType::Integer);
        let b = node.add_slot(Some("B"), SlotType::Integer);
        let c = node.add_slot(Some("C"), SlotType::Integer);
        node.connect(PinKey::Slot(b), PinRef::new("up", "out"), SlotType::Integer, LinkMode::Shared)
            .unwrap();

        node.remove_slot(b).unwrap();
        assert_eq!(names(&node), ["A", "C"]);
        assert!(node.links().is_empty());
        assert_eq!(node.remove_slot(b), Err(SchemaError::SlotNotFound(b)));

        // Ids are never reused.
        let d = node.add_slot(Some("D"), SlotType::Integer);
        assert!(d != a && d != b && d != c);
    }

    #[test]
    fn rename_rejects_taken_names_but_allows_self() {
        let mut node = NodeSchema::new("n");
        let a = node.add_slot(Some("A"), SlotType::Boolean);
        node.add_slot(Some("B"), SlotType::Boolean);

        assert!(matches!(
            node.rename_slot(a, "B"),
            Err(SchemaError::DuplicateName { ref name, .. }) if name == "B"
        ));
        assert!(matches!(
            node.rename_slot(a, "ItemId"),
            Err(SchemaError::DuplicateName { .. })
        ));
        assert_eq!(node.rename_slot(a, ""), Err(SchemaError::InvalidName(String::new())));
        assert_eq!(node.rename_slot(a, "A"), Ok(()));
        assert_eq!(node.rename_slot_disambiguated(a, "B").unwrap(), "B_1");
    }

    #[test]
    fn retype_converts_or_discards_the_default() {
        let mut node = NodeSchema::new("n");
        let n = node.add_slot_with_default(Some("N"), Value::Integer(4));
        let s = node.add_slot_with_default(Some("S"), Value::String("x".into()));

        assert!(node.change_slot_type(n, SlotType::Float).unwrap().is_empty());
        assert_eq!(node.slot(n).unwrap().default, Some(Value::Float(4.0)));

        let warnings = node.change_slot_type(s, SlotType::Boolean).unwrap();
        assert_eq!(
            warnings,
            vec![SchemaWarning::DefaultDiscarded {
                slot: "S".into(),
                new_type: SlotType::Boolean
            }]
        );
        assert_eq!(node.slot(s).unwrap().default, None);
    }

    #[test]
    fn connect_checks_pin_type() {
        let mut node = NodeSchema::new("n");
        assert!(
            node.connect_fixed(FixedSlot::Priority, PinRef::new("up", "rank"), LinkMode::Shared)
                .is_ok()
        );

        let result = node.connect(
            PinKey::Fixed(FixedSlot::Path),
            PinRef::new("up", "count"),
            SlotType::Integer,
            LinkMode::Shared,
        );
        assert!(matches!(result, Err(SchemaError::IncompatibleLink { .. })));
    }
}
