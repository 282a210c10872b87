//! Name-indexed, type-checked property assignment on objects of unknown shape.
//!
//! Any type can opt in by implementing [`PropertyTarget`]: given a name it either
//! exposes a settable property of a declared kind, or reports that none exists. The
//! lowered chain uses this to configure objects without static knowledge of their type.

use crate::value::{ObjectHandle, SlotType, Value};
use log::trace;

mod dynamic;
mod reflect;

pub use dynamic::*;

/// A resolved, settable property on one particular instance.
///
/// Refs are produced per lookup and must only be used with the instance that
/// produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyRef {
    index: usize,
    kind: SlotType,
}

impl PropertyRef {
    pub fn new(index: usize, kind: SlotType) -> Self {
        Self { index, kind }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn kind(&self) -> SlotType {
        self.kind
    }
}

/// The reflection capability an object offers to the property binder.
pub trait PropertyTarget {
    /// Name of the instance's dynamic type, used in diagnostics.
    fn type_name(&self) -> &str;

    fn find_property(&self, name: &str) -> Option<PropertyRef>;

    /// Writes `value` through `property`. Returns false if the value was refused.
    fn assign(&mut self, property: &PropertyRef, value: &Value) -> bool;
}

/// Why a binding did not take effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindFailure {
    MissingProperty,
    TypeMismatch { expected: SlotType, found: SlotType },
    /// The target accepted the lookup but refused the value.
    Rejected,
}

/// Resolves `name` on the target and assigns `value` as `requested`.
///
/// The value is first coerced to the requested type; the property must be declared
/// with exactly that type.
pub fn try_bind(
    target: &mut dyn PropertyTarget,
    name: &str,
    value: &Value,
    requested: SlotType,
) -> Result<(), BindFailure> {
    let property = target
        .find_property(name)
        .ok_or(BindFailure::MissingProperty)?;
    if property.kind() != requested {
        return Err(BindFailure::TypeMismatch {
            expected: requested,
            found: property.kind(),
        });
    }
    let value = value.coerce_to(requested).ok_or(BindFailure::TypeMismatch {
        expected: requested,
        found: value.slot_type(),
    })?;
    if target.assign(&property, &value) {
        Ok(())
    } else {
        Err(BindFailure::Rejected)
    }
}

/// Like [`try_bind`], but only reports success. Never fails loudly.
pub fn bind_property(
    target: &mut dyn PropertyTarget,
    name: &str,
    value: &Value,
    requested: SlotType,
) -> bool {
    match try_bind(target, name, value, requested) {
        Ok(()) => true,
        Err(failure) => {
            trace!("Unbound property '{}' on {}: {:?}", name, target.type_name(), failure);
            false
        }
    }
}

pub fn set_bool(target: &mut dyn PropertyTarget, name: &str, value: bool) -> bool {
    bind_property(target, name, &Value::Bool(value), SlotType::Boolean)
}

pub fn set_integer(target: &mut dyn PropertyTarget, name: &str, value: i64) -> bool {
    bind_property(target, name, &Value::Integer(value), SlotType::Integer)
}

pub fn set_float(target: &mut dyn PropertyTarget, name: &str, value: f64) -> bool {
    bind_property(target, name, &Value::Float(value), SlotType::Float)
}

pub fn set_string(target: &mut dyn PropertyTarget, name: &str, value: &str) -> bool {
    bind_property(target, name, &Value::String(value.to_string()), SlotType::String)
}

pub fn set_text(target: &mut dyn PropertyTarget, name: &str, value: &str) -> bool {
    bind_property(target, name, &Value::Text(value.to_string()), SlotType::Text)
}

pub fn set_object(target: &mut dyn PropertyTarget, name: &str, value: ObjectHandle) -> bool {
    bind_property(target, name, &Value::Object(value), SlotType::Object)
}
