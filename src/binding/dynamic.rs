use super::{PropertyRef, PropertyTarget};
use crate::value::{SlotType, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    pub kind: SlotType,
}

/// The shape of a dynamically described object type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub name: String,
    pub properties: Vec<PropertyDescriptor>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, kind: SlotType) -> Self {
        self.properties.push(PropertyDescriptor {
            name: name.into(),
            kind,
        });
        self
    }
}

/// A property bag whose shape is described at run time.
///
/// Every declared property starts at its type's zero value.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicObject {
    descriptor: TypeDescriptor,
    values: Vec<Value>,
}

impl DynamicObject {
    pub fn new(descriptor: TypeDescriptor) -> Self {
        let values = descriptor
            .properties
            .iter()
            .map(|p| Value::default_for(p.kind))
            .collect();
        Self { descriptor, values }
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        let index = self.descriptor.properties.iter().position(|p| p.name == name)?;
        self.values.get(index)
    }

    /// Name/value pairs in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.descriptor
            .properties
            .iter()
            .map(|p| p.name.as_str())
            .zip(self.values.iter())
    }
}

impl PropertyTarget for DynamicObject {
    fn type_name(&self) -> &str {
        &self.descriptor.name
    }

    fn find_property(&self, name: &str) -> Option<PropertyRef> {
        self.descriptor
            .properties
            .iter()
            .position(|p| p.name == name)
            .map(|index| PropertyRef::new(index, self.descriptor.properties[index].kind))
    }

    fn assign(&mut self, property: &PropertyRef, value: &Value) -> bool {
        let Some(declared) = self.descriptor.properties.get(property.index()) else {
            return false;
        };
        if declared.kind != property.kind() || value.slot_type() != declared.kind {
            return false;
        }
        match self.values.get_mut(property.index()) {
            Some(slot) => {
                *slot = value.clone();
                true
            }
            None => false,
        }
    }
}
