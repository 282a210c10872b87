use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// The closed set of types a parameter slot can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SlotType {
    Boolean,
    Integer,
    Float,
    String,
    Text,
    Object,
}

impl SlotType {
    pub const ALL: [SlotType; 6] = [
        SlotType::Boolean,
        SlotType::Integer,
        SlotType::Float,
        SlotType::String,
        SlotType::Text,
        SlotType::Object,
    ];

    /// Whether a value produced as `source` may feed a pin of this type.
    ///
    /// Identical types always connect; the only widening allowed is Integer into Float.
    pub fn accepts(self, source: SlotType) -> bool {
        self == source || (self == SlotType::Float && source == SlotType::Integer)
    }

    pub fn name(self) -> &'static str {
        match self {
            SlotType::Boolean => "Boolean",
            SlotType::Integer => "Integer",
            SlotType::Float => "Float",
            SlotType::String => "String",
            SlotType::Text => "Text",
            SlotType::Object => "Object",
        }
    }

    /// Parses a type name, case-insensitively.
    pub fn parse(name: &str) -> Option<SlotType> {
        SlotType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An opaque reference to a runtime object. May be invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectHandle(Option<u64>);

impl ObjectHandle {
    pub const INVALID: ObjectHandle = ObjectHandle(None);

    pub fn new(raw: u64) -> Self {
        ObjectHandle(Some(raw))
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    pub fn raw(&self) -> Option<u64> {
        self.0
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(raw) => write!(f, "#{}", raw),
            None => f.write_str("<invalid>"),
        }
    }
}

/// A handle to the manager service returned by `Locate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManagerHandle(pub u64);

/// Display text, kept distinct from plain strings when binding properties.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Text(pub String);

impl From<&str> for Text {
    fn from(value: &str) -> Self {
        Text(value.to_string())
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A literal or runtime value carried by a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Text(String),
    Object(ObjectHandle),
}

// Floats hash by bit pattern so plans can be hashed structurally.
impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Value::Bool(b) => b.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(n) => n.to_bits().hash(state),
            Value::String(s) | Value::Text(s) => s.hash(state),
            Value::Object(h) => h.hash(state),
        }
    }
}

impl Value {
    pub fn slot_type(&self) -> SlotType {
        match self {
            Value::Bool(_) => SlotType::Boolean,
            Value::Integer(_) => SlotType::Integer,
            Value::Float(_) => SlotType::Float,
            Value::String(_) => SlotType::String,
            Value::Text(_) => SlotType::Text,
            Value::Object(_) => SlotType::Object,
        }
    }

    /// The zero value used for an unconnected dynamic slot without a default.
    pub fn default_for(slot_type: SlotType) -> Value {
        match slot_type {
            SlotType::Boolean => Value::Bool(false),
            SlotType::Integer => Value::Integer(0),
            SlotType::Float => Value::Float(0.0),
            SlotType::String => Value::String(String::new()),
            SlotType::Text => Value::Text(String::new()),
            SlotType::Object => Value::Object(ObjectHandle::INVALID),
        }
    }

    /// Converts the value to `target` when `target.accepts` its type.
    pub fn coerce_to(&self, target: SlotType) -> Option<Value> {
        match (self, target) {
            (v, t) if v.slot_type() == t => Some(v.clone()),
            (Value::Integer(i), SlotType::Float) => Some(Value::Float(*i as f64)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{:.1}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Text(s) => write!(f, "t\"{}\"", s),
            Value::Object(h) => write!(f, "{}", h),
        }
    }
}

/// Rust types that can sit behind a bindable property.
pub trait PropertyValue: Sized {
    const KIND: SlotType;
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_property_value {
    ( $( ($ty:ty, $kind:ident, $pat:pat => $out:expr) ),* $(,)? ) => {
        $(
            impl PropertyValue for $ty {
                const KIND: SlotType = SlotType::$kind;
                fn from_value(value: &Value) -> Option<Self> {
                    match value.coerce_to(SlotType::$kind)? {
                        $pat => Some($out),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_property_value! {
    (bool, Boolean, Value::Bool(b) => b),
    (i64, Integer, Value::Integer(i) => i),
    (f64, Float, Value::Float(n) => n),
    (String, String, Value::String(s) => s),
    (Text, Text, Value::Text(s) => Text(s)),
    (ObjectHandle, Object, Value::Object(h) => h),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_widens_into_float_only() {
        assert!(SlotType::Float.accepts(SlotType::Integer));
        assert!(!SlotType::Integer.accepts(SlotType::Float));
        assert!(!SlotType::Text.accepts(SlotType::String));
        assert_eq!(
            Value::Integer(3).coerce_to(SlotType::Float),
            Some(Value::Float(3.0))
        );
        assert_eq!(Value::String("x".into()).coerce_to(SlotType::Integer), None);
    }

    #[test]
    fn slot_type_names_parse_back() {
        for t in SlotType::ALL {
            assert_eq!(SlotType::parse(t.name()), Some(t));
        }
        assert_eq!(SlotType::parse(" text "), Some(SlotType::Text));
        assert_eq!(SlotType::parse("Vector"), None);
    }

    #[test]
    fn value_display() {
        assert_eq!(Value::Integer(10).to_string(), "10");
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::String("UI".into()).to_string(), "\"UI\"");
        assert_eq!(Value::Object(ObjectHandle::INVALID).to_string(), "<invalid>");
    }
}
