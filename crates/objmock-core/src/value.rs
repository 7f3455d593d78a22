//! Values stored on surrogate targets and the handles that address them
//!
//! Surrogates and handlers never hold references to each other. Both are
//! addressed by small copyable handles ([`MockRef`], [`HandlerId`]) into the
//! heap that owns them, and a surrogate appears inside ordinary data as
//! [`Value::Mock`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a property on a surrogate's backing target
pub type PropertyName = String;

/// Opaque handle to a surrogate object, unique across heaps
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MockRef(pub u32);

impl fmt::Display for MockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mock#{}", self.0)
    }
}

/// Stable id of an interception handler, unique across heaps
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HandlerId(pub u32);

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler#{}", self.0)
    }
}

/// Dynamic value held by a backing target or passed through a trap
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Absent value; what a missing property reads as
    #[default]
    Undefined,
    /// Explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// Integer number
    Int(i64),
    /// Floating point number
    Float(f64),
    /// String
    Str(String),
    /// Ordered list of values
    List(Vec<Value>),
    /// Another surrogate
    Mock(MockRef),
}

impl Value {
    /// True for [`Value::Undefined`]
    #[inline]
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// True if the value is a surrogate
    #[inline]
    #[must_use]
    pub fn is_mock(&self) -> bool {
        matches!(self, Self::Mock(_))
    }

    /// Surrogate handle, if the value is one
    #[inline]
    #[must_use]
    pub fn as_mock(&self) -> Option<MockRef> {
        match self {
            Self::Mock(r) => Some(*r),
            _ => None,
        }
    }

    /// Integer payload, if any
    #[inline]
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// String payload, if any
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the variant, used in diagnostics
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) | Self::Float(_) => "number",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Mock(_) => "mock",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Mock(r) => write!(f, "{r}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<MockRef> for Value {
    fn from(r: MockRef) -> Self {
        Self::Mock(r)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Undefined, Into::into)
    }
}

/// Name of a structural type, as answered by a prototype query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeTag(String);

impl TypeTag {
    /// Create a tag with an arbitrary type name
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Tag of a plain object
    #[must_use]
    pub fn object() -> Self {
        Self::new("Object")
    }

    /// Tag of a callable target
    #[must_use]
    pub fn function() -> Self {
        Self::new("Function")
    }

    /// Type name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeTag {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Real structural kind of a backing target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Plain property bag
    #[default]
    Object,
    /// Callable property bag
    Function,
}

impl TargetKind {
    /// Tag reported for this kind when no prototype is emulated
    #[must_use]
    pub fn tag(self) -> TypeTag {
        match self {
            Self::Object => TypeTag::object(),
            Self::Function => TypeTag::function(),
        }
    }
}

/// Prototype a handler reports instead of its target's real type
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmulatedPrototype {
    /// Defer to the backing target's real structural type
    #[default]
    NoEmulation,
    /// Report this tag
    Tag(TypeTag),
}

impl From<TypeTag> for EmulatedPrototype {
    fn from(tag: TypeTag) -> Self {
        Self::Tag(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_defaults_to_undefined() {
        assert!(Value::default().is_undefined());
    }

    #[test]
    fn value_as_mock() {
        assert_eq!(Value::Mock(MockRef(3)).as_mock(), Some(MockRef(3)));
        assert_eq!(Value::Int(3).as_mock(), None);
    }

    #[test]
    fn value_from_option() {
        assert_eq!(Value::from(None::<i64>), Value::Undefined);
        assert_eq!(Value::from(Some("x")), Value::Str("x".into()));
    }

    #[test]
    fn value_display() {
        let v = Value::List(vec![Value::Int(1), "a".into(), Value::Mock(MockRef(2))]);
        assert_eq!(v.to_string(), r#"[1, "a", mock#2]"#);
    }

    #[test]
    fn value_serde_shape() {
        let json = serde_json::to_string(&Value::Int(4)).unwrap();
        assert_eq!(json, r#"{"type":"int","value":4}"#);
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Value::Int(4));
    }

    #[test]
    fn target_kind_tags() {
        assert_eq!(TargetKind::Object.tag(), TypeTag::object());
        assert_eq!(TargetKind::Function.tag().name(), "Function");
    }

    #[test]
    fn emulated_prototype_default_is_no_emulation() {
        assert_eq!(EmulatedPrototype::default(), EmulatedPrototype::NoEmulation);
    }
}
