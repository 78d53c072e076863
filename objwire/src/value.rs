//! The runtime value model extracted from target objects.
//!
//! Field extraction produces a [`Value`]; sinks consume values through
//! [`write_value`], which dispatches on the **runtime variant**. When a
//! filter replaces a field's value, the replacement is routed back through
//! the same dispatch, so a filter may change not just the value but its
//! concrete shape.

use crate::{
    context::Context,
    error::Error,
    features::WriterFeatures,
    sink::Sink,
};
use std::{fmt, sync::Arc};

/// A nested object bound to its encoding plan.
///
/// The seam through which a field's value recurses into another adapter
/// without this module knowing the target type.
pub trait WireObject: Send + Sync {
    /// Encodes the bound object through the given sink.
    fn write_object(&self, sink: &mut dyn Sink, ctx: &Context) -> Result<(), Error>;
}

/// A value read out of a target object.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f32),
    Double(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
    /// An enumeration constant; emitted by ordinal or by name depending on
    /// [`WriterFeatures::ENUM_AS_NAME`].
    Enum { name: &'static str, ordinal: i32 },
    Array(Vec<Value>),
    /// A loose name-keyed object with no adapter of its own.
    Map(Vec<(String, Value)>),
    /// A typed object bound to its own adapter.
    Object(Arc<dyn WireObject>),
}

impl Value {
    /// Binds `object` to `adapter` as a nested value.
    pub fn object<O: WireObject + 'static>(object: O) -> Self {
        Self::Object(Arc::new(object))
    }

    /// Whether this is the null value.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Bool(v) => write!(f, "Bool({v})"),
            Self::Int(v) => write!(f, "Int({v})"),
            Self::Float(v) => write!(f, "Float({v})"),
            Self::Double(v) => write!(f, "Double({v})"),
            Self::Str(v) => write!(f, "Str({v:?})"),
            Self::Bytes(v) => write!(f, "Bytes({} bytes)", v.len()),
            Self::Timestamp(v) => write!(f, "Timestamp({v})"),
            Self::Enum { name, ordinal } => write!(f, "Enum({name}={ordinal})"),
            Self::Array(v) => f.debug_tuple("Array").field(v).finish(),
            Self::Map(v) => f.debug_tuple("Map").field(v).finish(),
            Self::Object(_) => write!(f, "Object(..)"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Writes a value to a sink, dispatching on its runtime variant.
///
/// `features` is the effective (already merged) feature set of the
/// enclosing encode; it controls enum rendering here and is carried into
/// nested containers.
pub fn write_value(
    sink: &mut dyn Sink,
    value: &Value,
    ctx: &Context,
    features: WriterFeatures,
) -> Result<(), Error> {
    match value {
        Value::Null => sink.write_null(),
        Value::Bool(v) => sink.write_bool(*v),
        Value::Int(v) => sink.write_int(*v),
        Value::Float(v) => sink.write_float(*v),
        Value::Double(v) => sink.write_double(*v),
        Value::Str(v) => sink.write_str(v),
        Value::Bytes(v) => sink.write_bytes(v),
        Value::Timestamp(v) => sink.write_timestamp_millis(*v),
        Value::Enum { name, ordinal } => {
            if features.contains(WriterFeatures::ENUM_AS_NAME) {
                sink.write_str(name)
            } else {
                sink.write_int(*ordinal as i64)
            }
        }
        Value::Array(items) => {
            sink.start_array(items.len())?;
            for item in items {
                write_value(sink, item, ctx, features)?;
            }
            sink.end_array()
        }
        Value::Map(entries) => {
            sink.start_object()?;
            for (name, item) in entries {
                sink.write_name(name)?;
                write_value(sink, item, ctx, features)?;
            }
            sink.end_object()
        }
        Value::Object(nested) => nested.write_object(sink, ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_option() {
        assert!(Value::from(None::<i64>).is_null());
        assert!(matches!(Value::from(Some(7i64)), Value::Int(7)));
    }

    #[test]
    fn test_debug_object_opaque() {
        struct Nop;
        impl WireObject for Nop {
            fn write_object(&self, _: &mut dyn Sink, _: &Context) -> Result<(), Error> {
                Ok(())
            }
        }
        assert_eq!(format!("{:?}", Value::object(Nop)), "Object(..)");
    }
}
