//! Per-field encoding units.
//!
//! A [`FieldUnit`] encapsulates one serializable property: its stable name,
//! the 64-bit hash of that name, feature flags, an optional format string
//! and label, and the extraction capability reading the current value from
//! a target object. Units are immutable after construction and owned by
//! exactly one adapter.

use crate::{
    context::Context,
    error::Error,
    features::{FieldFlags, WriterFeatures},
    filter::FieldMeta,
    fnv,
    sink::Sink,
    value::{write_value, Value},
};
use chrono::DateTime;

/// Synthetic enclosing-instance back-references carry this name prefix and
/// are skipped unless reference detection is enabled.
const BACK_REFERENCE_PREFIX: &str = "this$";

/// How a unit reads its value, selected at construction time.
///
/// Raw-field extraction cannot fail; accessor-backed extraction may, and
/// the owning adapter uses the distinction to decide whether filter checks
/// are mandatory.
pub enum Extract<T> {
    Field(Box<dyn Fn(&T) -> Value + Send + Sync>),
    Accessor(Box<dyn Fn(&T) -> Result<Value, Error> + Send + Sync>),
}

/// One serializable property of `T`.
pub struct FieldUnit<T> {
    name: String,
    hash: u64,
    flags: FieldFlags,
    format: Option<String>,
    label: Option<String>,
    extract: Extract<T>,
}

impl<T> FieldUnit<T> {
    /// A unit backed by a raw field; extraction cannot fail.
    pub fn field(
        name: impl Into<String>,
        read: impl Fn(&T) -> Value + Send + Sync + 'static,
    ) -> Self {
        let name = name.into();
        Self {
            hash: fnv::hash64(&name),
            name,
            flags: FieldFlags::RAW_FIELD,
            format: None,
            label: None,
            extract: Extract::Field(Box::new(read)),
        }
    }

    /// A unit backed by an accessor function whose extraction may fail.
    pub fn accessor(
        name: impl Into<String>,
        read: impl Fn(&T) -> Result<Value, Error> + Send + Sync + 'static,
    ) -> Self {
        let name = name.into();
        Self {
            hash: fnv::hash64(&name),
            name,
            flags: FieldFlags::empty(),
            format: None,
            label: None,
            extract: Extract::Accessor(Box::new(read)),
        }
    }

    /// Marks this unit as the entire representation of its object.
    pub fn value_unit(mut self) -> Self {
        self.flags |= FieldFlags::VALUE;
        self
    }

    /// Flattens the unit's map value into the parent object's key space.
    pub fn unwrapped(mut self) -> Self {
        self.flags |= FieldFlags::UNWRAPPED;
        self
    }

    /// Attaches a format string (timestamps: `"millis"` or a chrono
    /// pattern).
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Attaches a label for label-based filtering.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn flags(&self) -> FieldFlags {
        self.flags
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub(crate) fn meta(&self) -> FieldMeta<'_> {
        FieldMeta {
            name: &self.name,
            label: self.label.as_deref(),
            format: self.format.as_deref(),
            flags: self.flags,
        }
    }

    pub(crate) fn is_back_reference(&self) -> bool {
        self.name.starts_with(BACK_REFERENCE_PREFIX)
    }

    /// Reads the raw value, propagating any accessor failure.
    pub fn value(&self, object: &T) -> Result<Value, Error> {
        match &self.extract {
            Extract::Field(read) => Ok(read(object)),
            Extract::Accessor(read) => read(object),
        }
    }

    /// Applies the unit's format string to an extracted value.
    pub(crate) fn rendered(&self, value: Value) -> Value {
        let Some(format) = self.format.as_deref() else {
            return value;
        };
        let Value::Timestamp(millis) = value else {
            return value;
        };
        if format == "millis" {
            return Value::Int(millis);
        }
        match DateTime::from_timestamp_millis(millis) {
            Some(instant) => Value::Str(instant.format(format).to_string()),
            None => Value::Int(millis),
        }
    }

    /// Writes the name and the value, honoring the effective feature set.
    pub fn write(
        &self,
        sink: &mut dyn Sink,
        object: &T,
        ctx: &Context,
        features: WriterFeatures,
    ) -> Result<(), Error> {
        if self.is_back_reference() && !features.contains(WriterFeatures::REFERENCE_DETECTION) {
            return Ok(());
        }

        let value = match self.value(object) {
            Ok(value) => value,
            Err(err) => {
                if features.contains(WriterFeatures::IGNORE_ERROR_GETTER) {
                    return Ok(());
                }
                return Err(err);
            }
        };

        if value.is_null() && !features.contains(WriterFeatures::WRITE_NULLS) {
            return Ok(());
        }

        if self.flags.contains(FieldFlags::UNWRAPPED) {
            if let Value::Map(entries) = &value {
                for (name, entry) in entries {
                    sink.write_name(name)?;
                    write_value(sink, entry, ctx, features)?;
                }
                return Ok(());
            }
        }

        let value = self.rendered(value);
        sink.write_name(&self.name)?;
        write_value(sink, &value, ctx, features)
    }

    /// Writes only the value (array-mapped mode preserves position, so
    /// nulls are always emitted).
    pub fn write_value(
        &self,
        sink: &mut dyn Sink,
        object: &T,
        ctx: &Context,
        features: WriterFeatures,
    ) -> Result<(), Error> {
        let value = match self.value(object) {
            Ok(value) => value,
            Err(err) => {
                if features.contains(WriterFeatures::IGNORE_ERROR_GETTER) {
                    return sink.write_null();
                }
                return Err(err);
            }
        };
        let value = self.rendered(value);
        write_value(sink, &value, ctx, features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::TextSink;

    struct Bean {
        id: i64,
        name: Option<String>,
    }

    fn id_unit() -> FieldUnit<Bean> {
        FieldUnit::field("id", |b: &Bean| Value::Int(b.id))
    }

    fn sample() -> Bean {
        Bean {
            id: 7,
            name: None,
        }
    }

    #[test]
    fn test_raw_field_flag() {
        assert!(id_unit().flags().contains(FieldFlags::RAW_FIELD));
        let acc = FieldUnit::accessor("id", |b: &Bean| Ok(Value::Int(b.id)));
        assert!(!acc.flags().contains(FieldFlags::RAW_FIELD));
    }

    #[test]
    fn test_null_skipped_by_default() {
        let unit = FieldUnit::field("name", |b: &Bean| Value::from(b.name.clone()));
        let mut sink = TextSink::new();
        sink.start_object().unwrap();
        unit.write(&mut sink, &sample(), &Context::default(), WriterFeatures::empty())
            .unwrap();
        sink.end_object().unwrap();
        assert_eq!(sink.finish(), "{}");
    }

    #[test]
    fn test_null_written_with_policy() {
        let unit = FieldUnit::field("name", |b: &Bean| Value::from(b.name.clone()));
        let mut sink = TextSink::new();
        sink.start_object().unwrap();
        unit.write(
            &mut sink,
            &sample(),
            &Context::default(),
            WriterFeatures::WRITE_NULLS,
        )
        .unwrap();
        sink.end_object().unwrap();
        assert_eq!(sink.finish(), r#"{"name":null}"#);
    }

    #[test]
    fn test_accessor_failure_policies() {
        let unit = FieldUnit::accessor("broken", |_: &Bean| {
            Err(Error::accessor("broken", "boom"))
        });
        let mut sink = TextSink::new();
        sink.start_object().unwrap();

        let err = unit
            .write(&mut sink, &sample(), &Context::default(), WriterFeatures::empty())
            .unwrap_err();
        assert!(matches!(err, Error::Accessor { .. }));

        unit.write(
            &mut sink,
            &sample(),
            &Context::default(),
            WriterFeatures::IGNORE_ERROR_GETTER,
        )
        .unwrap();
        sink.end_object().unwrap();
        assert_eq!(sink.finish(), "{}");
    }

    #[test]
    fn test_back_reference_skip() {
        let unit = FieldUnit::field("this$0", |_: &Bean| Value::Int(1));
        let mut sink = TextSink::new();
        sink.start_object().unwrap();
        unit.write(&mut sink, &sample(), &Context::default(), WriterFeatures::empty())
            .unwrap();
        sink.end_object().unwrap();
        assert_eq!(sink.finish(), "{}");

        let mut sink = TextSink::new();
        sink.start_object().unwrap();
        unit.write(
            &mut sink,
            &sample(),
            &Context::default(),
            WriterFeatures::REFERENCE_DETECTION,
        )
        .unwrap();
        sink.end_object().unwrap();
        assert_eq!(sink.finish(), r#"{"this$0":1}"#);
    }

    #[test]
    fn test_timestamp_format() {
        let unit = FieldUnit::field("at", |_: &Bean| Value::Timestamp(0))
            .with_format("%Y-%m-%d");
        let mut sink = TextSink::new();
        sink.start_object().unwrap();
        unit.write(&mut sink, &sample(), &Context::default(), WriterFeatures::empty())
            .unwrap();
        sink.end_object().unwrap();
        assert_eq!(sink.finish(), r#"{"at":"1970-01-01"}"#);
    }

    #[test]
    fn test_millis_format() {
        let unit = FieldUnit::field("at", |_: &Bean| Value::Timestamp(1234)).with_format("millis");
        assert!(matches!(unit.rendered(Value::Timestamp(1234)), Value::Int(1234)));
    }

    #[test]
    fn test_unwrapped_map() {
        let unit = FieldUnit::field("extras", |_: &Bean| {
            Value::Map(vec![
                ("a".to_owned(), Value::Int(1)),
                ("b".to_owned(), Value::Int(2)),
            ])
        })
        .unwrapped();
        let mut sink = TextSink::new();
        sink.start_object().unwrap();
        unit.write(&mut sink, &sample(), &Context::default(), WriterFeatures::empty())
            .unwrap();
        sink.end_object().unwrap();
        assert_eq!(sink.finish(), r#"{"a":1,"b":2}"#);
    }
}
