//! The field interception pipeline.
//!
//! Filters intercept name, value, and inclusion decisions once per field,
//! in a fixed order with short-circuiting (see the adapter's filtered write
//! path). Each interception point is a single-method trait, blanket
//! implemented for matching closures, stored behind `Arc` so one filter set
//! can serve adapter-level (persistent) and context-level (per-call) roles.

use crate::{error::Error, features::FieldFlags, sink::Sink, value::Value};
use std::sync::Arc;

/// Admits or rejects a field by declared name, before its value is read.
pub trait PreFilter: Send + Sync {
    fn admit(&self, name: &str) -> bool;
}

impl<F: Fn(&str) -> bool + Send + Sync> PreFilter for F {
    fn admit(&self, name: &str) -> bool {
        self(name)
    }
}

/// Admits or rejects a field by its label.
pub trait LabelFilter: Send + Sync {
    fn admit(&self, label: &str) -> bool;
}

impl<F: Fn(&str) -> bool + Send + Sync> LabelFilter for F {
    fn admit(&self, label: &str) -> bool {
        self(label)
    }
}

/// Renames a field; `None` keeps the current name.
pub trait NameFilter: Send + Sync {
    fn rename(&self, name: &str, value: &Value) -> Option<String>;
}

impl<F: Fn(&str, &Value) -> Option<String> + Send + Sync> NameFilter for F {
    fn rename(&self, name: &str, value: &Value) -> Option<String> {
        self(name, value)
    }
}

/// Replaces a field's value; `None` keeps the current value.
pub trait ValueFilter: Send + Sync {
    fn transform(&self, name: &str, value: &Value) -> Option<Value>;
}

impl<F: Fn(&str, &Value) -> Option<Value> + Send + Sync> ValueFilter for F {
    fn transform(&self, name: &str, value: &Value) -> Option<Value> {
        self(name, value)
    }
}

/// Admits or rejects a field by name and extracted value.
pub trait PropertyFilter: Send + Sync {
    fn admit(&self, name: &str, value: &Value) -> bool;
}

impl<F: Fn(&str, &Value) -> bool + Send + Sync> PropertyFilter for F {
    fn admit(&self, name: &str, value: &Value) -> bool {
        self(name, value)
    }
}

/// Field metadata handed to context-aware filters.
#[derive(Debug, Clone)]
pub struct FieldMeta<'a> {
    pub name: &'a str,
    pub label: Option<&'a str>,
    pub format: Option<&'a str>,
    pub flags: FieldFlags,
}

/// A name filter that additionally receives the field's full metadata.
pub trait ContextNameFilter: Send + Sync {
    fn rename(&self, meta: &FieldMeta<'_>, name: &str, value: &Value) -> Option<String>;
}

impl<F> ContextNameFilter for F
where
    F: Fn(&FieldMeta<'_>, &str, &Value) -> Option<String> + Send + Sync,
{
    fn rename(&self, meta: &FieldMeta<'_>, name: &str, value: &Value) -> Option<String> {
        self(meta, name, value)
    }
}

/// A value filter that additionally receives the field's full metadata.
pub trait ContextValueFilter: Send + Sync {
    fn transform(&self, meta: &FieldMeta<'_>, name: &str, value: &Value) -> Option<Value>;
}

impl<F> ContextValueFilter for F
where
    F: Fn(&FieldMeta<'_>, &str, &Value) -> Option<Value> + Send + Sync,
{
    fn transform(&self, meta: &FieldMeta<'_>, name: &str, value: &Value) -> Option<Value> {
        self(meta, name, value)
    }
}

/// Side-effecting hook run exactly once before an object's fields.
///
/// May write extra members through the sink (a name/value pair per member).
pub trait BeforeFilter: Send + Sync {
    fn write_before(&self, sink: &mut dyn Sink) -> Result<(), Error>;
}

/// Side-effecting hook run exactly once after an object's fields.
pub trait AfterFilter: Send + Sync {
    fn write_after(&self, sink: &mut dyn Sink) -> Result<(), Error>;
}

/// An optional filter at every interception point.
///
/// The adapter persistently owns one (pre/name/value/property only, set
/// through its builder); the write context owns another transient one. Both
/// may be active at once; name and value filters compose across the two
/// levels, adapter's first.
#[derive(Clone, Default)]
pub struct Filters {
    pub pre: Option<Arc<dyn PreFilter>>,
    pub label: Option<Arc<dyn LabelFilter>>,
    pub name: Option<Arc<dyn NameFilter>>,
    pub value: Option<Arc<dyn ValueFilter>>,
    pub property: Option<Arc<dyn PropertyFilter>>,
    pub context_name: Option<Arc<dyn ContextNameFilter>>,
    pub context_value: Option<Arc<dyn ContextValueFilter>>,
    pub before: Option<Arc<dyn BeforeFilter>>,
    pub after: Option<Arc<dyn AfterFilter>>,
}

impl Filters {
    /// Whether any interception point is populated.
    pub fn any(&self) -> bool {
        self.pre.is_some()
            || self.label.is_some()
            || self.name.is_some()
            || self.value.is_some()
            || self.property.is_some()
            || self.context_name.is_some()
            || self.context_value.is_some()
            || self.before.is_some()
            || self.after.is_some()
    }
}

/// Two name filters applied in sequence, the second seeing the first's
/// output.
struct ComposedName(Arc<dyn NameFilter>, Arc<dyn NameFilter>);

impl NameFilter for ComposedName {
    fn rename(&self, name: &str, value: &Value) -> Option<String> {
        match self.0.rename(name, value) {
            Some(renamed) => Some(self.1.rename(&renamed, value).unwrap_or(renamed)),
            None => self.1.rename(name, value),
        }
    }
}

/// Composes adapter- and context-level name filters, adapter's first.
pub(crate) fn compose_name(
    first: &Option<Arc<dyn NameFilter>>,
    second: &Option<Arc<dyn NameFilter>>,
) -> Option<Arc<dyn NameFilter>> {
    match (first, second) {
        (Some(a), Some(b)) => Some(Arc::new(ComposedName(a.clone(), b.clone()))),
        (Some(a), None) => Some(a.clone()),
        (None, Some(b)) => Some(b.clone()),
        (None, None) => None,
    }
}

/// Two value filters applied in sequence, the second seeing the first's
/// output.
struct ComposedValue(Arc<dyn ValueFilter>, Arc<dyn ValueFilter>);

impl ValueFilter for ComposedValue {
    fn transform(&self, name: &str, value: &Value) -> Option<Value> {
        match self.0.transform(name, value) {
            Some(replaced) => Some(self.1.transform(name, &replaced).unwrap_or(replaced)),
            None => self.1.transform(name, value),
        }
    }
}

/// Composes adapter- and context-level value filters, adapter's first.
pub(crate) fn compose_value(
    first: &Option<Arc<dyn ValueFilter>>,
    second: &Option<Arc<dyn ValueFilter>>,
) -> Option<Arc<dyn ValueFilter>> {
    match (first, second) {
        (Some(a), Some(b)) => Some(Arc::new(ComposedValue(a.clone(), b.clone()))),
        (Some(a), None) => Some(a.clone()),
        (None, Some(b)) => Some(b.clone()),
        (None, None) => None,
    }
}
