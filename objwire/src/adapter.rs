//! The per-type encoding orchestrator.
//!
//! An [`ObjectAdapter`] is the encoding plan for one declared type: its
//! field units in declaration order, a sorted-hash index over them, the
//! type's wire tag, a feature set, and persistent filters. Adapters are
//! built once per type-configuration by [`AdapterBuilder`] (fed by whatever
//! discovers the field list; discovery itself lives outside this crate)
//! and then shared read-only across arbitrarily many concurrent encodes.
//! The only mutation after construction is idempotent lazy caching of
//! encoded tag fragments and the one-slot symbol ordinal.

use crate::{
    binary::{self, BinarySink},
    context::Context,
    error::Error,
    features::{FieldFlags, WriterFeatures},
    field::FieldUnit,
    filter::{
        compose_name, compose_value, Filters, NameFilter, PreFilter, PropertyFilter, ValueFilter,
    },
    fnv,
    index::HashIndex,
    sink::Sink,
    symbol::SymbolTable,
    text::TextSink,
    value::{write_value, Value, WireObject},
};
use bytes::Bytes;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, OnceLock,
};

/// Default type-tag key.
pub const DEFAULT_TYPE_KEY: &str = "@type";

/// Builds an [`ObjectAdapter`] from an ordered field-unit list plus an
/// optional explicit type-tag key/name, a feature set, and persistent
/// filters. This is the construction seam for introspection collaborators.
pub struct AdapterBuilder<T> {
    type_name: String,
    type_key: String,
    features: WriterFeatures,
    serializable: bool,
    units: Vec<FieldUnit<T>>,
    filters: Filters,
}

impl<T> AdapterBuilder<T> {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            type_key: DEFAULT_TYPE_KEY.to_owned(),
            features: WriterFeatures::empty(),
            serializable: true,
            units: Vec::new(),
            filters: Filters::default(),
        }
    }

    /// Overrides the type-tag key (default `"@type"`).
    pub fn type_key(mut self, key: impl Into<String>) -> Self {
        self.type_key = key.into();
        self
    }

    /// Adapter-level features, combined with context features per call.
    pub fn features(mut self, features: WriterFeatures) -> Self {
        self.features = features;
        self
    }

    /// Marks the type as lacking the serializable marker.
    pub fn not_serializable(mut self) -> Self {
        self.serializable = false;
        self
    }

    /// Appends a field unit; declaration order is output order.
    pub fn field(mut self, unit: FieldUnit<T>) -> Self {
        self.units.push(unit);
        self
    }

    /// Installs a persistent pre-filter.
    pub fn pre_filter(mut self, filter: impl PreFilter + 'static) -> Self {
        self.filters.pre = Some(Arc::new(filter));
        self
    }

    /// Installs a persistent name filter (applied before any context-level
    /// name filter).
    pub fn name_filter(mut self, filter: impl NameFilter + 'static) -> Self {
        self.filters.name = Some(Arc::new(filter));
        self
    }

    /// Installs a persistent value filter (applied before any context-level
    /// value filter).
    pub fn value_filter(mut self, filter: impl ValueFilter + 'static) -> Self {
        self.filters.value = Some(Arc::new(filter));
        self
    }

    /// Installs a persistent property filter.
    pub fn property_filter(mut self, filter: impl PropertyFilter + 'static) -> Self {
        self.filters.property = Some(Arc::new(filter));
        self
    }

    /// Validates the type tag and assembles the adapter.
    pub fn build(self) -> Result<ObjectAdapter<T>, Error> {
        validate_tag_component("type key", &self.type_key)?;
        validate_tag_component("type name", &self.type_name)?;

        let hashes: Vec<u64> = self.units.iter().map(|u| u.hash()).collect();
        let index = HashIndex::new(&hashes);

        let has_value_unit =
            self.units.len() == 1 && self.units[0].flags().contains(FieldFlags::VALUE);
        let contains_accessor = self
            .units
            .iter()
            .any(|u| !u.flags().contains(FieldFlags::RAW_FIELD));
        let has_filter = self.filters.any();

        Ok(ObjectAdapter {
            type_name_hash: fnv::hash64(&self.type_name),
            type_name: self.type_name,
            type_key: self.type_key,
            features: self.features,
            serializable: self.serializable,
            units: self.units,
            index,
            has_value_unit,
            contains_accessor,
            has_filter,
            filters: self.filters,
            text_tag: OnceLock::new(),
            packed_tag: OnceLock::new(),
            symbol_cache: AtomicU64::new(0),
        })
    }
}

fn validate_tag_component(what: &str, value: &str) -> Result<(), Error> {
    if value.is_empty() {
        return Err(Error::Configuration(format!("empty {what}")));
    }
    if value
        .chars()
        .any(|c| c == '"' || c == '\\' || (c as u32) < 0x20)
    {
        return Err(Error::Configuration(format!(
            "{what} {value:?} contains reserved characters"
        )));
    }
    Ok(())
}

/// The encoding plan for one declared type.
pub struct ObjectAdapter<T> {
    type_name: String,
    type_key: String,
    type_name_hash: u64,
    features: WriterFeatures,
    serializable: bool,
    units: Vec<FieldUnit<T>>,
    index: HashIndex,
    has_value_unit: bool,
    contains_accessor: bool,
    has_filter: bool,
    filters: Filters,
    /// Lazily rendered `"key":"name"` text fragment.
    text_tag: OnceLock<String>,
    /// Lazily rendered packed literal type tag.
    packed_tag: OnceLock<Vec<u8>>,
    /// One-slot `(ordinal << 32) | table identity` cache; 0 when unset.
    /// Racy recomputation is idempotent, so relaxed ordering suffices.
    symbol_cache: AtomicU64,
}

impl<T> ObjectAdapter<T> {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn type_key(&self) -> &str {
        &self.type_key
    }

    pub fn features(&self) -> WriterFeatures {
        self.features
    }

    /// Field units in declaration order.
    pub fn units(&self) -> &[FieldUnit<T>] {
        &self.units
    }

    /// O(log n) unit lookup by name hash, for out-of-order callers.
    pub fn field_unit(&self, hash: u64) -> Option<&FieldUnit<T>> {
        self.index.lookup(hash).map(|i| &self.units[i])
    }

    /// Unit lookup by name.
    pub fn field_unit_by_name(&self, name: &str) -> Option<&FieldUnit<T>> {
        self.field_unit(fnv::hash64(name))
    }

    /// Encodes `object` through `sink` under `ctx`.
    pub fn write(&self, sink: &mut dyn Sink, object: &T, ctx: &Context) -> Result<(), Error> {
        let features = self.features | ctx.features;

        // Serializability gate.
        if !self.serializable {
            if features.contains(WriterFeatures::ERROR_ON_NONE_SERIALIZABLE) {
                return Err(Error::NotSerializable(self.type_name.clone()));
            }
            if features.contains(WriterFeatures::IGNORE_NONE_SERIALIZABLE) {
                return sink.write_null();
            }
        }

        // Single-value shortcut: the unit is the whole representation, no
        // wrapper, no filters.
        if self.has_value_unit {
            return self.units[0].write_value(sink, object, ctx, features);
        }

        if features.contains(WriterFeatures::ARRAY_MAPPED) {
            return self.write_array_mapped(sink, object, ctx);
        }

        if self.has_filter || ctx.has_filter(self.contains_accessor) {
            return self.write_with_filter(sink, object, ctx);
        }

        let tag = features.contains(WriterFeatures::WRITE_CLASS_NAME);
        if sink.is_binary() {
            if tag {
                self.write_class_info(sink, ctx)?;
            }
            sink.start_object()?;
        } else {
            sink.start_object()?;
            if tag {
                self.write_text_tag(sink)?;
            }
        }

        for unit in &self.units {
            unit.write(sink, object, ctx, features)?;
        }
        sink.end_object()
    }

    /// Emits values only, in declaration order, inside an array of the
    /// exact field count.
    pub fn write_array_mapped(
        &self,
        sink: &mut dyn Sink,
        object: &T,
        ctx: &Context,
    ) -> Result<(), Error> {
        let features = self.features | ctx.features;
        if sink.is_binary() && features.contains(WriterFeatures::WRITE_CLASS_NAME) {
            self.write_class_info(sink, ctx)?;
        }
        sink.start_array(self.units.len())?;
        for unit in &self.units {
            unit.write_value(sink, object, ctx, features)?;
        }
        sink.end_array()
    }

    /// Runs every field through the filter pipeline.
    pub fn write_with_filter(
        &self,
        sink: &mut dyn Sink,
        object: &T,
        ctx: &Context,
    ) -> Result<(), Error> {
        let features = self.features | ctx.features;
        let tag = features.contains(WriterFeatures::WRITE_CLASS_NAME);

        if sink.is_binary() {
            if tag {
                self.write_class_info(sink, ctx)?;
            }
            sink.start_object()?;
        } else {
            sink.start_object()?;
            if tag {
                self.write_text_tag(sink)?;
            }
        }

        if let Some(before) = &ctx.filters.before {
            before.write_before(sink)?;
        }

        let pre = ctx.filters.pre.as_ref().or(self.filters.pre.as_ref());
        let property = ctx
            .filters
            .property
            .as_ref()
            .or(self.filters.property.as_ref());
        let name_filter = compose_name(&self.filters.name, &ctx.filters.name);
        let value_filter = compose_value(&self.filters.value, &ctx.filters.value);
        let label_filter = ctx.filters.label.as_ref();
        let context_name = ctx.filters.context_name.as_ref();
        let context_value = ctx.filters.context_value.as_ref();

        let ref_detect = features.contains(WriterFeatures::REFERENCE_DETECTION);
        let skip_accessors = features.contains(WriterFeatures::IGNORE_NON_FIELD_GETTER);

        for unit in &self.units {
            if skip_accessors && !unit.flags().contains(FieldFlags::RAW_FIELD) {
                continue;
            }

            // Pre-filter: reject before the value is read.
            if let Some(pre) = pre {
                if !pre.admit(unit.name()) {
                    continue;
                }
            }

            if let (Some(filter), Some(label)) = (label_filter, unit.label()) {
                if !label.is_empty() && !filter.admit(label) {
                    continue;
                }
            }

            // Fast exit: only inclusion filtering is configured, so the
            // unfiltered unit path applies.
            if name_filter.is_none()
                && value_filter.is_none()
                && property.is_none()
                && context_name.is_none()
                && context_value.is_none()
            {
                unit.write(sink, object, ctx, features)?;
                continue;
            }

            let value = match unit.value(object) {
                Ok(value) => value,
                Err(err) => {
                    if features.contains(WriterFeatures::IGNORE_ERROR_GETTER) {
                        continue;
                    }
                    return Err(err);
                }
            };

            if value.is_null() && !features.contains(WriterFeatures::WRITE_NULLS) {
                continue;
            }

            if unit.is_back_reference() && !ref_detect {
                continue;
            }

            let mut renamed: Option<String> = None;
            if let Some(filter) = &name_filter {
                renamed = filter.rename(unit.name(), &value);
            }
            if let Some(filter) = context_name {
                let meta = unit.meta();
                let current = renamed.as_deref().unwrap_or(unit.name());
                if let Some(name) = filter.rename(&meta, current, &value) {
                    renamed = Some(name);
                }
            }

            // Property filter sees the declared name, not the renamed one.
            if let Some(filter) = property {
                if !filter.admit(unit.name(), &value) {
                    continue;
                }
            }

            let mut replaced: Option<Value> = None;
            if let Some(filter) = &value_filter {
                replaced = filter.transform(unit.name(), &value);
            }
            if let Some(filter) = context_value {
                let meta = unit.meta();
                let current_name = renamed.as_deref().unwrap_or(unit.name());
                let current_value = replaced.as_ref().unwrap_or(&value);
                if let Some(next) = filter.transform(&meta, current_name, current_value) {
                    replaced = Some(next);
                }
            }

            // An untouched field keeps its unit-path semantics, including
            // map flattening.
            if renamed.is_none()
                && replaced.is_none()
                && unit.flags().contains(FieldFlags::UNWRAPPED)
            {
                if let Value::Map(entries) = &value {
                    for (name, entry) in entries {
                        sink.write_name(name)?;
                        write_value(sink, entry, ctx, features)?;
                    }
                    continue;
                }
            }

            sink.write_name(renamed.as_deref().unwrap_or(unit.name()))?;
            match replaced {
                // A replacement re-dispatches through the encoder for its
                // own runtime shape; the unit's format does not apply.
                Some(replacement) => write_value(sink, &replacement, ctx, features)?,
                None => {
                    let rendered = unit.rendered(value);
                    write_value(sink, &rendered, ctx, features)?;
                }
            }
        }

        if let Some(after) = &ctx.filters.after {
            after.write_after(sink)?;
        }

        sink.end_object()
    }

    /// Projects the object to declaration-order name/value pairs, applying
    /// formats, unwrapping, and the null and enum policies.
    pub fn to_map(&self, object: &T, extra: WriterFeatures) -> Result<Vec<(String, Value)>, Error> {
        let features = self.features | extra;
        let mut map = Vec::with_capacity(self.units.len());
        for unit in &self.units {
            let value = match unit.value(object) {
                Ok(value) => value,
                Err(err) => {
                    if features.contains(WriterFeatures::IGNORE_ERROR_GETTER) {
                        continue;
                    }
                    return Err(err);
                }
            };

            if unit.flags().contains(FieldFlags::UNWRAPPED) {
                if let Value::Map(entries) = value {
                    map.extend(entries);
                    continue;
                }
            }

            if value.is_null() && !features.contains(WriterFeatures::WRITE_NULLS) {
                continue;
            }

            let value = match unit.rendered(value) {
                Value::Enum { name, ordinal } => {
                    if features.contains(WriterFeatures::ENUM_AS_NAME) {
                        Value::Str(name.to_owned())
                    } else {
                        Value::Int(ordinal as i64)
                    }
                }
                value => value,
            };
            map.push((unit.name().to_owned(), value));
        }
        Ok(map)
    }

    /// Encodes to the text format, returning the rendered string.
    pub fn to_text(&self, object: &T, ctx: &Context) -> Result<String, Error> {
        let mut sink = TextSink::new();
        self.write(&mut sink, object, ctx)?;
        Ok(sink.finish())
    }

    /// Encodes to the packed binary format.
    pub fn to_packed(&self, object: &T, ctx: &Context) -> Result<Bytes, Error> {
        let mut sink = BinarySink::new();
        self.write(&mut sink, object, ctx)?;
        Ok(sink.finish())
    }

    /// Emits the packed type tag, preferring a symbol reference when the
    /// context's table resolves the type name.
    fn write_class_info(&self, sink: &mut dyn Sink, ctx: &Context) -> Result<(), Error> {
        if let Some(table) = &ctx.symbols {
            if self.write_class_info_symbol(sink, table.as_ref())? {
                return Ok(());
            }
        }

        let fragment = self
            .packed_tag
            .get_or_init(|| binary::type_name_fragment(&self.type_name));
        sink.write_raw(fragment)
    }

    /// Writes the symbolic tag if the table knows the type name. The
    /// looked-up ordinal is cached together with the table identity; a
    /// different table instance forces a re-resolve.
    fn write_class_info_symbol(
        &self,
        sink: &mut dyn Sink,
        table: &dyn SymbolTable,
    ) -> Result<bool, Error> {
        let identity = table.identity();
        let cached = self.symbol_cache.load(Ordering::Relaxed);

        let ordinal = if cached != 0 && cached as u32 == identity {
            Some((cached >> 32) as u32)
        } else {
            match table.ordinal(self.type_name_hash) {
                Some(ordinal) => {
                    let snapshot = ((ordinal as u64) << 32) | identity as u64;
                    self.symbol_cache.store(snapshot, Ordering::Relaxed);
                    Some(ordinal)
                }
                None => None,
            }
        };

        match ordinal {
            Some(ordinal) => {
                sink.write_symbol(ordinal)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Writes the literal `"key":"name"` member from the lazily rendered
    /// fragment.
    fn write_text_tag(&self, sink: &mut dyn Sink) -> Result<(), Error> {
        let fragment = self
            .text_tag
            .get_or_init(|| format!("\"{}\":\"{}\"", self.type_key, self.type_name));
        sink.write_raw_str(fragment)
    }

    /// Binds an instance to this adapter as a nested [`Value`].
    pub fn bind(self: Arc<Self>, object: T) -> Value
    where
        T: Send + Sync + 'static,
    {
        Value::object(Bound {
            adapter: self,
            object,
        })
    }
}

/// An instance paired with its adapter, the nested-recursion seam.
struct Bound<T> {
    adapter: Arc<ObjectAdapter<T>>,
    object: T,
}

impl<T: Send + Sync> WireObject for Bound<T> {
    fn write_object(&self, sink: &mut dyn Sink, ctx: &Context) -> Result<(), Error> {
        self.adapter.write(sink, &self.object, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{SymbolTable, Symbols};

    struct Bean {
        id: i64,
        name: String,
    }

    fn adapter() -> ObjectAdapter<Bean> {
        AdapterBuilder::new("Bean")
            .field(FieldUnit::field("id", |b: &Bean| Value::Int(b.id)))
            .field(FieldUnit::field("name", |b: &Bean| {
                Value::Str(b.name.clone())
            }))
            .build()
            .unwrap()
    }

    fn sample() -> Bean {
        Bean {
            id: 7,
            name: "x".to_owned(),
        }
    }

    #[test]
    fn test_builder_rejects_bad_tag() {
        let result = AdapterBuilder::<Bean>::new("Bean").type_key("").build();
        assert!(matches!(result, Err(Error::Configuration(_))));

        let result = AdapterBuilder::<Bean>::new("Be\"an").build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_fast_path_text() {
        let text = adapter().to_text(&sample(), &Context::default()).unwrap();
        assert_eq!(text, r#"{"id":7,"name":"x"}"#);
    }

    #[test]
    fn test_value_shortcut_bypasses_wrapper() {
        let adapter = AdapterBuilder::new("Wrapper")
            .field(FieldUnit::field("inner", |b: &Bean| Value::Int(b.id)).value_unit())
            .build()
            .unwrap();
        let text = adapter.to_text(&sample(), &Context::default()).unwrap();
        assert_eq!(text, "7");
    }

    #[test]
    fn test_serializability_gate() {
        let adapter = AdapterBuilder::new("Opaque")
            .not_serializable()
            .field(FieldUnit::field("id", |b: &Bean| Value::Int(b.id)))
            .build()
            .unwrap();

        let err = adapter
            .to_text(
                &sample(),
                &Context::with_features(WriterFeatures::ERROR_ON_NONE_SERIALIZABLE),
            )
            .unwrap_err();
        assert!(matches!(err, Error::NotSerializable(_)));

        let text = adapter
            .to_text(
                &sample(),
                &Context::with_features(WriterFeatures::IGNORE_NONE_SERIALIZABLE),
            )
            .unwrap();
        assert_eq!(text, "null");
    }

    #[test]
    fn test_field_unit_lookup() {
        let adapter = adapter();
        let unit = adapter.field_unit_by_name("name").unwrap();
        assert_eq!(unit.name(), "name");
        assert!(adapter.field_unit_by_name("missing").is_none());
    }

    #[test]
    fn test_symbol_cache_tracks_table_identity() {
        let adapter = Arc::new(adapter());
        let ctx = Context {
            features: WriterFeatures::WRITE_CLASS_NAME,
            symbols: Some(Arc::new(Symbols::new(["Bean"]))),
            ..Context::default()
        };

        let first = adapter.to_packed(&sample(), &ctx).unwrap();
        let second = adapter.to_packed(&sample(), &ctx).unwrap();
        assert_eq!(first, second);

        // A different table identity forces a re-resolve.
        let other = Symbols::new(["Other", "Bean"]);
        let expected = other.ordinal(fnv::hash64("Bean")).unwrap();
        let ctx_other = Context {
            features: WriterFeatures::WRITE_CLASS_NAME,
            symbols: Some(Arc::new(other)),
            ..Context::default()
        };
        let third = adapter.to_packed(&sample(), &ctx_other).unwrap();
        assert_ne!(first, third);
        // Marker then the negated ordinal (ordinal 2 here).
        assert_eq!(third[0], crate::binary::BC_TYPED_ANY as u8);
        assert_eq!(third[1] as i8, -(expected as i8));
    }

    #[test]
    fn test_to_map() {
        let map = adapter()
            .to_map(&sample(), WriterFeatures::empty())
            .unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map[0].0, "id");
        assert!(matches!(map[0].1, Value::Int(7)));
        assert_eq!(map[1].0, "name");
    }
}
