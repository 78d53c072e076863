//! Feature bitmasks controlling writer and field behavior.
//!
//! The effective feature set for one encode call is the bitwise OR of the
//! adapter's features and the context's features.

use bitflags::bitflags;

bitflags! {
    /// Writer-level feature flags, combinable per adapter and per context.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct WriterFeatures: u32 {
        /// Emit objects as positional value arrays with no field names.
        const ARRAY_MAPPED = 1 << 0;
        /// Emit a type tag before (binary) or inside (text) the object body.
        const WRITE_CLASS_NAME = 1 << 1;
        /// Fail the encode when the type is not marked serializable.
        const ERROR_ON_NONE_SERIALIZABLE = 1 << 2;
        /// Emit null instead of failing when the type is not serializable.
        const IGNORE_NONE_SERIALIZABLE = 1 << 3;
        /// Keep synthetic enclosing-instance back-reference fields.
        const REFERENCE_DETECTION = 1 << 4;
        /// Skip accessor-backed fields entirely.
        const IGNORE_NON_FIELD_GETTER = 1 << 5;
        /// Skip fields whose accessor raises instead of aborting the encode.
        const IGNORE_ERROR_GETTER = 1 << 6;
        /// Emit null-valued fields instead of omitting them.
        const WRITE_NULLS = 1 << 7;
        /// Emit enum values by name instead of ordinal.
        const ENUM_AS_NAME = 1 << 8;
    }
}

bitflags! {
    /// Per-field flags fixed at construction time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FieldFlags: u32 {
        /// The unit is the entire representation of its declaring object.
        const VALUE = 1 << 0;
        /// Backed by a raw field rather than an accessor function.
        const RAW_FIELD = 1 << 1;
        /// Flatten the value's entries into the parent object's key space.
        const UNWRAPPED = 1 << 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine() {
        let adapter = WriterFeatures::WRITE_CLASS_NAME;
        let context = WriterFeatures::WRITE_NULLS | WriterFeatures::ARRAY_MAPPED;
        let all = adapter | context;
        assert!(all.contains(WriterFeatures::WRITE_CLASS_NAME));
        assert!(all.contains(WriterFeatures::WRITE_NULLS));
        assert!(!all.contains(WriterFeatures::REFERENCE_DETECTION));
    }
}
