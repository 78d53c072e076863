//! Encode structured objects to wire formats.
//!
//! # Overview
//!
//! A serialization engine that turns in-memory objects into two wire
//! representations (a human-readable text form and a compact
//! self-describing packed binary form) at high throughput, while letting
//! callers customize field names, values, inclusion, and polymorphic type
//! tagging without paying for customization when it is absent.
//!
//! The engine consumes an [`ObjectAdapter`]: the per-type encoding plan,
//! holding one [`FieldUnit`] per serializable property in declaration
//! order plus a sorted-hash index for out-of-order lookups. Whole-object
//! writes iterate units directly (the fast path); when any filter is
//! active the adapter routes every field through the interception
//! pipeline instead. Field discovery happens outside this crate: an
//! introspection collaborator feeds [`AdapterBuilder`] the ordered unit
//! list.
//!
//! # Example
//!
//! ```
//! use objwire::{AdapterBuilder, Context, FieldUnit, Value, WriterFeatures};
//!
//! struct Point {
//!     x: i64,
//!     y: i64,
//! }
//!
//! let adapter = AdapterBuilder::new("Point")
//!     .field(FieldUnit::field("x", |p: &Point| Value::Int(p.x)))
//!     .field(FieldUnit::field("y", |p: &Point| Value::Int(p.y)))
//!     .build()
//!     .unwrap();
//!
//! let point = Point { x: 1, y: 2 };
//! let text = adapter.to_text(&point, &Context::default()).unwrap();
//! assert_eq!(text, r#"{"x":1,"y":2}"#);
//!
//! // Array-mapped mode drops field names for schema-implied decoding.
//! let ctx = Context::with_features(WriterFeatures::ARRAY_MAPPED);
//! assert_eq!(adapter.to_text(&point, &ctx).unwrap(), "[1,2]");
//! ```
//!
//! # Concurrency
//!
//! Sinks are single-threaded and serve exactly one top-level encode call.
//! Adapters are built once per type-configuration and shared read-only
//! across concurrent encodes; their lazy tag and symbol-ordinal caches are
//! idempotent to recompute and need no locks.

pub mod adapter;
pub mod binary;
pub mod context;
pub mod error;
pub mod features;
pub mod field;
pub mod filter;
pub mod fnv;
pub mod index;
pub mod sink;
pub mod symbol;
pub mod text;
pub mod value;
pub mod varint;

// Re-export main types and traits
pub use adapter::{AdapterBuilder, ObjectAdapter, DEFAULT_TYPE_KEY};
pub use binary::BinarySink;
pub use context::Context;
pub use error::Error;
pub use features::{FieldFlags, WriterFeatures};
pub use field::{Extract, FieldUnit};
pub use filter::{
    AfterFilter, BeforeFilter, ContextNameFilter, ContextValueFilter, FieldMeta, Filters,
    LabelFilter, NameFilter, PreFilter, PropertyFilter, ValueFilter,
};
pub use index::HashIndex;
pub use sink::Sink;
pub use symbol::{SymbolTable, Symbols};
pub use text::TextSink;
pub use value::{write_value, Value, WireObject};
