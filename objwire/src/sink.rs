//! The shared writer surface for both wire formats.
//!
//! A sink is a single-threaded, append-only buffer serving exactly one
//! top-level encode call. Operations that only make sense for one wire mode
//! return [`Error::Unsupported`] on the other instead of being silently
//! ignored, so callers can branch on the result without inspecting the sink.

use crate::error::Error;

/// One output mode's primitive operations.
///
/// Object-safe so nested objects and before/after hooks can write through a
/// `&mut dyn Sink` without knowing the concrete mode.
pub trait Sink {
    /// Whether this sink emits the packed binary format.
    fn is_binary(&self) -> bool;

    /// Opens an object scope.
    fn start_object(&mut self) -> Result<(), Error>;

    /// Closes the innermost object scope.
    fn end_object(&mut self) -> Result<(), Error>;

    /// Opens an array scope of exactly `len` elements.
    ///
    /// The packed format writes the element count up front; the text format
    /// ignores it.
    fn start_array(&mut self, len: usize) -> Result<(), Error>;

    /// Closes the innermost array scope.
    fn end_array(&mut self) -> Result<(), Error>;

    /// Writes a field name within the current object scope.
    fn write_name(&mut self, name: &str) -> Result<(), Error>;

    fn write_null(&mut self) -> Result<(), Error>;
    fn write_bool(&mut self, value: bool) -> Result<(), Error>;
    fn write_int(&mut self, value: i64) -> Result<(), Error>;
    fn write_float(&mut self, value: f32) -> Result<(), Error>;
    fn write_double(&mut self, value: f64) -> Result<(), Error>;
    fn write_str(&mut self, value: &str) -> Result<(), Error>;

    /// Writes a string supplied as a raw UTF-16 code-unit span.
    fn write_utf16(&mut self, value: &[u16]) -> Result<(), Error>;

    /// Writes a binary blob.
    fn write_bytes(&mut self, value: &[u8]) -> Result<(), Error>;

    /// Writes an instant as milliseconds since the Unix epoch.
    fn write_timestamp_millis(&mut self, millis: i64) -> Result<(), Error>;

    // Text-only operations.

    /// Writes a bare comma separator. Text sinks only.
    fn write_comma(&mut self) -> Result<(), Error>;

    /// Writes a bare colon separator. Text sinks only.
    fn write_colon(&mut self) -> Result<(), Error>;

    /// Writes a pre-rendered text fragment verbatim. Text sinks only.
    fn write_raw_str(&mut self, fragment: &str) -> Result<(), Error>;

    // Binary-only operations.

    /// Writes pre-encoded packed bytes verbatim. Binary sinks only; empty
    /// fragments are rejected.
    fn write_raw(&mut self, bytes: &[u8]) -> Result<(), Error>;

    /// Writes a type tag carrying the inline type name. Binary sinks only.
    fn write_type_name(&mut self, name: &str) -> Result<(), Error>;

    /// Writes a type tag referencing a symbol-table ordinal (encoded
    /// negated, distinguishing it from an inline name). Binary sinks only.
    fn write_symbol(&mut self, ordinal: u32) -> Result<(), Error>;
}
