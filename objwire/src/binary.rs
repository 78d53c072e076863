//! Packed binary wire format sink.
//!
//! A tagged-byte stream: every value is preceded by a marker byte (or a
//! small opcode embedded in the marker) identifying its kind. The signed
//! integer family is sign-aware and tiered to keep small magnitudes in one
//! byte:
//!
//! - `-16..=47`: the value itself is the marker byte
//! - two bytes, markers `48..=63`: `value = ((b0 - 56) << 8) | b1`, range
//!   `-2048..=2047`
//! - three bytes, markers `64..=71`: `value = ((b0 - 68) << 16) | (b1 << 8)
//!   | b2`, range `-262144..=262143`
//! - [`BC_INT32`] / [`BC_INT64`]: 4- and 8-byte big-endian payloads
//!
//! Strings pick the cheapest of inline-length ASCII (length embedded in the
//! marker), Latin-1, or UTF-8; a raw UTF-16 span has its own marker. Type
//! tags are [`BC_TYPED_ANY`] followed by either an inline name string or a
//! **negated** symbol-table ordinal; the negation distinguishes a symbol
//! reference from an inline length in the same opcode slot.
//!
//! Storage grows by doubling and previously written bytes are preserved
//! verbatim across growth.

use crate::{error::Error, sink::Sink, varint};
use bytes::{BufMut, Bytes, BytesMut};

pub const BC_BINARY: i8 = -111;
/// Type-tag opcode: followed by an inline name string or a negated symbol
/// ordinal.
pub const BC_TYPED_ANY: i8 = -110;
pub const BC_ARRAY_FIX_MIN: i8 = -108;
pub const BC_ARRAY_FIX_MAX: i8 = -93;
pub const BC_ARRAY: i8 = -92;
pub const BC_OBJECT_END: i8 = -91;
pub const BC_OBJECT: i8 = -90;
pub const BC_TIMESTAMP_MILLIS: i8 = -85;
pub const BC_NULL: i8 = -81;
pub const BC_FALSE: i8 = -80;
pub const BC_TRUE: i8 = -79;
pub const BC_FLOAT: i8 = -78;
pub const BC_DOUBLE: i8 = -77;
pub const BC_INT64: i8 = -68;
pub const BC_INT_NUM_MIN: i8 = -16;
pub const BC_INT_NUM_MAX: i8 = 47;
pub const BC_INT_BYTE_MIN: i8 = 48;
pub const BC_INT_SHORT_MIN: i8 = 64;
pub const BC_INT32: i8 = 72;
pub const BC_STR_ASCII_FIX_MIN: i8 = 73;
pub const BC_STR_UTF8: i8 = 121;
pub const BC_STR_UTF16: i8 = 122;
pub const BC_STR_LATIN1: i8 = 123;

/// Longest string encodable with an inline-length ASCII marker.
pub const STR_ASCII_FIX_LEN: usize = 47;
/// Largest array count encodable in a fixed-count marker.
pub const ARRAY_FIX_LEN: usize = (BC_ARRAY_FIX_MAX - BC_ARRAY_FIX_MIN) as usize;

/// A single-call, append-only packed writer. Build one per top-level encode
/// and consume it with [`BinarySink::finish`].
pub struct BinarySink {
    buf: BytesMut,
}

impl BinarySink {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(256),
        }
    }

    /// Consumes the sink, freezing the accumulated bytes.
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }

    /// The bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    #[inline]
    fn put_marker(&mut self, marker: i8) {
        self.buf.put_u8(marker as u8);
    }

    fn put_str(&mut self, value: &str) {
        if value.is_ascii() && value.len() <= STR_ASCII_FIX_LEN {
            self.put_marker(BC_STR_ASCII_FIX_MIN + value.len() as i8);
            self.buf.put_slice(value.as_bytes());
            return;
        }

        if value.chars().all(|c| (c as u32) <= 0xFF) {
            let count = value.chars().count();
            self.put_marker(BC_STR_LATIN1);
            varint::write(count as u64, &mut self.buf);
            for c in value.chars() {
                self.buf.put_u8(c as u8);
            }
            return;
        }

        self.put_marker(BC_STR_UTF8);
        varint::write(value.len() as u64, &mut self.buf);
        self.buf.put_slice(value.as_bytes());
    }
}

impl Default for BinarySink {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders a standalone literal type tag (marker plus inline name), for
/// callers caching the fragment.
pub(crate) fn type_name_fragment(name: &str) -> Vec<u8> {
    let mut sink = BinarySink::new();
    sink.put_marker(BC_TYPED_ANY);
    sink.put_str(name);
    sink.buf.to_vec()
}

impl Sink for BinarySink {
    fn is_binary(&self) -> bool {
        true
    }

    fn start_object(&mut self) -> Result<(), Error> {
        self.put_marker(BC_OBJECT);
        Ok(())
    }

    fn end_object(&mut self) -> Result<(), Error> {
        self.put_marker(BC_OBJECT_END);
        Ok(())
    }

    fn start_array(&mut self, len: usize) -> Result<(), Error> {
        if len <= ARRAY_FIX_LEN {
            self.put_marker(BC_ARRAY_FIX_MIN + len as i8);
        } else {
            self.put_marker(BC_ARRAY);
            self.write_int(len as i64)?;
        }
        Ok(())
    }

    fn end_array(&mut self) -> Result<(), Error> {
        // The packed format carries the element count up front.
        Ok(())
    }

    fn write_name(&mut self, name: &str) -> Result<(), Error> {
        self.put_str(name);
        Ok(())
    }

    fn write_null(&mut self) -> Result<(), Error> {
        self.put_marker(BC_NULL);
        Ok(())
    }

    fn write_bool(&mut self, value: bool) -> Result<(), Error> {
        self.put_marker(if value { BC_TRUE } else { BC_FALSE });
        Ok(())
    }

    fn write_int(&mut self, value: i64) -> Result<(), Error> {
        if (BC_INT_NUM_MIN as i64..=BC_INT_NUM_MAX as i64).contains(&value) {
            self.buf.put_u8(value as u8);
        } else if (-2048..=2047).contains(&value) {
            self.buf.put_u8(((value >> 8) + BC_INT_BYTE_MIN as i64 + 8) as u8);
            self.buf.put_u8(value as u8);
        } else if (-262_144..=262_143).contains(&value) {
            self.buf.put_u8(((value >> 16) + BC_INT_SHORT_MIN as i64 + 4) as u8);
            self.buf.put_u8((value >> 8) as u8);
            self.buf.put_u8(value as u8);
        } else if (i32::MIN as i64..=i32::MAX as i64).contains(&value) {
            self.put_marker(BC_INT32);
            self.buf.put_i32(value as i32);
        } else {
            self.put_marker(BC_INT64);
            self.buf.put_i64(value);
        }
        Ok(())
    }

    fn write_float(&mut self, value: f32) -> Result<(), Error> {
        self.put_marker(BC_FLOAT);
        self.buf.put_f32(value);
        Ok(())
    }

    fn write_double(&mut self, value: f64) -> Result<(), Error> {
        self.put_marker(BC_DOUBLE);
        self.buf.put_f64(value);
        Ok(())
    }

    fn write_str(&mut self, value: &str) -> Result<(), Error> {
        self.put_str(value);
        Ok(())
    }

    fn write_utf16(&mut self, value: &[u16]) -> Result<(), Error> {
        self.put_marker(BC_STR_UTF16);
        varint::write((value.len() * 2) as u64, &mut self.buf);
        for unit in value {
            self.buf.put_u16_le(*unit);
        }
        Ok(())
    }

    fn write_bytes(&mut self, value: &[u8]) -> Result<(), Error> {
        self.put_marker(BC_BINARY);
        varint::write(value.len() as u64, &mut self.buf);
        self.buf.put_slice(value);
        Ok(())
    }

    fn write_timestamp_millis(&mut self, millis: i64) -> Result<(), Error> {
        self.put_marker(BC_TIMESTAMP_MILLIS);
        self.buf.put_i64(millis);
        Ok(())
    }

    fn write_comma(&mut self) -> Result<(), Error> {
        Err(Error::Unsupported("comma on a packed sink"))
    }

    fn write_colon(&mut self) -> Result<(), Error> {
        Err(Error::Unsupported("colon on a packed sink"))
    }

    fn write_raw_str(&mut self, _fragment: &str) -> Result<(), Error> {
        Err(Error::Unsupported("text fragment on a packed sink"))
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<(), Error> {
        if bytes.is_empty() {
            return Err(Error::Unsupported("empty raw write"));
        }
        self.buf.put_slice(bytes);
        Ok(())
    }

    fn write_type_name(&mut self, name: &str) -> Result<(), Error> {
        self.put_marker(BC_TYPED_ANY);
        self.put_str(name);
        Ok(())
    }

    fn write_symbol(&mut self, ordinal: u32) -> Result<(), Error> {
        self.put_marker(BC_TYPED_ANY);
        self.write_int(-(ordinal as i64))
    }
}
