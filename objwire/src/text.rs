//! Text wire format sink.
//!
//! Standard delimited object/array syntax with full string escaping and
//! optional pretty printing. Separators between members are placed
//! automatically from a container-frame stack, so callers only issue
//! names and values.

use crate::{error::Error, sink::Sink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

#[derive(Debug)]
struct Frame {
    kind: Container,
    items: usize,
}

/// A single-call, append-only text writer. Build one per top-level encode
/// and consume it with [`TextSink::finish`].
pub struct TextSink {
    out: String,
    pretty: bool,
    frames: Vec<Frame>,
}

impl TextSink {
    /// A compact-output sink.
    pub fn new() -> Self {
        Self {
            out: String::with_capacity(256),
            pretty: false,
            frames: Vec::new(),
        }
    }

    /// A sink with newline/tab pretty printing.
    pub fn pretty() -> Self {
        Self {
            pretty: true,
            ..Self::new()
        }
    }

    /// Consumes the sink, returning the accumulated text.
    pub fn finish(self) -> String {
        self.out
    }

    fn indent(&mut self) {
        self.out.push('\n');
        for _ in 0..self.frames.len() {
            self.out.push('\t');
        }
    }

    /// Separator handling before a value in array position (or at top
    /// level). Object members are separated by `write_name` instead.
    fn before_value(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            if frame.kind == Container::Array {
                if frame.items > 0 {
                    self.out.push(',');
                }
                frame.items += 1;
                if self.pretty {
                    self.indent();
                }
            }
        }
    }

    fn push_escaped(&mut self, value: &str) {
        self.out.push('"');
        for c in value.chars() {
            match c {
                '"' => self.out.push_str("\\\""),
                '\\' => self.out.push_str("\\\\"),
                '\n' => self.out.push_str("\\n"),
                '\r' => self.out.push_str("\\r"),
                '\t' => self.out.push_str("\\t"),
                '\u{8}' => self.out.push_str("\\b"),
                '\u{c}' => self.out.push_str("\\f"),
                c if (c as u32) < 0x20 => {
                    self.out.push_str(&format!("\\u{:04x}", c as u32));
                }
                c => self.out.push(c),
            }
        }
        self.out.push('"');
    }
}

impl Default for TextSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for TextSink {
    fn is_binary(&self) -> bool {
        false
    }

    fn start_object(&mut self) -> Result<(), Error> {
        self.before_value();
        self.out.push('{');
        self.frames.push(Frame {
            kind: Container::Object,
            items: 0,
        });
        Ok(())
    }

    fn end_object(&mut self) -> Result<(), Error> {
        match self.frames.pop() {
            Some(frame) if frame.kind == Container::Object => {
                if self.pretty && frame.items > 0 {
                    self.indent();
                }
                self.out.push('}');
                Ok(())
            }
            _ => Err(Error::Unsupported("end_object without open object")),
        }
    }

    fn start_array(&mut self, _len: usize) -> Result<(), Error> {
        self.before_value();
        self.out.push('[');
        self.frames.push(Frame {
            kind: Container::Array,
            items: 0,
        });
        Ok(())
    }

    fn end_array(&mut self) -> Result<(), Error> {
        match self.frames.pop() {
            Some(frame) if frame.kind == Container::Array => {
                if self.pretty && frame.items > 0 {
                    self.indent();
                }
                self.out.push(']');
                Ok(())
            }
            _ => Err(Error::Unsupported("end_array without open array")),
        }
    }

    fn write_name(&mut self, name: &str) -> Result<(), Error> {
        match self.frames.last_mut() {
            Some(frame) if frame.kind == Container::Object => {
                if frame.items > 0 {
                    self.out.push(',');
                }
                frame.items += 1;
            }
            _ => return Err(Error::Unsupported("field name outside object")),
        }
        if self.pretty {
            self.indent();
        }
        self.push_escaped(name);
        self.out.push(':');
        Ok(())
    }

    fn write_null(&mut self) -> Result<(), Error> {
        self.before_value();
        self.out.push_str("null");
        Ok(())
    }

    fn write_bool(&mut self, value: bool) -> Result<(), Error> {
        self.before_value();
        self.out.push_str(if value { "true" } else { "false" });
        Ok(())
    }

    fn write_int(&mut self, value: i64) -> Result<(), Error> {
        self.before_value();
        self.out.push_str(&value.to_string());
        Ok(())
    }

    fn write_float(&mut self, value: f32) -> Result<(), Error> {
        self.before_value();
        if value.is_finite() {
            self.out.push_str(&value.to_string());
        } else {
            self.out.push_str("null");
        }
        Ok(())
    }

    fn write_double(&mut self, value: f64) -> Result<(), Error> {
        self.before_value();
        if value.is_finite() {
            self.out.push_str(&value.to_string());
        } else {
            self.out.push_str("null");
        }
        Ok(())
    }

    fn write_str(&mut self, value: &str) -> Result<(), Error> {
        self.before_value();
        self.push_escaped(value);
        Ok(())
    }

    fn write_utf16(&mut self, value: &[u16]) -> Result<(), Error> {
        let decoded =
            String::from_utf16(value).map_err(|_| Error::Unsupported("invalid utf-16 span"))?;
        self.write_str(&decoded)
    }

    fn write_bytes(&mut self, value: &[u8]) -> Result<(), Error> {
        self.start_array(value.len())?;
        for byte in value {
            self.write_int(*byte as i64)?;
        }
        self.end_array()
    }

    fn write_timestamp_millis(&mut self, millis: i64) -> Result<(), Error> {
        self.write_int(millis)
    }

    fn write_comma(&mut self) -> Result<(), Error> {
        self.out.push(',');
        Ok(())
    }

    fn write_colon(&mut self) -> Result<(), Error> {
        self.out.push(':');
        Ok(())
    }

    fn write_raw_str(&mut self, fragment: &str) -> Result<(), Error> {
        if fragment.is_empty() {
            return Err(Error::Unsupported("empty raw fragment"));
        }
        let mut in_object = false;
        if let Some(frame) = self.frames.last_mut() {
            if frame.kind == Container::Object {
                if frame.items > 0 {
                    self.out.push(',');
                }
                frame.items += 1;
                in_object = true;
            }
        }
        if self.pretty && in_object {
            self.indent();
        }
        self.out.push_str(fragment);
        Ok(())
    }

    fn write_raw(&mut self, _bytes: &[u8]) -> Result<(), Error> {
        Err(Error::Unsupported("raw bytes on a text sink"))
    }

    fn write_type_name(&mut self, _name: &str) -> Result<(), Error> {
        Err(Error::Unsupported("packed type tag on a text sink"))
    }

    fn write_symbol(&mut self, _ordinal: u32) -> Result<(), Error> {
        Err(Error::Unsupported("symbol reference on a text sink"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object() {
        let mut sink = TextSink::new();
        sink.start_object().unwrap();
        sink.write_name("id").unwrap();
        sink.write_int(7).unwrap();
        sink.write_name("name").unwrap();
        sink.write_str("x").unwrap();
        sink.end_object().unwrap();
        assert_eq!(sink.finish(), r#"{"id":7,"name":"x"}"#);
    }

    #[test]
    fn test_array_commas() {
        let mut sink = TextSink::new();
        sink.start_array(3).unwrap();
        sink.write_int(1).unwrap();
        sink.write_str("two").unwrap();
        sink.write_bool(false).unwrap();
        sink.end_array().unwrap();
        assert_eq!(sink.finish(), r#"[1,"two",false]"#);
    }

    #[test]
    fn test_escaping() {
        let mut sink = TextSink::new();
        sink.write_str("a\"b\\c\nd\u{1}").unwrap();
        assert_eq!(sink.finish(), r#""a\"b\\c\nd\u0001""#);
    }

    #[test]
    fn test_pretty() {
        let mut sink = TextSink::pretty();
        sink.start_array(2).unwrap();
        sink.write_int(1).unwrap();
        sink.write_int(2).unwrap();
        sink.end_array().unwrap();
        assert_eq!(sink.finish(), "[\n\t1,\n\t2\n]");
    }

    #[test]
    fn test_nonfinite_double() {
        let mut sink = TextSink::new();
        sink.write_double(f64::NAN).unwrap();
        assert_eq!(sink.finish(), "null");
    }

    #[test]
    fn test_binary_only_ops_fail() {
        let mut sink = TextSink::new();
        assert!(matches!(
            sink.write_raw(&[1]),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(
            sink.write_type_name("T"),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(sink.write_symbol(1), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_name_outside_object() {
        let mut sink = TextSink::new();
        assert!(matches!(
            sink.write_name("id"),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn test_utf16_span() {
        let mut sink = TextSink::new();
        let units: Vec<u16> = "héllo".encode_utf16().collect();
        sink.write_utf16(&units).unwrap();
        assert_eq!(sink.finish(), "\"héllo\"");
    }
}
