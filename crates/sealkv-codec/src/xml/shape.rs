//! Shape check run before a value is written as XML
//!
//! The element mapping loses two shapes: an empty sequence writes no
//! elements at all (the field reads back as missing), and `Some` around
//! content that writes nothing reads back as `None`. Both are refused here
//! so the encoder never produces a document that decodes to something else.

use std::fmt;

use serde::ser::{self, Serialize};

#[derive(Debug)]
pub(crate) struct Unrepresentable(String);

impl fmt::Display for Unrepresentable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Unrepresentable {}

impl ser::Error for Unrepresentable {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Unrepresentable(msg.to_string())
    }
}

/// `true` when the value writes no element content.
type Empty = bool;

type ShapeResult = Result<Empty, Unrepresentable>;

pub(crate) fn check<T: Serialize + ?Sized>(value: &T) -> Result<(), Unrepresentable> {
    value.serialize(Shape).map(|_| ())
}

fn empty_sequence() -> Unrepresentable {
    Unrepresentable("empty sequences cannot be represented in XML".into())
}

struct Shape;

struct Elements {
    count: usize,
}

impl Elements {
    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Unrepresentable> {
        value.serialize(Shape)?;
        self.count += 1;
        Ok(())
    }

    fn end_sequence(self) -> ShapeResult {
        if self.count == 0 {
            return Err(empty_sequence());
        }
        Ok(false)
    }
}

impl ser::Serializer for Shape {
    type Ok = Empty;
    type Error = Unrepresentable;
    type SerializeSeq = Elements;
    type SerializeTuple = Elements;
    type SerializeTupleStruct = Elements;
    type SerializeTupleVariant = Elements;
    type SerializeMap = Elements;
    type SerializeStruct = Elements;
    type SerializeStructVariant = Elements;

    fn serialize_bool(self, _: bool) -> ShapeResult {
        Ok(false)
    }

    fn serialize_i8(self, _: i8) -> ShapeResult {
        Ok(false)
    }

    fn serialize_i16(self, _: i16) -> ShapeResult {
        Ok(false)
    }

    fn serialize_i32(self, _: i32) -> ShapeResult {
        Ok(false)
    }

    fn serialize_i64(self, _: i64) -> ShapeResult {
        Ok(false)
    }

    fn serialize_i128(self, _: i128) -> ShapeResult {
        Ok(false)
    }

    fn serialize_u8(self, _: u8) -> ShapeResult {
        Ok(false)
    }

    fn serialize_u16(self, _: u16) -> ShapeResult {
        Ok(false)
    }

    fn serialize_u32(self, _: u32) -> ShapeResult {
        Ok(false)
    }

    fn serialize_u64(self, _: u64) -> ShapeResult {
        Ok(false)
    }

    fn serialize_u128(self, _: u128) -> ShapeResult {
        Ok(false)
    }

    fn serialize_f32(self, _: f32) -> ShapeResult {
        Ok(false)
    }

    fn serialize_f64(self, _: f64) -> ShapeResult {
        Ok(false)
    }

    fn serialize_char(self, _: char) -> ShapeResult {
        Ok(false)
    }

    fn serialize_str(self, v: &str) -> ShapeResult {
        Ok(v.is_empty())
    }

    fn serialize_bytes(self, v: &[u8]) -> ShapeResult {
        Ok(v.is_empty())
    }

    fn serialize_none(self) -> ShapeResult {
        Ok(true)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> ShapeResult {
        if value.serialize(Shape)? {
            return Err(Unrepresentable(
                "`Some` around empty content reads back as `None` in XML".into(),
            ));
        }
        Ok(false)
    }

    fn serialize_unit(self) -> ShapeResult {
        Ok(true)
    }

    fn serialize_unit_struct(self, _: &'static str) -> ShapeResult {
        Ok(true)
    }

    fn serialize_unit_variant(self, _: &'static str, _: u32, _: &'static str) -> ShapeResult {
        Ok(false)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        value: &T,
    ) -> ShapeResult {
        value.serialize(Shape)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        value: &T,
    ) -> ShapeResult {
        value.serialize(Shape)?;
        Ok(false)
    }

    fn serialize_seq(self, _: Option<usize>) -> Result<Elements, Unrepresentable> {
        Ok(Elements { count: 0 })
    }

    fn serialize_tuple(self, _: usize) -> Result<Elements, Unrepresentable> {
        Ok(Elements { count: 0 })
    }

    fn serialize_tuple_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Elements, Unrepresentable> {
        Ok(Elements { count: 0 })
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Elements, Unrepresentable> {
        Ok(Elements { count: 0 })
    }

    fn serialize_map(self, _: Option<usize>) -> Result<Elements, Unrepresentable> {
        Ok(Elements { count: 0 })
    }

    fn serialize_struct(self, _: &'static str, _: usize) -> Result<Elements, Unrepresentable> {
        Ok(Elements { count: 0 })
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Elements, Unrepresentable> {
        Ok(Elements { count: 0 })
    }
}

impl ser::SerializeSeq for Elements {
    type Ok = Empty;
    type Error = Unrepresentable;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Unrepresentable> {
        self.push(value)
    }

    fn end(self) -> ShapeResult {
        self.end_sequence()
    }
}

impl ser::SerializeTuple for Elements {
    type Ok = Empty;
    type Error = Unrepresentable;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Unrepresentable> {
        self.push(value)
    }

    fn end(self) -> ShapeResult {
        self.end_sequence()
    }
}

impl ser::SerializeTupleStruct for Elements {
    type Ok = Empty;
    type Error = Unrepresentable;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Unrepresentable> {
        self.push(value)
    }

    fn end(self) -> ShapeResult {
        self.end_sequence()
    }
}

// Variants always write their tag, so they are never empty.
impl ser::SerializeTupleVariant for Elements {
    type Ok = Empty;
    type Error = Unrepresentable;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Unrepresentable> {
        self.push(value)
    }

    fn end(self) -> ShapeResult {
        Ok(false)
    }
}

impl ser::SerializeMap for Elements {
    type Ok = Empty;
    type Error = Unrepresentable;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), Unrepresentable> {
        key.serialize(Shape)?;
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Unrepresentable> {
        self.push(value)
    }

    fn end(self) -> ShapeResult {
        Ok(self.count == 0)
    }
}

impl ser::SerializeStruct for Elements {
    type Ok = Empty;
    type Error = Unrepresentable;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        _: &'static str,
        value: &T,
    ) -> Result<(), Unrepresentable> {
        self.push(value)
    }

    fn end(self) -> ShapeResult {
        Ok(self.count == 0)
    }
}

impl ser::SerializeStructVariant for Elements {
    type Ok = Empty;
    type Error = Unrepresentable;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        _: &'static str,
        value: &T,
    ) -> Result<(), Unrepresentable> {
        self.push(value)
    }

    fn end(self) -> ShapeResult {
        Ok(false)
    }
}
