//! Newline-delimited JSON values

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CodecError, CodecResult};
use crate::{Codec, Decoder, Encoder};

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

pub struct JsonEncoder<W> {
    sink: W,
}

pub struct JsonDecoder<R> {
    source: R,
}

impl Codec for JsonCodec {
    type Encoder<W: Write> = JsonEncoder<W>;
    type Decoder<R: Read> = JsonDecoder<R>;

    fn new_encoder<W: Write>(&self, sink: W) -> CodecResult<JsonEncoder<W>> {
        Ok(JsonEncoder { sink })
    }

    fn new_decoder<R: Read>(&self, source: R) -> CodecResult<JsonDecoder<R>> {
        Ok(JsonDecoder { source })
    }
}

impl<W: Write> Encoder for JsonEncoder<W> {
    type Sink = W;

    fn encode<T: Serialize + 'static>(&mut self, value: &T) -> CodecResult<()> {
        serde_json::to_writer(&mut self.sink, value).map_err(|e| {
            if e.is_io() {
                CodecError::Io(e.into())
            } else {
                CodecError::ser(e)
            }
        })?;
        self.sink.write_all(b"\n")?;
        Ok(())
    }

    fn get_mut(&mut self) -> &mut W {
        &mut self.sink
    }
}

impl<R: Read> Decoder for JsonDecoder<R> {
    fn decode<T: DeserializeOwned + 'static>(&mut self) -> CodecResult<T> {
        // A fresh deserializer per value: it never reads past the end of the
        // value except for one byte of trailing whitespace.
        let mut de = serde_json::Deserializer::from_reader(&mut self.source);
        T::deserialize(&mut de).map_err(|e| {
            if e.is_io() {
                CodecError::Io(e.into())
            } else if e.is_eof() {
                CodecError::de(format_args!("unexpected end of stream: {e}"))
            } else {
                CodecError::de(e)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{other, record, Other, Record};

    #[test]
    fn test_roundtrip_struct() {
        let bytes = JsonCodec.marshal(&record()).unwrap();
        assert!(bytes.ends_with(b"\n"));
        assert_eq!(JsonCodec.unmarshal::<Record>(&bytes).unwrap(), record());
    }

    #[test]
    fn test_stream_of_values() {
        let mut buf = Vec::new();
        let mut enc = JsonCodec.new_encoder(&mut buf).unwrap();
        enc.encode(&record()).unwrap();
        enc.encode(&42u32).unwrap();
        enc.encode(&other()).unwrap();
        enc.encode(&"tail".to_string()).unwrap();

        let mut dec = JsonCodec.new_decoder(buf.as_slice()).unwrap();
        assert_eq!(dec.decode::<Record>().unwrap(), record());
        assert_eq!(dec.decode::<u32>().unwrap(), 42);
        assert_eq!(dec.decode::<Other>().unwrap(), other());
        assert_eq!(dec.decode::<String>().unwrap(), "tail");
    }

    #[test]
    fn test_wire_format() {
        let bytes = JsonCodec.marshal(&other()).unwrap();
        assert_eq!(bytes, b"{\"name\":\"other\",\"count\":3}\n");
    }

    #[test]
    fn test_wrong_type_fails() {
        let bytes = JsonCodec.marshal(&other()).unwrap();
        let err = JsonCodec.unmarshal::<Record>(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::Deserialization(_)));
    }

    #[test]
    fn test_empty_input_fails() {
        let err = JsonCodec.unmarshal::<Record>(b"").unwrap_err();
        assert!(matches!(err, CodecError::Deserialization(_)));
    }

    #[test]
    fn test_non_string_map_key_fails_to_encode() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(vec![1u8], 1u8);
        let err = JsonCodec.marshal(&map).unwrap_err();
        assert!(matches!(err, CodecError::Serialization(_)));
    }
}
