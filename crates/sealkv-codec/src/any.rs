//! Runtime codec selection from configuration

use std::io::{Read, Write};

use sealkv_core::CodecKind;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::binary::{BinaryCodec, BinaryDecoder, BinaryEncoder, TypeTable};
use crate::error::CodecResult;
use crate::json::{JsonCodec, JsonDecoder, JsonEncoder};
use crate::xml::{XmlCodec, XmlDecoder, XmlEncoder};
use crate::{Codec, Decoder, Encoder};

#[derive(Debug, Clone)]
pub enum AnyCodec {
    Json(JsonCodec),
    Xml(XmlCodec),
    Binary(BinaryCodec),
}

impl AnyCodec {
    /// Build the codec named by `kind`. `table` is only used by the binary codec.
    pub fn from_kind(kind: CodecKind, table: TypeTable) -> Self {
        match kind {
            CodecKind::Json => AnyCodec::Json(JsonCodec),
            CodecKind::Xml => AnyCodec::Xml(XmlCodec),
            CodecKind::Binary => AnyCodec::Binary(BinaryCodec::new(table)),
        }
    }

    pub fn kind(&self) -> CodecKind {
        match self {
            AnyCodec::Json(_) => CodecKind::Json,
            AnyCodec::Xml(_) => CodecKind::Xml,
            AnyCodec::Binary(_) => CodecKind::Binary,
        }
    }
}

impl Default for AnyCodec {
    fn default() -> Self {
        AnyCodec::Json(JsonCodec)
    }
}

impl From<JsonCodec> for AnyCodec {
    fn from(codec: JsonCodec) -> Self {
        AnyCodec::Json(codec)
    }
}

impl From<XmlCodec> for AnyCodec {
    fn from(codec: XmlCodec) -> Self {
        AnyCodec::Xml(codec)
    }
}

impl From<BinaryCodec> for AnyCodec {
    fn from(codec: BinaryCodec) -> Self {
        AnyCodec::Binary(codec)
    }
}

pub enum AnyEncoder<W> {
    Json(JsonEncoder<W>),
    Xml(XmlEncoder<W>),
    Binary(BinaryEncoder<W>),
}

pub enum AnyDecoder<R> {
    Json(JsonDecoder<R>),
    Xml(XmlDecoder<R>),
    Binary(BinaryDecoder<R>),
}

impl Codec for AnyCodec {
    type Encoder<W: Write> = AnyEncoder<W>;
    type Decoder<R: Read> = AnyDecoder<R>;

    fn new_encoder<W: Write>(&self, sink: W) -> CodecResult<AnyEncoder<W>> {
        Ok(match self {
            AnyCodec::Json(c) => AnyEncoder::Json(c.new_encoder(sink)?),
            AnyCodec::Xml(c) => AnyEncoder::Xml(c.new_encoder(sink)?),
            AnyCodec::Binary(c) => AnyEncoder::Binary(c.new_encoder(sink)?),
        })
    }

    fn new_decoder<R: Read>(&self, source: R) -> CodecResult<AnyDecoder<R>> {
        Ok(match self {
            AnyCodec::Json(c) => AnyDecoder::Json(c.new_decoder(source)?),
            AnyCodec::Xml(c) => AnyDecoder::Xml(c.new_decoder(source)?),
            AnyCodec::Binary(c) => AnyDecoder::Binary(c.new_decoder(source)?),
        })
    }
}

impl<W: Write> Encoder for AnyEncoder<W> {
    type Sink = W;

    fn encode<T: Serialize + 'static>(&mut self, value: &T) -> CodecResult<()> {
        match self {
            AnyEncoder::Json(e) => e.encode(value),
            AnyEncoder::Xml(e) => e.encode(value),
            AnyEncoder::Binary(e) => e.encode(value),
        }
    }

    fn get_mut(&mut self) -> &mut W {
        match self {
            AnyEncoder::Json(e) => e.get_mut(),
            AnyEncoder::Xml(e) => e.get_mut(),
            AnyEncoder::Binary(e) => e.get_mut(),
        }
    }
}

impl<R: Read> Decoder for AnyDecoder<R> {
    fn decode<T: DeserializeOwned + 'static>(&mut self) -> CodecResult<T> {
        match self {
            AnyDecoder::Json(d) => d.decode(),
            AnyDecoder::Xml(d) => d.decode(),
            AnyDecoder::Binary(d) => d.decode(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;
    use crate::testutil::{record, Record};
    use proptest::prelude::*;

    fn table() -> TypeTable {
        TypeTable::new().with::<Record>("record").unwrap()
    }

    fn all() -> Vec<AnyCodec> {
        [CodecKind::Json, CodecKind::Xml, CodecKind::Binary]
            .into_iter()
            .map(|kind| AnyCodec::from_kind(kind, table()))
            .collect()
    }

    #[test]
    fn test_from_kind() {
        for kind in [CodecKind::Json, CodecKind::Xml, CodecKind::Binary] {
            assert_eq!(AnyCodec::from_kind(kind, table()).kind(), kind);
        }
        assert_eq!(AnyCodec::default().kind(), CodecKind::Json);
    }

    #[test]
    fn test_every_codec_roundtrips() {
        for codec in all() {
            let bytes = codec.marshal(&record()).unwrap();
            assert_eq!(
                codec.unmarshal::<Record>(&bytes).unwrap(),
                record(),
                "{:?}",
                codec.kind()
            );
        }
    }

    #[test]
    fn test_codecs_do_not_cross_read() {
        let json = AnyCodec::from_kind(CodecKind::Json, table());
        let xml = AnyCodec::from_kind(CodecKind::Xml, table());
        let bytes = json.marshal(&record()).unwrap();
        assert!(xml.unmarshal::<Record>(&bytes).is_err());
    }

    proptest! {
        #[test]
        fn roundtrip_any_record(
            a in any::<i64>(),
            b in (-1_000_000i32..1_000_000).prop_map(|x| f64::from(x) / 4.0),
            c in "[ \t\r\n]{0,3}\\PC*[ \t\r\n]{0,3}",
            data in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let value = Record { a, b, c, data };
            for codec in all() {
                let encoded = codec.marshal(&value);
                if codec.kind() == CodecKind::Xml && value.data.is_empty() {
                    prop_assert!(matches!(encoded, Err(CodecError::Serialization(_))));
                    continue;
                }
                let bytes = encoded.unwrap();
                prop_assert_eq!(codec.unmarshal::<Record>(&bytes).unwrap(), value.clone());
            }
        }
    }
}
