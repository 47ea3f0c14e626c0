//! sealkv-codec: structured value serialization for sealkv
//!
//! # Overview
//! - `json`: newline-delimited serde_json values
//! - `xml`: quick-xml documents rooted at `<value>`, NUL separated
//! - `binary`: CBOR values tagged with ids announced from an explicit [`TypeTable`]
//! - `primed`: decorator that pre-encodes sample values so per-stream type
//!   descriptors are not repeated in every stored value
//! - `any`: runtime selection between the three base codecs
//!
//! A [`Codec`] is a factory; every stored value gets its own encoder or
//! decoder bound to one sink or source.

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

pub mod any;
pub mod binary;
pub mod error;
pub mod json;
pub mod primed;
pub mod xml;

pub use any::AnyCodec;
pub use binary::{BinaryCodec, TypeTable};
pub use error::{CodecError, CodecResult};
pub use json::JsonCodec;
pub use primed::{PrimedCodec, Samples};
pub use xml::XmlCodec;

/// Writes values to one sink.
pub trait Encoder {
    type Sink: Write;

    fn encode<T: Serialize + 'static>(&mut self, value: &T) -> CodecResult<()>;

    /// The sink this encoder writes to.
    fn get_mut(&mut self) -> &mut Self::Sink;
}

/// Reads values from one source, in the order they were encoded.
pub trait Decoder {
    fn decode<T: DeserializeOwned + 'static>(&mut self) -> CodecResult<T>;
}

/// Factory for encoders and decoders of one serialization format.
pub trait Codec: Send + Sync {
    type Encoder<W: Write>: Encoder<Sink = W>;
    type Decoder<R: Read>: Decoder;

    fn new_encoder<W: Write>(&self, sink: W) -> CodecResult<Self::Encoder<W>>;

    fn new_decoder<R: Read>(&self, source: R) -> CodecResult<Self::Decoder<R>>;

    /// Encode a single value into a fresh buffer.
    fn marshal<T: Serialize + 'static>(&self, value: &T) -> CodecResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.new_encoder(&mut buf)?.encode(value)?;
        Ok(buf)
    }

    /// Decode a single value from a buffer.
    fn unmarshal<T: DeserializeOwned + 'static>(&self, data: &[u8]) -> CodecResult<T> {
        self.new_decoder(data)?.decode()
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct Record {
        pub a: i64,
        pub b: f64,
        pub c: String,
        pub data: Vec<u8>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Other {
        pub name: String,
        pub count: u32,
    }

    pub fn record() -> Record {
        Record {
            a: -7,
            b: 2.5,
            c: "x".into(),
            data: vec![0, 1, 254, 255],
        }
    }

    pub fn other() -> Other {
        Other {
            name: "other".into(),
            count: 3,
        }
    }
}
