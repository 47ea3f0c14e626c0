//! Priming decorator
//!
//! Codecs that describe types inline (the binary codec) pay for a descriptor
//! in every stored value. A [`PrimedCodec`] runs a fixed set of sample values
//! through every new encoder before it is handed out, with the output going
//! nowhere, and feeds every new decoder the same encoded samples first. Types
//! introduced by the samples are then already known on both sides.
//!
//! Primed and unprimed codecs cannot read each other's output, and the
//! samples (and their order) must not change between writing and reading.

use std::io::{self, Chain, Cursor, Read, Write};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecResult;
use crate::{Codec, Decoder, Encoder};

/// A fixed, ordered set of sample values. Implemented for tuples of up to
/// eight serializable types.
pub trait Samples: Send + Sync {
    fn encode_all<Enc: Encoder>(&self, enc: &mut Enc) -> CodecResult<()>;

    /// Decode (and drop) one value of every sample type, in order.
    fn skip_all<Dec: Decoder>(dec: &mut Dec) -> CodecResult<()>;
}

impl Samples for () {
    fn encode_all<Enc: Encoder>(&self, _enc: &mut Enc) -> CodecResult<()> {
        Ok(())
    }

    fn skip_all<Dec: Decoder>(_dec: &mut Dec) -> CodecResult<()> {
        Ok(())
    }
}

macro_rules! impl_samples {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name),+> Samples for ($($name,)+)
        where
            $($name: Serialize + DeserializeOwned + Send + Sync + 'static),+
        {
            fn encode_all<Enc: Encoder>(&self, enc: &mut Enc) -> CodecResult<()> {
                $(enc.encode(&self.$idx)?;)+
                Ok(())
            }

            fn skip_all<Dec: Decoder>(dec: &mut Dec) -> CodecResult<()> {
                $(dec.decode::<$name>()?;)+
                Ok(())
            }
        }
    };
}

impl_samples!(A: 0);
impl_samples!(A: 0, B: 1);
impl_samples!(A: 0, B: 1, C: 2);
impl_samples!(A: 0, B: 1, C: 2, D: 3);
impl_samples!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_samples!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
impl_samples!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
impl_samples!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);

pub struct PrimedCodec<C, S> {
    codec: C,
    samples: S,
    header: Arc<[u8]>,
}

impl<C: Codec, S: Samples> PrimedCodec<C, S> {
    /// Encode the samples once and check they decode again.
    pub fn new(codec: C, samples: S) -> CodecResult<Self> {
        let mut buf = Vec::new();
        samples.encode_all(&mut codec.new_encoder(&mut buf)?)?;
        S::skip_all(&mut codec.new_decoder(buf.as_slice())?)?;

        tracing::debug!(header_bytes = buf.len(), "primed codec ready");
        Ok(Self {
            codec,
            samples,
            header: buf.into(),
        })
    }

    pub fn inner(&self) -> &C {
        &self.codec
    }

    /// Encoded samples replayed into every decoder
    pub fn header(&self) -> &[u8] {
        &self.header
    }
}

/// Sink wrapper that swallows writes until switched on.
pub struct SwitchWriter<W> {
    inner: W,
    discard: bool,
}

impl<W: Write> SwitchWriter<W> {
    fn discarding(inner: W) -> Self {
        Self {
            inner,
            discard: true,
        }
    }

    fn switch_on(&mut self) {
        self.discard = false;
    }
}

impl<W: Write> Write for SwitchWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.discard {
            Ok(buf.len())
        } else {
            self.inner.write(buf)
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.discard {
            Ok(())
        } else {
            self.inner.flush()
        }
    }
}

pub struct PrimedEncoder<E> {
    inner: E,
}

impl<W, E> Encoder for PrimedEncoder<E>
where
    W: Write,
    E: Encoder<Sink = SwitchWriter<W>>,
{
    type Sink = W;

    fn encode<T: Serialize + 'static>(&mut self, value: &T) -> CodecResult<()> {
        self.inner.encode(value)
    }

    fn get_mut(&mut self) -> &mut W {
        &mut self.inner.get_mut().inner
    }
}

impl<C: Codec, S: Samples> Codec for PrimedCodec<C, S> {
    type Encoder<W: Write> = PrimedEncoder<C::Encoder<SwitchWriter<W>>>;
    type Decoder<R: Read> = C::Decoder<Chain<Cursor<Arc<[u8]>>, R>>;

    fn new_encoder<W: Write>(&self, sink: W) -> CodecResult<Self::Encoder<W>> {
        let mut enc = self.codec.new_encoder(SwitchWriter::discarding(sink))?;
        self.samples.encode_all(&mut enc)?;
        enc.get_mut().switch_on();
        Ok(PrimedEncoder { inner: enc })
    }

    fn new_decoder<R: Read>(&self, source: R) -> CodecResult<Self::Decoder<R>> {
        let replay = Cursor::new(Arc::clone(&self.header)).chain(source);
        let mut dec = self.codec.new_decoder(replay)?;
        S::skip_all(&mut dec)?;
        Ok(dec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::{BinaryCodec, TypeTable};
    use crate::json::JsonCodec;
    use crate::testutil::{other, record, Other, Record};
    use crate::xml::XmlCodec;

    fn binary() -> BinaryCodec {
        BinaryCodec::new(
            TypeTable::new()
                .with::<Record>("record")
                .unwrap()
                .with::<Other>("other")
                .unwrap(),
        )
    }

    fn samples() -> (Record, Other) {
        (record(), other())
    }

    #[test]
    fn test_primed_binary_roundtrip() {
        let primed = PrimedCodec::new(binary(), samples()).unwrap();
        let bytes = primed.marshal(&record()).unwrap();
        assert_eq!(primed.unmarshal::<Record>(&bytes).unwrap(), record());
    }

    #[test]
    fn test_primed_binary_omits_descriptors() {
        let plain = binary();
        let primed = PrimedCodec::new(binary(), samples()).unwrap();

        let plain_bytes = plain.marshal(&other()).unwrap();
        let primed_bytes = primed.marshal(&other()).unwrap();
        assert!(primed_bytes.len() < plain_bytes.len());
    }

    #[test]
    fn test_encoder_output_excludes_samples() {
        let primed = PrimedCodec::new(JsonCodec, samples()).unwrap();
        let bytes = primed.marshal(&42u32).unwrap();
        assert_eq!(bytes, b"42\n");
        assert_eq!(primed.unmarshal::<u32>(&bytes).unwrap(), 42);
    }

    #[test]
    fn test_primed_xml_roundtrip() {
        let primed = PrimedCodec::new(XmlCodec, (other(),)).unwrap();
        let bytes = primed.marshal(&record()).unwrap();
        assert_eq!(primed.unmarshal::<Record>(&bytes).unwrap(), record());
    }

    #[test]
    fn test_primed_and_unprimed_are_incompatible() {
        let plain = binary();
        let primed = PrimedCodec::new(binary(), samples()).unwrap();

        let primed_bytes = primed.marshal(&other()).unwrap();
        assert!(plain.unmarshal::<Other>(&primed_bytes).is_err());
    }

    #[test]
    fn test_header_matches_sample_encoding() {
        let primed = PrimedCodec::new(JsonCodec, (other(),)).unwrap();
        assert_eq!(primed.header(), JsonCodec.marshal(&other()).unwrap().as_slice());
    }

    #[test]
    fn test_eight_samples() {
        let samples = (1u8, 2u16, 3u32, 4u64, "e".to_string(), -6i8, true, 'h');
        let primed = PrimedCodec::new(JsonCodec, samples).unwrap();
        assert_eq!(primed.header(), b"1\n2\n3\n4\n\"e\"\n-6\ntrue\n\"h\"\n");

        let bytes = primed.marshal(&other()).unwrap();
        assert_eq!(primed.unmarshal::<Other>(&bytes).unwrap(), other());
    }

    #[test]
    fn test_unregistered_sample_fails_construction() {
        let result = PrimedCodec::new(binary(), (5u32,));
        assert!(result.is_err());
    }

    #[test]
    fn test_get_mut_reaches_real_sink() {
        let primed = PrimedCodec::new(JsonCodec, samples()).unwrap();
        let mut enc = primed.new_encoder(Vec::new()).unwrap();
        enc.encode(&1u8).unwrap();
        assert_eq!(enc.get_mut().as_slice(), b"1\n");
    }
}
