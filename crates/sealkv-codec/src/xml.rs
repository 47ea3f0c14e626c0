//! XML values via quick-xml
//!
//! Each value is one document rooted at `<value>`. Documents are separated
//! by a NUL byte, which cannot occur in well-formed XML.
//!
//! The reader trims raw whitespace at the edges of text, so leading and
//! trailing whitespace is written as character references. Values whose
//! shape the element mapping cannot carry (empty sequences, `Some` of empty
//! content) are refused at encode time.

use std::io::{BufRead, BufReader, Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;
use zeroize::Zeroizing;

use crate::error::{CodecError, CodecResult};
use crate::{Codec, Decoder, Encoder};

mod shape;

pub const ROOT_TAG: &str = "value";

const SEPARATOR: u8 = 0;

/// Longest character reference written for an edge whitespace byte.
const MAX_CHAR_REF: usize = "&#x20;".len();

#[derive(Debug, Clone, Copy, Default)]
pub struct XmlCodec;

pub struct XmlEncoder<W> {
    sink: W,
}

pub struct XmlDecoder<R> {
    source: BufReader<R>,
    doc: Zeroizing<Vec<u8>>,
}

impl Codec for XmlCodec {
    type Encoder<W: Write> = XmlEncoder<W>;
    type Decoder<R: Read> = XmlDecoder<R>;

    fn new_encoder<W: Write>(&self, sink: W) -> CodecResult<XmlEncoder<W>> {
        Ok(XmlEncoder { sink })
    }

    fn new_decoder<R: Read>(&self, source: R) -> CodecResult<XmlDecoder<R>> {
        Ok(XmlDecoder {
            source: BufReader::new(source),
            doc: Zeroizing::new(Vec::new()),
        })
    }
}

impl<W: Write> Encoder for XmlEncoder<W> {
    type Sink = W;

    fn encode<T: Serialize + 'static>(&mut self, value: &T) -> CodecResult<()> {
        shape::check(value).map_err(CodecError::ser)?;
        let doc = Zeroizing::new(
            quick_xml::se::to_string_with_root(ROOT_TAG, value).map_err(CodecError::ser)?,
        );
        if doc.as_bytes().contains(&SEPARATOR) {
            return Err(CodecError::Serialization(
                "NUL characters cannot be represented in XML".into(),
            ));
        }
        let doc = escape_edge_whitespace(&doc);
        self.sink.write_all(doc.as_bytes())?;
        self.sink.write_all(&[SEPARATOR])?;
        Ok(())
    }

    fn get_mut(&mut self) -> &mut W {
        &mut self.sink
    }
}

impl<R: Read> Decoder for XmlDecoder<R> {
    fn decode<T: DeserializeOwned + 'static>(&mut self) -> CodecResult<T> {
        self.doc.clear();
        let n = self.source.read_until(SEPARATOR, &mut self.doc)?;
        if n == 0 {
            return Err(CodecError::de("unexpected end of stream"));
        }
        if self.doc.last() == Some(&SEPARATOR) {
            self.doc.pop();
        }
        let text = std::str::from_utf8(&self.doc).map_err(CodecError::de)?;
        quick_xml::de::from_str(text).map_err(CodecError::de)
    }
}

fn is_xml_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

fn char_ref(c: char) -> &'static str {
    match c {
        ' ' => "&#x20;",
        '\t' => "&#x9;",
        '\n' => "&#xA;",
        _ => "&#xD;",
    }
}

/// `(leading whitespace, body, trailing whitespace)` of one text run.
fn split_edges(text: &str) -> (&str, &str, &str) {
    let body = text.trim_start_matches(is_xml_space);
    let lead = &text[..text.len() - body.len()];
    let trimmed = body.trim_end_matches(is_xml_space);
    (lead, trimmed, &body[trimmed.len()..])
}

/// Splits serializer output into `(markup, text)` pairs: markup up to and
/// including `>`, then the text before the next `<`. The serializer escapes
/// `<` and `>` everywhere else.
struct Runs<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Runs<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        let markup_end = self.rest.find('>').map_or(self.rest.len(), |i| i + 1);
        let (markup, tail) = self.rest.split_at(markup_end);
        let text_end = tail.find('<').unwrap_or(tail.len());
        let (text, rest) = tail.split_at(text_end);
        self.rest = rest;
        Some((markup, text))
    }
}

fn escape_edge_whitespace(doc: &str) -> Zeroizing<String> {
    let edges: usize = Runs { rest: doc }
        .map(|(_, text)| {
            let (lead, _, trail) = split_edges(text);
            lead.len() + trail.len()
        })
        .sum();

    // Sized up front so no partial copy of the document is reallocated away
    // without being wiped.
    let mut out = Zeroizing::new(String::with_capacity(doc.len() + edges * (MAX_CHAR_REF - 1)));
    for (markup, text) in (Runs { rest: doc }) {
        out.push_str(markup);
        let (lead, body, trail) = split_edges(text);
        lead.chars().for_each(|c| out.push_str(char_ref(c)));
        out.push_str(body);
        trail.chars().for_each(|c| out.push_str(char_ref(c)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{other, record, Other, Record};

    #[test]
    fn test_roundtrip_struct() {
        let bytes = XmlCodec.marshal(&record()).unwrap();
        assert_eq!(XmlCodec.unmarshal::<Record>(&bytes).unwrap(), record());
    }

    #[test]
    fn test_document_is_rooted_and_separated() {
        let bytes = XmlCodec.marshal(&other()).unwrap();
        assert_eq!(bytes.last(), Some(&0));
        let text = std::str::from_utf8(&bytes[..bytes.len() - 1]).unwrap();
        assert!(text.starts_with("<value>"), "{text}");
        assert!(text.ends_with("</value>"), "{text}");
        assert!(text.contains("<name>other</name>"), "{text}");
    }

    #[test]
    fn test_stream_of_documents() {
        let mut buf = Vec::new();
        let mut enc = XmlCodec.new_encoder(&mut buf).unwrap();
        enc.encode(&other()).unwrap();
        enc.encode(&record()).unwrap();

        let mut dec = XmlCodec.new_decoder(buf.as_slice()).unwrap();
        assert_eq!(dec.decode::<Other>().unwrap(), other());
        assert_eq!(dec.decode::<Record>().unwrap(), record());
        assert!(matches!(
            dec.decode::<Other>(),
            Err(CodecError::Deserialization(_))
        ));
    }

    #[test]
    fn test_markup_in_strings_is_escaped() {
        let value = Other {
            name: "<a>&\"b\"</a>".into(),
            count: 1,
        };
        let bytes = XmlCodec.marshal(&value).unwrap();
        assert_eq!(XmlCodec.unmarshal::<Other>(&bytes).unwrap(), value);
    }

    #[test]
    fn test_nul_rejected() {
        let value = Other {
            name: "a\0b".into(),
            count: 1,
        };
        let err = XmlCodec.marshal(&value).unwrap_err();
        assert!(matches!(err, CodecError::Serialization(_)));
    }

    #[test]
    fn test_malformed_document_fails() {
        let err = XmlCodec.unmarshal::<Other>(b"<value><name>x</value>\0").unwrap_err();
        assert!(matches!(err, CodecError::Deserialization(_)));
    }

    #[test]
    fn test_edge_whitespace_survives() {
        for c in ["  padded ", " ", "\tlead", "trail\n", "\r\n", "in ner", ""] {
            let value = Record {
                c: c.to_string(),
                ..record()
            };
            let bytes = XmlCodec.marshal(&value).unwrap();
            assert_eq!(XmlCodec.unmarshal::<Record>(&bytes).unwrap(), value, "{c:?}");
        }
    }

    #[test]
    fn test_edge_whitespace_written_as_references() {
        let value = Other {
            name: " a b\t".into(),
            count: 1,
        };
        let bytes = XmlCodec.marshal(&value).unwrap();
        let text = std::str::from_utf8(&bytes[..bytes.len() - 1]).unwrap();
        assert!(text.contains("<name>&#x20;a b&#x9;</name>"), "{text}");
    }

    #[test]
    fn test_top_level_string_keeps_whitespace() {
        let bytes = XmlCodec.marshal(&"  both  ".to_string()).unwrap();
        assert_eq!(XmlCodec.unmarshal::<String>(&bytes).unwrap(), "  both  ");
    }

    #[test]
    fn test_empty_sequence_rejected() {
        let value = Record {
            data: Vec::new(),
            ..record()
        };
        let err = XmlCodec.marshal(&value).unwrap_err();
        assert!(matches!(err, CodecError::Serialization(_)), "{err}");
    }

    #[test]
    fn test_some_of_empty_string_rejected() {
        let err = XmlCodec.marshal(&Some(String::new())).unwrap_err();
        assert!(matches!(err, CodecError::Serialization(_)), "{err}");

        let bytes = XmlCodec.marshal(&Some("x".to_string())).unwrap();
        assert_eq!(
            XmlCodec.unmarshal::<Option<String>>(&bytes).unwrap(),
            Some("x".to_string())
        );
    }

    #[test]
    fn test_split_edges() {
        assert_eq!(split_edges(" \ta b\n"), (" \t", "a b", "\n"));
        assert_eq!(split_edges("   "), ("   ", "", ""));
        assert_eq!(split_edges("x"), ("", "x", ""));
    }
}
