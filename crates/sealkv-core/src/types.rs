use serde::{Deserialize, Serialize};

/// Serialization format used for stored values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodecKind {
    /// Newline-delimited JSON
    #[default]
    Json,
    /// NUL-delimited XML documents rooted at `<value>`
    Xml,
    /// CBOR with inline type descriptors
    Binary,
}

/// AEAD used by the streaming envelope.
///
/// The one-byte identifier is written into every stream header, so the
/// numbering is part of the stored format and must never change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StreamSuite {
    #[default]
    #[serde(rename = "aes-256-gcm")]
    Aes256Gcm,
    #[serde(rename = "chacha20-poly1305")]
    ChaCha20Poly1305,
}

impl StreamSuite {
    pub fn id(self) -> u8 {
        match self {
            StreamSuite::Aes256Gcm => 0x00,
            StreamSuite::ChaCha20Poly1305 => 0x01,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0x00 => Some(StreamSuite::Aes256Gcm),
            0x01 => Some(StreamSuite::ChaCha20Poly1305),
            _ => None,
        }
    }
}

impl std::fmt::Display for StreamSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamSuite::Aes256Gcm => f.write_str("aes-256-gcm"),
            StreamSuite::ChaCha20Poly1305 => f.write_str("chacha20-poly1305"),
        }
    }
}

/// A decoded entry returned by a prefix listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPair<T> {
    pub key: String,
    pub value: T,
}

impl<T> ListPair<T> {
    pub fn new(key: impl Into<String>, value: T) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_suite_ids_roundtrip() {
        for suite in [StreamSuite::Aes256Gcm, StreamSuite::ChaCha20Poly1305] {
            assert_eq!(StreamSuite::from_id(suite.id()), Some(suite));
        }
        assert_eq!(StreamSuite::from_id(0x7f), None);
    }

    #[test]
    fn stream_suite_display_matches_config_name() {
        assert_eq!(StreamSuite::Aes256Gcm.to_string(), "aes-256-gcm");
        assert_eq!(StreamSuite::ChaCha20Poly1305.to_string(), "chacha20-poly1305");
    }
}
