use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::types::{CodecKind, StreamSuite};

/// Largest plaintext carried by a single envelope frame (64 KiB)
pub const MAX_CHUNK_SIZE: usize = 64 * 1024;

/// Top-level store configuration (loaded from sealkv.toml)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub codec: CodecConfig,
    pub envelope: EnvelopeConfig,
    pub pool: PoolConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Value serialization format: "json", "xml" or "binary"
    pub kind: CodecKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Streaming AEAD (default: aes-256-gcm)
    pub suite: StreamSuite,
    /// Plaintext bytes per frame (default: 65536)
    pub chunk_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Scratch buffers kept for reuse (default: 16)
    pub max_buffers: usize,
    /// Buffers that grew past this capacity are freed instead of pooled
    pub max_retained_bytes: usize,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            suite: StreamSuite::default(),
            chunk_size: MAX_CHUNK_SIZE,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_buffers: 16,
            max_retained_bytes: 1024 * 1024,
        }
    }
}

impl EnvelopeConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(ConfigError::Invalid(format!(
                "envelope.chunk_size must be between 1 and {MAX_CHUNK_SIZE}, got {}",
                self.chunk_size
            )));
        }
        Ok(())
    }
}

impl PoolConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_retained_bytes == 0 {
            return Err(ConfigError::Invalid(
                "pool.max_retained_bytes must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl StoreConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> ConfigResult<Self> {
        let config: StoreConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML config file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::Other(anyhow::anyhow!("reading config {}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            codec = ?config.codec.kind,
            suite = %config.envelope.suite,
            "loaded store config"
        );
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.envelope.validate()?;
        self.pool.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[codec]
kind = "binary"

[envelope]
suite = "chacha20-poly1305"
chunk_size = 4096

[pool]
max_buffers = 4
max_retained_bytes = 65536
"#;
        let config = StoreConfig::from_toml_str(toml_str).unwrap();

        assert_eq!(config.codec.kind, CodecKind::Binary);
        assert_eq!(config.envelope.suite, StreamSuite::ChaCha20Poly1305);
        assert_eq!(config.envelope.chunk_size, 4096);
        assert_eq!(config.pool.max_buffers, 4);
        assert_eq!(config.pool.max_retained_bytes, 65536);
    }

    #[test]
    fn test_parse_defaults() {
        let config = StoreConfig::from_toml_str("").unwrap();

        assert_eq!(config.codec.kind, CodecKind::Json);
        assert_eq!(config.envelope.suite, StreamSuite::Aes256Gcm);
        assert_eq!(config.envelope.chunk_size, MAX_CHUNK_SIZE);
        assert_eq!(config.pool.max_buffers, 16);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
[envelope]
chunk_size = 1024
"#;
        let config = StoreConfig::from_toml_str(toml_str).unwrap();

        // Overridden
        assert_eq!(config.envelope.chunk_size, 1024);
        // Defaults
        assert_eq!(config.envelope.suite, StreamSuite::Aes256Gcm);
        assert_eq!(config.codec.kind, CodecKind::Json);
    }

    #[test]
    fn test_reject_oversized_chunk() {
        let toml_str = r#"
[envelope]
chunk_size = 1000000
"#;
        let err = StoreConfig::from_toml_str(toml_str).unwrap_err();
        assert!(err.to_string().contains("chunk_size"));
    }

    #[test]
    fn test_reject_zero_chunk() {
        let err = StoreConfig::from_toml_str("[envelope]\nchunk_size = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_reject_unknown_codec() {
        let err = StoreConfig::from_toml_str("[codec]\nkind = \"yaml\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sealkv.toml");
        std::fs::write(&path, "[codec]\nkind = \"xml\"\n").unwrap();

        let config = StoreConfig::load(&path).unwrap();
        assert_eq!(config.codec.kind, CodecKind::Xml);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = StoreConfig::load(&dir.path().join("absent.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = StoreConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed = StoreConfig::from_toml_str(&toml_str).unwrap();

        assert_eq!(config, parsed);
    }
}
