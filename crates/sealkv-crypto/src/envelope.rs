//! Stored value envelope: `derivation nonce (32 bytes) || encrypted stream`
//!
//! The nonce is the HKDF salt for this value's data key, and the stream is
//! the chunked AEAD from [`crate::stream`] keyed with it.

use std::io::{Read, Write};

use sealkv_core::config::EnvelopeConfig;
use zeroize::{Zeroize, Zeroizing};

use crate::error::{CryptoError, CryptoResult};
use crate::kdf::{derive_key, generate_nonce, DerivationNonce, MasterSecret};
use crate::stream::{DecryptReader, EncryptWriter};
use crate::DERIVATION_NONCE_SIZE;

/// Streaming envelope writer over an arbitrary sink.
///
/// The derivation nonce is written to the sink immediately; plaintext written
/// afterwards is encrypted frame by frame. Call [`EnvelopeWriter::finish`]
/// to seal the final frame.
pub struct EnvelopeWriter<W: Write> {
    stream: EncryptWriter<W>,
}

impl<W: Write> EnvelopeWriter<W> {
    pub fn new(master: &MasterSecret, config: &EnvelopeConfig, mut sink: W) -> CryptoResult<Self> {
        let nonce = generate_nonce()?;
        let key = derive_key(master, &nonce)?;
        sink.write_all(&nonce)?;
        let stream = EncryptWriter::new(sink, &key, config)?;
        Ok(Self { stream })
    }

    /// Seal the final frame and hand back the sink.
    pub fn finish(self) -> CryptoResult<W> {
        self.stream.finish().map_err(CryptoError::from_io)
    }
}

impl<W: Write> Write for EnvelopeWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.stream.flush()
    }
}

/// Seal `plaintext` into a fresh envelope.
pub fn seal(master: &MasterSecret, config: &EnvelopeConfig, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let mut writer = EnvelopeWriter::new(master, config, Vec::with_capacity(plaintext.len() + 64))?;
    writer.write_all(plaintext).map_err(CryptoError::from_io)?;
    writer.finish()
}

/// Decrypt an envelope into a new zeroizing buffer.
pub fn open(master: &MasterSecret, envelope: &[u8]) -> CryptoResult<Zeroizing<Vec<u8>>> {
    let mut out = Zeroizing::new(Vec::new());
    open_into(master, envelope, &mut out)?;
    Ok(out)
}

/// Decrypt an envelope, appending the plaintext to `out`.
///
/// On failure `out` is wiped and cleared so no partially authenticated
/// plaintext escapes.
pub fn open_into(master: &MasterSecret, envelope: &[u8], out: &mut Vec<u8>) -> CryptoResult<()> {
    let nonce = envelope_nonce(envelope)?;
    let key = derive_key(master, nonce)?;

    // The stream is never shorter than its plaintext, so `read_to_end` fills
    // this reservation without moving plaintext into a second allocation.
    out.reserve(envelope.len() - DERIVATION_NONCE_SIZE);

    let result = DecryptReader::new(&envelope[DERIVATION_NONCE_SIZE..], &key)
        .and_then(|mut reader| reader.read_to_end(out).map_err(CryptoError::from_io));
    if let Err(e) = result {
        out.zeroize();
        tracing::debug!(error = %e, len = envelope.len(), "envelope open failed");
        return Err(e);
    }
    Ok(())
}

/// The derivation nonce at the front of an envelope.
pub fn envelope_nonce(envelope: &[u8]) -> CryptoResult<&DerivationNonce> {
    envelope
        .get(..DERIVATION_NONCE_SIZE)
        .and_then(|n| n.try_into().ok())
        .ok_or(CryptoError::Truncated { len: envelope.len() })
}
