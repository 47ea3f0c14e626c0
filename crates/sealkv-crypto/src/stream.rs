//! Chunked streaming AEAD
//!
//! Stream format (binary):
//! ```text
//! [1 byte: version = 0x01][1 byte: suite id]
//! repeated:
//!   [1 byte: flags][4 bytes: plaintext length, BE][ciphertext][16 bytes: tag]
//! ```
//!
//! Frame `i` is sealed with nonce `i (8 bytes BE) || 0x000000 || flags` and
//! AAD `stream header || flags || length`, so frames cannot be reordered,
//! resized or moved between suites. The last frame carries `FLAG_FINAL`;
//! a stream that ends without it is truncated. The key must be unique per
//! stream, which the per-value derived key guarantees.

use std::io::{self, Read, Write};

use aead::generic_array::GenericArray;
use aead::{AeadInPlace, KeyInit};
use aes_gcm::Aes256Gcm;
use chacha20poly1305::ChaCha20Poly1305;
use sealkv_core::config::{EnvelopeConfig, MAX_CHUNK_SIZE};
use sealkv_core::StreamSuite;
use zeroize::Zeroizing;

use crate::error::{CryptoError, CryptoResult};
use crate::kdf::DerivedKey;
use crate::TAG_SIZE;

pub const STREAM_VERSION: u8 = 0x01;

/// `version || suite`
pub const STREAM_HEADER_SIZE: usize = 2;

/// `flags || length`
pub const FRAME_HEADER_SIZE: usize = 5;

const FLAG_FINAL: u8 = 0x01;

/// Frame counter limit; a stream is refused past 2^32 frames.
const MAX_FRAMES: u64 = 1 << 32;

enum StreamCipher {
    Aes(Box<Aes256Gcm>),
    ChaCha(ChaCha20Poly1305),
}

impl StreamCipher {
    fn new(suite: StreamSuite, key: &DerivedKey) -> Self {
        let key = GenericArray::from_slice(key.as_bytes());
        match suite {
            StreamSuite::Aes256Gcm => StreamCipher::Aes(Box::new(Aes256Gcm::new(key))),
            StreamSuite::ChaCha20Poly1305 => StreamCipher::ChaCha(ChaCha20Poly1305::new(key)),
        }
    }

    fn seal(&self, nonce: &[u8; 12], aad: &[u8], buf: &mut Vec<u8>) -> Result<(), aead::Error> {
        let nonce = GenericArray::from_slice(nonce);
        match self {
            StreamCipher::Aes(c) => c.encrypt_in_place(nonce, aad, buf),
            StreamCipher::ChaCha(c) => c.encrypt_in_place(nonce, aad, buf),
        }
    }

    fn open(&self, nonce: &[u8; 12], aad: &[u8], buf: &mut Vec<u8>) -> Result<(), aead::Error> {
        let nonce = GenericArray::from_slice(nonce);
        match self {
            StreamCipher::Aes(c) => c.decrypt_in_place(nonce, aad, buf),
            StreamCipher::ChaCha(c) => c.decrypt_in_place(nonce, aad, buf),
        }
    }
}

fn frame_nonce(seq: u64, flags: u8) -> [u8; 12] {
    let mut nonce = [0u8; 12];
    nonce[..8].copy_from_slice(&seq.to_be_bytes());
    nonce[11] = flags;
    nonce
}

fn frame_header(flags: u8, len: u32) -> [u8; FRAME_HEADER_SIZE] {
    let mut header = [0u8; FRAME_HEADER_SIZE];
    header[0] = flags;
    header[1..].copy_from_slice(&len.to_be_bytes());
    header
}

fn frame_aad(
    stream_header: &[u8; STREAM_HEADER_SIZE],
    frame_header: &[u8; FRAME_HEADER_SIZE],
) -> [u8; STREAM_HEADER_SIZE + FRAME_HEADER_SIZE] {
    let mut aad = [0u8; STREAM_HEADER_SIZE + FRAME_HEADER_SIZE];
    aad[..STREAM_HEADER_SIZE].copy_from_slice(stream_header);
    aad[STREAM_HEADER_SIZE..].copy_from_slice(frame_header);
    aad
}

/// Encrypting `Write` adapter.
///
/// Plaintext is buffered up to `chunk_size` bytes per frame. Nothing is
/// authenticated as complete until [`EncryptWriter::finish`] writes the
/// final frame; dropping the writer without finishing leaves a truncated
/// stream that will not open.
pub struct EncryptWriter<W: Write> {
    inner: W,
    cipher: StreamCipher,
    header: [u8; STREAM_HEADER_SIZE],
    header_written: bool,
    chunk_size: usize,
    buf: Zeroizing<Vec<u8>>,
    seq: u64,
}

impl<W: Write> EncryptWriter<W> {
    pub fn new(inner: W, key: &DerivedKey, config: &EnvelopeConfig) -> CryptoResult<Self> {
        config.validate()?;
        Ok(Self {
            inner,
            cipher: StreamCipher::new(config.suite, key),
            header: [STREAM_VERSION, config.suite.id()],
            header_written: false,
            chunk_size: config.chunk_size,
            buf: Zeroizing::new(Vec::with_capacity(config.chunk_size + TAG_SIZE)),
            seq: 0,
        })
    }

    fn seal_frame(&mut self, last: bool) -> io::Result<()> {
        if self.seq >= MAX_FRAMES {
            return Err(CryptoError::EnvelopeSeal("stream exceeds frame limit".into()).into_io());
        }
        if !self.header_written {
            self.inner.write_all(&self.header)?;
            self.header_written = true;
        }

        let flags = if last { FLAG_FINAL } else { 0 };
        // chunk_size is capped at MAX_CHUNK_SIZE, so the length fits in u32
        let header = frame_header(flags, self.buf.len() as u32);
        let aad = frame_aad(&self.header, &header);
        self.cipher
            .seal(&frame_nonce(self.seq, flags), &aad, &mut self.buf)
            .map_err(|_| CryptoError::EnvelopeSeal("frame encryption failed".into()).into_io())?;

        self.inner.write_all(&header)?;
        self.inner.write_all(&self.buf)?;
        self.buf.clear();
        self.seq += 1;
        Ok(())
    }

    /// Seal the final frame and return the sink.
    pub fn finish(mut self) -> io::Result<W> {
        self.seal_frame(true)?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for EncryptWriter<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut written = 0;
        while written < data.len() {
            // a full chunk is sealed only once more data arrives, so the
            // last chunk of the stream can always be marked final
            if self.buf.len() == self.chunk_size {
                self.seal_frame(false)?;
            }
            let take = (self.chunk_size - self.buf.len()).min(data.len() - written);
            self.buf.extend_from_slice(&data[written..written + take]);
            written += take;
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Decrypting `Read` adapter.
///
/// Returns plaintext frame by frame, each only after its tag verified. EOF
/// is reported only after the final frame authenticated and the source is
/// exhausted; anything else is an `InvalidData` error carrying a
/// [`CryptoError::EnvelopeDecrypt`].
pub struct DecryptReader<R: Read> {
    inner: R,
    cipher: StreamCipher,
    header: [u8; STREAM_HEADER_SIZE],
    buf: Zeroizing<Vec<u8>>,
    pos: usize,
    seq: u64,
    done: bool,
}

impl<R: Read> DecryptReader<R> {
    /// Read and check the stream header.
    pub fn new(mut inner: R, key: &DerivedKey) -> CryptoResult<Self> {
        let mut header = [0u8; STREAM_HEADER_SIZE];
        read_exact_or(&mut inner, &mut header, "missing stream header").map_err(CryptoError::from_io)?;

        if header[0] != STREAM_VERSION {
            return Err(CryptoError::EnvelopeDecrypt(format!(
                "unsupported stream version {:#04x}",
                header[0]
            )));
        }
        let suite = StreamSuite::from_id(header[1]).ok_or_else(|| {
            CryptoError::EnvelopeDecrypt(format!("unknown stream suite {:#04x}", header[1]))
        })?;

        Ok(Self {
            inner,
            cipher: StreamCipher::new(suite, key),
            header,
            buf: Zeroizing::new(Vec::new()),
            pos: 0,
            seq: 0,
            done: false,
        })
    }

    fn open_frame(&mut self) -> io::Result<()> {
        if self.seq >= MAX_FRAMES {
            return Err(decrypt_error("stream exceeds frame limit"));
        }

        let mut header = [0u8; FRAME_HEADER_SIZE];
        read_exact_or(&mut self.inner, &mut header, "stream truncated: missing final frame")?;

        let flags = header[0];
        if flags & !FLAG_FINAL != 0 {
            return Err(decrypt_error("invalid frame flags"));
        }
        let last = flags & FLAG_FINAL != 0;
        let len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;
        if len > MAX_CHUNK_SIZE {
            return Err(decrypt_error("frame length exceeds maximum chunk size"));
        }
        if len == 0 && !last {
            return Err(decrypt_error("empty intermediate frame"));
        }

        self.buf.clear();
        self.buf.resize(len + TAG_SIZE, 0);
        read_exact_or(&mut self.inner, &mut self.buf, "stream truncated inside frame")?;

        let aad = frame_aad(&self.header, &header);
        if self
            .cipher
            .open(&frame_nonce(self.seq, flags), &aad, &mut self.buf)
            .is_err()
        {
            self.buf.clear();
            return Err(decrypt_error("frame authentication failed"));
        }
        self.pos = 0;
        self.seq += 1;

        if last {
            self.done = true;
            if has_more(&mut self.inner)? {
                self.buf.clear();
                return Err(decrypt_error("trailing data after final frame"));
            }
        }
        Ok(())
    }
}

impl<R: Read> Read for DecryptReader<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.pos < self.buf.len() {
                let n = (self.buf.len() - self.pos).min(out.len());
                out[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
                self.pos += n;
                return Ok(n);
            }
            if self.done || out.is_empty() {
                return Ok(0);
            }
            self.open_frame()?;
        }
    }
}

fn decrypt_error(msg: &str) -> io::Error {
    CryptoError::EnvelopeDecrypt(msg.to_string()).into_io()
}

fn read_exact_or<R: Read>(inner: &mut R, buf: &mut [u8], eof_msg: &str) -> io::Result<()> {
    inner.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            decrypt_error(eof_msg)
        } else {
            e
        }
    })
}

fn has_more<R: Read>(inner: &mut R) -> io::Result<bool> {
    let mut byte = [0u8; 1];
    loop {
        match inner.read(&mut byte) {
            Ok(n) => return Ok(n > 0),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}
