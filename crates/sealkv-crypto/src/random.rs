//! OS-backed secure randomness
//!
//! Every nonce and generated key in the crate comes from here. A generator
//! failure is reported to the caller and never retried.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{CryptoError, CryptoResult};

/// Fill `buf` entirely from the operating system CSPRNG.
pub fn fill(buf: &mut [u8]) -> CryptoResult<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| CryptoError::RandomSource(e.to_string()))
}

/// Return `N` fresh random bytes.
pub fn bytes<const N: usize>() -> CryptoResult<[u8; N]> {
    let mut out = [0u8; N];
    fill(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_bytes_differ() {
        let a = bytes::<32>().unwrap();
        let b = bytes::<32>().unwrap();
        assert_ne!(a, b, "two 256-bit draws must differ");
    }

    #[test]
    fn test_fill_empty() {
        let mut buf = [];
        fill(&mut buf).unwrap();
    }
}
