//! RSA private-key material in the layout the device expects.

use crate::constants::{MAX_MODULUS_UNITS, MODULUS_UNIT_BYTES};
use crate::error::OKError;
use crate::message::KeyFeatures;

/// The two primes of an RSA key, big-endian, plus the modulus size.
#[derive(Clone, PartialEq, Eq)]
pub struct RsaKeyMaterial {
    pub p: Vec<u8>,
    pub q: Vec<u8>,
    /// Modulus length in bytes (256 for a 2048-bit key).
    pub modulus_len: usize,
}

// Keep primes out of logs.
impl std::fmt::Debug for RsaKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaKeyMaterial")
            .field("p_len", &self.p.len())
            .field("q_len", &self.q.len())
            .field("modulus_len", &self.modulus_len)
            .finish()
    }
}

impl RsaKeyMaterial {
    pub fn new(p: Vec<u8>, q: Vec<u8>, modulus_len: usize) -> Result<Self, OKError> {
        let key = Self { p, q, modulus_len };
        key.validate()?;
        Ok(key)
    }

    pub fn validate(&self) -> Result<(), OKError> {
        if self.p.is_empty() || self.q.is_empty() {
            return Err(OKError::InvalidKey("P and Q must not be empty".to_string()));
        }
        let units = self.modulus_len / MODULUS_UNIT_BYTES;
        if self.modulus_len % MODULUS_UNIT_BYTES != 0 || units == 0 || units > MAX_MODULUS_UNITS {
            return Err(OKError::InvalidKey(format!(
                "modulus length {} is not 128, 256, 384 or 512 bytes",
                self.modulus_len
            )));
        }
        Ok(())
    }

    /// Usage flags in the high nibble, modulus size in 128-byte units in the low one.
    pub fn control_byte(&self, features: KeyFeatures) -> u8 {
        features.bits() | (self.modulus_len / MODULUS_UNIT_BYTES) as u8
    }

    /// Q then P as one stream; chunk boundaries may fall anywhere inside it.
    pub fn interleave(&self) -> Vec<u8> {
        interleave(&self.p, &self.q)
    }

    /// Control byte followed by the interleaved primes.
    pub fn stream(&self, features: KeyFeatures) -> Vec<u8> {
        let mut stream = Vec::with_capacity(1 + self.p.len() + self.q.len());
        stream.push(self.control_byte(features));
        stream.extend_from_slice(&self.q);
        stream.extend_from_slice(&self.p);
        stream
    }
}

/// `Q ++ P`, no padding, whichever prime is longer.
pub fn interleave(p: &[u8], q: &[u8]) -> Vec<u8> {
    let mut stream = Vec::with_capacity(p.len() + q.len());
    stream.extend_from_slice(q);
    stream.extend_from_slice(p);
    stream
}
