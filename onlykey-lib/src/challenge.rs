use sha2::{Digest, Sha256};
use std::fmt;

/// Digest positions the device turns into buttons.
const DIGEST_POSITIONS: [usize; 3] = [0, 15, 31];

/// Three buttons the operator presses on the device to authorize a decrypt.
///
/// The device derives the same code from the ciphertext it received, so a
/// matching entry proves the operator saw this request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeCode(pub [u8; 3]);

impl ChallengeCode {
    pub fn from_ciphertext(ciphertext: &[u8]) -> Self {
        Self::from_digest(&Sha256::digest(ciphertext).into())
    }

    pub fn from_digest(digest: &[u8; 32]) -> Self {
        Self(DIGEST_POSITIONS.map(|i| button(digest[i])))
    }

    pub fn buttons(&self) -> [u8; 3] {
        self.0
    }
}

impl fmt::Display for ChallengeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0;
        write!(f, "({a}) ({b}) ({c})")
    }
}

/// Map a digest byte to a button number 1-5.
pub fn button(byte: u8) -> u8 {
    if byte < 6 { 1 } else { byte % 5 + 1 }
}
