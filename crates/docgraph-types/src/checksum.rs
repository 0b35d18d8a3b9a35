use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A 256-bit digest.
///
/// Used both as a document's content fingerprint and as a first-class
/// [`FlexValue`](crate::FlexValue) case, so documents can reference other
/// documents (or external artifacts) by hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Checksum256([u8; 32]);

impl Checksum256 {
    /// BLAKE3 digest of raw bytes (no domain separation).
    pub fn digest(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Wrap a pre-computed 32-byte digest.
    pub const fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The all-zero checksum.
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex, 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 hex characters, for log lines.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for Checksum256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum256({})", self.short_hex())
    }
}

impl fmt::Display for Checksum256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Checksum256 {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; 32]> for Checksum256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<Checksum256> for [u8; 32] {
    fn from(sum: Checksum256) -> Self {
        sum.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(Checksum256::digest(b"doc"), Checksum256::digest(b"doc"));
        assert_ne!(Checksum256::digest(b"doc"), Checksum256::digest(b"edge"));
    }

    #[test]
    fn digest_is_plain_blake3() {
        assert_eq!(
            Checksum256::digest(b"abc").to_hex(),
            "6437b3ac38465133ffb63b75273a8db548c558465d79db03fd359c6cd5bd9d85"
        );
    }

    #[test]
    fn zero_checksum() {
        assert!(Checksum256::zero().is_zero());
        assert!(!Checksum256::digest(b"x").is_zero());
        assert_eq!(Checksum256::default(), Checksum256::zero());
    }

    #[test]
    fn hex_parse_rejects_bad_input() {
        assert!(matches!(
            Checksum256::from_hex("zz"),
            Err(TypeError::InvalidHex(_))
        ));
        assert_eq!(
            Checksum256::from_hex("abcd").unwrap_err(),
            TypeError::InvalidLength {
                expected: 32,
                actual: 2
            }
        );
    }

    #[test]
    fn display_and_parse_agree() {
        let sum = Checksum256::digest(b"parse me");
        let text = sum.to_string();
        assert_eq!(text.len(), 64);
        assert_eq!(text.parse::<Checksum256>().unwrap(), sum);
    }

    #[test]
    fn debug_uses_short_hex() {
        let sum = Checksum256::from_hash([0xab; 32]);
        assert_eq!(format!("{sum:?}"), "Checksum256(abababab)");
    }
}
