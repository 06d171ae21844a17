//! Content fingerprints used as asset keys

use sha2::{Digest, Sha256};
use std::fmt;

/// A SHA-256 fingerprint of an asset's bytes.
///
/// Depends only on content: the same bytes under any name produce the same
/// fingerprint.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Compute a fingerprint from bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Get the fingerprint as a hex string
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Get the fingerprint as a prefixed hex string (e.g., "sha256:abcdef...")
    pub fn to_prefixed_hex(&self) -> String {
        format!("sha256:{}", self.to_hex())
    }

    /// Parse a hex string, with or without the "sha256:" prefix
    pub fn parse(s: &str) -> Option<Self> {
        let hex = s.strip_prefix("sha256:").unwrap_or(s);
        if hex.len() != 64 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(bytes))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_consistent_hashing() {
        let h1 = Fingerprint::from_bytes(b"hello");
        let h2 = Fingerprint::from_bytes(b"hello");
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_order_sensitive() {
        let h1 = Fingerprint::from_bytes(b"ab");
        let h2 = Fingerprint::from_bytes(b"ba");
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_known_digest() {
        let h = Fingerprint::from_bytes(b"");
        assert_eq!(
            h.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_parse_roundtrip() {
        let h = Fingerprint::from_bytes(b"test data");
        let prefixed = h.to_prefixed_hex();
        assert!(prefixed.starts_with("sha256:"));
        assert_eq!(Fingerprint::parse(&prefixed), Some(h));
        assert_eq!(Fingerprint::parse(&h.to_hex()), Some(h));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Fingerprint::parse("md5:abc").is_none());
        assert!(Fingerprint::parse("sha256:tooshort").is_none());
        assert!(Fingerprint::parse(&"zz".repeat(32)).is_none());
        assert!(Fingerprint::parse(&"+0".repeat(32)).is_none());
    }

    proptest! {
        #[test]
        fn prop_deterministic(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            prop_assert_eq!(Fingerprint::from_bytes(&data), Fingerprint::from_bytes(&data));
        }

        #[test]
        fn prop_distinct_content_distinct_fingerprint(
            a in proptest::collection::vec(any::<u8>(), 0..256),
            b in proptest::collection::vec(any::<u8>(), 0..256),
        ) {
            prop_assume!(a != b);
            prop_assert_ne!(Fingerprint::from_bytes(&a), Fingerprint::from_bytes(&b));
        }
    }
}
