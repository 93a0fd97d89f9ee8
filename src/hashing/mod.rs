//! Claim normalization and content-addressed cache keys.
//!
//! Two claims that normalize to the same text share a [`ClaimKey`]. The key is the
//! full 32-byte BLAKE3 digest of the case-folded text, so collisions are not a
//! practical concern for the cache layer.

use std::fmt;

/// Trims the claim and collapses internal whitespace runs to a single space.
///
/// Case is preserved; this is the form stored in
/// [`ClaimAnalysis::claim`](crate::model::ClaimAnalysis::claim).
pub fn normalize_claim(claim: &str) -> String {
    claim.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized and case-folded form used for key derivation.
pub fn fold_claim(claim: &str) -> String {
    normalize_claim(claim).to_lowercase()
}

#[inline]
pub fn hash_claim(claim: &str) -> [u8; 32] {
    *blake3::hash(fold_claim(claim).as_bytes()).as_bytes()
}

/// Deterministic cache key for a claim or topic.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClaimKey([u8; 32]);

impl ClaimKey {
    /// Derives the key from raw (un-normalized) claim text.
    #[inline]
    pub fn from_claim(claim: &str) -> Self {
        Self(hash_claim(claim))
    }

    #[inline]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parses a 64-character lowercase hex key (the on-disk file stem).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hash = blake3::Hash::from_hex(hex).ok()?;
        Some(Self(*hash.as_bytes()))
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        blake3::Hash::from_bytes(self.0).to_hex().to_string()
    }
}

impl fmt::Display for ClaimKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ClaimKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClaimKey({})", &self.to_hex()[..16])
    }
}
