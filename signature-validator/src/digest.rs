use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::error::{Result, VerifyError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Sha1,
    Sha256,
}

impl DigestAlgorithm {
    pub fn from_digest_len(len: usize) -> Result<Self> {
        match len {
            20 => Ok(DigestAlgorithm::Sha1),
            32 => Ok(DigestAlgorithm::Sha256),
            other => Err(VerifyError::UnsupportedDigestAlgorithm(other * 2)),
        }
    }

    pub fn from_hex_len(len: usize) -> Result<Self> {
        match len {
            40 => Ok(DigestAlgorithm::Sha1),
            64 => Ok(DigestAlgorithm::Sha256),
            other => Err(VerifyError::UnsupportedDigestAlgorithm(other)),
        }
    }

    pub fn hex_len(self) -> usize {
        match self {
            DigestAlgorithm::Sha1 => 40,
            DigestAlgorithm::Sha256 => 64,
        }
    }

    pub fn hash(self, data: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            DigestAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
        }
    }
}

/// A message digest declared in the authenticated attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestResult {
    pub algorithm: DigestAlgorithm,
    /// Lower-case hex.
    pub hex_value: String,
}

impl DigestResult {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(DigestResult {
            algorithm: DigestAlgorithm::from_digest_len(bytes.len())?,
            hex_value: hex::encode(bytes),
        })
    }

    /// Accepts a hex digest; the algorithm follows from its length.
    pub fn from_hex(hex_value: &str) -> Result<Self> {
        Ok(DigestResult {
            algorithm: DigestAlgorithm::from_hex_len(hex_value.len())?,
            hex_value: hex_value.to_ascii_lowercase(),
        })
    }
}

/// Recomputes the digest of `signed_bytes` and compares it with the declared
/// one. Only an exact match of the full hex string counts.
pub fn check_integrity(
    hash: impl Fn(DigestAlgorithm, &[u8]) -> Vec<u8>,
    signed_bytes: &[u8],
    declared: &DigestResult,
) -> Result<bool> {
    let algorithm = DigestAlgorithm::from_hex_len(declared.hex_value.len())?;
    let computed = hex::encode(hash(algorithm, signed_bytes));
    let valid = computed == declared.hex_value.to_ascii_lowercase();

    log::debug!("document {:?} digest: {}", algorithm, computed);
    log::debug!("declared {:?} digest: {}", algorithm, declared.hex_value);
    Ok(valid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(alg: DigestAlgorithm, data: &[u8]) -> Vec<u8> {
        alg.hash(data)
    }

    #[test]
    fn algorithm_by_length() {
        assert_eq!(DigestAlgorithm::from_digest_len(20), Ok(DigestAlgorithm::Sha1));
        assert_eq!(DigestAlgorithm::from_digest_len(32), Ok(DigestAlgorithm::Sha256));
        assert_eq!(
            DigestAlgorithm::from_digest_len(48),
            Err(VerifyError::UnsupportedDigestAlgorithm(96))
        );
        assert_eq!(DigestAlgorithm::Sha1.hex_len(), 40);
        assert_eq!(DigestAlgorithm::Sha256.hex_len(), 64);
    }

    #[test]
    fn known_hashes() {
        assert_eq!(
            hex::encode(DigestAlgorithm::Sha1.hash(b"abc")),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            hex::encode(DigestAlgorithm::Sha256.hash(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn integrity_matches_exactly() {
        let upper = "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD";
        let declared = DigestResult::from_hex(upper).unwrap();
        assert_eq!(declared.algorithm, DigestAlgorithm::Sha256);
        assert!(check_integrity(local, b"abc", &declared).unwrap());
        assert!(!check_integrity(local, b"abd", &declared).unwrap());
    }

    #[test]
    fn any_single_character_change_fails() {
        let good = "a9993e364706816aba3e25717850c26c9cd0d89d";
        for i in 0..good.len() {
            let mut tampered = good.as_bytes().to_vec();
            tampered[i] = if tampered[i] == b'0' { b'1' } else { b'0' };
            let declared = DigestResult::from_hex(std::str::from_utf8(&tampered).unwrap()).unwrap();
            assert!(!check_integrity(local, b"abc", &declared).unwrap(), "position {}", i);
        }
    }

    #[test]
    fn prefix_is_not_a_match() {
        let declared = DigestResult {
            algorithm: DigestAlgorithm::Sha1,
            hex_value: "a9993e36".into(),
        };
        assert_eq!(
            check_integrity(local, b"abc", &declared),
            Err(VerifyError::UnsupportedDigestAlgorithm(8))
        );
    }
}
