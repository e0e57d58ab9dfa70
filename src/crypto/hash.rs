//! Cryptographic hashing utilities
//!
//! Provides the SHA-256 based digests Bitcoin uses for transaction
//! sighashes, Base58Check checksums and script/public key hashes.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors that can occur while hashing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    #[error("Empty bytes cannot be hashed")]
    EmptyInput,
}

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Computes double SHA-256 hash (SHA-256 of SHA-256)
/// Used for transaction sighashes and Base58Check checksums
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Same operation as `OP_HASH160`: SHA-256 first, then RIPEMD-160
pub fn hash160(data: &[u8]) -> Result<[u8; 20], HashError> {
    if data.is_empty() {
        return Err(HashError::EmptyInput);
    }
    let sha256_hash = sha256(data);
    let mut ripemd = Ripemd160::new();
    ripemd.update(sha256_hash);
    Ok(ripemd.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256() {
        let data = b"hello world";
        assert_eq!(
            hex::encode(sha256(data)),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_double_sha256() {
        let data = b"hello world";
        assert_eq!(double_sha256(data), sha256(&sha256(data)));
        assert_eq!(
            hex::encode(double_sha256(data)),
            "bc62d4b80d9e36da29c16c5d4d9f11731f36052c72401a76c23c0fb5a9b74423"
        );
    }

    #[test]
    fn test_hash160_is_deterministic() {
        let hash = hash160(b"teststring").unwrap();
        assert_eq!(hex::encode(hash), "51d9ac622c2133ca4aaf58d4a4239526eb42c348");
        assert_eq!(hash160(b"teststring").unwrap(), hash);
    }

    #[test]
    fn test_hash160_rejects_empty_input() {
        assert_eq!(hash160(&[]), Err(HashError::EmptyInput));
    }
}
