//! ECDSA key management
//!
//! Provides private key generation, uncompressed public key derivation and
//! public key shape validation on the secp256k1 curve. The curve arithmetic
//! itself is delegated to the `secp256k1` crate.

use rand::rngs::OsRng;
use rand::RngCore;
use secp256k1::{PublicKey, Secp256k1, SecretKey, Signing};
use thiserror::Error;

use super::base58::{base58check_decode_expecting, base58check_encode, CodecError};
use super::hash::{hash160, HashError};

/// Length of a raw secp256k1 private key
pub const PRIVATE_KEY_LEN: usize = 32;

/// Length of an uncompressed SEC1 public key
pub const UNCOMPRESSED_PUBLIC_KEY_LEN: usize = 65;

/// First byte of an uncompressed SEC1 public key
pub const UNCOMPRESSED_PREFIX: u8 = 0x04;

/// Trailing byte marking a WIF key as belonging to a compressed public key
const WIF_COMPRESSED_FLAG: u8 = 0x01;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Entropy source failure: {0}")]
    Entropy(String),
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),
    #[error("Invalid public key {key:?}: {reason}")]
    InvalidPublicKey { key: String, reason: String },
    #[error("Invalid WIF private key: {0}")]
    InvalidWif(String),
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("Hash error: {0}")]
    Hash(#[from] HashError),
}

/// Generate 32 bytes of private key material from the OS CSPRNG.
///
/// Draws again in the (astronomically unlikely) case the bytes are not a
/// valid curve scalar. A failing entropy source is always an error.
pub fn new_private_key() -> Result<[u8; PRIVATE_KEY_LEN], KeyError> {
    let mut bytes = [0u8; PRIVATE_KEY_LEN];
    loop {
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| KeyError::Entropy(e.to_string()))?;
        if SecretKey::from_slice(&bytes).is_ok() {
            return Ok(bytes);
        }
        log::debug!("Generated bytes are not a valid secp256k1 scalar, drawing again");
    }
}

/// Parse raw private key bytes into a curve scalar
pub fn parse_secret_key(private_key: &[u8]) -> Result<SecretKey, KeyError> {
    if private_key.len() != PRIVATE_KEY_LEN {
        return Err(KeyError::InvalidPrivateKey(format!(
            "expected {} bytes, got {}",
            PRIVATE_KEY_LEN,
            private_key.len()
        )));
    }
    SecretKey::from_slice(private_key).map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))
}

/// Derive the 65-byte uncompressed public key for a private key
pub fn derive_public_key(
    private_key: &[u8],
) -> Result<[u8; UNCOMPRESSED_PUBLIC_KEY_LEN], KeyError> {
    let secp = Secp256k1::signing_only();
    derive_public_key_with(&secp, private_key)
}

/// Same as [`derive_public_key`] but reuses a caller-owned context
pub fn derive_public_key_with<C: Signing>(
    secp: &Secp256k1<C>,
    private_key: &[u8],
) -> Result<[u8; UNCOMPRESSED_PUBLIC_KEY_LEN], KeyError> {
    let secret_key = parse_secret_key(private_key)?;
    Ok(PublicKey::from_secret_key(secp, &secret_key).serialize_uncompressed())
}

/// Check that a public key has the uncompressed SEC1 shape.
///
/// Requires exactly 65 bytes starting with `0x04`. The error names the
/// received key in hex together with what is wrong with it.
pub fn check_public_key_valid(public_key: &[u8]) -> Result<(), KeyError> {
    let reason = if public_key.is_empty() {
        "public key cannot be empty".to_string()
    } else if public_key.len() != UNCOMPRESSED_PUBLIC_KEY_LEN {
        format!(
            "public key should be {} bytes long, provided key is {} bytes long",
            UNCOMPRESSED_PUBLIC_KEY_LEN,
            public_key.len()
        )
    } else if public_key[0] != UNCOMPRESSED_PREFIX {
        format!(
            "public key first byte should be 0x{:02x}, provided key starts with 0x{:02x}",
            UNCOMPRESSED_PREFIX, public_key[0]
        )
    } else {
        return Ok(());
    };

    Err(KeyError::InvalidPublicKey {
        key: hex::encode(public_key),
        reason,
    })
}

/// Decode a WIF string into raw private key bytes
pub fn private_key_from_wif(wif: &str, version: u8) -> Result<[u8; PRIVATE_KEY_LEN], KeyError> {
    let payload = base58check_decode_expecting(wif, version)?;
    let key_bytes = match payload.len() {
        PRIVATE_KEY_LEN => &payload[..],
        33 if payload[32] == WIF_COMPRESSED_FLAG => {
            log::warn!("WIF key is flagged for a compressed public key; the uncompressed key will be used");
            &payload[..PRIVATE_KEY_LEN]
        }
        n => {
            return Err(KeyError::InvalidWif(format!(
                "payload is {} bytes, expected {} or 33",
                n, PRIVATE_KEY_LEN
            )))
        }
    };

    let mut bytes = [0u8; PRIVATE_KEY_LEN];
    bytes.copy_from_slice(key_bytes);
    parse_secret_key(&bytes)?;
    Ok(bytes)
}

/// A private key together with its derived uncompressed public key
#[derive(Clone)]
pub struct KeyPair {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Result<Self, KeyError> {
        let private_key = new_private_key()?;
        Self::from_private_key(&private_key)
    }

    /// Create a key pair from raw private key bytes
    pub fn from_private_key(private_key: &[u8]) -> Result<Self, KeyError> {
        let secp = Secp256k1::signing_only();
        let secret_key = parse_secret_key(private_key)?;
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Ok(Self {
            secret_key,
            public_key,
        })
    }

    /// Import a key pair from Wallet Import Format
    pub fn from_wif(wif: &str, version: u8) -> Result<Self, KeyError> {
        let private_key = private_key_from_wif(wif, version)?;
        Self::from_private_key(&private_key)
    }

    /// Raw private key bytes
    pub fn private_key(&self) -> [u8; PRIVATE_KEY_LEN] {
        self.secret_key.secret_bytes()
    }

    /// Uncompressed public key bytes
    pub fn public_key(&self) -> [u8; UNCOMPRESSED_PUBLIC_KEY_LEN] {
        self.public_key.serialize_uncompressed()
    }

    /// Get the public key as a hex string (uncompressed format)
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key())
    }

    /// HASH160 of the uncompressed public key
    pub fn public_key_hash(&self) -> Result<[u8; 20], KeyError> {
        Ok(hash160(&self.public_key())?)
    }

    /// Private key in Wallet Import Format
    pub fn to_wif(&self, version: u8) -> String {
        base58check_encode(version, &self.private_key())
    }

    /// P2PKH address for the uncompressed public key
    pub fn address(&self, version: u8) -> Result<String, KeyError> {
        Ok(base58check_encode(version, &self.public_key_hash()?))
    }
}
