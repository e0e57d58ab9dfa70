//! Cryptographic utilities
//!
//! This module provides:
//! - SHA-256, double SHA-256 and HASH160
//! - Base58Check encoding
//! - ECDSA key management (secp256k1, uncompressed keys, WIF)
//! - Transaction signing with an explicit nonce source

pub mod base58;
pub mod hash;
pub mod keys;
pub mod signing;

pub use base58::{
    base58check_decode, base58check_decode_expecting, base58check_decode_versioned,
    base58check_encode, CodecError,
};
pub use hash::{double_sha256, hash160, sha256, HashError};
pub use keys::{
    check_public_key_valid, derive_public_key, new_private_key, private_key_from_wif, KeyError,
    KeyPair,
};
pub use signing::{NonceSource, SignError, SigningContext};
