//! P2SH Multisig: raw transaction builder and signer for M-of-N addresses
//!
//! This crate builds and signs raw Bitcoin transactions that fund and spend
//! Pay-to-Script-Hash multisignature addresses without a full node:
//! - HASH160 / double SHA-256 hashing and Base58Check encoding
//! - Uncompressed secp256k1 key pairs with WIF import/export
//! - M-of-N redeem scripts, P2SH / P2PKH scriptPubKeys and scriptSigs
//! - Byte-exact single-input, single-output transaction serialization
//! - ECDSA signing with self-verification and an explicit nonce source
//!
//! # Example
//!
//! ```rust
//! use p2sh_multisig::core::Network;
//! use p2sh_multisig::multisig::generate_address;
//! use p2sh_multisig::wallet::generate_wallets;
//!
//! // Three fresh key pairs
//! let wallets = generate_wallets(3, Network::Mainnet).unwrap();
//! let public_keys: Vec<&str> = wallets.iter().map(|w| w.public_key.as_str()).collect();
//!
//! // A 2-of-3 P2SH address
//! let address = generate_address(2, 3, &public_keys, Network::Mainnet).unwrap();
//! assert!(address.address.starts_with('3'));
//! println!("Redeem script: {}", address.redeem_script);
//! ```

pub mod cli;
pub mod core;
pub mod crypto;
pub mod multisig;
pub mod wallet;

// Re-export commonly used types
pub use core::{Network, RawTransaction, TransactionBuilder};
pub use crypto::{KeyPair, NonceSource, SigningContext};
pub use multisig::{generate_address, generate_fund, generate_spend, MultisigError};
pub use wallet::Wallet;
