//! Errors for the multisig address, fund and spend operations

use thiserror::Error;

use crate::core::{Network, ScriptError, TransactionError};
use crate::crypto::{CodecError, HashError, KeyError, SignError};

/// Errors related to multisig operations
#[derive(Error, Debug)]
pub enum MultisigError {
    #[error("Invalid public key hex {key:?}: {reason}")]
    InvalidPublicKeyHex { key: String, reason: String },
    #[error("Invalid redeem script hex: {0}")]
    InvalidRedeemScriptHex(String),
    #[error("{address} is not a {expected} address on {network} (version byte 0x{found:02x})")]
    WrongAddressType {
        address: String,
        expected: &'static str,
        network: Network,
        found: u8,
    },
    #[error("At least one private key is required")]
    NoPrivateKeys,
    #[error("Key error: {0}")]
    Key(#[from] KeyError),
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("Hash error: {0}")]
    Hash(#[from] HashError),
    #[error("Signing error: {0}")]
    Sign(#[from] SignError),
    #[error("Script error: {0}")]
    Script(#[from] ScriptError),
    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),
}
