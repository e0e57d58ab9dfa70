//! Key-pair wallets for the `keys` operation
//!
//! A wallet is a single uncompressed secp256k1 key pair bound to a network,
//! exported as a WIF private key, a hex public key and a P2PKH address.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::Network;
use crate::crypto::{KeyError, KeyPair};

/// Largest number of wallets generated in one batch
pub const MAX_WALLET_BATCH: usize = 100;

/// Wallet-related errors
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Key count must be between 1 and {} (inclusive), got {0}", MAX_WALLET_BATCH)]
    InvalidCount(usize),
    #[error("Crypto error: {0}")]
    CryptoError(#[from] KeyError),
}

/// A key pair for one network
pub struct Wallet {
    /// The key pair for signing transactions
    key_pair: KeyPair,
    network: Network,
}

impl Wallet {
    /// Create a new wallet with a fresh key pair
    pub fn new(network: Network) -> Result<Self, WalletError> {
        Ok(Self {
            key_pair: KeyPair::generate()?,
            network,
        })
    }

    /// Import a wallet from a WIF private key
    pub fn from_wif(wif: &str, network: Network) -> Result<Self, WalletError> {
        Ok(Self {
            key_pair: KeyPair::from_wif(wif.trim(), network.wif_version())?,
            network,
        })
    }

    /// Get the wallet's P2PKH address
    pub fn address(&self) -> Result<String, WalletError> {
        Ok(self.key_pair.address(self.network.p2pkh_version())?)
    }

    /// Get the wallet's uncompressed public key (hex)
    pub fn public_key(&self) -> String {
        self.key_pair.public_key_hex()
    }

    /// Get the wallet's private key in Wallet Import Format
    /// WARNING: Keep this secret!
    pub fn private_key_wif(&self) -> String {
        self.key_pair.to_wif(self.network.wif_version())
    }

    /// Export everything needed to use the key elsewhere
    pub fn export(&self) -> Result<WalletExport, WalletError> {
        Ok(WalletExport {
            private_key: self.private_key_wif(),
            public_key: self.public_key(),
            address: self.address()?,
        })
    }
}

/// Exported wallet, including the private key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletExport {
    /// WIF private key
    pub private_key: String,
    /// Uncompressed public key, hex encoded
    pub public_key: String,
    /// P2PKH address
    pub address: String,
}

/// Generate `count` fresh wallets
pub fn generate_wallets(count: usize, network: Network) -> Result<Vec<WalletExport>, WalletError> {
    if count == 0 || count > MAX_WALLET_BATCH {
        return Err(WalletError::InvalidCount(count));
    }

    let wallets = (0..count)
        .map(|_| Wallet::new(network)?.export())
        .collect::<Result<Vec<_>, _>>()?;

    log::info!("Generated {} key pair(s) for {}", wallets.len(), network);
    Ok(wallets)
}
