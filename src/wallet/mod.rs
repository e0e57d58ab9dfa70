//! Wallet module for key generation and export

pub mod wallet;

pub use wallet::{generate_wallets, Wallet, WalletError, WalletExport, MAX_WALLET_BATCH};
