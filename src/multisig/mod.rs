//! P2SH M-of-N multisig operations
//!
//! Ties the script builder, transaction serializer and signing engine
//! together into the three end-user operations:
//! - `address`: build a redeem script and its P2SH address
//! - `fund`: pay from a P2PKH output into the P2SH address
//! - `spend`: redeem the P2SH output with M signatures to a P2PKH address
//!
//! # Example
//!
//! ```ignore
//! use p2sh_multisig::core::Network;
//! use p2sh_multisig::crypto::SigningContext;
//! use p2sh_multisig::multisig::{generate_address, generate_fund, generate_spend};
//!
//! let address = generate_address(2, 3, &[pub1, pub2, pub3], Network::Mainnet)?;
//!
//! let ctx = SigningContext::new();
//! let fund = generate_fund(&ctx, &funder_wif, &utxo_txid, 65600, &address.address, Network::Mainnet)?;
//! let spend = generate_spend(
//!     &ctx,
//!     &[wif1, wif2],
//!     &destination,
//!     &address.redeem_script,
//!     &fund.txid,
//!     55600,
//!     Network::Mainnet,
//! )?;
//! ```

pub mod address;
pub mod error;
pub mod fund;
pub mod spend;
pub mod verify;

pub use address::{generate_address, is_standard, p2sh_address, MultisigAddress};
pub use error::MultisigError;
pub use fund::{generate_fund, sign_p2pkh_transaction, FundTransaction};
pub use spend::{generate_spend, sign_multisig_transaction, SpendTransaction};
pub use verify::{
    inspect_input, verify_fund_transaction, verify_spend_transaction, FundVerification,
    InputKind, SpendVerification,
};
