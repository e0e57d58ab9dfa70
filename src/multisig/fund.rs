//! Funding a P2SH address from a P2PKH output
//!
//! The unsigned transaction carries the signer's P2PKH scriptPubKey as its
//! scriptSig. That serialization plus the SIGHASH_ALL suffix is signed, and
//! the scriptSig is then replaced by `<sig><sighash> <pubkey>`.

use serde::{Deserialize, Serialize};

use super::address::decode_address;
use super::error::MultisigError;
use crate::core::{
    new_p2pkh_script_pubkey, new_p2pkh_script_sig, new_p2sh_script_pubkey, Network,
    RawTransaction, TransactionBuilder, SIGHASH_ALL,
};
use crate::crypto::{KeyPair, SigningContext};

/// A signed funding transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundTransaction {
    /// P2PKH address of the funding key
    pub source_address: String,
    /// P2SH address receiving the funds
    pub destination: String,
    pub input_transaction: String,
    pub satoshis: u64,
    pub txid: String,
    /// Signed raw transaction, hex encoded
    pub transaction: String,
}

/// Sign a P2PKH spend whose scriptSig currently holds the signer's
/// scriptPubKey, returning the transaction with its final scriptSig.
pub fn sign_p2pkh_transaction(
    ctx: &SigningContext,
    unsigned: &RawTransaction,
    key: &KeyPair,
) -> Result<RawTransaction, MultisigError> {
    let signing_bytes = unsigned.serialize_for_signing(SIGHASH_ALL);
    let signature = ctx.sign(&signing_bytes, &key.private_key())?;
    let script_sig = new_p2pkh_script_sig(&signature, SIGHASH_ALL, &key.public_key())?;
    log::debug!(
        "P2PKH scriptSig is {} bytes ({}-byte signature)",
        script_sig.len(),
        signature.len()
    );
    Ok(unsigned.with_script_sig(script_sig)?)
}

/// Build and sign a transaction moving `satoshis` from output 0 of
/// `input_txid` (owned by `private_key_wif`) to the P2SH `destination`.
pub fn generate_fund(
    ctx: &SigningContext,
    private_key_wif: &str,
    input_txid: &str,
    satoshis: u64,
    destination: &str,
    network: Network,
) -> Result<FundTransaction, MultisigError> {
    let key = KeyPair::from_wif(private_key_wif.trim(), network.wif_version())?;
    let public_key_hash = key.public_key_hash()?;

    let script_hash = decode_address(destination, network.p2sh_version(), "P2SH", network)?;
    let script_pubkey = new_p2sh_script_pubkey(&script_hash)?;
    let placeholder_script_sig = new_p2pkh_script_pubkey(&public_key_hash)?;

    let unsigned = TransactionBuilder::new()
        .add_input(input_txid, &placeholder_script_sig)
        .add_output(satoshis, &script_pubkey)
        .build()?;
    let signed = sign_p2pkh_transaction(ctx, &unsigned, &key)?;

    let txid = signed.txid();
    log::info!(
        "Signed funding transaction {} ({} satoshis to {})",
        txid,
        satoshis,
        destination.trim()
    );

    Ok(FundTransaction {
        source_address: key.address(network.p2pkh_version())?,
        destination: destination.trim().to_string(),
        input_transaction: signed.previous_txid_hex(),
        satoshis,
        txid,
        transaction: signed.to_hex(),
    })
}
