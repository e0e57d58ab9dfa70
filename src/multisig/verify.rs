//! Offline verification of signed fund and spend transactions
//!
//! Each check rebuilds the unsigned serialization the signer saw (by putting
//! the placeholder scriptSig back) and verifies the embedded signatures
//! against it.

use serde::{Deserialize, Serialize};

use super::address::p2sh_address;
use super::error::MultisigError;
use crate::core::{
    decode_multisig_script_sig, decode_p2pkh_script_sig, new_p2pkh_script_pubkey,
    parse_redeem_script, Network, RawTransaction, SIGHASH_ALL,
};
use crate::crypto::{base58check_encode, check_public_key_valid, hash160, SigningContext};

/// Result of checking a P2PKH (funding) input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundVerification {
    pub public_key: String,
    /// P2PKH address of the signing key
    pub address: String,
    pub valid: bool,
}

/// Result of checking a P2SH multisig input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendVerification {
    pub m: u8,
    pub n: u8,
    /// P2SH address of the embedded redeem script
    pub address: String,
    pub signatures: usize,
    /// Redeem script key index matched by each verified signature
    pub matched_keys: Vec<usize>,
    pub valid: bool,
}

/// An undecodable signature or off-curve key counts as a failed check
fn signature_verifies(
    ctx: &SigningContext,
    signing_bytes: &[u8],
    signature_der: &[u8],
    public_key: &[u8],
) -> bool {
    match ctx.verify(signing_bytes, signature_der, public_key) {
        Ok(valid) => valid,
        Err(e) => {
            log::debug!("Signature does not verify: {}", e);
            false
        }
    }
}

/// Verify the signature of a P2PKH-signed transaction
pub fn verify_fund_transaction(
    ctx: &SigningContext,
    tx: &RawTransaction,
    network: Network,
) -> Result<FundVerification, MultisigError> {
    let script_sig = decode_p2pkh_script_sig(&tx.input().script_sig)?;
    let public_key = &script_sig.public_key;
    check_public_key_valid(public_key)?;

    let public_key_hash = hash160(public_key)?;
    let unsigned = tx.with_script_sig(new_p2pkh_script_pubkey(&public_key_hash)?)?;

    let sighash_type = script_sig.signature.sighash_type;
    let valid = sighash_type == SIGHASH_ALL
        && signature_verifies(
            ctx,
            &unsigned.serialize_for_signing(sighash_type),
            &script_sig.signature.der,
            public_key,
        );

    Ok(FundVerification {
        public_key: hex::encode(public_key),
        address: base58check_encode(network.p2pkh_version(), &public_key_hash),
        valid,
    })
}

/// Verify the signatures of a P2SH multisig spend.
///
/// Signatures are matched against the redeem script's keys the way
/// `OP_CHECKMULTISIG` does: in order, each signature consuming keys until
/// one verifies. The spend is valid when exactly `m` signatures all match.
pub fn verify_spend_transaction(
    ctx: &SigningContext,
    tx: &RawTransaction,
    network: Network,
) -> Result<SpendVerification, MultisigError> {
    let script_sig = decode_multisig_script_sig(&tx.input().script_sig)?;
    let info = parse_redeem_script(&script_sig.redeem_script)?;

    let unsigned = tx.with_script_sig(script_sig.redeem_script.clone())?;
    let signing_bytes = unsigned.serialize_for_signing(SIGHASH_ALL);

    let mut matched_keys = Vec::with_capacity(script_sig.signatures.len());
    let mut next_key = 0;
    for signature in &script_sig.signatures {
        if signature.sighash_type != SIGHASH_ALL {
            break;
        }
        let mut matched = None;
        while next_key < info.public_keys.len() {
            let key_index = next_key;
            next_key += 1;
            if signature_verifies(ctx, &signing_bytes, &signature.der, &info.public_keys[key_index]) {
                matched = Some(key_index);
                break;
            }
        }
        match matched {
            Some(key_index) => matched_keys.push(key_index),
            None => break,
        }
    }

    let valid = script_sig.signatures.len() == info.m as usize
        && matched_keys.len() == script_sig.signatures.len();
    if !valid {
        log::debug!(
            "{} of {} signatures matched redeem script keys (threshold {})",
            matched_keys.len(),
            script_sig.signatures.len(),
            info.m
        );
    }

    Ok(SpendVerification {
        m: info.m,
        n: info.n,
        address: p2sh_address(&script_sig.redeem_script, network)?,
        signatures: script_sig.signatures.len(),
        matched_keys,
        valid,
    })
}

/// What a transaction's scriptSig turned out to be
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputKind {
    /// Signed P2PKH spend (a funding transaction)
    P2pkh(FundVerification),
    /// Signed P2SH multisig spend
    Multisig(SpendVerification),
    /// Placeholder scriptSig of a transaction that has not been signed
    Unsigned,
    /// Anything else
    Unknown,
}

/// Classify and verify the input of a parsed transaction
pub fn inspect_input(
    ctx: &SigningContext,
    tx: &RawTransaction,
    network: Network,
) -> Result<InputKind, MultisigError> {
    let script_sig = &tx.input().script_sig;

    if let Ok(decoded) = decode_p2pkh_script_sig(script_sig) {
        if check_public_key_valid(&decoded.public_key).is_ok() {
            return Ok(InputKind::P2pkh(verify_fund_transaction(ctx, tx, network)?));
        }
    }
    if let Ok(decoded) = decode_multisig_script_sig(script_sig) {
        if parse_redeem_script(&decoded.redeem_script).is_ok() {
            return Ok(InputKind::Multisig(verify_spend_transaction(ctx, tx, network)?));
        }
    }

    let is_p2pkh_placeholder = placeholder_hash(script_sig)
        .and_then(|hash| new_p2pkh_script_pubkey(&hash).ok())
        .map_or(false, |template| template == *script_sig);
    if script_sig.is_empty() || is_p2pkh_placeholder || parse_redeem_script(script_sig).is_ok() {
        return Ok(InputKind::Unsigned);
    }

    Ok(InputKind::Unknown)
}

/// Hash embedded in a 25-byte P2PKH template
fn placeholder_hash(script: &[u8]) -> Option<[u8; 20]> {
    if script.len() != 25 {
        return None;
    }
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&script[3..23]);
    Some(hash)
}
