//! Spending a P2SH multisig output to a P2PKH address
//!
//! The unsigned transaction carries the raw redeem script as its scriptSig.
//! Every supplied key signs that same serialization, and the scriptSig is
//! replaced by `OP_0 <sig>... <redeem script push>`.

use serde::{Deserialize, Serialize};

use super::address::{decode_address, p2sh_address};
use super::error::MultisigError;
use crate::core::{
    new_multisig_script_sig, new_p2pkh_script_pubkey, parse_redeem_script, Network,
    RawTransaction, TransactionBuilder, SIGHASH_ALL,
};
use crate::crypto::{KeyPair, SigningContext};

/// A signed multisig spend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendTransaction {
    /// P2SH address being spent from
    pub source_address: String,
    /// P2PKH address receiving the funds
    pub destination: String,
    pub input_transaction: String,
    pub satoshis: u64,
    pub m: u8,
    pub n: u8,
    pub signatures: usize,
    pub txid: String,
    /// Signed raw transaction, hex encoded
    pub transaction: String,
}

/// Sign a multisig spend whose scriptSig currently holds the redeem script.
///
/// Signatures are placed in the order the keys are given.
pub fn sign_multisig_transaction(
    ctx: &SigningContext,
    unsigned: &RawTransaction,
    keys: &[KeyPair],
    redeem_script: &[u8],
) -> Result<RawTransaction, MultisigError> {
    if keys.is_empty() {
        return Err(MultisigError::NoPrivateKeys);
    }

    let signing_bytes = unsigned.serialize_for_signing(SIGHASH_ALL);
    let signatures = keys
        .iter()
        .map(|key| ctx.sign(&signing_bytes, &key.private_key()))
        .collect::<Result<Vec<_>, _>>()?;

    let script_sig = new_multisig_script_sig(&signatures, SIGHASH_ALL, redeem_script)?;
    log::debug!(
        "Multisig scriptSig is {} bytes ({} signatures, {}-byte redeem script)",
        script_sig.len(),
        signatures.len(),
        redeem_script.len()
    );
    Ok(unsigned.with_script_sig(script_sig)?)
}

/// Build and sign a transaction moving `satoshis` from output 0 of
/// `input_txid` (locked to `redeem_script_hex`) to the P2PKH `destination`.
pub fn generate_spend<S: AsRef<str>>(
    ctx: &SigningContext,
    private_key_wifs: &[S],
    destination: &str,
    redeem_script_hex: &str,
    input_txid: &str,
    satoshis: u64,
    network: Network,
) -> Result<SpendTransaction, MultisigError> {
    if private_key_wifs.is_empty() {
        return Err(MultisigError::NoPrivateKeys);
    }
    let keys = private_key_wifs
        .iter()
        .map(|wif| KeyPair::from_wif(wif.as_ref().trim(), network.wif_version()))
        .collect::<Result<Vec<_>, _>>()?;

    let redeem_script = hex::decode(redeem_script_hex.trim())
        .map_err(|e| MultisigError::InvalidRedeemScriptHex(e.to_string()))?;
    let info = parse_redeem_script(&redeem_script)?;

    if keys.len() != info.m as usize {
        log::warn!(
            "{} private keys supplied for a {}-of-{} redeem script",
            keys.len(),
            info.m,
            info.n
        );
    }
    for (index, key) in keys.iter().enumerate() {
        if !info.public_keys.iter().any(|pk| pk[..] == key.public_key()[..]) {
            log::warn!(
                "Private key #{} does not belong to any public key in the redeem script",
                index + 1
            );
        }
    }

    let public_key_hash = decode_address(destination, network.p2pkh_version(), "P2PKH", network)?;
    let script_pubkey = new_p2pkh_script_pubkey(&public_key_hash)?;

    let unsigned = TransactionBuilder::new()
        .add_input(input_txid, &redeem_script)
        .add_output(satoshis, &script_pubkey)
        .build()?;
    let signed = sign_multisig_transaction(ctx, &unsigned, &keys, &redeem_script)?;

    let txid = signed.txid();
    log::info!(
        "Signed {}-of-{} spend {} ({} satoshis to {})",
        info.m,
        info.n,
        txid,
        satoshis,
        destination.trim()
    );

    Ok(SpendTransaction {
        source_address: p2sh_address(&redeem_script, network)?,
        destination: destination.trim().to_string(),
        input_transaction: signed.previous_txid_hex(),
        satoshis,
        m: info.m,
        n: info.n,
        signatures: keys.len(),
        txid,
        transaction: signed.to_hex(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{decode_multisig_script_sig, ScriptError};
    use crate::crypto::NonceSource;

    const TEST_WIFS: [&str; 3] = [
        "5JJyqG4bb15zqi7fTA4b227aUxQhBo1Ux6qX69ngeXYLr7fk2hs",
        "5KfWTqGjHY4e912qbhKow8VToKrgaHT7d7szxUCAepmV2nUn9k9",
        "5KDTZxSx6b68m2bWaUKaHdnDPEhcRE3uJRnfFvHKkQi9Uw8cw5G",
    ];

    const TEST_REDEEM_SCRIPT: &str = "52410431393af9984375830971ab5d3094c6a7d02db3568b2b06212a7090094549701bbb9e84d9477451acc42638963635899ce91bacb451a1bb6da73ddfbcf596bddf4104ff4c2ce7513a6c896ebfaaa4ae52cea35374e0eac90ccb8f4e5fa14b8322e2bae4c65116c7af2ba6a82831e48c451fc29a66d49c24757130ebf07c142bbcbe754104d95cf578183f346117b9743722bb6df93e1c62990824a1fc6645fd3dee45fa7ea5f164da7b518c3fd08a623664410df5a3b5f6ef1c5a285e834fd57c5a24a41e53ae";

    const TEST_FUND_TXID: &str = "8dfd52cdb615d0038149ad7a705689a716906c570c78d16e7d8d74656cd8e2ab";

    const TEST_DESTINATION: &str = "13LSqJeZBpqLHzmLkJ5mvRHiM11waShFUP";

    fn fixed_context() -> SigningContext {
        let mut nonce = [0u8; 32];
        for (i, byte) in nonce.iter_mut().enumerate() {
            *byte = i as u8;
        }
        SigningContext::with_nonce_source(NonceSource::Fixed(nonce))
    }

    #[test]
    fn test_two_of_three_spend_vector() {
        let spend = generate_spend(
            &fixed_context(),
            &TEST_WIFS[..2],
            TEST_DESTINATION,
            TEST_REDEEM_SCRIPT,
            TEST_FUND_TXID,
            55600,
            Network::Mainnet,
        )
        .unwrap();

        assert_eq!(
            spend.transaction,
            "0100000001abe2d86c65748d7d6ed1780c576c9016a78956707aad498103d015b6cd52fd8d00000000fd5c010047304402206d6caac248af96f6afa7f904f550253a0f3ef3f5aa2fe6838a95b216691468e202204e122d815fe88af0b05bd96e25f5ee1f50832e558f698eff9c5910e85417fc7d0147304402206d6caac248af96f6afa7f904f550253a0f3ef3f5aa2fe6838a95b216691468e202200a08bb603fe5dab818c8061638adec7bb250384f6e9fbda7826af7efa0cee80c014cc952410431393af9984375830971ab5d3094c6a7d02db3568b2b06212a7090094549701bbb9e84d9477451acc42638963635899ce91bacb451a1bb6da73ddfbcf596bddf4104ff4c2ce7513a6c896ebfaaa4ae52cea35374e0eac90ccb8f4e5fa14b8322e2bae4c65116c7af2ba6a82831e48c451fc29a66d49c24757130ebf07c142bbcbe754104d95cf578183f346117b9743722bb6df93e1c62990824a1fc6645fd3dee45fa7ea5f164da7b518c3fd08a623664410df5a3b5f6ef1c5a285e834fd57c5a24a41e53aeffffffff0130d90000000000001976a914199db810a3c8ae5e55c0432d2b72e55b0634f79088ac00000000"
        );
        assert_eq!(spend.source_address, "3GqoaM2MVP9TG5RVVLAeSxkup3LWoqiqei");
        assert_eq!((spend.m, spend.n, spend.signatures), (2, 3, 2));
    }

    #[test]
    fn test_signature_order_follows_key_order() {
        let ctx = fixed_context();
        let forward = generate_spend(
            &ctx,
            &[TEST_WIFS[0], TEST_WIFS[1]],
            TEST_DESTINATION,
            TEST_REDEEM_SCRIPT,
            TEST_FUND_TXID,
            55600,
            Network::Mainnet,
        )
        .unwrap();
        let reversed = generate_spend(
            &ctx,
            &[TEST_WIFS[1], TEST_WIFS[0]],
            TEST_DESTINATION,
            TEST_REDEEM_SCRIPT,
            TEST_FUND_TXID,
            55600,
            Network::Mainnet,
        )
        .unwrap();

        let decode = |hex_tx: &str| {
            let tx = RawTransaction::from_hex(hex_tx).unwrap();
            decode_multisig_script_sig(&tx.input().script_sig).unwrap()
        };
        let forward = decode(&forward.transaction);
        let reversed = decode(&reversed.transaction);
        assert_eq!(forward.signatures[0], reversed.signatures[1]);
        assert_eq!(forward.signatures[1], reversed.signatures[0]);
        assert_eq!(hex::encode(&forward.redeem_script), TEST_REDEEM_SCRIPT);
    }

    #[test]
    fn test_spend_rejects_p2sh_destination() {
        let result = generate_spend(
            &fixed_context(),
            &TEST_WIFS[..2],
            "3GqoaM2MVP9TG5RVVLAeSxkup3LWoqiqei",
            TEST_REDEEM_SCRIPT,
            TEST_FUND_TXID,
            55600,
            Network::Mainnet,
        );
        assert!(matches!(
            result,
            Err(MultisigError::WrongAddressType { expected: "P2PKH", .. })
        ));
    }

    #[test]
    fn test_spend_rejects_bad_inputs() {
        let ctx = fixed_context();
        let no_keys: [&str; 0] = [];
        assert!(matches!(
            generate_spend(&ctx, &no_keys, TEST_DESTINATION, TEST_REDEEM_SCRIPT, TEST_FUND_TXID, 1, Network::Mainnet),
            Err(MultisigError::NoPrivateKeys)
        ));
        assert!(matches!(
            generate_spend(&ctx, &TEST_WIFS[..2], TEST_DESTINATION, "xyz", TEST_FUND_TXID, 1, Network::Mainnet),
            Err(MultisigError::InvalidRedeemScriptHex(_))
        ));
        assert!(matches!(
            generate_spend(&ctx, &TEST_WIFS[..2], TEST_DESTINATION, "76a914", TEST_FUND_TXID, 1, Network::Mainnet),
            Err(MultisigError::Script(ScriptError::Malformed(_)))
        ));
    }

    #[test]
    fn test_spend_with_all_keys_still_signs() {
        let spend = generate_spend(
            &fixed_context(),
            &TEST_WIFS,
            TEST_DESTINATION,
            TEST_REDEEM_SCRIPT,
            TEST_FUND_TXID,
            55600,
            Network::Mainnet,
        )
        .unwrap();
        assert_eq!(spend.signatures, 3);
    }
}
