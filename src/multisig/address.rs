//! P2SH multisig address generation
//!
//! Address = Base58Check(p2sh_version || HASH160(redeem_script))

use serde::{Deserialize, Serialize};

use super::error::MultisigError;
use crate::core::{new_m_of_n_redeem_script, Network};
use crate::crypto::{base58check_decode_versioned, base58check_encode, hash160};

/// Bytes budgeted per signature push in the standardness estimate
const SIGNATURE_PUSH_SIZE: usize = 73;

/// Bytes budgeted per public key push in the standardness estimate
const PUBLIC_KEY_PUSH_SIZE: usize = 66;

/// Largest estimated scriptSig relayed by standard nodes
pub const MAX_STANDARD_SCRIPT_SIG_ESTIMATE: usize = 496;

/// Whether an M-of-N spend stays within the standard scriptSig size
pub fn is_standard(m: u8, n: u8) -> bool {
    m as usize * SIGNATURE_PUSH_SIZE + n as usize * PUBLIC_KEY_PUSH_SIZE
        <= MAX_STANDARD_SCRIPT_SIG_ESTIMATE
}

/// A P2SH multisig address together with its redeem script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigAddress {
    pub m: u8,
    pub n: u8,
    pub network: Network,
    /// Base58Check P2SH address
    pub address: String,
    /// Redeem script, hex encoded
    pub redeem_script: String,
    /// False when a spend would exceed the standard scriptSig size
    pub standard: bool,
}

impl MultisigAddress {
    /// Get description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.m, self.n)
    }
}

/// P2SH address for an already-built redeem script
pub fn p2sh_address(redeem_script: &[u8], network: Network) -> Result<String, MultisigError> {
    let script_hash = hash160(redeem_script)?;
    Ok(base58check_encode(network.p2sh_version(), &script_hash))
}

/// Decode an address and require a specific version byte.
///
/// Returns the 20-byte hash payload.
pub(crate) fn decode_address(
    address: &str,
    expected_version: u8,
    expected: &'static str,
    network: Network,
) -> Result<Vec<u8>, MultisigError> {
    let (version, payload) = base58check_decode_versioned(address.trim())?;
    if version != expected_version {
        return Err(MultisigError::WrongAddressType {
            address: address.to_string(),
            expected,
            network,
            found: version,
        });
    }
    Ok(payload)
}

/// Build an M-of-N redeem script from hex public keys and derive its
/// P2SH address.
pub fn generate_address<S: AsRef<str>>(
    m: u8,
    n: u8,
    public_keys: &[S],
    network: Network,
) -> Result<MultisigAddress, MultisigError> {
    let public_keys = public_keys
        .iter()
        .map(|key| {
            let key = key.as_ref();
            hex::decode(key).map_err(|e| MultisigError::InvalidPublicKeyHex {
                key: key.to_string(),
                reason: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let redeem_script = new_m_of_n_redeem_script(m, n, &public_keys)?;
    let address = p2sh_address(&redeem_script, network)?;

    let standard = is_standard(m, n);
    if !standard {
        log::warn!(
            "{}-of-{} exceeds the standard scriptSig size ({} > {} bytes); spends may not be relayed",
            m,
            n,
            m as usize * SIGNATURE_PUSH_SIZE + n as usize * PUBLIC_KEY_PUSH_SIZE,
            MAX_STANDARD_SCRIPT_SIG_ESTIMATE
        );
    }

    log::info!("Generated {}-of-{} P2SH address {}", m, n, address);

    Ok(MultisigAddress {
        m,
        n,
        network,
        address,
        redeem_script: hex::encode(redeem_script),
        standard,
    })
}
