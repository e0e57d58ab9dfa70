//! Script builder for P2PKH, P2SH and M-of-N multisig
//!
//! Assembles the exact byte layouts of redeem scripts, scriptPubKeys and
//! scriptSigs, and decodes them again for inspection and verification.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::opcodes::{opcode_name, small_int_opcode, small_int_value, OpCode, MAX_DIRECT_PUSH};
use crate::crypto::keys::{check_public_key_valid, KeyError};

// =============================================================================
// Script Constants
// =============================================================================

/// Largest N accepted for a standard P2SH multisig redeem script
pub const MAX_MULTISIG_KEYS: u8 = 7;

/// Length of the HASH160 digests embedded in scriptPubKeys
pub const HASH160_LEN: usize = 20;

/// Signature hash type: sign all inputs and outputs
pub const SIGHASH_ALL: u8 = 0x01;

// =============================================================================
// Script Errors
// =============================================================================

/// Script-related errors
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("N must be between 1 and {} (inclusive) for a standard P2SH multisig, got {n}", MAX_MULTISIG_KEYS)]
    InvalidKeyTotal { n: u8 },
    #[error("M must be between 1 and N ({n}) inclusive, got {m}")]
    InvalidThreshold { m: u8, n: u8 },
    #[error("Need exactly {expected} public keys for a {m}-of-{expected} multisig, {found} provided")]
    WrongKeyCount { m: u8, expected: u8, found: usize },
    #[error("Key error: {0}")]
    Key(#[from] KeyError),
    #[error("Hash cannot be empty")]
    EmptyHash,
    #[error("Hash must be {} bytes, got {0}", HASH160_LEN)]
    InvalidHashLength(usize),
    #[error("Push of {0} bytes is too large for this script")]
    PushTooLarge(usize),
    #[error("Malformed script: {0}")]
    Malformed(String),
}

// =============================================================================
// Script Construction
// =============================================================================

/// Build `OP_m <pubkey>... OP_n OP_CHECKMULTISIG`.
///
/// Requires `1 <= n <= 7`, `1 <= m <= n` and exactly `n` uncompressed
/// public keys, kept in the order given.
pub fn new_m_of_n_redeem_script<K: AsRef<[u8]>>(
    m: u8,
    n: u8,
    public_keys: &[K],
) -> Result<Vec<u8>, ScriptError> {
    if n < 1 || n > MAX_MULTISIG_KEYS {
        return Err(ScriptError::InvalidKeyTotal { n });
    }
    if m < 1 || m > n {
        return Err(ScriptError::InvalidThreshold { m, n });
    }
    if public_keys.len() != n as usize {
        return Err(ScriptError::WrongKeyCount {
            m,
            expected: n,
            found: public_keys.len(),
        });
    }

    let m_opcode = small_int_opcode(m).ok_or(ScriptError::InvalidThreshold { m, n })?;
    let n_opcode = small_int_opcode(n).ok_or(ScriptError::InvalidKeyTotal { n })?;

    let mut script = Vec::with_capacity(3 + public_keys.len() * 66);
    script.push(m_opcode);
    for public_key in public_keys {
        let public_key = public_key.as_ref();
        check_public_key_valid(public_key)?;
        script.push(public_key.len() as u8);
        script.extend_from_slice(public_key);
    }
    script.push(n_opcode);
    script.push(OpCode::CheckMultiSig.byte());

    log::debug!("Built {}-of-{} redeem script ({} bytes)", m, n, script.len());
    Ok(script)
}

fn check_hash(hash: &[u8]) -> Result<(), ScriptError> {
    match hash.len() {
        0 => Err(ScriptError::EmptyHash),
        HASH160_LEN => Ok(()),
        other => Err(ScriptError::InvalidHashLength(other)),
    }
}

/// `OP_HASH160 <redeem script hash> OP_EQUAL`
pub fn new_p2sh_script_pubkey(redeem_script_hash: &[u8]) -> Result<Vec<u8>, ScriptError> {
    check_hash(redeem_script_hash)?;

    let mut script = Vec::with_capacity(23);
    script.push(OpCode::Hash160.byte());
    script.push(redeem_script_hash.len() as u8);
    script.extend_from_slice(redeem_script_hash);
    script.push(OpCode::Equal.byte());
    Ok(script)
}

/// `OP_DUP OP_HASH160 <pubkey hash> OP_EQUALVERIFY OP_CHECKSIG`
pub fn new_p2pkh_script_pubkey(public_key_hash: &[u8]) -> Result<Vec<u8>, ScriptError> {
    check_hash(public_key_hash)?;

    let mut script = Vec::with_capacity(25);
    script.push(OpCode::Dup.byte());
    script.push(OpCode::Hash160.byte());
    script.push(public_key_hash.len() as u8);
    script.extend_from_slice(public_key_hash);
    script.push(OpCode::EqualVerify.byte());
    script.push(OpCode::CheckSig.byte());
    Ok(script)
}

/// Append `<len+1><sig><sighash>`
fn push_signature(
    script: &mut Vec<u8>,
    signature_der: &[u8],
    sighash_type: u8,
) -> Result<(), ScriptError> {
    let push_len = signature_der.len() + 1;
    if signature_der.is_empty() || push_len > MAX_DIRECT_PUSH as usize {
        return Err(ScriptError::PushTooLarge(push_len));
    }
    script.push(push_len as u8);
    script.extend_from_slice(signature_der);
    script.push(sighash_type);
    Ok(())
}

/// Single-sig P2PKH scriptSig: `<len+1><sig><sighash><len><pubkey>`
pub fn new_p2pkh_script_sig(
    signature_der: &[u8],
    sighash_type: u8,
    public_key: &[u8],
) -> Result<Vec<u8>, ScriptError> {
    if public_key.is_empty() || public_key.len() > MAX_DIRECT_PUSH as usize {
        return Err(ScriptError::PushTooLarge(public_key.len()));
    }

    let mut script = Vec::with_capacity(signature_der.len() + public_key.len() + 3);
    push_signature(&mut script, signature_der, sighash_type)?;
    script.push(public_key.len() as u8);
    script.extend_from_slice(public_key);
    Ok(script)
}

/// Multisig spend scriptSig:
/// `OP_0 <sig1><sighash> ... OP_PUSHDATA1|OP_PUSHDATA2 <len> <redeem script>`.
///
/// The leading `OP_0` is the dummy element consumed by `OP_CHECKMULTISIG`.
/// Signatures are written in the order given, which must match the order
/// of their public keys in the redeem script for the spend to validate.
pub fn new_multisig_script_sig<S: AsRef<[u8]>>(
    signatures: &[S],
    sighash_type: u8,
    redeem_script: &[u8],
) -> Result<Vec<u8>, ScriptError> {
    let mut script = Vec::with_capacity(1 + signatures.len() * 74 + redeem_script.len() + 3);
    script.push(OpCode::Op0.byte());
    for signature in signatures {
        push_signature(&mut script, signature.as_ref(), sighash_type)?;
    }

    let len = redeem_script.len();
    if len < 255 {
        script.push(OpCode::PushData1.byte());
        script.push(len as u8);
    } else if len <= u16::MAX as usize {
        script.push(OpCode::PushData2.byte());
        script.extend_from_slice(&(len as u16).to_le_bytes());
    } else {
        return Err(ScriptError::PushTooLarge(len));
    }
    script.extend_from_slice(redeem_script);

    Ok(script)
}

// =============================================================================
// Script Decoding
// =============================================================================

/// One element of a tokenized script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptElement {
    /// A non-push opcode (including `OP_0` and `OP_1`..`OP_16`)
    Op(u8),
    /// Data pushed by a direct push or `OP_PUSHDATA1/2/4`
    Push(Vec<u8>),
}

fn read_push_len(script: &[u8], pos: &mut usize, width: usize) -> Result<usize, ScriptError> {
    let bytes = script.get(*pos..*pos + width).ok_or_else(|| {
        ScriptError::Malformed(format!("push length at offset {} is truncated", *pos))
    })?;
    *pos += width;
    Ok(bytes
        .iter()
        .rev()
        .fold(0usize, |acc, byte| (acc << 8) | *byte as usize))
}

/// Split a script into opcodes and data pushes
pub fn parse_script(script: &[u8]) -> Result<Vec<ScriptElement>, ScriptError> {
    let mut elements = Vec::new();
    let mut pos = 0;

    while pos < script.len() {
        let opcode = script[pos];
        pos += 1;

        let len = match opcode {
            1..=MAX_DIRECT_PUSH => opcode as usize,
            0x4c => read_push_len(script, &mut pos, 1)?,
            0x4d => read_push_len(script, &mut pos, 2)?,
            0x4e => read_push_len(script, &mut pos, 4)?,
            _ => {
                elements.push(ScriptElement::Op(opcode));
                continue;
            }
        };

        let end = pos
            .checked_add(len)
            .filter(|end| *end <= script.len())
            .ok_or_else(|| {
                ScriptError::Malformed(format!(
                    "push of {} bytes at offset {} runs past the end of the script",
                    len, pos
                ))
            })?;
        elements.push(ScriptElement::Push(script[pos..end].to_vec()));
        pos = end;
    }

    Ok(elements)
}

/// Render a script as space-separated opcode names and hex pushes
pub fn disassemble(script: &[u8]) -> Result<String, ScriptError> {
    let parts: Vec<String> = parse_script(script)?
        .into_iter()
        .map(|element| match element {
            ScriptElement::Op(opcode) => opcode_name(opcode),
            ScriptElement::Push(data) => hex::encode(data),
        })
        .collect();
    Ok(parts.join(" "))
}

/// Threshold and public keys recovered from a redeem script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemScriptInfo {
    pub m: u8,
    pub n: u8,
    pub public_keys: Vec<Vec<u8>>,
}

/// Recover `(m, n, public keys)` from an M-of-N redeem script
pub fn parse_redeem_script(redeem_script: &[u8]) -> Result<RedeemScriptInfo, ScriptError> {
    let elements = parse_script(redeem_script)?;
    let malformed = |reason: &str| ScriptError::Malformed(format!("not a multisig redeem script: {}", reason));

    let (first, rest) = elements.split_first().ok_or_else(|| malformed("empty script"))?;
    let m = match first {
        ScriptElement::Op(opcode) => small_int_value(*opcode),
        ScriptElement::Push(_) => None,
    }
    .ok_or_else(|| malformed("missing OP_m"))?;

    let (last, middle) = rest.split_last().ok_or_else(|| malformed("too short"))?;
    if *last != ScriptElement::Op(OpCode::CheckMultiSig.byte()) {
        return Err(malformed("missing OP_CHECKMULTISIG"));
    }

    let (n_element, key_elements) = middle.split_last().ok_or_else(|| malformed("missing OP_n"))?;
    let n = match n_element {
        ScriptElement::Op(opcode) => small_int_value(*opcode),
        ScriptElement::Push(_) => None,
    }
    .ok_or_else(|| malformed("missing OP_n"))?;

    let mut public_keys = Vec::with_capacity(key_elements.len());
    for element in key_elements {
        match element {
            ScriptElement::Push(key) => {
                check_public_key_valid(key)?;
                public_keys.push(key.clone());
            }
            ScriptElement::Op(opcode) => {
                return Err(malformed(&format!("unexpected {}", opcode_name(*opcode))))
            }
        }
    }

    if public_keys.len() != n as usize {
        return Err(ScriptError::WrongKeyCount {
            m,
            expected: n,
            found: public_keys.len(),
        });
    }
    if m > n {
        return Err(ScriptError::InvalidThreshold { m, n });
    }

    Ok(RedeemScriptInfo { m, n, public_keys })
}

/// A DER signature as embedded in a scriptSig, split from its sighash byte
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptSignature {
    pub der: Vec<u8>,
    pub sighash_type: u8,
}

impl ScriptSignature {
    fn from_push(push: &[u8]) -> Result<Self, ScriptError> {
        match push.split_last() {
            Some((sighash_type, der)) if !der.is_empty() => Ok(Self {
                der: der.to_vec(),
                sighash_type: *sighash_type,
            }),
            _ => Err(ScriptError::Malformed(
                "signature push is too short".to_string(),
            )),
        }
    }
}

/// Contents of a P2PKH scriptSig
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct P2pkhScriptSig {
    pub signature: ScriptSignature,
    pub public_key: Vec<u8>,
}

/// Decode `<sig><sighash> <pubkey>`
pub fn decode_p2pkh_script_sig(script_sig: &[u8]) -> Result<P2pkhScriptSig, ScriptError> {
    match parse_script(script_sig)?.as_slice() {
        [ScriptElement::Push(signature), ScriptElement::Push(public_key)] => Ok(P2pkhScriptSig {
            signature: ScriptSignature::from_push(signature)?,
            public_key: public_key.clone(),
        }),
        _ => Err(ScriptError::Malformed(
            "P2PKH scriptSig must be exactly two pushes".to_string(),
        )),
    }
}

/// Contents of a P2SH multisig scriptSig
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigScriptSig {
    pub signatures: Vec<ScriptSignature>,
    pub redeem_script: Vec<u8>,
}

/// Decode `OP_0 <sig>... <redeem script>`
pub fn decode_multisig_script_sig(script_sig: &[u8]) -> Result<MultisigScriptSig, ScriptError> {
    let elements = parse_script(script_sig)?;

    match elements.as_slice() {
        [ScriptElement::Op(0x00), signatures @ .., ScriptElement::Push(redeem_script)] => {
            let signatures = signatures
                .iter()
                .map(|element| match element {
                    ScriptElement::Push(push) => ScriptSignature::from_push(push),
                    ScriptElement::Op(opcode) => Err(ScriptError::Malformed(format!(
                        "unexpected {} between signatures",
                        opcode_name(*opcode)
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?;

            Ok(MultisigScriptSig {
                signatures,
                redeem_script: redeem_script.clone(),
            })
        }
        _ => Err(ScriptError::Malformed(
            "multisig scriptSig must start with OP_0 and end with the redeem script".to_string(),
        )),
    }
}

// =============================================================================
// Tests
// =============================================================================
