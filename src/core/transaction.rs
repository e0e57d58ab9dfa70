//! Raw transaction serialization
//!
//! Builds the legacy wire layout used by the fund and spend flows: version 1,
//! exactly one input spending output 0 of a previous transaction, exactly
//! one output, final sequence and zero locktime.
//!
//! Two length encodings are deliberately narrow and must stay byte-exact:
//! - the scriptSig length is a single byte below 253 and `0xfd` + u16 LE
//!   otherwise (larger sizes are rejected)
//! - the scriptPubKey length is always one raw byte

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::hash::double_sha256;

// =============================================================================
// Constants
// =============================================================================

/// Transaction format version
pub const TX_VERSION: u32 = 1;

/// Sequence number that disables locktime
pub const SEQUENCE_FINAL: u32 = 0xFFFF_FFFF;

/// Index of the previous output every input spends
pub const SPENT_OUTPUT_INDEX: u32 = 0;

/// Length of a transaction id
pub const TXID_LEN: usize = 32;

/// Upper bound on any output value (21 million coins)
pub const MAX_MONEY: u64 = 21_000_000 * 100_000_000;

/// Largest scriptSig representable by the `0xfd` length prefix
pub const MAX_SCRIPT_SIG_LEN: usize = u16::MAX as usize;

/// Largest scriptPubKey representable by the single length byte
pub const MAX_SCRIPT_PUBKEY_LEN: usize = u8::MAX as usize;

const VARINT_U16_PREFIX: u8 = 0xfd;

// =============================================================================
// Error Types
// =============================================================================

/// Transaction-related errors
#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("Invalid transaction id {txid:?}: {reason}")]
    InvalidTxid { txid: String, reason: String },
    #[error("Amount of {0} satoshis exceeds the maximum of {} satoshis", MAX_MONEY)]
    AmountTooLarge(u64),
    #[error("scriptSig of {0} bytes cannot be encoded (maximum {})", MAX_SCRIPT_SIG_LEN)]
    ScriptSigTooLarge(usize),
    #[error("scriptPubKey of {0} bytes cannot be encoded (maximum {})", MAX_SCRIPT_PUBKEY_LEN)]
    ScriptPubKeyTooLarge(usize),
    #[error("Transaction must have exactly one input, got {0}")]
    InputCount(usize),
    #[error("Transaction must have exactly one output, got {0}")]
    OutputCount(usize),
    #[error("Transaction is truncated at offset {0}")]
    Truncated(usize),
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("Invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Parse a display-order (big-endian) txid into wire order
pub fn parse_txid(txid: &str) -> Result<[u8; TXID_LEN], TransactionError> {
    let bytes = hex::decode(txid.trim()).map_err(|e| TransactionError::InvalidTxid {
        txid: txid.to_string(),
        reason: e.to_string(),
    })?;
    if bytes.len() != TXID_LEN {
        return Err(TransactionError::InvalidTxid {
            txid: txid.to_string(),
            reason: format!("expected {} bytes, got {}", TXID_LEN, bytes.len()),
        });
    }

    let mut wire = [0u8; TXID_LEN];
    for (dst, src) in wire.iter_mut().zip(bytes.iter().rev()) {
        *dst = *src;
    }
    Ok(wire)
}

/// Render a wire-order txid in display order
pub fn txid_to_hex(wire: &[u8; TXID_LEN]) -> String {
    let display: Vec<u8> = wire.iter().rev().copied().collect();
    hex::encode(display)
}

// =============================================================================
// Transaction Input / Output
// =============================================================================

/// Transaction input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    /// Previous txid in wire (little-endian) order
    pub previous_txid: [u8; TXID_LEN],
    /// Index of the spent output in the previous transaction
    pub previous_index: u32,
    pub script_sig: Vec<u8>,
    pub sequence: u32,
}

/// Transaction output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub satoshis: u64,
    pub script_pubkey: Vec<u8>,
}

fn check_script_sig(script_sig: &[u8]) -> Result<(), TransactionError> {
    if script_sig.len() > MAX_SCRIPT_SIG_LEN {
        return Err(TransactionError::ScriptSigTooLarge(script_sig.len()));
    }
    Ok(())
}

fn check_output(output: &TxOutput) -> Result<(), TransactionError> {
    if output.satoshis > MAX_MONEY {
        return Err(TransactionError::AmountTooLarge(output.satoshis));
    }
    if output.script_pubkey.len() > MAX_SCRIPT_PUBKEY_LEN {
        return Err(TransactionError::ScriptPubKeyTooLarge(
            output.script_pubkey.len(),
        ));
    }
    Ok(())
}

// =============================================================================
// Raw Transaction
// =============================================================================

/// A single-input, single-output legacy transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransaction {
    version: u32,
    input: TxInput,
    output: TxOutput,
    lock_time: u32,
}

impl RawTransaction {
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn input(&self) -> &TxInput {
        &self.input
    }

    pub fn output(&self) -> &TxOutput {
        &self.output
    }

    pub fn lock_time(&self) -> u32 {
        self.lock_time
    }

    /// Previous txid in display order
    pub fn previous_txid_hex(&self) -> String {
        txid_to_hex(&self.input.previous_txid)
    }

    /// Copy of this transaction with the input's scriptSig replaced
    pub fn with_script_sig(&self, script_sig: Vec<u8>) -> Result<Self, TransactionError> {
        check_script_sig(&script_sig)?;
        let mut tx = self.clone();
        tx.input.script_sig = script_sig;
        Ok(tx)
    }

    /// Serialize to wire bytes
    pub fn serialize(&self) -> Vec<u8> {
        let script_sig = &self.input.script_sig;
        let script_pubkey = &self.output.script_pubkey;
        let mut bytes = Vec::with_capacity(60 + script_sig.len() + script_pubkey.len());

        bytes.extend_from_slice(&self.version.to_le_bytes());
        bytes.push(1);
        bytes.extend_from_slice(&self.input.previous_txid);
        bytes.extend_from_slice(&self.input.previous_index.to_le_bytes());
        if script_sig.len() < VARINT_U16_PREFIX as usize {
            bytes.push(script_sig.len() as u8);
        } else {
            bytes.push(VARINT_U16_PREFIX);
            bytes.extend_from_slice(&(script_sig.len() as u16).to_le_bytes());
        }
        bytes.extend_from_slice(script_sig);
        bytes.extend_from_slice(&self.input.sequence.to_le_bytes());

        bytes.push(1);
        bytes.extend_from_slice(&self.output.satoshis.to_le_bytes());
        bytes.push(script_pubkey.len() as u8);
        bytes.extend_from_slice(script_pubkey);

        bytes.extend_from_slice(&self.lock_time.to_le_bytes());
        bytes
    }

    /// Serialized bytes with the 4-byte little-endian sighash type appended
    pub fn serialize_for_signing(&self, sighash_type: u8) -> Vec<u8> {
        let mut bytes = self.serialize();
        bytes.extend_from_slice(&(sighash_type as u32).to_le_bytes());
        bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.serialize())
    }

    /// Transaction id (double SHA-256 of the wire bytes, display order)
    pub fn txid(&self) -> String {
        txid_to_hex(&double_sha256(&self.serialize()))
    }

    /// Parse wire bytes produced by [`RawTransaction::serialize`]
    pub fn parse(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut reader = Reader::new(bytes);

        let version = reader.read_u32()?;
        if version != TX_VERSION {
            return Err(TransactionError::InvalidTransaction(format!(
                "unsupported version {}",
                version
            )));
        }
        let input_count = reader.read_u8()? as usize;
        if input_count != 1 {
            return Err(TransactionError::InputCount(input_count));
        }

        let mut previous_txid = [0u8; TXID_LEN];
        previous_txid.copy_from_slice(reader.take(TXID_LEN)?);
        let previous_index = reader.read_u32()?;
        let script_sig_len = match reader.read_u8()? {
            VARINT_U16_PREFIX => match reader.read_u16()? as usize {
                len if len < VARINT_U16_PREFIX as usize => {
                    return Err(TransactionError::InvalidTransaction(format!(
                        "non-canonical scriptSig length prefix for {} bytes",
                        len
                    )))
                }
                len => len,
            },
            len if len < VARINT_U16_PREFIX => len as usize,
            other => {
                return Err(TransactionError::InvalidTransaction(format!(
                    "unsupported scriptSig length prefix 0x{:02x}",
                    other
                )))
            }
        };
        let script_sig = reader.take(script_sig_len)?.to_vec();
        let sequence = reader.read_u32()?;

        let output_count = reader.read_u8()? as usize;
        if output_count != 1 {
            return Err(TransactionError::OutputCount(output_count));
        }
        let satoshis = reader.read_u64()?;
        let script_pubkey_len = reader.read_u8()? as usize;
        let script_pubkey = reader.take(script_pubkey_len)?.to_vec();
        let lock_time = reader.read_u32()?;

        if !reader.is_empty() {
            return Err(TransactionError::InvalidTransaction(format!(
                "{} trailing bytes after locktime",
                reader.remaining()
            )));
        }

        let output = TxOutput {
            satoshis,
            script_pubkey,
        };
        check_output(&output)?;

        Ok(Self {
            version,
            input: TxInput {
                previous_txid,
                previous_index,
                script_sig,
                sequence,
            },
            output,
            lock_time,
        })
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, TransactionError> {
        Self::parse(&hex::decode(hex_str.trim())?)
    }
}

/// Little-endian cursor over transaction bytes
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], TransactionError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(TransactionError::Truncated(self.pos))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], TransactionError> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }

    fn read_u8(&mut self) -> Result<u8, TransactionError> {
        Ok(self.take(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16, TransactionError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    fn read_u32(&mut self) -> Result<u32, TransactionError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    fn read_u64(&mut self) -> Result<u64, TransactionError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}

// =============================================================================
// Transaction Builder
// =============================================================================

/// Builder for single-input, single-output transactions
#[derive(Debug, Default)]
pub struct TransactionBuilder {
    inputs: Vec<(String, Vec<u8>)>,
    outputs: Vec<TxOutput>,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spend output 0 of `txid` (display-order hex) with the given scriptSig
    pub fn add_input(mut self, txid: &str, script_sig: &[u8]) -> Self {
        self.inputs.push((txid.to_string(), script_sig.to_vec()));
        self
    }

    /// Pay `satoshis` to `script_pubkey`
    pub fn add_output(mut self, satoshis: u64, script_pubkey: &[u8]) -> Self {
        self.outputs.push(TxOutput {
            satoshis,
            script_pubkey: script_pubkey.to_vec(),
        });
        self
    }

    /// Validate and assemble the transaction
    pub fn build(mut self) -> Result<RawTransaction, TransactionError> {
        if self.inputs.len() != 1 {
            return Err(TransactionError::InputCount(self.inputs.len()));
        }
        if self.outputs.len() != 1 {
            return Err(TransactionError::OutputCount(self.outputs.len()));
        }

        let (txid, script_sig) = self.inputs.remove(0);
        let output = self.outputs.remove(0);
        let previous_txid = parse_txid(&txid)?;
        check_script_sig(&script_sig)?;
        check_output(&output)?;

        Ok(RawTransaction {
            version: TX_VERSION,
            input: TxInput {
                previous_txid,
                previous_index: SPENT_OUTPUT_INDEX,
                script_sig,
                sequence: SEQUENCE_FINAL,
            },
            output,
            lock_time: 0,
        })
    }
}

/// Serialize a one-input, one-output transaction spending output 0 of
/// `input_txid` and paying `satoshis` to `script_pubkey`
pub fn new_raw_transaction(
    input_txid: &str,
    satoshis: u64,
    script_sig: &[u8],
    script_pubkey: &[u8],
) -> Result<Vec<u8>, TransactionError> {
    let tx = TransactionBuilder::new()
        .add_input(input_txid, script_sig)
        .add_output(satoshis, script_pubkey)
        .build()?;
    Ok(tx.serialize())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_TXID: &str = "3ad337270ac0ba14fbce812291b7d95338c878709ea8123a4d88c3c29efbc6ac";

    const TEST_SCRIPT_SIG: [u8; 25] = [
        118, 169, 20, 146, 3, 228, 122, 22, 247, 153, 222, 208, 53, 50, 227, 228, 82, 96, 111, 220,
        82, 0, 126, 136, 172,
    ];

    const TEST_SCRIPT_PUBKEY: [u8; 23] = [
        169, 20, 26, 139, 0, 38, 52, 49, 102, 98, 92, 116, 117, 240, 30, 72, 181, 237, 232, 192,
        37, 46, 135,
    ];

    const TEST_RAW_TX: &str = "0100000001acc6fb9ec2c3884d3a12a89e7078c83853d9b7912281cefb14bac00a2737d33a000000001976a9149203e47a16f799ded03532e3e452606fdc52007e88acffffffff01400001000000000017a9141a8b0026343166625c7475f01e48b5ede8c0252e8700000000";

    const SIGNED_FUND_TX: &str = "0100000001acc6fb9ec2c3884d3a12a89e7078c83853d9b7912281cefb14bac00a2737d33a000000008a47304402206d6caac248af96f6afa7f904f550253a0f3ef3f5aa2fe6838a95b216691468e202205ce93d1f2ed67fdfc5b4d3ad5c022b07c042fe97d3655791424ddfd75c5429d50141041f5e7c565316d6dcff449025d4f56d0f7d3ebc8f86e14f34173092b4b46052881915420082f4d8afd774136c3e46cfeb9555998c2868d687bdcb7f3d1ee81693ffffffff01400001000000000017a914a63352977f74e766eb424cce205430ec7506118b8700000000";

    #[test]
    fn test_new_raw_transaction_bytes() {
        let raw = new_raw_transaction(TEST_TXID, 65600, &TEST_SCRIPT_SIG, &TEST_SCRIPT_PUBKEY)
            .unwrap();
        assert_eq!(hex::encode(raw), TEST_RAW_TX);
    }

    #[test]
    fn test_serialize_for_signing_appends_sighash() {
        let tx = TransactionBuilder::new()
            .add_input(TEST_TXID, &TEST_SCRIPT_SIG)
            .add_output(65600, &TEST_SCRIPT_PUBKEY)
            .build()
            .unwrap();
        let bytes = tx.serialize_for_signing(0x01);
        assert_eq!(hex::encode(&bytes[..bytes.len() - 4]), TEST_RAW_TX);
        assert_eq!(bytes[bytes.len() - 4..], [0x01, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_parse_and_txid() {
        let tx = RawTransaction::from_hex(SIGNED_FUND_TX).unwrap();
        assert_eq!(tx.version(), TX_VERSION);
        assert_eq!(tx.previous_txid_hex(), TEST_TXID);
        assert_eq!(tx.input().previous_index, 0);
        assert_eq!(tx.input().sequence, SEQUENCE_FINAL);
        assert_eq!(tx.input().script_sig.len(), 0x8a);
        assert_eq!(tx.output().satoshis, 65600);
        assert_eq!(tx.lock_time(), 0);
        assert_eq!(tx.to_hex(), SIGNED_FUND_TX);
        assert_eq!(
            tx.txid(),
            "250bd50b025e650560e07360bfdce05983ef395b7a5abc26467803a3e143080e"
        );
    }

    #[test]
    fn test_long_script_sig_uses_fd_prefix() {
        let script_sig = vec![0xab; 348];
        let raw = new_raw_transaction(TEST_TXID, 1000, &script_sig, &TEST_SCRIPT_PUBKEY).unwrap();
        assert_eq!(raw[41..44], [0xfd, 0x5c, 0x01]);

        let parsed = RawTransaction::parse(&raw).unwrap();
        assert_eq!(parsed.input().script_sig, script_sig);
        assert_eq!(parsed.serialize(), raw);
    }

    #[test]
    fn test_script_sig_at_prefix_boundary() {
        let short = new_raw_transaction(TEST_TXID, 1, &[0u8; 252], &TEST_SCRIPT_PUBKEY).unwrap();
        assert_eq!(short[41], 252);

        let long = new_raw_transaction(TEST_TXID, 1, &[0u8; 253], &TEST_SCRIPT_PUBKEY).unwrap();
        assert_eq!(long[41..44], [0xfd, 0xfd, 0x00]);
    }

    #[test]
    fn test_rejects_unrepresentable_lengths() {
        let huge = vec![0u8; MAX_SCRIPT_SIG_LEN + 1];
        assert!(matches!(
            new_raw_transaction(TEST_TXID, 1, &huge, &TEST_SCRIPT_PUBKEY),
            Err(TransactionError::ScriptSigTooLarge(_))
        ));

        let long_pubkey_script = vec![0u8; 256];
        assert!(matches!(
            new_raw_transaction(TEST_TXID, 1, &TEST_SCRIPT_SIG, &long_pubkey_script),
            Err(TransactionError::ScriptPubKeyTooLarge(256))
        ));
    }

    #[test]
    fn test_rejects_bad_txid_and_amount() {
        assert!(matches!(
            new_raw_transaction("zz", 1, &TEST_SCRIPT_SIG, &TEST_SCRIPT_PUBKEY),
            Err(TransactionError::InvalidTxid { .. })
        ));
        assert!(matches!(
            new_raw_transaction(&TEST_TXID[..62], 1, &TEST_SCRIPT_SIG, &TEST_SCRIPT_PUBKEY),
            Err(TransactionError::InvalidTxid { .. })
        ));
        assert!(matches!(
            new_raw_transaction(TEST_TXID, MAX_MONEY + 1, &TEST_SCRIPT_SIG, &TEST_SCRIPT_PUBKEY),
            Err(TransactionError::AmountTooLarge(_))
        ));
    }

    #[test]
    fn test_builder_requires_single_input_and_output() {
        let result = TransactionBuilder::new()
            .add_output(1, &TEST_SCRIPT_PUBKEY)
            .build();
        assert!(matches!(result, Err(TransactionError::InputCount(0))));

        let result = TransactionBuilder::new()
            .add_input(TEST_TXID, &TEST_SCRIPT_SIG)
            .add_input(TEST_TXID, &TEST_SCRIPT_SIG)
            .add_output(1, &TEST_SCRIPT_PUBKEY)
            .build();
        assert!(matches!(result, Err(TransactionError::InputCount(2))));

        let result = TransactionBuilder::new()
            .add_input(TEST_TXID, &TEST_SCRIPT_SIG)
            .build();
        assert!(matches!(result, Err(TransactionError::OutputCount(0))));
    }

    #[test]
    fn test_parse_rejects_truncated_and_trailing() {
        let raw = hex::decode(TEST_RAW_TX).unwrap();
        assert!(matches!(
            RawTransaction::parse(&raw[..raw.len() - 1]),
            Err(TransactionError::Truncated(_))
        ));

        let mut padded = raw.clone();
        padded.push(0x00);
        assert!(matches!(
            RawTransaction::parse(&padded),
            Err(TransactionError::InvalidTransaction(_))
        ));
    }

    #[test]
    fn test_with_script_sig_replaces_only_script_sig() {
        let tx = RawTransaction::from_hex(TEST_RAW_TX).unwrap();
        let replaced = tx.with_script_sig(vec![0x51]).unwrap();
        assert_eq!(replaced.input().script_sig, vec![0x51]);
        assert_eq!(replaced.output(), tx.output());
        assert_eq!(replaced.input().previous_txid, tx.input().previous_txid);
    }

    #[test]
    fn test_parse_rejects_non_canonical_encodings() {
        let raw = hex::decode(TEST_RAW_TX).unwrap();

        // 25-byte scriptSig behind a 0xfd prefix
        let mut padded_prefix = raw[..41].to_vec();
        padded_prefix.extend_from_slice(&[0xfd, 0x19, 0x00]);
        padded_prefix.extend_from_slice(&raw[42..]);
        assert!(matches!(
            RawTransaction::parse(&padded_prefix),
            Err(TransactionError::InvalidTransaction(_))
        ));

        let mut version_two = raw.clone();
        version_two[0] = 0x02;
        assert!(matches!(
            RawTransaction::parse(&version_two),
            Err(TransactionError::InvalidTransaction(_))
        ));
    }
}
