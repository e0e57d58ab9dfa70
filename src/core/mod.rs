//! Core Bitcoin primitives
//!
//! This module contains the wire-level building blocks:
//! - Opcodes used by the supported script templates
//! - Script construction and decoding (P2PKH, P2SH, M-of-N multisig)
//! - Raw transaction serialization and parsing
//! - Network parameters (address and WIF version bytes)

pub mod network;
pub mod opcodes;
pub mod script;
pub mod transaction;

pub use network::Network;
pub use opcodes::OpCode;
pub use script::{
    decode_multisig_script_sig, decode_p2pkh_script_sig, disassemble, new_m_of_n_redeem_script,
    new_multisig_script_sig, new_p2pkh_script_pubkey, new_p2pkh_script_sig,
    new_p2sh_script_pubkey, parse_redeem_script, parse_script, MultisigScriptSig,
    P2pkhScriptSig, RedeemScriptInfo, ScriptElement, ScriptError, ScriptSignature,
    MAX_MULTISIG_KEYS, SIGHASH_ALL,
};
pub use transaction::{
    new_raw_transaction, RawTransaction, TransactionBuilder, TransactionError, TxInput, TxOutput,
    MAX_MONEY, SEQUENCE_FINAL, TX_VERSION,
};
