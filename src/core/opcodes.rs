//! Bitcoin Script opcodes
//!
//! Only the fixed set needed for P2PKH, P2SH and bare multisig templates.

use serde::{Deserialize, Serialize};

/// Script opcodes used by the P2PKH / P2SH / multisig templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum OpCode {
    /// Push an empty byte vector
    Op0 = 0x00,
    /// Next byte is the push length
    PushData1 = 0x4c,
    /// Next two bytes (little-endian) are the push length
    PushData2 = 0x4d,
    /// Next four bytes (little-endian) are the push length
    PushData4 = 0x4e,
    /// Push the number 1 (`OP_2`..`OP_16` follow consecutively)
    Op1 = 0x51,
    /// Push the number 16
    Op16 = 0x60,
    /// Duplicate the top stack item
    Dup = 0x76,
    /// Push 1 if the top two items are equal
    Equal = 0x87,
    /// `OP_EQUAL` followed by `OP_VERIFY`
    EqualVerify = 0x88,
    /// SHA-256 then RIPEMD-160 of the top item
    Hash160 = 0xa9,
    /// Check a signature against a public key
    CheckSig = 0xac,
    /// Check M signatures against N public keys
    CheckMultiSig = 0xae,
}

impl OpCode {
    /// Raw byte value
    pub fn byte(self) -> u8 {
        self as u8
    }

    /// Name as written in script disassembly
    pub fn name(self) -> &'static str {
        match self {
            OpCode::Op0 => "OP_0",
            OpCode::PushData1 => "OP_PUSHDATA1",
            OpCode::PushData2 => "OP_PUSHDATA2",
            OpCode::PushData4 => "OP_PUSHDATA4",
            OpCode::Op1 => "OP_1",
            OpCode::Op16 => "OP_16",
            OpCode::Dup => "OP_DUP",
            OpCode::Equal => "OP_EQUAL",
            OpCode::EqualVerify => "OP_EQUALVERIFY",
            OpCode::Hash160 => "OP_HASH160",
            OpCode::CheckSig => "OP_CHECKSIG",
            OpCode::CheckMultiSig => "OP_CHECKMULTISIG",
        }
    }
}

/// Highest direct push length (`0x01..=0x4b` push that many bytes)
pub const MAX_DIRECT_PUSH: u8 = 0x4b;

/// Opcode pushing the small integer `n` (`OP_1` = `0x51` ... `OP_16` = `0x60`)
pub fn small_int_opcode(n: u8) -> Option<u8> {
    if (1..=16).contains(&n) {
        Some(0x50 + n)
    } else {
        None
    }
}

/// Inverse of [`small_int_opcode`]
pub fn small_int_value(opcode: u8) -> Option<u8> {
    if (OpCode::Op1.byte()..=OpCode::Op16.byte()).contains(&opcode) {
        Some(opcode - 0x50)
    } else {
        None
    }
}

/// Human-readable name of an opcode byte
pub fn opcode_name(opcode: u8) -> String {
    match opcode {
        0x00 => OpCode::Op0.name().to_string(),
        0x4c => OpCode::PushData1.name().to_string(),
        0x4d => OpCode::PushData2.name().to_string(),
        0x4e => OpCode::PushData4.name().to_string(),
        0x76 => OpCode::Dup.name().to_string(),
        0x87 => OpCode::Equal.name().to_string(),
        0x88 => OpCode::EqualVerify.name().to_string(),
        0xa9 => OpCode::Hash160.name().to_string(),
        0xac => OpCode::CheckSig.name().to_string(),
        0xae => OpCode::CheckMultiSig.name().to_string(),
        other => match small_int_value(other) {
            Some(n) => format!("OP_{}", n),
            None => format!("OP_UNKNOWN(0x{:02x})", other),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_int_opcodes() {
        assert_eq!(small_int_opcode(1), Some(0x51));
        assert_eq!(small_int_opcode(7), Some(0x57));
        assert_eq!(small_int_opcode(16), Some(0x60));
        assert_eq!(small_int_opcode(0), None);
        assert_eq!(small_int_opcode(17), None);

        assert_eq!(small_int_value(0x52), Some(2));
        assert_eq!(small_int_value(0x50), None);
        assert_eq!(small_int_value(0x61), None);
    }

    #[test]
    fn test_opcode_bytes() {
        assert_eq!(OpCode::Hash160.byte(), 169);
        assert_eq!(OpCode::CheckMultiSig.byte(), 174);
        assert_eq!(OpCode::PushData1.byte(), 76);
        assert_eq!(OpCode::PushData2.byte(), 77);
    }

    #[test]
    fn test_opcode_names() {
        assert_eq!(opcode_name(0xae), "OP_CHECKMULTISIG");
        assert_eq!(opcode_name(0x53), "OP_3");
        assert_eq!(opcode_name(0xff), "OP_UNKNOWN(0xff)");
    }
}
