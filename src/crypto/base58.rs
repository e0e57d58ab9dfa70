//! Base58Check encoding
//!
//! `Base58(version || payload || checksum)` where the checksum is the first
//! four bytes of `double_sha256(version || payload)`. Used for addresses
//! and WIF private keys.

use thiserror::Error;

use super::hash::double_sha256;

/// Length of the Base58Check checksum suffix
pub const CHECKSUM_LEN: usize = 4;

/// Errors that can occur while decoding Base58Check strings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Invalid base58 string {input:?}: {reason}")]
    InvalidBase58 { input: String, reason: String },
    #[error("Base58Check data too short: {0} bytes, need at least 5")]
    TooShort(usize),
    #[error("Base58Check checksum mismatch for {0:?}")]
    ChecksumMismatch(String),
    #[error("Unexpected version byte: expected 0x{expected:02x}, found 0x{found:02x}")]
    UnexpectedVersion { expected: u8, found: u8 },
}

/// Encode `payload` with the given version byte
pub fn base58check_encode(version: u8, payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(1 + payload.len() + CHECKSUM_LEN);
    data.push(version);
    data.extend_from_slice(payload);

    let checksum = double_sha256(&data);
    data.extend_from_slice(&checksum[..CHECKSUM_LEN]);

    bs58::encode(data).into_string()
}

/// Decode a Base58Check string, returning the version byte and payload
pub fn base58check_decode_versioned(input: &str) -> Result<(u8, Vec<u8>), CodecError> {
    let data = bs58::decode(input.trim())
        .into_vec()
        .map_err(|e| CodecError::InvalidBase58 {
            input: input.to_string(),
            reason: e.to_string(),
        })?;

    if data.len() < 1 + CHECKSUM_LEN {
        return Err(CodecError::TooShort(data.len()));
    }

    let (body, checksum) = data.split_at(data.len() - CHECKSUM_LEN);
    if double_sha256(body)[..CHECKSUM_LEN] != *checksum {
        return Err(CodecError::ChecksumMismatch(input.to_string()));
    }

    Ok((body[0], body[1..].to_vec()))
}

/// Decode a Base58Check string, returning only the payload
pub fn base58check_decode(input: &str) -> Result<Vec<u8>, CodecError> {
    base58check_decode_versioned(input).map(|(_, payload)| payload)
}

/// Decode a Base58Check string and require a specific version byte
pub fn base58check_decode_expecting(input: &str, version: u8) -> Result<Vec<u8>, CodecError> {
    let (found, payload) = base58check_decode_versioned(input)?;
    if found != version {
        return Err(CodecError::UnexpectedVersion {
            expected: version,
            found,
        });
    }
    Ok(payload)
}
