//! Transaction signing engine
//!
//! Signs `double_sha256(raw_tx || sighash_type)` with ECDSA over secp256k1,
//! self-verifies every signature before handing it out and returns it in
//! DER form.
//!
//! The libsecp256k1 context is owned by a [`SigningContext`], created for
//! a group of operations and released when the value is dropped. Nonce
//! material comes from an explicit [`NonceSource`] passed in at
//! construction instead of any process-wide switch.

use k256::ecdsa::hazmat::SignPrimitive;
use k256::elliptic_curve::PrimeField;
use k256::{FieldBytes, Scalar};
use rand::rngs::OsRng;
use rand::RngCore;
use secp256k1::ecdsa::Signature;
use secp256k1::{All, Message, PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

use super::hash::double_sha256;
use super::keys::{derive_public_key_with, parse_secret_key, KeyError, UNCOMPRESSED_PUBLIC_KEY_LEN};

/// Errors that can occur while signing or verifying
#[derive(Error, Debug)]
pub enum SignError {
    #[error("Key error: {0}")]
    Key(#[from] KeyError),
    #[error("Entropy source failure: {0}")]
    Entropy(String),
    #[error("Nonce is not a valid secp256k1 scalar")]
    InvalidNonce,
    #[error("Failed to verify signed transaction")]
    VerificationFailed,
    #[error("Malformed DER signature: {0}")]
    MalformedSignature(String),
}

/// Where the per-signature ECDSA nonce comes from.
///
/// `Random` mixes 32 fresh OsRng bytes into libsecp256k1's RFC 6979
/// derivation, so every call yields a new signature. `Fixed` uses the
/// given big-endian bytes as the nonce `k` itself, which reproduces
/// signatures byte for byte. Reusing `k` across different messages leaks
/// the private key, so `Fixed` is for test vectors only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NonceSource {
    #[default]
    Random,
    Fixed([u8; 32]),
}

fn random_entropy() -> Result<[u8; 32], SignError> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| SignError::Entropy(e.to_string()))?;
    Ok(bytes)
}

/// ECDSA with a caller-chosen `k`, normalized to low-S
fn sign_with_nonce(
    digest: &[u8; 32],
    secret_key: &SecretKey,
    nonce: &[u8; 32],
) -> Result<Signature, SignError> {
    let d = Option::<Scalar>::from(Scalar::from_repr(FieldBytes::clone_from_slice(
        &secret_key.secret_bytes(),
    )))
    .ok_or_else(|| {
        SignError::Key(KeyError::InvalidPrivateKey(
            "not a secp256k1 scalar".to_string(),
        ))
    })?;
    let k = Option::<Scalar>::from(Scalar::from_repr(FieldBytes::clone_from_slice(nonce)))
        .ok_or(SignError::InvalidNonce)?;

    // A zero nonce has no inverse and fails here
    let (signature, _) = d
        .try_sign_prehashed(k, &FieldBytes::clone_from_slice(digest))
        .map_err(|_| SignError::InvalidNonce)?;

    let mut signature = Signature::from_compact(&signature.to_bytes())
        .map_err(|e| SignError::MalformedSignature(e.to_string()))?;
    signature.normalize_s();
    Ok(signature)
}

/// Scoped handle on the secp256k1 primitive
pub struct SigningContext {
    secp: Secp256k1<All>,
    nonce_source: NonceSource,
}

impl Default for SigningContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SigningContext {
    /// Create a context drawing nonce entropy from the OS
    pub fn new() -> Self {
        Self::with_nonce_source(NonceSource::Random)
    }

    /// Create a context with an explicit nonce source
    pub fn with_nonce_source(nonce_source: NonceSource) -> Self {
        Self {
            secp: Secp256k1::new(),
            nonce_source,
        }
    }

    /// The nonce source this context signs with
    pub fn nonce_source(&self) -> NonceSource {
        self.nonce_source
    }

    /// Derive the uncompressed public key for a private key
    pub fn derive_public_key(
        &self,
        private_key: &[u8],
    ) -> Result<[u8; UNCOMPRESSED_PUBLIC_KEY_LEN], SignError> {
        Ok(derive_public_key_with(&self.secp, private_key)?)
    }

    /// Sign a raw transaction that already carries its 4-byte sighash suffix.
    ///
    /// Returns the DER signature without the trailing sighash byte. A
    /// signature that fails to verify against the derived public key is an
    /// error and is never returned.
    pub fn sign(&self, raw_transaction: &[u8], private_key: &[u8]) -> Result<Vec<u8>, SignError> {
        let secret_key = parse_secret_key(private_key)?;
        let public_key = PublicKey::from_secret_key(&self.secp, &secret_key);

        let digest = double_sha256(raw_transaction);
        let message = Message::from_digest(digest);
        log::debug!("Signing sighash {}", hex::encode(digest));

        let signature = match &self.nonce_source {
            NonceSource::Random => {
                let entropy = random_entropy()?;
                self.secp
                    .sign_ecdsa_with_noncedata(&message, &secret_key, &entropy)
            }
            NonceSource::Fixed(nonce) => sign_with_nonce(&digest, &secret_key, nonce)?,
        };

        self.secp
            .verify_ecdsa(&message, &signature, &public_key)
            .map_err(|_| SignError::VerificationFailed)?;

        Ok(signature.serialize_der().to_vec())
    }

    /// Verify a DER signature over `double_sha256(raw_transaction)`
    pub fn verify(
        &self,
        raw_transaction: &[u8],
        signature_der: &[u8],
        public_key: &[u8],
    ) -> Result<bool, SignError> {
        let public_key = PublicKey::from_slice(public_key).map_err(|e| {
            SignError::Key(KeyError::InvalidPublicKey {
                key: hex::encode(public_key),
                reason: e.to_string(),
            })
        })?;
        let signature = Signature::from_der(signature_der)
            .map_err(|e| SignError::MalformedSignature(e.to_string()))?;
        let message = Message::from_digest(double_sha256(raw_transaction));

        Ok(self
            .secp
            .verify_ecdsa(&message, &signature, &public_key)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_PRIVATE_KEY: [u8; 32] = [
        20, 175, 46, 68, 8, 91, 132, 129, 57, 230, 158, 54, 186, 115, 191, 245, 121, 11, 108, 224,
        125, 96, 99, 40, 11, 156, 199, 158, 55, 199, 110, 229,
    ];

    const TEST_RAW_TX: &str = "0100000001acc6fb9ec2c3884d3a12a89e7078c83853d9b7912281cefb14bac00a2737d33a000000001976a9149203e47a16f799ded03532e3e452606fdc52007e88acffffffff01400001000000000017a9141a8b0026343166625c7475f01e48b5ede8c0252e8700000000";

    fn fixed_nonce() -> [u8; 32] {
        let mut nonce = [0u8; 32];
        for (i, byte) in nonce.iter_mut().enumerate() {
            *byte = i as u8;
        }
        nonce
    }

    fn raw_tx_with_sighash() -> Vec<u8> {
        let mut raw = hex::decode(TEST_RAW_TX).unwrap();
        raw.extend_from_slice(&[0x01, 0x00, 0x00, 0x00]);
        raw
    }

    #[test]
    fn test_fixed_nonce_signature_vector() {
        let ctx = SigningContext::with_nonce_source(NonceSource::Fixed(fixed_nonce()));
        let raw = hex::decode(TEST_RAW_TX).unwrap();

        let signature = ctx.sign(&raw, &TEST_PRIVATE_KEY).unwrap();
        assert_eq!(
            hex::encode(&signature),
            "304402206d6caac248af96f6afa7f904f550253a0f3ef3f5aa2fe6838a95b216691468e2022079efc0689138e78d29ac687bd687d7ff917d6adb6804f23fdb6bc198b86e1429"
        );
        assert_eq!(ctx.sign(&raw, &TEST_PRIVATE_KEY).unwrap(), signature);

        let public_key = ctx.derive_public_key(&TEST_PRIVATE_KEY).unwrap();
        assert!(ctx.verify(&raw, &signature, &public_key).unwrap());
    }

    #[test]
    fn test_fixed_nonce_fixes_r() {
        let ctx = SigningContext::with_nonce_source(NonceSource::Fixed(fixed_nonce()));
        let signature = ctx.sign(&raw_tx_with_sighash(), &TEST_PRIVATE_KEY).unwrap();
        assert_eq!(
            hex::encode(&signature),
            "304402206d6caac248af96f6afa7f904f550253a0f3ef3f5aa2fe6838a95b216691468e2022047987fad57773250a1b32b7deb3fd7297b6333c409ac837a4db8de5c5ae433cd"
        );
    }

    #[test]
    fn test_fixed_nonce_rejects_zero_and_overflow() {
        let raw = raw_tx_with_sighash();
        let zero = SigningContext::with_nonce_source(NonceSource::Fixed([0u8; 32]));
        assert!(matches!(
            zero.sign(&raw, &TEST_PRIVATE_KEY),
            Err(SignError::InvalidNonce)
        ));

        let overflow = SigningContext::with_nonce_source(NonceSource::Fixed([0xff; 32]));
        assert!(matches!(
            overflow.sign(&raw, &TEST_PRIVATE_KEY),
            Err(SignError::InvalidNonce)
        ));
    }

    #[test]
    fn test_random_nonce_signatures_differ_but_verify() {
        let ctx = SigningContext::new();
        let raw = raw_tx_with_sighash();
        let public_key = ctx.derive_public_key(&TEST_PRIVATE_KEY).unwrap();

        let first = ctx.sign(&raw, &TEST_PRIVATE_KEY).unwrap();
        let second = ctx.sign(&raw, &TEST_PRIVATE_KEY).unwrap();
        assert_ne!(first, second);
        assert!(ctx.verify(&raw, &first, &public_key).unwrap());
        assert!(ctx.verify(&raw, &second, &public_key).unwrap());
    }

    #[test]
    fn test_verify_rejects_other_message() {
        let ctx = SigningContext::with_nonce_source(NonceSource::Fixed(fixed_nonce()));
        let raw = raw_tx_with_sighash();
        let signature = ctx.sign(&raw, &TEST_PRIVATE_KEY).unwrap();
        let public_key = ctx.derive_public_key(&TEST_PRIVATE_KEY).unwrap();

        let mut tampered = raw.clone();
        tampered[0] = 0x02;
        assert!(!ctx.verify(&tampered, &signature, &public_key).unwrap());
    }

    #[test]
    fn test_sign_rejects_invalid_key() {
        let ctx = SigningContext::new();
        let result = ctx.sign(&raw_tx_with_sighash(), &[0u8; 32]);
        assert!(matches!(result, Err(SignError::Key(_))));
    }

    #[test]
    fn test_verify_rejects_malformed_der() {
        let ctx = SigningContext::new();
        let public_key = ctx.derive_public_key(&TEST_PRIVATE_KEY).unwrap();
        let result = ctx.verify(&raw_tx_with_sighash(), &[0x30, 0x01], &public_key);
        assert!(matches!(result, Err(SignError::MalformedSignature(_))));
    }

    #[test]
    fn test_default_nonce_source_is_random() {
        assert_eq!(NonceSource::default(), NonceSource::Random);
        assert_eq!(SigningContext::default().nonce_source(), NonceSource::Random);
    }
}
