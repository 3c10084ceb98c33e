//! Ed25519 key pairs, public keys and signatures.
//!
//! Identities own a [`KeyPair`]; everything that leaves the process (bundles,
//! cosignatures, the identity file) carries only the hex-encoded public parts
//! or, for the identity file, the hex private key.

use crate::{Address, HexError, NetworkType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An Ed25519 key pair for signing.
#[derive(Clone)]
pub struct KeyPair(ed25519_dalek::SigningKey);

impl KeyPair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        KeyPair(ed25519_dalek::SigningKey::generate(&mut csprng))
    }

    /// Build a keypair from a 32-byte seed (fixtures and imports).
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        KeyPair(ed25519_dalek::SigningKey::from_bytes(seed))
    }

    /// Parse a 64-digit hex private key.
    pub fn from_private_hex(hex: &str) -> Result<Self, HexError> {
        let hex = hex.trim();
        if hex.len() != 64 {
            return Err(HexError::InvalidLength {
                expected: 64,
                actual: hex.len(),
            });
        }
        let mut seed = [0u8; 32];
        hex::decode_to_slice(hex, &mut seed).map_err(|_| HexError::InvalidHex)?;
        Ok(Self::from_seed(&seed))
    }

    /// Private key as uppercase hex (identity file format).
    pub fn private_key_hex(&self) -> String {
        hex::encode_upper(self.0.to_bytes())
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        use ed25519_dalek::Signer;
        Signature(self.0.sign(message).to_bytes())
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.verifying_key().to_bytes())
    }

    /// Public key paired with its address on `network`.
    pub fn public_account(&self, network: NetworkType) -> PublicAccount {
        PublicAccount::new(self.public_key(), network)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyPair({:?})", self.public_key())
    }
}

/// A public key for signature verification.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicKey(#[serde(with = "crate::hex_bytes")] [u8; 32]);

impl PublicKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        PublicKey(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Uppercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }

    /// Verify a signature.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        use ed25519_dalek::Verifier;
        let pk = match ed25519_dalek::VerifyingKey::from_bytes(&self.0) {
            Ok(pk) => pk,
            Err(_) => return false,
        };
        let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
        pk.verify(message, &sig).is_ok()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}..)", &self.to_hex()[..16])
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// An Ed25519 signature (64 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(#[serde(with = "crate::hex_bytes")] [u8; 64]);

impl Signature {
    /// Create a zero/placeholder signature for testing.
    pub fn zero() -> Self {
        Signature([0u8; 64])
    }

    /// Get signature as byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", &hex::encode(self.0)[..16])
    }
}

/// Public key together with the address it controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicAccount {
    pub public_key: PublicKey,
    pub address: Address,
}

impl PublicAccount {
    /// Derive the account of `public_key` on `network`.
    pub fn new(public_key: PublicKey, network: NetworkType) -> Self {
        Self {
            public_key,
            address: Address::from_public_key(&public_key, network),
        }
    }
}
