//! Signing credential for ledger writes.
//!
//! The secp256k1 key arrives through configuration (never generated or
//! persisted here); this module derives the EIP-55 address and signs
//! transaction hashes.

use anyhow::{Context, Result};
use k256::ecdsa::{SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};
use std::fmt;
use tracing::info;

/// `(r, s, recovery_id)` of a prehash signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub recovery_id: u8,
}

/// An in-memory signing handle.
#[derive(Clone)]
pub struct Wallet {
    signing_key: SigningKey,
    /// Ethereum address (checksummed).
    pub address: String,
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl Wallet {
    /// Build a wallet from a hex private key (with or without `0x`).
    pub fn from_private_key(private_key: &str) -> Result<Self> {
        let key_hex = private_key.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);
        let key_bytes = hex::decode(key_hex).context("Invalid hex in private key")?;

        let signing_key =
            SigningKey::from_slice(&key_bytes).context("Invalid private key bytes")?;
        let address = derive_address(signing_key.verifying_key());

        info!("Loaded signing wallet: {}", address);

        Ok(Self {
            signing_key,
            address,
        })
    }

    /// Sign a 32-byte hash, returning a recoverable signature.
    pub fn sign_prehash(&self, hash: &[u8; 32]) -> Result<RecoverableSignature> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(hash)
            .context("Signing failed")?;

        let bytes = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);

        Ok(RecoverableSignature {
            r,
            s,
            recovery_id: recovery_id.to_byte(),
        })
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        self.signing_key.verifying_key()
    }
}

/// Derive an Ethereum address from a public key.
fn derive_address(verifying_key: &VerifyingKey) -> String {
    // Uncompressed public key (65 bytes: 0x04 || x || y)
    let pubkey = verifying_key.to_encoded_point(false);

    // Keccak256 of the public key without the 0x04 prefix; last 20 bytes.
    let hash = Keccak256::digest(&pubkey.as_bytes()[1..]);
    let address = format!("0x{}", hex::encode(&hash[12..]));

    checksum_address(&address)
}

/// EIP-55 checksum an Ethereum address.
pub fn checksum_address(address: &str) -> String {
    let addr = address.strip_prefix("0x").unwrap_or(address).to_lowercase();
    let hash_hex = hex::encode(Keccak256::digest(addr.as_bytes()));

    let mut checksummed = String::with_capacity(42);
    checksummed.push_str("0x");

    for (c, nibble) in addr.chars().zip(hash_hex.chars()) {
        if c.is_ascii_alphabetic() && nibble.to_digit(16).unwrap_or(0) >= 8 {
            checksummed.push(c.to_ascii_uppercase());
        } else {
            checksummed.push(c);
        }
    }

    checksummed
}
