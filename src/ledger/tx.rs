//! EIP-155 legacy transactions: RLP encoding and signing.

use crate::identity::Wallet;
use anyhow::Result;
use sha3::{Digest, Keccak256};

/// An unsigned legacy transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub to: [u8; 20],
    pub value: u128,
    pub data: Vec<u8>,
    pub chain_id: u64,
}

impl LegacyTransaction {
    /// RLP payload hashed for signing: the six fields plus `chain_id, 0, 0`.
    pub fn signing_payload(&self) -> Vec<u8> {
        rlp_list(&[
            rlp_uint(self.nonce as u128),
            rlp_uint(self.gas_price),
            rlp_uint(self.gas_limit as u128),
            rlp_bytes(&self.to),
            rlp_uint(self.value),
            rlp_bytes(&self.data),
            rlp_uint(self.chain_id as u128),
            rlp_uint(0),
            rlp_uint(0),
        ])
    }

    pub fn signing_hash(&self) -> [u8; 32] {
        Keccak256::digest(self.signing_payload()).into()
    }

    /// Sign and return the raw transaction bytes for `eth_sendRawTransaction`.
    pub fn sign(&self, wallet: &Wallet) -> Result<Vec<u8>> {
        let signature = wallet.sign_prehash(&self.signing_hash())?;
        let v = signature.recovery_id as u128 + 35 + 2 * self.chain_id as u128;

        Ok(rlp_list(&[
            rlp_uint(self.nonce as u128),
            rlp_uint(self.gas_price),
            rlp_uint(self.gas_limit as u128),
            rlp_bytes(&self.to),
            rlp_uint(self.value),
            rlp_bytes(&self.data),
            rlp_uint(v),
            rlp_bytes(strip_leading_zeros(&signature.r)),
            rlp_bytes(strip_leading_zeros(&signature.s)),
        ]))
    }
}

/// Keccak-256 of the raw transaction, as the node reports it.
pub fn transaction_hash(raw: &[u8]) -> String {
    format!("0x{}", hex::encode(Keccak256::digest(raw)))
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[first..]
}

fn rlp_length_prefix(len: usize, short_base: u8, long_base: u8) -> Vec<u8> {
    if len < 56 {
        vec![short_base + len as u8]
    } else {
        let len_bytes = (len as u64).to_be_bytes();
        let len_bytes = strip_leading_zeros(&len_bytes);
        let mut prefix = vec![long_base + len_bytes.len() as u8];
        prefix.extend_from_slice(len_bytes);
        prefix
    }
}

pub(crate) fn rlp_bytes(bytes: &[u8]) -> Vec<u8> {
    if bytes.len() == 1 && bytes[0] < 0x80 {
        return bytes.to_vec();
    }
    let mut out = rlp_length_prefix(bytes.len(), 0x80, 0xb7);
    out.extend_from_slice(bytes);
    out
}

pub(crate) fn rlp_uint(value: u128) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    rlp_bytes(strip_leading_zeros(&bytes))
}

pub(crate) fn rlp_list(items: &[Vec<u8>]) -> Vec<u8> {
    let payload_len: usize = items.iter().map(Vec::len).sum();
    let mut out = rlp_length_prefix(payload_len, 0xc0, 0xf7);
    for item in items {
        out.extend_from_slice(item);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

    #[test]
    fn rlp_reference_vectors() {
        assert_eq!(rlp_bytes(b"dog"), hex::decode("83646f67").unwrap());
        assert_eq!(rlp_bytes(b""), vec![0x80]);
        assert_eq!(rlp_uint(0), vec![0x80]);
        assert_eq!(rlp_uint(15), vec![0x0f]);
        assert_eq!(rlp_uint(1024), hex::decode("820400").unwrap());
        assert_eq!(
            rlp_list(&[rlp_bytes(b"cat"), rlp_bytes(b"dog")]),
            hex::decode("c88363617483646f67").unwrap()
        );
        assert_eq!(rlp_list(&[]), vec![0xc0]);

        let long = vec![b'a'; 56];
        let encoded = rlp_bytes(&long);
        assert_eq!(&encoded[..2], &[0xb8, 56]);
    }

    fn eip155_example() -> LegacyTransaction {
        LegacyTransaction {
            nonce: 9,
            gas_price: 20_000_000_000,
            gas_limit: 21_000,
            to: [0x35; 20],
            value: 1_000_000_000_000_000_000,
            data: Vec::new(),
            chain_id: 1,
        }
    }

    #[test]
    fn eip155_signing_hash() {
        let tx = eip155_example();
        assert_eq!(
            hex::encode(tx.signing_payload()),
            "ec098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000080018080"
        );
        assert_eq!(
            hex::encode(tx.signing_hash()),
            "daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
        );
    }

    #[test]
    fn signed_transaction_recovers_to_wallet() {
        let wallet = Wallet::from_private_key(
            "0x4646464646464646464646464646464646464646464646464646464646464646",
        )
        .unwrap();
        let tx = eip155_example();
        let raw = tx.sign(&wallet).unwrap();

        // Same unsigned fields, then v/r/s.
        let signature = wallet.sign_prehash(&tx.signing_hash()).unwrap();
        let v = 35 + 2 + signature.recovery_id;
        assert!(v == 37 || v == 38);
        assert_eq!(raw[0], 0xf8);

        let mut rs = [0u8; 64];
        rs[..32].copy_from_slice(&signature.r);
        rs[32..].copy_from_slice(&signature.s);
        let sig = Signature::from_slice(&rs).unwrap();
        let recid = RecoveryId::from_byte(signature.recovery_id).unwrap();
        let recovered =
            VerifyingKey::recover_from_prehash(&tx.signing_hash(), &sig, recid).unwrap();
        assert_eq!(&recovered, wallet.verifying_key());
        assert_eq!(wallet.address, "0x9d8A62f656a8d1615C1294fd71e9CFb3E4855A4F");
    }

    #[test]
    fn transaction_hash_is_prefixed_keccak() {
        let hash = transaction_hash(&[0xc0]);
        assert!(hash.starts_with("0x"));
        assert_eq!(hash.len(), 66);
    }
}
