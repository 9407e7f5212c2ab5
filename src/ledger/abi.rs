//! Minimal Solidity ABI codec for the handful of shapes the contracts use.
//!
//! Encodes `address`, `uint256` and `string` arguments with head/tail layout
//! and decodes `uint256`, `bool`, `string[]` and the two tuple returns.
//! Integers are carried as `u128`; a word with any of its top 16 bytes set is
//! rejected rather than truncated.

use crate::types::{InventoryRecord, LoanTerms};
use sha3::{Digest, Keccak256};
use thiserror::Error;

const WORD: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AbiError {
    #[error("return data truncated: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },
    #[error("value does not fit in 128 bits")]
    Overflow,
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
}

/// A call argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Address(String),
    Uint(u128),
    String(String),
}

/// First four bytes of the Keccak-256 hash of a function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Encode `selector || args` for `signature`.
pub fn encode_call(signature: &str, args: &[Token]) -> Result<Vec<u8>, AbiError> {
    let head_len = args.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for arg in args {
        match arg {
            Token::Address(address) => head.extend_from_slice(&address_word(address)?),
            Token::Uint(value) => head.extend_from_slice(&uint_word(*value)),
            Token::String(text) => {
                head.extend_from_slice(&uint_word((head_len + tail.len()) as u128));
                tail.extend_from_slice(&uint_word(text.len() as u128));
                tail.extend_from_slice(&pad_right(text.as_bytes()));
            }
        }
    }

    let mut out = Vec::with_capacity(4 + head.len() + tail.len());
    out.extend_from_slice(&selector(signature));
    out.extend_from_slice(&head);
    out.extend_from_slice(&tail);
    Ok(out)
}

/// Parse a `0x`-prefixed 20-byte hex address.
pub fn parse_address(address: &str) -> Result<[u8; 20], AbiError> {
    let hex_part = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| AbiError::InvalidAddress(address.to_string()))?;
    let bytes = hex::decode(hex_part).map_err(|_| AbiError::InvalidAddress(address.to_string()))?;
    bytes
        .try_into()
        .map_err(|_| AbiError::InvalidAddress(address.to_string()))
}

fn address_word(address: &str) -> Result<[u8; WORD], AbiError> {
    let bytes = parse_address(address)?;
    let mut word = [0u8; WORD];
    word[12..].copy_from_slice(&bytes);
    Ok(word)
}

fn uint_word(value: u128) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

fn pad_right(bytes: &[u8]) -> Vec<u8> {
    let mut padded = bytes.to_vec();
    let rem = padded.len() % WORD;
    if rem != 0 {
        padded.resize(padded.len() + WORD - rem, 0);
    }
    padded
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn word_at(data: &[u8], offset: usize) -> Result<&[u8], AbiError> {
    let end = offset.checked_add(WORD).ok_or(AbiError::Overflow)?;
    data.get(offset..end).ok_or(AbiError::Truncated {
        need: end,
        have: data.len(),
    })
}

/// Decode the `uint256` at byte `offset`.
pub fn decode_uint_at(data: &[u8], offset: usize) -> Result<u128, AbiError> {
    let word = word_at(data, offset)?;
    if word[..16].iter().any(|b| *b != 0) {
        return Err(AbiError::Overflow);
    }
    let mut low = [0u8; 16];
    low.copy_from_slice(&word[16..]);
    Ok(u128::from_be_bytes(low))
}

/// Decode a single `uint256` return value.
pub fn decode_uint(data: &[u8]) -> Result<u128, AbiError> {
    decode_uint_at(data, 0)
}

fn decode_offset(data: &[u8], offset: usize) -> Result<usize, AbiError> {
    usize::try_from(decode_uint_at(data, offset)?).map_err(|_| AbiError::Overflow)
}

/// Decode a `string` whose length word starts at byte `offset`.
fn decode_string_at(data: &[u8], offset: usize) -> Result<String, AbiError> {
    let len = decode_offset(data, offset)?;
    let start = offset.checked_add(WORD).ok_or(AbiError::Overflow)?;
    let end = start.checked_add(len).ok_or(AbiError::Overflow)?;
    let bytes = data.get(start..end).ok_or(AbiError::Truncated {
        need: end,
        have: data.len(),
    })?;
    String::from_utf8(bytes.to_vec()).map_err(|_| AbiError::InvalidUtf8)
}

/// Decode a single `string[]` return value.
pub fn decode_string_array(data: &[u8]) -> Result<Vec<String>, AbiError> {
    let array_start = decode_offset(data, 0)?;
    let count = decode_offset(data, array_start)?;
    let elements_start = array_start.checked_add(WORD).ok_or(AbiError::Overflow)?;

    (0..count)
        .map(|i| {
            let slot = i
                .checked_mul(WORD)
                .and_then(|head| elements_start.checked_add(head))
                .ok_or(AbiError::Overflow)?;
            let relative = decode_offset(data, slot)?;
            let start = elements_start.checked_add(relative).ok_or(AbiError::Overflow)?;
            decode_string_at(data, start)
        })
        .collect()
}

/// Decode `tuple(string item, uint256 quantity, uint256 costBasis, uint256 lastUpdated)`.
pub fn decode_inventory(data: &[u8]) -> Result<InventoryRecord, AbiError> {
    let tuple_start = decode_offset(data, 0)?;
    let item_offset = decode_offset(data, tuple_start)?;
    let field = |n: usize| tuple_start.checked_add(n * WORD).ok_or(AbiError::Overflow);
    let item_start = tuple_start.checked_add(item_offset).ok_or(AbiError::Overflow)?;

    Ok(InventoryRecord {
        item: decode_string_at(data, item_start)?,
        quantity: decode_uint_at(data, field(1)?)?,
        cost_basis: decode_uint_at(data, field(2)?)?,
        last_updated: decode_uint_at(data, field(3)?)?,
    })
}

/// Decode `(bool eligible, tuple(uint256 maxAmount, uint256 interestRate, uint256 duration))`.
///
/// The inner tuple is static, so all four words sit inline.
pub fn decode_eligibility(data: &[u8]) -> Result<LoanTerms, AbiError> {
    let eligible = decode_uint_at(data, 0)? != 0;
    Ok(LoanTerms {
        eligible,
        max_amount: decode_uint_at(data, WORD)?,
        interest_rate: decode_uint_at(data, 2 * WORD)?,
        duration_seconds: decode_uint_at(data, 3 * WORD)?,
    })
}
