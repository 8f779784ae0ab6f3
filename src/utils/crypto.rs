// src/utils/crypto.rs
//! Hashing and address helpers.
//!
//! Uses Keccak-256 (Ethereum's standard hash function) for all hashing, and
//! treats addresses as 20-byte values so that comparisons ignore letter case
//! and EIP-55 checksums.

use crate::error::{CredentialError, Result};
use ethers_core::types::Address;
use ethers_core::utils::{hex, keccak256};
use std::str::FromStr;

/// Computes a Keccak-256 hash of the input data (Ethereum-compatible).
///
/// # Arguments
/// * `data` - Binary data to hash (as bytes slice)
///
/// # Returns
/// Fixed-size 32-byte array (`[u8; 32]`) containing the hash.
pub fn hash_data(data: &[u8]) -> [u8; 32] {
    keccak256(data)
}

/// Encodes bytes as lowercase hex with a `0x` prefix.
pub fn to_prefixed_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parses an address string, with or without `0x`, in any letter case.
///
/// # Errors
/// Returns [`CredentialError::InvalidAddress`] if the input is not 20 hex-encoded bytes.
pub fn parse_address(address: &str) -> Result<Address> {
    Address::from_str(address.trim()).map_err(|_| CredentialError::InvalidAddress(address.to_string()))
}

/// Reads an `address`-typed message value as a big-endian number of at most
/// 20 bytes, left-padding short values (`"acc1"` becomes `0x00…acc1`).
///
/// # Errors
/// Returns [`CredentialError::InvalidAddress`] for empty, non-hex or over-long input.
pub fn parse_padded_address(value: &str) -> Result<Address> {
    let invalid = || CredentialError::InvalidAddress(value.to_string());
    let digits = value.trim();
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits);
    if digits.is_empty() || digits.len() > 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    Address::from_str(&format!("{digits:0>40}")).map_err(|_| invalid())
}

/// Compares two address strings as addresses, ignoring case and checksum.
///
/// An address that does not parse never matches anything.
pub fn addresses_match(claimed: &str, recovered: &str) -> bool {
    match (parse_address(claimed), parse_address(recovered)) {
        (Ok(claimed), Ok(recovered)) => claimed == recovered,
        (Err(err), _) | (_, Err(err)) => {
            log::warn!("address comparison rejected: {err}");
            false
        }
    }
}
