// src/wallet/key_management.rs
//! Cryptographic key management for issuers.
//!
//! Provides the built-in signing and recovery capabilities over a secp256k1
//! key:
//! - EIP-712 digests computed by `ethers-core`
//! - recoverable ECDSA signatures (`r ‖ s ‖ v`, `v ∈ {27, 28}`)
//! - signer recovery to an Ethereum address
//!
//! Callers that keep keys elsewhere (hardware wallets, remote signers) skip
//! this module and hand their own capability to the issuer or verifier.

use crate::error::Result;
use crate::models::typed_data::TypedData;
use crate::utils::crypto::to_prefixed_hex;
use ethers::signers::{LocalWallet, Signer};
use ethers_core::types::{Address, Signature, H256};
use ethers_core::utils::to_checksum;
use k256::ecdsa::SigningKey;
use std::str::FromStr;

/// Holds one secp256k1 signing key and its Ethereum address.
///
/// # Security Notes
/// - The secret key is never exposed except through [`KeyManager::private_key_hex`]
/// - Keys are generated from the thread-local CSPRNG
#[derive(Clone)]
pub struct KeyManager {
    wallet: LocalWallet,
}

impl KeyManager {
    /// Generates a KeyManager with a fresh random key.
    pub fn new() -> Self {
        let signing_key = SigningKey::random(&mut rand::thread_rng());
        Self {
            wallet: LocalWallet::from(signing_key),
        }
    }

    /// Loads a key from 32 hex-encoded bytes, with or without `0x`.
    ///
    /// # Errors
    /// Returns `Wallet` if the hex is malformed or not a valid scalar.
    pub fn from_private_key(private_key: &str) -> Result<Self> {
        let wallet = LocalWallet::from_str(private_key)?;
        Ok(Self { wallet })
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// EIP-55 checksummed address.
    pub fn checksum_address(&self) -> String {
        to_checksum(&self.address(), None)
    }

    /// `0x`-prefixed private key.
    pub fn private_key_hex(&self) -> String {
        to_prefixed_hex(&self.wallet.signer().to_bytes())
    }

    /// Signs the EIP-712 digest of `typed_data`.
    ///
    /// # Returns
    /// `0x`-prefixed 65-byte signature (`r ‖ s ‖ v`)
    pub fn sign_typed_data(&self, typed_data: &TypedData) -> Result<String> {
        let digest = typed_data.signing_hash()?;
        let signature = self.wallet.sign_hash(H256::from(digest))?;
        Ok(to_prefixed_hex(&signature.to_vec()))
    }
}

impl Default for KeyManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Recovers the address that produced `signature` over `typed_data`.
///
/// # Errors
/// - `Encoding` if the envelope cannot be hashed
/// - `Signature` if the signature is malformed or unrecoverable
pub fn recover_typed_data_signer(typed_data: &TypedData, signature: &str) -> Result<Address> {
    let digest = typed_data.signing_hash()?;
    let signature = Signature::from_str(signature.trim())?;
    Ok(signature.recover(H256::from(digest))?)
}
