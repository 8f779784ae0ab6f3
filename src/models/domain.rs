// src/models/domain.rs
//! EIP-712 signing domain.
//!
//! A [`SigningDomain`] binds every signature to one application name, version,
//! chain and verifying contract, preventing a credential signed for one
//! deployment from being replayed against another.

use crate::error::{CredentialError, Result};
use crate::utils::crypto::{hash_data, parse_address, to_prefixed_hex};
use ethers_core::abi::{encode, Token};
use ethers_core::types::{Address, U256};
use serde::{Deserialize, Serialize};

/// Canonical type encoding of the only domain shape this crate supports.
pub const DOMAIN_ENCODING: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// Plain projection of a signing domain, serialized with the exact keys EIP-712
/// tooling expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRecord {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: String,
}

/// Immutable signing-domain parameters.
///
/// The verifying contract is validated once at construction; the string form
/// given by the caller is echoed back unchanged in every [`DomainRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DomainRecord", into = "DomainRecord")]
pub struct SigningDomain {
    name: String,
    version: String,
    chain_id: u64,
    verifying_contract: String,
    contract_address: Address,
}

impl SigningDomain {
    /// Creates a signing domain.
    ///
    /// # Errors
    /// Returns `InvalidAddress` if `verifying_contract` is not a 20-byte hex address.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: u64,
        verifying_contract: &str,
    ) -> Result<Self> {
        let contract_address = parse_address(verifying_contract)?;
        Ok(Self {
            name: name.into(),
            version: version.into(),
            chain_id,
            verifying_contract: verifying_contract.to_string(),
            contract_address,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn verifying_contract(&self) -> &str {
        &self.verifying_contract
    }

    /// Returns the `{name, version, chainId, verifyingContract}` record placed in envelopes.
    pub fn domain_record(&self) -> DomainRecord {
        DomainRecord {
            name: self.name.clone(),
            version: self.version.clone(),
            chain_id: self.chain_id,
            verifying_contract: self.verifying_contract.clone(),
        }
    }

    /// Computes the EIP-712 domain separator:
    /// `keccak256(abi.encode(typeHash, keccak256(name), keccak256(version), chainId, verifyingContract))`.
    ///
    /// Informational only. Signing re-derives the domain from the record embedded
    /// in each envelope.
    pub fn domain_separator(&self) -> [u8; 32] {
        let tokens = [
            Token::FixedBytes(hash_data(DOMAIN_ENCODING.as_bytes()).to_vec()),
            Token::FixedBytes(hash_data(self.name.as_bytes()).to_vec()),
            Token::FixedBytes(hash_data(self.version.as_bytes()).to_vec()),
            Token::Uint(U256::from(self.chain_id)),
            Token::Address(self.contract_address),
        ];
        hash_data(&encode(&tokens))
    }

    /// The domain separator as `0x`-prefixed lowercase hex.
    pub fn domain_separator_hex(&self) -> String {
        to_prefixed_hex(&self.domain_separator())
    }
}

impl TryFrom<DomainRecord> for SigningDomain {
    type Error = CredentialError;

    fn try_from(record: DomainRecord) -> Result<Self> {
        Self::new(record.name, record.version, record.chain_id, &record.verifying_contract)
    }
}

impl From<SigningDomain> for DomainRecord {
    fn from(domain: SigningDomain) -> Self {
        domain.domain_record()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers_core::types::transaction::eip712::EIP712Domain;
    use serde_json::json;

    const CONTRACT: &str = "0xa533e32144b5be3f76446f47696bbe0764d5339b";

    fn krebit() -> SigningDomain {
        SigningDomain::new("Krebit", "0.1", 4, CONTRACT).unwrap()
    }

    #[test]
    fn test_domain_record_keys() {
        let record = serde_json::to_value(krebit().domain_record()).unwrap();
        assert_eq!(
            record,
            json!({
                "name": "Krebit",
                "version": "0.1",
                "chainId": 4,
                "verifyingContract": CONTRACT,
            })
        );
    }

    #[test]
    fn test_separator_matches_ethers() {
        let domain = krebit();
        let reference = EIP712Domain {
            name: Some("Krebit".to_string()),
            version: Some("0.1".to_string()),
            chain_id: Some(U256::from(4u64)),
            verifying_contract: Some(parse_address(CONTRACT).unwrap()),
            salt: None,
        };
        assert_eq!(domain.domain_separator(), reference.separator());
    }

    #[test]
    fn test_separator_is_deterministic_and_domain_bound() {
        let domain = krebit();
        assert_eq!(domain.domain_separator_hex(), krebit().domain_separator_hex());
        assert_eq!(domain.domain_separator_hex().len(), 66);

        let other_chain = SigningDomain::new("Krebit", "0.1", 1, CONTRACT).unwrap();
        assert_ne!(domain.domain_separator(), other_chain.domain_separator());
    }

    #[test]
    fn test_checksummed_contract_hashes_the_same() {
        let checksummed =
            SigningDomain::new("Krebit", "0.1", 4, "0xA533E32144b5Be3F76446f47696BbE0764D5339b").unwrap();
        assert_eq!(checksummed.domain_separator(), krebit().domain_separator());
    }

    #[test]
    fn test_deserialize_validates_contract() {
        let bad = json!({ "name": "Krebit", "version": "0.1", "chainId": 4, "verifyingContract": "0x12" });
        assert!(serde_json::from_value::<SigningDomain>(bad).is_err());

        let good: SigningDomain = serde_json::from_value(serde_json::to_value(krebit()).unwrap()).unwrap();
        assert_eq!(good, krebit());
    }
}
