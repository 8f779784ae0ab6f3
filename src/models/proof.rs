// src/models/proof.rs
//! `EthereumEip712Signature2021` proof model.

use crate::error::{CredentialError, Result};
use crate::models::domain::DomainRecord;
use crate::models::typed_data::{TypeMap, TypedData};
use crate::utils::serialization::{from_object, merge_objects, to_object};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Proof suite identifier.
pub const PROOF_TYPE: &str = "EthereumEip712Signature2021";

/// Verification relationship the issuer's key is used for.
pub const PROOF_PURPOSE: &str = "assertionMethod";

/// Fragment appended to the issuer DID to form the verification method.
pub const VERIFICATION_METHOD_FRAGMENT: &str = "#ethereumAddress";

/// Proof members held as strings; caller overrides of them must be strings too.
const STRING_MEMBERS: [&str; 5] = ["verificationMethod", "ethereumAddress", "created", "proofPurpose", "type"];

/// Copy of the envelope parameters used at signing time.
///
/// Informational only: verification always rebuilds the envelope from the
/// credential and never reads this block.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Eip712Snapshot {
    pub domain: DomainRecord,
    pub types: TypeMap,
    pub primary_type: String,
}

impl From<&TypedData> for Eip712Snapshot {
    fn from(typed_data: &TypedData) -> Self {
        Self {
            domain: typed_data.domain.clone(),
            types: typed_data.types.clone(),
            primary_type: typed_data.primary_type.clone(),
        }
    }
}

/// Proof attached to a verifiable credential.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    pub verification_method: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethereum_address: Option<String>,

    /// ISO-8601 creation timestamp
    pub created: String,

    pub proof_purpose: String,

    #[serde(rename = "type")]
    pub proof_type: String,

    /// 0x-prefixed `r ‖ s ‖ v` signature over the EIP-712 digest
    pub proof_value: String,

    pub eip712: Eip712Snapshot,

    /// Any further fields the caller supplied on the unsigned credential's proof.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Computed proof values that callers are allowed to override.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProofDefaults {
    pub verification_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ethereum_address: Option<String>,
    pub created: String,
    pub proof_purpose: String,
    #[serde(rename = "type")]
    pub proof_type: String,
}

impl ProofDefaults {
    /// Defaults for a credential issued by `issuer_id`, created at `created`.
    pub fn new(issuer_id: &str, ethereum_address: Option<String>, created: String) -> Self {
        Self {
            verification_method: format!("{issuer_id}{VERIFICATION_METHOD_FRAGMENT}"),
            ethereum_address,
            created,
            proof_purpose: PROOF_PURPOSE.to_string(),
            proof_type: PROOF_TYPE.to_string(),
        }
    }
}

/// Assembles a proof in three ordered layers:
/// 1. computed `defaults`
/// 2. caller-supplied `overrides` (win over defaults)
/// 3. `proofValue` and the `eip712` snapshot (always computed)
///
/// Overrides of the string members (`verificationMethod`, `ethereumAddress`,
/// `created`, `proofPurpose`, `type`) must be JSON strings. Any other caller
/// member passes through unchanged into [`Proof::extra`].
///
/// # Errors
/// `TypeMismatch` for a non-string override of a string member.
pub fn merge_proof(
    defaults: &ProofDefaults,
    overrides: Option<&Map<String, Value>>,
    signature: &str,
    typed_data: &TypedData,
) -> Result<Proof> {
    let defaults = to_object(defaults, "Proof")?;
    let empty = Map::new();
    let overrides = overrides.unwrap_or(&empty);

    for member in STRING_MEMBERS {
        if let Some(value) = overrides.get(member).filter(|value| !value.is_string()) {
            return Err(CredentialError::TypeMismatch {
                type_name: "Proof".to_string(),
                field: member.to_string(),
                expected: "string".to_string(),
                value: value.to_string(),
            });
        }
    }

    let mut computed = Map::new();
    computed.insert("proofValue".to_string(), Value::String(signature.to_string()));
    computed.insert(
        "eip712".to_string(),
        serde_json::to_value(Eip712Snapshot::from(typed_data))?,
    );

    from_object(merge_objects([&defaults, overrides, &computed]))
}
