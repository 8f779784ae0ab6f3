// src/models/credential.rs
//! Verifiable Credential data models.
//!
//! Two JSON shapes of the same credential are supported:
//!
//! - [`W3cCredential`] follows the [W3C Verifiable Credentials Data Model](https://www.w3.org/TR/vc-data-model/):
//!   array-valued `@context` and `type`.
//! - [`Eip712Credential`] renames those fields to `_context` and `_type` and
//!   flattens them to comma-joined strings, which is what Solidity-side
//!   verifiers can hash directly.
//!
//! Both are extensible: unknown top-level fields are kept in `extra` and
//! survive a round trip untouched.

use crate::models::proof::Proof;
use crate::services::type_registry::CredentialEncoding;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

/// Base JSON-LD context of every W3C credential.
pub const DEFAULT_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";

/// JSON-LD context of the Ethereum EIP-712 Signature 2021 suite.
pub const EIP712_CONTEXT: &str =
    "https://raw.githubusercontent.com/w3c-ccg/ethereum-eip712-signature-2021-spec/main/contexts/v1/index.json";

/// Default credential type literal.
pub const DEFAULT_VC_TYPE: &str = "VerifiableCredential";

/// The entity claiming authorship of a credential.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Issuer {
    /// Issuer DID, e.g. `did:ethr:0x...`
    pub id: String,

    /// Ethereum address of the issuer's signing key, when published on the credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethereum_address: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Issuer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ethereum_address: None,
            extra: Map::new(),
        }
    }

    pub fn with_ethereum_address(mut self, address: impl Into<String>) -> Self {
        self.ethereum_address = Some(address.into());
        self
    }
}

/// Schema reference of a W3C credential (`{id, type}`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CredentialSchema {
    pub id: String,
    #[serde(rename = "type")]
    pub schema_type: String,
}

/// Schema reference of an EIP-712 credential (`{id, _type}`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Eip712CredentialSchema {
    pub id: String,
    #[serde(rename = "_type")]
    pub schema_type: String,
}

/// A credential in W3C JSON-LD form.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct W3cCredential {
    #[serde(rename = "@context")]
    pub context: Vec<String>,

    #[serde(rename = "type")]
    pub credential_type: Vec<String>,

    pub id: String,

    pub issuer: Issuer,

    /// Application-specific claims; shape described by the caller's `CredentialSubject` type.
    pub credential_subject: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_schema: Option<CredentialSchema>,

    /// ISO-8601 issuance timestamp
    pub issuance_date: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,

    /// Caller-supplied proof fields; they override computed proof defaults when signing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Map<String, Value>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A credential in the EIP-712 scalar-string form.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Eip712Credential {
    /// Comma-joined contexts, see [`join_values`]
    #[serde(rename = "_context")]
    pub context: String,

    /// Comma-joined credential types
    #[serde(rename = "_type")]
    pub credential_type: String,

    pub id: String,

    pub issuer: Issuer,

    pub credential_subject: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_schema: Option<Eip712CredentialSchema>,

    pub issuance_date: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Map<String, Value>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Joins JSON-LD contexts or types into the comma-separated form used by [`Eip712Credential`].
pub fn join_values<S: AsRef<str>>(values: &[S]) -> String {
    values.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(",")
}

/// Common view over both credential shapes.
///
/// The associated [`CredentialEncoding`] selects the fixed type table a
/// credential is hashed against, so builders, issuers and verifiers are
/// written once for both shapes.
pub trait CredentialPayload: Serialize + DeserializeOwned + Clone {
    const ENCODING: CredentialEncoding;

    fn issuer(&self) -> &Issuer;

    /// Proof fields supplied on the unsigned credential, if any.
    fn proof(&self) -> Option<&Map<String, Value>>;

    /// Removes and returns the caller-supplied proof fields.
    fn take_proof(&mut self) -> Option<Map<String, Value>>;
}

impl CredentialPayload for W3cCredential {
    const ENCODING: CredentialEncoding = CredentialEncoding::W3c;

    fn issuer(&self) -> &Issuer {
        &self.issuer
    }

    fn proof(&self) -> Option<&Map<String, Value>> {
        self.proof.as_ref()
    }

    fn take_proof(&mut self) -> Option<Map<String, Value>> {
        self.proof.take()
    }
}

impl CredentialPayload for Eip712Credential {
    const ENCODING: CredentialEncoding = CredentialEncoding::Eip712;

    fn issuer(&self) -> &Issuer {
        &self.issuer
    }

    fn proof(&self) -> Option<&Map<String, Value>> {
        self.proof.as_ref()
    }

    fn take_proof(&mut self) -> Option<Map<String, Value>> {
        self.proof.take()
    }
}

/// A credential with its attached proof.
///
/// Serializes as the credential's own fields plus a `proof` member.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(bound = "C: CredentialPayload")]
pub struct VerifiableCredential<C> {
    #[serde(flatten)]
    pub credential: C,
    pub proof: Proof,
}
