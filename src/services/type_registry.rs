// src/services/type_registry.rs
//! Fixed EIP-712 type tables for verifiable credentials.
//!
//! Each [`CredentialEncoding`] has its own root `VerifiableCredential` and
//! `CredentialSchema` types. Callers describe only their application-specific
//! shapes (`CredentialSubject`, `Issuer`, nested structs) and
//! [`compose_types`] merges them over the fixed table.

use crate::error::{CredentialError, Result};
use crate::models::typed_data::{TypeField, TypeMap, TypeTag, EIP712_DOMAIN_TYPE};
use once_cell::sync::Lazy;

/// Primary type of every credential envelope.
pub const VERIFIABLE_CREDENTIAL_PRIMARY_TYPE: &str = "VerifiableCredential";

pub const CREDENTIAL_SCHEMA_TYPE: &str = "CredentialSchema";
pub const CREDENTIAL_SUBJECT_TYPE: &str = "CredentialSubject";
pub const ISSUER_TYPE: &str = "Issuer";
pub const PROOF_TYPE_NAME: &str = "Proof";

/// Type names callers may not redefine.
pub const RESERVED_TYPES: [&str; 3] = [
    EIP712_DOMAIN_TYPE,
    VERIFIABLE_CREDENTIAL_PRIMARY_TYPE,
    CREDENTIAL_SCHEMA_TYPE,
];

/// Field-naming convention of a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialEncoding {
    /// JSON-LD shape: `@context` and `type` as string arrays.
    W3c,
    /// Scalar shape: `_context` and `_type` as plain strings.
    Eip712,
}

impl CredentialEncoding {
    /// Name of the field holding a type literal in this encoding.
    pub fn type_field_name(self) -> &'static str {
        match self {
            CredentialEncoding::W3c => "type",
            CredentialEncoding::Eip712 => "_type",
        }
    }

    fn context_field(self) -> TypeField {
        match self {
            CredentialEncoding::W3c => TypeField::new("@context", TypeTag::StringArray),
            CredentialEncoding::Eip712 => TypeField::new("_context", TypeTag::String),
        }
    }

    fn credential_type_field(self) -> TypeField {
        match self {
            CredentialEncoding::W3c => TypeField::new("type", TypeTag::StringArray),
            CredentialEncoding::Eip712 => TypeField::new("_type", TypeTag::String),
        }
    }
}

/// `EIP712Domain` fields.
pub fn domain_type() -> Vec<TypeField> {
    vec![
        TypeField::new("name", TypeTag::String),
        TypeField::new("version", TypeTag::String),
        TypeField::new("chainId", TypeTag::Uint256),
        TypeField::new("verifyingContract", TypeTag::Address),
    ]
}

/// Root `VerifiableCredential` fields, in hashing order.
pub fn credential_type(encoding: CredentialEncoding) -> Vec<TypeField> {
    vec![
        encoding.context_field(),
        encoding.credential_type_field(),
        TypeField::new("id", TypeTag::String),
        TypeField::reference("issuer", ISSUER_TYPE),
        TypeField::reference("credentialSubject", CREDENTIAL_SUBJECT_TYPE),
        TypeField::reference("credentialSchema", CREDENTIAL_SCHEMA_TYPE),
        TypeField::new("issuanceDate", TypeTag::String),
        TypeField::new("expirationDate", TypeTag::String),
    ]
}

/// `CredentialSchema` fields: `{id, type}` or `{id, _type}`.
pub fn credential_schema_type(encoding: CredentialEncoding) -> Vec<TypeField> {
    vec![
        TypeField::new("id", TypeTag::String),
        TypeField::new(encoding.type_field_name(), TypeTag::String),
    ]
}

/// `Proof` fields.
///
/// Proofs are never part of the signed payload; this table is published for
/// callers that want to describe a proof to other EIP-712 tooling.
pub fn proof_type(encoding: CredentialEncoding) -> Vec<TypeField> {
    vec![
        TypeField::new("verificationMethod", TypeTag::String),
        TypeField::new("ethereumAddress", TypeTag::Address),
        TypeField::new("created", TypeTag::String),
        TypeField::new("proofPurpose", TypeTag::String),
        TypeField::new(encoding.type_field_name(), TypeTag::String),
    ]
}

fn build_base_types(encoding: CredentialEncoding) -> TypeMap {
    let mut types = TypeMap::new();
    types.insert(EIP712_DOMAIN_TYPE, domain_type());
    types.insert(VERIFIABLE_CREDENTIAL_PRIMARY_TYPE, credential_type(encoding));
    types.insert(CREDENTIAL_SCHEMA_TYPE, credential_schema_type(encoding));
    types
}

static W3C_BASE_TYPES: Lazy<TypeMap> = Lazy::new(|| build_base_types(CredentialEncoding::W3c));
static EIP712_BASE_TYPES: Lazy<TypeMap> = Lazy::new(|| build_base_types(CredentialEncoding::Eip712));

/// The fixed `{EIP712Domain, VerifiableCredential, CredentialSchema}` table of an encoding.
pub fn base_types(encoding: CredentialEncoding) -> &'static TypeMap {
    match encoding {
        CredentialEncoding::W3c => &W3C_BASE_TYPES,
        CredentialEncoding::Eip712 => &EIP712_BASE_TYPES,
    }
}

/// Merges caller-supplied types over the fixed table of `encoding`.
///
/// # Errors
/// Returns `ReservedType` if `subject_types` redefines one of [`RESERVED_TYPES`].
pub fn compose_types(encoding: CredentialEncoding, subject_types: &TypeMap) -> Result<TypeMap> {
    let mut types = base_types(encoding).clone();
    for (name, fields) in subject_types.iter() {
        if RESERVED_TYPES.contains(&name) {
            return Err(CredentialError::ReservedType(name.to_string()));
        }
        types.insert(name, fields.to_vec());
    }
    log::debug!(
        "composed {:?} type map: {}",
        encoding,
        types.names().collect::<Vec<_>>().join(", ")
    );
    Ok(types)
}

/// Issuer and subject types of the Krebit identity-attestation schema.
///
/// A subject carries an encrypted claim together with the trust score, stake
/// and validity window (`nbf`/`exp`, Unix seconds) of the attestation.
pub fn krebit_types() -> TypeMap {
    let mut types = TypeMap::new();
    types.insert(
        ISSUER_TYPE,
        vec![
            TypeField::new("id", TypeTag::String),
            TypeField::new("ethereumAddress", TypeTag::Address),
        ],
    );
    types.insert(
        CREDENTIAL_SUBJECT_TYPE,
        vec![
            TypeField::new("id", TypeTag::String),
            TypeField::new("ethereumAddress", TypeTag::Address),
            TypeField::new("_type", TypeTag::String),
            TypeField::new("value", TypeTag::String),
            TypeField::new("encrypted", TypeTag::String),
            TypeField::new("trust", TypeTag::Uint8),
            TypeField::new("stake", TypeTag::Uint256),
            TypeField::new("nbf", TypeTag::Uint256),
            TypeField::new("exp", TypeTag::Uint256),
        ],
    );
    types
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field_names(fields: &[TypeField]) -> Vec<&str> {
        fields.iter().map(|field| field.name.as_str()).collect()
    }

    #[test]
    fn test_root_type_differs_only_in_context_and_type() {
        let w3c = credential_type(CredentialEncoding::W3c);
        let eip712 = credential_type(CredentialEncoding::Eip712);

        assert_eq!(field_names(&w3c)[..2], ["@context", "type"]);
        assert_eq!(field_names(&eip712)[..2], ["_context", "_type"]);
        assert_eq!(w3c[0].type_tag, TypeTag::StringArray);
        assert_eq!(eip712[0].type_tag, TypeTag::String);
        assert_eq!(w3c[2..], eip712[2..]);
        assert_eq!(
            field_names(&w3c)[2..],
            ["id", "issuer", "credentialSubject", "credentialSchema", "issuanceDate", "expirationDate"]
        );
    }

    #[test]
    fn test_schema_and_proof_types() {
        assert_eq!(field_names(&credential_schema_type(CredentialEncoding::W3c)), ["id", "type"]);
        assert_eq!(field_names(&credential_schema_type(CredentialEncoding::Eip712)), ["id", "_type"]);
        assert_eq!(
            serde_json::to_value(proof_type(CredentialEncoding::Eip712)).unwrap()[1],
            json!({ "name": "ethereumAddress", "type": "address" })
        );
    }

    #[test]
    fn test_compose_adds_subject_types() {
        let types = compose_types(CredentialEncoding::Eip712, &krebit_types()).unwrap();
        assert_eq!(
            types.names().collect::<Vec<_>>(),
            ["CredentialSchema", "CredentialSubject", "EIP712Domain", "Issuer", "VerifiableCredential"]
        );
        assert!(types.validate(VERIFIABLE_CREDENTIAL_PRIMARY_TYPE).is_ok());
        assert!(!types.contains(PROOF_TYPE_NAME));
    }

    #[test]
    fn test_compose_rejects_reserved_names() {
        for reserved in RESERVED_TYPES {
            let mut subject_types = krebit_types();
            subject_types.insert(reserved, vec![TypeField::new("id", TypeTag::String)]);
            assert!(matches!(
                compose_types(CredentialEncoding::W3c, &subject_types),
                Err(CredentialError::ReservedType(name)) if name == reserved
            ));
        }
    }

    #[test]
    fn test_base_types_are_shared() {
        assert!(std::ptr::eq(
            base_types(CredentialEncoding::W3c),
            base_types(CredentialEncoding::W3c)
        ));
        assert_ne!(base_types(CredentialEncoding::W3c), base_types(CredentialEncoding::Eip712));
    }
}
