// src/services/typed_data_builder.rs
//! Assembles EIP-712 envelopes for credentials.

use crate::error::Result;
use crate::models::credential::CredentialPayload;
use crate::models::domain::SigningDomain;
use crate::models::typed_data::{TypeField, TypeMap, TypedData};
use crate::services::type_registry::{compose_types, ISSUER_TYPE, VERIFIABLE_CREDENTIAL_PRIMARY_TYPE};
use crate::utils::serialization::to_object;
use std::sync::Arc;

/// Builds `{domain, primaryType, message, types}` envelopes for one signing domain.
///
/// Building is pure: the same credential and types always give an identical
/// envelope. Timestamps only enter later, in the proof.
#[derive(Debug, Clone)]
pub struct TypedDataBuilder {
    domain: Arc<SigningDomain>,
}

impl TypedDataBuilder {
    pub fn new(domain: Arc<SigningDomain>) -> Self {
        Self { domain }
    }

    pub fn domain(&self) -> &SigningDomain {
        &self.domain
    }

    /// Builds the envelope of `credential`.
    ///
    /// `subject_types` supplies the application-specific types (`Issuer`,
    /// `CredentialSubject` and anything they reference). The credential must
    /// already use the field names of its encoding; it is embedded verbatim.
    ///
    /// # Errors
    /// - `ReservedType` if `subject_types` redefines a fixed type
    /// - `UnresolvedType` / `MissingType` if a reference has no definition
    /// - `MissingField` / `NotAnObject` if the credential does not fit the types
    pub fn build<C: CredentialPayload>(&self, credential: &C, subject_types: &TypeMap) -> Result<TypedData> {
        let types = compose_types(C::ENCODING, subject_types)?;
        self.assemble(credential, types)
    }

    /// Like [`build`](Self::build), with an explicit `Issuer` type that replaces
    /// any `Issuer` entry in `subject_types`.
    pub fn build_with_issuer<C: CredentialPayload>(
        &self,
        credential: &C,
        issuer_type: Vec<TypeField>,
        subject_types: &TypeMap,
    ) -> Result<TypedData> {
        let mut types = compose_types(C::ENCODING, subject_types)?;
        types.insert(ISSUER_TYPE, issuer_type);
        self.assemble(credential, types)
    }

    fn assemble<C: CredentialPayload>(&self, credential: &C, types: TypeMap) -> Result<TypedData> {
        types.validate(VERIFIABLE_CREDENTIAL_PRIMARY_TYPE)?;

        let message = to_object(credential, VERIFIABLE_CREDENTIAL_PRIMARY_TYPE)?;
        types.check_message(VERIFIABLE_CREDENTIAL_PRIMARY_TYPE, &serde_json::Value::Object(message.clone()))?;

        log::debug!(
            "built {:?} envelope for issuer {} with {} types",
            C::ENCODING,
            credential.issuer().id,
            types.len()
        );

        Ok(TypedData {
            domain: self.domain.domain_record(),
            primary_type: VERIFIABLE_CREDENTIAL_PRIMARY_TYPE.to_string(),
            message,
            types,
        })
    }
}
