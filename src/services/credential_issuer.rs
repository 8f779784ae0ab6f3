// src/services/credential_issuer.rs
//! Credential Issuer Service
//!
//! Turns unsigned credentials into verifiable credentials by signing their
//! EIP-712 envelope and attaching an `EthereumEip712Signature2021` proof.
//!
//! Two signing paths produce the same output:
//! - a raw private key, signed in-process with [`KeyManager`]
//! - a caller-supplied async signer (wallet, HSM, remote service) that never
//!   exposes its key

use crate::error::{CredentialError, Result};
use crate::models::credential::{CredentialPayload, VerifiableCredential};
use crate::models::domain::SigningDomain;
use crate::models::proof::{merge_proof, ProofDefaults};
use crate::models::typed_data::{TypeMap, TypedData};
use crate::services::typed_data_builder::TypedDataBuilder;
use crate::utils::serialization::from_object;
use crate::wallet::key_management::KeyManager;
use chrono::{DateTime, SecondsFormat, Utc};
use std::future::Future;
use std::sync::Arc;

/// Service issuing EIP-712 signed verifiable credentials for one signing domain.
#[derive(Debug, Clone)]
pub struct CredentialIssuer {
    builder: TypedDataBuilder,
}

impl CredentialIssuer {
    /// Creates a new CredentialIssuer sharing `domain` with other services.
    pub fn new(domain: Arc<SigningDomain>) -> Self {
        Self {
            builder: TypedDataBuilder::new(domain),
        }
    }

    /// Envelope builder bound to this issuer's domain.
    pub fn builder(&self) -> &TypedDataBuilder {
        &self.builder
    }

    /// Signs a pre-built envelope with a raw private key.
    ///
    /// The credential is read back from `typed_data.message`.
    ///
    /// # Arguments
    /// * `private_key` - 32-byte hex secp256k1 key (with or without `0x`)
    /// * `typed_data` - envelope produced by [`TypedDataBuilder::build`]
    ///
    /// # Errors
    /// `Wallet` for a bad key, `Encoding` if the envelope cannot be hashed,
    /// `Serialization` if the message is not a `C`.
    pub fn create_verifiable_credential<C: CredentialPayload>(
        &self,
        private_key: &str,
        typed_data: &TypedData,
    ) -> Result<VerifiableCredential<C>> {
        let keys = KeyManager::from_private_key(private_key)?;
        let signature = keys.sign_typed_data(typed_data)?;
        let credential: C = from_object(typed_data.message.clone())?;
        attach_proof(credential, typed_data, &signature, Utc::now())
    }

    /// Builds the envelope of `credential` and signs it with `sign`.
    ///
    /// `sign` receives the envelope and resolves to a `0x`-prefixed signature.
    /// Its error is returned as-is; no retry is attempted.
    pub async fn issue_with_signer<C, F, Fut, E>(
        &self,
        credential: &C,
        subject_types: &TypeMap,
        sign: F,
    ) -> Result<VerifiableCredential<C>, E>
    where
        C: CredentialPayload,
        F: FnOnce(TypedData) -> Fut,
        Fut: Future<Output = Result<String, E>>,
        E: From<CredentialError>,
    {
        let typed_data = self.builder.build(credential, subject_types)?;
        let signature = sign(typed_data.clone()).await?;
        Ok(attach_proof(credential.clone(), &typed_data, &signature, Utc::now())?)
    }
}

/// Assembles the verifiable credential from its envelope and signature.
///
/// Proof fields on `credential` override the computed defaults; `proofValue`
/// and `eip712` always come from `signature` and `typed_data`.
pub fn attach_proof<C: CredentialPayload>(
    mut credential: C,
    typed_data: &TypedData,
    signature: &str,
    created: DateTime<Utc>,
) -> Result<VerifiableCredential<C>> {
    let overrides = credential.take_proof();
    let issuer = credential.issuer();
    let defaults = ProofDefaults::new(
        &issuer.id,
        issuer.ethereum_address.clone(),
        created.to_rfc3339_opts(SecondsFormat::Millis, true),
    );
    let proof = merge_proof(&defaults, overrides.as_ref(), signature, typed_data)?;

    log::info!(
        "issued credential {} by {}",
        typed_data.message.get("id").and_then(|id| id.as_str()).unwrap_or("<no id>"),
        proof.verification_method
    );

    Ok(VerifiableCredential { credential, proof })
}
