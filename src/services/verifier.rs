// src/services/verifier.rs
//! Credential verification service.
//!
//! Recovers the signer of a credential's EIP-712 envelope and compares it to
//! the claimed issuer address. Only authorship is checked: expiry, revocation
//! and schema conformance belong to the caller.

use crate::error::{CredentialError, Result};
use crate::models::credential::{CredentialPayload, VerifiableCredential};
use crate::models::domain::SigningDomain;
use crate::models::typed_data::{TypeMap, TypedData};
use crate::services::typed_data_builder::TypedDataBuilder;
use crate::utils::crypto::addresses_match;
use crate::wallet::key_management::recover_typed_data_signer;
use ethers_core::types::Address;
use std::future::Future;
use std::sync::Arc;

/// Verifies EIP-712 credential proofs for one signing domain.
#[derive(Debug, Clone)]
pub struct Verifier {
    builder: TypedDataBuilder,
}

impl Verifier {
    /// Constructs a new Verifier sharing `domain` with other services.
    pub fn new(domain: Arc<SigningDomain>) -> Self {
        Self {
            builder: TypedDataBuilder::new(domain),
        }
    }

    /// Checks `proof_value` against an already built envelope.
    ///
    /// The envelope is trusted as given. Use it only when you built the
    /// envelope yourself; for a received credential use
    /// [`verify_credential`](Self::verify_credential), which rebuilds it.
    ///
    /// # Returns
    /// `true` iff the recovered signer is `issuer`. Malformed signatures and
    /// unhashable envelopes give `false`.
    pub fn verify_typed_data(&self, issuer: &str, typed_data: &TypedData, proof_value: &str) -> bool {
        match recover_typed_data_signer(typed_data, proof_value) {
            Ok(recovered) => compare(issuer, &format!("{recovered:?}")),
            Err(err) => {
                log::warn!("signature recovery failed: {err}");
                false
            }
        }
    }

    /// Rebuilds the envelope of `credential` and asks `recover` who signed it.
    ///
    /// `recover` receives the envelope and the signature and resolves to the
    /// signer's address. Its error is returned as-is. Any `eip712` block the
    /// credential carries is ignored.
    ///
    /// # Errors
    /// Schema errors from rebuilding the envelope, or the error of `recover`.
    /// A signer other than `issuer` is `Ok(false)`.
    pub async fn verify_with_recoverer<C, F, Fut, E>(
        &self,
        issuer: &str,
        credential: &C,
        subject_types: &TypeMap,
        proof_value: &str,
        recover: F,
    ) -> Result<bool, E>
    where
        C: CredentialPayload,
        F: FnOnce(TypedData, String) -> Fut,
        Fut: Future<Output = Result<String, E>>,
        E: From<CredentialError>,
    {
        let typed_data = self.builder.build(credential, subject_types)?;
        let recovered = recover(typed_data, proof_value.to_string()).await?;
        Ok(compare(issuer, &recovered))
    }

    /// [`verify_with_recoverer`](Self::verify_with_recoverer) using the
    /// signature in `vc.proof.proofValue`.
    pub async fn verify_verifiable_credential<C, F, Fut, E>(
        &self,
        issuer: &str,
        vc: &VerifiableCredential<C>,
        subject_types: &TypeMap,
        recover: F,
    ) -> Result<bool, E>
    where
        C: CredentialPayload,
        F: FnOnce(TypedData, String) -> Fut,
        Fut: Future<Output = Result<String, E>>,
        E: From<CredentialError>,
    {
        self.verify_with_recoverer(issuer, &vc.credential, subject_types, &vc.proof.proof_value, recover)
            .await
    }

    /// Verifies `vc` with in-process signer recovery.
    ///
    /// # Errors
    /// Only for schema errors while rebuilding the envelope.
    pub fn verify_credential<C: CredentialPayload>(
        &self,
        issuer: &str,
        vc: &VerifiableCredential<C>,
        subject_types: &TypeMap,
    ) -> Result<bool> {
        let typed_data = self.builder.build(&vc.credential, subject_types)?;
        Ok(self.verify_typed_data(issuer, &typed_data, &vc.proof.proof_value))
    }

    /// Recovers the signer of `vc` without comparing it to anything.
    pub fn recover_issuer<C: CredentialPayload>(
        &self,
        vc: &VerifiableCredential<C>,
        subject_types: &TypeMap,
    ) -> Result<Address> {
        let typed_data = self.builder.build(&vc.credential, subject_types)?;
        recover_typed_data_signer(&typed_data, &vc.proof.proof_value)
    }
}

fn compare(issuer: &str, recovered: &str) -> bool {
    let matched = addresses_match(issuer, recovered);
    log::info!("claimed issuer {issuer}, recovered {recovered}: {}", if matched { "match" } else { "mismatch" });
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::credential::W3cCredential;
    use crate::services::credential_issuer::CredentialIssuer;
    use crate::wallet::key_management::KeyManager;
    use serde_json::json;

    fn domain() -> Arc<SigningDomain> {
        Arc::new(SigningDomain::new("Krebit", "0.1", 4, "0xa533e32144b5be3f76446f47696bbe0764d5339b").unwrap())
    }

    fn credential() -> W3cCredential {
        serde_json::from_value(json!({
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "type": ["VerifiableCredential"],
            "id": "urn:uuid:1",
            "issuer": { "id": "did:issuer" },
            "credentialSubject": { "id": "did:user", "score": 7 },
            "issuanceDate": "2022-01-01T00:00:00.000Z",
            "expirationDate": "2025-01-01T00:00:00.000Z"
        }))
        .unwrap()
    }

    fn subject_types() -> TypeMap {
        serde_json::from_value(json!({
            "Issuer": [{ "name": "id", "type": "string" }],
            "CredentialSubject": [
                { "name": "id", "type": "string" },
                { "name": "score", "type": "uint8" }
            ]
        }))
        .unwrap()
    }

    fn issue(keys: &KeyManager) -> VerifiableCredential<W3cCredential> {
        let issuer = CredentialIssuer::new(domain());
        let typed_data = issuer.builder().build(&credential(), &subject_types()).unwrap();
        issuer.create_verifiable_credential(&keys.private_key_hex(), &typed_data).unwrap()
    }

    #[test]
    fn test_direct_recovery_mode() {
        let keys = KeyManager::new();
        let vc = issue(&keys);
        let verifier = Verifier::new(domain());
        let typed_data = verifier.builder.build(&credential(), &subject_types()).unwrap();

        assert!(verifier.verify_typed_data(&keys.checksum_address(), &typed_data, &vc.proof.proof_value));
        assert!(!verifier.verify_typed_data(
            &format!("{:?}", KeyManager::new().address()),
            &typed_data,
            &vc.proof.proof_value
        ));
        assert!(!verifier.verify_typed_data(&keys.checksum_address(), &typed_data, "0x00"));
    }

    #[test]
    fn test_verify_credential_ignores_embedded_snapshot() {
        let keys = KeyManager::new();
        let mut vc = issue(&keys);
        vc.proof.eip712.domain.chain_id = 1;
        vc.proof.eip712.primary_type = "Forged".to_string();

        let verifier = Verifier::new(domain());
        assert!(verifier.verify_credential(&keys.checksum_address(), &vc, &subject_types()).unwrap());
        assert_eq!(verifier.recover_issuer(&vc, &subject_types()).unwrap(), keys.address());
    }

    #[test]
    fn test_tampered_subject_fails() {
        let keys = KeyManager::new();
        let mut vc = issue(&keys);
        vc.credential.credential_subject.insert("score".to_string(), json!(8));

        let verifier = Verifier::new(domain());
        assert!(!verifier.verify_credential(&keys.checksum_address(), &vc, &subject_types()).unwrap());
    }

    #[tokio::test]
    async fn test_delegated_verifier_mode() {
        let keys = KeyManager::new();
        let vc = issue(&keys);
        let verifier = Verifier::new(domain());
        let recover = |typed_data: TypedData, signature: String| async move {
            recover_typed_data_signer(&typed_data, &signature).map(|address| format!("{address:?}"))
        };

        let upper = keys.checksum_address().to_uppercase().replace("0X", "0x");
        assert!(verifier
            .verify_verifiable_credential(&upper, &vc, &subject_types(), recover)
            .await
            .unwrap());
        assert!(!verifier
            .verify_verifiable_credential("0x0000000000000000000000000000000000000001", &vc, &subject_types(), recover)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_recoverer_error_is_returned_unchanged() {
        let vc = issue(&KeyManager::new());
        let result: std::result::Result<bool, anyhow::Error> = Verifier::new(domain())
            .verify_verifiable_credential("did:issuer", &vc, &subject_types(), |_, _| async {
                Err::<String, _>(anyhow::anyhow!("resolver offline"))
            })
            .await;
        assert_eq!(result.unwrap_err().to_string(), "resolver offline");
    }
}
