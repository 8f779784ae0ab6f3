// src/lib.rs

//! # EIP-712 Verifiable Credentials
//!
//! Issues and verifies W3C verifiable credentials signed with
//! [EIP-712](https://eips.ethereum.org/EIPS/eip-712) typed structured data,
//! following the
//! [Ethereum EIP712 Signature 2021](https://w3c-ccg.github.io/ethereum-eip712-signature-2021-spec/)
//! proof suite.
//!
//! ## Architecture Overview
//! 1. **Domain**: [`SigningDomain`] pins name, version, chain and verifying contract
//! 2. **Types**: fixed credential types per [`CredentialEncoding`], merged with caller subject types
//! 3. **Envelope**: [`TypedDataBuilder`] produces the `{domain, primaryType, message, types}` payload
//! 4. **Issuance**: [`CredentialIssuer`] signs it and attaches the proof
//! 5. **Verification**: [`Verifier`] rebuilds the envelope and recovers the signer
//!
//! ## Example
//! ```no_run
//! use eip712_vc::{CredentialIssuer, KeyManager, SigningDomain, Verifier, W3cCredential, TypeMap};
//! use std::sync::Arc;
//!
//! # fn run(credential: W3cCredential, subject_types: TypeMap) -> eip712_vc::Result<()> {
//! let domain = Arc::new(SigningDomain::new(
//!     "Krebit",
//!     "0.1",
//!     4,
//!     "0xa533e32144b5be3f76446f47696bbe0764d5339b",
//! )?);
//! let keys = KeyManager::new();
//!
//! let issuer = CredentialIssuer::new(domain.clone());
//! let typed_data = issuer.builder().build(&credential, &subject_types)?;
//! let vc = issuer.create_verifiable_credential::<W3cCredential>(&keys.private_key_hex(), &typed_data)?;
//!
//! let verifier = Verifier::new(domain);
//! assert!(verifier.verify_credential(&keys.checksum_address(), &vc, &subject_types)?);
//! # Ok(())
//! # }
//! ```

// Public modules
pub mod error;     // Error taxonomy
pub mod models;    // Data structures
pub mod services;  // Registry, builder, issuer, verifier
pub mod utils;     // Helper functions and configuration
pub mod wallet;    // Built-in signing capability

pub use error::{CredentialError, Result};
pub use models::credential::{
    join_values, CredentialPayload, CredentialSchema, Eip712Credential, Eip712CredentialSchema, Issuer,
    VerifiableCredential, W3cCredential, DEFAULT_CONTEXT, DEFAULT_VC_TYPE, EIP712_CONTEXT,
};
pub use models::domain::{DomainRecord, SigningDomain, DOMAIN_ENCODING};
pub use models::proof::{Eip712Snapshot, Proof, PROOF_PURPOSE, PROOF_TYPE};
pub use models::typed_data::{TypeField, TypeMap, TypeTag, TypedData};
pub use services::credential_issuer::CredentialIssuer;
pub use services::type_registry::{CredentialEncoding, VERIFIABLE_CREDENTIAL_PRIMARY_TYPE};
pub use services::typed_data_builder::TypedDataBuilder;
pub use services::verifier::Verifier;
pub use utils::settings::DomainSettings;
pub use wallet::key_management::{recover_typed_data_signer, KeyManager};
