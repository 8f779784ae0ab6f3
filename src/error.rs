// src/error.rs
//! Error taxonomy for credential construction, signing and verification.
//!
//! Schema problems are detected before anything is signed. Failures of a
//! caller-supplied signing or recovery capability never pass through this type:
//! they are returned to the caller unchanged.

use ethers::signers::WalletError;
use ethers_core::types::transaction::eip712::Eip712Error;
use ethers_core::types::SignatureError;
use thiserror::Error;

/// Errors produced while building, signing or verifying EIP-712 credentials.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// A string that should hold a 20-byte hex address does not.
    #[error("invalid address `{0}`")]
    InvalidAddress(String),

    /// A type tag outside the supported primitive set that is not a struct reference either.
    #[error("unsupported type tag `{0}`")]
    UnsupportedType(String),

    /// A field references a struct type the type map does not define.
    #[error("type `{referenced}` used by `{owner}.{field}` is not defined")]
    UnresolvedType {
        owner: String,
        field: String,
        referenced: String,
    },

    /// A type the envelope requires is absent from the type map.
    #[error("missing type definition for `{0}`")]
    MissingType(String),

    /// Caller-supplied types tried to replace one of the fixed credential types.
    #[error("reserved type `{0}` cannot be redefined")]
    ReservedType(String),

    /// The message has no value for a primitive field of its type.
    #[error("no value for `{type_name}.{field}`")]
    MissingField { type_name: String, field: String },

    /// A primitive value that cannot be encoded under its type tag.
    #[error("`{type_name}.{field}` holds {value}, which is not a valid `{expected}`")]
    TypeMismatch {
        type_name: String,
        field: String,
        expected: String,
        value: String,
    },

    /// A struct-typed value is not a JSON object.
    #[error("expected an object for type `{0}`")]
    NotAnObject(String),

    #[error("typed data encoding failed: {0}")]
    Encoding(#[from] Eip712Error),

    #[error("signing key error: {0}")]
    Wallet(#[from] WalletError),

    #[error("signature error: {0}")]
    Signature(#[from] SignatureError),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// Crate-wide result alias.
pub type Result<T, E = CredentialError> = std::result::Result<T, E>;
