// src/services/mod.rs
//! Type registry, envelope builder, issuer and verifier.

pub mod credential_issuer;
pub mod type_registry;
pub mod typed_data_builder;
pub mod verifier;
