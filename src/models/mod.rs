// src/models/mod.rs
//! Data structures: signing domain, typed-data envelope, credentials and proofs.

pub mod credential;
pub mod domain;
pub mod proof;
pub mod typed_data;
