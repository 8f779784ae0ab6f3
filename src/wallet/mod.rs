// src/wallet/mod.rs
//! Built-in signing and recovery capabilities.

pub mod key_management;
